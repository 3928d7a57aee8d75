// ============================================================================
// aved-core/src/external/runner.rs
// ============================================================================
//
// PROCESS RUNNER: Spawning commands with concurrently drained output
//
// Every child gets two drain threads, one per output stream, started right
// after spawn. A child writing more than a pipe buffer's worth of output
// blocks until someone reads it, so both streams must be drained while the
// parent waits for exit, not afterwards.
//
// KEY COMPONENTS:
// - CommandSpec: description of a command line (direct or through `sh -c`)
// - LineSink: receiver for drained lines (LogSink, NullSink, FnSink)
// - RunningProcess: a spawned child plus its drain threads
// - CommandRunner: the seam the orchestrator launches processes through

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::cancel::CancellationToken;
use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use crate::util::{lock, shell_quote, tail_lines};

use super::environment;

/// How often `wait` polls the child for exit.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long `wait` gives drain threads to finish after a cancelled child
/// exits. Grandchildren of a killed `sh -c` can keep the pipes open.
const CANCELLED_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Number of stderr lines carried in a `CommandFailed` error.
const ERROR_TAIL_LINES: usize = 10;

// ============================================================================
// COMMAND DESCRIPTION
// ============================================================================

/// A command to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// The command is a shell command line run through `sh -c`.
    pub shell: bool,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            shell: false,
            current_dir: None,
        }
    }

    /// A command line executed by `sh -c`, for pipelines and user overrides.
    pub fn shell(command_line: impl Into<String>) -> Self {
        Self {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), command_line.into()],
            shell: true,
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Name used in logs and error messages.
    pub fn label(&self) -> String {
        if self.shell {
            "sh -c".to_string()
        } else {
            Path::new(&self.program)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.program.clone())
        }
    }

    /// Shell-like rendering of the command, as recorded in the history.
    pub fn display(&self) -> String {
        if self.shell {
            return self.args.get(1).cloned().unwrap_or_default();
        }
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether `window` appears as consecutive arguments.
    pub fn has_args(&self, window: &[&str]) -> bool {
        if window.is_empty() {
            return true;
        }
        self.args
            .windows(window.len())
            .any(|w| w.iter().zip(window).all(|(a, b)| a == b))
    }

    fn to_command(&self, fallback_dirs: &[PathBuf]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("PATH", environment::child_path(fallback_dirs))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

// ============================================================================
// LINE SINKS
// ============================================================================

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Receives lines as the drain threads read them.
pub trait LineSink: Send + Sync {
    fn line(&self, stream: StreamKind, line: &str);
}

/// Forwards tool output to the `log` facade at debug level.
#[derive(Debug, Clone)]
pub struct LogSink {
    label: String,
}

impl LogSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl LineSink for LogSink {
    fn line(&self, stream: StreamKind, line: &str) {
        match stream {
            StreamKind::Stdout => log::debug!("[{}] {}", self.label, line),
            StreamKind::Stderr => log::debug!("[{} stderr] {}", self.label, line),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LineSink for NullSink {
    fn line(&self, _stream: StreamKind, _line: &str) {}
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> LineSink for FnSink<F>
where
    F: Fn(StreamKind, &str) + Send + Sync,
{
    fn line(&self, stream: StreamKind, line: &str) {
        (self.0)(stream, line)
    }
}

// ============================================================================
// RUNNING PROCESSES
// ============================================================================

/// Exit code and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; -1 when the process was terminated by a signal.
    pub code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Stdout lines followed by stderr lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.iter().chain(self.stderr.iter()).map(String::as_str)
    }
}

/// A launched process, shared between a waiter and a killer.
pub trait ProcessHandle: Send + Sync {
    /// OS process id, if the process is real.
    fn id(&self) -> Option<u32>;

    /// Blocks until exit and returns the captured output. Safe to call
    /// concurrently with `kill` and more than once.
    fn wait(&self) -> CoreResult<ProcessOutput>;

    /// Kills the process and stops the drain loops. No-op once exited.
    fn kill(&self) -> CoreResult<()>;
}

/// A real child process with its two drain threads.
pub struct RunningProcess {
    label: String,
    pid: u32,
    child: Mutex<Child>,
    exit_code: Mutex<Option<i32>>,
    drains: Mutex<Vec<JoinHandle<()>>>,
    stdout: Arc<Mutex<Vec<String>>>,
    stderr: Arc<Mutex<Vec<String>>>,
    cancel: CancellationToken,
}

/// Spawns `spec` and immediately starts draining both output streams into
/// `sink`. With `capture`, lines are also buffered for `wait` to return.
pub fn spawn_drained(
    spec: &CommandSpec,
    fallback_dirs: &[PathBuf],
    sink: Arc<dyn LineSink>,
    capture: bool,
    cancel: CancellationToken,
) -> CoreResult<RunningProcess> {
    let label = spec.label();
    log::debug!("Spawning: {}", spec.display());

    let mut child = spec
        .to_command(fallback_dirs)
        .spawn()
        .map_err(|e| command_start_error(label.clone(), e))?;

    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let mut drains = Vec::with_capacity(2);

    if let Some(out) = child.stdout.take() {
        drains.push(start_drain(
            &label,
            out,
            StreamKind::Stdout,
            Arc::clone(&sink),
            capture.then(|| Arc::clone(&stdout_buf)),
            cancel.clone(),
        )?);
    }
    if let Some(err) = child.stderr.take() {
        drains.push(start_drain(
            &label,
            err,
            StreamKind::Stderr,
            Arc::clone(&sink),
            capture.then(|| Arc::clone(&stderr_buf)),
            cancel.clone(),
        )?);
    }

    Ok(RunningProcess {
        label,
        pid: child.id(),
        child: Mutex::new(child),
        exit_code: Mutex::new(None),
        drains: Mutex::new(drains),
        stdout: stdout_buf,
        stderr: stderr_buf,
        cancel,
    })
}

fn start_drain<R>(
    label: &str,
    stream: R,
    kind: StreamKind,
    sink: Arc<dyn LineSink>,
    buffer: Option<Arc<Mutex<Vec<String>>>>,
    cancel: CancellationToken,
) -> CoreResult<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let name = match kind {
        StreamKind::Stdout => format!("{label}-stdout"),
        StreamKind::Stderr => format!("{label}-stderr"),
    };
    std::thread::Builder::new()
        .name(name)
        .spawn(move || drain_lines(stream, kind, sink.as_ref(), buffer.as_deref(), &cancel))
        .map_err(|e| command_start_error(label, e))
}

/// Reads `stream` line by line until EOF, a read error, or cancellation.
///
/// Lines are decoded lossily; tool output is not guaranteed to be UTF-8.
fn drain_lines<R: Read>(
    stream: R,
    kind: StreamKind,
    sink: &dyn LineSink,
    buffer: Option<&Mutex<Vec<String>>>,
    cancel: &CancellationToken,
) {
    let mut reader = BufReader::new(stream);
    let mut raw = Vec::new();
    loop {
        if cancel.is_cancelled() {
            break;
        }
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&raw);
                let line = text.trim_end_matches(['\n', '\r']);
                sink.line(kind, line);
                if let Some(buf) = buffer {
                    lock(buf).push(line.to_string());
                }
            }
            Err(e) => {
                log::debug!("Stream read ended with error: {}", e);
                break;
            }
        }
    }
}

impl RunningProcess {
    /// Exit code if the process has exited, without blocking.
    pub fn try_status(&self) -> CoreResult<Option<i32>> {
        if let Some(code) = *lock(&self.exit_code) {
            return Ok(Some(code));
        }
        let status = lock(&self.child)
            .try_wait()
            .map_err(|e| command_wait_error(self.label.clone(), e))?;
        Ok(status.map(|status| {
            let code = status.code().unwrap_or(-1);
            *lock(&self.exit_code) = Some(code);
            code
        }))
    }

    fn poll_exit(&self) -> CoreResult<i32> {
        loop {
            if let Some(code) = self.try_status()? {
                return Ok(code);
            }
            std::thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    fn join_drains(&self) {
        let handles: Vec<JoinHandle<()>> = lock(&self.drains).drain(..).collect();
        let grace_start = Instant::now();
        for handle in handles {
            if self.cancel.is_cancelled() {
                while !handle.is_finished() && grace_start.elapsed() < CANCELLED_DRAIN_GRACE {
                    std::thread::sleep(Duration::from_millis(10));
                }
                if !handle.is_finished() {
                    log::warn!("Detaching drain thread of cancelled '{}'", self.label);
                    continue;
                }
            }
            if handle.join().is_err() {
                log::error!("Drain thread of '{}' panicked", self.label);
            }
        }
    }
}

impl ProcessHandle for RunningProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn wait(&self) -> CoreResult<ProcessOutput> {
        let code = self.poll_exit()?;
        self.join_drains();
        Ok(ProcessOutput {
            code,
            stdout: lock(&self.stdout).clone(),
            stderr: lock(&self.stderr).clone(),
        })
    }

    fn kill(&self) -> CoreResult<()> {
        self.cancel.cancel();
        if lock(&self.exit_code).is_some() {
            return Ok(());
        }
        let mut child = lock(&self.child);
        match child.kill() {
            Ok(()) => {
                log::info!("Killed '{}' (pid {})", self.label, self.pid);
                Ok(())
            }
            // Already exited between the check above and the kill
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(command_wait_error(self.label.clone(), e)),
        }
    }
}

// ============================================================================
// RUNNER SEAM
// ============================================================================

/// Launches commands. The orchestrator only talks to processes through this.
pub trait CommandRunner: Send + Sync {
    /// Spawns `spec`, forwarding its output lines to `sink`.
    fn spawn(&self, spec: &CommandSpec, sink: Arc<dyn LineSink>)
    -> CoreResult<Arc<dyn ProcessHandle>>;

    /// Runs `spec` to completion and returns its output whatever the exit code.
    fn run(&self, spec: &CommandSpec) -> CoreResult<ProcessOutput> {
        let sink: Arc<dyn LineSink> = Arc::new(LogSink::new(spec.label()));
        self.spawn(spec, sink)?.wait()
    }

    /// Runs `spec` to completion, turning a non-zero exit into an error.
    fn run_checked(&self, spec: &CommandSpec) -> CoreResult<ProcessOutput> {
        let output = self.run(spec)?;
        if output.success() {
            Ok(output)
        } else {
            Err(crate::error::CoreError::CommandFailed {
                command: spec.label(),
                code: output.code,
                stderr: tail_lines(&output.stderr, ERROR_TAIL_LINES),
            })
        }
    }
}

/// Runs commands as real OS processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    fallback_dirs: Vec<PathBuf>,
}

impl SystemRunner {
    pub fn new(fallback_dirs: Vec<PathBuf>) -> Self {
        Self { fallback_dirs }
    }
}

impl CommandRunner for SystemRunner {
    fn spawn(
        &self,
        spec: &CommandSpec,
        sink: Arc<dyn LineSink>,
    ) -> CoreResult<Arc<dyn ProcessHandle>> {
        let process = spawn_drained(
            spec,
            &self.fallback_dirs,
            sink,
            true,
            CancellationToken::new(),
        )?;
        Ok(Arc::new(process))
    }
}

/// Runs `spec` with output forwarded to `sink`, failing on a non-zero exit.
pub fn run_to_completion(
    spec: &CommandSpec,
    fallback_dirs: &[PathBuf],
    sink: Arc<dyn LineSink>,
) -> CoreResult<ProcessOutput> {
    let process = spawn_drained(spec, fallback_dirs, sink, true, CancellationToken::new())?;
    let output = process.wait()?;
    if output.success() {
        return Ok(output);
    }
    let status = exit_status_from_code(output.code);
    log::error!("'{}' failed with exit code {}", spec.label(), output.code);
    Err(command_failed_error(
        spec.label(),
        status,
        tail_lines(&output.stderr, ERROR_TAIL_LINES),
    ))
}

#[cfg(unix)]
fn exit_status_from_code(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    // Raw wait status: exit code lives in the second byte
    std::process::ExitStatus::from_raw((code & 0xff) << 8)
}

#[cfg(not(unix))]
fn exit_status_from_code(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code as u32)
}
