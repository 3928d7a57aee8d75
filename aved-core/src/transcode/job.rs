// ============================================================================
// aved-core/src/transcode/job.rs
// ============================================================================
//
// TRANSCODE JOB: Turning a video or frame archive into a frame directory
//
// State machine:
//
//   Idle ──start()──> Running ──wait()──> Succeeded | Failed | Killed
//
// A finished job may be started again. The state lives behind a mutex so
// `kill()` and `clean()` can be called from another thread while `wait()`
// blocks. A kill that lands while the job is still probing the input is
// remembered and stops the launch before the transcode is spawned.
//
// `clean()` only removes the whole output directory when the job created
// it. In a directory that already existed, only entries that appeared after
// the job was created are removed.
//
// After spawning, a timer thread waits `inspection_delay` and then infers
// the frame naming from whatever frames exist by then, so a front end can
// begin showing frames while the transcode is still running. A final pass
// runs when the process exits successfully.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::context::AppContext;
use crate::error::{CoreError, CoreResult};
use crate::external::{CommandSpec, LineSink, LogSink, ProcessHandle};
use crate::util::{lock, tail_lines};
use crate::video::VideoDescriptor;

use super::codec::{self, CodecFamily};
use super::command;
use super::inference::infer_frame_naming;
use super::source::{self, SourceKind, VideoContainer};

/// Number of stderr lines kept in a failure message.
const FAILURE_TAIL_LINES: usize = 10;

/// Lifecycle state of a transcode job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Succeeded,
    Failed,
    Killed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed | JobState::Killed)
    }
}

struct Inspection {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// One transcode of one input into one output directory.
pub struct TranscodeJob {
    ctx: Arc<AppContext>,
    input: PathBuf,
    output_dir: PathBuf,
    source: SourceKind,
    command_override: Option<String>,
    state: Mutex<JobState>,
    process: Mutex<Option<Arc<dyn ProcessHandle>>>,
    command: Mutex<Option<CommandSpec>>,
    descriptor: Arc<Mutex<VideoDescriptor>>,
    inspection: Mutex<Option<Inspection>>,
    kill_requested: AtomicBool,
    created_output_dir: bool,
    /// Entries of a pre-existing output directory; never removed by `clean()`
    preexisting: BTreeSet<OsString>,
}

impl TranscodeJob {
    /// Validates the input and output locations and creates the job.
    ///
    /// The output directory is created when it does not exist yet.
    pub fn new(
        ctx: Arc<AppContext>,
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> CoreResult<Self> {
        let input = input.into();
        let output_dir = output_dir.into();
        validate_input(&input)?;
        let created_output_dir = prepare_output_dir(&output_dir)?;
        let preexisting = if created_output_dir {
            BTreeSet::new()
        } else {
            entry_names(&output_dir)?
        };

        let source = SourceKind::from_path(&input);
        let descriptor = VideoDescriptor::new(source::video_name(&input), output_dir.clone());
        log::debug!("New transcode job: {} ({:?})", input.display(), source);

        Ok(Self {
            ctx,
            input,
            output_dir,
            source,
            command_override: None,
            state: Mutex::new(JobState::Idle),
            process: Mutex::new(None),
            command: Mutex::new(None),
            descriptor: Arc::new(Mutex::new(descriptor)),
            inspection: Mutex::new(None),
            kill_requested: AtomicBool::new(false),
            created_output_dir,
            preexisting,
        })
    }

    /// Replaces the generated command with `command_line`, run through the shell.
    pub fn with_command(mut self, command_line: impl Into<String>) -> Self {
        self.command_override = Some(command_line.into());
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source
    }

    /// Whether the output directory was created by this job.
    pub fn created_output_dir(&self) -> bool {
        self.created_output_dir
    }

    pub fn state(&self) -> JobState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == JobState::Running
    }

    /// Snapshot of the video descriptor.
    pub fn descriptor(&self) -> VideoDescriptor {
        lock(&self.descriptor).clone()
    }

    /// The command line of the last start, if any.
    pub fn command_line(&self) -> Option<String> {
        lock(&self.command).as_ref().map(CommandSpec::display)
    }

    /// The command of the last start, if any.
    pub fn command(&self) -> Option<CommandSpec> {
        lock(&self.command).clone()
    }

    /// Starts the transcode without waiting for it.
    ///
    /// Allowed from `Idle` and from any finished state; a running job
    /// returns `AlreadyRunning`.
    pub fn start(&self) -> CoreResult<()> {
        {
            let mut state = lock(&self.state);
            if *state == JobState::Running {
                return Err(CoreError::AlreadyRunning(self.input.display().to_string()));
            }
            *state = JobState::Running;
            self.kill_requested.store(false, Ordering::SeqCst);
        }

        match self.launch() {
            Ok(()) => Ok(()),
            Err(err @ CoreError::Cancelled(_)) => {
                log::info!("Transcode of {} killed before launch", self.input.display());
                *lock(&self.state) = JobState::Killed;
                Err(err)
            }
            Err(err) => {
                *lock(&self.state) = JobState::Failed;
                self.ctx.record_error(&err);
                Err(err)
            }
        }
    }

    fn launch(&self) -> CoreResult<()> {
        validate_input(&self.input)?;
        prepare_output_dir(&self.output_dir)?;
        lock(&self.descriptor).reset();

        let spec = self.build_command()?;
        let display = spec.display();
        log::info!("Starting transcode of {}", self.input.display());
        log::debug!("Command: {}", display);
        self.ctx.history().record(display);
        *lock(&self.command) = Some(spec.clone());

        if self.kill_requested.load(Ordering::SeqCst) {
            return Err(CoreError::Cancelled(self.input.display().to_string()));
        }
        let sink: Arc<dyn LineSink> = Arc::new(LogSink::new(spec.label()));
        let handle = self.ctx.runner().spawn(&spec, sink)?;
        *lock(&self.process) = Some(Arc::clone(&handle));

        // A kill between the check above and storing the handle saw no process
        if self.kill_requested.load(Ordering::SeqCst) {
            handle.kill()?;
        }

        self.schedule_inspection();
        Ok(())
    }

    fn build_command(&self) -> CoreResult<CommandSpec> {
        let config = self.ctx.config();
        if let Some(line) = &self.command_override {
            return Ok(command::override_command(line));
        }

        match self.source {
            SourceKind::Archive { gzipped: true } => Ok(command::gunzip_tar_pipeline(
                config,
                &self.input,
                &self.output_dir,
            )),
            SourceKind::Archive { gzipped: false } => {
                Ok(command::tar_extract(config, &self.input, &self.output_dir))
            }
            SourceKind::Video(container) => {
                let transcode = self.ctx.locator().locate(&config.transcode_program)?;
                let flags = match container {
                    VideoContainer::Avi => self.avi_codec().transcode_flags(),
                    VideoContainer::Mpeg | VideoContainer::Other => Vec::new(),
                };
                Ok(command::transcode_frames(
                    config,
                    &transcode,
                    &self.input,
                    &self.output_dir,
                    &flags,
                ))
            }
            SourceKind::Unknown => {
                log::warn!(
                    "Unrecognised extension for {}; trying a plain transcode",
                    self.input.display()
                );
                let transcode = self.ctx.locator().locate(&config.transcode_program)?;
                Ok(command::transcode_frames(
                    config,
                    &transcode,
                    &self.input,
                    &self.output_dir,
                    &[],
                ))
            }
        }
    }

    /// Probes an AVI with tcprobe and avidump. Failures fall back to letting
    /// transcode autodetect the codec.
    fn avi_codec(&self) -> CodecFamily {
        let config = self.ctx.config();
        let runner = self.ctx.runner();

        let tcprobe_spec = command::tcprobe(config, &self.input);
        self.ctx.history().record(tcprobe_spec.display());
        let report = match runner.run(&tcprobe_spec) {
            Ok(output) => codec::parse_tcprobe(output.lines()),
            Err(e) => {
                log::warn!("tcprobe failed for {}: {}", self.input.display(), e);
                codec::ProbeReport::default()
            }
        };
        if let Some(frames) = report.frame_count {
            lock(&self.descriptor).frame_count = Some(frames);
        }
        if self.kill_requested.load(Ordering::SeqCst) {
            return CodecFamily::Default;
        }

        let avidump_spec = command::avidump(config, &self.input);
        self.ctx.history().record(avidump_spec.display());
        let compressor = match runner.run(&avidump_spec) {
            Ok(output) => codec::parse_avidump_compressor(output.lines()),
            Err(e) => {
                log::warn!("avidump failed for {}: {}", self.input.display(), e);
                None
            }
        };

        match compressor.or(report.codec) {
            Some(fourcc) => {
                let family = CodecFamily::from_fourcc(&fourcc);
                log::info!("Detected codec {} ({:?})", fourcc, family);
                family
            }
            None => {
                log::warn!("Could not detect the codec of {}", self.input.display());
                CodecFamily::Default
            }
        }
    }

    fn expected_prefix(&self) -> Option<String> {
        match (self.source, &self.command_override) {
            (SourceKind::Video(_) | SourceKind::Unknown, None) => {
                Some(self.ctx.config().frame_prefix.clone())
            }
            _ => None,
        }
    }

    fn schedule_inspection(&self) {
        self.stop_inspection();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let delay = self.ctx.config().inspection_delay;
        let dir = self.output_dir.clone();
        let prefix = self.expected_prefix();
        let descriptor = Arc::clone(&self.descriptor);

        let spawned = std::thread::Builder::new()
            .name("aved-inspect".to_string())
            .spawn(move || {
                if !token.sleep(delay) {
                    return;
                }
                inspect_output(&dir, prefix.as_deref(), &descriptor);
            });

        match spawned {
            Ok(handle) => *lock(&self.inspection) = Some(Inspection { cancel, handle }),
            Err(e) => log::warn!("Could not schedule output inspection: {}", e),
        }
    }

    fn stop_inspection(&self) {
        let inspection = lock(&self.inspection).take();
        if let Some(inspection) = inspection {
            inspection.cancel.cancel();
            if inspection.handle.join().is_err() {
                log::error!("Output inspection thread panicked");
            }
        }
    }

    /// Moves a running job to `next`; returns false if it already left Running.
    fn finish(&self, next: JobState) -> bool {
        let mut state = lock(&self.state);
        if *state != JobState::Running {
            return false;
        }
        *state = next;
        log::info!("Transcode of {} finished: {:?}", self.input.display(), next);
        true
    }

    /// Blocks until the running process exits and records the outcome.
    pub fn wait(&self) -> CoreResult<()> {
        let handle = lock(&self.process).clone();
        let Some(handle) = handle else {
            return match self.state() {
                JobState::Succeeded => Ok(()),
                JobState::Killed => Err(CoreError::Cancelled(self.input.display().to_string())),
                state => Err(CoreError::InvalidInput(format!(
                    "No transcode process to wait for ({:?})",
                    state
                ))),
            };
        };

        let result = handle.wait();
        lock(&self.process).take();
        self.stop_inspection();

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                if self.finish(JobState::Failed) {
                    self.ctx.record_error(&err);
                }
                return Err(err);
            }
        };

        if self.kill_requested.load(Ordering::SeqCst) {
            self.finish(JobState::Killed);
            return Err(CoreError::Cancelled(self.input.display().to_string()));
        }

        if output.success() {
            inspect_output(&self.output_dir, self.expected_prefix().as_deref(), &self.descriptor);
            self.finish(JobState::Succeeded);
            return Ok(());
        }

        let label = lock(&self.command)
            .as_ref()
            .map(CommandSpec::label)
            .unwrap_or_else(|| "transcode".to_string());
        let err = CoreError::CommandFailed {
            command: label,
            code: output.code,
            stderr: tail_lines(&output.stderr, FAILURE_TAIL_LINES),
        };
        if self.finish(JobState::Failed) {
            self.ctx.record_error(&err);
        }
        Err(err)
    }

    /// Starts the transcode and waits for it to finish.
    pub fn run(&self) -> CoreResult<()> {
        self.start()?;
        self.wait()
    }

    /// Kills the running process. A job that is not running is left alone.
    ///
    /// While the job is still probing its input there is no process yet;
    /// the request is kept and the launch stops before spawning.
    pub fn kill(&self) -> CoreResult<()> {
        {
            let state = lock(&self.state);
            if *state != JobState::Running {
                return Ok(());
            }
            self.kill_requested.store(true, Ordering::SeqCst);
        }
        let handle = lock(&self.process).clone();
        if let Some(handle) = handle {
            handle.kill()?;
        }
        Ok(())
    }

    /// Kills a running transcode and removes what it wrote.
    ///
    /// An output directory the job created is deleted outright. In a
    /// directory that existed before, only the entries added since the job
    /// was created are removed. Safe to call repeatedly.
    pub fn clean(&self) -> CoreResult<()> {
        if self.is_running() {
            self.kill()?;
            // Reap the child and settle the state; Cancelled is expected here
            match self.wait() {
                Ok(()) | Err(CoreError::Cancelled(_)) => {}
                Err(e) => log::debug!("Wait during clean: {}", e),
            }
        }
        self.stop_inspection();

        let removed = if self.created_output_dir {
            remove_dir(&self.output_dir)
        } else {
            remove_new_entries(&self.output_dir, &self.preexisting)
        };
        if let Err(e) = removed {
            let err = CoreError::Io(e);
            self.ctx.record_error(&err);
            return Err(err);
        }
        lock(&self.descriptor).reset();
        Ok(())
    }

    /// Time the inspection timer waits after launch.
    pub fn inspection_delay(&self) -> Duration {
        self.ctx.config().inspection_delay
    }
}

impl Drop for TranscodeJob {
    fn drop(&mut self) {
        self.stop_inspection();
    }
}

impl std::fmt::Debug for TranscodeJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodeJob")
            .field("input", &self.input)
            .field("output_dir", &self.output_dir)
            .field("source", &self.source)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn validate_input(input: &Path) -> CoreResult<()> {
    if !input.exists() {
        return Err(CoreError::InputNotFound(input.display().to_string()));
    }
    if !input.is_file() {
        return Err(CoreError::InvalidInput(format!(
            "'{}' is not a file",
            input.display()
        )));
    }
    Ok(())
}

/// Creates `output_dir` if needed; returns true when it was created.
fn prepare_output_dir(output_dir: &Path) -> CoreResult<bool> {
    if output_dir.exists() {
        if !output_dir.is_dir() {
            return Err(CoreError::NotADirectory(output_dir.display().to_string()));
        }
        return Ok(false);
    }
    std::fs::create_dir_all(output_dir)?;
    Ok(true)
}

fn entry_names(dir: &Path) -> CoreResult<BTreeSet<OsString>> {
    let mut names = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        names.insert(entry?.file_name());
    }
    Ok(names)
}

fn remove_dir(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            log::info!("Removed {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn remove_new_entries(dir: &Path, keep: &BTreeSet<OsString>) -> std::io::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let mut removed = 0usize;
    for entry in entries {
        let entry = entry?;
        if keep.contains(&entry.file_name()) {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
        removed += 1;
    }
    log::info!(
        "Removed {} new entries from {}; kept {} that were already there",
        removed,
        dir.display(),
        keep.len()
    );
    Ok(())
}

fn inspect_output(dir: &Path, prefix: Option<&str>, descriptor: &Mutex<VideoDescriptor>) {
    match infer_frame_naming(dir, prefix) {
        Ok(Some(naming)) => lock(descriptor).apply_naming(naming),
        Ok(None) => log::debug!("No frames in {} yet", dir.display()),
        Err(e) => log::warn!("Could not inspect {}: {}", dir.display(), e),
    }
}
