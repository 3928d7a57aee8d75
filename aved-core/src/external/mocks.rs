// aved-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// This module is only compiled when the "test-mocks" feature is enabled.
#![cfg(feature = "test-mocks")]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{CoreError, CoreResult};
use crate::util::lock;

use super::locator::{ProbeOutcome, Prober};
use super::runner::{CommandRunner, CommandSpec, LineSink, ProcessHandle, ProcessOutput, StreamKind};

/// Mock prober answering from a table; unknown candidates are `Missing`.
#[derive(Default)]
pub struct MockProber {
    outcomes: Mutex<HashMap<PathBuf, ProbeOutcome>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl MockProber {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_outcome(&self, candidate: impl Into<PathBuf>, outcome: ProbeOutcome) {
        lock(&self.outcomes).insert(candidate.into(), outcome);
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        lock(&self.calls).clone()
    }

    /// Probes of candidates whose file name is `cmd`.
    pub fn calls_for(&self, cmd: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|p| p.file_name().is_some_and(|n| n == cmd))
            .count()
    }
}

impl Prober for MockProber {
    fn probe(&self, candidate: &Path, _timeout: Duration) -> ProbeOutcome {
        lock(&self.calls).push(candidate.to_path_buf());
        let outcome = lock(&self.outcomes)
            .get(candidate)
            .copied()
            .unwrap_or(ProbeOutcome::Missing);
        log::info!("MockProber: {} -> {:?}", candidate.display(), outcome);
        outcome
    }
}

/// Mock process: output is fixed up front; optionally blocks until killed
/// or takes `delay` to finish.
pub struct MockProcess {
    output: ProcessOutput,
    blocks_until_killed: bool,
    delay: Duration,
    killed: AtomicBool,
}

impl ProcessHandle for MockProcess {
    fn id(&self) -> Option<u32> {
        None
    }

    fn wait(&self) -> CoreResult<ProcessOutput> {
        if self.blocks_until_killed {
            while !self.killed.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
            return Ok(ProcessOutput {
                code: -1,
                ..self.output.clone()
            });
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.output.clone())
    }

    fn kill(&self) -> CoreResult<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// An expected command and how the mock answers it.
pub struct MockExpectation {
    pub pattern: String,
    pub result: CoreResult<ProcessOutput>,
    pub files_to_create: Vec<PathBuf>,
    pub blocks_until_killed: bool,
    pub delay: Duration,
}

/// Mock runner matching commands against expectations by substring of the
/// rendered command line. Matched expectations are consumed.
#[derive(Clone, Default)]
pub struct MockRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    received: Arc<Mutex<Vec<CommandSpec>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(&self, expectation: MockExpectation) {
        lock(&self.expectations).push(expectation);
    }

    /// Expect a command that prints `stdout` and exits 0.
    pub fn add_success_expectation(&self, pattern: &str, stdout: &[&str]) {
        self.add_expectation(MockExpectation {
            pattern: pattern.to_string(),
            result: Ok(output(0, stdout, &[])),
            files_to_create: Vec::new(),
            blocks_until_killed: false,
            delay: Duration::ZERO,
        });
    }

    /// Expect a command that exits 0 after "writing" `files`.
    pub fn add_success_with_files(&self, pattern: &str, files: Vec<PathBuf>) {
        self.add_expectation(MockExpectation {
            pattern: pattern.to_string(),
            result: Ok(output(0, &[], &[])),
            files_to_create: files,
            blocks_until_killed: false,
            delay: Duration::ZERO,
        });
    }

    pub fn add_exit_error_expectation(&self, pattern: &str, code: i32, stderr: &[&str]) {
        self.add_expectation(MockExpectation {
            pattern: pattern.to_string(),
            result: Ok(output(code, &[], stderr)),
            files_to_create: Vec::new(),
            blocks_until_killed: false,
            delay: Duration::ZERO,
        });
    }

    pub fn add_spawn_error_expectation(&self, pattern: &str, error: CoreError) {
        self.add_expectation(MockExpectation {
            pattern: pattern.to_string(),
            result: Err(error),
            files_to_create: Vec::new(),
            blocks_until_killed: false,
            delay: Duration::ZERO,
        });
    }

    /// Expect a command that runs until it is killed.
    pub fn add_blocking_expectation(&self, pattern: &str) {
        self.add_expectation(MockExpectation {
            pattern: pattern.to_string(),
            result: Ok(output(0, &[], &[])),
            files_to_create: Vec::new(),
            blocks_until_killed: true,
            delay: Duration::ZERO,
        });
    }

    /// Expect a command that prints `stdout` and exits 0 after `delay`.
    pub fn add_slow_success_expectation(&self, pattern: &str, delay: Duration, stdout: &[&str]) {
        self.add_expectation(MockExpectation {
            pattern: pattern.to_string(),
            result: Ok(output(0, stdout, &[])),
            files_to_create: Vec::new(),
            blocks_until_killed: false,
            delay,
        });
    }

    pub fn received_calls(&self) -> Vec<CommandSpec> {
        lock(&self.received).clone()
    }

    pub fn received_command_lines(&self) -> Vec<String> {
        lock(&self.received).iter().map(CommandSpec::display).collect()
    }
}

fn output(code: i32, stdout: &[&str], stderr: &[&str]) -> ProcessOutput {
    ProcessOutput {
        code,
        stdout: stdout.iter().map(|s| s.to_string()).collect(),
        stderr: stderr.iter().map(|s| s.to_string()).collect(),
    }
}

impl CommandRunner for MockRunner {
    fn spawn(
        &self,
        spec: &CommandSpec,
        sink: Arc<dyn LineSink>,
    ) -> CoreResult<Arc<dyn ProcessHandle>> {
        let line = spec.display();
        lock(&self.received).push(spec.clone());

        let expectation = {
            let mut expectations = lock(&self.expectations);
            match expectations.iter().position(|e| line.contains(&e.pattern)) {
                Some(index) => expectations.remove(index),
                None => {
                    log::error!("MockRunner: No expectation found for command: {}", line);
                    panic!("MockRunner: No expectation found for command: {}", line);
                }
            }
        };
        log::info!("MockRunner: Matched expectation with pattern '{}'", expectation.pattern);

        let output = expectation.result?;
        for file in &expectation.files_to_create {
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(file)?;
        }
        for l in &output.stdout {
            sink.line(StreamKind::Stdout, l);
        }
        for l in &output.stderr {
            sink.line(StreamKind::Stderr, l);
        }

        Ok(Arc::new(MockProcess {
            output,
            blocks_until_killed: expectation.blocks_until_killed,
            delay: expectation.delay,
            killed: AtomicBool::new(false),
        }))
    }
}
