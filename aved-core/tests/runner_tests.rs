// aved-core/tests/runner_tests.rs
//
// Process runner behaviour with real child processes.

#![cfg(unix)]

use aved_core::cancel::CancellationToken;
use aved_core::error::CoreError;
use aved_core::external::{
    CommandRunner, CommandSpec, FnSink, LineSink, NullSink, ProcessHandle, StreamKind,
    SystemRunner, run_to_completion, spawn_drained,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn fallbacks() -> Vec<PathBuf> {
    vec![PathBuf::from("/opt/local/bin"), PathBuf::from("/usr/bin")]
}

#[test]
fn test_heavy_output_on_both_streams_does_not_block() {
    // Far beyond a pipe buffer on each stream
    let spec = CommandSpec::shell("seq 1 200000; seq 1 200000 >&2; echo done");

    let stdout_lines = Arc::new(AtomicUsize::new(0));
    let stderr_lines = Arc::new(AtomicUsize::new(0));
    let sink: Arc<dyn LineSink> = {
        let out = Arc::clone(&stdout_lines);
        let err = Arc::clone(&stderr_lines);
        Arc::new(FnSink(move |kind: StreamKind, _line: &str| match kind {
            StreamKind::Stdout => {
                out.fetch_add(1, Ordering::Relaxed);
            }
            StreamKind::Stderr => {
                err.fetch_add(1, Ordering::Relaxed);
            }
        }))
    };

    let output = run_to_completion(&spec, &fallbacks(), sink).expect("command should succeed");
    assert_eq!(output.code, 0);
    assert_eq!(output.stdout.len(), 200_001);
    assert_eq!(output.stderr.len(), 200_000);
    assert_eq!(output.stdout.last().map(String::as_str), Some("done"));
    assert_eq!(stdout_lines.load(Ordering::Relaxed), 200_001);
    assert_eq!(stderr_lines.load(Ordering::Relaxed), 200_000);
}

#[test]
fn test_nonzero_exit_reports_code_and_stderr_tail() {
    let spec = CommandSpec::shell("echo starting; echo 'bad things' >&2; exit 3");
    let err = run_to_completion(&spec, &fallbacks(), Arc::new(NullSink)).unwrap_err();
    match err {
        CoreError::CommandFailed { command, code, stderr } => {
            assert_eq!(command, "sh -c");
            assert_eq!(code, 3);
            assert_eq!(stderr, "bad things");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_runner_run_returns_output_on_failure() {
    let runner = SystemRunner::new(fallbacks());
    let output = runner
        .run(&CommandSpec::shell("echo 'usage: probe' >&2; exit 1"))
        .expect("spawn should succeed");
    assert_eq!(output.code, 1);
    assert_eq!(output.stderr, vec!["usage: probe"]);

    let checked = runner.run_checked(&CommandSpec::shell("exit 4"));
    assert!(matches!(checked, Err(CoreError::CommandFailed { code: 4, .. })));
}

#[test]
fn test_missing_program_is_start_error() {
    let runner = SystemRunner::new(fallbacks());
    let result = runner.spawn(
        &CommandSpec::new("/definitely/not/here/transcode"),
        Arc::new(NullSink),
    );
    assert!(matches!(result, Err(CoreError::CommandStart(..))));
}

#[test]
fn test_child_path_includes_fallbacks() {
    let runner = SystemRunner::new(vec![PathBuf::from("/opt/aved-test/bin")]);
    let output = runner
        .run_checked(&CommandSpec::shell("echo \"$PATH\""))
        .expect("echo should succeed");
    assert!(output.stdout[0].contains("/opt/aved-test/bin"));
}

#[test]
fn test_current_dir_is_applied() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let canonical = dir.path().canonicalize()?;
    let runner = SystemRunner::new(fallbacks());
    let output = runner.run_checked(&CommandSpec::new("pwd").current_dir(&canonical))?;
    assert_eq!(PathBuf::from(&output.stdout[0]), canonical);
    Ok(())
}

#[test]
fn test_kill_stops_long_running_process() {
    let spec = CommandSpec::new("sleep").arg("30");
    let process = spawn_drained(
        &spec,
        &fallbacks(),
        Arc::new(NullSink),
        true,
        CancellationToken::new(),
    )
    .expect("sleep should start");
    assert!(process.id().is_some());
    assert_eq!(process.try_status().expect("status"), None);

    let started = Instant::now();
    process.kill().expect("kill should succeed");
    let output = process.wait().expect("wait should succeed");
    assert_ne!(output.code, 0);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(process.try_status().expect("status"), Some(output.code));

    // Killing an exited process is a no-op; waiting again returns the same code
    process.kill().expect("second kill is a no-op");
    assert_eq!(process.wait().expect("second wait").code, output.code);
}
