// aved-core/tests/locator_tests.rs
//
// Locator behaviour against real executables written into temp directories.

#![cfg(unix)]

use aved_core::error::CoreError;
use aved_core::external::{ProbeOutcome, Prober, ProcessProber, locate};
use aved_core::external::mocks::MockProber;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to chmod script");
    path
}

#[test]
fn test_process_prober_outcomes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let timeout = Duration::from_millis(300);

    let usage = write_script(dir.path(), "usage", "echo 'usage: usage [opts]' >&2; exit 1");
    let clean = write_script(dir.path(), "clean", "exit 0");
    let hung = write_script(dir.path(), "hung", "sleep 10");
    let plain = dir.path().join("plain");
    fs::write(&plain, "not executable")?;

    assert_eq!(ProcessProber.probe(&usage, timeout), ProbeOutcome::ExitedWithStatus(1));
    assert_eq!(ProcessProber.probe(&clean, timeout), ProbeOutcome::ExitedCleanly);
    assert_eq!(ProcessProber.probe(&dir.path().join("absent"), timeout), ProbeOutcome::Missing);
    assert_eq!(ProcessProber.probe(&plain, timeout), ProbeOutcome::Missing);

    let started = Instant::now();
    assert_eq!(ProcessProber.probe(&hung, timeout), ProbeOutcome::Hung);
    assert!(started.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[test]
fn test_locate_skips_to_second_directory() -> Result<(), Box<dyn std::error::Error>> {
    let d1 = tempdir()?;
    let d2 = tempdir()?;
    let tool = write_script(d2.path(), "transcode", "exit 1");

    let dirs = vec![d1.path().to_path_buf(), d2.path().to_path_buf()];
    let found = locate("transcode", &dirs, &ProcessProber, Duration::from_secs(1))?;
    assert_eq!(found, tool);
    Ok(())
}

#[test]
fn test_locate_treats_clean_exit_as_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let d1 = tempdir()?;
    write_script(d1.path(), "tcprobe", "exit 0");

    let dirs = vec![d1.path().to_path_buf()];
    let err = locate("tcprobe", &dirs, &ProcessProber, Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, CoreError::ToolNotFound(ref name) if name == "tcprobe"));
    Ok(())
}

#[test]
fn test_hung_tool_is_found_in_first_directory() -> Result<(), Box<dyn std::error::Error>> {
    let d1 = tempdir()?;
    let d2 = tempdir()?;
    let hung = write_script(d1.path(), "avidump", "sleep 10");
    write_script(d2.path(), "avidump", "exit 1");

    let dirs = vec![d1.path().to_path_buf(), d2.path().to_path_buf()];
    let found = locate("avidump", &dirs, &ProcessProber, Duration::from_millis(200))?;
    assert_eq!(found, hung);
    Ok(())
}

#[test]
fn test_probe_counts_with_mock_prober() {
    let dirs = vec![PathBuf::from("/d1"), PathBuf::from("/d2")];

    let prober = MockProber::new();
    prober.set_outcome("/d2/transcode", ProbeOutcome::ExitedWithStatus(2));
    let found = locate("transcode", &dirs, &prober, Duration::from_secs(1)).unwrap();
    assert_eq!(found, PathBuf::from("/d2/transcode"));
    assert_eq!(prober.calls().len(), 2);

    let prober = MockProber::new();
    prober.set_outcome("/d1/transcode", ProbeOutcome::Hung);
    prober.set_outcome("/d2/transcode", ProbeOutcome::ExitedWithStatus(2));
    let found = locate("transcode", &dirs, &prober, Duration::from_secs(1)).unwrap();
    assert_eq!(found, PathBuf::from("/d1/transcode"));
    assert_eq!(prober.calls().len(), 1);
}
