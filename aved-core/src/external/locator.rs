// ============================================================================
// aved-core/src/external/locator.rs
// ============================================================================
//
// TOOL LOCATOR: Finding external binaries by probing candidates
//
// Each candidate `<dir>/<name>` is launched once with no arguments and a
// short timeout. The outcome decides whether the search stops:
//
// - spawn fails (missing, not executable)      -> keep searching
// - exits with status 0 before the timeout      -> keep searching
// - exits with a non-zero status                -> found
// - still running at the timeout (killed)       -> found
//
// The tools this is used for (transcode and friends) print usage and exit
// non-zero when given no arguments, or sit waiting for input.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};

use super::environment;

/// What happened when a candidate was probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The candidate could not be started.
    Missing,
    /// The candidate exited with status 0 within the timeout.
    ExitedCleanly,
    /// The candidate exited with a non-zero status (or a signal, as -1).
    ExitedWithStatus(i32),
    /// The candidate was still running at the timeout and was killed.
    Hung,
}

impl ProbeOutcome {
    /// Whether this outcome ends the search with the probed path.
    pub fn is_found(self) -> bool {
        matches!(self, ProbeOutcome::ExitedWithStatus(_) | ProbeOutcome::Hung)
    }
}

/// Something that can probe a candidate executable.
pub trait Prober: Send + Sync {
    fn probe(&self, candidate: &Path, timeout: Duration) -> ProbeOutcome;
}

/// Probes candidates by launching them as real processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessProber;

impl Prober for ProcessProber {
    fn probe(&self, candidate: &Path, timeout: Duration) -> ProbeOutcome {
        let mut child = match Command::new(candidate)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                log::trace!("Probe of {} failed to start: {}", candidate.display(), e);
                return ProbeOutcome::Missing;
            }
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return ProbeOutcome::ExitedCleanly,
                Ok(Some(status)) => {
                    return ProbeOutcome::ExitedWithStatus(status.code().unwrap_or(-1));
                }
                Ok(None) if Instant::now() >= deadline => {
                    log::debug!(
                        "Probe of {} still running after {:?}, killing it",
                        candidate.display(),
                        timeout
                    );
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill probe {}: {}", candidate.display(), e);
                    }
                    let _ = child.wait();
                    return ProbeOutcome::Hung;
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(10)),
                Err(e) => {
                    log::warn!("Error waiting for probe {}: {}", candidate.display(), e);
                    let _ = child.kill();
                    let _ = child.wait();
                    return ProbeOutcome::Missing;
                }
            }
        }
    }
}

/// Searches `dirs` in order for `cmd`, probing each candidate once.
pub fn locate(
    cmd: &str,
    dirs: &[PathBuf],
    prober: &dyn Prober,
    timeout: Duration,
) -> CoreResult<PathBuf> {
    for dir in dirs {
        let candidate = dir.join(cmd);
        let outcome = prober.probe(&candidate, timeout);
        log::trace!("Probed {}: {:?}", candidate.display(), outcome);
        if outcome.is_found() {
            log::debug!("Located {} at {}", cmd, candidate.display());
            return Ok(candidate);
        }
    }
    log::warn!("Command '{}' not found in {} director(ies)", cmd, dirs.len());
    Err(CoreError::ToolNotFound(cmd.to_string()))
}

/// A configured locator: directories, prober and timeout.
#[derive(Clone)]
pub struct ToolLocator {
    dirs: Vec<PathBuf>,
    prober: Arc<dyn Prober>,
    timeout: Duration,
}

impl ToolLocator {
    pub fn new(dirs: Vec<PathBuf>, prober: Arc<dyn Prober>, timeout: Duration) -> Self {
        Self { dirs, prober, timeout }
    }

    /// Searches the current `PATH` followed by the configured fallbacks.
    pub fn from_config(config: &CoreConfig, prober: Arc<dyn Prober>) -> Self {
        let dirs = environment::search_dirs(
            std::env::var_os("PATH").as_deref(),
            &config.fallback_dirs,
        );
        Self::new(dirs, prober, config.probe_timeout)
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn locate(&self, cmd: &str) -> CoreResult<PathBuf> {
        locate(cmd, &self.dirs, self.prober.as_ref(), self.timeout)
    }
}

impl std::fmt::Debug for ToolLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolLocator")
            .field("dirs", &self.dirs)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct TableProber {
        outcomes: HashMap<PathBuf, ProbeOutcome>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl Prober for TableProber {
        fn probe(&self, candidate: &Path, _timeout: Duration) -> ProbeOutcome {
            self.calls.lock().unwrap().push(candidate.to_path_buf());
            self.outcomes
                .get(candidate)
                .copied()
                .unwrap_or(ProbeOutcome::Missing)
        }
    }

    fn prober(entries: &[(&str, ProbeOutcome)]) -> TableProber {
        TableProber {
            outcomes: entries
                .iter()
                .map(|(p, o)| (PathBuf::from(p), *o))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_clean_exit_keeps_searching() {
        let p = prober(&[
            ("/d1/transcode", ProbeOutcome::ExitedCleanly),
            ("/d2/transcode", ProbeOutcome::ExitedWithStatus(1)),
        ]);
        let dirs = vec![PathBuf::from("/d1"), PathBuf::from("/d2")];
        let found = locate("transcode", &dirs, &p, Duration::from_secs(1)).unwrap();
        assert_eq!(found, PathBuf::from("/d2/transcode"));
        assert_eq!(p.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_not_found_after_all_dirs() {
        let p = prober(&[]);
        let dirs = vec![PathBuf::from("/d1"), PathBuf::from("/d2"), PathBuf::from("/d3")];
        let err = locate("tcprobe", &dirs, &p, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CoreError::ToolNotFound(ref name) if name == "tcprobe"));
        assert_eq!(p.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_outcome_is_found() {
        assert!(ProbeOutcome::Hung.is_found());
        assert!(ProbeOutcome::ExitedWithStatus(-1).is_found());
        assert!(!ProbeOutcome::ExitedCleanly.is_found());
        assert!(!ProbeOutcome::Missing.is_found());
    }
}
