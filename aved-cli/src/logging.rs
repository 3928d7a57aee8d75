// ============================================================================
// aved-cli/src/logging.rs
// ============================================================================
//
// LOGGING: Console and optional file logging for the CLI
//
// Without `--log-dir` the console logger is env_logger (RUST_LOG is honoured,
// `--verbose` raises the default to debug). With `--log-dir` the core's
// log4rs setup writes `aved_<command>_<timestamp>.log` and mirrors records
// to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};

use console::style;
use log::LevelFilter;

use aved_core::logging::{log_file_path, setup_file_logging};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// ```
/// let name = format!("aved_transcode_{}.log", aved_cli::logging::get_timestamp());
/// assert!(name.len() > "aved_transcode_.log".len());
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose { LevelFilter::Debug } else { LevelFilter::Info }
}

/// Initializes logging; returns the log file path when one is written.
pub fn init(verbose: bool, log_dir: Option<&Path>, command: &str) -> anyhow::Result<Option<PathBuf>> {
    let level = level_for(verbose);
    match log_dir {
        Some(dir) => {
            let path = log_file_path(dir, command, &get_timestamp());
            setup_file_logging(&path, level, true)?;
            log::debug!("Logging to {}", path.display());
            Ok(Some(path))
        }
        None => {
            init_console(level);
            Ok(None)
        }
    }
}

fn init_console(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    // RUST_LOG still wins when set
    builder.parse_default_env();
    builder.format(|buf, record| {
        let level = match record.level() {
            log::Level::Error => style("ERROR").red().bold(),
            log::Level::Warn => style("WARN ").yellow(),
            log::Level::Info => style("INFO ").green(),
            log::Level::Debug => style("DEBUG").blue(),
            log::Level::Trace => style("TRACE").magenta(),
        };
        writeln!(buf, "{} {}", level, record.args())
    });
    // A logger may already be installed (tests calling into commands)
    if let Err(e) = builder.try_init() {
        log::debug!("Console logger not installed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(true), LevelFilter::Debug);
        assert_eq!(level_for(false), LevelFilter::Info);
    }
}
