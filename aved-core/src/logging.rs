// ============================================================================
// aved-core/src/logging.rs
// ============================================================================
//
// FILE LOGGING: log4rs setup for run logs
//
// The library itself only uses the `log` facade. Front ends that want a
// persistent log call `setup_file_logging` once at startup; it installs a
// log4rs logger that writes to the given file and, optionally, mirrors
// records to stderr so console output is kept.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";
const CONSOLE_PATTERN: &str = "[{l}] {m}{n}";

/// `aved_<command>_<timestamp>.log` inside `log_dir`.
pub fn log_file_path(log_dir: &Path, command: &str, timestamp: &str) -> PathBuf {
    log_dir.join(format!("aved_{}_{}.log", command, timestamp))
}

/// Installs a global log4rs logger writing to `log_file`.
///
/// Fails if a global logger is already installed.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter, mirror_to_stderr: bool) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(log_file)?;

    let mut builder =
        Config::builder().appender(Appender::builder().build("file", Box::new(file_appender)));
    let mut root = Root::builder().appender("file");

    if mirror_to_stderr {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stderr", Box::new(console)));
        root = root.appender("stderr");
    }

    let config = builder.build(root.build(log_level))?;
    log4rs::init_config(config)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        let path = log_file_path(Path::new("/var/log/aved"), "transcode", "20240601_123045");
        assert_eq!(path, Path::new("/var/log/aved/aved_transcode_20240601_123045.log"));
    }
}
