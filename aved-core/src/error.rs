// ============================================================================
// aved-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the AVED frame pipeline
//
// KEY COMPONENTS:
// - CoreError: every failure the library reports
// - CoreResult: result alias used across the crate
// - Constructor helpers for the process-related variants
//
// Process failures are split into distinct variants so a caller can tell a
// missing tool from a tool that started and then failed.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced by the frame pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Command not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed waiting for command '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Command '{command}' exited with status {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("A transcode is already running for {0}")]
    AlreadyRunning(String),

    #[error("Invalid value '{value}' for option '{option}'")]
    OptionParse { option: String, value: String },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type for aved-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl From<quick_xml::Error> for CoreError {
    fn from(err: quick_xml::Error) -> Self {
        CoreError::Xml(err.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

/// Builds a `CommandStart` error for `command`.
pub fn command_start_error(command: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(command.into(), err)
}

/// Builds a `CommandWait` error for `command`.
pub fn command_wait_error(command: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(command.into(), err)
}

/// Builds a `CommandFailed` error from an exit status.
///
/// Processes terminated by a signal have no exit code and are reported as -1.
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        command: command.into(),
        code: status.code().unwrap_or(-1),
        stderr: stderr.into(),
    }
}
