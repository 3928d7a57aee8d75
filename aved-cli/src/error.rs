// aved-cli/src/error.rs
//
// Commands return the core error type directly. When a failure needs to say
// which file or step it came from, `cli_context` folds that into an
// `OperationFailed` message, which main prints as `Error: <message>`.

use aved_core::{CoreError, CoreResult};

use std::fmt;

pub type CliResult<T> = CoreResult<T>;

/// Prefixes a failed result with what the command was doing.
pub trait CliErrorContext<T> {
    fn cli_context<C: fmt::Display>(self, context: C) -> CliResult<T>;

    /// Like `cli_context`, but only builds the message on failure.
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E: Into<CoreError>> CliErrorContext<T> for Result<T, E> {
    fn cli_context<C: fmt::Display>(self, context: C) -> CliResult<T> {
        self.cli_with_context(|| context)
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let cause: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), cause))
        })
    }
}
