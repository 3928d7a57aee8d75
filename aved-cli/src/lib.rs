// aved-cli/src/lib.rs
//
// Library portion of the AVED CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, LocateArgs, OptionsArgs, OptionsCommand, TranscodeArgs};
pub use commands::locate::run_locate;
pub use commands::options::run_options;
pub use commands::transcode::run_transcode;
pub use error::{CliErrorContext, CliResult};
