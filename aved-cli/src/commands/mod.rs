//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// `aved transcode`: runs one transcode job and reports the frames it produced.
pub mod transcode;

/// `aved locate`: resolves a tool name to a path with the pipeline's locator.
pub mod locate;

/// `aved options`: inspects and converts mbarivision option files.
pub mod options;
