// ============================================================================
// aved-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with External CLI Tools
//
// This module encapsulates everything that touches other programs: finding
// them, building their environment, launching them and draining their
// output. The orchestrator only reaches processes through the `Prober` and
// `CommandRunner` traits, so tests can swap in the mocks.
//
// KEY COMPONENTS:
// - environment: child PATH augmentation and search directory lists
// - locator: probing candidates to find a tool (ToolLocator)
// - runner: spawning with concurrent stream draining (CommandRunner)
// - mocks: test doubles, behind the "test-mocks" feature

pub mod environment;
pub mod locator;
pub mod runner;

#[cfg(feature = "test-mocks")]
pub mod mocks;

pub use locator::{ProbeOutcome, Prober, ProcessProber, ToolLocator, locate};
pub use runner::{
    CommandRunner, CommandSpec, FnSink, LineSink, LogSink, NullSink, ProcessHandle, ProcessOutput,
    RunningProcess, StreamKind, SystemRunner, run_to_completion, spawn_drained,
};

