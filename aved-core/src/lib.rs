//! Core library for the AVED frame pipeline.
//!
//! This crate finds the external video tools on the host, runs them with
//! both output streams drained concurrently, turns videos and frame archives
//! into numbered frame sequences, and builds mbarivision invocations and
//! option files from a `VisionOptions` record.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use aved_core::{AppContext, CoreConfig, TranscodeJob};
//! use std::sync::Arc;
//!
//! let ctx = Arc::new(AppContext::new(CoreConfig::from_env()));
//! let job = TranscodeJob::new(Arc::clone(&ctx), "/videos/dive.avi", "/frames/dive").unwrap();
//! job.run().unwrap();
//!
//! let descriptor = job.descriptor();
//! println!("{} frames named {:?}", descriptor.frame_count.unwrap_or(0), descriptor.frame_stem);
//! ```

pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod external;
pub mod logging;
pub mod options;
pub mod transcode;
pub mod util;
pub mod video;

// Re-exports for public API
pub use cancel::CancellationToken;
pub use config::{CoreConfig, CoreConfigBuilder};
pub use context::{AppContext, CommandHistory, ErrorLog};
pub use error::{CoreError, CoreResult};
pub use external::{
    CommandRunner, CommandSpec, ProbeOutcome, Prober, ProcessOutput, ToolLocator, locate,
};
pub use options::{MbarivisionCommand, VisionOptions};
pub use transcode::{JobState, SourceKind, TranscodeJob};
pub use video::{FrameNaming, VideoDescriptor};
