// ============================================================================
// aved-core/src/transcode/mod.rs
// ============================================================================
//
// TRANSCODE: Videos and frame archives into numbered frame files
//
// - source: classifies an input by extension
// - codec: scrapes tcprobe/avidump output and maps codecs to import flags
// - command: builds the tar/gunzip/transcode command lines
// - inference: works out the frame naming from the files on disk
// - job: the TranscodeJob state machine tying these together

pub mod codec;
pub mod command;
pub mod inference;
pub mod job;
pub mod source;

pub use codec::{CodecFamily, ProbeReport};
pub use inference::{infer_frame_naming, infer_from_names};
pub use job::{JobState, TranscodeJob};
pub use source::{SourceKind, VideoContainer, video_name};
