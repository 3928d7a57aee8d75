//! Video descriptor: what is known about a source and its frame sequence.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Naming convention of a frame sequence found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameNaming {
    /// Text before the frame number (`f` for `f000123.ppm`)
    pub stem: String,
    /// Digits in the frame number (6 for `f000123.ppm`)
    pub digit_width: usize,
    /// Extension without the dot
    pub extension: String,
    /// Number of frames that follow this convention
    pub frame_count: u64,
}

/// A source accepted for transcoding and the frames produced from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoDescriptor {
    pub name: String,
    pub frame_count: Option<u64>,
    pub output_dir: PathBuf,
    pub frame_stem: Option<String>,
    pub digit_width: Option<usize>,
    pub frame_extension: Option<String>,
}

impl VideoDescriptor {
    pub fn new(name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            frame_count: None,
            output_dir: output_dir.into(),
            frame_stem: None,
            digit_width: None,
            frame_extension: None,
        }
    }

    /// Records an inferred naming convention, including the frame count.
    pub fn apply_naming(&mut self, naming: FrameNaming) {
        self.frame_stem = Some(naming.stem);
        self.digit_width = Some(naming.digit_width);
        self.frame_extension = Some(naming.extension);
        self.frame_count = Some(naming.frame_count);
    }

    /// Forgets everything discovered about the frames.
    pub fn reset(&mut self) {
        self.frame_count = None;
        self.frame_stem = None;
        self.digit_width = None;
        self.frame_extension = None;
    }

    pub fn is_complete(&self) -> bool {
        self.frame_count.is_some()
            && self.frame_stem.is_some()
            && self.digit_width.is_some()
            && self.frame_extension.is_some()
    }

    /// Path of frame `n`, once the naming convention is known.
    pub fn frame_path(&self, n: u64) -> Option<PathBuf> {
        let stem = self.frame_stem.as_deref()?;
        let width = self.digit_width?;
        let ext = self.frame_extension.as_deref()?;
        Some(self.output_dir.join(format!("{stem}{n:0width$}.{ext}")))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_path_requires_naming() {
        let desc = VideoDescriptor::new("clip", "/frames");
        assert!(desc.frame_path(0).is_none());
        assert!(!desc.is_complete());
    }

    #[test]
    fn test_frame_path_pads_number() {
        let mut desc = VideoDescriptor::new("clip", "/frames");
        desc.apply_naming(FrameNaming {
            stem: "f".to_string(),
            digit_width: 6,
            extension: "ppm".to_string(),
            frame_count: 120,
        });
        assert!(desc.is_complete());
        assert_eq!(desc.frame_count, Some(120));
        assert_eq!(desc.frame_path(42), Some(PathBuf::from("/frames/f000042.ppm")));
    }

    #[test]
    fn test_reset_clears_discoveries() {
        let mut desc = VideoDescriptor::new("clip", "/frames");
        desc.frame_count = Some(10);
        desc.frame_stem = Some("f".into());
        desc.reset();
        assert_eq!(desc, VideoDescriptor::new("clip", "/frames"));
    }
}
