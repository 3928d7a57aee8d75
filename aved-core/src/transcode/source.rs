//! Classification of transcode inputs by file extension.

use std::path::Path;

/// Video containers that get distinct handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    /// AVI: probed with tcprobe/avidump to pick codec flags
    Avi,
    Mpeg,
    Other,
}

/// What kind of input a transcode job was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A frame archive, extracted with tar (through gunzip when compressed)
    Archive { gzipped: bool },
    Video(VideoContainer),
    /// Unrecognised extension: handed to transcode without codec flags
    Unknown,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("tar") => SourceKind::Archive { gzipped: false },
            Some("gz") | Some("tgz") => SourceKind::Archive { gzipped: true },
            Some("avi") => SourceKind::Video(VideoContainer::Avi),
            Some("mpeg") | Some("mpg") => SourceKind::Video(VideoContainer::Mpeg),
            Some("mov") | Some("mp4") | Some("m4v") | Some("dv") | Some("mts") => {
                SourceKind::Video(VideoContainer::Other)
            }
            _ => SourceKind::Unknown,
        }
    }

    pub fn is_archive(self) -> bool {
        matches!(self, SourceKind::Archive { .. })
    }

    /// Whether the transcode binary has to be located for this input.
    pub fn needs_transcoder(self) -> bool {
        !self.is_archive()
    }
}

/// Name of the video a source holds: the file name without its extension,
/// treating `.tar.gz` as a single extension.
pub fn video_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = file_name.to_ascii_lowercase();
    for suffix in [".tar.gz", ".tgz", ".tar", ".gz"] {
        if lower.ends_with(suffix) && lower.len() > suffix.len() {
            return file_name[..file_name.len() - suffix.len()].to_string();
        }
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(file_name)
}
