//! Codec detection for AVI sources.
//!
//! transcode needs an explicit import module for some AVI codecs. The codec
//! is scraped from `avidump` (`compressor: DX50`) and `tcprobe`
//! (`codec=DX50`); avidump wins when both report one. tcprobe also reports
//! the frame count (`length: 1234 frames, ...`).

use once_cell::sync::Lazy;
use regex::Regex;

static COMPRESSOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)compressor:\s*([A-Za-z0-9_]+)").expect("valid regex"));

static TCPROBE_CODEC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)codec=([A-Za-z0-9_]+)").expect("valid regex"));

static TCPROBE_FRAMES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)length:\s*(\d+)\s+frames").expect("valid regex"));

/// What tcprobe told us about a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub codec: Option<String>,
    pub frame_count: Option<u64>,
}

pub fn parse_tcprobe<'a>(lines: impl IntoIterator<Item = &'a str>) -> ProbeReport {
    let mut report = ProbeReport::default();
    for line in lines {
        if report.codec.is_none() {
            if let Some(caps) = TCPROBE_CODEC_RE.captures(line) {
                report.codec = Some(caps[1].to_string());
            }
        }
        if report.frame_count.is_none() {
            if let Some(caps) = TCPROBE_FRAMES_RE.captures(line) {
                report.frame_count = caps[1].parse().ok();
            }
        }
    }
    report
}

/// First `compressor:` value in avidump output.
pub fn parse_avidump_compressor<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    lines
        .into_iter()
        .find_map(|line| COMPRESSOR_RE.captures(line).map(|caps| caps[1].to_string()))
}

/// transcode import module families for the codecs that need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecFamily {
    /// MPEG-4 part 2 (DivX 5, DivX, XviD): `-x ffmpeg,null`
    Ffmpeg,
    /// DV: `-x dv,null`
    Dv,
    /// Motion JPEG: `-x mplayer,null`
    Mplayer,
    /// Let transcode autodetect
    Default,
}

impl CodecFamily {
    pub fn from_fourcc(fourcc: &str) -> Self {
        match fourcc.to_ascii_uppercase().as_str() {
            "DX50" | "DIVX" | "XVID" => CodecFamily::Ffmpeg,
            "DVSD" | "DV25" => CodecFamily::Dv,
            "MJPG" => CodecFamily::Mplayer,
            _ => CodecFamily::Default,
        }
    }

    /// transcode arguments selecting the import module.
    pub fn transcode_flags(self) -> Vec<String> {
        let module = match self {
            CodecFamily::Ffmpeg => "ffmpeg,null",
            CodecFamily::Dv => "dv,null",
            CodecFamily::Mplayer => "mplayer,null",
            CodecFamily::Default => return Vec::new(),
        };
        vec!["-x".to_string(), module.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCPROBE_OUTPUT: &[&str] = &[
        "[tcprobe] RIFF data, AVI video",
        "[avilib] V: 29.970 fps, codec=DX50, frames=900, width=720, height=480",
        "[tcprobe] summary for dive.avi, (*) = not default, 0 = not detected",
        "import frame size: -g 720x480 [720x576] (*)",
        "       frame rate: -f 29.970 [25.000] frc=4 (*)",
        "           length: 900 frames, frame_time=33 msec, duration=0:00:30.030",
    ];

    #[test]
    fn test_parse_tcprobe() {
        let report = parse_tcprobe(TCPROBE_OUTPUT.iter().copied());
        assert_eq!(report.codec.as_deref(), Some("DX50"));
        assert_eq!(report.frame_count, Some(900));
    }

    #[test]
    fn test_parse_tcprobe_empty() {
        assert_eq!(parse_tcprobe(["no such file"]), ProbeReport::default());
    }

    #[test]
    fn test_parse_avidump_compressor() {
        let lines = [
            "AVI header:",
            "  streams: 2",
            "  stream 0 video: compressor: DX50 size: 720x480",
            "  stream 1 audio: compressor: 0055",
        ];
        assert_eq!(parse_avidump_compressor(lines), Some("DX50".to_string()));
        assert_eq!(parse_avidump_compressor(["nothing"]), None);
    }

    #[test]
    fn test_codec_flags() {
        assert_eq!(
            CodecFamily::from_fourcc("dx50").transcode_flags(),
            vec!["-x", "ffmpeg,null"]
        );
        assert_eq!(CodecFamily::from_fourcc("dvsd"), CodecFamily::Dv);
        assert_eq!(CodecFamily::from_fourcc("MJPG").transcode_flags(), vec!["-x", "mplayer,null"]);
        assert!(CodecFamily::from_fourcc("IV50").transcode_flags().is_empty());
    }
}
