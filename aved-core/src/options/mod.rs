// ============================================================================
// aved-core/src/options/mod.rs
// ============================================================================
//
// VISION OPTIONS: The mbarivision option record and its field table
//
// Every field is optional. An absent field is left out of both the command
// line and the XML document, which keeps "use the tool's default" distinct
// from "explicitly set to the default value".
//
// The marshallers in `cmdline` and `xml` never touch fields directly; they
// walk `VisionOptions::fields()`, an ordered table of (name, getter, setter)
// entries. Adding an option means adding a struct field and one table row.

pub mod cmdline;
pub mod xml;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};

pub use cmdline::{MbarivisionCommand, frame_range, from_flags};
pub use xml::{from_xml, load_xml, save_xml, to_xml};

macro_rules! option_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        CoreError::InvalidInput(format!(
                            "'{}' is not a valid {}",
                            s,
                            stringify!($name)
                        ))
                    })
            }
        }
    };
}

option_enum! {
    /// How the foreground is separated from the background.
    SegmentAlgorithm {
        MeanAdaptive => "meanadaptive",
        MedianAdaptive => "medianadaptive",
        Best => "best",
        GraphCut => "graphcut",
    }
}

option_enum! {
    /// Image the segmentation runs on.
    SegmentAlgorithmInput {
        DiffMean => "diffmean",
        Luminance => "luminance",
        Rg => "rg",
        Bw => "bw",
    }
}

option_enum! {
    TrackingMode {
        KalmanFilter => "kalmanfilter",
        NearestNeighbor => "nearestneighbor",
        Hough => "hough",
        NearestNeighborHough => "nearestneighborhough",
        KalmanHough => "kalmanhough",
        None => "none",
    }
}

option_enum! {
    /// How detected events are drawn on output frames.
    MarkEventStyle {
        Shape => "shape",
        Outline => "outline",
        BoundingBox => "boundingbox",
        None => "none",
    }
}

option_enum! {
    SaliencyInputImage {
        Raw => "raw",
        DiffMean => "diffmean",
        Max => "max",
    }
}

/// Options passed to mbarivision. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisionOptions {
    pub segment_algorithm: Option<SegmentAlgorithm>,
    pub segment_algorithm_input: Option<SegmentAlgorithmInput>,
    pub tracking_mode: Option<TrackingMode>,
    pub mark_event_style: Option<MarkEventStyle>,
    pub saliency_input_image: Option<SaliencyInputImage>,
    pub min_event_area: Option<u32>,
    pub max_event_area: Option<u32>,
    pub max_evolve_time: Option<u32>,
    pub max_wta_points: Option<u32>,
    pub cache_size: Option<u32>,
    pub opacity: Option<f32>,
    pub event_summary_file: Option<PathBuf>,
    pub event_xml_file: Option<PathBuf>,
    pub event_text_file: Option<PathBuf>,
    pub save_positions_file: Option<PathBuf>,
    pub save_non_interesting: Option<bool>,
    pub save_original_frame_spec: Option<bool>,
    pub label_events: Option<bool>,
    /// Display size as `WxH`
    pub rescale_display: Option<String>,
}

/// A value that can be written to and read from an option argument.
///
/// Text and path values are taken verbatim so `parse_arg(render(v)) == v`.
trait OptionValue: Sized {
    fn render(&self) -> String;
    fn parse_arg(arg: &str) -> Option<Self>;
}

macro_rules! enum_option_value {
    ($($name:ident),+) => {
        $(impl OptionValue for $name {
            fn render(&self) -> String {
                self.as_str().to_string()
            }

            fn parse_arg(arg: &str) -> Option<Self> {
                arg.parse().ok()
            }
        })+
    };
}

enum_option_value!(
    SegmentAlgorithm,
    SegmentAlgorithmInput,
    TrackingMode,
    MarkEventStyle,
    SaliencyInputImage
);

impl OptionValue for u32 {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse_arg(arg: &str) -> Option<Self> {
        arg.trim().parse().ok()
    }
}

impl OptionValue for f32 {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse_arg(arg: &str) -> Option<Self> {
        arg.trim().parse::<f32>().ok().filter(|v| v.is_finite())
    }
}

impl OptionValue for bool {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse_arg(arg: &str) -> Option<Self> {
        match arg.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl OptionValue for PathBuf {
    fn render(&self) -> String {
        self.to_string_lossy().into_owned()
    }

    fn parse_arg(arg: &str) -> Option<Self> {
        Some(PathBuf::from(arg))
    }
}

impl OptionValue for String {
    fn render(&self) -> String {
        self.clone()
    }

    fn parse_arg(arg: &str) -> Option<Self> {
        Some(arg.to_string())
    }
}

fn parse_option<T: OptionValue>(name: &str, arg: &str) -> CoreResult<T> {
    T::parse_arg(arg).ok_or_else(|| CoreError::OptionParse {
        option: name.to_string(),
        value: arg.to_string(),
    })
}

/// One row of the option table.
#[derive(Clone, Copy)]
pub struct OptionField {
    /// Flag and XML option name
    pub name: &'static str,
    pub get: fn(&VisionOptions) -> Option<String>,
    pub set: fn(&mut VisionOptions, &str) -> CoreResult<()>,
}

impl fmt::Debug for OptionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionField").field("name", &self.name).finish()
    }
}

macro_rules! field {
    ($name:literal, $field:ident) => {
        OptionField {
            name: $name,
            get: |o| o.$field.as_ref().map(OptionValue::render),
            set: |o, arg| {
                o.$field = Some(parse_option($name, arg)?);
                Ok(())
            },
        }
    };
}

static FIELDS: &[OptionField] = &[
    field!("segment-algorithm", segment_algorithm),
    field!("segment-algorithm-input-image", segment_algorithm_input),
    field!("tracking-mode", tracking_mode),
    field!("mark-interesting", mark_event_style),
    field!("saliency-input-image", saliency_input_image),
    field!("min-event-area", min_event_area),
    field!("max-event-area", max_event_area),
    field!("max-evolve-time", max_evolve_time),
    field!("max-WTA-points", max_wta_points),
    field!("mbari-cache-size", cache_size),
    field!("opacity", opacity),
    field!("mbari-save-event-summary", event_summary_file),
    field!("mbari-save-events-xml", event_xml_file),
    field!("mbari-save-events", event_text_file),
    field!("mbari-save-positions", save_positions_file),
    field!("mbari-save-non-interesting", save_non_interesting),
    field!("mbari-save-original-frame-spec", save_original_frame_spec),
    field!("mbari-label-events", label_events),
    field!("rescale-output", rescale_display),
];

impl VisionOptions {
    /// The option table in emission order.
    pub fn fields() -> &'static [OptionField] {
        FIELDS
    }

    pub fn field(name: &str) -> Option<&'static OptionField> {
        FIELDS.iter().find(|f| f.name == name)
    }

    /// Present options as (name, value) pairs in emission order.
    pub fn present(&self) -> Vec<(&'static str, String)> {
        FIELDS
            .iter()
            .filter_map(|f| (f.get)(self).map(|v| (f.name, v)))
            .collect()
    }

    /// The rendered value of option `name`, if it is set.
    pub fn get(&self, name: &str) -> Option<String> {
        Self::field(name).and_then(|f| (f.get)(self))
    }

    /// Sets option `name` from its argument text.
    ///
    /// Returns `Ok(false)` when `name` is not a known option.
    pub fn set(&mut self, name: &str, arg: &str) -> CoreResult<bool> {
        match Self::field(name) {
            Some(field) => {
                (field.set)(self, arg)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.present().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_unique() {
        let mut names: Vec<_> = VisionOptions::fields().iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), VisionOptions::fields().len());
    }

    #[test]
    fn test_enum_rendering_and_parsing() {
        assert_eq!(SegmentAlgorithm::MeanAdaptive.to_string(), "meanadaptive");
        assert_eq!(TrackingMode::KalmanFilter.to_string(), "kalmanfilter");
        assert_eq!(MarkEventStyle::BoundingBox.to_string(), "boundingbox");
        assert_eq!(
            "BoundingBox".parse::<MarkEventStyle>().unwrap(),
            MarkEventStyle::BoundingBox
        );
        assert_eq!("NONE".parse::<TrackingMode>().unwrap(), TrackingMode::None);
        assert!("sideways".parse::<TrackingMode>().is_err());
    }

    #[test]
    fn test_get_and_set_by_name() {
        let mut options = VisionOptions::default();
        assert!(options.is_empty());
        assert!(options.set("max-WTA-points", "5").unwrap());
        assert!(options.set("mbari-label-events", "TRUE").unwrap());
        assert!(!options.set("no-such-option", "1").unwrap());

        assert_eq!(options.max_wta_points, Some(5));
        assert_eq!(options.label_events, Some(true));
        assert_eq!(options.get("max-WTA-points").as_deref(), Some("5"));
        assert_eq!(options.get("opacity"), None);
    }

    #[test]
    fn test_bad_value_is_option_parse_error() {
        let mut options = VisionOptions::default();
        let err = options.set("min-event-area", "lots").unwrap_err();
        match err {
            CoreError::OptionParse { option, value } => {
                assert_eq!(option, "min-event-area");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(options.set("opacity", "NaN").is_err());
        assert_eq!(options.min_event_area, None);
    }

    #[test]
    fn test_present_follows_table_order() {
        let options = VisionOptions {
            rescale_display: Some("320x240".to_string()),
            segment_algorithm: Some(SegmentAlgorithm::Best),
            opacity: Some(0.5),
            ..Default::default()
        };
        assert_eq!(
            options.present(),
            vec![
                ("segment-algorithm", "best".to_string()),
                ("opacity", "0.5".to_string()),
                ("rescale-output", "320x240".to_string()),
            ]
        );
    }
}
