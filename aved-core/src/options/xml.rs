//! Vision options as an `MbarivisionOptions` XML document.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <MbarivisionOptions xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
//!     xsi:noNamespaceSchemaLocation="http://www.mbari.org/aved/xml/MbarivisionOptions.xsd">
//!   <Option option="segment-algorithm" argument="meanadaptive"/>
//! </MbarivisionOptions>
//! ```
//!
//! The schema location is declared for compatibility and never fetched.

use std::io::Write as _;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::error::{CoreError, CoreResult};

use super::VisionOptions;

const ROOT: &str = "MbarivisionOptions";
const OPTION: &str = "Option";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str = "http://www.mbari.org/aved/xml/MbarivisionOptions.xsd";

/// Writes the present options as an XML document.
pub fn to_xml(options: &VisionOptions) -> CoreResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(ROOT);
    root.push_attribute(("xmlns:xsi", XSI_NS));
    root.push_attribute(("xsi:noNamespaceSchemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(root))?;

    for (name, value) in options.present() {
        let mut element = BytesStart::new(OPTION);
        element.push_attribute(("option", name));
        element.push_attribute(("argument", value.as_str()));
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| CoreError::Xml(e.to_string()))
}

/// Parses an options document.
///
/// Option names are matched exactly; unknown names are skipped.
pub fn from_xml(content: &str) -> CoreResult<VisionOptions> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut options = VisionOptions::default();
    let mut seen_root = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 0 {
                    check_root(&e, &mut seen_root)?;
                } else if e.name().as_ref() == OPTION.as_bytes() {
                    apply_option(&e, &mut options)?;
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    check_root(&e, &mut seen_root)?;
                } else if e.name().as_ref() == OPTION.as_bytes() {
                    apply_option(&e, &mut options)?;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(CoreError::Xml(format!("No {} element", ROOT)));
    }
    if depth != 0 {
        return Err(CoreError::Xml(format!("Unclosed {} element", ROOT)));
    }
    Ok(options)
}

fn check_root(element: &BytesStart<'_>, seen_root: &mut bool) -> CoreResult<()> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    if name != ROOT {
        return Err(CoreError::Xml(format!(
            "Expected {} as the root element, found {}",
            ROOT, name
        )));
    }
    if *seen_root {
        return Err(CoreError::Xml(format!("More than one {} element", ROOT)));
    }
    *seen_root = true;
    Ok(())
}

fn apply_option(element: &BytesStart<'_>, options: &mut VisionOptions) -> CoreResult<()> {
    let mut name = None;
    let mut argument = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| CoreError::Xml(e.to_string()))?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"option" => name = Some(value),
            b"argument" => argument = Some(value),
            _ => {}
        }
    }

    let Some(name) = name else {
        log::debug!("Skipping Option element without an option attribute");
        return Ok(());
    };
    let argument = argument.unwrap_or_default();
    if !options.set(&name, &argument)? {
        log::debug!("Ignoring unknown option '{}'", name);
    }
    Ok(())
}

/// Writes `options` to `path`, replacing it atomically.
pub fn save_xml(options: &VisionOptions, path: &Path) -> CoreResult<()> {
    let document = to_xml(options)?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(document.as_bytes())?;
    file.persist(path).map_err(|e| CoreError::Io(e.error))?;
    log::debug!("Saved vision options to {}", path.display());
    Ok(())
}

pub fn load_xml(path: &Path) -> CoreResult<VisionOptions> {
    let content = std::fs::read_to_string(path)?;
    from_xml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{MarkEventStyle, SegmentAlgorithm};
    use std::path::PathBuf;

    fn sample() -> VisionOptions {
        VisionOptions {
            segment_algorithm: Some(SegmentAlgorithm::GraphCut),
            mark_event_style: Some(MarkEventStyle::BoundingBox),
            max_event_area: Some(3000),
            opacity: Some(0.75),
            event_xml_file: Some(PathBuf::from("/tmp/events & more.xml")),
            label_events: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_document_layout() {
        let xml = to_xml(&sample()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<MbarivisionOptions xmlns:xsi="#));
        assert!(xml.contains(r#"<Option option="segment-algorithm" argument="graphcut"/>"#));
        assert!(xml.contains(r#"argument="/tmp/events &amp; more.xml""#));
        assert!(!xml.contains("tracking-mode"));
    }

    #[test]
    fn test_empty_options_document() {
        let xml = to_xml(&VisionOptions::default()).unwrap();
        assert_eq!(from_xml(&xml).unwrap(), VisionOptions::default());
    }

    #[test]
    fn test_round_trip() {
        let options = sample();
        assert_eq!(from_xml(&to_xml(&options).unwrap()).unwrap(), options);
    }

    #[test]
    fn test_unknown_options_ignored() {
        let xml = r#"<?xml version="1.0"?>
            <MbarivisionOptions>
              <Option option="retired-option" argument="7"/>
              <Option option="min-event-area" argument="12"></Option>
            </MbarivisionOptions>"#;
        let options = from_xml(xml).unwrap();
        assert_eq!(options.min_event_area, Some(12));
        assert_eq!(options.present().len(), 1);
    }

    #[test]
    fn test_bad_argument_is_option_parse() {
        let xml = r#"<MbarivisionOptions><Option option="max-evolve-time" argument="-4"/></MbarivisionOptions>"#;
        assert!(matches!(from_xml(xml), Err(CoreError::OptionParse { .. })));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(from_xml(""), Err(CoreError::Xml(_))));
        assert!(matches!(from_xml("<Other/>"), Err(CoreError::Xml(_))));
        assert!(matches!(
            from_xml("<MbarivisionOptions><Option option=\"opacity\""),
            Err(CoreError::Xml(_))
        ));
        assert!(matches!(
            from_xml("<MbarivisionOptions></Wrong>"),
            Err(CoreError::Xml(_))
        ));
    }

    #[test]
    fn test_save_and_load() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("options.xml");
        save_xml(&sample(), &path)?;
        assert_eq!(load_xml(&path)?, sample());

        // Saving again replaces the file
        save_xml(&VisionOptions::default(), &path)?;
        assert!(load_xml(&path)?.is_empty());
        Ok(())
    }
}
