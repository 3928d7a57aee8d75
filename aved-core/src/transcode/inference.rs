//! Frame naming inference over a transcode output directory.
//!
//! A frame file name is `<stem><digits>.<ext>`. From a single file the stem
//! and the number cannot be told apart when the stem itself ends in digits
//! (`dive2004_000001.ppm` is fine, `clip7000001.ppm` is not). Two things keep
//! that from mattering in practice:
//!
//! - when the caller knows the prefix it asked the tool for (transcode's
//!   `-o <dir>/f`), files are matched against that prefix exactly;
//! - otherwise every file is considered and the largest group sharing a
//!   digit-stripped stem and extension wins, so stray files do not decide
//!   the convention. Within that group, leading digits that are non-zero
//!   and identical in every equally wide number move into the stem, since
//!   zero padding never starts with them (`clip7000001..clip7000010` gives
//!   stem `clip7`, width 6).
//!
//! A lone frame with no known prefix is still split at the trailing digit
//! run and logged as ambiguous.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::CoreResult;
use crate::video::FrameNaming;

static FRAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<stem>.*?)(?P<digits>\d+)\.(?P<ext>[A-Za-z0-9]+)$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameName {
    stem: String,
    digits: String,
    extension: String,
}

fn split_frame_name(name: &str) -> Option<FrameName> {
    let caps = FRAME_RE.captures(name)?;
    Some(FrameName {
        stem: caps["stem"].to_string(),
        digits: caps["digits"].to_string(),
        extension: caps["ext"].to_string(),
    })
}

/// Splits `name` using a known stem; the rest must be `<digits>.<ext>`.
fn split_with_prefix(name: &str, prefix: &str) -> Option<FrameName> {
    let rest = name.strip_prefix(prefix)?;
    let (digits, ext) = rest.split_once('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(FrameName {
        stem: prefix.to_string(),
        digits: digits.to_string(),
        extension: ext.to_string(),
    })
}

/// Count of leading digits that are the same non-zero digit in every
/// number. Only applies to two or more numbers of equal width, and always
/// leaves at least one digit.
fn shared_leading_digits(numbers: &[String]) -> usize {
    let Some(first) = numbers.first() else {
        return 0;
    };
    if numbers.len() < 2 || numbers.iter().any(|n| n.len() != first.len()) {
        return 0;
    }
    first
        .bytes()
        .take(first.len() - 1)
        .enumerate()
        .take_while(|&(i, digit)| digit != b'0' && numbers.iter().all(|n| n.as_bytes()[i] == digit))
        .count()
}

/// Names of the regular files directly inside `dir`.
fn list_file_names(dir: &Path) -> CoreResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Infers the naming of the frames in `dir`.
///
/// Returns `Ok(None)` when no file looks like a frame.
pub fn infer_frame_naming(dir: &Path, expected_prefix: Option<&str>) -> CoreResult<Option<FrameNaming>> {
    let names = list_file_names(dir)?;
    Ok(infer_from_names(&names, expected_prefix))
}

/// Inference over a list of file names, independent of the file system.
pub fn infer_from_names(names: &[String], expected_prefix: Option<&str>) -> Option<FrameNaming> {
    let parsed: Vec<FrameName> = match expected_prefix {
        Some(prefix) => names
            .iter()
            .filter_map(|n| split_with_prefix(n, prefix))
            .collect(),
        None => names.iter().filter_map(|n| split_frame_name(n)).collect(),
    };

    // Group by (stem, extension); BTreeMap keeps ties deterministic
    let mut groups: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    for frame in parsed {
        groups
            .entry((frame.stem, frame.extension))
            .or_default()
            .push(frame.digits);
    }

    let ((mut stem, extension), numbers) = groups
        .into_iter()
        .max_by(|(ka, a), (kb, b)| a.len().cmp(&b.len()).then_with(|| kb.cmp(ka)))?;

    let absorbed = if expected_prefix.is_none() {
        shared_leading_digits(&numbers)
    } else {
        0
    };
    if absorbed > 0 {
        stem.push_str(&numbers[0][..absorbed]);
        log::debug!("Leading digits '{}' belong to the stem", &numbers[0][..absorbed]);
    }
    let widths: Vec<usize> = numbers.iter().map(|n| n.len() - absorbed).collect();

    let min_width = widths.iter().copied().min()?;
    let max_width = widths.iter().copied().max()?;
    if min_width != max_width {
        log::warn!(
            "Frame numbers for '{}*.{}' are not zero-padded ({}..{} digits); using width {}",
            stem,
            extension,
            min_width,
            max_width,
            min_width
        );
    }
    if widths.len() == 1 && expected_prefix.is_none() {
        log::warn!(
            "Frame naming inferred from a single file '{}{}.{}'; the stem may be ambiguous",
            stem,
            "0".repeat(min_width),
            extension
        );
    }

    log::debug!(
        "Inferred frame naming: stem='{}' width={} ext='{}' frames={}",
        stem,
        min_width,
        extension,
        widths.len()
    );
    Some(FrameNaming {
        stem,
        digit_width: min_width,
        extension,
        frame_count: widths.len() as u64,
    })
}
