//! Vision options as mbarivision command-line flags.

use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::CommandSpec;
use crate::util::shell_quote;
use crate::video::VideoDescriptor;

use super::VisionOptions;

/// Largest frame number that fits the six digit frame range.
pub const MAX_RANGE_FRAME: u64 = 999_999;

impl VisionOptions {
    /// `--name=value` for each present option, in table order.
    pub fn to_flags(&self) -> Vec<String> {
        self.present()
            .into_iter()
            .map(|(name, value)| format!("--{}={}", name, value))
            .collect()
    }
}

/// Parses `--name=value` tokens back into options.
///
/// Unknown flags, bare `--flag` switches and positional arguments are
/// skipped; a known option with a bad value is an error.
pub fn from_flags<I, S>(args: I) -> CoreResult<VisionOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = VisionOptions::default();
    for arg in args {
        let arg = arg.as_ref();
        let Some((name, value)) = arg.strip_prefix("--").and_then(|a| a.split_once('=')) else {
            continue;
        };
        if !options.set(name, value)? {
            log::debug!("Ignoring unknown mbarivision flag --{}", name);
        }
    }
    Ok(options)
}

/// `000000-NNNNNN` for a sequence of `frame_count` frames.
///
/// Counts past `MAX_RANGE_FRAME` do not fit the six digit field and are
/// rejected as a bad `input-frames` value.
pub fn frame_range(frame_count: u64) -> CoreResult<String> {
    if frame_count > MAX_RANGE_FRAME {
        log::error!("{} frames do not fit a six digit frame range", frame_count);
        return Err(CoreError::OptionParse {
            option: "input-frames".to_string(),
            value: frame_count.to_string(),
        });
    }
    Ok(format!("{:06}-{:06}", 0, frame_count))
}

/// A complete mbarivision invocation over one frame sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct MbarivisionCommand {
    pub program: String,
    pub options: VisionOptions,
    pub video_name: String,
    pub frame_count: u64,
    pub output_dir: PathBuf,
    /// Stem of the input frame files (`f` for `f000000.ppm`)
    pub frame_stem: String,
}

impl MbarivisionCommand {
    pub fn new(
        options: VisionOptions,
        video_name: impl Into<String>,
        frame_count: u64,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: crate::config::DEFAULT_MBARIVISION_PROGRAM.to_string(),
            options,
            video_name: video_name.into(),
            frame_count,
            output_dir: output_dir.into(),
            frame_stem: crate::config::DEFAULT_FRAME_PREFIX.to_string(),
        }
    }

    /// Builds the command for a transcoded video.
    ///
    /// Fails when the frame count is not known yet.
    pub fn for_descriptor(
        config: &CoreConfig,
        options: VisionOptions,
        descriptor: &VideoDescriptor,
    ) -> CoreResult<Self> {
        let frame_count = descriptor.frame_count.ok_or_else(|| {
            CoreError::InvalidInput(format!("Frame count of '{}' is not known", descriptor.name))
        })?;
        Ok(Self {
            program: config.mbarivision_program.clone(),
            options,
            video_name: descriptor.name.clone(),
            frame_count,
            output_dir: descriptor.output_dir().to_path_buf(),
            frame_stem: descriptor
                .frame_stem
                .clone()
                .unwrap_or_else(|| config.frame_prefix.clone()),
        })
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Option flags, frame ranges, the input frame stem and the output prefix.
    pub fn args(&self) -> CoreResult<Vec<String>> {
        let range = frame_range(self.frame_count)?;
        let mut args = self.options.to_flags();
        args.push(format!("--input-frames={}@0", range));
        args.push(format!("--output-frames={}@0", range));
        args.push(frame_input(&self.output_dir, &self.frame_stem));
        args.push(format!("{}_", self.video_name));
        Ok(args)
    }

    /// The invocation as a single shell-quoted line.
    pub fn to_command_line(&self) -> CoreResult<String> {
        let mut parts = vec![shell_quote(&self.program)];
        parts.extend(self.args()?.iter().map(|a| shell_quote(a)));
        Ok(parts.join(" "))
    }

    /// The invocation as a runnable command, executed in the frame directory.
    pub fn to_spec(&self) -> CoreResult<CommandSpec> {
        Ok(CommandSpec::new(self.program.clone())
            .args(self.args()?)
            .current_dir(self.output_dir.clone()))
    }
}

fn frame_input(output_dir: &Path, stem: &str) -> String {
    output_dir
        .join(format!("{}0", stem))
        .to_string_lossy()
        .into_owned()
}
