//! Implementation of the 'transcode' subcommand.
//!
//! Builds the configuration, runs a `TranscodeJob` to completion and prints
//! the resulting video descriptor. A failed job's output directory is removed
//! unless `--keep-on-failure` is given.

use crate::cli::TranscodeArgs;
use crate::error::{CliErrorContext, CliResult};
use crate::output;

use aved_core::{AppContext, CoreConfig, CoreConfigBuilder, CoreError, TranscodeJob};

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

/// Resolves the configuration: TOML file or defaults, then env, then flags.
pub fn load_config(config_file: Option<&Path>, frame_format: Option<&str>) -> CliResult<CoreConfig> {
    let config = match config_file {
        Some(path) => CoreConfig::from_toml_file(path)?,
        None => CoreConfig::from_env(),
    };
    let mut builder = CoreConfigBuilder::from_config(config);
    if let Some(format) = frame_format {
        builder = builder.frame_format(format);
    }
    builder.build().cli_context("Invalid configuration")
}

pub fn run_transcode(args: &TranscodeArgs) -> CliResult<()> {
    let started = Instant::now();
    let config = load_config(args.config.as_deref(), args.frame_format.as_deref())?;
    debug!("Configuration: {:?}", config);

    let ctx = Arc::new(AppContext::new(config));
    let mut job = TranscodeJob::new(Arc::clone(&ctx), &args.input, &args.output_dir)?;
    if let Some(command) = &args.command {
        job = job.with_command(command.clone());
    }

    info!("Input: {}", args.input.display());
    info!("Output directory: {}", args.output_dir.display());
    info!("Source kind: {:?}", job.source_kind());

    let spinner = output::create_spinner(&format!("Transcoding {}", args.input.display()));
    let result = job.run();
    spinner.finish_and_clear();

    if let Err(err) = result {
        if let Some(line) = job.command_line() {
            debug!("Failed command: {}", line);
        }
        if args.keep_on_failure {
            warn!("Keeping {} after failure", args.output_dir.display());
        } else if let Err(clean_err) = job.clean() {
            warn!("Could not clean up {}: {}", args.output_dir.display(), clean_err);
        }
        return Err(err);
    }

    info!("Transcode finished in {:.1?}", started.elapsed());
    let descriptor = job.descriptor();
    if args.json {
        let json = serde_json::to_string_pretty(&descriptor)
            .map_err(|e| CoreError::OperationFailed(format!("Failed to render JSON: {}", e)))?;
        println!("{}", json);
    } else {
        output::print_success(&format!("Transcoded {}", args.input.display()));
        output::print_descriptor(&descriptor);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_format_flag_overrides() {
        let config = load_config(None, Some("png")).unwrap();
        assert_eq!(config.frame_format, "png");
    }

    #[test]
    fn test_invalid_frame_format_is_rejected() {
        let err = load_config(None, Some("")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration"));
    }
}
