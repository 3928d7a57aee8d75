// aved-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "AVED: Video frame pipeline",
    long_about = "Transcodes videos and frame archives into frame sequences and prepares mbarivision runs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Also write the log to a timestamped file in this directory
    #[arg(long, global = true, value_name = "LOG_DIR", env = "AVED_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcodes a video or frame archive into a directory of frames
    Transcode(TranscodeArgs),
    /// Finds an external tool the way the pipeline does
    Locate(LocateArgs),
    /// Works with mbarivision option files
    Options(OptionsArgs),
}

impl Commands {
    /// Short name used for log file names.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Transcode(_) => "transcode",
            Commands::Locate(_) => "locate",
            Commands::Options(_) => "options",
        }
    }
}

#[derive(Args, Debug)]
pub struct TranscodeArgs {
    /// Video (avi, mpeg, mov, ...) or frame archive (tar, tar.gz, tgz)
    #[arg(required = true, value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory the frames are written to (created if missing)
    #[arg(required = true, value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Run this shell command instead of the generated one
    #[arg(long, value_name = "CMD")]
    pub command: Option<String>,

    /// Keep the output directory when the transcode fails
    #[arg(long, default_value_t = false)]
    pub keep_on_failure: bool,

    /// Image format for generated frames (e.g. ppm, jpg, png)
    #[arg(long, value_name = "EXT")]
    pub frame_format: Option<String>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE", env = "AVED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the video descriptor as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Name of the tool, e.g. transcode
    #[arg(required = true, value_name = "NAME")]
    pub name: String,

    /// Probe timeout per candidate in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct OptionsArgs {
    #[command(subcommand)]
    pub action: OptionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum OptionsCommand {
    /// Prints the options stored in an XML file as mbarivision flags
    Show {
        #[arg(value_name = "XML")]
        xml: PathBuf,

        /// Print the options as JSON instead
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Prints the mbarivision command line for a frame sequence
    Command {
        #[arg(value_name = "XML")]
        xml: PathBuf,

        /// Name of the video; output files are prefixed with it
        #[arg(long, value_name = "NAME")]
        video_name: String,

        /// Number of frames in the sequence
        #[arg(long, value_name = "COUNT")]
        frames: u64,

        /// Directory holding the frames
        #[arg(long, value_name = "DIR")]
        output_dir: PathBuf,

        /// mbarivision binary to invoke
        #[arg(long, value_name = "PATH")]
        program: Option<String>,
    },
    /// Converts mbarivision flags (after `--`) into an XML options document
    ToXml {
        /// Write the document here instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(value_name = "FLAGS", trailing_var_arg = true, allow_hyphen_values = true)]
        flags: Vec<String>,
    },
}
