// aved-cli/src/main.rs
//
// Entry point for the `aved` binary.
//
// Responsibilities:
// - Parsing the command line (`Cli`, defined in cli.rs).
// - Setting up console logging, plus a log file when `--log-dir` is given.
// - Dispatching to the command implementations.
// - Printing `Error: ...` and exiting with status 1 on failure.

use aved_cli::{Cli, Commands, output, run_locate, run_options, run_transcode};
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = aved_cli::logging::init(cli.verbose, cli.log_dir.as_deref(), cli.command.name()) {
        output::print_error(&format!("Failed to set up logging: {}", e));
        process::exit(1);
    }

    let result = match &cli.command {
        Commands::Transcode(args) => run_transcode(args),
        Commands::Locate(args) => run_locate(args),
        Commands::Options(args) => run_options(args),
    };

    if let Err(e) = result {
        log::debug!("Command failed: {:?}", e);
        output::print_error(&e.to_string());
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aved_cli::OptionsCommand;
    use std::path::PathBuf;

    #[test]
    fn test_parse_transcode_basic_args() {
        let args = vec!["aved", "transcode", "dive.avi", "frames"];
        let cli = Cli::parse_from(args);

        assert!(!cli.verbose);
        match cli.command {
            Commands::Transcode(t) => {
                assert_eq!(t.input, PathBuf::from("dive.avi"));
                assert_eq!(t.output_dir, PathBuf::from("frames"));
                assert!(t.command.is_none());
                assert!(!t.keep_on_failure);
                assert!(t.frame_format.is_none());
            }
            _ => panic!("Expected Transcode command"),
        }
    }

    #[test]
    fn test_parse_transcode_with_overrides() {
        let args = vec![
            "aved",
            "-v",
            "transcode",
            "dive.avi",
            "frames",
            "--command",
            "ffmpeg -i dive.avi f%06d.png",
            "--keep-on-failure",
            "--frame-format",
            "png",
            "--log-dir",
            "/tmp/aved-logs",
        ];
        let cli = Cli::parse_from(args);

        assert!(cli.verbose);
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/aved-logs")));
        match cli.command {
            Commands::Transcode(t) => {
                assert_eq!(t.command.as_deref(), Some("ffmpeg -i dive.avi f%06d.png"));
                assert!(t.keep_on_failure);
                assert_eq!(t.frame_format.as_deref(), Some("png"));
            }
            _ => panic!("Expected Transcode command"),
        }
    }

    #[test]
    fn test_parse_locate() {
        let cli = Cli::parse_from(["aved", "locate", "transcode", "--timeout-ms", "250"]);
        match cli.command {
            Commands::Locate(l) => {
                assert_eq!(l.name, "transcode");
                assert_eq!(l.timeout_ms, Some(250));
            }
            _ => panic!("Expected Locate command"),
        }
        assert!(Cli::try_parse_from(["aved", "locate", "transcode", "--timeout-ms", "0"]).is_err());
    }

    #[test]
    fn test_parse_options_to_xml_trailing_flags() {
        let cli = Cli::parse_from([
            "aved",
            "options",
            "to-xml",
            "--",
            "--tracking-mode=hough",
            "--min-event-area=5",
        ]);
        match cli.command {
            Commands::Options(o) => match o.action {
                OptionsCommand::ToXml { output, flags } => {
                    assert!(output.is_none());
                    assert_eq!(flags, vec!["--tracking-mode=hough", "--min-event-area=5"]);
                }
                other => panic!("Expected ToXml, got {other:?}"),
            },
            _ => panic!("Expected Options command"),
        }
    }

    #[test]
    fn test_parse_options_command() {
        let cli = Cli::parse_from([
            "aved",
            "options",
            "command",
            "opts.xml",
            "--video-name",
            "dive",
            "--frames",
            "42",
            "--output-dir",
            "/frames/dive",
        ]);
        assert_eq!(cli.command.name(), "options");
        match cli.command {
            Commands::Options(o) => match o.action {
                OptionsCommand::Command { frames, video_name, .. } => {
                    assert_eq!(frames, 42);
                    assert_eq!(video_name, "dive");
                }
                other => panic!("Expected Command, got {other:?}"),
            },
            _ => panic!("Expected Options command"),
        }
    }
}
