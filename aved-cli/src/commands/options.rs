//! Implementation of the 'options' subcommands.

use crate::cli::{OptionsArgs, OptionsCommand};
use crate::error::{CliErrorContext, CliResult};

use aved_core::CoreError;
use aved_core::options::{MbarivisionCommand, from_flags, load_xml, save_xml, to_xml};

use std::path::Path;

use log::info;

pub fn run_options(args: &OptionsArgs) -> CliResult<()> {
    match &args.action {
        OptionsCommand::Show { xml, json } => show(xml, *json),
        OptionsCommand::Command {
            xml,
            video_name,
            frames,
            output_dir,
            program,
        } => {
            let options = load(xml)?;
            let mut command = MbarivisionCommand::new(options, video_name.clone(), *frames, output_dir);
            if let Some(program) = program {
                command = command.program(program.clone());
            }
            println!("{}", command.to_command_line()?);
            Ok(())
        }
        OptionsCommand::ToXml { output, flags } => {
            let options = from_flags(flags)?;
            match output {
                Some(path) => {
                    save_xml(&options, path)
                        .cli_with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {} option(s) to {}", options.present().len(), path.display());
                }
                None => print!("{}", to_xml(&options)?),
            }
            Ok(())
        }
    }
}

fn load(xml: &Path) -> CliResult<aved_core::VisionOptions> {
    load_xml(xml).cli_with_context(|| format!("Failed to read {}", xml.display()))
}

fn show(xml: &Path, json: bool) -> CliResult<()> {
    let options = load(xml)?;
    if json {
        let text = serde_json::to_string_pretty(&options)
            .map_err(|e| CoreError::OperationFailed(format!("Failed to render JSON: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }
    for flag in options.to_flags() {
        println!("{}", flag);
    }
    Ok(())
}
