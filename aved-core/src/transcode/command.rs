//! Command lines for the tools a transcode job runs.
//!
//! These are pure builders; nothing here spawns anything.

use std::path::Path;

use crate::config::CoreConfig;
use crate::external::CommandSpec;
use crate::util::shell_quote;

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `tar -C <out> -x -v -f <archive>`
pub fn tar_extract(config: &CoreConfig, archive: &Path, output_dir: &Path) -> CommandSpec {
    CommandSpec::new(config.tar_program.clone())
        .arg("-C")
        .arg(path_arg(output_dir))
        .args(["-x", "-v", "-f"])
        .arg(path_arg(archive))
}

/// `gunzip -c <archive> | tar -x -v -C <out> -f -`, run through the shell.
pub fn gunzip_tar_pipeline(config: &CoreConfig, archive: &Path, output_dir: &Path) -> CommandSpec {
    CommandSpec::shell(format!(
        "{} -c {} | {} -x -v -C {} -f -",
        shell_quote(&config.gunzip_program),
        shell_quote(&path_arg(archive)),
        shell_quote(&config.tar_program),
        shell_quote(&path_arg(output_dir)),
    ))
}

/// `tcprobe -i <file>`
pub fn tcprobe(config: &CoreConfig, input: &Path) -> CommandSpec {
    CommandSpec::new(config.tcprobe_program.clone())
        .arg("-i")
        .arg(path_arg(input))
}

/// `avidump <file>`
pub fn avidump(config: &CoreConfig, input: &Path) -> CommandSpec {
    CommandSpec::new(config.avidump_program.clone()).arg(path_arg(input))
}

/// `transcode -i <file> -o <out>/<prefix> -y <format>,null [codec flags] [user opts]`
pub fn transcode_frames(
    config: &CoreConfig,
    transcode: &Path,
    input: &Path,
    output_dir: &Path,
    codec_flags: &[String],
) -> CommandSpec {
    let out_stem = output_dir.join(&config.frame_prefix);
    CommandSpec::new(path_arg(transcode))
        .arg("-i")
        .arg(path_arg(input))
        .arg("-o")
        .arg(path_arg(&out_stem))
        .arg("-y")
        .arg(format!("{},null", config.frame_format))
        .args(codec_flags.iter().cloned())
        .args(config.transcode_options.iter().cloned())
}

/// A user-supplied command line, run through the shell as given.
pub fn override_command(command_line: &str) -> CommandSpec {
    CommandSpec::shell(command_line)
}
