//! Terminal output helpers: styled labels, errors and the transcode spinner.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use aved_core::VideoDescriptor;

/// Print an info line with label and value, with the label styled
pub fn print_info<T: std::fmt::Display>(label: &str, value: T) {
    println!("{}: {}", style(label).cyan(), value);
}

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", style("!").yellow(), style(message).yellow());
}

/// A spinner shown on stderr while a transcode runs. Hidden when stderr is
/// not a terminal.
pub fn create_spinner(message: &str) -> ProgressBar {
    if !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Human-readable summary of a finished transcode.
pub fn print_descriptor(descriptor: &VideoDescriptor) {
    print_info("Video", &descriptor.name);
    print_info("Frames directory", descriptor.output_dir().display());
    match descriptor.frame_count {
        Some(count) => print_info("Frames", count),
        None => print_warning("No frames were found in the output directory"),
    }
    if let (Some(stem), Some(width), Some(ext)) = (
        descriptor.frame_stem.as_deref(),
        descriptor.digit_width,
        descriptor.frame_extension.as_deref(),
    ) {
        print_info("Naming", format!("{}{}.{}", stem, "#".repeat(width), ext));
        if let Some(first) = descriptor.frame_path(0) {
            print_info("First frame", first.display());
        }
    }
}
