use anyhow::{ensure, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::cli::Args;

/// Progress bar for the per-image loop
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {elapsed:>4} [{bar:40.green/white}] {pos}/{len} images  {msg}",
    ) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// `850ms`, `4.25s` or `2m 07s`
pub fn format_duration(duration: Duration) -> String {
    match duration.as_secs() {
        0 => format!("{}ms", duration.as_millis()),
        secs @ 1..=59 => format!("{}.{:02}s", secs, duration.subsec_millis() / 10),
        secs => format!("{}m {:02}s", secs / 60, secs % 60),
    }
}

/// Checks that must pass before any directory is created or image read
pub fn validate_inputs(args: &Args) -> Result<()> {
    let input_dir = args.input_dir();
    ensure!(
        input_dir.is_dir(),
        "Input directory not found: {} (create it and place the photos there)",
        input_dir.display()
    );
    ensure!(
        !args.parse_extensions().is_empty(),
        "--extensions must name at least one file extension"
    );

    args.detector().map_err(anyhow::Error::msg)?;

    if let Some(script) = &args.fallback_script {
        ensure!(script.is_file(), "Fallback script not found: {}", script.display());
    }

    Ok(())
}

/// Whether `path` ends in one of `extensions` (lowercase, no dot), ignoring case
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

/// File name for messages, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

pub fn info_println(message: &str) {
    println!("{} {}", style("[info]").cyan(), message);
}

pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[debug]").dim(), message);
    }
}

/// Per-image problems that do not stop the batch
pub fn warn_println(message: &str) {
    println!("{} {}", style("[warn]").yellow().bold(), message);
}

pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[error]").red().bold(), message);
}

/// Totals for the end-of-run summary
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files: usize,
    pub with_face: usize,
    pub without_face: usize,
    pub failed: usize,
    pub total_duration: Duration,
}

impl ProcessingStats {
    pub fn successful(&self) -> usize {
        self.with_face + self.without_face
    }

    /// Percentage of processed images where a face was found
    pub fn face_rate(&self) -> f64 {
        let processed = self.successful();
        if processed == 0 {
            0.0
        } else {
            (self.with_face as f64 / processed as f64) * 100.0
        }
    }

    pub fn average_duration(&self) -> Duration {
        self.total_duration
            .checked_div(self.total_files as u32)
            .unwrap_or_default()
    }
}
