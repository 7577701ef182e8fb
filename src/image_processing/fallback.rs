use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::utils::{error_println, has_valid_extension, info_println};

/// Secondary detector run over whatever ended up in the failed directory
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub script: Option<PathBuf>,
    pub interpreter: String,
    /// No console output; the script's stdout is discarded
    pub quiet: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            script: None,
            interpreter: "python3".to_string(),
            quiet: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// Failed directory had no images
    NotNeeded,
    /// Images are waiting but no script is configured
    NotConfigured { pending: usize },
    Completed { pending: usize },
    Failed { pending: usize, status: Option<i32> },
}

/// Count image files directly inside `failed_dir`
pub fn count_failed_images(failed_dir: &Path, extensions: &[String]) -> Result<usize> {
    if !failed_dir.exists() {
        return Ok(0);
    }

    let entries = std::fs::read_dir(failed_dir)
        .with_context(|| format!("Failed to read directory: {}", failed_dir.display()))?;

    let mut count = 0;
    for entry in entries {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_file() && has_valid_extension(&path, extensions) {
            count += 1;
        }
    }

    Ok(count)
}

/// Run the secondary detector once if the failed directory holds any image.
///
/// Launch errors and non-zero exits are reported and returned as
/// [`FallbackOutcome::Failed`]; only an unreadable failed directory is an `Err`.
pub fn run_fallback_if_needed(
    config: &FallbackConfig,
    failed_dir: &Path,
    extensions: &[String],
) -> Result<FallbackOutcome> {
    let pending = count_failed_images(failed_dir, extensions)?;
    if pending == 0 {
        return Ok(FallbackOutcome::NotNeeded);
    }

    let Some(script) = &config.script else {
        if !config.quiet {
            info_println(&format!(
                "{} image(s) in '{}' and no fallback script configured",
                pending,
                failed_dir.display()
            ));
        }
        return Ok(FallbackOutcome::NotConfigured { pending });
    };

    if !config.quiet {
        info_println(&format!(
            "{} image(s) in '{}'. Running {}...",
            pending,
            failed_dir.display(),
            script.display()
        ));
    }

    match run_script(config, script) {
        Ok(status) if status.success() => Ok(FallbackOutcome::Completed { pending }),
        Ok(status) => {
            error_println(&format!("Fallback script {} exited with {}", script.display(), status));
            Ok(FallbackOutcome::Failed {
                pending,
                status: status.code(),
            })
        }
        Err(e) => {
            error_println(&format!("Error running fallback script: {:#}", e));
            Ok(FallbackOutcome::Failed {
                pending,
                status: None,
            })
        }
    }
}

fn run_script(config: &FallbackConfig, script: &Path) -> Result<ExitStatus> {
    let stdout = if config.quiet {
        Stdio::null()
    } else {
        Stdio::inherit()
    };

    Command::new(&config.interpreter)
        .arg(script)
        .stdout(stdout)
        .status()
        .with_context(|| {
            format!("Failed to execute {} {}", config.interpreter, script.display())
        })
}
