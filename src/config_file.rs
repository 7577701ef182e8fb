use crate::cli::{Args, DEFAULT_BASE_DIR, DEFAULT_EXTENSIONS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk configuration. Every key is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub base_dir: Option<String>,
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub failed_dir: Option<String>,
    pub model_path: Option<String>,
    pub detector_command: Option<String>,
    pub detector_args: Option<Vec<String>>,
    pub fallback_script: Option<String>,
    pub fallback_interpreter: Option<String>,
    pub extensions: Option<String>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
    pub report: Option<bool>,
    pub dry_run: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Args {
    /// Load configuration from a JSON file and merge it with command-line arguments.
    /// Command-line arguments take precedence over config file values.
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let config = ConfigFile::load(&config_path)?;
            self.merge_from_config(config);
        }
        Ok(())
    }

    fn merge_from_config(&mut self, config: ConfigFile) {
        fn fill(slot: &mut Option<PathBuf>, value: Option<String>) {
            if slot.is_none() {
                *slot = value.map(PathBuf::from);
            }
        }

        // Options that have a default can't tell "not given" apart, so the
        // file only wins while the default is still in place
        if self.base_dir == Path::new(DEFAULT_BASE_DIR) {
            if let Some(base) = config.base_dir {
                self.base_dir = PathBuf::from(base);
            }
        }
        if self.extensions_str == DEFAULT_EXTENSIONS {
            if let Some(ext) = config.extensions {
                self.extensions_str = ext;
            }
        }

        fill(&mut self.input_dir, config.input_dir);
        fill(&mut self.output_dir, config.output_dir);
        fill(&mut self.failed_dir, config.failed_dir);
        fill(&mut self.fallback_script, config.fallback_script);

        // Detector: a backend chosen on the command line replaces the file's
        if self.model.is_none() && self.detector_command.is_none() {
            fill(&mut self.model, config.model_path);
            fill(&mut self.detector_command, config.detector_command);
            if self.detector_args.is_empty() {
                self.detector_args = config.detector_args.unwrap_or_default();
            }
        }

        if self.fallback_interpreter.is_none() {
            self.fallback_interpreter = config.fallback_interpreter;
        }

        // Boolean flags - only apply if currently false (default)
        self.verbose |= config.verbose.unwrap_or(false);
        self.debug |= config.debug.unwrap_or(false);
        self.report |= config.report.unwrap_or(false);
        self.dry_run |= config.dry_run.unwrap_or(false);
    }
}
