use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_BASE_DIR: &str = "auto-crop-face";
pub const DEFAULT_EXTENSIONS: &str = "png,jpg,jpeg";
pub const DEFAULT_FALLBACK_INTERPRETER: &str = "python3";

/// Which face detector backend to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorChoice {
    /// SeetaFace model file for the built-in rustface detector
    Model(PathBuf),
    /// External program printing JSON boxes
    Command { program: PathBuf, args: Vec<String> },
}

#[derive(Parser, Debug)]
#[command(
    name = "face-autocrop",
    version,
    about = "Crop a folder of photos around the first detected face into 512x512 images",
    long_about = "
Face Auto-Crop - batch face cropping

Every .png/.jpg/.jpeg file in the input folder is scanned for faces. The first
face found is framed with a 50% margin (grown to at least half of the photo's
area), padded by mirroring if needed and resized to exactly 512x512.

Photos with a face are written to the output folder. Photos without one still
get a centered crop, written to the failed folder. When the failed folder holds
any image at the end of the run, an optional fallback script is run once.

Example Usage:
  # Default layout: auto-crop-face/{load,output,failed}
  face-autocrop --model ./models/seeta_fd_frontal_v1.0.bin

  # External detector and a YOLO fallback pass
  face-autocrop -i ~/Photos -o ~/faces --failed ~/no-faces \\
    --detector-command ./detect_faces.py --fallback-script ./yolo.py

  # Simulate, print a per-file table and write debug overlays
  face-autocrop --model ./seeta.bin --dry-run --report --debug --verbose"
)]
pub struct Args {
    /// Base folder holding load/, output/ and failed/
    #[arg(long = "base-dir", default_value = DEFAULT_BASE_DIR, value_name = "DIR")]
    pub base_dir: PathBuf,

    /// Folder with the photos to process [default: <base>/load]
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Folder for photos where a face was found [default: <base>/output]
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Folder for photos where no face was found [default: <base>/failed]
    #[arg(long = "failed", value_name = "DIR")]
    pub failed_dir: Option<PathBuf>,

    /// SeetaFace frontal model (seeta_fd_frontal_v1.0.bin) for the built-in detector
    #[arg(long = "model", value_name = "FILE", conflicts_with = "detector_command")]
    pub model: Option<PathBuf>,

    /// External face detector, called as `<COMMAND> [ARGS...] <image>`
    #[arg(long = "detector-command", value_name = "COMMAND")]
    pub detector_command: Option<PathBuf>,

    /// Extra argument passed to the external detector (repeatable)
    #[arg(long = "detector-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub detector_args: Vec<String>,

    /// Script run once when the failed folder holds images after the batch
    #[arg(long = "fallback-script", value_name = "FILE")]
    pub fallback_script: Option<PathBuf>,

    /// Interpreter used to run the fallback script [default: python3]
    #[arg(long = "fallback-interpreter", value_name = "PROGRAM")]
    pub fallback_interpreter: Option<String>,

    /// Comma-separated list of image extensions to process
    #[arg(long = "extensions", default_value = DEFAULT_EXTENSIONS)]
    pub extensions_str: String,

    /// JSON configuration file; command-line values take precedence
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Also write <base>/debug/<file> with the face box and crop drawn on the source
    #[arg(long = "debug")]
    pub debug: bool,

    /// Print a table with the crop decision for every file
    #[arg(long = "report")]
    pub report: bool,

    /// Run detection and cropping without writing files or running the fallback
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Emit progress as JSON lines on stdout instead of human-readable output
    #[arg(long = "json-progress")]
    pub json_progress: bool,
}

impl Args {
    pub fn input_dir(&self) -> PathBuf {
        self.input_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("load"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("output"))
    }

    pub fn failed_dir(&self) -> PathBuf {
        self.failed_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("failed"))
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.base_dir.join("debug")
    }

    pub fn fallback_interpreter(&self) -> String {
        self.fallback_interpreter
            .clone()
            .unwrap_or_else(|| DEFAULT_FALLBACK_INTERPRETER.to_string())
    }

    /// Parse the extensions string into a vector
    pub fn parse_extensions(&self) -> Vec<String> {
        self.extensions_str
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The configured detector backend, if exactly one is set
    pub fn detector(&self) -> Result<DetectorChoice, String> {
        match (&self.model, &self.detector_command) {
            (Some(model), None) => Ok(DetectorChoice::Model(model.clone())),
            (None, Some(program)) => Ok(DetectorChoice::Command {
                program: program.clone(),
                args: self.detector_args.clone(),
            }),
            (Some(_), Some(_)) => {
                Err("Use either --model or --detector-command, not both".to_string())
            }
            (None, None) => Err(
                "No face detector configured. Pass --model <FILE> or --detector-command <COMMAND>"
                    .to_string(),
            ),
        }
    }
}
