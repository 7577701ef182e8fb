//! JSON output for machine consumers
//!
//! When --json-progress is enabled, progress and results are emitted as JSON
//! lines to stdout and the human-readable output is suppressed.

use serde::Serialize;
use std::path::Path;

use crate::image_processing::geometry::CropRect;
use crate::image_processing::Route;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    FileCompleted {
        input_path: String,
        output_path: String,
        route: Route,
        faces_found: usize,
        crop: CropRect,
        processing_time_ms: u128,
    },
    FileFailed {
        input_path: String,
        kind: String,
        error: String,
    },
    Fallback {
        pending: usize,
        outcome: String,
    },
    Summary {
        total_files: usize,
        with_face: usize,
        without_face: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        Self::Progress {
            current,
            total,
            message: message.into(),
        }
        .emit();
    }

    pub fn file_completed(
        input_path: &Path,
        output_path: &Path,
        route: Route,
        faces_found: usize,
        crop: CropRect,
        processing_time_ms: u128,
    ) {
        Self::FileCompleted {
            input_path: input_path.display().to_string(),
            output_path: output_path.display().to_string(),
            route,
            faces_found,
            crop,
            processing_time_ms,
        }
        .emit();
    }

    pub fn file_failed(input_path: &Path, kind: &str, error: impl Into<String>) {
        Self::FileFailed {
            input_path: input_path.display().to_string(),
            kind: kind.to_string(),
            error: error.into(),
        }
        .emit();
    }

    pub fn summary(
        total_files: usize,
        with_face: usize,
        without_face: usize,
        failed: usize,
        duration_secs: f64,
    ) {
        Self::Summary {
            total_files,
            with_face,
            without_face,
            failed,
            duration_secs,
        }
        .emit();
    }
}
