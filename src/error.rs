use std::path::PathBuf;
use thiserror::Error;

/// Per-image failures. None of these abort a batch: the engine logs them,
/// writes nothing for the file and moves on to the next one.
#[derive(Debug, Error)]
pub enum CropError {
    #[error("could not read image {}: {source}", path.display())]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image is too small ({width}x{height}), minimum is {min}x{min}")]
    TooSmall { width: u32, height: u32, min: u32 },

    #[error("cropped region is empty or invalid ({width}x{height})")]
    EmptyCrop { width: u32, height: u32 },

    #[error("failed to save {}: {source}", path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl CropError {
    /// Short label used in summaries and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            CropError::UnreadableImage { .. } => "unreadable",
            CropError::TooSmall { .. } => "too-small",
            CropError::EmptyCrop { .. } => "empty-crop",
            CropError::SaveFailed { .. } => "save-failed",
        }
    }
}
