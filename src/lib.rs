// Shared by the face-autocrop binary; the engine can be driven with any FaceLocator
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Crate-root shortcuts
pub use cli::{Args, DetectorChoice};
pub use error::CropError;
pub use image_processing::face_detection::{CommandLocator, FaceLocator, RustfaceLocator};
pub use image_processing::geometry::{compute_crop_rect, BoundingBox, CropRect};
pub use image_processing::normalize::normalize_crop;
pub use image_processing::{ProcessingConfig, ProcessingEngine, ProcessingResult, Route};
pub use json_output::JsonMessage;
