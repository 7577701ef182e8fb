use anyhow::{Context, Result};
use image::RgbImage;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::geometry::BoundingBox;

/// Narrow seam in front of whatever actually finds faces.
///
/// Implementations may fail; the engine treats any error as "no faces".
pub trait FaceLocator {
    /// Backend name for log output
    fn name(&self) -> &str;

    /// Return every face found in `image`, in detector order.
    ///
    /// `image_path` is the file `image` was decoded from, for backends
    /// that work on files rather than pixels.
    fn locate_faces(&mut self, image_path: &Path, image: &RgbImage) -> Result<Vec<BoundingBox>>;
}

/// SeetaFace frontal detector from the `rustface` crate
pub struct RustfaceLocator {
    detector: Box<dyn rustface::Detector>,
}

impl RustfaceLocator {
    /// Load the SeetaFace model (`seeta_fd_frontal_v1.0.bin`) from disk
    pub fn new(model_path: &Path) -> Result<Self> {
        let model_str = model_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid model path: {}", model_path.display()))?;

        let mut detector = rustface::create_detector(model_str)
            .with_context(|| format!("Failed to load face model: {}", model_path.display()))?;

        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        Ok(Self { detector })
    }
}

impl FaceLocator for RustfaceLocator {
    fn name(&self) -> &str {
        "rustface"
    }

    fn locate_faces(&mut self, _image_path: &Path, image: &RgbImage) -> Result<Vec<BoundingBox>> {
        let (width, height) = image.dimensions();
        let gray = image::imageops::grayscale(image);

        let faces = self
            .detector
            .detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                let (x, y) = (bbox.x() as i64, bbox.y() as i64);
                BoundingBox::clamped(
                    y,
                    x + bbox.width() as i64,
                    y + bbox.height() as i64,
                    x,
                    width,
                    height,
                )
            })
            .collect())
    }
}

/// One box as printed by an external detector command
#[derive(Debug, Deserialize)]
struct RawBox {
    top: i64,
    right: i64,
    bottom: i64,
    left: i64,
}

/// Runs an external detector once per image.
///
/// The command is invoked as `<program> [args...] <image path>` and must print
/// a JSON array of `{"top", "right", "bottom", "left"}` objects to stdout.
pub struct CommandLocator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLocator {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl FaceLocator for CommandLocator {
    fn name(&self) -> &str {
        "command"
    }

    fn locate_faces(&mut self, image_path: &Path, image: &RgbImage) -> Result<Vec<BoundingBox>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .output()
            .with_context(|| format!("Failed to execute {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!(
                "{} failed ({}): {}",
                self.program.display(),
                output.status,
                stderr.trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (width, height) = image.dimensions();
        parse_detector_output(&stdout, width, height)
    }
}

/// Parse detector JSON and clamp every box into the image
fn parse_detector_output(stdout: &str, width: u32, height: u32) -> Result<Vec<BoundingBox>> {
    let raw: Vec<RawBox> = serde_json::from_str(stdout.trim())
        .with_context(|| format!("Failed to parse detector output: {}", stdout.trim()))?;

    Ok(raw
        .into_iter()
        .filter_map(|b| BoundingBox::clamped(b.top, b.right, b.bottom, b.left, width, height))
        .collect())
}
