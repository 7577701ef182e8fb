use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// Fraction of the face width/height added as context on each side
pub const MARGIN_FACTOR: f64 = 0.5;

/// The crop must cover at least this fraction of the source image area
pub const MIN_AREA_RATIO: f64 = 0.5;

/// Side length of every produced image
pub const OUTPUT_SIZE: u32 = 512;

/// Crops with either side below this are reflect-padded before resizing
pub const PAD_THRESHOLD: u32 = 512;

/// Sources smaller than this on either axis are rejected
pub const MIN_SOURCE_DIMENSION: u32 = 100;

/// Face bounding box in source image pixel coordinates.
///
/// Field order follows the `(top, right, bottom, left)` convention used by
/// common face detectors. Boxes produced by the locators in this crate always
/// satisfy `top < bottom <= height` and `left < right <= width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl BoundingBox {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Build a box from detector coordinates that may fall outside the image.
    ///
    /// Returns `None` when nothing of the box is left after trimming it to
    /// `[0, width] x [0, height]`.
    pub fn clamped(
        top: i64,
        right: i64,
        bottom: i64,
        left: i64,
        width: u32,
        height: u32,
    ) -> Option<Self> {
        let (w, h) = (width as i64, height as i64);
        let top = top.clamp(0, h);
        let bottom = bottom.clamp(0, h);
        let left = left.clamp(0, w);
        let right = right.clamp(0, w);

        if bottom <= top || right <= left {
            return None;
        }

        Some(Self::new(top as u32, right as u32, bottom as u32, left as u32))
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Crop rectangle, always inside `[0, width] x [0, height]` of its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl CropRect {
    pub fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// A rect with no pixels. Callers must treat this as a failed crop.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl std::fmt::Display for CropRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{},{} -> {},{}] {}x{}",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}

/// Edges in signed space, before the final clamp into `u32`
#[derive(Debug, Clone, Copy)]
struct Edges {
    top: i64,
    left: i64,
    bottom: i64,
    right: i64,
}

impl Edges {
    fn into_rect(self, width: i64, height: i64) -> CropRect {
        CropRect::new(
            self.top.clamp(0, height) as u32,
            self.left.clamp(0, width) as u32,
            self.bottom.clamp(0, height) as u32,
            self.right.clamp(0, width) as u32,
        )
    }
}

/// Only the first detected face drives the crop.
pub fn select_primary_face(faces: &[BoundingBox]) -> Option<&BoundingBox> {
    faces.first()
}

/// Compute the crop rectangle for an image of `width` x `height`.
///
/// With a face, the box is grown by [`MARGIN_FACTOR`] of its size on every
/// side. If that still covers less than [`MIN_AREA_RATIO`] of the image, a
/// square of side `floor(sqrt(min_area))` centered on the grown box is used
/// instead. Without a face, the largest square of side
/// `min(sqrt(min_area), width, height)` centered on the image is used.
///
/// All coordinate arithmetic is integer with floor division; `min_area` and
/// its square root are the only floating point values.
pub fn compute_crop_rect(
    width: u32,
    height: u32,
    face: Option<&BoundingBox>,
) -> Result<CropRect, CropError> {
    if width < MIN_SOURCE_DIMENSION || height < MIN_SOURCE_DIMENSION {
        return Err(CropError::TooSmall {
            width,
            height,
            min: MIN_SOURCE_DIMENSION,
        });
    }

    let (w, h) = (width as i64, height as i64);
    let min_area = (w * h) as f64 * MIN_AREA_RATIO;

    let edges = match face {
        Some(face) => face_edges(w, h, min_area, face),
        None => center_edges(w, h, min_area),
    };

    Ok(edges.into_rect(w, h))
}

fn face_edges(w: i64, h: i64, min_area: f64, face: &BoundingBox) -> Edges {
    let (top, right, bottom, left) = (
        face.top as i64,
        face.right as i64,
        face.bottom as i64,
        face.left as i64,
    );

    let margin_x = ((right - left) as f64 * MARGIN_FACTOR) as i64;
    let margin_y = ((bottom - top) as f64 * MARGIN_FACTOR) as i64;

    let mut edges = Edges {
        top: (top - margin_y).max(0),
        left: (left - margin_x).max(0),
        bottom: (bottom + margin_y).min(h),
        right: (right + margin_x).min(w),
    };

    let crop_width = edges.right - edges.left;
    let crop_height = edges.bottom - edges.top;

    if ((crop_width * crop_height) as f64) < min_area {
        let target_side = min_area.sqrt() as i64;
        let center_x = edges.left + crop_width.div_euclid(2);
        let center_y = edges.top + crop_height.div_euclid(2);
        let half_side = target_side / 2;

        edges = Edges {
            top: (center_y - half_side).max(0),
            left: (center_x - half_side).max(0),
            bottom: (center_y + half_side).min(h),
            right: (center_x + half_side).min(w),
        };

        // Only the left/top edge moves back. If the image is narrower than
        // target_side on an axis, the crop stays short on that axis.
        if edges.right - edges.left < target_side {
            edges.left = (edges.right - target_side).max(0);
        }
        if edges.bottom - edges.top < target_side {
            edges.top = (edges.bottom - target_side).max(0);
        }
    }

    edges
}

fn center_edges(w: i64, h: i64, min_area: f64) -> Edges {
    let target_side = min_area.sqrt().min(h as f64).min(w as f64) as i64;
    let (center_y, center_x) = (h / 2, w / 2);

    let top = (center_y - target_side / 2).max(0);
    let left = (center_x - target_side / 2).max(0);

    Edges {
        top,
        left,
        bottom: (top + target_side).min(h),
        right: (left + target_side).min(w),
    }
}
