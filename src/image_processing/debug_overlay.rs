use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::geometry::{BoundingBox, CropRect};

const FACE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CROP_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Copy of `img` with the detected faces (green) and the crop (red) outlined.
///
/// Every face is drawn, not only the one that drove the crop, so a reviewer
/// can see what the single-face policy ignored.
pub fn draw_debug_overlay(img: &RgbImage, faces: &[BoundingBox], crop: &CropRect) -> RgbImage {
    let mut canvas = img.clone();
    let thickness = (img.width().max(img.height()) / 300).max(1);

    for face in faces {
        draw_thick_rect(&mut canvas, face.left, face.top, face.width(), face.height(), thickness, FACE_COLOR);
    }
    draw_thick_rect(
        &mut canvas,
        crop.left,
        crop.top,
        crop.width(),
        crop.height(),
        thickness,
        CROP_COLOR,
    );

    canvas
}

fn draw_thick_rect(
    canvas: &mut RgbImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    thickness: u32,
    color: Rgb<u8>,
) {
    for inset in 0..thickness {
        let w = width.saturating_sub(2 * inset);
        let h = height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_marks_face_and_crop() {
        let img = RgbImage::new(200, 200);
        let face = BoundingBox::new(80, 120, 120, 80);
        let crop = CropRect::new(30, 30, 171, 171);

        let out = draw_debug_overlay(&img, &[face], &crop);

        assert_eq!(out.dimensions(), (200, 200));
        assert_eq!(*out.get_pixel(80, 80), FACE_COLOR);
        assert_eq!(*out.get_pixel(30, 30), CROP_COLOR);
        assert_eq!(*out.get_pixel(100, 100), Rgb([0, 0, 0]));
        // Source untouched
        assert_eq!(*img.get_pixel(30, 30), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_overlay_without_faces() {
        let img = RgbImage::new(150, 150);
        let crop = CropRect::new(0, 0, 150, 150);
        let out = draw_debug_overlay(&img, &[], &crop);
        assert_eq!(*out.get_pixel(149, 149), CROP_COLOR);
    }
}
