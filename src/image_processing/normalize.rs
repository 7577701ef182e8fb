use anyhow::{Context, Result};
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{ImageBuffer, RgbImage};

use super::geometry::{CropRect, OUTPUT_SIZE, PAD_THRESHOLD};
use crate::error::CropError;

/// Turn a crop of `img` into the fixed square output.
///
/// The crop is extracted, mirror-padded when either side is below
/// [`PAD_THRESHOLD`], then stretched to [`OUTPUT_SIZE`] x [`OUTPUT_SIZE`].
/// No attempt is made to keep the aspect ratio in the final resize.
pub fn normalize_crop(img: &RgbImage, rect: &CropRect) -> Result<RgbImage, CropError> {
    let cropped = extract_crop(img, rect)?;
    let (width, height) = cropped.dimensions();

    let padded = if width < PAD_THRESHOLD || height < PAD_THRESHOLD {
        reflect_pad(&cropped, padding_for(height), padding_for(width))
    } else {
        cropped
    };

    resize_to_output(&padded).map_err(|_| CropError::EmptyCrop {
        width: padded.width(),
        height: padded.height(),
    })
}

/// Copy the pixels inside `rect` into a new buffer
pub fn extract_crop(img: &RgbImage, rect: &CropRect) -> Result<RgbImage, CropError> {
    let (img_width, img_height) = img.dimensions();

    if rect.is_empty() || rect.right > img_width || rect.bottom > img_height {
        return Err(CropError::EmptyCrop {
            width: rect.width(),
            height: rect.height(),
        });
    }

    Ok(image::imageops::crop_imm(img, rect.left, rect.top, rect.width(), rect.height()).to_image())
}

/// Pixels to add on each side of an axis of length `dim`
pub fn padding_for(dim: u32) -> u32 {
    PAD_THRESHOLD.saturating_sub(dim) / 2
}

/// Pad `img` by `pad_y` rows above and below and `pad_x` columns left and right.
///
/// Border pixels mirror the image including the edge pixel itself
/// (`cba|abc|cba`). Pads wider than the image keep bouncing between edges.
pub fn reflect_pad(img: &RgbImage, pad_y: u32, pad_x: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || (pad_x == 0 && pad_y == 0) {
        return img.clone();
    }

    let out_width = width + 2 * pad_x;
    let out_height = height + 2 * pad_y;

    ImageBuffer::from_fn(out_width, out_height, |x, y| {
        let src_x = reflect_index(x as i64 - pad_x as i64, width);
        let src_y = reflect_index(y as i64 - pad_y as i64, height);
        *img.get_pixel(src_x, src_y)
    })
}

fn reflect_index(pos: i64, len: u32) -> u32 {
    let len = len as i64;
    let period = 2 * len;
    let folded = pos.rem_euclid(period);
    if folded < len {
        folded as u32
    } else {
        (period - 1 - folded) as u32
    }
}

/// Bilinear resize to exactly `OUTPUT_SIZE` x `OUTPUT_SIZE`
pub fn resize_to_output(img: &RgbImage) -> Result<RgbImage> {
    resize_image(img, OUTPUT_SIZE, OUTPUT_SIZE)
}

fn resize_image(img: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == 0 || src_height == 0 {
        return Err(anyhow::anyhow!("Source image has zero size"));
    }
    if src_width == width && src_height == height {
        return Ok(img.clone());
    }

    let src_image = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x3)
        .context("Failed to wrap source pixels for resizing")?;
    let mut dst_image = Image::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&options))
        .context("Failed to resize image")?;

    RgbImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| anyhow::anyhow!("Resized buffer does not match {}x{}", width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_extract_crop() {
        let img = create_test_image(100, 100);
        let cropped = extract_crop(&img, &CropRect::new(10, 20, 60, 50)).unwrap();

        assert_eq!(cropped.dimensions(), (30, 50));
        assert_eq!(cropped.get_pixel(5, 5), img.get_pixel(25, 15));
    }

    #[test]
    fn test_extract_empty_crop() {
        let img = create_test_image(100, 100);

        let err = extract_crop(&img, &CropRect::new(10, 10, 10, 50)).unwrap_err();
        assert!(matches!(err, CropError::EmptyCrop { width: 40, height: 0 }));

        // Out of bounds
        assert!(extract_crop(&img, &CropRect::new(0, 0, 120, 50)).is_err());
    }

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(141), 185);
        assert_eq!(padding_for(511), 0);
        assert_eq!(padding_for(512), 0);
        assert_eq!(padding_for(2000), 0);
    }

    #[test]
    fn test_reflect_pad_mirrors_edges() {
        // Single row: a b c
        let img: RgbImage = ImageBuffer::from_fn(3, 1, |x, _| Rgb([x as u8 * 10, 0, 0]));
        let padded = reflect_pad(&img, 0, 2);

        let row: Vec<u8> = (0..padded.width()).map(|x| padded.get_pixel(x, 0)[0]).collect();
        // b a | a b c | c b
        assert_eq!(row, vec![10, 0, 0, 10, 20, 20, 10]);
    }

    #[test]
    fn test_reflect_pad_wider_than_image() {
        let img: RgbImage = ImageBuffer::from_fn(2, 1, |x, _| Rgb([x as u8 + 1, 0, 0]));
        let padded = reflect_pad(&img, 0, 5);

        assert_eq!(padded.width(), 12);
        let row: Vec<u8> = (0..padded.width()).map(|x| padded.get_pixel(x, 0)[0]).collect();
        assert_eq!(row, vec![1, 1, 2, 2, 1, 1, 2, 2, 1, 1, 2, 2]);
    }

    #[test]
    fn test_reflect_pad_keeps_center() {
        let img = create_test_image(141, 141);
        let padded = reflect_pad(&img, 185, 185);

        assert_eq!(padded.dimensions(), (511, 511));
        assert_eq!(padded.get_pixel(185, 185), img.get_pixel(0, 0));
        assert_eq!(padded.get_pixel(185 + 140, 185 + 140), img.get_pixel(140, 140));
    }

    #[test]
    fn test_resize_to_output() {
        let img = create_test_image(300, 120);
        let resized = resize_to_output(&img).unwrap();
        assert_eq!(resized.dimensions(), (OUTPUT_SIZE, OUTPUT_SIZE));
    }

    #[test]
    fn test_normalize_always_512() {
        let img = create_test_image(1200, 700);
        let rects = [
            CropRect::new(0, 0, 700, 1200),
            CropRect::new(100, 100, 241, 241),
            CropRect::new(0, 500, 700, 600),
            CropRect::new(50, 0, 650, 1200),
        ];

        for rect in &rects {
            let out = normalize_crop(&img, rect).unwrap();
            assert_eq!(out.dimensions(), (OUTPUT_SIZE, OUTPUT_SIZE), "rect {rect}");
        }
    }

    #[test]
    fn test_normalize_empty_rect_fails() {
        let img = create_test_image(200, 200);
        let result = normalize_crop(&img, &CropRect::new(50, 50, 50, 150));
        assert!(matches!(result, Err(CropError::EmptyCrop { .. })));
    }
}
