//! Conversion between images and network input vectors.
//!
//! User drawings arrive as encoded image bytes (PNG from the browser canvas,
//! or any PNG/JPEG/BMP/GIF file on the command line). They are converted to
//! greyscale, resized to the network's square input resolution, and
//! normalized with the same mapping as the dataset pixels.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};

use crate::data::encoding::{denormalize_pixel, normalize_pixel};
use crate::error::DatasetError;

/// Decodes image bytes and down-samples them to a `side × side` input vector.
pub fn canvas_to_input(bytes: &[u8], side: u32) -> Result<Vec<f64>, DatasetError> {
    let img = image::load_from_memory(bytes)?;
    Ok(luma_to_input(&img.to_luma8(), side))
}

/// Down-samples an already decoded greyscale buffer.
pub fn luma_to_input(gray: &GrayImage, side: u32) -> Vec<f64> {
    let resized = if gray.dimensions() == (side, side) {
        gray.clone()
    } else {
        imageops::resize(gray, side, side, FilterType::Triangle)
    };
    resized.pixels().map(|p| normalize_pixel(p.0[0] as f64)).collect()
}

/// Renders a normalized input vector back to a PNG, scaled up by `zoom` with
/// nearest-neighbour sampling so individual pixels stay visible.
///
/// Returns `None` when `input` is not exactly `side * side` long.
pub fn input_to_png(input: &[f64], side: u32, zoom: u32) -> Result<Option<Vec<u8>>, DatasetError> {
    if input.len() != (side * side) as usize {
        return Ok(None);
    }
    let small = GrayImage::from_fn(side, side, |x, y| {
        Luma([denormalize_pixel(input[(y * side + x) as usize])])
    });
    let zoom = zoom.max(1);
    let big = imageops::resize(&small, side * zoom, side * zoom, FilterType::Nearest);

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(big).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(img: GrayImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn canvas_is_downsampled_and_normalized() {
        // White block in the top-left quarter of a black 56×56 canvas.
        let canvas = GrayImage::from_fn(56, 56, |x, y| if x < 28 && y < 28 { Luma([255]) } else { Luma([0]) });
        let input = canvas_to_input(&encode_png(canvas), 28).unwrap();

        assert_eq!(input.len(), 28 * 28);
        assert!(input.iter().all(|&v| (0.01..=1.0).contains(&v)));
        assert!(input[5 * 28 + 5] > 0.9);
        assert!((input[20 * 28 + 20] - 0.01).abs() < 1e-9);
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        assert!(matches!(canvas_to_input(b"not an image", 28), Err(DatasetError::Image(_))));
    }

    #[test]
    fn input_renders_to_png_of_zoomed_size() {
        let input = vec![0.01; 4 * 4];
        let png = input_to_png(&input, 4, 3).unwrap().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 12));
        assert!(input_to_png(&input, 5, 3).unwrap().is_none());
    }
}
