//! SIMD-accelerated downscaling to a small grayscale grid.
//!
//! Uses fast_image_resize, which picks AVX2/NEON when available.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Convert to grayscale and resize to `width` x `height`.
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    // Grayscale first: one channel is cheaper to resample than three
    let gray = image.to_luma8();

    let (src_width, src_height) = gray.dimensions();
    if src_width == 0 || src_height == 0 {
        return Err(HashError::ComputationFailed(
            "Invalid source dimensions".to_string(),
        ));
    }

    if width == 0 || height == 0 {
        return Err(HashError::ComputationFailed(
            "Invalid destination dimensions".to_string(),
        ));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
        .map_err(|e| {
            HashError::ComputationFailed(format!("Failed to create source image: {}", e))
        })?;

    let mut dst_image = Image::new(width, height, PixelType::U8);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| HashError::ComputationFailed(format!("Resize failed: {}", e)))?;

    let result: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
            HashError::ComputationFailed("Failed to create result buffer".to_string())
        })?;

    Ok(result)
}
