//! Image decoding with format-specific fast paths.
//!
//! The format is sniffed from the file's magic bytes. JPEG goes through
//! zune-jpeg (1.5-2x faster than the image crate), HEIC through macOS
//! `sips`, everything else through the image crate.

use super::mmap::read_file_bytes;
use crate::core::scanner::ImageFormat;
use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decoder that picks the fastest available backend per format
pub struct ImageDecoder;

impl ImageDecoder {
    /// Decode an image file into pixels
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        let bytes = read_file_bytes(path)?;

        match ImageFormat::sniff(&bytes) {
            Some(ImageFormat::Jpeg) => {
                Self::decode_jpeg(path, &bytes).or_else(|_| Self::decode_fallback(path, &bytes))
            }
            Some(ImageFormat::Heic) => Self::decode_heic(path),
            Some(_) => Self::decode_fallback(path, &bytes),
            None => Err(HashError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder.decode().map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;

        let buffer_error = |kind: &str| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("Failed to create {} buffer", kind),
        };

        let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);
        let image = match out_colorspace {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| buffer_error("RGB"))?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| buffer_error("RGBA"))?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| buffer_error("Luma"))?;
                DynamicImage::ImageLuma8(buffer)
            }
            _ => return Self::decode_fallback(path, bytes),
        };

        Ok(image)
    }

    /// HEIC/HEIF decoding through the macOS `sips` converter
    #[cfg(target_os = "macos")]
    fn decode_heic(path: &Path) -> Result<DynamicImage, HashError> {
        use std::process::Command;

        let converted = tempfile::Builder::new()
            .prefix("dif_heic_")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| HashError::IoError {
                path: path.to_path_buf(),
                source: e,
            })?;

        let output = Command::new("sips")
            .args(["-s", "format", "jpeg"])
            .arg(path)
            .arg("--out")
            .arg(converted.path())
            .output()
            .map_err(|e| HashError::DecodeError {
                path: path.to_path_buf(),
                reason: format!("Failed to run sips: {}", e),
            })?;

        if !output.status.success() {
            return Err(HashError::DecodeError {
                path: path.to_path_buf(),
                reason: format!(
                    "sips conversion failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }

        image::open(converted.path()).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("Failed to read converted HEIC: {}", e),
        })
    }

    #[cfg(not(target_os = "macos"))]
    fn decode_heic(path: &Path) -> Result<DynamicImage, HashError> {
        Err(HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "HEIC decoding is only supported on macOS".to_string(),
        })
    }

    fn decode_fallback(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        image::load_from_memory(bytes).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
