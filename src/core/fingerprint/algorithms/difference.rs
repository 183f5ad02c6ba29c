//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Resizing the image to (hash_size+1) x hash_size
//! 2. Converting to grayscale
//! 3. Comparing each pixel to the one to its right
//! 4. If left pixel is brighter, set bit to 1, else 0
//!
//! Uses SIMD-accelerated resizing via fast_image_resize.

use super::super::resize::resize_to_grayscale;
use super::super::traits::{Fingerprint, FingerprintProvider, HashAlgorithmKind};
use crate::core::config::HashSize;
use crate::error::HashError;
use image::DynamicImage;

/// Difference Hash (dHash) implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct DifferenceHasher;

impl DifferenceHasher {
    /// Create a new dHash hasher
    pub fn new() -> Self {
        Self
    }
}

impl FingerprintProvider for DifferenceHasher {
    fn extract(
        &self,
        image: &DynamicImage,
        hash_size: HashSize,
    ) -> Result<Fingerprint, HashError> {
        let size = hash_size.get();
        // One extra column so every cell has a right-hand neighbour
        let width = size.checked_add(1).ok_or_else(|| {
            HashError::ComputationFailed(format!("Hash size {} is too large for dHash", size))
        })?;
        let gray = resize_to_grayscale(image, width, size)?;

        let bits = (0..size).flat_map(|y| {
            let gray = &gray;
            (0..size).map(move |x| gray.get_pixel(x, y)[0] > gray.get_pixel(x + 1, y)[0])
        });

        Ok(Fingerprint::from_bits(bits))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Difference
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_images::{left_to_right_gradient, right_to_left_gradient, solid};
    use super::*;

    #[test]
    fn identical_images_produce_identical_fingerprint() {
        let hasher = DifferenceHasher::new();
        let image = solid(128, 128, 128);

        let first = hasher.extract(&image, HashSize::DEFAULT).unwrap();
        let second = hasher.extract(&image, HashSize::DEFAULT).unwrap();

        assert_eq!(first.distance(&second), Some(0));
    }

    #[test]
    fn opposite_gradients_differ_everywhere() {
        let hasher = DifferenceHasher::new();

        // Left-to-right: every left < right (bits = 0)
        // Right-to-left: every left > right (bits = 1)
        let first = hasher
            .extract(&left_to_right_gradient(), HashSize::DEFAULT)
            .unwrap();
        let second = hasher
            .extract(&right_to_left_gradient(), HashSize::DEFAULT)
            .unwrap();

        assert_eq!(first.distance(&second), Some(64));
    }

    #[test]
    fn hash_size_affects_output_length() {
        let hasher = DifferenceHasher::new();
        let image = solid(128, 128, 128);

        let small = hasher.extract(&image, HashSize::DEFAULT).unwrap();
        let large = hasher.extract(&image, HashSize::new(16).unwrap()).unwrap();

        assert_eq!(small.as_bytes().len(), 8);
        assert_eq!(large.as_bytes().len(), 32);
    }

    #[test]
    fn odd_hash_size_is_padded() {
        let hasher = DifferenceHasher::new();
        let fp = hasher
            .extract(&left_to_right_gradient(), HashSize::new(3).unwrap())
            .unwrap();

        assert_eq!(fp.bit_len(), 9);
        assert_eq!(fp.as_bytes().len(), 2);
    }

    #[test]
    fn maximum_hash_size_is_an_error_not_a_panic() {
        let hasher = DifferenceHasher::new();
        let result = hasher.extract(&solid(10, 10, 10), HashSize::new(u32::MAX).unwrap());

        assert!(matches!(result, Err(HashError::ComputationFailed(_))));
    }

    #[test]
    fn kind_returns_difference() {
        assert_eq!(DifferenceHasher::new().kind(), HashAlgorithmKind::Difference);
    }
}
