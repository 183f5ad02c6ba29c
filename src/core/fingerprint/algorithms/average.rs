//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Resizing the image to hash_size x hash_size
//! 2. Converting to grayscale
//! 3. Computing the average brightness
//! 4. For each pixel: if brighter than average, set bit to 1, else 0
//!
//! The fastest of the three, and the least robust to edits.

use super::super::resize::resize_to_grayscale;
use super::super::traits::{Fingerprint, FingerprintProvider, HashAlgorithmKind};
use crate::core::config::HashSize;
use crate::error::HashError;
use image::DynamicImage;

/// Average Hash (aHash) implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct AverageHasher;

impl AverageHasher {
    /// Create a new aHash hasher
    pub fn new() -> Self {
        Self
    }
}

impl FingerprintProvider for AverageHasher {
    fn extract(
        &self,
        image: &DynamicImage,
        hash_size: HashSize,
    ) -> Result<Fingerprint, HashError> {
        let size = hash_size.get();
        let gray = resize_to_grayscale(image, size, size)?;

        let total: u64 = gray.pixels().map(|p| p[0] as u64).sum();
        let average = total / hash_size.bit_count() as u64;

        Ok(Fingerprint::from_bits(
            gray.pixels().map(|p| p[0] as u64 > average),
        ))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Average
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_images::{left_to_right_gradient, right_to_left_gradient, solid};
    use super::*;

    #[test]
    fn solid_image_has_no_bits_set() {
        let hasher = AverageHasher::new();
        let fp = hasher.extract(&solid(90, 90, 90), HashSize::DEFAULT).unwrap();

        assert_eq!(fp.bit_len(), 64);
        assert!(fp.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn mirrored_gradients_are_far_apart() {
        let hasher = AverageHasher::new();

        let first = hasher
            .extract(&left_to_right_gradient(), HashSize::DEFAULT)
            .unwrap();
        let second = hasher
            .extract(&right_to_left_gradient(), HashSize::DEFAULT)
            .unwrap();

        assert!(first.distance(&second).unwrap() > 32);
    }

    #[test]
    fn kind_returns_average() {
        assert_eq!(AverageHasher::new().kind(), HashAlgorithmKind::Average);
    }
}
