//! Perceptual Hash (pHash) implementation.
//!
//! pHash runs a Discrete Cosine Transform over a downscaled grayscale copy
//! and keeps the low-frequency corner, setting each bit by comparing the
//! coefficient against the median. This makes it robust to:
//! - Scaling
//! - Brightness/contrast changes
//! - Compression artifacts
//!
//! The DCT itself comes from the image_hasher crate.

use super::super::traits::{Fingerprint, FingerprintProvider, HashAlgorithmKind};
use crate::core::config::HashSize;
use crate::error::HashError;
use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig as ImageHasherConfig};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Perceptual Hash (pHash) implementation using DCT
pub struct PerceptualHasher {
    /// One configured hasher per grid size; the DCT matrix is precomputed
    hashers: RwLock<HashMap<u32, Arc<Hasher>>>,
}

impl PerceptualHasher {
    /// Create a new pHash hasher
    pub fn new() -> Self {
        Self {
            hashers: RwLock::new(HashMap::new()),
        }
    }

    fn build_hasher(hash_size: HashSize) -> Hasher {
        ImageHasherConfig::new()
            .hash_size(hash_size.get(), hash_size.get())
            .hash_alg(HashAlg::Median)
            .preproc_dct()
            .to_hasher()
    }

    fn hasher_for(&self, hash_size: HashSize) -> Arc<Hasher> {
        if let Ok(hashers) = self.hashers.read() {
            if let Some(hasher) = hashers.get(&hash_size.get()) {
                return Arc::clone(hasher);
            }
        }

        let hasher = Arc::new(Self::build_hasher(hash_size));
        match self.hashers.write() {
            Ok(mut hashers) => Arc::clone(
                hashers
                    .entry(hash_size.get())
                    .or_insert_with(|| Arc::clone(&hasher)),
            ),
            Err(_) => hasher,
        }
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintProvider for PerceptualHasher {
    fn extract(
        &self,
        image: &DynamicImage,
        hash_size: HashSize,
    ) -> Result<Fingerprint, HashError> {
        let hash = self.hasher_for(hash_size).hash_image(image);
        Fingerprint::from_bytes(hash.as_bytes().to_vec(), hash_size.bit_count())
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Perceptual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn textured_image(offset: u8) -> DynamicImage {
        let img = ImageBuffer::from_fn(120, 90, |x, y| {
            let wave = ((x as f32 / 9.0).sin() + (y as f32 / 7.0).cos() + 2.0) * 45.0;
            let value = wave as u8 + offset;
            Rgb([value, value / 2 + 20, 200 - value / 2])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn identical_images_produce_identical_fingerprint() {
        let hasher = PerceptualHasher::new();
        let image = textured_image(0);

        let first = hasher.extract(&image, HashSize::DEFAULT).unwrap();
        let second = hasher.extract(&image, HashSize::DEFAULT).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn brightened_copy_stays_close() {
        let hasher = PerceptualHasher::new();

        let original = hasher.extract(&textured_image(0), HashSize::DEFAULT).unwrap();
        let brighter = hasher.extract(&textured_image(6), HashSize::DEFAULT).unwrap();

        let distance = original.normalized_distance(&brighter).unwrap();
        assert!(distance < 0.25, "distance was {}", distance);
    }

    #[test]
    fn fingerprint_has_hash_size_squared_bits() {
        let hasher = PerceptualHasher::new();
        let image = textured_image(0);

        let small = hasher.extract(&image, HashSize::DEFAULT).unwrap();
        let large = hasher.extract(&image, HashSize::new(16).unwrap()).unwrap();

        assert_eq!(small.bit_len(), 64);
        assert_eq!(large.bit_len(), 256);
    }

    #[test]
    fn hashers_are_reused_per_size() {
        let hasher = PerceptualHasher::new();
        let image = textured_image(0);

        hasher.extract(&image, HashSize::DEFAULT).unwrap();
        hasher.extract(&image, HashSize::DEFAULT).unwrap();
        hasher.extract(&image, HashSize::new(16).unwrap()).unwrap();

        assert_eq!(hasher.hashers.read().unwrap().len(), 2);
    }

    #[test]
    fn kind_returns_perceptual() {
        assert_eq!(PerceptualHasher::new().kind(), HashAlgorithmKind::Perceptual);
    }
}
