//! # Fingerprint Module
//!
//! Derives perceptual fingerprints from image pixels.
//!
//! ## Supported Algorithms
//! - **pHash (Perceptual Hash)** - DCT-based, the default
//! - **dHash (Difference Hash)** - brightness gradients
//! - **aHash (Average Hash)** - brightness against the mean
//!
//! ## How It Works
//! 1. Decode the file (zune-jpeg for JPEG, image crate otherwise)
//! 2. Downscale to a `hash_size`-wide grayscale grid
//! 3. Derive one bit per grid cell
//! 4. Compare fingerprints by normalized Hamming distance
//!
//! ## Example
//! ```rust,ignore
//! use image_dup_finder::core::config::HashSize;
//! use image_dup_finder::core::fingerprint::{HashAlgorithmKind, ProviderConfig};
//!
//! let provider = ProviderConfig::new()
//!     .algorithm(HashAlgorithmKind::Perceptual)
//!     .build();
//!
//! let fingerprint = provider.fingerprint_file(&path, HashSize::DEFAULT)?;
//! ```

mod algorithms;
pub mod decode;
pub mod mmap;
pub mod resize;
mod traits;

pub use algorithms::{AverageHasher, DifferenceHasher, PerceptualHasher};
pub use decode::ImageDecoder;
pub use traits::{Fingerprint, FingerprintProvider, HashAlgorithmKind};

/// Builder for fingerprint providers
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    algorithm: HashAlgorithmKind,
}

impl ProviderConfig {
    /// Create a configuration for the default (perceptual) algorithm
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the provider
    pub fn build(self) -> Box<dyn FingerprintProvider> {
        match self.algorithm {
            HashAlgorithmKind::Perceptual => Box::new(PerceptualHasher::new()),
            HashAlgorithmKind::Difference => Box::new(DifferenceHasher::new()),
            HashAlgorithmKind::Average => Box::new(AverageHasher::new()),
        }
    }
}
