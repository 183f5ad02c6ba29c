//! Fingerprint value type and the provider capability trait.

use super::decode::ImageDecoder;
use crate::core::config::HashSize;
use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fixed-length perceptual fingerprint.
///
/// Bits are packed most-significant-first; padding bits in the final byte
/// are always zero so whole-byte XOR gives the exact Hamming distance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl Fingerprint {
    /// Build a fingerprint from packed bytes holding `bit_len` bits
    pub fn from_bytes(mut bytes: Vec<u8>, bit_len: usize) -> Result<Self, HashError> {
        let expected_bytes = bit_len.div_ceil(8);
        if bytes.len() != expected_bytes {
            return Err(HashError::LengthMismatch {
                expected: bit_len,
                actual: bytes.len() * 8,
            });
        }

        let padding = expected_bytes * 8 - bit_len;
        if let Some(last) = bytes.last_mut() {
            *last &= 0xFFu8 << padding;
        }

        Ok(Self { bytes, bit_len })
    }

    /// Build a fingerprint from individual bits in order
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut bytes = Vec::new();
        let mut bit_len = 0;

        for bit in bits {
            if bit_len % 8 == 0 {
                bytes.push(0);
            }
            if bit {
                if let Some(byte) = bytes.last_mut() {
                    *byte |= 1 << (7 - bit_len % 8);
                }
            }
            bit_len += 1;
        }

        Self { bytes, bit_len }
    }

    /// Number of meaningful bits
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Packed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hexadecimal rendering of the packed bytes
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Number of differing bits, or `None` when the lengths differ
    pub fn distance(&self, other: &Self) -> Option<u32> {
        if self.bit_len != other.bit_len {
            return None;
        }
        Some(self.distance_unchecked(other))
    }

    /// Fraction of differing bits in `[0, 1]`, or `None` when the lengths differ
    pub fn normalized_distance(&self, other: &Self) -> Option<f64> {
        let distance = self.distance(other)?;
        if self.bit_len == 0 {
            return Some(0.0);
        }
        Some(distance as f64 / self.bit_len as f64)
    }

    /// Hamming distance for fingerprints already known to share a length
    pub(crate) fn distance_unchecked(&self, other: &Self) -> u32 {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Available fingerprint algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithmKind {
    /// Perceptual Hash (pHash) - DCT-based, robust to edits
    #[default]
    Perceptual,
    /// Difference Hash (dHash) - brightness gradients between neighbours
    Difference,
    /// Average Hash (aHash) - brightness against the mean
    Average,
}

impl HashAlgorithmKind {
    /// Get a human-readable description of the algorithm
    pub fn description(&self) -> &'static str {
        match self {
            HashAlgorithmKind::Perceptual => {
                "Perceptual Hash (pHash) - DCT-based, robust to edits and transformations"
            }
            HashAlgorithmKind::Difference => {
                "Difference Hash (dHash) - Compares brightness gradients between pixels"
            }
            HashAlgorithmKind::Average => {
                "Average Hash (aHash) - Fast comparison based on average brightness"
            }
        }
    }
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Perceptual => write!(f, "pHash"),
            HashAlgorithmKind::Difference => write!(f, "dHash"),
            HashAlgorithmKind::Average => write!(f, "aHash"),
        }
    }
}

/// Capability interface for fingerprint extraction.
///
/// Implementations turn decoded pixels into a `hash_size²`-bit fingerprint.
/// Swapping the provider never affects how fingerprints are grouped.
pub trait FingerprintProvider: Send + Sync {
    /// Extract a fingerprint from already-decoded pixels
    fn extract(&self, image: &DynamicImage, hash_size: HashSize)
        -> Result<Fingerprint, HashError>;

    /// Decode a file and extract its fingerprint.
    ///
    /// The result is rejected unless it has exactly `hash_size²` bits.
    fn fingerprint_file(&self, path: &Path, hash_size: HashSize) -> Result<Fingerprint, HashError> {
        let image = ImageDecoder::decode(path)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        let fingerprint = self.extract(&image, hash_size)?;
        if fingerprint.bit_len() != hash_size.bit_count() {
            return Err(HashError::LengthMismatch {
                expected: hash_size.bit_count(),
                actual: fingerprint.bit_len(),
            });
        }

        Ok(fingerprint)
    }

    /// Get the algorithm kind
    fn kind(&self) -> HashAlgorithmKind;
}
