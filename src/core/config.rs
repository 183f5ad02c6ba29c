//! Detection configuration shared by the fingerprinting and grouping passes.
//!
//! Every value here is validated on construction. The library never falls
//! back to a default hash size or threshold on its own; callers choose them
//! explicitly (the CLI picks `HashSize::DEFAULT` and a 0.2 threshold).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Side length of the fingerprint grid. A fingerprint has `hash_size²` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct HashSize(NonZeroU32);

impl HashSize {
    /// 8x8 grid, 64 bits
    pub const DEFAULT: HashSize = HashSize(match NonZeroU32::new(8) {
        Some(size) => size,
        None => unreachable!(),
    });

    /// 128x128 grid, 16384 bits. Much slower, catches finer differences.
    pub const HIGH_FIDELITY: HashSize = HashSize(match NonZeroU32::new(128) {
        Some(size) => size,
        None => unreachable!(),
    });

    /// Create a hash size, rejecting zero
    pub fn new(size: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(size)
            .map(HashSize)
            .ok_or(ConfigError::InvalidHashSize { value: size })
    }

    /// Grid side length
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Number of bits in a fingerprint of this size
    pub fn bit_count(self) -> usize {
        let side = self.0.get() as usize;
        side * side
    }
}

impl TryFrom<u32> for HashSize {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        HashSize::new(value)
    }
}

impl From<HashSize> for u32 {
    fn from(size: HashSize) -> Self {
        size.get()
    }
}

impl std::fmt::Display for HashSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum fraction of differing bits still considered a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    /// Create a threshold in `[0, 1]`
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::ThresholdOutOfRange { value })
        }
    }

    /// Raw threshold value
    pub fn get(self) -> f64 {
        self.0
    }

    /// Whether a normalized distance falls within this threshold.
    ///
    /// `0` requires identical fingerprints, `1` accepts everything, anything
    /// in between accepts distances strictly below the threshold.
    pub fn accepts(self, distance: f64) -> bool {
        if self.0 >= 1.0 {
            return true;
        }
        distance == 0.0 || distance < self.0
    }
}

impl TryFrom<f64> for Threshold {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Threshold::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(threshold: Threshold) -> Self {
        threshold.get()
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How pairwise matches are turned into groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// Later paths are attached to the earliest path they match.
    /// Not an equivalence relation: groups may overlap.
    #[default]
    Directional,
    /// Connected components of the match graph (union-find).
    Transitive,
}

impl std::fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupingMode::Directional => write!(f, "directional"),
            GroupingMode::Transitive => write!(f, "transitive"),
        }
    }
}

/// Parameters governing one detection batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Fingerprint grid size, shared by both passes
    pub hash_size: HashSize,
    /// Normalized Hamming distance cutoff
    pub threshold: Threshold,
    /// Grouping strategy
    pub mode: GroupingMode,
}

impl DetectionConfig {
    /// Create a configuration using directional grouping
    pub fn new(hash_size: HashSize, threshold: Threshold) -> Self {
        Self {
            hash_size,
            threshold,
            mode: GroupingMode::Directional,
        }
    }

    /// Validate raw values and build a configuration
    pub fn from_raw(hash_size: u32, threshold: f64) -> Result<Self, ConfigError> {
        Ok(Self::new(HashSize::new(hash_size)?, Threshold::new(threshold)?))
    }

    /// Switch the grouping mode
    pub fn with_mode(mut self, mode: GroupingMode) -> Self {
        self.mode = mode;
        self
    }
}
