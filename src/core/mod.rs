//! # Core Module
//!
//! The UI-agnostic near-duplicate detection engine.
//!
//! ## Modules
//! - `config` - Validated detection settings
//! - `scanner` - Enumerates image files in directories
//! - `fingerprint` - Computes perceptual fingerprints
//! - `cache` - Holds one batch of fingerprints
//! - `comparator` - Groups near-duplicates by comparing fingerprints
//! - `pipeline` - Orchestrates the full workflow

pub mod cache;
pub mod comparator;
pub mod config;
pub mod fingerprint;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use cache::{FingerprintCache, FingerprintRecord};
pub use comparator::{group, group_parallel, DuplicateGroup, DuplicateGroups, GroupMember, MatchType};
pub use config::{DetectionConfig, GroupingMode, HashSize, Threshold};
pub use fingerprint::{Fingerprint, FingerprintProvider, HashAlgorithmKind};
pub use scanner::ImageFile;
