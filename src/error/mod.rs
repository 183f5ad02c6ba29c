//! # Error Module
//!
//! Error types for the near-duplicate image finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, values, what went wrong
//! - **Per-file failures are not fatal** - a broken image only drops out of the results
//! - **Configuration errors are fatal** - surfaced before any expensive work starts

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DuplicateFinderError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Fingerprinting error: {0}")]
    Hash(#[from] HashError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Errors that occur while enumerating candidate images
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while decoding an image or extracting its fingerprint.
///
/// These never abort a batch; the affected path is recorded as having no
/// fingerprint.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Unsupported image format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Fingerprint computation failed: {0}")]
    ComputationFailed(String),

    #[error("Fingerprint has {actual} bits, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Batch-level configuration errors.
///
/// Detected before the pairwise comparison pass begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid hash size: {value} (must be a positive integer)")]
    InvalidHashSize { value: u32 },

    #[error("Invalid threshold: {value} (must be between 0 and 1)")]
    ThresholdOutOfRange { value: f64 },

    #[error(
        "Fingerprints were computed with hash size {actual} but grouping was asked to use {expected}"
    )]
    HashSizeMismatch { expected: u32, actual: u32 },

    #[error("Fingerprint for {path} has {actual} bits, expected {expected}")]
    FingerprintLengthMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("Path {path} appears more than once")]
    DuplicatePath { path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DuplicateFinderError>;
