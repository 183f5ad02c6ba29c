//! # Image Duplicate Finder
//!
//! Finds visually near-identical images by comparing perceptual fingerprints.
//!
//! ## Core Philosophy
//! - **Never modify files** - the finder only reads and reports
//! - **One bad file never spoils a batch** - it is simply left out
//! - **No hidden defaults** - hash size and threshold are always explicit
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - The detection engine
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types
//!
//! ## Example
//! ```rust,ignore
//! use image_dup_finder::core::{DetectionConfig, FingerprintCache, HashAlgorithmKind, HashSize, Threshold};
//!
//! let config = DetectionConfig::new(HashSize::DEFAULT, Threshold::new(0.2)?);
//! let cache = FingerprintCache::with_algorithm(HashAlgorithmKind::Perceptual);
//! let record = cache.compute(&paths, config.hash_size, None);
//! let groups = image_dup_finder::core::group(&paths, &record, &config, None)?;
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DuplicateFinderError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the application.
///
/// Logs go to stderr so they never mix with report output. `RUST_LOG`
/// takes precedence; otherwise `verbose` selects `debug` over `warn`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
