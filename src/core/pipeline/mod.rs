//! # Pipeline Module
//!
//! Orchestrates the full near-duplicate detection workflow.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Enumerate image files under the given roots
//! 2. **Fingerprint** - Compute one fingerprint per image
//! 3. **Group** - Compare fingerprints pairwise and group near-duplicates
//!
//! ## Parallelism
//! Uses rayon for both the fingerprinting and the grouping passes unless
//! the pipeline is built with `.parallel(false)`. Results are identical
//! either way.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineResult};
