//! Trait definitions for comparison strategies.

use super::MatchType;
use crate::core::config::Threshold;

/// Strategy trait for deciding whether two fingerprints are duplicates
pub trait ComparisonStrategy: Send + Sync {
    /// Decide from a normalized distance in `[0, 1]`
    fn is_duplicate(&self, distance: f64) -> bool;

    /// Classify the match type based on normalized distance
    fn classify(&self, distance: f64) -> MatchType;
}

/// Simple threshold-based comparison strategy
#[derive(Debug, Clone, Copy)]
pub struct ThresholdStrategy {
    threshold: Threshold,
}

impl ThresholdStrategy {
    /// Create a new threshold strategy
    ///
    /// Useful values at hash size 8:
    /// - 0.1: Conservative, few false positives
    /// - 0.2: Balanced (CLI default)
    /// - 0.3: Permissive, catches resized and recompressed copies
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold }
    }
}

impl ComparisonStrategy for ThresholdStrategy {
    fn is_duplicate(&self, distance: f64) -> bool {
        self.threshold.accepts(distance)
    }

    fn classify(&self, distance: f64) -> MatchType {
        MatchType::from_distance(distance)
    }
}
