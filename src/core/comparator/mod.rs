//! # Comparator Module
//!
//! Finds near-duplicates by comparing fingerprints pairwise.
//!
//! ## How It Works
//! 1. Check the batch configuration against the fingerprint record
//! 2. Compare every path with every later path (normalized Hamming distance)
//! 3. Apply the comparison strategy to decide duplicates
//! 4. Group matches, directionally (default) or transitively
//!
//! Comparison is O(n²) in the number of paths; there is no index.
//!
//! ## Match Classification
//! | Normalized distance | Classification |
//! |---------------------|----------------|
//! | 0                   | Exact match    |
//! | up to 1/16          | Near-exact     |
//! | up to 5/32          | Similar        |
//! | above               | Maybe similar  |

mod grouper;
mod traits;

pub use grouper::{DirectionalGrouper, TransitiveGrouper};
pub use traits::{ComparisonStrategy, ThresholdStrategy};

use crate::core::cache::FingerprintRecord;
use crate::core::config::{DetectionConfig, GroupingMode};
use crate::error::ConfigError;
use crate::events::ProgressFn;
use grouper::MatchMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Classification of match types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// No differing bits
    Exact,
    /// At most 1/16 of bits differ (4 of 64)
    NearExact,
    /// At most 5/32 of bits differ (10 of 64)
    Similar,
    /// Anything further apart that the threshold still accepted
    MaybeSimilar,
}

impl MatchType {
    /// Classify based on normalized Hamming distance
    pub fn from_distance(distance: f64) -> Self {
        if distance <= 0.0 {
            MatchType::Exact
        } else if distance <= 0.0625 {
            MatchType::NearExact
        } else if distance <= 0.15625 {
            MatchType::Similar
        } else {
            MatchType::MaybeSimilar
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "Exact Match"),
            MatchType::NearExact => write!(f, "Near-Exact Match"),
            MatchType::Similar => write!(f, "Similar"),
            MatchType::MaybeSimilar => write!(f, "Possibly Similar"),
        }
    }
}

/// One duplicate attached to a representative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub path: PathBuf,
    /// Normalized distance to the representative
    pub distance: f64,
    pub match_type: MatchType,
}

/// A representative and the images judged near-duplicates of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The earliest path of the group in input order
    pub representative: PathBuf,
    /// Duplicates in input order; never empty
    pub members: Vec<GroupMember>,
}

impl DuplicateGroup {
    /// Get the number of duplicates (excluding the representative)
    pub fn duplicate_count(&self) -> usize {
        self.members.len()
    }

    /// Member paths in order
    pub fn member_paths(&self) -> impl Iterator<Item = &Path> {
        self.members.iter().map(|m| m.path.as_path())
    }

    /// Closest-matching type among the members
    pub fn best_match(&self) -> Option<MatchType> {
        self.members
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .map(|m| m.match_type)
    }
}

/// All groups found in one batch, ordered by representative position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuplicateGroups {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateGroups {
    /// Wrap groups, dropping any without members
    pub fn new(groups: Vec<DuplicateGroup>) -> Self {
        Self {
            groups: groups
                .into_iter()
                .filter(|g| !g.members.is_empty())
                .collect(),
        }
    }

    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Group whose representative is `path`
    pub fn get(&self, path: &Path) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.representative == path)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.groups.iter()
    }

    /// Total member entries across all groups
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Plain `representative -> members` mapping
    pub fn to_map(&self) -> HashMap<PathBuf, Vec<PathBuf>> {
        self.groups
            .iter()
            .map(|g| {
                (
                    g.representative.clone(),
                    g.members.iter().map(|m| m.path.clone()).collect(),
                )
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a DuplicateGroups {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

impl IntoIterator for DuplicateGroups {
    type Item = DuplicateGroup;
    type IntoIter = std::vec::IntoIter<DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Check that a record can be grouped under `config`.
///
/// Fails on the first problem found, in input order.
pub fn validate(
    paths: &[PathBuf],
    record: &FingerprintRecord,
    config: &DetectionConfig,
) -> Result<(), ConfigError> {
    if record.hash_size() != config.hash_size {
        return Err(ConfigError::HashSizeMismatch {
            expected: config.hash_size.get(),
            actual: record.hash_size().get(),
        });
    }

    let expected = config.hash_size.bit_count();
    let mut seen = HashSet::with_capacity(paths.len());
    for path in paths {
        // A repeated path would match itself at distance 0
        if !seen.insert(path.as_path()) {
            return Err(ConfigError::DuplicatePath { path: path.clone() });
        }
        if let Some(fingerprint) = record.get(path) {
            if fingerprint.bit_len() != expected {
                return Err(ConfigError::FingerprintLengthMismatch {
                    path: path.clone(),
                    expected,
                    actual: fingerprint.bit_len(),
                });
            }
        }
    }

    Ok(())
}

/// Group near-duplicates among `paths`.
///
/// Paths without a fingerprint are skipped. `on_progress` is called once per
/// path in `paths`, after that path's comparisons.
pub fn group(
    paths: &[PathBuf],
    record: &FingerprintRecord,
    config: &DetectionConfig,
    on_progress: Option<ProgressFn<'_>>,
) -> Result<DuplicateGroups, ConfigError> {
    validate(paths, record, config)?;

    let matrix = MatchMatrix::new(paths, record);
    let strategy = ThresholdStrategy::new(config.threshold);

    let groups = match config.mode {
        GroupingMode::Directional => DirectionalGrouper::new().group(&matrix, &strategy, on_progress),
        GroupingMode::Transitive => TransitiveGrouper::new().group(&matrix, &strategy, on_progress),
    };

    log_summary(config, &groups);
    Ok(groups)
}

/// Same as [`group`], comparing rows on the rayon pool.
pub fn group_parallel(
    paths: &[PathBuf],
    record: &FingerprintRecord,
    config: &DetectionConfig,
    on_progress: Option<ProgressFn<'_>>,
) -> Result<DuplicateGroups, ConfigError> {
    validate(paths, record, config)?;

    let matrix = MatchMatrix::new(paths, record);
    let strategy = ThresholdStrategy::new(config.threshold);
    let rows = matrix.rows_parallel(&strategy, on_progress);

    let groups = match config.mode {
        GroupingMode::Directional => DirectionalGrouper::new().assemble(&matrix, &strategy, rows),
        GroupingMode::Transitive => TransitiveGrouper::new().assemble(&matrix, &strategy, rows),
    };

    log_summary(config, &groups);
    Ok(groups)
}

fn log_summary(config: &DetectionConfig, groups: &DuplicateGroups) {
    info!(
        mode = %config.mode,
        threshold = %config.threshold,
        groups = groups.len(),
        duplicates = groups.duplicate_count(),
        "Grouping complete"
    );
}
