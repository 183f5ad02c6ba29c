//! Turns pairwise matches into duplicate groups.
//!
//! [`DirectionalGrouper`] attaches later paths to the earliest path they
//! match. [`TransitiveGrouper`] merges every chain of matches into one
//! group, so if A matches B and B matches C then {A, B, C} is a single
//! group even if A doesn't directly match C.

use super::{ComparisonStrategy, DuplicateGroup, DuplicateGroups, GroupMember};
use crate::core::cache::FingerprintRecord;
use crate::core::fingerprint::Fingerprint;
use crate::events::ProgressFn;
use rayon::prelude::*;
use std::path::PathBuf;

/// Later indices matching one base index, with their normalized distance
pub(crate) type Row = Vec<(usize, f64)>;

/// Fingerprints laid out in input order, ready for pairwise comparison
pub(crate) struct MatchMatrix<'a> {
    paths: &'a [PathBuf],
    fingerprints: Vec<Option<&'a Fingerprint>>,
    bit_count: f64,
}

impl<'a> MatchMatrix<'a> {
    pub(crate) fn new(paths: &'a [PathBuf], record: &'a FingerprintRecord) -> Self {
        Self {
            paths,
            fingerprints: paths.iter().map(|path| record.get(path)).collect(),
            bit_count: record.hash_size().bit_count() as f64,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }

    /// Normalized distance between two indices that both have fingerprints
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> f64 {
        a.distance_unchecked(b) as f64 / self.bit_count
    }

    /// Every `j > i` within threshold of `i`, or `None` if `i` has no fingerprint
    pub(crate) fn row(&self, i: usize, strategy: &dyn ComparisonStrategy) -> Option<Row> {
        let base = self.fingerprints[i]?;

        let row = self.fingerprints[i + 1..]
            .iter()
            .enumerate()
            .filter_map(|(offset, target)| {
                let target = (*target)?;
                let distance = self.distance(base, target);
                strategy
                    .is_duplicate(distance)
                    .then_some((i + 1 + offset, distance))
            })
            .collect();

        Some(row)
    }

    /// All rows, computed on the rayon pool and returned in index order
    pub(crate) fn rows_parallel(
        &self,
        strategy: &dyn ComparisonStrategy,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Vec<Option<Row>> {
        (0..self.len())
            .into_par_iter()
            .map(|i| {
                let row = self.row(i, strategy);
                tick(on_progress);
                row
            })
            .collect()
    }

    fn member(&self, strategy: &dyn ComparisonStrategy, index: usize, distance: f64) -> GroupMember {
        GroupMember {
            path: self.paths[index].clone(),
            distance,
            match_type: strategy.classify(distance),
        }
    }
}

fn tick(on_progress: Option<ProgressFn<'_>>) {
    if let Some(progress) = on_progress {
        progress();
    }
}

/// Attaches later paths to the earliest path they match.
///
/// A path captured as a member never becomes a representative itself, but
/// it may still be a member of several groups.
pub struct DirectionalGrouper;

impl DirectionalGrouper {
    pub fn new() -> Self {
        Self
    }

    /// Sequential pass; rows of captured paths are never computed
    pub(crate) fn group(
        &self,
        matrix: &MatchMatrix<'_>,
        strategy: &dyn ComparisonStrategy,
        on_progress: Option<ProgressFn<'_>>,
    ) -> DuplicateGroups {
        let mut captured = vec![false; matrix.len()];
        let mut groups = Vec::new();

        for i in 0..matrix.len() {
            if !captured[i] {
                if let Some(row) = matrix.row(i, strategy) {
                    Self::push_group(matrix, strategy, i, row, &mut captured, &mut groups);
                }
            }
            tick(on_progress);
        }

        DuplicateGroups::new(groups)
    }

    /// Assemble groups from rows computed ahead of time
    pub(crate) fn assemble(
        &self,
        matrix: &MatchMatrix<'_>,
        strategy: &dyn ComparisonStrategy,
        rows: Vec<Option<Row>>,
    ) -> DuplicateGroups {
        let mut captured = vec![false; matrix.len()];
        let mut groups = Vec::new();

        for (i, row) in rows.into_iter().enumerate() {
            if captured[i] {
                continue;
            }
            if let Some(row) = row {
                Self::push_group(matrix, strategy, i, row, &mut captured, &mut groups);
            }
        }

        DuplicateGroups::new(groups)
    }

    fn push_group(
        matrix: &MatchMatrix<'_>,
        strategy: &dyn ComparisonStrategy,
        representative: usize,
        row: Row,
        captured: &mut [bool],
        groups: &mut Vec<DuplicateGroup>,
    ) {
        if row.is_empty() {
            return;
        }

        let members = row
            .into_iter()
            .map(|(j, distance)| {
                captured[j] = true;
                matrix.member(strategy, j, distance)
            })
            .collect();

        groups.push(DuplicateGroup {
            representative: matrix.paths[representative].clone(),
            members,
        });
    }
}

impl Default for DirectionalGrouper {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups paths into connected components of the match graph
pub struct TransitiveGrouper;

impl TransitiveGrouper {
    /// Create a new transitive grouper
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn group(
        &self,
        matrix: &MatchMatrix<'_>,
        strategy: &dyn ComparisonStrategy,
        on_progress: Option<ProgressFn<'_>>,
    ) -> DuplicateGroups {
        let rows = (0..matrix.len())
            .map(|i| {
                let row = matrix.row(i, strategy);
                tick(on_progress);
                row
            })
            .collect();

        self.assemble(matrix, strategy, rows)
    }

    /// Union every matching pair, then emit one group per component.
    ///
    /// The earliest index in a component is its representative; members
    /// follow in input order with their distance to the representative.
    pub(crate) fn assemble(
        &self,
        matrix: &MatchMatrix<'_>,
        strategy: &dyn ComparisonStrategy,
        rows: Vec<Option<Row>>,
    ) -> DuplicateGroups {
        let mut sets = UnionFind::new(matrix.len());
        for (i, row) in rows.iter().enumerate() {
            for &(j, _) in row.iter().flatten() {
                sets.union(i, j);
            }
        }

        let mut components: Vec<Vec<usize>> = vec![Vec::new(); matrix.len()];
        for i in 0..matrix.len() {
            let root = sets.find(i);
            components[root].push(i);
        }

        let mut groups = Vec::new();
        for (root, component) in components.into_iter().enumerate() {
            if component.len() < 2 {
                continue;
            }

            // Roots are always the smallest index in their component
            let Some(base) = matrix.fingerprints[root] else {
                continue;
            };

            let members = component[1..]
                .iter()
                .filter_map(|&j| {
                    let target = matrix.fingerprints[j]?;
                    Some(matrix.member(strategy, j, matrix.distance(base, target)))
                })
                .collect();

            groups.push(DuplicateGroup {
                representative: matrix.paths[root].clone(),
                members,
            });
        }

        DuplicateGroups::new(groups)
    }
}

impl Default for TransitiveGrouper {
    fn default() -> Self {
        Self::new()
    }
}

/// Disjoint sets over indices; the root of a set is its smallest index
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    /// Find root with path compression
    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }

        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (low, high) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[high] = low;
        }
    }
}
