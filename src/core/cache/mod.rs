//! # Fingerprint Cache
//!
//! Computes one fingerprint per enumerated path for a single batch.
//!
//! A path whose image cannot be decoded or fingerprinted is recorded with
//! no fingerprint and the batch carries on. Nothing is persisted between
//! runs; the record lives only as long as the caller keeps it.

use crate::core::config::HashSize;
use crate::core::fingerprint::{
    Fingerprint, FingerprintProvider, HashAlgorithmKind, ProviderConfig,
};
use crate::events::ProgressFn;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fingerprints for one batch, keyed by path.
///
/// `None` (or an absent path) means the image could not be fingerprinted.
/// Entries are never modified once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintRecord {
    hash_size: HashSize,
    entries: HashMap<PathBuf, Option<Fingerprint>>,
}

impl FingerprintRecord {
    /// Build a record from `(path, fingerprint)` pairs.
    ///
    /// If a path appears more than once the first entry wins.
    pub fn from_entries<I>(hash_size: HashSize, entries: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, Option<Fingerprint>)>,
    {
        let mut map = HashMap::new();
        for (path, fingerprint) in entries {
            map.entry(path).or_insert(fingerprint);
        }
        Self {
            hash_size,
            entries: map,
        }
    }

    /// Hash size the fingerprints were computed with
    pub fn hash_size(&self) -> HashSize {
        self.hash_size
    }

    /// Fingerprint for a path, if it was computed successfully
    pub fn get(&self, path: &Path) -> Option<&Fingerprint> {
        self.entries.get(path).and_then(Option::as_ref)
    }

    /// Whether the path was processed at all (successfully or not)
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of processed paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of paths with a fingerprint
    pub fn fingerprinted_count(&self) -> usize {
        self.entries.values().filter(|fp| fp.is_some()).count()
    }

    /// Paths that could not be fingerprinted, in no particular order
    pub fn failed_paths(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|(_, fp)| fp.is_none())
            .map(|(path, _)| path.as_path())
    }

    /// Iterate over every processed path
    pub fn iter(&self) -> impl Iterator<Item = (&Path, Option<&Fingerprint>)> {
        self.entries
            .iter()
            .map(|(path, fp)| (path.as_path(), fp.as_ref()))
    }
}

/// Computes fingerprint records through a pluggable provider
pub struct FingerprintCache {
    provider: Box<dyn FingerprintProvider>,
}

impl FingerprintCache {
    /// Create a cache backed by the given provider
    pub fn new(provider: Box<dyn FingerprintProvider>) -> Self {
        Self { provider }
    }

    /// Create a cache backed by one of the built-in algorithms
    pub fn with_algorithm(algorithm: HashAlgorithmKind) -> Self {
        Self::new(ProviderConfig::new().algorithm(algorithm).build())
    }

    /// The provider used to extract fingerprints
    pub fn provider(&self) -> &dyn FingerprintProvider {
        self.provider.as_ref()
    }

    /// Fingerprint every path in order.
    ///
    /// `on_progress` is invoked exactly once per path, after that path has
    /// been processed, whether or not it succeeded.
    pub fn compute(
        &self,
        paths: &[PathBuf],
        hash_size: HashSize,
        on_progress: Option<ProgressFn<'_>>,
    ) -> FingerprintRecord {
        let entries = paths
            .iter()
            .map(|path| {
                let fingerprint = self.fingerprint_one(path, hash_size);
                if let Some(tick) = on_progress {
                    tick();
                }
                (path.clone(), fingerprint)
            })
            .collect::<Vec<_>>();

        self.finish(hash_size, entries)
    }

    /// Fingerprint every path on the rayon thread pool.
    ///
    /// Produces the same record as [`compute`](Self::compute). Progress is
    /// still reported once per path, in completion order.
    pub fn compute_parallel(
        &self,
        paths: &[PathBuf],
        hash_size: HashSize,
        on_progress: Option<ProgressFn<'_>>,
    ) -> FingerprintRecord {
        let entries = paths
            .par_iter()
            .map(|path| {
                let fingerprint = self.fingerprint_one(path, hash_size);
                if let Some(tick) = on_progress {
                    tick();
                }
                (path.clone(), fingerprint)
            })
            .collect::<Vec<_>>();

        self.finish(hash_size, entries)
    }

    fn fingerprint_one(&self, path: &Path, hash_size: HashSize) -> Option<Fingerprint> {
        match self.provider.fingerprint_file(path, hash_size) {
            Ok(fingerprint) => {
                debug!(path = %path.display(), fingerprint = %fingerprint.to_hex(), "Fingerprinted");
                Some(fingerprint)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not fingerprint image");
                None
            }
        }
    }

    fn finish(
        &self,
        hash_size: HashSize,
        entries: Vec<(PathBuf, Option<Fingerprint>)>,
    ) -> FingerprintRecord {
        let record = FingerprintRecord::from_entries(hash_size, entries);
        info!(
            algorithm = %self.provider.kind(),
            %hash_size,
            fingerprinted = record.fingerprinted_count(),
            failed = record.len() - record.fingerprinted_count(),
            "Fingerprinting complete"
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HashError;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Encodes the image width into every bit so results are predictable
    struct WidthProvider;

    impl FingerprintProvider for WidthProvider {
        fn extract(
            &self,
            image: &DynamicImage,
            hash_size: HashSize,
        ) -> Result<Fingerprint, HashError> {
            let odd = image.width() % 2 == 1;
            Ok(Fingerprint::from_bits(
                std::iter::repeat(odd).take(hash_size.bit_count()),
            ))
        }

        fn kind(&self) -> HashAlgorithmKind {
            HashAlgorithmKind::Average
        }
    }

    /// Always returns a fingerprint of the wrong length
    struct ShortProvider;

    impl FingerprintProvider for ShortProvider {
        fn extract(&self, _: &DynamicImage, _: HashSize) -> Result<Fingerprint, HashError> {
            Ok(Fingerprint::from_bits([true, false]))
        }

        fn kind(&self) -> HashAlgorithmKind {
            HashAlgorithmKind::Average
        }
    }

    fn write_png(dir: &TempDir, name: &str, width: u32) -> PathBuf {
        let path = dir.path().join(name);
        ImageBuffer::from_fn(width, 8, |x, _| Rgb([x as u8, 0, 0]))
            .save(&path)
            .unwrap();
        path
    }

    fn write_corrupt(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"definitely not an image").unwrap();
        path
    }

    #[test]
    fn compute_records_every_path() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write_png(&dir, "odd.png", 9),
            write_png(&dir, "even.png", 10),
        ];

        let cache = FingerprintCache::new(Box::new(WidthProvider));
        let record = cache.compute(&paths, HashSize::DEFAULT, None);

        assert_eq!(record.len(), 2);
        assert_eq!(record.hash_size(), HashSize::DEFAULT);
        assert_eq!(record.get(&paths[0]).unwrap().as_bytes(), &[0xFF; 8]);
        assert_eq!(record.get(&paths[1]).unwrap().as_bytes(), &[0x00; 8]);
    }

    #[test]
    fn failures_are_recorded_without_aborting() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write_corrupt(&dir, "broken.jpg"),
            write_png(&dir, "fine.png", 9),
            dir.path().join("missing.png"),
        ];

        let cache = FingerprintCache::new(Box::new(WidthProvider));
        let record = cache.compute(&paths, HashSize::DEFAULT, None);

        assert_eq!(record.len(), 3);
        assert!(record.contains(&paths[0]));
        assert!(record.get(&paths[0]).is_none());
        assert!(record.get(&paths[1]).is_some());
        assert!(record.get(&paths[2]).is_none());
        assert_eq!(record.fingerprinted_count(), 1);
        assert_eq!(record.failed_paths().count(), 2);
    }

    #[test]
    fn wrong_length_fingerprints_count_as_failures() {
        let dir = TempDir::new().unwrap();
        let paths = vec![write_png(&dir, "fine.png", 9)];

        let cache = FingerprintCache::new(Box::new(ShortProvider));
        let record = cache.compute(&paths, HashSize::DEFAULT, None);

        assert!(record.get(&paths[0]).is_none());
    }

    #[test]
    fn progress_is_reported_once_per_path() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write_png(&dir, "a.png", 9),
            write_corrupt(&dir, "b.png"),
            write_png(&dir, "c.png", 10),
            dir.path().join("missing.png"),
        ];

        let calls = AtomicUsize::new(0);
        let tick = || {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        let cache = FingerprintCache::new(Box::new(WidthProvider));
        cache.compute(&paths, HashSize::DEFAULT, Some(&tick));
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        cache.compute_parallel(&paths, HashSize::DEFAULT, Some(&tick));
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn parallel_matches_sequential() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..12)
            .map(|i| {
                if i % 5 == 0 {
                    write_corrupt(&dir, &format!("{}.png", i))
                } else {
                    write_png(&dir, &format!("{}.png", i), 8 + i)
                }
            })
            .collect();

        let cache = FingerprintCache::new(Box::new(WidthProvider));
        let sequential = cache.compute(&paths, HashSize::DEFAULT, None);
        let parallel = cache.compute_parallel(&paths, HashSize::DEFAULT, None);

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("textured.png");
        ImageBuffer::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, ((x * y) % 251) as u8]))
            .save(&path)
            .unwrap();
        let paths = vec![path];

        let cache = FingerprintCache::with_algorithm(HashAlgorithmKind::Perceptual);
        let first = cache.compute(&paths, HashSize::DEFAULT, None);
        let second = cache.compute(&paths, HashSize::DEFAULT, None);

        assert!(first.get(&paths[0]).is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn from_entries_keeps_first_duplicate() {
        let path = PathBuf::from("/a.png");
        let fp = Fingerprint::from_bits([true; 4]);
        let record = FingerprintRecord::from_entries(
            HashSize::new(2).unwrap(),
            vec![(path.clone(), Some(fp.clone())), (path.clone(), None)],
        );

        assert_eq!(record.len(), 1);
        assert_eq!(record.get(&path), Some(&fp));
    }
}
