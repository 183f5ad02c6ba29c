//! Pipeline execution implementation.

use crate::core::cache::{FingerprintCache, FingerprintRecord};
use crate::core::comparator::{self, DuplicateGroups};
use crate::core::config::DetectionConfig;
use crate::core::fingerprint::{FingerprintProvider, HashAlgorithmKind, ProviderConfig};
use crate::core::scanner::{ImageEnumerator, ScanConfig, WalkDirScanner};
use crate::error::DuplicateFinderError;
use crate::events::{
    null_sender, Event, EventSender, FingerprintEvent, GroupEvent, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// All duplicate groups found
    pub groups: DuplicateGroups,
    /// Total images enumerated
    pub total_images: usize,
    /// Images that could not be fingerprinted, in scan order
    pub failed: Vec<PathBuf>,
    /// Non-fatal scan errors
    pub errors: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
struct PipelineConfig {
    paths: Vec<PathBuf>,
    detection: DetectionConfig,
    algorithm: HashAlgorithmKind,
    scan_config: ScanConfig,
    parallel: bool,
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    provider: Option<Box<dyn FingerprintProvider>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new(detection: DetectionConfig) -> Self {
        Self {
            config: PipelineConfig {
                paths: Vec::new(),
                detection,
                algorithm: HashAlgorithmKind::default(),
                scan_config: ScanConfig::default(),
                parallel: true,
            },
            provider: None,
        }
    }

    /// Add directories to scan
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Set the fingerprint algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Use a custom fingerprint provider instead of a built-in algorithm
    pub fn provider(mut self, provider: Box<dyn FingerprintProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Run both passes on the rayon pool (default) or sequentially
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let provider = self
            .provider
            .unwrap_or_else(|| ProviderConfig::new().algorithm(self.config.algorithm).build());

        Pipeline {
            config: self.config,
            cache: FingerprintCache::new(provider),
        }
    }
}

/// The near-duplicate detection pipeline
pub struct Pipeline {
    config: PipelineConfig,
    cache: FingerprintCache,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(detection: DetectionConfig) -> PipelineBuilder {
        PipelineBuilder::new(detection)
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, DuplicateFinderError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(
        &self,
        events: &EventSender,
    ) -> Result<PipelineResult, DuplicateFinderError> {
        let result = self.execute(events);
        if let Err(e) = &result {
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn execute(&self, events: &EventSender) -> Result<PipelineResult, DuplicateFinderError> {
        let start_time = Instant::now();
        let detection = &self.config.detection;

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan_result = scanner.scan_with_events(&self.config.paths, events)?;

        let errors: Vec<String> = scan_result.errors.iter().map(|e| e.to_string()).collect();
        let paths = scan_result.paths();
        let total_images = paths.len();

        // Phase 2: Fingerprinting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Fingerprinting,
        }));
        events.send(Event::Fingerprint(FingerprintEvent::Started { total_images }));

        let record = {
            let ticker = events.ticker(total_images, |p| {
                Event::Fingerprint(FingerprintEvent::Progress(p))
            });
            let on_progress = || ticker.tick();

            if self.config.parallel {
                self.cache
                    .compute_parallel(&paths, detection.hash_size, Some(&on_progress))
            } else {
                self.cache
                    .compute(&paths, detection.hash_size, Some(&on_progress))
            }
        };

        let failed = failed_in_order(&paths, &record);
        for path in &failed {
            events.send(Event::Fingerprint(FingerprintEvent::Failed { path: path.clone() }));
        }
        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            fingerprinted: total_images - failed.len(),
            failed: failed.len(),
        }));

        // Phase 3: Grouping
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Grouping,
        }));
        events.send(Event::Group(GroupEvent::Started { total_images }));

        let groups = {
            let ticker = events.ticker(total_images, |p| Event::Group(GroupEvent::Progress(p)));
            let on_progress = || ticker.tick();

            if self.config.parallel {
                comparator::group_parallel(&paths, &record, detection, Some(&on_progress))?
            } else {
                comparator::group(&paths, &record, detection, Some(&on_progress))?
            }
        };

        events.send(Event::Group(GroupEvent::Completed {
            total_groups: groups.len(),
            total_duplicates: groups.duplicate_count(),
        }));

        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            images = total_images,
            failed = failed.len(),
            groups = groups.len(),
            duration_ms,
            "Pipeline complete"
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_images,
                failed_images: failed.len(),
                duplicate_groups: groups.len(),
                duplicate_count: groups.duplicate_count(),
                duration_ms,
            },
        }));

        Ok(PipelineResult {
            groups,
            total_images,
            failed,
            errors,
            duration_ms,
        })
    }
}

fn failed_in_order(paths: &[PathBuf], record: &FingerprintRecord) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| record.get(path).is_none())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GroupingMode, HashSize};
    use crate::events::EventChannel;
    use image::{ImageBuffer, Rgb};
    use std::fs;
    use tempfile::TempDir;

    fn detection() -> DetectionConfig {
        DetectionConfig::from_raw(8, 0.2).unwrap()
    }

    fn write_textured_png(dir: &TempDir, name: &str, seed: u32) -> PathBuf {
        let path = dir.path().join(name);
        ImageBuffer::from_fn(64, 64, |x, y| {
            let v = ((x * 7 + y * 13 + seed * 31) ^ (x * y + seed)) % 256;
            Rgb([v as u8, (v / 2) as u8, (255 - v) as u8])
        })
        .save(&path)
        .unwrap();
        path
    }

    #[test]
    fn pipeline_handles_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let pipeline = Pipeline::builder(detection())
            .paths(vec![temp_dir.path().to_path_buf()])
            .build();

        let result = pipeline.run().unwrap();

        assert_eq!(result.total_images, 0);
        assert!(result.groups.is_empty());
        assert!(result.failed.is_empty());
    }

    #[test]
    fn identical_copies_are_grouped() {
        let temp_dir = TempDir::new().unwrap();
        let original = write_textured_png(&temp_dir, "a.png", 1);
        fs::copy(&original, temp_dir.path().join("b.png")).unwrap();

        let pipeline = Pipeline::builder(detection())
            .paths(vec![temp_dir.path().to_path_buf()])
            .build();

        let result = pipeline.run().unwrap();

        assert_eq!(result.total_images, 2);
        assert_eq!(result.groups.len(), 1);
        let group = &result.groups.groups()[0];
        assert!(group.representative.ends_with("a.png"));
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].distance, 0.0);
    }

    #[test]
    fn corrupt_image_is_reported_and_excluded() {
        let temp_dir = TempDir::new().unwrap();
        write_textured_png(&temp_dir, "a.png", 1);
        let corrupt = temp_dir.path().join("b.png");
        fs::write(
            &corrupt,
            [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00],
        )
        .unwrap();

        let result = Pipeline::builder(detection())
            .paths(vec![temp_dir.path().to_path_buf()])
            .parallel(false)
            .build()
            .run()
            .unwrap();

        assert_eq!(result.total_images, 2);
        assert!(result.groups.is_empty());
        assert_eq!(result.failed, vec![corrupt]);
    }

    #[test]
    fn missing_root_is_a_non_fatal_error() {
        let result = Pipeline::builder(detection())
            .paths(vec![PathBuf::from("/nonexistent/path/12345")])
            .build()
            .run()
            .unwrap();

        assert_eq!(result.total_images, 0);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_textured_png(&temp_dir, "a.png", 1);
        write_textured_png(&temp_dir, "b.png", 2);
        fs::copy(&a, temp_dir.path().join("c.png")).unwrap();

        let detection = detection().with_mode(GroupingMode::Transitive);
        let run = |parallel| {
            Pipeline::builder(detection)
                .paths(vec![temp_dir.path().to_path_buf()])
                .parallel(parallel)
                .build()
                .run()
                .unwrap()
                .groups
        };

        assert_eq!(run(true), run(false));
    }

    #[test]
    fn progress_events_cover_every_image() {
        let temp_dir = TempDir::new().unwrap();
        for (i, name) in ["a.png", "b.png", "c.png"].iter().enumerate() {
            write_textured_png(&temp_dir, name, i as u32);
        }

        let (sender, receiver) = EventChannel::new();
        Pipeline::builder(detection())
            .paths(vec![temp_dir.path().to_path_buf()])
            .build()
            .run_with_events(&sender)
            .unwrap();
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        let fingerprint_ticks = events
            .iter()
            .filter(|e| matches!(e, Event::Fingerprint(FingerprintEvent::Progress(_))))
            .count();
        let group_ticks = events
            .iter()
            .filter(|e| matches!(e, Event::Group(GroupEvent::Progress(_))))
            .count();

        assert_eq!(fingerprint_ticks, 3);
        assert_eq!(group_ticks, 3);
        assert!(matches!(events.first(), Some(Event::Pipeline(PipelineEvent::Started))));
        assert!(matches!(
            events.last(),
            Some(Event::Pipeline(PipelineEvent::Completed { .. }))
        ));
    }

    #[test]
    fn builder_keeps_detection_config() {
        let config = DetectionConfig::new(HashSize::HIGH_FIDELITY, detection().threshold);
        let pipeline = Pipeline::builder(config).parallel(false).build();

        assert_eq!(pipeline.config.detection.hash_size, HashSize::HIGH_FIDELITY);
        assert!(!pipeline.config.parallel);
    }
}
