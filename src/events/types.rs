//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the detection pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Enumeration phase events
    Scan(ScanEvent),
    /// Fingerprinting phase events
    Fingerprint(FingerprintEvent),
    /// Grouping phase events
    Group(GroupEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { roots: Vec<PathBuf> },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// An image was found
    ImageFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_images: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories visited so far
    pub directories_scanned: usize,
    /// Number of images found so far
    pub images_found: usize,
    /// Directory being visited
    pub current_path: PathBuf,
}

/// Events during the fingerprinting phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting has started
    Started { total_images: usize },
    /// One more image processed (success or failure)
    Progress(Progress),
    /// An image could not be fingerprinted and is excluded from grouping
    Failed { path: PathBuf },
    /// Fingerprinting completed
    Completed { fingerprinted: usize, failed: usize },
}

/// Events during the grouping phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEvent {
    /// Grouping has started
    Started { total_images: usize },
    /// One more outer-loop index processed
    Progress(Progress),
    /// Grouping completed
    Completed {
        total_groups: usize,
        total_duplicates: usize,
    },
}

/// Units of work completed out of the total for a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Fingerprinting,
    Grouping,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Images found by the scanner
    pub total_images: usize,
    /// Images that could not be fingerprinted
    pub failed_images: usize,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Number of duplicate entries (excluding representatives)
    pub duplicate_count: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Fingerprinting => write!(f, "Fingerprinting"),
            PipelinePhase::Grouping => write!(f, "Grouping"),
        }
    }
}
