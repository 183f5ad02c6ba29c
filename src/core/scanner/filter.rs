//! File filtering logic for the scanner.

use super::ImageFormat;
use std::path::Path;

/// Decides whether a file is a candidate image
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a filter that skips hidden files
    pub fn new() -> Self {
        Self::default()
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether a name should be skipped as hidden
    pub fn is_excluded_name(&self, path: &Path) -> bool {
        if self.include_hidden {
            return false;
        }
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
    }

    /// Detect the image format of a file, or `None` if it is not a candidate.
    ///
    /// Unreadable files are reported through the error so the scanner can
    /// record them.
    pub fn classify(&self, path: &Path) -> std::io::Result<Option<ImageFormat>> {
        if self.is_excluded_name(path) {
            return Ok(None);
        }
        ImageFormat::sniff_file(path)
    }
}
