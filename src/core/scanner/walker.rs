//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, ImageEnumerator, ImageFile, ScanResult};
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanProgress};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

/// Scanner implementation using the walkdir crate.
///
/// Entries are visited in file-name order so repeated scans of an unchanged
/// tree yield the same sequence.
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = ImageFilter::new().with_hidden(config.include_hidden);
        Self { config, filter }
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0 && entry.file_type().is_dir() && self.filter.is_excluded_name(entry.path())
    }

    /// Scan a single root directory.
    ///
    /// Files already in `seen` (by canonical path) are skipped, so overlapping
    /// or repeated roots list each image once.
    fn scan_directory(
        &self,
        root: &Path,
        seen: &mut HashSet<PathBuf>,
        events: &EventSender,
    ) -> Result<(Vec<ImageFile>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut images = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry_result in walker.into_iter().filter_entry(|entry| !self.is_pruned(entry)) {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };
                    Self::record_error(events, &mut errors, path, error);
                    continue;
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    images_found: images.len(),
                    current_path: path.to_path_buf(),
                })));
                continue;
            }

            let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if !seen.insert(key) {
                debug!(path = %path.display(), "Already listed under another root");
                continue;
            }

            let format = match self.filter.classify(path) {
                Ok(Some(format)) => format,
                Ok(None) => continue,
                Err(source) => {
                    let error = ScanError::ReadDirectory {
                        path: path.to_path_buf(),
                        source,
                    };
                    Self::record_error(events, &mut errors, path.to_path_buf(), error);
                    continue;
                }
            };

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            debug!(path = %path.display(), %format, "Found image");
            events.send(Event::Scan(ScanEvent::ImageFound {
                path: path.to_path_buf(),
            }));

            images.push(ImageFile {
                path: path.to_path_buf(),
                size,
                format,
            });
        }

        Ok((images, errors))
    }

    fn record_error(
        events: &EventSender,
        errors: &mut Vec<ScanError>,
        path: PathBuf,
        error: ScanError,
    ) {
        debug!(path = %path.display(), error = %error, "Skipping unreadable entry");
        events.send(Event::Scan(ScanEvent::Error {
            path,
            message: error.to_string(),
        }));
        errors.push(error);
    }
}

impl ImageEnumerator for WalkDirScanner {
    fn scan(&self, roots: &[PathBuf]) -> Result<ScanResult, ScanError> {
        self.scan_with_events(roots, &null_sender())
    }

    fn scan_with_events(
        &self,
        roots: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            roots: roots.to_vec(),
        }));

        let mut all_images = Vec::new();
        let mut all_errors = Vec::new();
        let mut seen = HashSet::new();

        for root in roots {
            match self.scan_directory(root, &mut seen, events) {
                Ok((images, errors)) => {
                    all_images.extend(images);
                    all_errors.extend(errors);
                }
                Err(e) => {
                    events.send(Event::Scan(ScanEvent::Error {
                        path: root.clone(),
                        message: e.to_string(),
                    }));
                    all_errors.push(e);
                }
            }
        }

        info!(
            images = all_images.len(),
            errors = all_errors.len(),
            "Scan complete"
        );
        events.send(Event::Scan(ScanEvent::Completed {
            total_images: all_images.len(),
        }));

        Ok(ScanResult {
            images: all_images,
            errors: all_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::ImageFormat;
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_jpeg_header(path: &Path) {
        let mut file = File::create(path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
    }

    fn create_png_header(path: &Path) {
        let mut file = File::create(path).unwrap();
        file.write_all(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
            .unwrap();
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        assert!(result.images.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_detects_formats_by_content() {
        let temp_dir = TempDir::new().unwrap();
        create_jpeg_header(&temp_dir.path().join("photo.jpg"));
        create_png_header(&temp_dir.path().join("really_a_png.jpg"));

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        let formats: Vec<_> = result.images.iter().map(|i| i.format).collect();
        assert_eq!(formats, vec![ImageFormat::Jpeg, ImageFormat::Png]);
    }

    #[test]
    fn scan_excludes_non_image_files() {
        let temp_dir = TempDir::new().unwrap();
        create_jpeg_header(&temp_dir.path().join("photo.jpg"));
        fs::write(temp_dir.path().join("document.txt"), b"hello").unwrap();
        fs::write(temp_dir.path().join("fake.png"), b"not a png").unwrap();

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        assert_eq!(result.images.len(), 1);
        assert!(result.images[0].path.ends_with("photo.jpg"));
    }

    #[test]
    fn scan_order_is_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            create_jpeg_header(&temp_dir.path().join(name));
        }

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        let names: Vec<_> = result
            .images
            .iter()
            .map(|i| i.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        create_jpeg_header(&temp_dir.path().join("root.jpg"));
        create_jpeg_header(&subdir.join("nested.jpg"));

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        assert_eq!(result.images.len(), 2);
    }

    #[test]
    fn scan_respects_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        create_jpeg_header(&temp_dir.path().join("root.jpg"));
        create_jpeg_header(&subdir.join("nested.jpg"));

        let config = ScanConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        let result = WalkDirScanner::new(config)
            .scan(&[temp_dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(result.images.len(), 1);
    }

    #[test]
    fn scan_skips_hidden_files_and_directories_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let hidden_dir = temp_dir.path().join(".thumbnails");
        fs::create_dir(&hidden_dir).unwrap();

        create_jpeg_header(&temp_dir.path().join("visible.jpg"));
        create_jpeg_header(&temp_dir.path().join(".hidden.jpg"));
        create_jpeg_header(&hidden_dir.join("thumb.jpg"));

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        assert_eq!(result.images.len(), 1);
        assert!(result.images[0].path.ends_with("visible.jpg"));
    }

    #[test]
    fn scan_can_include_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        create_jpeg_header(&temp_dir.path().join("visible.jpg"));
        create_jpeg_header(&temp_dir.path().join(".hidden.jpg"));

        let config = ScanConfig {
            include_hidden: true,
            ..Default::default()
        };
        let result = WalkDirScanner::new(config)
            .scan(&[temp_dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(result.images.len(), 2);
    }

    #[test]
    fn overlapping_roots_list_each_image_once() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        create_jpeg_header(&temp_dir.path().join("a.jpg"));
        create_jpeg_header(&sub.join("only.jpg"));

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[
                temp_dir.path().to_path_buf(),
                sub.clone(),
                temp_dir.path().to_path_buf(),
            ])
            .unwrap();

        let paths: Vec<_> = result.images.iter().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec![temp_dir.path().join("a.jpg"), sub.join("only.jpg")]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_nonexistent_directory_records_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[PathBuf::from("/nonexistent/path/12345")])
            .unwrap();

        assert!(result.images.is_empty());
        assert!(matches!(
            result.errors.as_slice(),
            [ScanError::DirectoryNotFound { .. }]
        ));
    }
}
