//! # Scanner Module
//!
//! Enumerates candidate images under one or more root directories.
//!
//! Files are recognised by their content (magic bytes), not by extension:
//! a `.jpg` holding text is skipped and an extensionless PNG is kept.
//!
//! ## Recognised Formats
//! - JPEG, PNG, GIF, WebP, BMP, TIFF
//! - HEIC/HEIF (iPhone photos; decodable on macOS only)
//!
//! ## Example
//! ```rust,ignore
//! use image_dup_finder::core::scanner::{ImageEnumerator, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["/Users/photos".into()])?;
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Number of leading bytes needed to recognise every supported format
const SNIFF_LEN: u64 = 16;

/// A discovered image file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Format detected from the file's content
    pub format: ImageFormat,
}

/// Image formats recognised by content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Heic,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// Identify a format from the first bytes of a file
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        if bytes.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }

        if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        // HEIC/HEIF: ISO base media `ftyp` box with an image brand
        if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
            let brand = &bytes[8..12];
            if [b"heic", b"heix", b"hevc", b"heif", b"mif1", b"msf1"]
                .iter()
                .any(|known| brand == *known)
            {
                return Some(ImageFormat::Heic);
            }
        }

        if bytes.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }

        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(ImageFormat::Tiff);
        }

        None
    }

    /// Identify the format of a file on disk by reading its header
    pub fn sniff_file(path: &Path) -> std::io::Result<Option<Self>> {
        let mut header = Vec::with_capacity(SNIFF_LEN as usize);
        File::open(path)?.take(SNIFF_LEN).read_to_end(&mut header)?;
        Ok(Self::sniff(&header))
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
            ImageFormat::WebP => "WebP",
            ImageFormat::Heic => "HEIC",
            ImageFormat::Bmp => "BMP",
            ImageFormat::Tiff => "TIFF",
        };
        write!(f, "{}", name)
    }
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered images, in traversal order
    pub images: Vec<ImageFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    /// Paths of the discovered images, in traversal order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.images.iter().map(|image| image.path.clone()).collect()
    }
}

/// Produces the ordered list of candidate images.
///
/// Implement this trait to plug in a different enumeration strategy
/// (e.g., a fixed list for testing).
pub trait ImageEnumerator: Send + Sync {
    /// Scan directories and return discovered images
    fn scan(&self, roots: &[PathBuf]) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(
        &self,
        roots: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError>;
}
