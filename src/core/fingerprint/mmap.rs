//! Memory-mapped file I/O for image decoding.
//!
//! Large files are mapped instead of copied into a heap buffer, which
//! avoids a kernel-to-user copy for multi-megabyte photos.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read file bytes, memory-mapping files of at least 1MB.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, HashError> {
    let metadata = std::fs::metadata(path).map_err(|e| HashError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.len() == 0 {
        return Err(HashError::EmptyImage {
            path: path.to_path_buf(),
        });
    }

    if metadata.len() >= MMAP_THRESHOLD {
        read_mmap(path)
    } else {
        read_standard(path)
    }
}

fn read_mmap(path: &Path) -> Result<FileBytes, HashError> {
    let file = File::open(path).map_err(|e| HashError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    // SAFETY: the mapping is read-only and lives no longer than the decode
    // call that owns it.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| HashError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(FileBytes::Mmap(mmap))
}

fn read_standard(path: &Path) -> Result<FileBytes, HashError> {
    let bytes = std::fs::read(path).map_err(|e| HashError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(FileBytes::Vec(bytes))
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
