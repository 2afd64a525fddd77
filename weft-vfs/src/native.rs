//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::Path;

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access.
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self
    }
}

fn map_io(path: &Path, e: std::io::Error) -> VfsError {
    match e.kind() {
        std::io::ErrorKind::NotFound => VfsError::NotFound {
            path: path.to_string_lossy().to_string(),
        },
        std::io::ErrorKind::PermissionDenied => VfsError::PermissionDenied {
            path: path.to_string_lossy().to_string(),
        },
        _ => e.into(),
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| map_io(path, e))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        std::fs::write(path, content).map_err(|e| map_io(path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        std::fs::rename(from, to).map_err(|e| map_io(from, e))
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        std::fs::remove_file(path).map_err(|e| map_io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
