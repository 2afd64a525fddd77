//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling code from
/// specific file system implementations.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    ///
    /// # Arguments
    /// * `path` - File path
    ///
    /// # Returns
    /// File contents as bytes, or VfsError
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents
    ///
    /// Creates the file if it doesn't exist, truncates it if it does.
    ///
    /// # Arguments
    /// * `path` - File path
    /// * `content` - Content to write
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Rename a file, replacing any existing file at the destination
    ///
    /// This is the atomic-replace primitive: on native file systems it maps
    /// to `std::fs::rename`, which replaces the destination in one step.
    ///
    /// # Arguments
    /// * `from` - Source path
    /// * `to` - Destination path
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Remove a file
    ///
    /// # Arguments
    /// * `path` - File path
    fn remove_file(&self, path: &Path) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;
}
