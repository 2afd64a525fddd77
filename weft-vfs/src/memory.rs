//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// An in-memory file system implementation.
///
/// All files are stored in memory using a `BTreeMap`, making it suitable
/// for testing and scenarios where disk access is not desired.
///
/// # Example
/// ```
/// use weft_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.wmod"), b"hello").unwrap();
/// let content = fs.read_file(Path::new("/test.wmod")).unwrap();
/// assert_eq!(content, b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        {
            let mut map = fs.files.write().unwrap();
            for (path, content) in files {
                map.insert(path.as_ref().to_string(), content);
            }
        }
        fs
    }

    /// Normalize a path string for internal storage.
    /// Uses forward slashes consistently for cross-platform compatibility.
    fn normalize_path(&self, path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = self.normalize_path(path);
        let files = self.files.read().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;

        files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| VfsError::NotFound {
                path: normalized.clone(),
            })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        let mut files = self.files.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;
        files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from_key = self.normalize_path(from);
        let to_key = self.normalize_path(to);
        let mut files = self.files.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;
        let content = files
            .remove(&from_key)
            .ok_or(VfsError::NotFound { path: from_key })?;
        files.insert(to_key, content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        let mut files = self.files.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;
        files
            .remove(&normalized)
            .map(|_| ())
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        let files = match self.files.read() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        files.contains_key(&normalized)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        // A directory "exists" when any stored file lives under it
        let mut prefix = self.normalize_path(path);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        let files = match self.files.read() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        files.keys().any(|k| k.starts_with(&prefix))
    }
}
