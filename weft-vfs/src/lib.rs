//! Weft Virtual File System
//!
//! A virtual file system abstraction with multiple backend implementations.
//! The weaving engine performs every read, write, and atomic rename through
//! this trait so tests can run against in-memory or fault-injecting
//! backends.
//!
//! # Usage
//! ```rust
//! use weft_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/game.wmod"), b"bytes").unwrap();
//! let content = fs.read_file(Path::new("/game.wmod")).unwrap();
//! assert_eq!(content, b"bytes");
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

/// Create a new memory-based file system.
pub fn memory_fs() -> MemoryFileSystem {
    MemoryFileSystem::new()
}

/// Create a new native file system.
pub fn native_fs() -> NativeFileSystem {
    NativeFileSystem::new()
}
