//! Output writer
//!
//! Commits a woven module back to its original path. The module (and
//! debug-symbol sidecar, when loaded) is serialized to a temporary file
//! first; the replace itself is backup-then-rename under a bounded retry
//! loop, tolerating transient locks held by concurrent readers in the
//! host toolchain. Until the final rename succeeds the original file is
//! either in place or restorable from its backup, so a failed pass never
//! leaves a partially written module behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use weft_config::RetryPolicy;
use weft_model::{encode_module, CompiledModule};
use weft_vfs::{VfsError, VirtualFileSystem};

use crate::error::WriteError;
use crate::resolver::SYMBOL_EXTENSION;

/// Injectable backoff, so atomicity tests run without real waiting.
pub trait Sleep: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Backoff on the current thread; the pass is synchronous by design.
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// No waiting at all, for deterministic tests.
pub struct NoSleep;

impl Sleep for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

/// Serializes and atomically replaces the module file and its sidecar.
pub struct OutputWriter {
    fs: Arc<dyn VirtualFileSystem>,
    retry: RetryPolicy,
    sleep: Arc<dyn Sleep>,
}

impl OutputWriter {
    pub fn new(fs: Arc<dyn VirtualFileSystem>, retry: RetryPolicy) -> Self {
        Self::with_sleep(fs, retry, Arc::new(ThreadSleep))
    }

    pub fn with_sleep(
        fs: Arc<dyn VirtualFileSystem>,
        retry: RetryPolicy,
        sleep: Arc<dyn Sleep>,
    ) -> Self {
        Self { fs, retry, sleep }
    }

    /// Commit the module to `path`, consuming it; a module is never
    /// reused after its pass. Temporary and backup files are cleaned up
    /// on success and left behind for forensics on failure.
    pub fn commit(&self, module: CompiledModule, path: &Path) -> Result<(), WriteError> {
        let bytes = encode_module(&module);
        let tmp = sibling(path, ".tmp");
        self.stage(&tmp, &bytes)?;

        let sidecar_files = match &module.debug_symbols {
            Some(symbols) => {
                let json = symbols.to_json().map_err(|e| WriteError::Stage {
                    path: path.with_extension(SYMBOL_EXTENSION),
                    source: VfsError::Custom {
                        message: e.to_string(),
                    },
                })?;
                let sidecar = path.with_extension(SYMBOL_EXTENSION);
                let sidecar_tmp = sibling(&sidecar, ".tmp");
                self.stage(&sidecar_tmp, &json)?;
                Some((sidecar, sidecar_tmp))
            }
            None => None,
        };

        self.replace_with_retry(path, &tmp)?;
        if let Some((sidecar, sidecar_tmp)) = sidecar_files {
            self.replace_with_retry(&sidecar, &sidecar_tmp)?;
        }

        info!(target: "weft::writer", "committed {}", path.display());
        Ok(())
    }

    fn stage(&self, tmp: &Path, bytes: &[u8]) -> Result<(), WriteError> {
        debug!(target: "weft::writer", "staging {} ({} bytes)", tmp.display(), bytes.len());
        self.fs
            .write_file(tmp, bytes)
            .map_err(|source| WriteError::Stage {
                path: tmp.to_path_buf(),
                source,
            })
    }

    /// Backup-and-replace `target` with `tmp`, retrying on failure with
    /// the configured fixed backoff. The backup is restored whenever the
    /// final rename fails, so `target` stays intact across failed
    /// attempts.
    fn replace_with_retry(&self, target: &Path, tmp: &Path) -> Result<(), WriteError> {
        let bak = sibling(target, ".bak");
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts.max(1) {
            match self.try_replace(target, tmp, &bak) {
                Ok(()) => {
                    if attempt > 1 {
                        info!(
                            target: "weft::writer",
                            "replaced {} on attempt {}",
                            target.display(),
                            attempt
                        );
                    }
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        target: "weft::writer",
                        "replace attempt {}/{} for {} failed: {}",
                        attempt,
                        self.retry.max_attempts,
                        target.display(),
                        e
                    );
                    last_error = Some(e);
                    if attempt < self.retry.max_attempts {
                        self.sleep.sleep(self.retry.backoff);
                    }
                }
            }
        }

        Err(WriteError::ReplaceExhausted {
            path: target.to_path_buf(),
            attempts: self.retry.max_attempts,
            source: last_error.unwrap_or(VfsError::Custom {
                message: "no replace attempt ran".into(),
            }),
        })
    }

    fn try_replace(&self, target: &Path, tmp: &Path, bak: &Path) -> Result<(), VfsError> {
        let had_original = self.fs.is_file(target);
        if had_original {
            self.fs.rename(target, bak)?;
        }
        if let Err(e) = self.fs.rename(tmp, target) {
            if had_original {
                if let Err(restore) = self.fs.rename(bak, target) {
                    warn!(
                        target: "weft::writer",
                        "restoring backup of {} failed: {}",
                        target.display(),
                        restore
                    );
                }
            }
            return Err(e);
        }
        if had_original {
            // best effort: a lingering backup is harmless
            let _ = self.fs.remove_file(bak);
        }
        Ok(())
    }
}

/// `game.wmod` + `.bak` -> `game.wmod.bak`; the module extension stays
/// visible in the derived name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
