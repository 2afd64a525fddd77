//! Weaving error types
//!
//! Two scopes, two types. `WeaveError` is fatal for the whole pass: the
//! module could not be loaded or the woven result could not be written.
//! `TargetError` is scoped to a single `(weaver, target)` application; it
//! is caught at the orchestrator boundary, recorded in the pass report,
//! and never stops the remaining targets.

use std::path::PathBuf;
use thiserror::Error;
use weft_model::DecodeError;
use weft_vfs::VfsError;

/// The module file could not be loaded into a `CompiledModule`.
#[derive(Debug, Clone, Error)]
pub enum ModuleLoadError {
    #[error("cannot read module '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("cannot decode module '{path}': {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// The woven module could not be committed to disk.
#[derive(Debug, Clone, Error)]
pub enum WriteError {
    /// Staging the temporary file failed before any replace was attempted.
    #[error("cannot stage '{path}': {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    /// Every replace attempt failed; the original file was restored.
    #[error("replacing '{path}' failed after {attempts} attempts: {source}")]
    ReplaceExhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: VfsError,
    },
}

/// A module-level error that aborts the whole pass.
#[derive(Debug, Clone, Error)]
pub enum WeaveError {
    #[error(transparent)]
    Load(#[from] ModuleLoadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// An error scoped to one `(weaver, target)` application.
///
/// The weaver contract requires validation before mutation, so a returned
/// `TargetError` implies the target's declarations are untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetError {
    /// A reference the weaver had to follow could not be resolved.
    #[error("reference resolution failed: {0}")]
    ReferenceResolution(String),

    /// Marker argument count or types do not match the marker's shape.
    #[error("malformed marker arguments: {0}")]
    MarkerShape(String),

    /// The declaration does not satisfy the weaver's contract.
    #[error("unsupported declaration shape: {0}")]
    UnsupportedShape(String),

    /// A runtime-support symbol the weaver emits a call to is absent or
    /// has the wrong shape in the resolved support library.
    #[error("missing runtime symbol: {0}")]
    MissingSymbol(String),
}
