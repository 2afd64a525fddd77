//! Compilation events
//!
//! A pass is triggered by a completed-compilation event from the host
//! toolchain: the path of the freshly compiled module plus the compile
//! diagnostics. The event is serde-deserializable so the CLI can read a
//! diagnostics file the toolchain drops next to the module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity of one compile diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One diagnostic reported by the triggering compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// A completed-compilation event: the trigger for one weaving pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationEvent {
    pub module_path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationEvent {
    /// Event for a compilation that produced no diagnostics.
    pub fn clean(module_path: impl Into<PathBuf>) -> Self {
        Self {
            module_path: module_path.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Whether the compilation reported at least one fatal error. A pass
    /// triggered by such an event is skipped entirely.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}
