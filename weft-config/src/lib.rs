//! Weft Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Weft crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Ordered directories consulted when resolving external type references.
///
/// Priority order is fixed: the module's own directory first, then the
/// build-intermediate directory, then the host base-library directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPaths {
    /// Directory containing the module being woven
    pub module_dir: Option<PathBuf>,
    /// Build-intermediate output directory
    pub intermediate_dir: Option<PathBuf>,
    /// Host base-library directories
    pub base_library_dirs: Vec<PathBuf>,
}

impl SearchPaths {
    /// All directories in resolution priority order.
    pub fn ordered(&self) -> Vec<&PathBuf> {
        let mut dirs = Vec::new();
        if let Some(dir) = &self.module_dir {
            dirs.push(dir);
        }
        if let Some(dir) = &self.intermediate_dir {
            dirs.push(dir);
        }
        dirs.extend(self.base_library_dirs.iter());
        dirs
    }
}

/// Retry policy for the on-disk module replace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum replace attempts before the pass fails
    pub max_attempts: u32,
    /// Fixed backoff between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(200),
        }
    }
}

/// Configuration for a weaving pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaveConfig {
    /// Administrative kill switch; a disabled pass is skipped entirely
    pub enabled: bool,
    /// Suffix appended to shadow-method names
    pub shadow_suffix: String,
    /// Upper bound on base-chain walks, guards against cyclic graphs
    pub max_hierarchy_depth: u32,
    /// External-reference search directories
    pub search_paths: SearchPaths,
    /// On-disk replace retry policy
    pub retry: RetryPolicy,
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shadow_suffix: "__inner".to_string(),
            max_hierarchy_depth: 32,
            search_paths: SearchPaths::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Weaving subsystem, used for log target names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subsystem {
    Resolver,
    Scanner,
    Weaver,
    Writer,
}

impl Subsystem {
    /// Get the string name of the subsystem
    pub fn as_str(&self) -> &'static str {
        match self {
            Subsystem::Resolver => "resolver",
            Subsystem::Scanner => "scanner",
            Subsystem::Weaver => "weaver",
            Subsystem::Writer => "writer",
        }
    }

    /// Get the log target name for this subsystem
    pub fn target(&self) -> String {
        format!("weft::{}", self.as_str())
    }
}
