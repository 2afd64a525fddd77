//! Weft workspace facade
//!
//! Re-exports the public surface of the member crates for consumers that
//! want a single dependency.

pub use weft_config as config;
pub use weft_core as core;
pub use weft_model as model;
pub use weft_vfs as vfs;

pub use weft_core::{MarkerRegistry, MarkerRegistryBuilder, Orchestrator, PassOutcome};
pub use weft_model::CompiledModule;
