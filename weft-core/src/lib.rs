//! Weft Core - the post-compilation aspect-weaving engine
//!
//! Given an already-compiled `.wmod` module, the engine scans its type,
//! field, and method declarations for markers, mutates the matching
//! instruction streams and supporting members through a small bytecode
//! editing kit, and atomically replaces the module (plus its debug-symbol
//! sidecar) on disk. One [`Orchestrator::run`] call is one pass:
//!
//! ```text
//! load -> scan -> weave types -> weave fields -> weave methods -> write
//! ```
//!
//! Per-target failures are isolated and reported; only load and write
//! errors are fatal for a pass.

pub mod error;
pub mod event;
pub mod kit;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod support;
pub mod weavers;
pub mod writer;

pub use error::{ModuleLoadError, TargetError, WeaveError, WriteError};
pub use event::{CompilationEvent, Diagnostic, Severity};
pub use orchestrator::{
    Orchestrator, PassOutcome, PassReport, PassState, SkipReason, TargetFailure,
};
pub use registry::{MarkerRegistry, MarkerRegistryBuilder};
pub use resolver::ModuleResolver;
pub use scanner::{scan, ScanItem, ScanOutput};
pub use weavers::{WeaveContext, WeaveTarget, Weaver, WeaverCategory};
pub use writer::{NoSleep, OutputWriter, Sleep, ThreadSleep};
