//! Weaving orchestrator
//!
//! Drives one pass: load, scan, weave types then fields then methods,
//! write. Later stages may depend on members earlier stages create
//! (guard fields, synthesized lifecycle methods), so the stage order is
//! fixed. Per-target errors are caught here, logged with the target's
//! full identity, and recorded in the pass report; only module-level
//! load/write errors abort the pass.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, trace, warn};
use weft_config::{SearchPaths, WeaveConfig};
use weft_vfs::VirtualFileSystem;

use crate::error::{TargetError, WeaveError};
use crate::event::CompilationEvent;
use crate::registry::MarkerRegistry;
use crate::resolver::ModuleResolver;
use crate::scanner::{scan, ScanItem};
use crate::weavers::WeaveContext;
use crate::writer::{OutputWriter, Sleep, ThreadSleep};

/// One flag for the whole process: passes mutate an unsynchronized
/// module graph and contend for the same output file, so two may never
/// overlap. A blocked trigger is dropped, not queued; the triggering
/// compilation event recurs.
static PASS_ACTIVE: AtomicBool = AtomicBool::new(false);

struct PassGuard;

impl PassGuard {
    fn try_acquire() -> Option<Self> {
        PASS_ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PassGuard)
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        PASS_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Stages of a pass. Per-target errors never change the state; only a
/// module-level failure moves it to `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Loading,
    Scanning,
    WeavingTypes,
    WeavingFields,
    WeavingMethods,
    Writing,
    Aborted(String),
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassState::Idle => write!(f, "idle"),
            PassState::Loading => write!(f, "loading"),
            PassState::Scanning => write!(f, "scanning"),
            PassState::WeavingTypes => write!(f, "weaving-types"),
            PassState::WeavingFields => write!(f, "weaving-fields"),
            PassState::WeavingMethods => write!(f, "weaving-methods"),
            PassState::Writing => write!(f, "writing"),
            PassState::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

/// Why a triggered pass did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Weaving is administratively disabled.
    Disabled,
    /// The triggering compilation reported fatal errors.
    CompilationErrors,
}

/// One recorded per-target failure, with the target's full identity.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFailure {
    pub target: String,
    pub marker: String,
    pub error: TargetError,
}

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub module: String,
    pub woven: usize,
    pub failures: Vec<TargetFailure>,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of handling one compilation event.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Completed(PassReport),
    /// Another pass was running; this trigger was dropped.
    Dropped,
    Skipped(SkipReason),
}

/// Drives weaving passes over compilation events.
pub struct Orchestrator {
    config: WeaveConfig,
    registry: MarkerRegistry,
    fs: Arc<dyn VirtualFileSystem>,
    sleep: Arc<dyn Sleep>,
    state: PassState,
}

impl Orchestrator {
    pub fn new(
        config: WeaveConfig,
        registry: MarkerRegistry,
        fs: Arc<dyn VirtualFileSystem>,
    ) -> Self {
        Self::with_sleep(config, registry, fs, Arc::new(ThreadSleep))
    }

    pub fn with_sleep(
        config: WeaveConfig,
        registry: MarkerRegistry,
        fs: Arc<dyn VirtualFileSystem>,
        sleep: Arc<dyn Sleep>,
    ) -> Self {
        Self {
            config,
            registry,
            fs,
            sleep,
            state: PassState::Idle,
        }
    }

    pub fn state(&self) -> &PassState {
        &self.state
    }

    /// Handle one completed-compilation event.
    ///
    /// Runs synchronously to completion or fatal abort; there is no
    /// cancellation mid-pass. A concurrent invocation anywhere in the
    /// process is dropped.
    pub fn run(&mut self, event: &CompilationEvent) -> Result<PassOutcome, WeaveError> {
        let Some(_guard) = PassGuard::try_acquire() else {
            warn!(
                target: "weft::weaver",
                "pass already active, dropping trigger for {}",
                event.module_path.display()
            );
            return Ok(PassOutcome::Dropped);
        };

        if !self.config.enabled {
            info!(target: "weft::weaver", "weaving disabled, skipping pass");
            return Ok(PassOutcome::Skipped(SkipReason::Disabled));
        }
        if event.has_errors() {
            info!(
                target: "weft::weaver",
                "compilation of {} reported errors, skipping pass",
                event.module_path.display()
            );
            return Ok(PassOutcome::Skipped(SkipReason::CompilationErrors));
        }

        Self::transition(&mut self.state, PassState::Loading);
        let search = effective_search_paths(&self.config.search_paths, &event.module_path);
        let mut resolver = ModuleResolver::new(self.fs.clone(), search);
        let mut module = match resolver.load(&event.module_path) {
            Ok(module) => module,
            Err(e) => {
                Self::abort(&mut self.state, &e);
                return Err(e.into());
            }
        };

        Self::transition(&mut self.state, PassState::Scanning);
        let work = scan(&module, &self.registry);

        let mut report = PassReport {
            module: module.name.clone(),
            woven: 0,
            failures: Vec::new(),
        };

        Self::transition(&mut self.state, PassState::WeavingTypes);
        Self::apply_stage(&mut module, &mut resolver, &self.config, &work.types, &mut report);
        Self::transition(&mut self.state, PassState::WeavingFields);
        Self::apply_stage(&mut module, &mut resolver, &self.config, &work.fields, &mut report);
        Self::transition(&mut self.state, PassState::WeavingMethods);
        Self::apply_stage(&mut module, &mut resolver, &self.config, &work.methods, &mut report);

        Self::transition(&mut self.state, PassState::Writing);
        let writer = OutputWriter::with_sleep(self.fs.clone(), self.config.retry, self.sleep.clone());
        if let Err(e) = writer.commit(module, &event.module_path) {
            Self::abort(&mut self.state, &e);
            return Err(e.into());
        }

        Self::transition(&mut self.state, PassState::Idle);
        info!(
            target: "weft::weaver",
            "pass over {} done: {} woven, {} failed",
            report.module,
            report.woven,
            report.failures.len()
        );
        Ok(PassOutcome::Completed(report))
    }

    /// Apply one stage's work list. Each `(weaver, target)` application
    /// is isolated: an error is recorded and the stage moves on.
    fn apply_stage(
        module: &mut weft_model::CompiledModule,
        resolver: &mut ModuleResolver,
        config: &WeaveConfig,
        items: &[ScanItem<'_>],
        report: &mut PassReport,
    ) {
        for item in items {
            let identity = item.target.describe(module);
            let mut cx = WeaveContext {
                module: &mut *module,
                resolver: &mut *resolver,
                config,
            };
            match item.weaver.apply(&mut cx, &item.target, &item.marker) {
                Ok(()) => report.woven += 1,
                Err(e) => {
                    warn!(
                        target: "weft::weaver",
                        "weaving {} for marker {} failed: {}",
                        identity,
                        item.marker.name,
                        e
                    );
                    report.failures.push(TargetFailure {
                        target: identity,
                        marker: item.marker.name.clone(),
                        error: e,
                    });
                }
            }
        }
    }

    fn transition(state: &mut PassState, next: PassState) {
        trace!(target: "weft::weaver", "pass state {} -> {}", state, next);
        *state = next;
    }

    fn abort(state: &mut PassState, reason: &dyn fmt::Display) {
        error!(target: "weft::weaver", "pass aborted: {}", reason);
        *state = PassState::Aborted(reason.to_string());
    }
}

/// The module's own directory leads the search order; it is derived from
/// the event when the configuration leaves it unset.
fn effective_search_paths(configured: &SearchPaths, module_path: &Path) -> SearchPaths {
    let mut search = configured.clone();
    if search.module_dir.is_none() {
        search.module_dir = module_path.parent().map(|p| p.to_path_buf());
    }
    search
}
