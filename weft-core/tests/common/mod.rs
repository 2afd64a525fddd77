//! Shared helpers for the pass-level tests: sample modules, a
//! fault-injecting file system, and serialization of pass runs.

#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use weft_config::WeaveConfig;
use weft_core::{CompilationEvent, MarkerRegistry, NoSleep, Orchestrator, PassOutcome};
use weft_model::{
    decode_module, encode_module, CompiledModule, FieldDeclaration, Marker, MarkerArg, MethodBody,
    MethodDeclaration, OpCode, Operand, TypeRef, Visibility,
};
use weft_vfs::{MemoryFileSystem, VfsError, VfsResult, VirtualFileSystem};

/// Passes share one process-wide reentrancy flag, so tests that run
/// passes hold this lock; parallel test threads would otherwise drop
/// each other's triggers.
pub fn pass_lock() -> MutexGuard<'static, ()> {
    static LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Wraps a memory file system and fails a configured number of renames
/// with a lock error, imitating a host toolchain holding the module
/// file open.
pub struct FlakyFileSystem {
    inner: MemoryFileSystem,
    failures_left: AtomicU32,
    rename_calls: AtomicU32,
}

impl FlakyFileSystem {
    pub fn new(inner: MemoryFileSystem, failing_renames: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failing_renames),
            rename_calls: AtomicU32::new(0),
        }
    }

    pub fn rename_calls(&self) -> u32 {
        self.rename_calls.load(Ordering::SeqCst)
    }
}

impl VirtualFileSystem for FlakyFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        self.inner.write_file(path, content)
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.rename_calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(VfsError::Locked {
                path: from.to_string_lossy().to_string(),
            });
        }
        self.inner.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        self.inner.remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
}

/// `demo.Greeter` with `speak()` marked `Timed("demo")` (scenario A).
pub fn greeter_module() -> CompiledModule {
    let mut module = CompiledModule::new("game");
    let ty = module.add_type("demo", "Greeter", None);
    let mut body = MethodBody::new();
    body.push(OpCode::LoadStr, Operand::Str("hello".into()));
    body.push(OpCode::Pop, Operand::None);
    body.push(OpCode::Return, Operand::None);
    module.type_decl_mut(ty).methods.push(MethodDeclaration {
        name: "speak".into(),
        visibility: Visibility::Public,
        is_static: false,
        params: vec![],
        generic_params: vec![],
        return_type: TypeRef::void(),
        body: Some(body),
        markers: vec![Marker::with_args(
            "Timed",
            vec![MarkerArg::Str("demo".into())],
        )],
        declaring_type: ty,
    });
    module
}

/// `demo.Widget` deriving from the actor base, with field `on_ready`
/// marked `AutoWire("ready-key")` (scenario B).
pub fn widget_module() -> CompiledModule {
    let mut module = CompiledModule::new("game");
    let ty = module.add_type("demo", "Widget", None);
    let decl = module.type_decl_mut(ty);
    decl.base = Some(TypeRef::named("weft.support.Actor"));
    decl.fields.push(FieldDeclaration {
        name: "on_ready".into(),
        field_type: TypeRef::named("weft.support.Signal"),
        visibility: Visibility::Public,
        is_static: false,
        markers: vec![Marker::with_args(
            "AutoWire",
            vec![MarkerArg::Str("ready-key".into())],
        )],
        declaring_type: ty,
    });
    module
}

/// A module exercising all four weaver shapes at once.
pub fn kitchen_sink_module() -> CompiledModule {
    let mut module = CompiledModule::new("game");

    let greeter = module.add_type("demo", "Greeter", None);
    let mut speak = MethodBody::new();
    speak.push(OpCode::LoadStr, Operand::Str("hello".into()));
    speak.push(OpCode::Pop, Operand::None);
    speak.push(OpCode::Return, Operand::None);
    module.type_decl_mut(greeter).methods.push(MethodDeclaration {
        name: "speak".into(),
        visibility: Visibility::Public,
        is_static: false,
        params: vec![],
        generic_params: vec![],
        return_type: TypeRef::void(),
        body: Some(speak),
        markers: vec![Marker::with_args(
            "Timed",
            vec![MarkerArg::Str("demo".into())],
        )],
        declaring_type: greeter,
    });
    module.type_decl_mut(greeter).methods.push(MethodDeclaration {
        name: "on_damage".into(),
        visibility: Visibility::Public,
        is_static: false,
        params: vec![],
        generic_params: vec![],
        return_type: TypeRef::void(),
        body: Some(MethodBody::single_return()),
        markers: vec![Marker::with_args(
            "HookOnce",
            vec![MarkerArg::Str("combat".into())],
        )],
        declaring_type: greeter,
    });

    let widget = module.add_type("demo", "Widget", None);
    let decl = module.type_decl_mut(widget);
    decl.base = Some(TypeRef::named("weft.support.Actor"));
    decl.markers.push(Marker::new("SceneBound"));
    decl.fields.push(FieldDeclaration {
        name: "on_ready".into(),
        field_type: TypeRef::named("weft.support.Signal"),
        visibility: Visibility::Public,
        is_static: false,
        markers: vec![Marker::with_args(
            "AutoWire",
            vec![MarkerArg::Str("ready-key".into())],
        )],
        declaring_type: widget,
    });

    module
}

pub fn write_module(fs: &dyn VirtualFileSystem, path: &str, module: &CompiledModule) {
    fs.write_file(Path::new(path), &encode_module(module))
        .expect("seeding module file");
}

pub fn read_module(fs: &dyn VirtualFileSystem, path: &str) -> CompiledModule {
    let bytes = fs.read_file(Path::new(path)).expect("module file present");
    decode_module(bytes).expect("module decodable")
}

pub fn orchestrator(fs: Arc<dyn VirtualFileSystem>) -> Orchestrator {
    Orchestrator::with_sleep(
        WeaveConfig::default(),
        MarkerRegistry::with_builtin_weavers(),
        fs,
        Arc::new(NoSleep),
    )
}

/// Run one pass expecting completion, returning its report.
pub fn run_completed(fs: Arc<dyn VirtualFileSystem>, path: &str) -> weft_core::PassReport {
    let mut orch = orchestrator(fs);
    match orch.run(&CompilationEvent::clean(path)).expect("pass runs") {
        PassOutcome::Completed(report) => report,
        other => panic!("expected completed pass, got {:?}", other),
    }
}
