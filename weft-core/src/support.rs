//! Runtime-support call table
//!
//! Weavers emit calls into a small, stable external support library
//! (`weft.support.*`). The core only needs each target's fully-qualified
//! name and parameter shape to construct call sites; the behavior behind
//! them is external. When the support library happens to be resolvable
//! through the search paths, emitted targets are verified against it;
//! an unresolvable library is trusted, matching the two-tier tolerance
//! used for base-type resolution.

use once_cell::sync::Lazy;
use tracing::trace;
use weft_model::{CompiledModule, MethodRef, TypeRef};

use crate::error::TargetError;
use crate::resolver::ModuleResolver;

/// Base type a declarative-field host must derive from.
pub const ACTOR_BASE: &str = "weft.support.Actor";

/// Field types the declarative field weaver accepts.
pub const WIREABLE_TYPES: &[&str] = &[
    "weft.support.Signal",
    "weft.support.Command",
    "weft.support.Binding",
];

/// `weft.support.Profiler::begin(label)` - opens a timing bracket.
pub static PROFILER_BEGIN: Lazy<MethodRef> = Lazy::new(|| {
    MethodRef::new(
        TypeRef::named("weft.support.Profiler"),
        "begin",
        vec![TypeRef::string()],
        TypeRef::void(),
    )
    .into_static()
});

/// `weft.support.Profiler::end(label)` - closes a timing bracket and logs
/// the elapsed value.
pub static PROFILER_END: Lazy<MethodRef> = Lazy::new(|| {
    MethodRef::new(
        TypeRef::named("weft.support.Profiler"),
        "end",
        vec![TypeRef::string()],
        TypeRef::void(),
    )
    .into_static()
});

/// `weft.support.HookBus::subscribe(channel, subscriber, method)` -
/// registers a per-instance callback on a notification channel.
pub static HOOK_SUBSCRIBE: Lazy<MethodRef> = Lazy::new(|| {
    MethodRef::new(
        TypeRef::named("weft.support.HookBus"),
        "subscribe",
        vec![TypeRef::string(), TypeRef::object(), TypeRef::string()],
        TypeRef::void(),
    )
    .into_static()
});

/// `weft.support.WireBus::register(key, value)` - publishes a field value
/// under a wiring key.
pub static WIRE_REGISTER: Lazy<MethodRef> = Lazy::new(|| {
    MethodRef::new(
        TypeRef::named("weft.support.WireBus"),
        "register",
        vec![TypeRef::string(), TypeRef::object()],
        TypeRef::void(),
    )
    .into_static()
});

/// `weft.support.SceneRegistry::attach(instance)`.
pub static SCENE_ATTACH: Lazy<MethodRef> = Lazy::new(|| {
    MethodRef::new(
        TypeRef::named("weft.support.SceneRegistry"),
        "attach",
        vec![TypeRef::object()],
        TypeRef::void(),
    )
    .into_static()
});

/// `weft.support.SceneRegistry::detach(instance)`.
pub static SCENE_DETACH: Lazy<MethodRef> = Lazy::new(|| {
    MethodRef::new(
        TypeRef::named("weft.support.SceneRegistry"),
        "detach",
        vec![TypeRef::object()],
        TypeRef::void(),
    )
    .into_static()
});

/// Verify a support call target against whatever the search paths can
/// see. Declaring type found but member absent or mismatched is a
/// `MissingSymbol` failure for the one target being woven; a declaring
/// type nobody can resolve is trusted.
pub fn verify_support_target(
    module: &CompiledModule,
    resolver: &mut ModuleResolver,
    target: &MethodRef,
) -> Result<(), TargetError> {
    let declaring = &target.declaring.full_name;
    let decl = match module.find_type(declaring) {
        Some(id) => Some(module.type_decl(id).clone()),
        None => resolver.resolve_external(declaring),
    };

    let Some(decl) = decl else {
        trace!(
            target: "weft::resolver",
            "support type {} not resolvable, trusting call table",
            declaring
        );
        return Ok(());
    };

    let matched = decl.methods.iter().any(|m| {
        m.name == target.name
            && m.params.len() == target.params.len()
            && m.is_static != target.is_instance
    });
    if matched {
        Ok(())
    } else {
        Err(TargetError::MissingSymbol(format!(
            "{} not found in resolved '{}'",
            target, declaring
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_table_shapes() {
        assert_eq!(PROFILER_BEGIN.qualified_name(), "weft.support.Profiler::begin");
        assert!(!PROFILER_BEGIN.is_instance);
        assert_eq!(HOOK_SUBSCRIBE.params.len(), 3);
        assert_eq!(WIRE_REGISTER.params.len(), 2);
        assert_eq!(SCENE_ATTACH.params.len(), 1);
        assert_eq!(SCENE_DETACH.return_type, TypeRef::void());
    }
}
