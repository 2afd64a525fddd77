//! Idempotent hook registration
//!
//! `HookOnce(channel, lifecycle?)` on a method registers it as a
//! per-instance callback on a notification channel exactly once,
//! regardless of how many times the hosting lifecycle method runs. The
//! registration call goes into the named lifecycle method (`on_enable`
//! by default) behind a per-method guard field.

use tracing::debug;
use weft_model::{Marker, OpCode, Operand};

use crate::error::TargetError;
use crate::kit::{find_or_create_injection_point, insert_guarded_call, validate_guard_slot};
use crate::support::{verify_support_target, HOOK_SUBSCRIBE};
use crate::weavers::{str_args, WeaveContext, WeaveTarget, Weaver, WeaverCategory};

const DEFAULT_LIFECYCLE: &str = "on_enable";

pub struct IdempotentHookWeaver;

impl Weaver for IdempotentHookWeaver {
    fn marker_name(&self) -> &'static str {
        "HookOnce"
    }

    fn category(&self) -> WeaverCategory {
        WeaverCategory::Method
    }

    fn apply(
        &self,
        cx: &mut WeaveContext<'_>,
        target: &WeaveTarget,
        marker: &Marker,
    ) -> Result<(), TargetError> {
        let WeaveTarget::Method { ty, method } = *target else {
            return Err(TargetError::UnsupportedShape(
                "HookOnce applies to methods".into(),
            ));
        };
        let args = str_args(marker, 2)?;
        let Some(channel) = args.first().map(|s| s.to_string()) else {
            return Err(TargetError::MarkerShape(
                "HookOnce requires a channel argument".into(),
            ));
        };
        let lifecycle = args
            .get(1)
            .map(|s| s.to_string())
            .unwrap_or_else(|| DEFAULT_LIFECYCLE.to_string());

        verify_support_target(cx.module, cx.resolver, &HOOK_SUBSCRIBE)?;

        let decl = cx.module.type_decl(ty);
        let callback = decl.methods.get(method).ok_or_else(|| {
            TargetError::UnsupportedShape("method index out of range".into())
        })?;
        if callback.is_static {
            return Err(TargetError::UnsupportedShape(format!(
                "'{}' is static; per-instance hooks need an instance callback",
                callback.name
            )));
        }
        let callback_name = callback.name.clone();
        let guard = format!("__hooked_{}", callback_name);
        validate_guard_slot(decl, &guard)?;

        let point = find_or_create_injection_point(cx.module, ty, &lifecycle)?;
        let inserted = insert_guarded_call(
            cx.module,
            ty,
            point,
            &guard,
            vec![
                (OpCode::LoadStr, Operand::Str(channel.clone())),
                (OpCode::LoadThis, Operand::None),
                (OpCode::LoadStr, Operand::Str(callback_name.clone())),
                (OpCode::Call, Operand::Method(HOOK_SUBSCRIBE.clone())),
            ],
        )?;

        if inserted {
            debug!(
                target: "weft::weaver",
                "hooked {}::{} to channel {} via {}",
                cx.module.full_name(ty),
                callback_name,
                channel,
                lifecycle
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weft_config::{SearchPaths, WeaveConfig};
    use weft_model::{
        CompiledModule, MarkerArg, MethodBody, MethodDeclaration, TypeId, TypeRef, Visibility,
    };
    use weft_vfs::MemoryFileSystem;

    use crate::resolver::ModuleResolver;

    fn listener() -> (CompiledModule, TypeId) {
        let mut module = CompiledModule::new("game");
        let ty = module.add_type("demo", "Listener", None);
        module.type_decl_mut(ty).methods.push(MethodDeclaration {
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
            declaring_type: ty,
        });
        (module, ty)
    }

    fn apply(module: &mut CompiledModule, ty: TypeId, marker: &Marker) -> Result<(), TargetError> {
        let mut resolver =
            ModuleResolver::new(Arc::new(MemoryFileSystem::new()), SearchPaths::default());
        let config = WeaveConfig::default();
        let mut cx = WeaveContext {
            module,
            resolver: &mut resolver,
            config: &config,
        };
        IdempotentHookWeaver.apply(&mut cx, &WeaveTarget::Method { ty, method: 0 }, marker)
    }

    #[test]
    fn test_hook_injects_guarded_subscribe() {
        let (mut module, ty) = listener();
        let marker = module.type_decl(ty).methods[0].markers[0].clone();
        apply(&mut module, ty, &marker).unwrap();

        let decl = module.type_decl(ty);
        let point = decl.method("on_enable").expect("lifecycle synthesized");
        let body = point.body.as_ref().unwrap();
        assert!(body.calls("weft.support.HookBus::subscribe"));
        assert!(body.references_field("__hooked_on_damage"));
        assert!(decl.has_field("__hooked_on_damage"));
    }

    #[test]
    fn test_hook_respects_explicit_lifecycle() {
        let (mut module, ty) = listener();
        let marker = Marker::with_args(
            "HookOnce",
            vec![
                MarkerArg::Str("combat".into()),
                MarkerArg::Str("on_spawn".into()),
            ],
        );
        apply(&mut module, ty, &marker).unwrap();

        let decl = module.type_decl(ty);
        assert!(decl.method("on_spawn").is_some());
        assert!(decl.method("on_enable").is_none());
    }

    #[test]
    fn test_hook_twice_single_fire() {
        let (mut module, ty) = listener();
        let marker = module.type_decl(ty).methods[0].markers[0].clone();
        apply(&mut module, ty, &marker).unwrap();
        let snapshot = module.clone();

        apply(&mut module, ty, &marker).unwrap();
        assert_eq!(module, snapshot);
    }

    #[test]
    fn test_hook_requires_channel() {
        let (mut module, ty) = listener();
        let before = module.clone();
        let err = apply(&mut module, ty, &Marker::new("HookOnce")).unwrap_err();
        assert!(matches!(err, TargetError::MarkerShape(_)));
        assert_eq!(module, before);
    }

    #[test]
    fn test_hook_rejects_static_callback() {
        let (mut module, ty) = listener();
        module.type_decl_mut(ty).methods[0].is_static = true;
        let marker = module.type_decl(ty).methods[0].markers[0].clone();
        let before = module.clone();

        let err = apply(&mut module, ty, &marker).unwrap_err();
        assert!(matches!(err, TargetError::UnsupportedShape(_)));
        assert_eq!(module, before);
    }
}
