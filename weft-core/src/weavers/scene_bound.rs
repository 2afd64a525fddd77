//! Structural scene binding
//!
//! `SceneBound(attach?, detach?)` on a type injects a symmetric pair of
//! registry calls into two existing-or-synthesized lifecycle methods:
//! `SceneRegistry::attach(this)` into the attach method, `detach(this)`
//! into the detach method. Idempotence comes from a duplicate-call scan
//! rather than a guard field: the call pair is structural, not a
//! once-per-instance side effect.

use tracing::debug;
use weft_model::{Marker, MethodRef, OpCode, Operand};

use crate::error::TargetError;
use crate::kit::{find_or_create_injection_point, validate_injection_point};
use crate::support::{verify_support_target, SCENE_ATTACH, SCENE_DETACH};
use crate::weavers::{str_args, WeaveContext, WeaveTarget, Weaver, WeaverCategory};

const DEFAULT_ATTACH: &str = "on_attach";
const DEFAULT_DETACH: &str = "on_detach";

pub struct StructuralTypeWeaver;

impl Weaver for StructuralTypeWeaver {
    fn marker_name(&self) -> &'static str {
        "SceneBound"
    }

    fn category(&self) -> WeaverCategory {
        WeaverCategory::Type
    }

    fn apply(
        &self,
        cx: &mut WeaveContext<'_>,
        target: &WeaveTarget,
        marker: &Marker,
    ) -> Result<(), TargetError> {
        let WeaveTarget::Type { ty } = *target else {
            return Err(TargetError::UnsupportedShape(
                "SceneBound applies to types".into(),
            ));
        };
        let args = str_args(marker, 2)?;
        let attach = args.first().copied().unwrap_or(DEFAULT_ATTACH).to_string();
        let detach = args.get(1).copied().unwrap_or(DEFAULT_DETACH).to_string();
        if attach == detach {
            return Err(TargetError::MarkerShape(format!(
                "attach and detach methods must differ, both are '{}'",
                attach
            )));
        }

        verify_support_target(cx.module, cx.resolver, &SCENE_ATTACH)?;
        verify_support_target(cx.module, cx.resolver, &SCENE_DETACH)?;

        // both points validated before either may be synthesized, so a
        // shape conflict on the second leaves the type untouched
        let decl = cx.module.type_decl(ty);
        validate_injection_point(decl, &attach)?;
        validate_injection_point(decl, &detach)?;

        let attached = inject_registry_call(cx, ty, &attach, &SCENE_ATTACH)?;
        let detached = inject_registry_call(cx, ty, &detach, &SCENE_DETACH)?;

        if attached || detached {
            debug!(
                target: "weft::weaver",
                "scene-bound {} via {}/{}",
                cx.module.full_name(ty),
                attach,
                detach
            );
        }
        Ok(())
    }
}

/// Inject `registry_call(this)` before the terminator of the named
/// lifecycle method unless the method already calls it.
fn inject_registry_call(
    cx: &mut WeaveContext<'_>,
    ty: weft_model::TypeId,
    method_name: &str,
    registry_call: &MethodRef,
) -> Result<bool, TargetError> {
    let point = find_or_create_injection_point(cx.module, ty, method_name)?;
    let method = &mut cx.module.type_decl_mut(ty).methods[point];
    let body = method.body.as_mut().ok_or_else(|| {
        TargetError::UnsupportedShape(format!("'{}' has no body", method_name))
    })?;

    if body.calls(&registry_call.qualified_name()) {
        return Ok(false);
    }
    let terminator = body.first_terminator().ok_or_else(|| {
        TargetError::UnsupportedShape(format!("'{}' has no terminator", method_name))
    })?;
    body.insert_before(
        terminator,
        vec![
            (OpCode::LoadThis, Operand::None),
            (OpCode::Call, Operand::Method(registry_call.clone())),
        ],
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weft_config::{SearchPaths, WeaveConfig};
    use weft_model::{CompiledModule, MarkerArg, MethodBody, TypeId};
    use weft_vfs::MemoryFileSystem;

    use crate::resolver::ModuleResolver;

    fn scene_type() -> (CompiledModule, TypeId) {
        let mut module = CompiledModule::new("game");
        let ty = module.add_type("demo", "HudPanel", None);
        module
            .type_decl_mut(ty)
            .markers
            .push(Marker::new("SceneBound"));
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
        StructuralTypeWeaver.apply(&mut cx, &WeaveTarget::Type { ty }, marker)
    }

    #[test]
    fn test_paired_injection() {
        let (mut module, ty) = scene_type();
        apply(&mut module, ty, &Marker::new("SceneBound")).unwrap();

        let decl = module.type_decl(ty);
        let attach = decl.method("on_attach").unwrap().body.as_ref().unwrap();
        let detach = decl.method("on_detach").unwrap().body.as_ref().unwrap();
        assert!(attach.calls("weft.support.SceneRegistry::attach"));
        assert!(!attach.calls("weft.support.SceneRegistry::detach"));
        assert!(detach.calls("weft.support.SceneRegistry::detach"));
    }

    #[test]
    fn test_custom_lifecycle_names() {
        let (mut module, ty) = scene_type();
        let marker = Marker::with_args(
            "SceneBound",
            vec![
                MarkerArg::Str("enter".into()),
                MarkerArg::Str("leave".into()),
            ],
        );
        apply(&mut module, ty, &marker).unwrap();

        let decl = module.type_decl(ty);
        assert!(decl.method("enter").is_some());
        assert!(decl.method("leave").is_some());
        assert!(decl.method("on_attach").is_none());
    }

    #[test]
    fn test_existing_lifecycle_body_is_extended() {
        let (mut module, ty) = scene_type();
        let mut body = MethodBody::new();
        body.push(OpCode::Nop, Operand::None);
        body.push(OpCode::Return, Operand::None);
        module.type_decl_mut(ty).methods.push(weft_model::MethodDeclaration {
            name: "on_attach".into(),
            visibility: weft_model::Visibility::Public,
            is_static: false,
            params: vec![],
            generic_params: vec![],
            return_type: weft_model::TypeRef::void(),
            body: Some(body),
            markers: vec![],
            declaring_type: ty,
        });

        apply(&mut module, ty, &Marker::new("SceneBound")).unwrap();

        let attach = module
            .type_decl(ty)
            .method("on_attach")
            .unwrap()
            .body
            .as_ref()
            .unwrap();
        // original Nop survives, call lands before the terminator
        assert_eq!(attach.instructions[0].op, OpCode::Nop);
        assert!(attach.calls("weft.support.SceneRegistry::attach"));
        assert_eq!(
            attach.instructions.last().map(|i| i.op),
            Some(OpCode::Return)
        );
    }

    #[test]
    fn test_rerun_is_noop() {
        let (mut module, ty) = scene_type();
        apply(&mut module, ty, &Marker::new("SceneBound")).unwrap();
        let snapshot = module.clone();

        apply(&mut module, ty, &Marker::new("SceneBound")).unwrap();
        assert_eq!(module, snapshot);
    }

    #[test]
    fn test_same_attach_detach_rejected() {
        let (mut module, ty) = scene_type();
        let marker = Marker::with_args(
            "SceneBound",
            vec![MarkerArg::Str("on_io".into()), MarkerArg::Str("on_io".into())],
        );
        let before = module.clone();

        let err = apply(&mut module, ty, &marker).unwrap_err();
        assert!(matches!(err, TargetError::MarkerShape(_)));
        assert_eq!(module, before);
    }
}
