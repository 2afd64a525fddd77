//! Method wrapping
//!
//! `Timed(label?)` on a method clones the target body as a shadow and
//! replaces the original with a thin wrapper: open a profiler bracket,
//! call the shadow, close the bracket, return the shadow's result. The
//! observable behavior of the method is preserved; the bracket is the
//! only addition.

use tracing::debug;
use weft_model::{Marker, MethodBody, MethodRef, OpCode, Operand, TypeRef};

use crate::error::TargetError;
use crate::kit::clone_method_as_shadow;
use crate::support::{verify_support_target, PROFILER_BEGIN, PROFILER_END};
use crate::weavers::{str_args, WeaveContext, WeaveTarget, Weaver, WeaverCategory};

pub struct MethodWrapWeaver;

impl Weaver for MethodWrapWeaver {
    fn marker_name(&self) -> &'static str {
        "Timed"
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
                "Timed applies to methods".into(),
            ));
        };
        let args = str_args(marker, 1)?;

        verify_support_target(cx.module, cx.resolver, &PROFILER_BEGIN)?;
        verify_support_target(cx.module, cx.resolver, &PROFILER_END)?;

        let host_name = cx.module.full_name(ty);
        let decl = cx.module.type_decl(ty);
        let original = decl.methods.get(method).ok_or_else(|| {
            TargetError::UnsupportedShape("method index out of range".into())
        })?;
        if original.body.is_none() {
            return Err(TargetError::UnsupportedShape(format!(
                "'{}' has no body to wrap",
                original.name
            )));
        }

        let shadow_name = format!("{}{}", original.name, cx.config.shadow_suffix);
        if decl.method(&shadow_name).is_some() {
            debug!(
                target: "weft::weaver",
                "{}::{} already wrapped, skipping",
                host_name,
                original.name
            );
            return Ok(());
        }

        let label = args
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| original.name.clone());
        let original_name = original.name.clone();
        let is_static = original.is_static;
        let param_count = original.params.len();
        let return_type = original.return_type.clone();
        let shadow = clone_method_as_shadow(original, &cx.config.shadow_suffix);

        let mut shadow_ref = MethodRef::new(
            TypeRef::named(host_name.clone()),
            shadow_name.clone(),
            original.params.iter().map(|p| p.ty.clone()).collect(),
            return_type.clone(),
        );
        if is_static {
            shadow_ref = shadow_ref.into_static();
        }

        // wrapper: begin(label); result = shadow(args); end(label); return result
        let mut body = MethodBody::new();
        body.push(OpCode::LoadStr, Operand::Str(label.clone()));
        body.push(OpCode::Call, Operand::Method(PROFILER_BEGIN.clone()));
        if !is_static {
            body.push(OpCode::LoadThis, Operand::None);
        }
        for i in 0..param_count {
            body.push(OpCode::LoadArg, Operand::Index(i as u16));
        }
        body.push(OpCode::Call, Operand::Method(shadow_ref));
        let result_local = if return_type != TypeRef::void() {
            let slot = body.add_local(return_type);
            body.push(OpCode::StoreLocal, Operand::Index(slot));
            Some(slot)
        } else {
            None
        };
        body.push(OpCode::LoadStr, Operand::Str(label));
        body.push(OpCode::Call, Operand::Method(PROFILER_END.clone()));
        if let Some(slot) = result_local {
            body.push(OpCode::LoadLocal, Operand::Index(slot));
        }
        body.push(OpCode::Return, Operand::None);

        if let Some(symbols) = cx.module.debug_symbols.as_mut() {
            symbols.clone_method_entry(&host_name, &original_name, &shadow_name);
        }
        let decl = cx.module.type_decl_mut(ty);
        decl.methods[method].body = Some(body);
        decl.methods.push(shadow);

        debug!(
            target: "weft::weaver",
            "wrapped {}::{} around shadow {}",
            host_name,
            original_name,
            shadow_name
        );
        Ok(())
    }
}
