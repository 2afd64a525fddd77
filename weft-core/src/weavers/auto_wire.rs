//! Declarative field wiring
//!
//! `AutoWire(key?)` on a field of an actor-derived type publishes the
//! field's value on the wire bus under the given key (the field name by
//! default) when the instance's `on_ready` lifecycle method first runs.
//! Only fields of wireable support types are accepted.

use tracing::debug;
use weft_model::{FieldRef, Marker, OpCode, Operand, TypeRef};

use crate::error::TargetError;
use crate::kit::{
    find_or_create_injection_point, insert_guarded_call, is_subtype_of, validate_guard_slot,
};
use crate::support::{verify_support_target, ACTOR_BASE, WIREABLE_TYPES, WIRE_REGISTER};
use crate::weavers::{str_args, WeaveContext, WeaveTarget, Weaver, WeaverCategory};

const LIFECYCLE: &str = "on_ready";

pub struct DeclarativeFieldWeaver;

impl Weaver for DeclarativeFieldWeaver {
    fn marker_name(&self) -> &'static str {
        "AutoWire"
    }

    fn category(&self) -> WeaverCategory {
        WeaverCategory::Field
    }

    fn apply(
        &self,
        cx: &mut WeaveContext<'_>,
        target: &WeaveTarget,
        marker: &Marker,
    ) -> Result<(), TargetError> {
        let WeaveTarget::Field { ty, field } = *target else {
            return Err(TargetError::UnsupportedShape(
                "AutoWire applies to fields".into(),
            ));
        };
        let args = str_args(marker, 1)?;

        let decl = cx.module.type_decl(ty);
        let wired = decl.fields.get(field).ok_or_else(|| {
            TargetError::UnsupportedShape("field index out of range".into())
        })?;
        if wired.is_static {
            return Err(TargetError::UnsupportedShape(format!(
                "'{}' is static; wiring publishes per-instance values",
                wired.name
            )));
        }
        if !WIREABLE_TYPES.contains(&wired.field_type.full_name.as_str()) {
            return Err(TargetError::UnsupportedShape(format!(
                "field type {} is not wireable",
                wired.field_type
            )));
        }
        let field_name = wired.name.clone();
        let field_type = wired.field_type.clone();
        let key = args
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| field_name.clone());

        if !is_subtype_of(
            cx.module,
            cx.resolver,
            ty,
            ACTOR_BASE,
            cx.config.max_hierarchy_depth,
        ) {
            return Err(TargetError::UnsupportedShape(format!(
                "declaring type {} does not derive from {}",
                cx.module.full_name(ty),
                ACTOR_BASE
            )));
        }
        verify_support_target(cx.module, cx.resolver, &WIRE_REGISTER)?;

        let guard = format!("__wired_{}", field_name);
        validate_guard_slot(cx.module.type_decl(ty), &guard)?;

        let host_name = cx.module.full_name(ty);
        let field_ref = FieldRef::new(TypeRef::named(host_name.clone()), &field_name, field_type);
        let point = find_or_create_injection_point(cx.module, ty, LIFECYCLE)?;
        let inserted = insert_guarded_call(
            cx.module,
            ty,
            point,
            &guard,
            vec![
                (OpCode::LoadStr, Operand::Str(key.clone())),
                (OpCode::LoadThis, Operand::None),
                (OpCode::LoadField, Operand::Field(field_ref)),
                (OpCode::Call, Operand::Method(WIRE_REGISTER.clone())),
            ],
        )?;

        if inserted {
            debug!(
                target: "weft::weaver",
                "wired {}::{} under key {}",
                host_name,
                field_name,
                key
            );
        }
        Ok(())
    }
}
