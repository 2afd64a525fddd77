//! Guarded injection
//!
//! Injection points anchor inserted calls: a no-argument void method that
//! always ends in a terminator, found or synthesized on demand. Guarded
//! insertion is the idempotency primitive on top of it: a private
//! instance bool field plus a conditional skip ensure an injected side
//! effect fires once per instance, and re-weaving an already-guarded
//! point is a no-op.

use tracing::debug;
use weft_model::{
    CompiledModule, FieldDeclaration, FieldRef, MethodBody, MethodDeclaration, OpCode, Operand,
    TypeDeclaration, TypeId, TypeRef, Visibility,
};

use crate::error::TargetError;

/// Check that `method_name` on this type is usable as an injection point
/// without mutating anything. Weavers that need two injection points call
/// this for both names before creating either, keeping a failed target
/// fully untouched.
pub fn validate_injection_point(
    decl: &TypeDeclaration,
    method_name: &str,
) -> Result<(), TargetError> {
    match decl.method(method_name) {
        None => Ok(()),
        Some(m) if m.is_parameterless_void() && !m.is_static => Ok(()),
        Some(_) => Err(TargetError::UnsupportedShape(format!(
            "existing method '{}' is not a parameterless instance void method",
            method_name
        ))),
    }
}

/// Check that `guard_field` is usable as a guard slot: absent, or already
/// a private instance bool.
pub fn validate_guard_slot(decl: &TypeDeclaration, guard_field: &str) -> Result<(), TargetError> {
    match decl.field(guard_field) {
        None => Ok(()),
        Some(f)
            if f.field_type == TypeRef::boolean()
                && f.visibility == Visibility::Private
                && !f.is_static =>
        {
            Ok(())
        }
        Some(_) => Err(TargetError::UnsupportedShape(format!(
            "existing field '{}' cannot serve as a guard",
            guard_field
        ))),
    }
}

/// Return the index of an existing no-argument void instance method named
/// `method_name`, synthesizing an empty one (single `ret`) when the type
/// has none. A bodiless declaration of the right shape is given the
/// minimal body. Postcondition: the returned method has at least one
/// terminator, so callers may always insert before it. Never duplicates.
pub fn find_or_create_injection_point(
    module: &mut CompiledModule,
    type_id: TypeId,
    method_name: &str,
) -> Result<usize, TargetError> {
    validate_injection_point(module.type_decl(type_id), method_name)?;

    let decl = module.type_decl_mut(type_id);
    if let Some(index) = decl.method_index(method_name) {
        let method = &mut decl.methods[index];
        if method.body.is_none() {
            method.body = Some(MethodBody::single_return());
        }
        return Ok(index);
    }

    debug!(
        target: "weft::weaver",
        "synthesizing injection point {}::{}",
        decl.name,
        method_name
    );
    decl.methods.push(MethodDeclaration {
        name: method_name.to_string(),
        visibility: Visibility::Public,
        is_static: false,
        params: vec![],
        generic_params: vec![],
        return_type: TypeRef::void(),
        body: Some(MethodBody::single_return()),
        markers: vec![],
        declaring_type: type_id,
    });
    Ok(decl.methods.len() - 1)
}

/// Insert a guarded call sequence before the injection point's terminator:
///
/// ```text
/// if (this.guard) goto end;
/// <call_seq>
/// this.guard = true;
/// end: ...
/// ```
///
/// Ensures the guard field exists as a private instance bool first. When
/// any instruction of the injection point already references the guard
/// field the body is considered woven and nothing changes. Returns
/// whether the sequence was inserted.
pub fn insert_guarded_call(
    module: &mut CompiledModule,
    type_id: TypeId,
    method_index: usize,
    guard_field: &str,
    call_seq: Vec<(OpCode, Operand)>,
) -> Result<bool, TargetError> {
    validate_guard_slot(module.type_decl(type_id), guard_field)?;

    let type_name = module.full_name(type_id);
    let guard_ref = FieldRef::new(
        TypeRef::named(type_name.clone()),
        guard_field,
        TypeRef::boolean(),
    );

    let decl = module.type_decl_mut(type_id);
    let method = decl
        .methods
        .get_mut(method_index)
        .ok_or_else(|| TargetError::UnsupportedShape("injection point index out of range".into()))?;
    let method_name = method.name.clone();
    let body = method.body.as_mut().ok_or_else(|| {
        TargetError::UnsupportedShape(format!("injection point '{}' has no body", method_name))
    })?;

    if body.references_field(guard_field) {
        debug!(
            target: "weft::weaver",
            "{}::{} already guarded by {}, skipping",
            type_name,
            method_name,
            guard_field
        );
        return Ok(false);
    }

    let terminator = body.first_terminator().ok_or_else(|| {
        TargetError::UnsupportedShape(format!("injection point '{}' has no terminator", method_name))
    })?;

    let mut seq = Vec::with_capacity(call_seq.len() + 6);
    seq.push((OpCode::LoadThis, Operand::None));
    seq.push((OpCode::LoadField, Operand::Field(guard_ref.clone())));
    seq.push((OpCode::BranchIfTrue, Operand::Target(terminator)));
    seq.extend(call_seq);
    seq.push((OpCode::LoadThis, Operand::None));
    seq.push((OpCode::LoadTrue, Operand::None));
    seq.push((OpCode::StoreField, Operand::Field(guard_ref)));
    body.insert_before(terminator, seq);

    if !decl.has_field(guard_field) {
        decl.fields.push(FieldDeclaration {
            name: guard_field.to_string(),
            field_type: TypeRef::boolean(),
            visibility: Visibility::Private,
            is_static: false,
            markers: vec![],
            declaring_type: type_id,
        });
    }

    debug!(
        target: "weft::weaver",
        "guarded call inserted into {}::{} behind {}",
        type_name,
        method_name,
        guard_field
    );
    Ok(true)
}
