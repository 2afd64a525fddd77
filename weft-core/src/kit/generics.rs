//! Generic binding
//!
//! A member of an open generic type is only callable through a concrete
//! instantiation, which a weaver typically discovers at weave time (a
//! field's declared type, a base-type argument). Binding rebuilds the
//! method reference against that closed host: same calling convention and
//! parameter list, with every generic slot (`!0`, `!1`, ...) replaced by
//! the host's corresponding argument.

use weft_model::{MethodRef, TypeRef};

use crate::error::TargetError;

/// Rebuild `method_ref` against a closed instantiation of its declaring
/// type. Fails when the host is not closed over every slot the signature
/// uses.
pub fn bind_generic_host(
    method_ref: &MethodRef,
    closed_host: &TypeRef,
) -> Result<MethodRef, TargetError> {
    let params = method_ref
        .params
        .iter()
        .map(|p| substitute(p, closed_host))
        .collect::<Result<Vec<_>, _>>()?;
    let return_type = substitute(&method_ref.return_type, closed_host)?;

    Ok(MethodRef {
        declaring: closed_host.clone(),
        name: method_ref.name.clone(),
        params,
        return_type,
        is_instance: method_ref.is_instance,
    })
}

fn substitute(ty: &TypeRef, host: &TypeRef) -> Result<TypeRef, TargetError> {
    if let Some(slot) = ty.generic_slot_index() {
        return host
            .generic_args
            .get(slot)
            .cloned()
            .ok_or_else(|| {
                TargetError::ReferenceResolution(format!(
                    "generic slot !{} has no argument in {}",
                    slot, host
                ))
            });
    }
    let generic_args = ty
        .generic_args
        .iter()
        .map(|arg| substitute(arg, host))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TypeRef {
        full_name: ty.full_name.clone(),
        generic_args,
    })
}
