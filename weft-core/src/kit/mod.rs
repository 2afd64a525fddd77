//! Bytecode editing kit
//!
//! Shared low-level mutation primitives every weaver builds on: shadow
//! cloning, hierarchy lookup, generic binding, and guarded injection.
//! All of them lean on one property of the model: branch and handler
//! targets are per-body instruction ids, never stream offsets, so a
//! straight list copy stays internally consistent as long as every
//! referenced id comes from the copied set.

mod clone;
mod generics;
mod hierarchy;
mod inject;

pub use clone::clone_method_as_shadow;
pub use generics::bind_generic_host;
pub use hierarchy::{find_member_in_hierarchy, is_subtype_of, FoundMember, Member, MemberRef};
pub use inject::{
    find_or_create_injection_point, insert_guarded_call, validate_guard_slot,
    validate_injection_point,
};
