//! Symbol references
//!
//! Types, methods, and fields are referenced by full name so a reference
//! can exist without its target being loaded. Generic parameter positions
//! print as `!0`, `!1`, ... until bound to a closed instantiation.

use std::fmt;

/// Reference to a type by full name, possibly carrying generic arguments.
///
/// A `TypeRef` is just a name; whether it resolves to a declaration is
/// decided at walk time by the resolver. Nested types join their enclosing
/// chain with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Full name, e.g. `acme.ui.Widget` or `acme.ui.Panel/Row`
    pub full_name: String,
    /// Generic arguments for a closed instantiation, empty otherwise
    pub generic_args: Vec<TypeRef>,
}

impl TypeRef {
    /// Create a reference by full name with no generic arguments.
    pub fn named(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            generic_args: Vec::new(),
        }
    }

    /// Create a closed generic instantiation.
    pub fn with_args(full_name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            full_name: full_name.into(),
            generic_args: args,
        }
    }

    /// Reference to a generic parameter slot (`!0`, `!1`, ...).
    pub fn generic_slot(index: usize) -> Self {
        Self::named(format!("!{}", index))
    }

    /// Whether this reference is a generic parameter slot.
    pub fn is_generic_slot(&self) -> bool {
        self.full_name.starts_with('!')
            && self.full_name[1..].chars().all(|c| c.is_ascii_digit())
            && self.full_name.len() > 1
    }

    /// The slot index when this is a generic parameter reference.
    pub fn generic_slot_index(&self) -> Option<usize> {
        if self.is_generic_slot() {
            self.full_name[1..].parse().ok()
        } else {
            None
        }
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    pub fn boolean() -> Self {
        Self::named("bool")
    }

    pub fn string() -> Self {
        Self::named("string")
    }

    pub fn int32() -> Self {
        Self::named("int")
    }

    pub fn object() -> Self {
        Self::named("object")
    }

    /// The printed name, used by the unresolved-base comparison fallback.
    pub fn printed_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)?;
        if !self.generic_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Reference to a method: declaring type, name, and parameter shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub declaring: TypeRef,
    pub name: String,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    /// Instance methods take an implicit `this`
    pub is_instance: bool,
}

impl MethodRef {
    pub fn new(
        declaring: TypeRef,
        name: impl Into<String>,
        params: Vec<TypeRef>,
        return_type: TypeRef,
    ) -> Self {
        Self {
            declaring,
            name: name.into(),
            params,
            return_type,
            is_instance: true,
        }
    }

    /// Mark this reference as a static call target.
    pub fn into_static(mut self) -> Self {
        self.is_instance = false;
        self
    }

    /// `declaring::name`, the identity used by duplicate-call scans.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring.full_name, self.name)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}::{}(", self.return_type, self.declaring, self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")
    }
}

/// Reference to a field: declaring type, name, and declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub declaring: TypeRef,
    pub name: String,
    pub field_type: TypeRef,
}

impl FieldRef {
    pub fn new(declaring: TypeRef, name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            declaring,
            name: name.into(),
            field_type,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}::{}", self.field_type, self.declaring, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display() {
        let plain = TypeRef::named("acme.ui.Widget");
        assert_eq!(plain.to_string(), "acme.ui.Widget");

        let generic = TypeRef::with_args(
            "acme.Registry",
            vec![TypeRef::string(), TypeRef::named("acme.ui.Widget")],
        );
        assert_eq!(generic.to_string(), "acme.Registry<string, acme.ui.Widget>");
    }

    #[test]
    fn test_generic_slot() {
        let slot = TypeRef::generic_slot(1);
        assert_eq!(slot.full_name, "!1");
        assert!(slot.is_generic_slot());
        assert_eq!(slot.generic_slot_index(), Some(1));

        assert!(!TypeRef::named("!bang").is_generic_slot());
        assert!(!TypeRef::named("bool").is_generic_slot());
    }

    #[test]
    fn test_method_ref_qualified_name() {
        let m = MethodRef::new(
            TypeRef::named("weft.support.HookBus"),
            "subscribe",
            vec![TypeRef::string(), TypeRef::object()],
            TypeRef::void(),
        );
        assert_eq!(m.qualified_name(), "weft.support.HookBus::subscribe");
    }
}
