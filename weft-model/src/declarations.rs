//! Declaration tree
//!
//! A `CompiledModule` owns every type declaration in an arena indexed by
//! `TypeId`; nesting and back-references are ids, not owning pointers.
//! Fields and methods live inline on their declaring type and carry the
//! declaring `TypeId` back-reference.

use crate::body::MethodBody;
use crate::debug_symbols::DebugSymbols;
use crate::marker::Marker;
use crate::refs::TypeRef;

/// Arena index of a type declaration within its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

/// Member visibility. The model keeps only the distinction the engine
/// needs: synthesized guard fields are private.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// A method parameter (excluding the implicit `this`).
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

/// A declared generic parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: String,
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    pub name: String,
    pub field_type: TypeRef,
    pub visibility: Visibility,
    pub is_static: bool,
    pub markers: Vec<Marker>,
    /// Non-owning back-reference to the declaring type
    pub declaring_type: TypeId,
}

/// A method declaration, optionally carrying a body.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDeclaration {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub params: Vec<Parameter>,
    pub generic_params: Vec<GenericParam>,
    pub return_type: TypeRef,
    pub body: Option<MethodBody>,
    pub markers: Vec<Marker>,
    /// Non-owning back-reference to the declaring type
    pub declaring_type: TypeId,
}

impl MethodDeclaration {
    pub fn is_instance(&self) -> bool {
        !self.is_static
    }

    /// No parameters and a void return: the only shape accepted as an
    /// injection point.
    pub fn is_parameterless_void(&self) -> bool {
        self.params.is_empty() && self.return_type == TypeRef::void()
    }
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub id: TypeId,
    /// Namespace of a root type; nested types inherit their parent's
    pub namespace: String,
    pub name: String,
    /// Base-type reference; may point outside the module, may be unresolvable
    pub base: Option<TypeRef>,
    pub parent: Option<TypeId>,
    pub nested: Vec<TypeId>,
    pub fields: Vec<FieldDeclaration>,
    pub methods: Vec<MethodDeclaration>,
    pub markers: Vec<Marker>,
}

impl TypeDeclaration {
    pub fn method(&self, name: &str) -> Option<&MethodDeclaration> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut MethodDeclaration> {
        self.methods.iter_mut().find(|m| m.name == name)
    }

    pub fn method_index(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// One compiled module: the unit of a weaving pass.
///
/// Created by the resolver, mutated in place during exactly one pass,
/// consumed by the output writer; never reused across passes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModule {
    pub name: String,
    pub types: Vec<TypeDeclaration>,
    /// Top-level types in declaration order
    pub roots: Vec<TypeId>,
    pub debug_symbols: Option<DebugSymbols>,
}

impl CompiledModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            roots: Vec::new(),
            debug_symbols: None,
        }
    }

    /// Add a type declaration, wiring parent/nested/roots bookkeeping.
    pub fn add_type(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        parent: Option<TypeId>,
    ) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDeclaration {
            id,
            namespace: namespace.into(),
            name: name.into(),
            base: None,
            parent,
            nested: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            markers: Vec::new(),
        });
        match parent {
            Some(p) => self.types[p.0 as usize].nested.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn type_decl(&self, id: TypeId) -> &TypeDeclaration {
        &self.types[id.0 as usize]
    }

    pub fn type_decl_mut(&mut self, id: TypeId) -> &mut TypeDeclaration {
        &mut self.types[id.0 as usize]
    }

    /// Full name of a type: `namespace.Name` for roots, enclosing chain
    /// joined with `/` for nested types.
    pub fn full_name(&self, id: TypeId) -> String {
        let decl = self.type_decl(id);
        match decl.parent {
            Some(parent) => format!("{}/{}", self.full_name(parent), decl.name),
            None if decl.namespace.is_empty() => decl.name.clone(),
            None => format!("{}.{}", decl.namespace, decl.name),
        }
    }

    /// Find a type by full name.
    pub fn find_type(&self, full_name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .map(|t| t.id)
            .find(|&id| self.full_name(id) == full_name)
    }

    /// All type ids in declaration order: roots first-to-last, each
    /// followed depth-first by its nested types.
    pub fn declaration_order(&self) -> Vec<TypeId> {
        let mut out = Vec::with_capacity(self.types.len());
        for &root in &self.roots {
            self.collect_depth_first(root, &mut out);
        }
        out
    }

    fn collect_depth_first(&self, id: TypeId, out: &mut Vec<TypeId>) {
        out.push(id);
        for &nested in &self.type_decl(id).nested {
            self.collect_depth_first(nested, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_plain_and_nested() {
        let mut module = CompiledModule::new("game");
        let outer = module.add_type("acme.ui", "Panel", None);
        let inner = module.add_type("", "Row", Some(outer));
        let bare = module.add_type("", "Loose", None);

        assert_eq!(module.full_name(outer), "acme.ui.Panel");
        assert_eq!(module.full_name(inner), "acme.ui.Panel/Row");
        assert_eq!(module.full_name(bare), "Loose");
    }

    #[test]
    fn test_find_type() {
        let mut module = CompiledModule::new("game");
        let outer = module.add_type("acme.ui", "Panel", None);
        let inner = module.add_type("", "Row", Some(outer));

        assert_eq!(module.find_type("acme.ui.Panel"), Some(outer));
        assert_eq!(module.find_type("acme.ui.Panel/Row"), Some(inner));
        assert_eq!(module.find_type("acme.ui.Missing"), None);
    }

    #[test]
    fn test_declaration_order_is_depth_first() {
        let mut module = CompiledModule::new("game");
        let a = module.add_type("n", "A", None);
        let a1 = module.add_type("", "A1", Some(a));
        let a1x = module.add_type("", "A1X", Some(a1));
        let b = module.add_type("n", "B", None);

        assert_eq!(module.declaration_order(), vec![a, a1, a1x, b]);
    }
}
