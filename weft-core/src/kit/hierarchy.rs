//! Hierarchy walks
//!
//! Base-type chains cross module boundaries: a base reference may point
//! at another type of the module under weaving, at a type in a dependency
//! reachable through the search paths, or at nothing resolvable at all.
//! Both walks are depth-bounded so a malformed or cyclic reference graph
//! cannot hang a pass.

use tracing::trace;
use weft_model::{CompiledModule, FieldDeclaration, MethodDeclaration, TypeDeclaration, TypeId, TypeRef};

use crate::resolver::ModuleResolver;

/// Borrowed view of one member candidate offered to a search predicate.
#[derive(Debug, Clone, Copy)]
pub enum MemberRef<'a> {
    Field(&'a FieldDeclaration),
    Method(&'a MethodDeclaration),
}

/// Detached copy of a member found somewhere in a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(FieldDeclaration),
    Method(MethodDeclaration),
}

/// A member located by [`find_member_in_hierarchy`], with the full name
/// of the type that declares it.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundMember {
    pub owner: String,
    pub member: Member,
}

/// One step of a hierarchy walk: a type of the module under weaving, or
/// a detached copy of an external one.
enum Node {
    Internal(TypeId),
    External(TypeDeclaration),
}

impl Node {
    fn full_name(&self, module: &CompiledModule) -> String {
        match self {
            Node::Internal(id) => module.full_name(*id),
            Node::External(decl) => external_full_name(decl),
        }
    }

    fn base(&self, module: &CompiledModule) -> Option<TypeRef> {
        match self {
            Node::Internal(id) => module.type_decl(*id).base.clone(),
            Node::External(decl) => decl.base.clone(),
        }
    }
}

/// Full name of a detached external declaration. Nesting chains cannot be
/// reconstructed from a detached copy, so the namespace-qualified name is
/// the best available identity.
fn external_full_name(decl: &TypeDeclaration) -> String {
    if decl.namespace.is_empty() {
        decl.name.clone()
    } else {
        format!("{}.{}", decl.namespace, decl.name)
    }
}

fn resolve_base(
    module: &CompiledModule,
    resolver: &mut ModuleResolver,
    base: &TypeRef,
) -> Option<Node> {
    if let Some(id) = module.find_type(&base.full_name) {
        return Some(Node::Internal(id));
    }
    resolver.resolve_external(&base.full_name).map(Node::External)
}

/// Walk the base-type chain starting at `start`, returning the first
/// member any step declares that satisfies `predicate`. Fields are
/// offered before methods, both in declaration order, so the result is
/// reproducible. The walk stops at an unresolvable base or after
/// `max_depth` steps.
pub fn find_member_in_hierarchy(
    module: &CompiledModule,
    resolver: &mut ModuleResolver,
    start: TypeId,
    predicate: &dyn Fn(MemberRef<'_>) -> bool,
    max_depth: u32,
) -> Option<FoundMember> {
    let mut node = Node::Internal(start);
    for _ in 0..max_depth {
        let owner = node.full_name(module);
        let (fields, methods): (&[FieldDeclaration], &[MethodDeclaration]) = match &node {
            Node::Internal(id) => {
                let decl = module.type_decl(*id);
                (&decl.fields, &decl.methods)
            }
            Node::External(decl) => (&decl.fields, &decl.methods),
        };

        for field in fields {
            if predicate(MemberRef::Field(field)) {
                return Some(FoundMember {
                    owner,
                    member: Member::Field(field.clone()),
                });
            }
        }
        for method in methods {
            if predicate(MemberRef::Method(method)) {
                return Some(FoundMember {
                    owner,
                    member: Member::Method(method.clone()),
                });
            }
        }

        let base = node.base(module)?;
        match resolve_base(module, resolver, &base) {
            Some(next) => node = next,
            None => {
                trace!(
                    target: "weft::resolver",
                    "hierarchy walk stopped at unresolved base {}",
                    base
                );
                return None;
            }
        }
    }
    None
}

/// Whether `start` is (or derives from) the type named `target_full_name`.
///
/// Full names are compared at each step of the base chain. When a base
/// reference cannot be resolved, its printed name is compared instead of
/// giving up: a deliberate two-tier policy so partial dependency
/// availability does not block a positive match.
pub fn is_subtype_of(
    module: &CompiledModule,
    resolver: &mut ModuleResolver,
    start: TypeId,
    target_full_name: &str,
    max_depth: u32,
) -> bool {
    let mut node = Node::Internal(start);
    for _ in 0..max_depth {
        if node.full_name(module) == target_full_name {
            return true;
        }
        let Some(base) = node.base(module) else {
            return false;
        };
        match resolve_base(module, resolver, &base) {
            Some(next) => node = next,
            None => {
                // name-only fallback for an unresolvable base
                trace!(
                    target: "weft::resolver",
                    "comparing unresolved base {} by printed name",
                    base
                );
                return base.printed_name() == target_full_name;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use weft_config::SearchPaths;
    use weft_model::{encode_module, MethodBody, Visibility};
    use weft_vfs::MemoryFileSystem;

    fn empty_resolver() -> ModuleResolver {
        ModuleResolver::new(Arc::new(MemoryFileSystem::new()), SearchPaths::default())
    }

    fn add_marker_method(module: &mut CompiledModule, ty: TypeId, name: &str) {
        let decl = module.type_decl_mut(ty);
        decl.methods.push(MethodDeclaration {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            params: vec![],
            generic_params: vec![],
            return_type: TypeRef::void(),
            body: Some(MethodBody::single_return()),
            markers: vec![],
            declaring_type: ty,
        });
    }

    /// chain A -> B -> C, all internal
    fn chain_module() -> (CompiledModule, TypeId) {
        let mut module = CompiledModule::new("game");
        let a = module.add_type("n", "A", None);
        let b = module.add_type("n", "B", None);
        let c = module.add_type("n", "C", None);
        module.type_decl_mut(a).base = Some(TypeRef::named("n.B"));
        module.type_decl_mut(b).base = Some(TypeRef::named("n.C"));
        add_marker_method(&mut module, c, "only_on_c");
        (module, a)
    }

    #[test]
    fn test_find_member_walks_to_grandparent() {
        let (module, a) = chain_module();
        let mut resolver = empty_resolver();

        let found = find_member_in_hierarchy(
            &module,
            &mut resolver,
            a,
            &|m| matches!(m, MemberRef::Method(method) if method.name == "only_on_c"),
            32,
        )
        .unwrap();

        assert_eq!(found.owner, "n.C");
        assert!(matches!(found.member, Member::Method(ref m) if m.name == "only_on_c"));
    }

    #[test]
    fn test_find_member_depth_bound() {
        let (module, a) = chain_module();
        let mut resolver = empty_resolver();

        // depth 2 visits A and B only, never reaching C
        let found = find_member_in_hierarchy(
            &module,
            &mut resolver,
            a,
            &|m| matches!(m, MemberRef::Method(method) if method.name == "only_on_c"),
            2,
        );
        assert!(found.is_none());
    }

    #[test]
    fn test_find_member_survives_cycle() {
        let mut module = CompiledModule::new("game");
        let a = module.add_type("n", "A", None);
        let b = module.add_type("n", "B", None);
        module.type_decl_mut(a).base = Some(TypeRef::named("n.B"));
        module.type_decl_mut(b).base = Some(TypeRef::named("n.A"));
        let mut resolver = empty_resolver();

        let found = find_member_in_hierarchy(&module, &mut resolver, a, &|_| false, 32);
        assert!(found.is_none());
    }

    #[test]
    fn test_is_subtype_internal_chain() {
        let (module, a) = chain_module();
        let mut resolver = empty_resolver();

        assert!(is_subtype_of(&module, &mut resolver, a, "n.A", 32));
        assert!(is_subtype_of(&module, &mut resolver, a, "n.C", 32));
        assert!(!is_subtype_of(&module, &mut resolver, a, "n.D", 32));
    }

    #[test]
    fn test_is_subtype_name_fallback_for_unresolved_base() {
        let mut module = CompiledModule::new("game");
        let a = module.add_type("n", "A", None);
        module.type_decl_mut(a).base = Some(TypeRef::named("ghost.Base"));
        let mut resolver = empty_resolver();

        assert!(is_subtype_of(&module, &mut resolver, a, "ghost.Base", 32));
        assert!(!is_subtype_of(&module, &mut resolver, a, "other.Base", 32));
    }

    #[test]
    fn test_walk_crosses_into_external_module() {
        // A (internal) -> lib.ext.Mid (external) -> lib.ext.Top (external)
        let mut lib = CompiledModule::new("lib");
        let mid = lib.add_type("lib.ext", "Mid", None);
        lib.type_decl_mut(mid).base = Some(TypeRef::named("lib.ext.Top"));
        let top = lib.add_type("lib.ext", "Top", None);
        add_marker_method(&mut lib, top, "external_member");

        let fs = Arc::new(MemoryFileSystem::with_files(vec![(
            "/libs/lib.ext.wmod",
            encode_module(&lib),
        )]));
        let search = SearchPaths {
            module_dir: None,
            intermediate_dir: None,
            base_library_dirs: vec![PathBuf::from("/libs")],
        };
        let mut resolver = ModuleResolver::new(fs, search);

        let mut module = CompiledModule::new("game");
        let a = module.add_type("n", "A", None);
        module.type_decl_mut(a).base = Some(TypeRef::named("lib.ext.Mid"));

        assert!(is_subtype_of(&module, &mut resolver, a, "lib.ext.Top", 32));

        let found = find_member_in_hierarchy(
            &module,
            &mut resolver,
            a,
            &|m| matches!(m, MemberRef::Method(method) if method.name == "external_member"),
            32,
        )
        .unwrap();
        assert_eq!(found.owner, "lib.ext.Top");
    }
}
