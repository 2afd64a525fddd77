//! Declaration scanner
//!
//! Walks the full type tree recursively in declaration order and pairs
//! each marked declaration with the weaver registered for its marker and
//! category. The output is three ordered lists - types, fields, methods -
//! matching the fixed stage order of a pass, so scanning the same module
//! against the same registry always reproduces the same work list.

use tracing::{debug, trace};
use weft_model::{CompiledModule, Marker};

use crate::registry::MarkerRegistry;
use crate::weavers::{WeaveTarget, Weaver, WeaverCategory};

/// One unit of weaving work: a declaration, one of its markers, and the
/// weaver bound to that marker.
pub struct ScanItem<'r> {
    pub target: WeaveTarget,
    pub marker: Marker,
    pub weaver: &'r dyn Weaver,
}

/// The work list of one pass, in application order.
pub struct ScanOutput<'r> {
    pub types: Vec<ScanItem<'r>>,
    pub fields: Vec<ScanItem<'r>>,
    pub methods: Vec<ScanItem<'r>>,
}

impl ScanOutput<'_> {
    pub fn total(&self) -> usize {
        self.types.len() + self.fields.len() + self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Scan a module against a registry.
///
/// Types are visited roots-first, each followed depth-first by its
/// nested types; within a type, markers are checked in attachment order.
/// Markers with no registered weaver are ignored. Method markers are
/// only paired for methods that carry a body.
pub fn scan<'r>(module: &CompiledModule, registry: &'r MarkerRegistry) -> ScanOutput<'r> {
    let mut output = ScanOutput {
        types: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
    };

    for ty in module.declaration_order() {
        let decl = module.type_decl(ty);

        for marker in &decl.markers {
            match registry.find(WeaverCategory::Type, &marker.name) {
                Some(weaver) => output.types.push(ScanItem {
                    target: WeaveTarget::Type { ty },
                    marker: marker.clone(),
                    weaver,
                }),
                None => trace!(
                    target: "weft::scanner",
                    "no type weaver for marker {} on {}",
                    marker.name,
                    module.full_name(ty)
                ),
            }
        }

        for (field, field_decl) in decl.fields.iter().enumerate() {
            for marker in &field_decl.markers {
                match registry.find(WeaverCategory::Field, &marker.name) {
                    Some(weaver) => output.fields.push(ScanItem {
                        target: WeaveTarget::Field { ty, field },
                        marker: marker.clone(),
                        weaver,
                    }),
                    None => trace!(
                        target: "weft::scanner",
                        "no field weaver for marker {} on {}::{}",
                        marker.name,
                        module.full_name(ty),
                        field_decl.name
                    ),
                }
            }
        }

        for (method, method_decl) in decl.methods.iter().enumerate() {
            if method_decl.body.is_none() {
                continue;
            }
            for marker in &method_decl.markers {
                match registry.find(WeaverCategory::Method, &marker.name) {
                    Some(weaver) => output.methods.push(ScanItem {
                        target: WeaveTarget::Method { ty, method },
                        marker: marker.clone(),
                        weaver,
                    }),
                    None => trace!(
                        target: "weft::scanner",
                        "no method weaver for marker {} on {}::{}",
                        marker.name,
                        module.full_name(ty),
                        method_decl.name
                    ),
                }
            }
        }
    }

    debug!(
        target: "weft::scanner",
        "scan of {} paired {} type, {} field, {} method target(s)",
        module.name,
        output.types.len(),
        output.fields.len(),
        output.methods.len()
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_model::{
        FieldDeclaration, MethodBody, MethodDeclaration, TypeRef, Visibility,
    };

    fn marked_module() -> CompiledModule {
        let mut module = CompiledModule::new("game");
        let outer = module.add_type("demo", "Outer", None);
        let inner = module.add_type("", "Inner", Some(outer));

        module
            .type_decl_mut(outer)
            .markers
            .push(Marker::new("SceneBound"));
        module
            .type_decl_mut(inner)
            .markers
            .push(Marker::new("SceneBound"));

        let decl = module.type_decl_mut(inner);
        decl.fields.push(FieldDeclaration {
            name: "signal".into(),
            field_type: TypeRef::named("weft.support.Signal"),
            visibility: Visibility::Public,
            is_static: false,
            markers: vec![Marker::new("AutoWire"), Marker::new("Unregistered")],
            declaring_type: inner,
        });
        decl.methods.push(MethodDeclaration {
            name: "tick".into(),
            visibility: Visibility::Public,
            is_static: false,
            params: vec![],
            generic_params: vec![],
            return_type: TypeRef::void(),
            body: Some(MethodBody::single_return()),
            markers: vec![Marker::new("Timed")],
            declaring_type: inner,
        });
        decl.methods.push(MethodDeclaration {
            name: "bodiless".into(),
            visibility: Visibility::Public,
            is_static: false,
            params: vec![],
            generic_params: vec![],
            return_type: TypeRef::void(),
            body: None,
            markers: vec![Marker::new("Timed")],
            declaring_type: inner,
        });
        module
    }

    #[test]
    fn test_scan_pairs_by_category_in_order() {
        let module = marked_module();
        let registry = MarkerRegistry::with_builtin_weavers();
        let output = scan(&module, &registry);

        assert_eq!(output.types.len(), 2);
        assert_eq!(output.fields.len(), 1);
        assert_eq!(output.methods.len(), 1);

        // declaration order: Outer before its nested Inner
        assert_eq!(output.types[0].target.describe(&module), "demo.Outer");
        assert_eq!(output.types[1].target.describe(&module), "demo.Outer/Inner");
        assert_eq!(
            output.fields[0].target.describe(&module),
            "demo.Outer/Inner::signal"
        );
    }

    #[test]
    fn test_scan_skips_bodiless_methods_and_unknown_markers() {
        let module = marked_module();
        let registry = MarkerRegistry::with_builtin_weavers();
        let output = scan(&module, &registry);

        assert!(output
            .methods
            .iter()
            .all(|i| i.target.describe(&module) != "demo.Outer/Inner::bodiless"));
        assert!(output.fields.iter().all(|i| i.marker.name == "AutoWire"));
    }

    #[test]
    fn test_scan_empty_registry_pairs_nothing() {
        let module = marked_module();
        let registry = MarkerRegistry::builder().build();
        assert!(scan(&module, &registry).is_empty());
    }
}
