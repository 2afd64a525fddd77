//! Shadow cloning

use tracing::debug;
use weft_model::{MethodDeclaration, Visibility};

/// Duplicate a method as an unattached shadow under `name + suffix`.
///
/// Parameters, generic parameters, locals, the full instruction list, and
/// every exception-handler range are carried over. Ids inside the copied
/// body reference instructions of the copied set, so the clone is
/// internally consistent without any target rewriting. Markers are not
/// carried: the shadow must never be picked up by a later scan. The
/// shadow is private; only the wrapper the weaver builds calls it.
pub fn clone_method_as_shadow(original: &MethodDeclaration, suffix: &str) -> MethodDeclaration {
    let mut shadow = original.clone();
    shadow.name = format!("{}{}", original.name, suffix);
    shadow.visibility = Visibility::Private;
    shadow.markers.clear();
    debug!(
        target: "weft::weaver",
        "cloned {} as shadow {}",
        original.name,
        shadow.name
    );
    shadow
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_model::{
        HandlerRange, Marker, MethodBody, OpCode, Operand, Parameter, TypeId, TypeRef,
    };

    fn original() -> MethodDeclaration {
        let mut body = MethodBody::new();
        body.add_local(TypeRef::int32());
        body.add_local(TypeRef::string());
        let first = body.push(OpCode::LoadArg, Operand::Index(0));
        body.push(OpCode::StoreLocal, Operand::Index(0));
        let ret = body.push(OpCode::Return, Operand::None);
        body.push(OpCode::Branch, Operand::Target(first));
        body.handlers.push(HandlerRange {
            try_start: first,
            try_end: ret,
            handler_start: ret,
            handler_end: ret,
            catch_type: Some(TypeRef::named("weft.support.Fault")),
        });

        MethodDeclaration {
            name: "speak".into(),
            visibility: Visibility::Public,
            is_static: false,
            params: vec![Parameter {
                name: "count".into(),
                ty: TypeRef::int32(),
            }],
            generic_params: vec![],
            return_type: TypeRef::void(),
            body: Some(body),
            markers: vec![Marker::new("Timed")],
            declaring_type: TypeId(0),
        }
    }

    #[test]
    fn test_clone_fidelity() {
        let source = original();
        let shadow = clone_method_as_shadow(&source, "__inner");

        assert_eq!(shadow.name, "speak__inner");
        assert_eq!(shadow.params, source.params);
        assert_eq!(shadow.generic_params, source.generic_params);
        assert_eq!(shadow.return_type, source.return_type);

        let src_body = source.body.as_ref().unwrap();
        let dst_body = shadow.body.as_ref().unwrap();
        assert_eq!(dst_body.instructions, src_body.instructions);
        assert_eq!(dst_body.locals, src_body.locals);
        assert_eq!(dst_body.handlers, src_body.handlers);
    }

    #[test]
    fn test_clone_drops_markers_and_is_private() {
        let shadow = clone_method_as_shadow(&original(), "__inner");
        assert!(shadow.markers.is_empty());
        assert_eq!(shadow.visibility, Visibility::Private);
    }

    #[test]
    fn test_clone_branch_targets_stay_in_copied_set() {
        let shadow = clone_method_as_shadow(&original(), "__inner");
        let body = shadow.body.as_ref().unwrap();
        for instr in &body.instructions {
            if let Operand::Target(t) = &instr.operand {
                assert!(body.position_of(*t).is_some());
            }
        }
        for handler in &body.handlers {
            assert!(body.position_of(handler.try_start).is_some());
            assert!(body.position_of(handler.handler_end).is_some());
        }
    }

    #[test]
    fn test_clone_leaves_source_untouched() {
        let source = original();
        let before = source.clone();
        let _ = clone_method_as_shadow(&source, "__inner");
        assert_eq!(source, before);
    }
}
