//! Module encoder
//!
//! Encoding is deterministic: the string pool assigns indices in
//! first-seen order, and every list is written in its in-memory order, so
//! encoding the same module twice produces identical bytes.

use super::cursor::ByteWriter;
use super::section::SectionKind;
use super::string_pool::StringPool;
use super::writer::BinaryWriter;
use crate::body::MethodBody;
use crate::declarations::{CompiledModule, FieldDeclaration, MethodDeclaration, Visibility};
use crate::instr::Operand;
use crate::marker::{Marker, MarkerArg};
use crate::refs::{FieldRef, MethodRef, TypeRef};

/// Sentinel for "no value" in u32 slots (parent links, body offsets).
pub(super) const NONE_U32: u32 = u32::MAX;

pub(super) const VIS_PUBLIC: u8 = 0;
pub(super) const VIS_PRIVATE: u8 = 1;

pub(super) const TAG_NONE: u8 = 0;
pub(super) const TAG_INDEX: u8 = 1;
pub(super) const TAG_INT: u8 = 2;
pub(super) const TAG_STR: u8 = 3;
pub(super) const TAG_FIELD: u8 = 4;
pub(super) const TAG_METHOD: u8 = 5;
pub(super) const TAG_TARGET: u8 = 6;

pub(super) const ARG_STR: u8 = 0;
pub(super) const ARG_INT: u8 = 1;
pub(super) const ARG_BOOL: u8 = 2;

/// Serialize a module to `.wmod` bytes.
pub fn encode_module(module: &CompiledModule) -> Vec<u8> {
    let mut pool = StringPool::new();

    // Bodies first so the type tree can reference their spans.
    let mut body_data = ByteWriter::new();
    let mut body_spans: Vec<Vec<Option<(u32, u32)>>> = Vec::with_capacity(module.types.len());
    for ty in &module.types {
        let mut spans = Vec::with_capacity(ty.methods.len());
        for method in &ty.methods {
            spans.push(method.body.as_ref().map(|body| {
                let offset = body_data.len() as u32;
                encode_body(&mut body_data, &mut pool, body);
                (offset, body_data.len() as u32 - offset)
            }));
        }
        body_spans.push(spans);
    }

    let mut tree = ByteWriter::new();
    tree.u32(pool.add(&module.name));
    tree.u32(module.types.len() as u32);
    for (ti, ty) in module.types.iter().enumerate() {
        tree.u32(pool.add(&ty.namespace));
        tree.u32(pool.add(&ty.name));
        tree.u32(ty.parent.map(|p| p.0).unwrap_or(NONE_U32));
        match &ty.base {
            Some(base) => {
                tree.u8(1);
                encode_type_ref(&mut tree, &mut pool, base);
            }
            None => tree.u8(0),
        }
        encode_markers(&mut tree, &mut pool, &ty.markers);

        tree.u16(ty.fields.len() as u16);
        for field in &ty.fields {
            encode_field(&mut tree, &mut pool, field);
        }

        tree.u16(ty.methods.len() as u16);
        for (mi, method) in ty.methods.iter().enumerate() {
            encode_method(&mut tree, &mut pool, method, body_spans[ti][mi]);
        }

        tree.u16(ty.nested.len() as u16);
        for nested in &ty.nested {
            tree.u32(nested.0);
        }
    }
    tree.u32(module.roots.len() as u32);
    for root in &module.roots {
        tree.u32(root.0);
    }

    let mut writer = BinaryWriter::new();
    writer.write_section(SectionKind::StringPool, &pool.serialize());
    writer.write_section(SectionKind::TypeTree, &tree.into_inner());
    writer.write_section(SectionKind::BodyData, &body_data.into_inner());
    writer.finish()
}

fn encode_field(w: &mut ByteWriter, pool: &mut StringPool, field: &FieldDeclaration) {
    w.u32(pool.add(&field.name));
    encode_type_ref(w, pool, &field.field_type);
    w.u8(encode_visibility(field.visibility));
    w.u8(field.is_static as u8);
    encode_markers(w, pool, &field.markers);
}

fn encode_method(
    w: &mut ByteWriter,
    pool: &mut StringPool,
    method: &MethodDeclaration,
    body_span: Option<(u32, u32)>,
) {
    w.u32(pool.add(&method.name));
    w.u8(encode_visibility(method.visibility));
    w.u8(method.is_static as u8);
    encode_type_ref(w, pool, &method.return_type);

    w.u8(method.params.len() as u8);
    for param in &method.params {
        w.u32(pool.add(&param.name));
        encode_type_ref(w, pool, &param.ty);
    }

    w.u8(method.generic_params.len() as u8);
    for generic in &method.generic_params {
        w.u32(pool.add(&generic.name));
    }

    encode_markers(w, pool, &method.markers);

    match body_span {
        Some((offset, len)) => {
            w.u32(offset);
            w.u32(len);
        }
        None => {
            w.u32(NONE_U32);
            w.u32(0);
        }
    }
}

fn encode_body(w: &mut ByteWriter, pool: &mut StringPool, body: &MethodBody) {
    w.u16(body.locals.len() as u16);
    for local in &body.locals {
        match &local.name {
            Some(name) => {
                w.u8(1);
                w.u32(pool.add(name));
            }
            None => w.u8(0),
        }
        encode_type_ref(w, pool, &local.ty);
    }

    w.u16(body.handlers.len() as u16);
    for handler in &body.handlers {
        w.u32(handler.try_start.0);
        w.u32(handler.try_end.0);
        w.u32(handler.handler_start.0);
        w.u32(handler.handler_end.0);
        match &handler.catch_type {
            Some(ty) => {
                w.u8(1);
                encode_type_ref(w, pool, ty);
            }
            None => w.u8(0),
        }
    }

    w.u32(body.instructions.len() as u32);
    for instr in &body.instructions {
        w.u32(instr.id.0);
        w.u8(instr.op as u8);
        encode_operand(w, pool, &instr.operand);
    }
}

fn encode_operand(w: &mut ByteWriter, pool: &mut StringPool, operand: &Operand) {
    match operand {
        Operand::None => w.u8(TAG_NONE),
        Operand::Index(i) => {
            w.u8(TAG_INDEX);
            w.u16(*i);
        }
        Operand::Int(v) => {
            w.u8(TAG_INT);
            w.i64(*v);
        }
        Operand::Str(s) => {
            w.u8(TAG_STR);
            w.u32(pool.add(s));
        }
        Operand::Field(f) => {
            w.u8(TAG_FIELD);
            encode_field_ref(w, pool, f);
        }
        Operand::Method(m) => {
            w.u8(TAG_METHOD);
            encode_method_ref(w, pool, m);
        }
        Operand::Target(t) => {
            w.u8(TAG_TARGET);
            w.u32(t.0);
        }
    }
}

fn encode_type_ref(w: &mut ByteWriter, pool: &mut StringPool, ty: &TypeRef) {
    w.u32(pool.add(&ty.full_name));
    w.u8(ty.generic_args.len() as u8);
    for arg in &ty.generic_args {
        encode_type_ref(w, pool, arg);
    }
}

fn encode_field_ref(w: &mut ByteWriter, pool: &mut StringPool, f: &FieldRef) {
    encode_type_ref(w, pool, &f.declaring);
    w.u32(pool.add(&f.name));
    encode_type_ref(w, pool, &f.field_type);
}

fn encode_method_ref(w: &mut ByteWriter, pool: &mut StringPool, m: &MethodRef) {
    encode_type_ref(w, pool, &m.declaring);
    w.u32(pool.add(&m.name));
    w.u8(m.params.len() as u8);
    for param in &m.params {
        encode_type_ref(w, pool, param);
    }
    encode_type_ref(w, pool, &m.return_type);
    w.u8(m.is_instance as u8);
}

fn encode_markers(w: &mut ByteWriter, pool: &mut StringPool, markers: &[Marker]) {
    w.u8(markers.len() as u8);
    for marker in markers {
        w.u32(pool.add(&marker.name));
        w.u8(marker.args.len() as u8);
        for arg in &marker.args {
            match arg {
                MarkerArg::Str(s) => {
                    w.u8(ARG_STR);
                    w.u32(pool.add(s));
                }
                MarkerArg::Int(v) => {
                    w.u8(ARG_INT);
                    w.i64(*v);
                }
                MarkerArg::Bool(v) => {
                    w.u8(ARG_BOOL);
                    w.u8(*v as u8);
                }
            }
        }
    }
}

fn encode_visibility(vis: Visibility) -> u8 {
    match vis {
        Visibility::Public => VIS_PUBLIC,
        Visibility::Private => VIS_PRIVATE,
    }
}
