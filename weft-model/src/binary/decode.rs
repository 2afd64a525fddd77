//! Module decoder
//!
//! Exact mirror of the encoder. Ids embedded in the file (type indices,
//! instruction ids, branch targets) are validated where cheap and trusted
//! otherwise; a malformed file fails with a `DecodeError`, never a panic.

use super::cursor::ByteReader;
use super::encode::{
    ARG_BOOL, ARG_INT, ARG_STR, NONE_U32, TAG_FIELD, TAG_INDEX, TAG_INT, TAG_METHOD, TAG_NONE,
    TAG_STR, TAG_TARGET, VIS_PRIVATE, VIS_PUBLIC,
};
use super::reader::BinaryReader;
use super::section::SectionKind;
use super::string_pool::StringPool;
use super::DecodeError;
use crate::body::{HandlerRange, LocalVar, MethodBody};
use crate::declarations::{
    CompiledModule, FieldDeclaration, GenericParam, MethodDeclaration, Parameter, TypeDeclaration,
    TypeId, Visibility,
};
use crate::instr::{InstrId, Instruction, OpCode, Operand};
use crate::marker::{Marker, MarkerArg};
use crate::refs::{FieldRef, MethodRef, TypeRef};

/// Deserialize a module from `.wmod` bytes.
pub fn decode_module(bytes: Vec<u8>) -> Result<CompiledModule, DecodeError> {
    let reader = BinaryReader::from_bytes(bytes)?;
    let pool = StringPool::deserialize(reader.read_section(SectionKind::StringPool)?)?;
    let body_data = reader.read_section(SectionKind::BodyData)?;
    let tree = reader.read_section(SectionKind::TypeTree)?;

    let mut r = ByteReader::new(tree);
    let module_name = pool.resolve(r.u32()?)?;
    let type_count = r.u32()? as usize;

    let mut types = Vec::with_capacity(type_count);
    for ti in 0..type_count {
        let id = TypeId(ti as u32);
        let namespace = pool.resolve(r.u32()?)?;
        let name = pool.resolve(r.u32()?)?;
        let parent = read_opt_type_id(&mut r, type_count)?;
        let base = if r.u8()? != 0 {
            Some(decode_type_ref(&mut r, &pool)?)
        } else {
            None
        };
        let markers = decode_markers(&mut r, &pool)?;

        let field_count = r.u16()? as usize;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            fields.push(decode_field(&mut r, &pool, id)?);
        }

        let method_count = r.u16()? as usize;
        let mut methods = Vec::with_capacity(method_count);
        for _ in 0..method_count {
            methods.push(decode_method(&mut r, &pool, body_data, id)?);
        }

        let nested_count = r.u16()? as usize;
        let mut nested = Vec::with_capacity(nested_count);
        for _ in 0..nested_count {
            nested.push(read_type_id(&mut r, type_count)?);
        }

        types.push(TypeDeclaration {
            id,
            namespace,
            name,
            base,
            parent,
            nested,
            fields,
            methods,
            markers,
        });
    }

    let root_count = r.u32()? as usize;
    let mut roots = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        roots.push(read_type_id(&mut r, type_count)?);
    }

    Ok(CompiledModule {
        name: module_name,
        types,
        roots,
        debug_symbols: None,
    })
}

fn read_type_id(r: &mut ByteReader<'_>, type_count: usize) -> Result<TypeId, DecodeError> {
    let raw = r.u32()?;
    if raw as usize >= type_count {
        return Err(DecodeError::BadTypeIndex(raw));
    }
    Ok(TypeId(raw))
}

fn read_opt_type_id(
    r: &mut ByteReader<'_>,
    type_count: usize,
) -> Result<Option<TypeId>, DecodeError> {
    let raw = r.u32()?;
    if raw == NONE_U32 {
        return Ok(None);
    }
    if raw as usize >= type_count {
        return Err(DecodeError::BadTypeIndex(raw));
    }
    Ok(Some(TypeId(raw)))
}

fn decode_field(
    r: &mut ByteReader<'_>,
    pool: &StringPool,
    declaring: TypeId,
) -> Result<FieldDeclaration, DecodeError> {
    let name = pool.resolve(r.u32()?)?;
    let field_type = decode_type_ref(r, pool)?;
    let visibility = decode_visibility(r.u8()?)?;
    let is_static = r.u8()? != 0;
    let markers = decode_markers(r, pool)?;
    Ok(FieldDeclaration {
        name,
        field_type,
        visibility,
        is_static,
        markers,
        declaring_type: declaring,
    })
}

fn decode_method(
    r: &mut ByteReader<'_>,
    pool: &StringPool,
    body_data: &[u8],
    declaring: TypeId,
) -> Result<MethodDeclaration, DecodeError> {
    let name = pool.resolve(r.u32()?)?;
    let visibility = decode_visibility(r.u8()?)?;
    let is_static = r.u8()? != 0;
    let return_type = decode_type_ref(r, pool)?;

    let param_count = r.u8()? as usize;
    let mut params = Vec::with_capacity(param_count);
    for _ in 0..param_count {
        let pname = pool.resolve(r.u32()?)?;
        let ty = decode_type_ref(r, pool)?;
        params.push(Parameter { name: pname, ty });
    }

    let generic_count = r.u8()? as usize;
    let mut generic_params = Vec::with_capacity(generic_count);
    for _ in 0..generic_count {
        generic_params.push(GenericParam {
            name: pool.resolve(r.u32()?)?,
        });
    }

    let markers = decode_markers(r, pool)?;

    let body_offset = r.u32()?;
    let body_len = r.u32()?;
    let body = if body_offset == NONE_U32 {
        None
    } else {
        let start = body_offset as usize;
        let end = start + body_len as usize;
        if end > body_data.len() {
            return Err(DecodeError::BadBodyRange);
        }
        Some(decode_body(&body_data[start..end], pool)?)
    };

    Ok(MethodDeclaration {
        name,
        visibility,
        is_static,
        params,
        generic_params,
        return_type,
        body,
        markers,
        declaring_type: declaring,
    })
}

fn decode_body(data: &[u8], pool: &StringPool) -> Result<MethodBody, DecodeError> {
    let mut r = ByteReader::new(data);

    let local_count = r.u16()? as usize;
    let mut locals = Vec::with_capacity(local_count);
    for _ in 0..local_count {
        let name = if r.u8()? != 0 {
            Some(pool.resolve(r.u32()?)?)
        } else {
            None
        };
        let ty = decode_type_ref(&mut r, pool)?;
        locals.push(LocalVar { name, ty });
    }

    let handler_count = r.u16()? as usize;
    let mut handlers = Vec::with_capacity(handler_count);
    for _ in 0..handler_count {
        let try_start = InstrId(r.u32()?);
        let try_end = InstrId(r.u32()?);
        let handler_start = InstrId(r.u32()?);
        let handler_end = InstrId(r.u32()?);
        let catch_type = if r.u8()? != 0 {
            Some(decode_type_ref(&mut r, pool)?)
        } else {
            None
        };
        handlers.push(HandlerRange {
            try_start,
            try_end,
            handler_start,
            handler_end,
            catch_type,
        });
    }

    let instr_count = r.u32()? as usize;
    let mut instructions = Vec::with_capacity(instr_count);
    for _ in 0..instr_count {
        let id = InstrId(r.u32()?);
        let raw_op = r.u8()?;
        let op = OpCode::from_u8(raw_op).ok_or(DecodeError::BadOpcode(raw_op))?;
        let operand = decode_operand(&mut r, pool)?;
        instructions.push(Instruction { id, op, operand });
    }

    Ok(MethodBody::from_parts(instructions, locals, handlers))
}

fn decode_operand(r: &mut ByteReader<'_>, pool: &StringPool) -> Result<Operand, DecodeError> {
    let tag = r.u8()?;
    Ok(match tag {
        TAG_NONE => Operand::None,
        TAG_INDEX => Operand::Index(r.u16()?),
        TAG_INT => Operand::Int(r.i64()?),
        TAG_STR => Operand::Str(pool.resolve(r.u32()?)?),
        TAG_FIELD => Operand::Field(decode_field_ref(r, pool)?),
        TAG_METHOD => Operand::Method(decode_method_ref(r, pool)?),
        TAG_TARGET => Operand::Target(InstrId(r.u32()?)),
        other => return Err(DecodeError::BadTag(other)),
    })
}

fn decode_type_ref(r: &mut ByteReader<'_>, pool: &StringPool) -> Result<TypeRef, DecodeError> {
    let full_name = pool.resolve(r.u32()?)?;
    let arg_count = r.u8()? as usize;
    let mut generic_args = Vec::with_capacity(arg_count);
    for _ in 0..arg_count {
        generic_args.push(decode_type_ref(r, pool)?);
    }
    Ok(TypeRef {
        full_name,
        generic_args,
    })
}

fn decode_field_ref(r: &mut ByteReader<'_>, pool: &StringPool) -> Result<FieldRef, DecodeError> {
    let declaring = decode_type_ref(r, pool)?;
    let name = pool.resolve(r.u32()?)?;
    let field_type = decode_type_ref(r, pool)?;
    Ok(FieldRef {
        declaring,
        name,
        field_type,
    })
}

fn decode_method_ref(r: &mut ByteReader<'_>, pool: &StringPool) -> Result<MethodRef, DecodeError> {
    let declaring = decode_type_ref(r, pool)?;
    let name = pool.resolve(r.u32()?)?;
    let param_count = r.u8()? as usize;
    let mut params = Vec::with_capacity(param_count);
    for _ in 0..param_count {
        params.push(decode_type_ref(r, pool)?);
    }
    let return_type = decode_type_ref(r, pool)?;
    let is_instance = r.u8()? != 0;
    Ok(MethodRef {
        declaring,
        name,
        params,
        return_type,
        is_instance,
    })
}

fn decode_markers(r: &mut ByteReader<'_>, pool: &StringPool) -> Result<Vec<Marker>, DecodeError> {
    let count = r.u8()? as usize;
    let mut markers = Vec::with_capacity(count);
    for _ in 0..count {
        let name = pool.resolve(r.u32()?)?;
        let arg_count = r.u8()? as usize;
        let mut args = Vec::with_capacity(arg_count);
        for _ in 0..arg_count {
            let tag = r.u8()?;
            args.push(match tag {
                ARG_STR => MarkerArg::Str(pool.resolve(r.u32()?)?),
                ARG_INT => MarkerArg::Int(r.i64()?),
                ARG_BOOL => MarkerArg::Bool(r.u8()? != 0),
                other => return Err(DecodeError::BadTag(other)),
            });
        }
        markers.push(Marker { name, args });
    }
    Ok(markers)
}

fn decode_visibility(raw: u8) -> Result<Visibility, DecodeError> {
    match raw {
        VIS_PUBLIC => Ok(Visibility::Public),
        VIS_PRIVATE => Ok(Visibility::Private),
        other => Err(DecodeError::BadTag(other)),
    }
}
