//! Weft Model - compiled-module data model and binary format
//!
//! The in-memory representation of one compiled module (`.wmod`): the type
//! declaration tree, method bodies with instruction streams, markers, and
//! the section-based binary encoding. This crate holds data and its
//! serialization only; resolution and weaving live in `weft-core`.

pub mod binary;
pub mod body;
pub mod debug_symbols;
pub mod declarations;
pub mod instr;
pub mod marker;
pub mod refs;

pub use binary::{decode_module, encode_module, DecodeError};
pub use body::{HandlerRange, LocalVar, MethodBody};
pub use debug_symbols::{DebugSymbols, MethodSymbols, SequencePoint};
pub use declarations::{
    CompiledModule, FieldDeclaration, GenericParam, MethodDeclaration, Parameter, TypeDeclaration,
    TypeId, Visibility,
};
pub use instr::{InstrId, Instruction, OpCode, Operand};
pub use marker::{Marker, MarkerArg};
pub use refs::{FieldRef, MethodRef, TypeRef};
