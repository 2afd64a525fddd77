//! Binary module format
//!
//! `.wmod` files are a fixed header, a set of 8-aligned sections, and a
//! section directory. Three sections carry the module: the string pool,
//! the type tree (declarations, markers, signatures), and the body data
//! (encoded instruction streams). Debug symbols live in a separate JSON
//! sidecar, not in the binary.

mod cursor;
mod decode;
mod encode;
pub mod header;
mod reader;
pub mod section;
mod string_pool;
mod writer;

pub use decode::decode_module;
pub use encode::encode_module;
pub use header::{FileHeader, HeaderError, HEADER_SIZE, MAGIC};
pub use reader::BinaryReader;
pub use section::{SectionDirectory, SectionEntry, SectionError, SectionKind};
pub use string_pool::StringPool;
pub use writer::BinaryWriter;

use thiserror::Error;

/// Errors produced while decoding a `.wmod` file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    #[error("section error: {0}")]
    Section(#[from] SectionError),

    #[error("missing required section: {0:?}")]
    MissingSection(SectionKind),

    #[error("section bounds outside file")]
    BadSectionBounds,

    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("unknown opcode: {0:#04x}")]
    BadOpcode(u8),

    #[error("unknown operand tag: {0}")]
    BadTag(u8),

    #[error("invalid string index: {0}")]
    BadStringIndex(u32),

    #[error("invalid type index: {0}")]
    BadTypeIndex(u32),

    #[error("invalid utf-8 in string pool")]
    BadUtf8,

    #[error("method body span outside body section")]
    BadBodyRange,
}
