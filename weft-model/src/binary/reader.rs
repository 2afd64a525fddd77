//! Binary file reader
//!
//! Validates the header and section directory of a `.wmod` file and hands
//! out borrowed section slices.

use super::header::{FileHeader, HEADER_SIZE};
use super::section::{SectionDirectory, SectionKind};
use super::DecodeError;

/// Binary reader
pub struct BinaryReader {
    data: Vec<u8>,
    header: FileHeader,
    sections: SectionDirectory,
}

impl BinaryReader {
    /// Parse and validate the file skeleton from raw bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, DecodeError> {
        if data.len() < HEADER_SIZE {
            return Err(DecodeError::UnexpectedEof);
        }

        let header = FileHeader::from_bytes(&data[..HEADER_SIZE])?;
        header.validate()?;

        let dir_start = header.section_dir_offset as usize;
        let dir_end = dir_start + header.section_dir_size as usize;
        if dir_end > data.len() || dir_start < HEADER_SIZE {
            return Err(DecodeError::BadSectionBounds);
        }

        let sections = SectionDirectory::from_bytes(&data[dir_start..dir_end])?;

        Ok(Self {
            data,
            header,
            sections,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.sections.find(kind).is_some()
    }

    /// Borrow the raw data of a section.
    pub fn read_section(&self, kind: SectionKind) -> Result<&[u8], DecodeError> {
        let entry = self
            .sections
            .find(kind)
            .ok_or(DecodeError::MissingSection(kind))?;
        let start = entry.offset as usize;
        let end = start + entry.size as usize;
        if end > self.data.len() {
            return Err(DecodeError::BadSectionBounds);
        }
        Ok(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::writer::BinaryWriter;

    #[test]
    fn test_reader_round_trip() {
        let mut writer = BinaryWriter::new();
        writer.write_section(SectionKind::StringPool, b"strings");
        writer.write_section(SectionKind::BodyData, b"bodies");
        let bytes = writer.finish();

        let reader = BinaryReader::from_bytes(bytes).unwrap();
        assert!(reader.has_section(SectionKind::StringPool));
        assert!(!reader.has_section(SectionKind::TypeTree));
        assert_eq!(reader.read_section(SectionKind::BodyData).unwrap(), b"bodies");
    }

    #[test]
    fn test_missing_section() {
        let writer = BinaryWriter::new();
        let bytes = writer.finish();
        let reader = BinaryReader::from_bytes(bytes).unwrap();
        assert!(matches!(
            reader.read_section(SectionKind::TypeTree),
            Err(DecodeError::MissingSection(SectionKind::TypeTree))
        ));
    }

    #[test]
    fn test_truncated_file() {
        let result = BinaryReader::from_bytes(vec![0u8; 4]);
        assert!(matches!(result, Err(DecodeError::UnexpectedEof)));
    }
}
