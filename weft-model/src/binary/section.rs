//! Section directory
//!
//! The section directory records the offset and size of every section in
//! the file. Entries are fixed-size.

use thiserror::Error;

/// Section type
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Deduplicated string storage
    StringPool = 0x01,
    /// Type declarations, fields, methods, markers
    TypeTree = 0x02,
    /// Encoded method bodies
    BodyData = 0x03,
}

impl SectionKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(SectionKind::StringPool),
            0x02 => Some(SectionKind::TypeTree),
            0x03 => Some(SectionKind::BodyData),
            _ => None,
        }
    }
}

/// Section errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionError {
    #[error("section data too short")]
    TooShort,
    #[error("invalid section kind: {0:#04x}")]
    InvalidKind(u8),
}

/// One directory entry (12 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionEntry {
    pub kind: SectionKind,
    /// Offset of the section data in the file
    pub offset: u32,
    /// Size of the section data in bytes
    pub size: u32,
}

impl SectionEntry {
    /// Entry size: 12 bytes
    pub const ENTRY_SIZE: usize = 12;

    pub fn new(kind: SectionKind, offset: u32, size: u32) -> Self {
        Self { kind, offset, size }
    }

    pub fn to_bytes(&self) -> [u8; Self::ENTRY_SIZE] {
        let mut bytes = [0u8; Self::ENTRY_SIZE];
        bytes[0] = self.kind as u8;
        // bytes[1..4] reserved
        bytes[4..8].copy_from_slice(&self.offset.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.size.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SectionError> {
        if bytes.len() < Self::ENTRY_SIZE {
            return Err(SectionError::TooShort);
        }
        let kind = SectionKind::from_u8(bytes[0]).ok_or(SectionError::InvalidKind(bytes[0]))?;
        let offset = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let size = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        Ok(Self { kind, offset, size })
    }
}

/// Ordered collection of section entries.
#[derive(Debug, Clone, Default)]
pub struct SectionDirectory {
    entries: Vec<SectionEntry>,
}

impl SectionDirectory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, entry: SectionEntry) {
        self.entries.push(entry);
    }

    pub fn find(&self, kind: SectionKind) -> Option<&SectionEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * SectionEntry::ENTRY_SIZE);
        for entry in &self.entries {
            out.extend_from_slice(&entry.to_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SectionError> {
        if bytes.len() % SectionEntry::ENTRY_SIZE != 0 {
            return Err(SectionError::TooShort);
        }
        let mut entries = Vec::with_capacity(bytes.len() / SectionEntry::ENTRY_SIZE);
        for chunk in bytes.chunks_exact(SectionEntry::ENTRY_SIZE) {
            entries.push(SectionEntry::from_bytes(chunk)?);
        }
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_round_trip() {
        let entry = SectionEntry::new(SectionKind::TypeTree, 64, 1024);
        let parsed = SectionEntry::from_bytes(&entry.to_bytes()).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_directory_round_trip() {
        let mut dir = SectionDirectory::new();
        dir.add(SectionEntry::new(SectionKind::StringPool, 32, 100));
        dir.add(SectionEntry::new(SectionKind::TypeTree, 136, 200));

        let parsed = SectionDirectory::from_bytes(&dir.to_bytes()).unwrap();
        assert_eq!(parsed.count(), 2);
        assert_eq!(
            parsed.find(SectionKind::TypeTree).unwrap().offset,
            136
        );
        assert!(parsed.find(SectionKind::BodyData).is_none());
    }

    #[test]
    fn test_invalid_kind() {
        let mut bytes = SectionEntry::new(SectionKind::BodyData, 0, 0).to_bytes();
        bytes[0] = 0x7F;
        assert_eq!(
            SectionEntry::from_bytes(&bytes),
            Err(SectionError::InvalidKind(0x7F))
        );
    }
}
