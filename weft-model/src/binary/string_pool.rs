//! String pool
//!
//! Deduplicated string storage shared by every section. Indices are
//! assigned in first-seen order, which keeps re-encoding a decoded module
//! deterministic.

use super::cursor::{ByteReader, ByteWriter};
use super::DecodeError;
use std::collections::HashMap;

/// Deduplicated string table.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    strings: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string, returning its index. Adding an existing string
    /// returns the original index.
    pub fn add(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    pub fn get(&self, idx: u32) -> Option<&str> {
        self.strings.get(idx as usize).map(|s| s.as_str())
    }

    /// Resolve an index or fail decoding.
    pub fn resolve(&self, idx: u32) -> Result<String, DecodeError> {
        self.get(idx)
            .map(|s| s.to_string())
            .ok_or(DecodeError::BadStringIndex(idx))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.u32(self.strings.len() as u32);
        for s in &self.strings {
            let bytes = s.as_bytes();
            w.u32(bytes.len() as u32);
            w.bytes(bytes);
        }
        w.into_inner()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = ByteReader::new(bytes);
        let count = r.u32()? as usize;
        let mut pool = Self::new();
        for _ in 0..count {
            let len = r.u32()? as usize;
            let raw = r.bytes(len)?;
            let s = std::str::from_utf8(raw).map_err(|_| DecodeError::BadUtf8)?;
            pool.add(s);
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup() {
        let mut pool = StringPool::new();
        let a = pool.add("speak");
        let b = pool.add("on_ready");
        let c = pool.add("speak");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_round_trip() {
        let mut pool = StringPool::new();
        pool.add("demo.Greeter");
        pool.add("");
        pool.add("on_ready");

        let back = StringPool::deserialize(&pool.serialize()).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back.get(0), Some("demo.Greeter"));
        assert_eq!(back.get(1), Some(""));
        assert_eq!(back.get(2), Some("on_ready"));
        assert_eq!(back.get(3), None);
    }

    #[test]
    fn test_resolve_bad_index() {
        let pool = StringPool::new();
        assert!(matches!(
            pool.resolve(9),
            Err(DecodeError::BadStringIndex(9))
        ));
    }
}
