//! Debug symbols
//!
//! Sequence points live in a JSON sidecar next to the module file
//! (`<stem>.wdbg`), loaded when present and rewritten on commit. When a
//! method body is cloned as a shadow, its entry is duplicated under the
//! shadow name so stepping through the moved body keeps working.

use serde::{Deserialize, Serialize};

/// Maps one instruction id to a source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePoint {
    pub instr: u32,
    pub line: u32,
    pub column: u32,
}

/// Sequence points for one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSymbols {
    pub type_name: String,
    pub method: String,
    pub sequence_points: Vec<SequencePoint>,
}

/// The debug-symbol sidecar contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugSymbols {
    pub methods: Vec<MethodSymbols>,
}

impl DebugSymbols {
    pub fn find(&self, type_name: &str, method: &str) -> Option<&MethodSymbols> {
        self.methods
            .iter()
            .find(|m| m.type_name == type_name && m.method == method)
    }

    /// Duplicate a method's entry under a new method name. No-op when the
    /// source entry is absent or the duplicate already exists.
    pub fn clone_method_entry(&mut self, type_name: &str, from: &str, to: &str) {
        if self.find(type_name, to).is_some() {
            return;
        }
        if let Some(entry) = self.find(type_name, from).cloned() {
            self.methods.push(MethodSymbols {
                type_name: entry.type_name,
                method: to.to_string(),
                sequence_points: entry.sequence_points,
            });
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
