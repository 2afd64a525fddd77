//! Markers
//!
//! A marker is a compile-time annotation attached to a type, field, or
//! method declaration: a stable name plus an ordered list of constant
//! arguments. The weaving engine never interprets markers itself; weavers
//! registered for a marker name do.

use std::fmt;

/// A compile-time-constant marker argument.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerArg {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl MarkerArg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MarkerArg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MarkerArg::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MarkerArg::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for MarkerArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerArg::Str(s) => write!(f, "\"{}\"", s),
            MarkerArg::Int(v) => write!(f, "{}", v),
            MarkerArg::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// A marker attached to a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: String,
    pub args: Vec<MarkerArg>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<MarkerArg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// String argument at position `idx`, if present and a string.
    pub fn str_arg(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).and_then(|a| a.as_str())
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
