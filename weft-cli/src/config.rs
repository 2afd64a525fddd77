//! CLI logging configuration
//!
//! Per-subsystem levels with a global fallback; the subsystem names
//! mirror the tracing targets used across the engine crates.

use tracing::Level;

/// CLI log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub resolver: Option<Level>,
    pub scanner: Option<Level>,
    pub weaver: Option<Level>,
    pub writer: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            resolver: None,
            scanner: None,
            weaver: None,
            writer: None,
        }
    }
}

impl LogConfig {
    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Level {
        match target {
            "weft::resolver" => self.resolver.unwrap_or(self.global),
            "weft::scanner" => self.scanner.unwrap_or(self.global),
            "weft::weaver" => self.weaver.unwrap_or(self.global),
            "weft::writer" => self.writer.unwrap_or(self.global),
            _ => self.global,
        }
    }
}
