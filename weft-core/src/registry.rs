//! Marker registry
//!
//! Maps marker names to weaver implementations, one weaver per marker
//! name per category. The registry is built once through an explicit,
//! ordered builder and passed by reference into the orchestrator; there
//! is no discovery step, so registration order is always the builder
//! call order. Duplicate registration policy: first-registered-wins, the
//! later registration is dropped with a warning.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::weavers::{
    DeclarativeFieldWeaver, IdempotentHookWeaver, MethodWrapWeaver, StructuralTypeWeaver, Weaver,
    WeaverCategory,
};

/// Immutable marker-name -> weaver index.
pub struct MarkerRegistry {
    weavers: HashMap<(WeaverCategory, String), Box<dyn Weaver>>,
}

impl MarkerRegistry {
    pub fn builder() -> MarkerRegistryBuilder {
        MarkerRegistryBuilder::default()
    }

    /// Registry holding the four built-in weavers.
    pub fn with_builtin_weavers() -> Self {
        Self::builder()
            .register(Box::new(StructuralTypeWeaver))
            .register(Box::new(DeclarativeFieldWeaver))
            .register(Box::new(MethodWrapWeaver))
            .register(Box::new(IdempotentHookWeaver))
            .build()
    }

    /// Look up the weaver bound to a marker name in one category.
    pub fn find(&self, category: WeaverCategory, marker_name: &str) -> Option<&dyn Weaver> {
        self.weavers
            .get(&(category, marker_name.to_string()))
            .map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.weavers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weavers.is_empty()
    }
}

impl std::fmt::Debug for MarkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerRegistry")
            .field("count", &self.weavers.len())
            .finish()
    }
}

/// Ordered registration of weavers.
#[derive(Default)]
pub struct MarkerRegistryBuilder {
    weavers: HashMap<(WeaverCategory, String), Box<dyn Weaver>>,
}

impl MarkerRegistryBuilder {
    /// Register a weaver under its own marker name and category. A name
    /// already taken in that category keeps its first weaver.
    pub fn register(mut self, weaver: Box<dyn Weaver>) -> Self {
        let key = (weaver.category(), weaver.marker_name().to_string());
        if self.weavers.contains_key(&key) {
            warn!(
                target: "weft::scanner",
                "duplicate weaver registration for {} marker '{}' dropped (first wins)",
                key.0.as_str(),
                key.1
            );
            return self;
        }
        debug!(
            target: "weft::scanner",
            "registered {} weaver for marker '{}'",
            key.0.as_str(),
            key.1
        );
        self.weavers.insert(key, weaver);
        self
    }

    pub fn build(self) -> MarkerRegistry {
        MarkerRegistry {
            weavers: self.weavers,
        }
    }
}
