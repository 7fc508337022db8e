//! Process-wide caches for loaded components and completed renders
//!
//! Both caches are explicit objects shared by `Arc`, so separate renderers
//! (and separate tests) can use isolated instances. Inserts are
//! insert-if-absent: the first value stored for a key is kept for the life of
//! the cache and later inserts hand back that stored value.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::fingerprint::Fingerprint;
use crate::manifest::ComponentDefinition;
use crate::renderer::Rendered;

/// Loaded component definitions keyed by resolved location
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: DashMap<String, Arc<ComponentDefinition>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<ComponentDefinition>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Store a definition unless one is already cached, returning the cached one
    pub fn insert(&self, key: &str, definition: ComponentDefinition) -> Arc<ComponentDefinition> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(definition));
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Completed renders keyed by component URI, then by input fingerprint
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: DashMap<String, DashMap<Fingerprint, Arc<Rendered>>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &str, fingerprint: &Fingerprint) -> Option<Arc<Rendered>> {
        let by_fingerprint = self.entries.get(uri)?;
        let hit = by_fingerprint
            .get(fingerprint)
            .map(|entry| Arc::clone(entry.value()));
        hit
    }

    /// Store a render unless the fingerprint already has one. Existing
    /// entries are never replaced; the stored entry is returned.
    pub fn insert(&self, uri: &str, fingerprint: Fingerprint, rendered: Rendered) -> Arc<Rendered> {
        let by_fingerprint = self.entries.entry(uri.to_string()).or_default();
        let entry = by_fingerprint.entry(fingerprint).or_insert_with(|| {
            debug!(uri, "storing render");
            Arc::new(rendered)
        });
        let stored = Arc::clone(entry.value());
        stored
    }

    /// Number of cached renders for one component
    pub fn len_for(&self, uri: &str) -> usize {
        self.entries.get(uri).map_or(0, |entries| entries.len())
    }

    /// Total number of cached renders
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entries| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
