//! In-process component registry

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::manifest::ComponentDefinition;

use super::{ComponentSource, LoadOptions, SourceError};

/// Components registered directly in memory
///
/// Load options are ignored. Every load is counted, which lets callers see
/// how often the renderer actually went back to the source.
#[derive(Debug, Default)]
pub struct MemorySource {
    components: DashMap<String, Arc<ComponentDefinition>>,
    loads: DashMap<String, usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component, replacing any previous definition for the URI
    pub fn insert(&self, uri: impl Into<String>, definition: ComponentDefinition) {
        self.components.insert(uri.into(), Arc::new(definition));
    }

    /// Register a component (builder form)
    pub fn with_component(self, uri: impl Into<String>, definition: ComponentDefinition) -> Self {
        self.insert(uri, definition);
        self
    }

    /// How many times a URI has been loaded
    pub fn load_count(&self, uri: &str) -> usize {
        self.loads.get(uri).map_or(0, |count| *count)
    }
}

#[async_trait]
impl ComponentSource for MemorySource {
    async fn load(
        &self,
        uri: &str,
        _options: &LoadOptions,
    ) -> Result<Arc<ComponentDefinition>, SourceError> {
        *self.loads.entry(uri.to_string()).or_insert(0) += 1;
        self.components
            .get(uri)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SourceError::NotFound {
                uri: uri.to_string(),
            })
    }
}
