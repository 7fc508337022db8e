//! Component sources
//!
//! A component source resolves a component URI to its definition: settings,
//! template markup and an optional enhancement script. The renderer only
//! talks to sources through [`ComponentSource`].

mod fs;
mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::manifest::{ComponentDefinition, ManifestError};

pub use fs::FileSystemSource;
pub use memory::MemorySource;

/// Errors that can occur while loading a component
#[derive(Debug, Error)]
pub enum SourceError {
    /// Manifest or template missing
    #[error("component not found: {uri}")]
    NotFound { uri: String },

    /// Component files exist but could not be read
    #[error("error reading component file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is malformed
    #[error("malformed manifest {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ManifestError,
    },
}

/// Options passed to a source on every load
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoadOptions {
    /// Resolve URIs against this directory instead of the source's own base
    pub base_directory_override: Option<PathBuf>,
    /// Serve repeated loads from the load cache
    pub caching_enabled: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            base_directory_override: None,
            caching_enabled: true,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_directory_override = Some(dir.into());
        self
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }
}

/// Resolves component URIs to definitions
#[async_trait]
pub trait ComponentSource: Send + Sync {
    async fn load(
        &self,
        uri: &str,
        options: &LoadOptions,
    ) -> Result<Arc<ComponentDefinition>, SourceError>;
}
