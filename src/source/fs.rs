//! Component directories on disk
//!
//! A component URI names a directory below the base directory:
//!
//! ```text
//! components/card/
//!     component.toml   (or component.json)  optional settings
//!     template.html                         required markup
//!     script.js                             optional enhancement
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::LoadCache;
use crate::manifest::{ComponentDefinition, ComponentSettings};

use super::{ComponentSource, LoadOptions, SourceError};

const TOML_MANIFEST: &str = "component.toml";
const JSON_MANIFEST: &str = "component.json";
const TEMPLATE_FILE: &str = "template.html";
const SCRIPT_FILE: &str = "script.js";

/// Loads components from directories, backed by a [`LoadCache`]
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    base_path: PathBuf,
    cache: Arc<LoadCache>,
}

impl FileSystemSource {
    /// Create a source rooted at a base directory with its own load cache
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            cache: Arc::new(LoadCache::new()),
        }
    }

    /// Share an existing load cache
    pub fn with_cache(mut self, cache: Arc<LoadCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<LoadCache> {
        &self.cache
    }

    /// Directory a URI resolves to under the given options
    pub fn resolve_path(&self, uri: &str, options: &LoadOptions) -> PathBuf {
        let base = options
            .base_directory_override
            .as_deref()
            .unwrap_or(self.base_path.as_path());
        base.join(uri.trim_start_matches('/'))
    }

    async fn read_definition(&self, uri: &str, dir: &Path) -> Result<ComponentDefinition, SourceError> {
        let template = match read_optional(&dir.join(TEMPLATE_FILE)).await? {
            Some(template) => template,
            None => {
                return Err(SourceError::NotFound {
                    uri: uri.to_string(),
                })
            }
        };

        let settings = if let Some(content) = read_optional(&dir.join(TOML_MANIFEST)).await? {
            ComponentSettings::from_toml_str(&content).map_err(|source| SourceError::Parse {
                path: dir.join(TOML_MANIFEST).display().to_string(),
                source,
            })?
        } else if let Some(content) = read_optional(&dir.join(JSON_MANIFEST)).await? {
            ComponentSettings::from_json_str(&content).map_err(|source| SourceError::Parse {
                path: dir.join(JSON_MANIFEST).display().to_string(),
                source,
            })?
        } else {
            ComponentSettings::default()
        };

        let script = read_optional(&dir.join(SCRIPT_FILE)).await?;

        Ok(ComponentDefinition {
            settings,
            template,
            script,
        })
    }
}

/// Read a file, mapping "not found" to `None`
async fn read_optional(path: &Path) -> Result<Option<String>, SourceError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[async_trait]
impl ComponentSource for FileSystemSource {
    async fn load(
        &self,
        uri: &str,
        options: &LoadOptions,
    ) -> Result<Arc<ComponentDefinition>, SourceError> {
        let dir = self.resolve_path(uri, options);
        let key = dir.display().to_string();

        if options.caching_enabled {
            if let Some(cached) = self.cache.get(&key) {
                debug!(uri, "load cache hit");
                return Ok(cached);
            }
        }

        debug!(uri, path = %key, "loading component");
        let definition = self.read_definition(uri, &dir).await?;

        if options.caching_enabled {
            Ok(self.cache.insert(&key, definition))
        } else {
            Ok(Arc::new(definition))
        }
    }
}
