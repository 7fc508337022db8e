//! Engine configuration
//!
//! Built in code with the `with_*` builders, or loaded from a TOML file:
//!
//! ```toml
//! render-cache-enabled = true
//! max-depth = 32
//! css-plugin = "utility-css"
//! enhancement-global = "__components"
//!
//! [load-options]
//! base-directory-override = "site/components"
//! caching-enabled = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::source::LoadOptions;

/// Errors that can occur when loading an engine configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration for a [`Renderer`](crate::Renderer)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Options passed to the component source on every load
    pub load_options: LoadOptions,

    /// Serve repeated renders with identical inputs from the render cache
    pub render_cache_enabled: bool,

    /// Maximum import nesting below the root render
    pub max_depth: usize,

    /// Plugin key whose presence in a root component's settings enables
    /// stylesheet generation
    pub css_plugin: String,

    /// Window property the enhancement scripts register behaviors under
    pub enhancement_global: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            load_options: LoadOptions::default(),
            render_cache_enabled: true,
            max_depth: 32,
            css_plugin: "utility-css".to_string(),
            enhancement_global: "__components".to_string(),
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the load options
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// Resolve component URIs against a different base directory
    pub fn with_base_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.load_options.base_directory_override = Some(dir.into());
        self
    }

    /// Enable or disable the component load cache
    pub fn with_load_caching(mut self, enabled: bool) -> Self {
        self.load_options.caching_enabled = enabled;
        self
    }

    /// Enable or disable the render cache
    pub fn with_render_cache(mut self, enabled: bool) -> Self {
        self.render_cache_enabled = enabled;
        self
    }

    /// Set the maximum import depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the plugin key that enables stylesheet generation
    pub fn with_css_plugin(mut self, name: impl Into<String>) -> Self {
        self.css_plugin = name.into();
        self
    }

    /// Set the window property used by enhancement scripts
    pub fn with_enhancement_global(mut self, name: impl Into<String>) -> Self {
        self.enhancement_global = name.into();
        self
    }
}
