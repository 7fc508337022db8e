//! Component Forge - server-side HTML component composition
//!
//! Components are markup templates with a settings manifest (default data,
//! imported child components, plugin configuration, conditional overrides)
//! and an optional enhancement script. Rendering a component binds data into
//! its template through directives, expands imported components recursively
//! with slot projection, lifts head assets into one document head, and
//! memoizes every render by a fingerprint of its inputs.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use component_forge::{render, ComponentDefinition, MemorySource};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let source = MemorySource::new()
//!     .with_component("page", ComponentDefinition::new(r#"<main><my-button>Click</my-button></main>"#)
//!         .with_import("my-button", "button"))
//!     .with_component("button", ComponentDefinition::new("<button><slot></slot></button>"));
//!
//! let html = render(Arc::new(source), "page", None).await.unwrap();
//! assert_eq!(html, "<main><button>Click</button></main>");
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod directives;
pub mod enhance;
pub mod error;
pub mod fingerprint;
pub mod head;
pub mod imports;
pub mod manifest;
pub mod markup;
pub mod renderer;
pub mod source;
pub mod value;

pub use cache::{LoadCache, RenderCache};
pub use config::{ConfigError, RenderConfig};
pub use enhance::{
    CommentStrippingCompiler, CssGenerator, PluginError, ScriptCompiler, UtilityCssGenerator,
};
pub use error::MarkupError;
pub use fingerprint::{Fingerprint, RenderMode};
pub use manifest::{ComponentDefinition, ComponentSettings, ImportTable, ManifestError};
pub use renderer::{RenderSession, Rendered, Renderer};
pub use source::{ComponentSource, FileSystemSource, LoadOptions, MemorySource, SourceError};
pub use value::DataMap;

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// Component missing, unreadable, or with a malformed manifest
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Template or generated markup could not be parsed
    #[error("markup error in {component}: {source}")]
    Markup {
        component: String,
        #[source]
        source: MarkupError,
    },

    /// A component imports itself, directly or through other components
    #[error("cyclic import: {}", chain.join(" -> "))]
    CyclicImport { chain: Vec<String> },

    /// Imports nest deeper than the configured limit
    #[error("import depth limit of {limit} exceeded at {uri}")]
    DepthExceeded { uri: String, limit: usize },

    /// A bound attribute on an import instance holds malformed JSON
    #[error("invalid payload in attribute '{attribute}' of {component}: {message}")]
    InvalidPayload {
        component: String,
        attribute: String,
        message: String,
    },
}

/// Render a component with default configuration
pub async fn render(
    source: Arc<dyn ComponentSource>,
    uri: &str,
    data: Option<DataMap>,
) -> Result<String, RenderError> {
    render_with_config(source, uri, data, RenderConfig::default()).await
}

/// Render a component with custom configuration
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use component_forge::{render_with_config, ComponentDefinition, MemorySource, RenderConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let source = MemorySource::new()
///     .with_component("hello", ComponentDefinition::new(r#"<p use-if="name">Hi</p>"#));
/// let config = RenderConfig::new().with_render_cache(false);
///
/// let html = render_with_config(Arc::new(source), "hello", None, config).await.unwrap();
/// assert_eq!(html, "");
/// # }
/// ```
pub async fn render_with_config(
    source: Arc<dyn ComponentSource>,
    uri: &str,
    data: Option<DataMap>,
    config: RenderConfig,
) -> Result<String, RenderError> {
    Renderer::new(source)
        .with_config(config)
        .render(uri, data)
        .await
}
