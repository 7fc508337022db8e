//! Client-side enhancement and generated styles
//!
//! The renderer treats script compilation and CSS generation as pluggable
//! steps behind [`ScriptCompiler`] and [`CssGenerator`]. Both are allowed to
//! fail; the renderer logs the failure and renders the markup without the
//! script or stylesheet.

mod css;
mod script;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::head::{AssetKey, HeadAsset};
use crate::value::DataMap;

pub use css::UtilityCssGenerator;
pub use script::CommentStrippingCompiler;

/// Errors raised by enhancement plugins
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("script compilation failed: {0}")]
    Transpile(String),

    #[error("stylesheet generation failed: {0}")]
    CssGeneration(String),
}

/// Turns a component's enhancement source into browser-ready script
#[async_trait]
pub trait ScriptCompiler: Send + Sync {
    /// Compile `source`. An empty result means there is nothing to inject.
    async fn compile(&self, source: &str) -> Result<String, PluginError>;
}

/// Generates a stylesheet for the classes used in a document
#[async_trait]
pub trait CssGenerator: Send + Sync {
    async fn generate(&self, markup: &str, config: &Value) -> Result<String, PluginError>;
}

/// Element id of a component's registration script
pub fn registration_id(component_id: &str) -> String {
    format!("component-{}", component_id)
}

/// Script that registers a component's behavior under `window[global][id]`
pub fn registration_script(global: &str, component_id: &str, compiled: &str) -> HeadAsset {
    let id = registration_id(component_id);
    let markup = format!(
        "<script id=\"{id}\">window.{global} = window.{global} || {{}};\nwindow.{global}[\"{component_id}\"] = function (data) {{\n{body}\n}};</script>",
        body = escape_script(compiled.trim_end()),
    );
    HeadAsset::new(AssetKey::Script(id), markup)
}

/// Per-render script that runs the registered behavior with this render's
/// data once the document is parsed
pub fn bootstrap_script(global: &str, component_id: &str, data: &DataMap) -> HeadAsset {
    let json = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
    let markup = format!(
        "<script>document.addEventListener(\"DOMContentLoaded\", function () {{ window.{global}[\"{component_id}\"]({data}); }});</script>",
        data = escape_script(&json),
    );
    HeadAsset::new(AssetKey::Unkeyed, markup)
}

/// Keep script text from closing its own element
fn escape_script(text: &str) -> String {
    text.replace("</", "<\\/")
}
