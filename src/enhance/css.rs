//! Default CSS generator: utility classes resolved from a rule table
//!
//! Configuration (the component's plugin entry):
//!
//! ```toml
//! [plugins.utility-css]
//! preflight = "*, ::before, ::after { box-sizing: border-box; }"
//! defaults = true          # include the built-in utilities (default)
//!
//! [plugins.utility-css.rules]
//! card = "padding: 1rem; border-radius: 0.5rem"
//! ```

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::markup;

use super::{CssGenerator, PluginError};

/// Built-in utilities available to every component that enables the plugin
const DEFAULT_UTILITIES: &str = r##"
[rules]
# Display
block = "display: block"
inline-block = "display: inline-block"
hidden = "display: none"
flex = "display: flex"
grid = "display: grid"

# Flexbox
flex-col = "flex-direction: column"
flex-row = "flex-direction: row"
items-center = "align-items: center"
justify-center = "justify-content: center"
justify-between = "justify-content: space-between"
gap-2 = "gap: 0.5rem"
gap-4 = "gap: 1rem"

# Spacing
p-2 = "padding: 0.5rem"
p-4 = "padding: 1rem"
m-0 = "margin: 0"
mx-auto = "margin-left: auto; margin-right: auto"

# Typography
font-bold = "font-weight: 700"
text-center = "text-align: center"
text-sm = "font-size: 0.875rem"
text-lg = "font-size: 1.125rem"

# Sizing
w-full = "width: 100%"
h-full = "height: 100%"
"##;

#[derive(Deserialize)]
struct UtilityTable {
    #[serde(default)]
    rules: BTreeMap<String, String>,
}

/// Plugin configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
struct UtilityConfig {
    preflight: Option<String>,
    defaults: bool,
    rules: BTreeMap<String, String>,
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            preflight: None,
            defaults: true,
            rules: BTreeMap::new(),
        }
    }
}

/// Emits one rule per class used in the markup that has a known declaration
/// list. Rules appear in first-use order; unknown classes are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct UtilityCssGenerator;

impl UtilityCssGenerator {
    pub fn new() -> Self {
        Self
    }

    fn rule_table(config: &Value) -> Result<UtilityConfig, PluginError> {
        let mut parsed: UtilityConfig = match config {
            Value::Null | Value::Bool(true) => UtilityConfig::default(),
            other => serde_json::from_value(other.clone())
                .map_err(|e| PluginError::CssGeneration(format!("invalid configuration: {}", e)))?,
        };
        if parsed.defaults {
            let builtin: UtilityTable = toml::from_str(DEFAULT_UTILITIES)
                .map_err(|e| PluginError::CssGeneration(e.to_string()))?;
            for (class, decls) in builtin.rules {
                parsed.rules.entry(class).or_insert(decls);
            }
        }
        Ok(parsed)
    }
}

#[async_trait]
impl CssGenerator for UtilityCssGenerator {
    async fn generate(&self, markup_text: &str, config: &Value) -> Result<String, PluginError> {
        let table = Self::rule_table(config)?;
        let doc = markup::parse(markup_text)
            .map_err(|e| PluginError::CssGeneration(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut css = String::new();
        if let Some(preflight) = table.preflight.as_deref().filter(|p| !p.trim().is_empty()) {
            css.push_str(preflight.trim());
            css.push('\n');
        }

        for id in doc.descendants(doc.root()) {
            let Some(classes) = doc.element(id).and_then(|el| el.attr("class")) else {
                continue;
            };
            for class in classes.split_whitespace() {
                if !seen.insert(class.to_string()) {
                    continue;
                }
                if let Some(decls) = table.rules.get(class) {
                    css.push_str(&format!(".{} {{ {} }}\n", escape_class(class), decls.trim()));
                }
            }
        }

        Ok(css)
    }
}

/// Escape a class name for use in a selector
fn escape_class(class: &str) -> String {
    let mut out = String::with_capacity(class.len());
    for ch in class.chars() {
        if !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
