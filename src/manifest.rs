//! Component manifests and loaded component definitions

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::value::DataMap;

/// Errors from parsing a component manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tag name to component URI, matched case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ImportTable {
    entries: Vec<(String, String)>,
}

impl From<Map<String, Value>> for ImportTable {
    fn from(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(tag, target)| {
                let uri = match target {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (tag, uri)
            })
            .collect();
        Self { entries }
    }
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an import
    pub fn insert(&mut self, tag: impl Into<String>, uri: impl Into<String>) {
        let tag = tag.into();
        let uri = uri.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&tag))
        {
            Some(entry) => entry.1 = uri,
            None => self.entries.push((tag, uri)),
        }
    }

    /// Component URI imported under a tag name
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(tag))
            .map(|(_, uri)| uri.as_str())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, u)| (t.as_str(), u.as_str()))
    }
}

/// Settings declared by a component manifest
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComponentSettings {
    /// Default data context
    #[serde(default, deserialize_with = "object_or_empty")]
    pub data: DataMap,

    /// Child components by tag name
    #[serde(default)]
    pub imports: ImportTable,

    /// Plugin configurations by plugin name
    #[serde(default, deserialize_with = "object_or_empty")]
    pub plugins: DataMap,

    /// Condition path to data overrides applied when the condition holds
    #[serde(default)]
    pub when: BTreeMap<String, DataMap>,
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<DataMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => DataMap::new(),
    })
}

impl ComponentSettings {
    /// Parse a TOML manifest
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON manifest
    pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Configuration for a plugin, if the component enables it
    pub fn plugin(&self, name: &str) -> Option<&Value> {
        self.plugins.get(name)
    }
}

/// A loaded component: settings, template source and optional enhancement script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentDefinition {
    pub settings: ComponentSettings,
    pub template: String,
    pub script: Option<String>,
}

impl ComponentDefinition {
    /// Create a definition with empty settings
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            settings: ComponentSettings::default(),
            template: template.into(),
            script: None,
        }
    }

    pub fn with_settings(mut self, settings: ComponentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Add an import entry
    pub fn with_import(mut self, tag: impl Into<String>, uri: impl Into<String>) -> Self {
        self.settings.imports.insert(tag, uri);
        self
    }

    /// Set a default data value
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.data.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_toml_manifest() {
        let settings = ComponentSettings::from_toml_str(
            r#"
[data]
title = "Hello"
count = 3

[imports]
My-Button = "components/button"

[plugins.utility-css]
preflight = ""

[when.dark.style]
color = "white"
"#,
        )
        .expect("Should parse");

        assert_eq!(settings.data.get("title"), Some(&json!("Hello")));
        assert_eq!(settings.imports.get("my-button"), Some("components/button"));
        assert!(settings.plugin("utility-css").is_some());
        assert_eq!(
            settings.when.get("dark").and_then(|o| o.get("style")),
            Some(&json!({"color": "white"}))
        );
    }

    #[test]
    fn test_parse_json_manifest_defaults() {
        let settings = ComponentSettings::from_json_str(r#"{"data": [1, 2], "imports": {"x": 5}}"#)
            .expect("Should parse");
        assert!(settings.data.is_empty());
        assert_eq!(settings.imports.get("X"), Some("5"));
        assert!(settings.when.is_empty());
    }

    #[test]
    fn test_malformed_manifest_is_error() {
        assert!(matches!(
            ComponentSettings::from_json_str("{"),
            Err(ManifestError::Json(_))
        ));
        assert!(matches!(
            ComponentSettings::from_toml_str("data = ["),
            Err(ManifestError::Toml(_))
        ));
    }

    #[test]
    fn test_import_table_replaces_case_insensitively() {
        let mut imports = ImportTable::new();
        imports.insert("Card", "a");
        imports.insert("card", "b");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports.get("CARD"), Some("b"));
    }
}
