//! Content fingerprints for render caching

use std::fmt;

use sha2::{Digest, Sha256};

use crate::value::DataMap;

/// Hex SHA-256 digest over everything a render's output depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an existing hex digest
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a render is the caller-initiated root or a descendant of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Root,
    Descendant,
}

/// Fingerprint a render's inputs
///
/// Each field is length-prefixed so distinct inputs never concatenate to the
/// same byte stream, and an absent script hashes differently from an empty one.
pub fn fingerprint(
    data: &DataMap,
    template: &str,
    script: Option<&str>,
    mode: RenderMode,
) -> Fingerprint {
    let serialized = serde_json::to_string(data).unwrap_or_default();
    let mut hasher = Sha256::new();
    update_field(&mut hasher, serialized.as_bytes());
    update_field(&mut hasher, template.as_bytes());
    match script {
        Some(source) => {
            hasher.update([1u8]);
            update_field(&mut hasher, source.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update(match mode {
        RenderMode::Root => [b'r'],
        RenderMode::Descendant => [b'd'],
    });
    Fingerprint(format!("{:x}", hasher.finalize()))
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Hex digest of arbitrary text
pub fn digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Stable identifier for a component URI, usable in element ids and script keys
pub fn component_id(uri: &str) -> String {
    digest(uri)[..12].to_string()
}
