//! Data context helpers over `serde_json::Value`
//!
//! Component data is loosely typed. Lookups walk dotted paths through maps and
//! lists, and truthiness follows the usual loose rules: `null`, missing,
//! `false`, `0` and `""` are falsy, everything else (including empty lists
//! and maps) is truthy.

use serde_json::{Map, Value};

/// A keyed data context
pub type DataMap = Map<String, Value>;

/// Resolve a dotted path such as `user.address.city` or `items.0.name`
pub fn lookup<'a>(data: &'a DataMap, path: &str) -> Option<&'a Value> {
    let mut segments = path.trim().split('.');
    let first = segments.next().filter(|s| !s.is_empty())?;
    let mut current = data.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Loose truthiness of an optional value
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Evaluate a condition expression: a dotted path with an optional leading `!`
pub fn condition_holds(data: &DataMap, expr: &str) -> bool {
    let expr = expr.trim();
    match expr.strip_prefix('!') {
        Some(path) => !is_truthy(lookup(data, path)),
        None => is_truthy(lookup(data, expr)),
    }
}

/// Render a value as plain text (attribute values, slot text)
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Split an inline style declaration list into a property map
///
/// `"color: red; font-size: 12px"` becomes `{"color": "red", "font-size": "12px"}`.
pub fn expand_style(style: &str) -> DataMap {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(prop, value)| (prop.trim().to_string(), value.trim()))
        .filter(|(prop, value)| !prop.is_empty() && !value.is_empty())
        .map(|(prop, value)| (prop, Value::String(value.to_string())))
        .collect()
}

/// Join a property map back into a declaration list, converting camelCase
/// property names to kebab-case and skipping null values
pub fn collapse_style(style: &DataMap) -> String {
    style
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(prop, value)| format!("{}: {}", kebab_case(prop), to_text(value)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
