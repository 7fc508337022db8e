//! Data context assembly

use serde_json::Value;

use crate::manifest::ComponentSettings;
use crate::value::{self, DataMap};

const STYLE_KEY: &str = "style";

/// Build a render's data context
///
/// Starts from a copy of the component's default data, overlays the
/// caller's data, then applies every `when` override whose condition holds.
/// Conditions are all evaluated against the data before any override is
/// applied, so one override never switches another on. A `style` string is
/// expanded to a property map first so style overrides merge per property,
/// and collapsed back to a declaration list at the end.
pub fn merge_data(settings: &ComponentSettings, custom: Option<DataMap>) -> DataMap {
    let mut data = settings.data.clone();
    if let Some(custom) = custom {
        for (key, value) in custom {
            data.insert(key, value);
        }
    }

    if let Some(Value::String(style)) = data.get(STYLE_KEY) {
        let expanded = value::expand_style(style);
        data.insert(STYLE_KEY.to_string(), Value::Object(expanded));
    }

    let active: Vec<&DataMap> = settings
        .when
        .iter()
        .filter(|(condition, _)| value::condition_holds(&data, condition))
        .map(|(_, overrides)| overrides)
        .collect();

    for overrides in active {
        for (key, override_value) in overrides {
            if key == STYLE_KEY {
                merge_style(&mut data, override_value);
            } else {
                data.insert(key.clone(), override_value.clone());
            }
        }
    }

    if let Some(Value::Object(style)) = data.get(STYLE_KEY) {
        let collapsed = value::collapse_style(style);
        data.insert(STYLE_KEY.to_string(), Value::String(collapsed));
    }

    data
}

fn merge_style(data: &mut DataMap, override_value: &Value) {
    let overrides = match override_value {
        Value::String(style) => value::expand_style(style),
        Value::Object(map) => map.clone(),
        other => {
            data.insert(STYLE_KEY.to_string(), other.clone());
            return;
        }
    };
    match data.get_mut(STYLE_KEY) {
        Some(Value::Object(existing)) => {
            for (prop, v) in overrides {
                existing.insert(prop, v);
            }
        }
        _ => {
            data.insert(STYLE_KEY.to_string(), Value::Object(overrides));
        }
    }
}
