use crate::annotations::Extension;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const PREFIX: &str = "x-";

/// Turns declared extensions into `x-` prefixed vendor extension entries.
///
/// An unnamed extension contributes one entry per property; a named one
/// contributes a single object keyed by its name. Properties without a name
/// are ignored.
pub fn parse_extensions(extensions: &[Extension]) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();

    for extension in extensions {
        let name = extension.name.trim();
        let properties = extension.properties.iter().filter(|p| !p.name.trim().is_empty());

        if name.is_empty() {
            for property in properties {
                out.insert(prefixed(&property.name), Value::String(property.value.clone()));
            }
        } else {
            let mut object = Map::new();
            for property in properties {
                object.insert(property.name.trim().to_string(), Value::String(property.value.clone()));
            }
            if !object.is_empty() {
                out.insert(prefixed(name), Value::Object(object));
            }
        }
    }

    out
}

fn prefixed(name: &str) -> String {
    let name = name.trim();
    if name.starts_with(PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", PREFIX, name)
    }
}
