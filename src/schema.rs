//! Swagger 2.0 schema nodes and the post-processing rules applied to them.

use crate::types::PrimitiveType;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

/// Prefix used when rendering a reference to a named model.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// A structural description of a value's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Primitive {
        kind: PrimitiveType,
        /// Overrides the kind's default format when set.
        format: Option<String>,
    },
    Array {
        items: Box<Schema>,
        unique_items: bool,
    },
    Map {
        values: Box<Schema>,
    },
    /// Reference to a named model, or a verbatim JSON reference.
    Ref(String),
}

impl Schema {
    pub fn primitive(kind: PrimitiveType) -> Self {
        Schema::Primitive { kind, format: None }
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveType::String)
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
            unique_items: false,
        }
    }

    pub fn set(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
            unique_items: true,
        }
    }

    pub fn map(values: Schema) -> Self {
        Schema::Map {
            values: Box::new(values),
        }
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Schema::Ref(target.into())
    }

    /// Replaces the format of a primitive schema; other shapes are returned as is.
    pub fn with_format(self, new_format: &str) -> Self {
        match self {
            Schema::Primitive { kind, .. } => Schema::Primitive {
                kind,
                format: Some(new_format.to_string()),
            },
            other => other,
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Schema::Ref(_))
    }

    /// The rendered `$ref` value for a reference target.
    ///
    /// Bare model names point into `#/definitions/`; anything that already
    /// looks like a JSON reference or a URL is kept verbatim.
    pub fn ref_path(target: &str) -> String {
        if target.starts_with('#') || target.contains('/') || target.contains(':') {
            target.to_string()
        } else {
            format!("{}{}", DEFINITIONS_PREFIX, target)
        }
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Schema::Primitive { kind, format } => {
                map.serialize_entry("type", kind.type_name())?;
                let format = format.as_deref().or(kind.default_format());
                if let Some(format) = format {
                    map.serialize_entry("format", format)?;
                }
            }
            Schema::Array { items, unique_items } => {
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
                if *unique_items {
                    map.serialize_entry("uniqueItems", &true)?;
                }
            }
            Schema::Map { values } => {
                map.serialize_entry("type", "object")?;
                map.serialize_entry("additionalProperties", values)?;
            }
            Schema::Ref(target) => {
                map.serialize_entry("$ref", &Schema::ref_path(target))?;
            }
        }
        map.end()
    }
}

/// A named model registered in the document's definitions table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    #[serde(rename = "type")]
    pub model_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl Model {
    pub fn object(properties: BTreeMap<String, Schema>, required: Vec<String>) -> Self {
        Self {
            model_type: "object".to_string(),
            description: None,
            required,
            properties,
            enum_values: Vec::new(),
        }
    }

    pub fn enumeration(values: Vec<String>) -> Self {
        Self {
            model_type: "string".to_string(),
            description: None,
            required: Vec::new(),
            properties: BTreeMap::new(),
            enum_values: values,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// Container keywords accepted by response declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    List,
    Array,
    Map,
    Set,
}

impl Container {
    pub const ALL: &'static [Container] = &[Container::List, Container::Array, Container::Map, Container::Set];

    /// Headers may only be wrapped as sequences.
    pub const SEQUENCES: &'static [Container] = &[Container::Array, Container::List, Container::Set];

    pub fn keyword(&self) -> &'static str {
        match self {
            Container::List => "list",
            Container::Array => "array",
            Container::Map => "map",
            Container::Set => "set",
        }
    }

    pub fn parse(keyword: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.keyword().eq_ignore_ascii_case(keyword.trim()))
    }

    fn wrap(&self, schema: Schema) -> Schema {
        match self {
            Container::List | Container::Array => Schema::array(schema),
            Container::Map => Schema::map(schema),
            Container::Set => Schema::set(schema),
        }
    }
}

/// Wraps `schema` according to a container keyword, restricted to `allowed`.
///
/// Unknown, empty or disallowed keywords leave the schema untouched.
pub fn wrap_container(keyword: &str, schema: Schema, allowed: &[Container]) -> Schema {
    match Container::parse(keyword) {
        Some(container) if allowed.contains(&container) => container.wrap(schema),
        _ => schema,
    }
}

/// Flattens a schema so it can describe a path, query, header or form value.
///
/// References become strings, and arrays keep structured items only at the
/// outermost level.
pub fn enforce_primitive(schema: Schema, level: usize) -> Schema {
    match schema {
        Schema::Ref(_) => Schema::string(),
        Schema::Array { .. } if level > 0 => Schema::string(),
        Schema::Array { items, unique_items } => Schema::Array {
            items: Box::new(enforce_primitive(*items, level + 1)),
            unique_items,
        },
        other => other,
    }
}

/// Collapses arrays nested directly inside an array to strings. References
/// are kept, so response models stay linked.
pub fn collapse_nested_arrays(schema: Schema) -> Schema {
    match schema {
        Schema::Array { items, unique_items } => {
            let items = match *items {
                Schema::Array { .. } => Schema::string(),
                other => other,
            };
            Schema::Array {
                items: Box::new(items),
                unique_items,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrap_list_yields_array_of_string() {
        let wrapped = wrap_container("list", Schema::string(), Container::ALL);
        assert_eq!(wrapped, Schema::array(Schema::string()));
    }

    #[test]
    fn test_wrap_set_is_unique_array() {
        let wrapped = wrap_container("Set", Schema::string(), Container::ALL);
        match wrapped {
            Schema::Array { items, unique_items } => {
                assert!(unique_items);
                assert_eq!(*items, Schema::string());
            }
            other => panic!("Expected array schema, got {:?}", other),
        }
    }

    #[test]
    fn test_wrap_map_and_unknown() {
        assert_eq!(
            wrap_container("MAP", Schema::reference("User"), Container::ALL),
            Schema::map(Schema::reference("User"))
        );
        assert_eq!(
            wrap_container("queue", Schema::string(), Container::ALL),
            Schema::string()
        );
        assert_eq!(wrap_container("", Schema::string(), Container::ALL), Schema::string());
    }

    #[test]
    fn test_wrap_respects_allowed_set() {
        let wrapped = wrap_container("map", Schema::string(), Container::SEQUENCES);
        assert_eq!(wrapped, Schema::string());

        let wrapped = wrap_container("array", Schema::string(), Container::SEQUENCES);
        assert_eq!(wrapped, Schema::array(Schema::string()));
    }

    #[test]
    fn test_enforce_primitive_flattens_refs() {
        assert_eq!(enforce_primitive(Schema::reference("User"), 0), Schema::string());
        assert_eq!(
            enforce_primitive(Schema::array(Schema::reference("User")), 0),
            Schema::array(Schema::string())
        );
    }

    #[test]
    fn test_enforce_primitive_collapses_nested_arrays() {
        let nested = Schema::array(Schema::array(Schema::primitive(PrimitiveType::Integer)));
        assert_eq!(enforce_primitive(nested, 0), Schema::array(Schema::string()));
    }

    #[test]
    fn test_enforce_primitive_keeps_scalars_and_maps() {
        let long = Schema::primitive(PrimitiveType::Long);
        assert_eq!(enforce_primitive(long.clone(), 0), long);

        let map = Schema::map(Schema::string());
        assert_eq!(enforce_primitive(map.clone(), 0), map);
    }

    #[test]
    fn test_collapse_nested_arrays_keeps_refs() {
        let nested = Schema::array(Schema::array(Schema::reference("Settlement")));
        assert_eq!(collapse_nested_arrays(nested), Schema::array(Schema::string()));

        let flat = Schema::array(Schema::reference("Settlement"));
        assert_eq!(collapse_nested_arrays(flat.clone()), flat);
        assert_eq!(
            collapse_nested_arrays(Schema::reference("Settlement")),
            Schema::reference("Settlement")
        );
    }

    #[test]
    fn test_serialize_shapes() {
        let value = serde_json::to_value(Schema::set(Schema::reference("Settlement"))).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "array",
                "items": { "$ref": "#/definitions/Settlement" },
                "uniqueItems": true
            })
        );

        let value = serde_json::to_value(Schema::map(Schema::primitive(PrimitiveType::Long))).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "object",
                "additionalProperties": { "type": "integer", "format": "int64" }
            })
        );
    }

    #[test]
    fn test_serialize_format_override() {
        let schema = Schema::string().with_format("password");
        let value = serde_json::to_value(schema).unwrap();
        assert_eq!(value, json!({ "type": "string", "format": "password" }));
    }

    #[test]
    fn test_ref_path_keeps_explicit_references() {
        assert_eq!(Schema::ref_path("User"), "#/definitions/User");
        assert_eq!(Schema::ref_path("#/definitions/User"), "#/definitions/User");
        assert_eq!(
            Schema::ref_path("http://example.com/schemas/user.json"),
            "http://example.com/schemas/user.json"
        );
    }

    #[test]
    fn test_model_serialization_skips_empty_parts() {
        let model = Model::enumeration(vec!["Active".to_string(), "Closed".to_string()]);
        let value = serde_json::to_value(model).unwrap();
        assert_eq!(value, json!({ "type": "string", "enum": ["Active", "Closed"] }));
    }
}
