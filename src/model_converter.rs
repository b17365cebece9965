//! Structural conversion from type references to schemas and named models.
//!
//! The builder never inspects model sources itself; it asks a
//! [`ModelConverter`] for a schema shape and for the models reachable from a
//! type. [`SourceModelConverter`] answers from Rust sources parsed with `syn`.

use crate::schema::{Model, Schema};
use crate::type_resolver::{ResolvedType, TypeKind, TypeResolver};
use crate::types::{PrimitiveType, TypeRef};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Converts type references into schema nodes and model definitions.
pub trait ModelConverter {
    /// Resolves a bare type name (possibly qualified) to a named type.
    fn lookup(&mut self, name: &str) -> Option<TypeRef>;

    /// The schema shape for `ty`, or `None` when the type cannot be described.
    fn read_as_schema(&mut self, ty: &TypeRef) -> Option<Schema>;

    /// Every named model reachable from `ty`, keyed by model name.
    fn read_all(&mut self, ty: &TypeRef) -> BTreeMap<String, Model>;
}

/// Model converter backed by a [`TypeResolver`].
pub struct SourceModelConverter {
    resolver: TypeResolver,
}

impl SourceModelConverter {
    pub fn new(resolver: TypeResolver) -> Self {
        Self { resolver }
    }

    fn schema_of(&mut self, ty: &TypeRef) -> Option<Schema> {
        match ty {
            TypeRef::Void => None,
            TypeRef::Primitive(p) | TypeRef::OptionalPrimitive(p) => Some(Schema::primitive(*p)),
            TypeRef::Array(inner) => self.schema_of(inner).map(Schema::array),
            TypeRef::Set(inner) => self.schema_of(inner).map(Schema::set),
            TypeRef::Map(inner) => self.schema_of(inner).map(Schema::map),
            TypeRef::Named(name) => match self.resolver.resolve_type(name) {
                Some(resolved) => Some(Schema::reference(resolved.name)),
                None => PrimitiveType::from_swagger_name(name).map(Schema::primitive),
            },
        }
    }

    /// Schema of a model property; undescribable field types become `object`.
    fn property_schema(&mut self, owner: &str, field: &str, ty: Option<&TypeRef>) -> Schema {
        match ty.and_then(|ty| self.schema_of(ty)) {
            Some(schema) => schema,
            None => {
                debug!("Field {}.{} has no known schema, using object", owner, field);
                Schema::primitive(PrimitiveType::Object)
            }
        }
    }

    fn to_model(&mut self, resolved: &ResolvedType) -> Model {
        let model = match &resolved.kind {
            TypeKind::Enum(def) => Model::enumeration(def.variants.clone()),
            TypeKind::Struct(def) => {
                let mut properties = BTreeMap::new();
                let mut required = Vec::new();
                for field in def.fields.iter().filter(|f| !f.serde_attrs.skip) {
                    let wire_name = field.wire_name().to_string();
                    let schema = self.property_schema(&resolved.name, &field.name, field.type_ref.as_ref());
                    if !field.optional {
                        required.push(wire_name.clone());
                    }
                    properties.insert(wire_name, schema);
                }
                Model::object(properties, required)
            }
        };
        model.with_description(resolved.description.clone())
    }

    /// Models are inserted before their fields are visited, which stops cycles.
    fn collect(&mut self, ty: &TypeRef, models: &mut BTreeMap<String, Model>) {
        match ty {
            TypeRef::Array(inner) | TypeRef::Set(inner) | TypeRef::Map(inner) => self.collect(inner, models),
            TypeRef::Named(name) => {
                let Some(resolved) = self.resolver.resolve_type(name) else {
                    debug!("No model source for {}", name);
                    return;
                };
                if models.contains_key(&resolved.name) {
                    return;
                }

                let model = self.to_model(&resolved);
                models.insert(resolved.name.clone(), model);

                if let TypeKind::Struct(def) = &resolved.kind {
                    for field in def.fields.iter().filter(|f| !f.serde_attrs.skip) {
                        if let Some(field_ty) = &field.type_ref {
                            self.collect(field_ty, models);
                        }
                    }
                }
            }
            TypeRef::Void | TypeRef::Primitive(_) | TypeRef::OptionalPrimitive(_) => {}
        }
    }
}

impl ModelConverter for SourceModelConverter {
    fn lookup(&mut self, name: &str) -> Option<TypeRef> {
        if let Some(primitive) = PrimitiveType::from_type_name(name) {
            return Some(TypeRef::Primitive(primitive));
        }
        if self.resolver.is_known(name) {
            return Some(TypeRef::named(name.trim()));
        }
        if let Some(primitive) = PrimitiveType::from_swagger_name(name) {
            return Some(TypeRef::Primitive(primitive));
        }
        match name.parse::<TypeRef>() {
            Ok(ty) if !ty.is_void() && self.schema_of(&ty).is_some() => Some(ty),
            _ => {
                warn!("Cannot resolve type name '{}'", name);
                None
            }
        }
    }

    fn read_as_schema(&mut self, ty: &TypeRef) -> Option<Schema> {
        let schema = self.schema_of(ty);
        if schema.is_none() && !ty.is_void() {
            debug!("No schema for type {}", ty);
        }
        schema
    }

    fn read_all(&mut self, ty: &TypeRef) -> BTreeMap<String, Model> {
        let mut models = BTreeMap::new();
        self.collect(ty, &mut models);
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;

    fn converter_for(code: &str) -> SourceModelConverter {
        let parsed = AstParser::parse_source("models.rs", code).unwrap();
        SourceModelConverter::new(TypeResolver::new(vec![parsed]))
    }

    const MODELS: &str = r#"
        /// A completed property sale.
        pub struct Settlement {
            pub settlement_id: String,
            pub purchase_price: Option<f64>,
            pub sellers: Vec<Seller>,
            pub status: SettlementStatus,
        }

        pub struct Seller {
            #[serde(rename = "personalNumber")]
            pub personal_number: String,
            pub previous: Option<Box<Seller>>,
        }

        pub enum SettlementStatus {
            Open,
            Closed,
        }
    "#;

    #[test]
    fn test_read_as_schema_named_and_containers() {
        let mut converter = converter_for(MODELS);

        assert_eq!(
            converter.read_as_schema(&TypeRef::named("Settlement")),
            Some(Schema::reference("Settlement"))
        );
        assert_eq!(
            converter.read_as_schema(&"Vec<models::Settlement>".parse::<TypeRef>().unwrap()),
            Some(Schema::array(Schema::reference("Settlement")))
        );
        assert_eq!(converter.read_as_schema(&TypeRef::Void), None);
        assert_eq!(converter.read_as_schema(&TypeRef::named("Missing")), None);
    }

    #[test]
    fn test_read_all_is_transitive() {
        let mut converter = converter_for(MODELS);
        let models = converter.read_all(&TypeRef::array(TypeRef::named("Settlement")));

        let names: Vec<&String> = models.keys().collect();
        assert_eq!(names, vec!["Seller", "Settlement", "SettlementStatus"]);

        let settlement = &models["Settlement"];
        assert_eq!(settlement.description.as_deref(), Some("A completed property sale."));
        assert_eq!(settlement.required, vec!["settlement_id", "sellers", "status"]);
        assert_eq!(
            settlement.properties["sellers"],
            Schema::array(Schema::reference("Seller"))
        );
        assert_eq!(
            settlement.properties["purchase_price"],
            Schema::primitive(PrimitiveType::Double)
        );

        assert_eq!(models["SettlementStatus"].enum_values, vec!["Open", "Closed"]);
    }

    #[test]
    fn test_read_all_handles_self_reference() {
        let mut converter = converter_for(MODELS);
        let models = converter.read_all(&TypeRef::named("Seller"));

        assert_eq!(models.len(), 1);
        let seller = &models["Seller"];
        assert!(seller.properties.contains_key("personalNumber"));
        assert_eq!(seller.properties["previous"], Schema::reference("Seller"));
        assert_eq!(seller.required, vec!["personalNumber"]);
    }

    #[test]
    fn test_unknown_field_type_becomes_object() {
        let mut converter = converter_for("pub struct Wrapper { pub inner: external::Blob }");
        let models = converter.read_all(&TypeRef::named("Wrapper"));

        assert_eq!(
            models["Wrapper"].properties["inner"],
            Schema::primitive(PrimitiveType::Object)
        );
    }

    #[test]
    fn test_declared_model_wins_over_swagger_keyword() {
        let mut converter = converter_for(
            "pub struct Event { pub on: Date, pub at: datetime }\npub struct Date { pub day: u8 }",
        );
        let models = converter.read_all(&TypeRef::named("Event"));

        assert_eq!(models["Event"].properties["on"], Schema::reference("Date"));
        assert_eq!(
            models["Event"].properties["at"],
            Schema::primitive(PrimitiveType::DateTime)
        );
        assert!(models.contains_key("Date"));
        assert_eq!(converter.lookup("Date"), Some(TypeRef::named("Date")));

        let mut plain = converter_for("");
        assert_eq!(plain.lookup("Date"), Some(TypeRef::Primitive(PrimitiveType::Date)));
        assert_eq!(
            plain.read_as_schema(&TypeRef::named("Object")),
            Some(Schema::primitive(PrimitiveType::Object))
        );
    }

    #[test]
    fn test_lookup() {
        let mut converter = converter_for(MODELS);

        assert_eq!(
            converter.lookup("models.Settlement"),
            Some(TypeRef::named("models.Settlement"))
        );
        assert_eq!(converter.lookup("Long"), Some(TypeRef::Primitive(PrimitiveType::Long)));
        assert_eq!(
            converter.lookup("Vec<Seller>"),
            Some(TypeRef::array(TypeRef::named("Seller")))
        );
        assert_eq!(converter.lookup("models.Unknown"), None);
    }
}
