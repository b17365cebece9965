use crate::model_converter::ModelConverter;
use crate::schema::{collapse_nested_arrays, enforce_primitive, wrap_container, Container, Model, Schema};
use crate::types::TypeRef;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Maps type references to schema nodes and records the models they reach.
///
/// Structural conversion is delegated to a [`ModelConverter`]; this type only
/// layers the context rules on top: primitive enforcement for parameters and
/// container wrapping for responses and headers.
pub struct TypeSchemaMapper<'a> {
    converter: &'a mut dyn ModelConverter,
}

impl<'a> TypeSchemaMapper<'a> {
    pub fn new(converter: &'a mut dyn ModelConverter) -> Self {
        Self { converter }
    }

    /// Resolves a type name through the converter.
    pub fn lookup(&mut self, name: &str) -> Option<TypeRef> {
        self.converter.lookup(name)
    }

    pub fn to_schema(&mut self, ty: &TypeRef) -> Option<Schema> {
        self.converter.read_as_schema(ty)
    }

    /// Adds every model reachable from `ty` that is not yet registered.
    pub fn register_models(&mut self, ty: &TypeRef, definitions: &mut BTreeMap<String, Model>) {
        for (name, model) in self.converter.read_all(ty) {
            if !definitions.contains_key(&name) {
                debug!("Registering model definition {}", name);
                definitions.insert(name, model);
            }
        }
    }

    /// Schema for a path, query, header or form value.
    ///
    /// Unresolved types fall back to a string.
    pub fn parameter_schema(&mut self, ty: Option<&TypeRef>) -> Schema {
        match ty.and_then(|ty| self.to_schema(ty)) {
            Some(schema) => enforce_primitive(schema, 0),
            None => Schema::string(),
        }
    }

    /// Schema for a response body, wrapped per `container`. Models are
    /// registered as a side effect.
    pub fn response_schema(
        &mut self,
        ty: &TypeRef,
        container: &str,
        definitions: &mut BTreeMap<String, Model>,
    ) -> Option<Schema> {
        let Some(schema) = self.to_schema(ty) else {
            warn!("Cannot describe response type {}", ty);
            return None;
        };
        self.register_models(ty, definitions);
        Some(wrap_container(container, collapse_nested_arrays(schema), Container::ALL))
    }

    /// Schema for a response header; only sequence containers apply.
    pub fn header_schema(
        &mut self,
        ty: &TypeRef,
        container: &str,
        definitions: &mut BTreeMap<String, Model>,
    ) -> Option<Schema> {
        let schema = self.to_schema(ty)?;
        self.register_models(ty, definitions);
        Some(wrap_container(container, schema, Container::SEQUENCES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use crate::model_converter::SourceModelConverter;
    use crate::type_resolver::TypeResolver;
    use crate::types::PrimitiveType;

    fn converter() -> SourceModelConverter {
        let code = r#"
            pub struct Settlement { pub settlement_id: String, pub seller: Seller }
            pub struct Seller { pub name: String }
        "#;
        let parsed = AstParser::parse_source("models.rs", code).unwrap();
        SourceModelConverter::new(TypeResolver::new(vec![parsed]))
    }

    #[test]
    fn test_parameter_schema_never_refs() {
        let mut converter = converter();
        let mut mapper = TypeSchemaMapper::new(&mut converter);

        assert_eq!(
            mapper.parameter_schema(Some(&TypeRef::named("Settlement"))),
            Schema::string()
        );
        assert_eq!(
            mapper.parameter_schema(Some(&TypeRef::array(TypeRef::named("Settlement")))),
            Schema::array(Schema::string())
        );
        assert_eq!(
            mapper.parameter_schema(Some(&TypeRef::OptionalPrimitive(PrimitiveType::Long))),
            Schema::primitive(PrimitiveType::Long)
        );
        assert_eq!(mapper.parameter_schema(None), Schema::string());
        assert_eq!(
            mapper.parameter_schema(Some(&TypeRef::named("Unknown"))),
            Schema::string()
        );
    }

    #[test]
    fn test_response_schema_wraps_and_registers() {
        let mut converter = converter();
        let mut mapper = TypeSchemaMapper::new(&mut converter);
        let mut definitions = BTreeMap::new();

        let schema = mapper
            .response_schema(&TypeRef::named("Settlement"), "List", &mut definitions)
            .unwrap();

        assert_eq!(schema, Schema::array(Schema::reference("Settlement")));
        assert!(definitions.contains_key("Settlement"));
        assert!(definitions.contains_key("Seller"));
    }

    #[test]
    fn test_response_schema_collapses_array_of_array() {
        let mut converter = converter();
        let mut mapper = TypeSchemaMapper::new(&mut converter);
        let mut definitions = BTreeMap::new();

        let ty: TypeRef = "Vec<Vec<i32>>".parse().unwrap();
        let schema = mapper.response_schema(&ty, "", &mut definitions).unwrap();
        assert_eq!(schema, Schema::array(Schema::string()));
    }

    #[test]
    fn test_response_schema_unknown_type() {
        let mut converter = converter();
        let mut mapper = TypeSchemaMapper::new(&mut converter);
        let mut definitions = BTreeMap::new();

        assert!(mapper
            .response_schema(&TypeRef::named("Missing"), "", &mut definitions)
            .is_none());
        assert!(definitions.is_empty());
    }

    #[test]
    fn test_header_schema_rejects_map_container() {
        let mut converter = converter();
        let mut mapper = TypeSchemaMapper::new(&mut converter);
        let mut definitions = BTreeMap::new();
        let string = TypeRef::Primitive(PrimitiveType::String);

        assert_eq!(
            mapper.header_schema(&string, "map", &mut definitions),
            Some(Schema::string())
        );
        assert_eq!(
            mapper.header_schema(&string, "set", &mut definitions),
            Some(Schema::set(Schema::string()))
        );
    }

    #[test]
    fn test_register_models_keeps_existing() {
        let mut converter = converter();
        let mut mapper = TypeSchemaMapper::new(&mut converter);
        let mut definitions = BTreeMap::new();
        definitions.insert("Seller".to_string(), Model::enumeration(vec!["custom".to_string()]));

        mapper.register_models(&TypeRef::named("Settlement"), &mut definitions);

        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions["Seller"].enum_values, vec!["custom"]);
    }
}
