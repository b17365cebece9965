//! The annotation manifest: what each handler class and method declares about
//! its API.
//!
//! Handler metadata is not discovered at run time. It is read once from a YAML
//! manifest into plain structs, and the builder reads them through
//! [`AnnotationSource`]. Field names follow the usual Swagger annotation
//! attributes in `snake_case`; type fields hold Rust type strings.
//!
//! ```yaml
//! classes:
//!   - name: controllers.SearchController
//!     api:
//!       value: /apitest/search
//!       tags: [Search]
//!     methods:
//!       - name: search
//!         parameters:
//!           - name: personalNumber
//!             type: String
//!             api_param:
//!               value: A personal number of one of the sellers.
//!         operation:
//!           value: Search for settlement
//!           http_method: GET
//!           response: Settlement
//!           response_container: List
//!         responses:
//!           - code: 400
//!             message: Bad Request
//! ```

use crate::document::{ApiKeyLocation, OAuthFlow};
use crate::error::Result;
use crate::types::TypeRef;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Read-only access to handler class metadata.
pub trait AnnotationSource {
    fn handler_classes(&self) -> &[HandlerClass];

    /// Whether `type_name` names a handler class with an `api` block.
    ///
    /// A qualified name (`controllers::Users`, `controllers.Users`) must match
    /// the trailing segments of the class name; a bare name matches any
    /// package.
    fn is_resource_class(&self, type_name: &str) -> bool {
        let wanted = name_segments(type_name);
        if wanted.is_empty() {
            return false;
        }
        self.handler_classes()
            .iter()
            .filter(|class| class.api.is_some())
            .any(|class| name_segments(&class.name).ends_with(&wanted))
    }
}

fn name_segments(name: &str) -> Vec<&str> {
    name.trim()
        .trim_end_matches('$')
        .split(|c: char| c == '.' || c == ':')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// The deserialised manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiManifest {
    pub classes: Vec<HandlerClass>,
}

impl ApiManifest {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let manifest: ApiManifest = serde_yaml::from_str(content)?;
        debug!("Loaded manifest with {} classes", manifest.classes.len());
        Ok(manifest)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let manifest = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load manifest: {}", path.display()))?;
        Ok(manifest)
    }
}

impl AnnotationSource for ApiManifest {
    fn handler_classes(&self) -> &[HandlerClass] {
        &self.classes
    }
}

/// A handler class (controller).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HandlerClass {
    /// Fully-qualified name; a trailing `$` marks a singleton object.
    pub name: String,
    pub api: Option<Api>,
    pub definition: Option<SwaggerDefinition>,
    pub methods: Vec<HandlerMethod>,
}

impl HandlerClass {
    pub fn is_singleton(&self) -> bool {
        self.name.contains('$')
    }

    /// The name a route bound to `method` is indexed by.
    pub fn full_method_name(&self, method: &str) -> String {
        if self.is_singleton() {
            format!("{}.{}", self.name, method)
        } else {
            format!("{}$.{}", self.name, method)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandlerMethod {
    pub name: String,
    pub public: bool,
    /// Inherited overrides are not documented twice.
    pub overridden: bool,
    pub deprecated: bool,
    pub parameters: Vec<MethodParameter>,
    pub return_type: TypeRef,
    pub operation: Option<ApiOperation>,
    pub responses: Vec<ApiResponse>,
    pub implicit_params: Vec<ApiImplicitParam>,
}

impl Default for HandlerMethod {
    fn default() -> Self {
        Self {
            name: String::new(),
            public: true,
            overridden: false,
            deprecated: false,
            parameters: Vec::new(),
            return_type: TypeRef::Void,
            operation: None,
            responses: Vec::new(),
            implicit_params: Vec::new(),
        }
    }
}

/// A declared handler method argument.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MethodParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub api_param: Option<ApiParam>,
}

/// Class-level API declaration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Api {
    pub value: String,
    pub description: String,
    pub tags: Vec<String>,
    pub produces: String,
    pub consumes: String,
    pub protocols: String,
    pub authorizations: Vec<Authorization>,
    pub hidden: bool,
}

impl Api {
    /// Explicit tags, or the path value with slashes removed.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.iter().filter(|t| !t.is_empty()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        if tags.is_empty() {
            let derived = self.value.replace('/', "");
            if !derived.is_empty() {
                tags.push(derived);
            }
        }
        tags
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Authorization {
    pub value: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiOperation {
    pub value: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub response: TypeRef,
    pub response_container: String,
    pub response_reference: String,
    pub http_method: String,
    pub nickname: String,
    pub produces: String,
    pub consumes: String,
    pub protocols: String,
    pub authorizations: Vec<Authorization>,
    pub hidden: bool,
    pub response_headers: Vec<ResponseHeader>,
    pub code: u16,
    pub extensions: Vec<Extension>,
}

impl Default for ApiOperation {
    fn default() -> Self {
        Self {
            value: String::new(),
            notes: String::new(),
            tags: Vec::new(),
            response: TypeRef::Void,
            response_container: String::new(),
            response_reference: String::new(),
            http_method: String::new(),
            nickname: String::new(),
            produces: String::new(),
            consumes: String::new(),
            protocols: String::new(),
            authorizations: Vec::new(),
            hidden: false,
            response_headers: Vec::new(),
            code: 200,
            extensions: Vec::new(),
        }
    }
}

/// One entry of a method's response list. Code `0` is the default response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    pub code: u16,
    pub message: String,
    pub response: TypeRef,
    pub reference: String,
    pub response_container: String,
    pub response_headers: Vec<ResponseHeader>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseHeader {
    pub name: String,
    pub description: String,
    pub response: TypeRef,
    pub response_container: String,
}

/// Refinements shared by `ApiParam` and `ApiImplicitParam`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParamDetails {
    /// Parameter description.
    pub value: String,
    pub default_value: String,
    /// `a,b,c`, `range[1,10]` or `range(0,infinity]`.
    pub allowable_values: String,
    pub required: bool,
    pub allow_multiple: bool,
    pub hidden: bool,
    pub example: String,
    pub format: String,
    pub pattern: String,
    pub allow_empty_value: bool,
    pub collection_format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiParam {
    pub name: String,
    #[serde(flatten)]
    pub details: ParamDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiImplicitParam {
    pub name: String,
    pub param_type: ParamKind,
    pub data_type: String,
    pub data_type_class: TypeRef,
    #[serde(flatten)]
    pub details: ParamDetails,
}

/// Where an implicit parameter lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ParamKind {
    Path,
    Query,
    Form,
    Header,
    /// Declared but not describable as a simple parameter.
    Body,
    Unknown(String),
}

impl Default for ParamKind {
    fn default() -> Self {
        ParamKind::Unknown(String::new())
    }
}

impl From<String> for ParamKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "path" => ParamKind::Path,
            "query" => ParamKind::Query,
            "form" | "formdata" => ParamKind::Form,
            "header" => ParamKind::Header,
            "body" => ParamKind::Body,
            _ => ParamKind::Unknown(value),
        }
    }
}

/// A vendor extension: `x-<name>` with nested properties, or one `x-<prop>`
/// per property when unnamed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Extension {
    pub name: String,
    pub properties: Vec<ExtensionProperty>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtensionProperty {
    pub name: String,
    pub value: String,
}

/// Global document metadata declared on one handler class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SwaggerDefinition {
    pub host: String,
    pub base_path: String,
    pub info: InfoDefinition,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    /// `http`, `https`, `ws`, `wss`; `default` entries are ignored.
    pub schemes: Vec<String>,
    pub tags: Vec<TagDefinition>,
    pub external_docs: ExternalDocsDefinition,
    pub security_definition: SecurityDefinitions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InfoDefinition {
    pub title: String,
    pub version: String,
    pub description: String,
    pub terms_of_service: String,
    pub contact: ContactDefinition,
    pub license: LicenseDefinition,
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactDefinition {
    pub name: String,
    pub url: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LicenseDefinition {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagDefinition {
    pub name: String,
    pub description: String,
    pub external_docs: ExternalDocsDefinition,
    pub extensions: Vec<Extension>,
}

/// `value` is the description, `url` the link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExternalDocsDefinition {
    pub value: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityDefinitions {
    pub api_key_auth_definitions: Vec<ApiKeyAuthDefinition>,
    pub basic_auth_definitions: Vec<BasicAuthDefinition>,
    pub oauth2_definitions: Vec<OAuth2Definition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiKeyAuthDefinition {
    pub key: String,
    pub name: String,
    #[serde(rename = "in")]
    pub location: ApiKeyLocation,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BasicAuthDefinition {
    pub key: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OAuth2Definition {
    pub key: String,
    pub description: String,
    pub flow: OAuthFlow,
    pub authorization_url: String,
    pub token_url: String,
    pub scopes: Vec<ScopeDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScopeDefinition {
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::PrimitiveType;
    use std::io::Write;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
classes:
  - name: controllers.SettlementsSearcherController
    api:
      value: /apitest/search
      description: Search for settlements
      tags: [Search]
    methods:
      - name: search
        parameters:
          - name: personalNumber
            type: String
            api_param:
              value: A personal number of one of the sellers.
              example: "0101201112345"
          - name: propertyId
            type: String
            api_param:
              value: The cadastre or share id.
              required: true
        operation:
          value: Search for settlement
          http_method: GET
          nickname: getsettlement
          response: Settlement
          response_container: List
        responses:
          - code: 400
            message: Bad Request
        implicit_params:
          - name: Authorization
            value: Token for logged in user
            data_type: string
            param_type: header
      - name: helper
        public: false
        return_type: "Vec<i64>"
"#;

    #[test]
    fn test_load_manifest() {
        let manifest = ApiManifest::from_yaml_str(MANIFEST).unwrap();
        assert_eq!(manifest.classes.len(), 1);

        let class = &manifest.classes[0];
        assert!(!class.is_singleton());
        assert_eq!(
            class.full_method_name("search"),
            "controllers.SettlementsSearcherController$.search"
        );

        let search = &class.methods[0];
        assert!(search.public);
        assert!(search.return_type.is_void());
        assert_eq!(search.parameters.len(), 2);
        assert_eq!(search.parameters[0].ty, TypeRef::Primitive(PrimitiveType::String));

        let api_param = search.parameters[1].api_param.as_ref().unwrap();
        assert!(api_param.details.required);
        assert_eq!(api_param.details.value, "The cadastre or share id.");

        let operation = search.operation.as_ref().unwrap();
        assert_eq!(operation.code, 200);
        assert_eq!(operation.response, TypeRef::named("Settlement"));
        assert_eq!(search.responses[0].code, 400);

        let implicit = &search.implicit_params[0];
        assert_eq!(implicit.param_type, ParamKind::Header);
        assert_eq!(implicit.details.value, "Token for logged in user");

        let helper = &class.methods[1];
        assert!(!helper.public);
        assert_eq!(
            helper.return_type,
            TypeRef::array(TypeRef::Primitive(PrimitiveType::Long))
        );
    }

    #[test]
    fn test_invalid_type_string_is_manifest_error() {
        let content = "classes:\n  - name: A\n    methods:\n      - name: m\n        return_type: \"Vec<\"\n";
        let err = ApiManifest::from_yaml_str(content).unwrap_err();
        assert!(matches!(err, Error::ManifestError(_)));
    }

    #[test]
    fn test_singleton_full_method_name() {
        let class = HandlerClass {
            name: "controllers.Application$".to_string(),
            ..Default::default()
        };
        assert!(class.is_singleton());
        assert_eq!(class.full_method_name("index"), "controllers.Application$.index");
    }

    #[test]
    fn test_param_kind_parsing() {
        assert_eq!(ParamKind::from("formData".to_string()), ParamKind::Form);
        assert_eq!(ParamKind::from("FORM".to_string()), ParamKind::Form);
        assert_eq!(ParamKind::from("body".to_string()), ParamKind::Body);
        assert_eq!(
            ParamKind::from("cookie".to_string()),
            ParamKind::Unknown("cookie".to_string())
        );
    }

    #[test]
    fn test_api_tags() {
        let api = Api {
            value: "/apitest/search".to_string(),
            ..Default::default()
        };
        assert_eq!(api.tags(), vec!["apitestsearch"]);

        let api = Api {
            value: "/apitest/search".to_string(),
            tags: vec!["Search".to_string(), String::new(), "Search".to_string()],
            ..Default::default()
        };
        assert_eq!(api.tags(), vec!["Search"]);

        assert!(Api::default().tags().is_empty());
    }

    #[test]
    fn test_is_resource_class() {
        let manifest = ApiManifest::from_yaml_str(MANIFEST).unwrap();
        assert!(manifest.is_resource_class("SettlementsSearcherController"));
        assert!(manifest.is_resource_class("controllers::SettlementsSearcherController"));
        assert!(!manifest.is_resource_class("Settlement"));
        assert!(!manifest.is_resource_class("models::SettlementsSearcherController"));
        assert!(!manifest.is_resource_class("models.SettlementsSearcherController"));
        assert!(!manifest.is_resource_class(""));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("api.yaml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        assert_eq!(ApiManifest::load(&path).unwrap().classes.len(), 1);

        let err = ApiManifest::load(&temp_dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read manifest"));
    }
}
