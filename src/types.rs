//! Type descriptors shared by the routes table, the annotation manifest and the
//! model converter.
//!
//! Three representations live here:
//!
//! - [`PrimitiveType`]: the closed set of scalar kinds a schema can carry.
//! - [`TypeDecl`]: what a route declaration says about a parameter type. Route
//!   files only carry type *names*, so this is parsed once at the boundary into
//!   a primitive, an optional primitive, or an opaque name.
//! - [`TypeRef`]: a fully structured type (arrays, sets, maps, named models),
//!   parsed from Rust type syntax with `syn`.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Scalar kinds understood by Swagger 2.0 schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Integer,
    Long,
    Float,
    Double,
    Number,
    Boolean,
    Byte,
    Date,
    DateTime,
    Uuid,
    Object,
}

impl PrimitiveType {
    /// Looks a type name up in the fixed table of primitive names.
    ///
    /// Exact Rust and Scala/Java spellings only. The Swagger keywords in
    /// [`PrimitiveType::from_swagger_name`] are checked after declared models,
    /// so a model named `Date` or `Object` is not mistaken for a primitive.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let primitive = match name.trim() {
            "String" | "str" | "&str" | "char" | "Char" | "java.lang.String" => Self::String,
            "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => Self::Integer,
            "Int" | "Integer" | "Short" | "java.lang.Integer" | "java.lang.Short" => Self::Integer,
            "i64" | "i128" | "isize" | "u64" | "u128" | "usize" => Self::Long,
            "Long" | "java.lang.Long" => Self::Long,
            "f32" | "Float" | "java.lang.Float" => Self::Float,
            "f64" | "Double" | "java.lang.Double" => Self::Double,
            "BigDecimal" | "java.math.BigDecimal" => Self::Number,
            "bool" | "Boolean" | "java.lang.Boolean" => Self::Boolean,
            "Byte" | "java.lang.Byte" => Self::Byte,
            "NaiveDate" | "LocalDate" => Self::Date,
            "DateTime" | "NaiveDateTime" | "OffsetDateTime" | "Instant" => Self::DateTime,
            "Uuid" | "UUID" | "java.util.UUID" => Self::Uuid,
            _ => return None,
        };
        Some(primitive)
    }

    /// Swagger type keywords, case-insensitive (`date`, `Object`, `number`).
    pub fn from_swagger_name(name: &str) -> Option<Self> {
        let primitive = match name.trim().to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "integer" | "int" => Self::Integer,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "date" => Self::Date,
            "date-time" | "datetime" => Self::DateTime,
            "uuid" => Self::Uuid,
            "object" => Self::Object,
            _ => return None,
        };
        Some(primitive)
    }

    /// Element names allowed inside an optional-primitive declaration such as
    /// `Option[Int]`. Narrower than [`PrimitiveType::from_type_name`]:
    /// only boxed scalars qualify.
    fn from_optional_element(name: &str) -> Option<Self> {
        match name.trim() {
            "Int" | "Short" => Some(Self::Integer),
            "Long" => Some(Self::Long),
            "Float" => Some(Self::Float),
            "Double" => Some(Self::Double),
            "Byte" => Some(Self::Byte),
            "Char" => Some(Self::String),
            "Boolean" => Some(Self::Boolean),
            "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => Some(Self::Integer),
            "i64" | "u64" | "isize" | "usize" => Some(Self::Long),
            "f32" => Some(Self::Float),
            "f64" => Some(Self::Double),
            "bool" => Some(Self::Boolean),
            "char" => Some(Self::String),
            _ => None,
        }
    }

    /// The Swagger `type` keyword for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String | Self::Byte | Self::Date | Self::DateTime | Self::Uuid => "string",
            Self::Integer | Self::Long => "integer",
            Self::Float | Self::Double | Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }

    /// The default Swagger `format` for this kind, if any.
    pub fn default_format(&self) -> Option<&'static str> {
        match self {
            Self::Integer => Some("int32"),
            Self::Long => Some("int64"),
            Self::Float => Some("float"),
            Self::Double => Some("double"),
            Self::Byte => Some("byte"),
            Self::Date => Some("date"),
            Self::DateTime => Some("date-time"),
            Self::Uuid => Some("uuid"),
            Self::String | Self::Number | Self::Boolean | Self::Object => None,
        }
    }
}

/// A parameter type as declared in a route file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDecl {
    Primitive(PrimitiveType),
    /// A nullable primitive, e.g. `Option[Int]` or `Option<i64>`.
    OptionalPrimitive(PrimitiveType),
    /// Anything else; resolved later against the handler signature or the
    /// model converter.
    Named(String),
}

impl TypeDecl {
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if let Some(primitive) = PrimitiveType::from_type_name(name) {
            return Self::Primitive(primitive);
        }
        if let Some(primitive) = Self::optional_element(name).and_then(PrimitiveType::from_optional_element) {
            return Self::OptionalPrimitive(primitive);
        }
        Self::Named(name.to_string())
    }

    /// Extracts `X` from `Option[X]`, `scala.Option[X]` or `Option<X>`.
    fn optional_element(name: &str) -> Option<&str> {
        let rest = name
            .strip_prefix("scala.Option")
            .or_else(|| name.strip_prefix("Option"))?
            .trim_start();
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.trim_end().strip_suffix(']'))
            .or_else(|| rest.strip_prefix('<').and_then(|r| r.trim_end().strip_suffix('>')))?;
        Some(inner.trim())
    }
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDecl::Primitive(p) => write!(f, "{:?}", p),
            TypeDecl::OptionalPrimitive(p) => write!(f, "Option<{:?}>", p),
            TypeDecl::Named(name) => f.write_str(name),
        }
    }
}

/// A structured type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum TypeRef {
    #[default]
    Void,
    Primitive(PrimitiveType),
    OptionalPrimitive(PrimitiveType),
    Array(Box<TypeRef>),
    Set(Box<TypeRef>),
    Map(Box<TypeRef>),
    Named(String),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn array(inner: TypeRef) -> Self {
        TypeRef::Array(Box::new(inner))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Converts a parsed Rust type. `Option<T>` collapses to `T` unless `T` is
    /// a primitive, which keeps its nullability.
    pub fn from_syn(ty: &syn::Type) -> syn::Result<Self> {
        match ty {
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(TypeRef::Void),
            syn::Type::Reference(reference) => Self::from_syn(&reference.elem),
            syn::Type::Paren(paren) => Self::from_syn(&paren.elem),
            syn::Type::Group(group) => Self::from_syn(&group.elem),
            syn::Type::Slice(slice) => Ok(TypeRef::array(Self::from_syn(&slice.elem)?)),
            syn::Type::Array(array) => Ok(TypeRef::array(Self::from_syn(&array.elem)?)),
            syn::Type::Path(type_path) => Self::from_path(&type_path.path),
            other => Err(syn::Error::new_spanned(other, "unsupported type expression")),
        }
    }

    fn from_path(path: &syn::Path) -> syn::Result<Self> {
        let segment = path
            .segments
            .last()
            .ok_or_else(|| syn::Error::new_spanned(path, "empty type path"))?;
        let ident = segment.ident.to_string();
        let args = generic_types(&segment.arguments);

        let type_ref = match (ident.as_str(), args.as_slice()) {
            ("Option", [inner]) => match Self::from_syn(inner)? {
                TypeRef::Primitive(p) => TypeRef::OptionalPrimitive(p),
                other => other,
            },
            ("Vec" | "VecDeque" | "LinkedList", [inner]) => TypeRef::array(Self::from_syn(inner)?),
            ("HashSet" | "BTreeSet" | "IndexSet", [inner]) => {
                TypeRef::Set(Box::new(Self::from_syn(inner)?))
            }
            ("HashMap" | "BTreeMap" | "IndexMap", [_, value]) => {
                TypeRef::Map(Box::new(Self::from_syn(value)?))
            }
            ("Box" | "Rc" | "Arc" | "Cow", [inner]) => Self::from_syn(inner)?,
            _ => match PrimitiveType::from_type_name(&ident) {
                Some(primitive) => TypeRef::Primitive(primitive),
                None => TypeRef::Named(qualified_name(path)),
            },
        };
        Ok(type_ref)
    }
}

/// `models::User` stays qualified; `crate`, `self` and `super` are dropped.
fn qualified_name(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .skip_while(|ident| matches!(ident.as_str(), "crate" | "self" | "super"))
        .collect::<Vec<_>>()
        .join("::")
}

fn generic_types(arguments: &syn::PathArguments) -> Vec<&syn::Type> {
    match arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether a Rust type is spelled `Option<..>`.
pub fn is_option(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident == "Option")
            .unwrap_or(false),
        _ => false,
    }
}

impl FromStr for TypeRef {
    type Err = syn::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "void" || trimmed == "Void" {
            return Ok(TypeRef::Void);
        }
        let ty: syn::Type = syn::parse_str(trimmed)?;
        Self::from_syn(&ty)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|e: syn::Error| format!("invalid type '{}': {}", value, e))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("()"),
            TypeRef::Primitive(p) => write!(f, "{:?}", p),
            TypeRef::OptionalPrimitive(p) => write!(f, "Option<{:?}>", p),
            TypeRef::Array(inner) => write!(f, "Vec<{}>", inner),
            TypeRef::Set(inner) => write!(f, "HashSet<{}>", inner),
            TypeRef::Map(inner) => write!(f, "HashMap<String, {}>", inner),
            TypeRef::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_table_covers_all_spellings() {
        assert_eq!(PrimitiveType::from_type_name("String"), Some(PrimitiveType::String));
        assert_eq!(PrimitiveType::from_type_name("Int"), Some(PrimitiveType::Integer));
        assert_eq!(PrimitiveType::from_type_name("i64"), Some(PrimitiveType::Long));
        assert_eq!(PrimitiveType::from_swagger_name("integer"), Some(PrimitiveType::Integer));
        assert_eq!(PrimitiveType::from_swagger_name("date-time"), Some(PrimitiveType::DateTime));
        assert_eq!(PrimitiveType::from_type_name("Settlement"), None);
        assert_eq!(PrimitiveType::from_swagger_name("Settlement"), None);
    }

    #[test]
    fn test_swagger_keywords_are_not_type_names() {
        assert_eq!(PrimitiveType::from_type_name("Date"), None);
        assert_eq!(PrimitiveType::from_type_name("Object"), None);
        assert_eq!(PrimitiveType::from_type_name("number"), None);
        assert_eq!(PrimitiveType::from_swagger_name("Date"), Some(PrimitiveType::Date));
        assert_eq!(PrimitiveType::from_swagger_name("Object"), Some(PrimitiveType::Object));

        let ty: TypeRef = "Vec<Date>".parse().unwrap();
        assert_eq!(ty, TypeRef::array(TypeRef::named("Date")));
        assert_eq!(TypeDecl::parse("Number"), TypeDecl::Named("Number".to_string()));
    }

    #[test]
    fn test_type_and_format() {
        assert_eq!(PrimitiveType::Long.type_name(), "integer");
        assert_eq!(PrimitiveType::Long.default_format(), Some("int64"));
        assert_eq!(PrimitiveType::String.default_format(), None);
        assert_eq!(PrimitiveType::Uuid.type_name(), "string");
    }

    #[test]
    fn test_type_decl_primitive() {
        assert_eq!(TypeDecl::parse("String"), TypeDecl::Primitive(PrimitiveType::String));
        assert_eq!(TypeDecl::parse(" Long "), TypeDecl::Primitive(PrimitiveType::Long));
    }

    #[test]
    fn test_type_decl_optional_primitive() {
        assert_eq!(
            TypeDecl::parse("Option[Int]"),
            TypeDecl::OptionalPrimitive(PrimitiveType::Integer)
        );
        assert_eq!(
            TypeDecl::parse("scala.Option[ Boolean ]"),
            TypeDecl::OptionalPrimitive(PrimitiveType::Boolean)
        );
        assert_eq!(
            TypeDecl::parse("Option<i64>"),
            TypeDecl::OptionalPrimitive(PrimitiveType::Long)
        );
    }

    #[test]
    fn test_type_decl_optional_non_primitive_is_named() {
        assert_eq!(
            TypeDecl::parse("Option[String]"),
            TypeDecl::Named("Option[String]".to_string())
        );
        assert_eq!(
            TypeDecl::parse("java.util.UUID"),
            TypeDecl::Primitive(PrimitiveType::Uuid)
        );
        assert_eq!(
            TypeDecl::parse("models.Settlement"),
            TypeDecl::Named("models.Settlement".to_string())
        );
    }

    #[test]
    fn test_type_ref_collections() {
        let ty: TypeRef = "Vec<Settlement>".parse().unwrap();
        assert_eq!(ty, TypeRef::array(TypeRef::named("Settlement")));

        let ty: TypeRef = "HashSet<String>".parse().unwrap();
        assert_eq!(ty, TypeRef::Set(Box::new(TypeRef::Primitive(PrimitiveType::String))));

        let ty: TypeRef = "std::collections::HashMap<String, models::User>".parse().unwrap();
        assert_eq!(ty, TypeRef::Map(Box::new(TypeRef::named("models::User"))));

        let ty: TypeRef = "Vec<crate::models::User>".parse().unwrap();
        assert_eq!(ty, TypeRef::array(TypeRef::named("models::User")));
    }

    #[test]
    fn test_type_ref_option_handling() {
        let ty: TypeRef = "Option<i32>".parse().unwrap();
        assert_eq!(ty, TypeRef::OptionalPrimitive(PrimitiveType::Integer));

        let ty: TypeRef = "Option<User>".parse().unwrap();
        assert_eq!(ty, TypeRef::named("User"));

        let ty: TypeRef = "Option<Box<Vec<u8>>>".parse().unwrap();
        assert_eq!(ty, TypeRef::array(TypeRef::Primitive(PrimitiveType::Integer)));
    }

    #[test]
    fn test_type_ref_void() {
        assert!("()".parse::<TypeRef>().unwrap().is_void());
        assert!("".parse::<TypeRef>().unwrap().is_void());
        assert!(TypeRef::default().is_void());
    }

    #[test]
    fn test_type_ref_invalid() {
        assert!("Vec<".parse::<TypeRef>().is_err());
        assert!("fn(i32) -> i32".parse::<TypeRef>().is_err());
    }

    #[test]
    fn test_type_ref_deserialize_from_string() {
        let ty: TypeRef = serde_yaml::from_str("\"Vec<Settlement>\"").unwrap();
        assert_eq!(ty, TypeRef::array(TypeRef::named("Settlement")));

        let err = serde_yaml::from_str::<TypeRef>("\"Vec<\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_is_option() {
        let ty: syn::Type = syn::parse_str("Option<String>").unwrap();
        assert!(is_option(&ty));
        let ty: syn::Type = syn::parse_str("Vec<String>").unwrap();
        assert!(!is_option(&ty));
    }
}
