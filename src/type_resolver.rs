use crate::parser::ParsedFile;
use crate::types::{is_option, TypeRef};
use log::{debug, warn};
use std::collections::HashMap;

/// Type resolver - finds model declarations in parsed Rust sources
pub struct TypeResolver {
    /// All parsed model sources
    parsed_files: Vec<ParsedFile>,
    /// Cache of resolved models keyed by short name
    type_cache: HashMap<String, ResolvedType>,
}

/// Resolved model information
#[derive(Debug, Clone)]
pub struct ResolvedType {
    /// The model name
    pub name: String,
    /// Doc comment on the declaration
    pub description: Option<String>,
    /// Struct or enum shape
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Struct(StructDef),
    /// Unit-only enum
    Enum(EnumDef),
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub fields: Vec<FieldDef>,
}

/// Field definition in a struct
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name as declared
    pub name: String,
    /// Structured field type; `None` when the type cannot be described
    pub type_ref: Option<TypeRef>,
    /// Whether the field is wrapped in `Option<T>`
    pub optional: bool,
    /// Doc comment on the field
    pub description: Option<String>,
    pub serde_attrs: SerdeAttributes,
}

impl FieldDef {
    /// The name the field has on the wire.
    pub fn wire_name(&self) -> &str {
        self.serde_attrs.rename.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub variants: Vec<String>,
}

/// Serde attributes relevant to the wire shape of a field or variant
#[derive(Debug, Clone, Default)]
pub struct SerdeAttributes {
    pub rename: Option<String>,
    pub skip: bool,
}

impl TypeResolver {
    pub fn new(parsed_files: Vec<ParsedFile>) -> Self {
        debug!("Initializing TypeResolver with {} files", parsed_files.len());
        Self {
            parsed_files,
            type_cache: HashMap::new(),
        }
    }

    /// Number of model sources the resolver searches.
    pub fn file_count(&self) -> usize {
        self.parsed_files.len()
    }

    /// Resolve a model by name.
    ///
    /// Qualified names (`models.Settlement`, `crate::models::Settlement`) are
    /// matched on their last segment.
    pub fn resolve_type(&mut self, type_name: &str) -> Option<ResolvedType> {
        let short_name = short_name(type_name);
        if let Some(cached) = self.type_cache.get(short_name) {
            return Some(cached.clone());
        }

        let resolved = self
            .parsed_files
            .iter()
            .find_map(|file| find_in_items(&file.syntax_tree.items, short_name))?;
        debug!("Resolved model {} ({:?})", short_name, resolved.kind_label());

        self.type_cache.insert(short_name.to_string(), resolved.clone());
        Some(resolved)
    }

    /// Whether a model with this name is declared anywhere.
    pub fn is_known(&mut self, type_name: &str) -> bool {
        self.resolve_type(type_name).is_some()
    }
}

impl ResolvedType {
    fn kind_label(&self) -> &'static str {
        match self.kind {
            TypeKind::Struct(_) => "struct",
            TypeKind::Enum(_) => "enum",
        }
    }
}

/// Last segment of a `.` or `::` qualified name.
pub fn short_name(type_name: &str) -> &str {
    let name = type_name.trim();
    let name = name.rsplit("::").next().unwrap_or(name);
    name.rsplit('.').next().unwrap_or(name)
}

fn find_in_items(items: &[syn::Item], name: &str) -> Option<ResolvedType> {
    items.iter().find_map(|item| match item {
        syn::Item::Struct(item_struct) if item_struct.ident == name => Some(parse_struct(item_struct)),
        syn::Item::Enum(item_enum) if item_enum.ident == name => parse_enum(item_enum),
        syn::Item::Mod(item_mod) => item_mod
            .content
            .as_ref()
            .and_then(|(_, nested)| find_in_items(nested, name)),
        _ => None,
    })
}

fn parse_struct(item_struct: &syn::ItemStruct) -> ResolvedType {
    let name = item_struct.ident.to_string();
    let fields = match &item_struct.fields {
        syn::Fields::Named(named) => named.named.iter().filter_map(parse_field).collect(),
        _ => {
            debug!("Struct {} has no named fields", name);
            Vec::new()
        }
    };

    ResolvedType {
        name,
        description: doc_comment(&item_struct.attrs),
        kind: TypeKind::Struct(StructDef { fields }),
    }
}

fn parse_field(field: &syn::Field) -> Option<FieldDef> {
    let name = field.ident.as_ref()?.to_string();
    let type_ref = match TypeRef::from_syn(&field.ty) {
        Ok(type_ref) => Some(type_ref),
        Err(e) => {
            warn!("Cannot describe type of field {}: {}", name, e);
            None
        }
    };

    Some(FieldDef {
        optional: is_option(&field.ty),
        description: doc_comment(&field.attrs),
        serde_attrs: parse_serde_attributes(&field.attrs),
        name,
        type_ref,
    })
}

fn parse_enum(item_enum: &syn::ItemEnum) -> Option<ResolvedType> {
    let name = item_enum.ident.to_string();
    if item_enum
        .variants
        .iter()
        .any(|v| !matches!(v.fields, syn::Fields::Unit))
    {
        warn!("Enum {} carries data and cannot be described as a string model", name);
        return None;
    }

    let variants = item_enum
        .variants
        .iter()
        .filter_map(|variant| {
            let attrs = parse_serde_attributes(&variant.attrs);
            if attrs.skip {
                return None;
            }
            Some(attrs.rename.unwrap_or_else(|| variant.ident.to_string()))
        })
        .collect();

    Some(ResolvedType {
        name,
        description: doc_comment(&item_enum.attrs),
        kind: TypeKind::Enum(EnumDef { variants }),
    })
}

/// Joins `///` lines into one description.
fn doc_comment(attrs: &[syn::Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(syn::MetaNameValue {
                value:
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(text),
                        ..
                    }),
                ..
            }) => Some(text.value().trim().to_string()),
            _ => None,
        })
        .collect();

    let joined = lines.join(" ").trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn parse_serde_attributes(attrs: &[syn::Attribute]) -> SerdeAttributes {
    let mut serde_attrs = SerdeAttributes::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    serde_attrs.rename = Some(value.value());
                } else {
                    skip_meta_value(&meta)?;
                }
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                serde_attrs.skip = true;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        });

        if let Err(e) = result {
            debug!("Ignoring unreadable serde attribute: {}", e);
        }
    }

    serde_attrs
}

/// Consumes `= value` or `(...)` after a serde key we do not interpret.
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| skip_meta_value(&nested))?;
    }
    Ok(())
}
