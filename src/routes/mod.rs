//! Route table model: the registered URL patterns and their handler bindings.
//!
//! Routes are one of the two inputs of a build. The builder only reads them
//! through the [`RouteIndex`] trait, keyed by the fully-qualified handler name
//! (`controllers.SearchController$.search`).
//!
//! # Example
//!
//! ```no_run
//! use swagger_from_routes::routes::{play, RouteIndex, RouteTable};
//! use std::path::Path;
//!
//! let parsed = play::parse_file(Path::new("conf/routes")).unwrap();
//! let table = RouteTable::from_entries(parsed.routes);
//! println!("Found {} routes", table.all().len());
//! ```

pub mod play;

use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::TypeDecl;

/// Read-only lookup of route entries by operation name.
pub trait RouteIndex {
    /// Whether a route is bound to the named handler method.
    fn exists(&self, operation_name: &str) -> bool {
        self.get(operation_name).is_some()
    }

    /// The route bound to the named handler method.
    fn get(&self, operation_name: &str) -> Option<&RouteEntry>;

    /// Every route, keyed by operation name.
    fn all(&self) -> &BTreeMap<String, RouteEntry>;
}

/// HTTP methods a route can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Case-insensitive parse; `None` for verbs Swagger cannot describe.
    pub fn parse(verb: &str) -> Option<Self> {
        let method = match verb.trim().to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "OPTIONS" => HttpMethod::Options,
            "HEAD" => HttpMethod::Head,
            _ => return None,
        };
        Some(method)
    }

    /// Lowercase name, as used for path item keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// One segment of a route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    /// Literal text, slashes included.
    Static(String),
    /// A named dynamic segment with an optional regex constraint.
    Dynamic {
        name: String,
        constraint: Option<String>,
    },
    /// A segment the route parser could not classify.
    Unparsed(String),
}

/// An ordered route path, e.g. `/search/:personalNumber`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathPattern {
    pub parts: Vec<PathPart>,
}

impl PathPattern {
    pub fn new(parts: Vec<PathPart>) -> Self {
        Self { parts }
    }

    /// Whether a dynamic segment with exactly this name exists.
    pub fn has(&self, name: &str) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, PathPart::Dynamic { name: n, .. } if n == name))
    }

    /// Renders the path with dynamic segments as `{name}` templates.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                PathPart::Static(text) => out.push_str(text),
                PathPart::Dynamic { name, .. } => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
                PathPart::Unparsed(text) => {
                    warn!("Unexpected path segment '{}', appending it literally", text);
                    out.push_str(text);
                }
            }
        }
        out
    }
}

/// A parameter declared in a route's handler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParameter {
    pub name: String,
    /// The declared type name, verbatim.
    pub type_name: String,
    pub type_decl: TypeDecl,
    /// Constant value; fixed parameters are not client-visible.
    pub fixed: Option<String>,
    pub default: Option<String>,
}

impl RouteParameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            type_decl: TypeDecl::parse(&type_name),
            type_name,
            fixed: None,
            default: None,
        }
    }

    pub fn with_fixed(mut self, value: impl Into<String>) -> Self {
        self.fixed = Some(value.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// The handler a route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerCall {
    pub package: String,
    pub controller: String,
    pub method: String,
}

/// One registered URL-pattern-to-handler binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// `None` when the declared verb is not one Swagger can describe.
    pub verb: Option<HttpMethod>,
    pub path: PathPattern,
    pub call: HandlerCall,
    pub parameters: Vec<RouteParameter>,
    /// 1-based line in the routes file; 0 for routes built in code.
    pub line: usize,
}

impl RouteEntry {
    /// The operation name this route is indexed by.
    pub fn name(&self) -> String {
        let HandlerCall {
            package,
            controller,
            method,
        } = &self.call;
        if package.is_empty() {
            format!("{}$.{}", controller, method)
        } else {
            format!("{}.{}$.{}", package, controller, method)
        }
    }
}

/// In-memory [`RouteIndex`].
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes entries by name; a later entry for the same handler wins.
    pub fn from_entries(entries: impl IntoIterator<Item = RouteEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    pub fn insert(&mut self, entry: RouteEntry) {
        let name = entry.name();
        if let Some(previous) = self.routes.insert(name.clone(), entry) {
            debug!(
                "Route for {} at line {} replaced by a later declaration",
                name, previous.line
            );
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteIndex for RouteTable {
    fn get(&self, operation_name: &str) -> Option<&RouteEntry> {
        self.routes.get(operation_name)
    }

    fn all(&self) -> &BTreeMap<String, RouteEntry> {
        &self.routes
    }
}
