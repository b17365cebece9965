use super::extensions::parse_extensions;
use super::mapper::TypeSchemaMapper;
use super::parameters::ParameterResolver;
use super::responses::ResponseResolver;
use super::{comma_list, non_empty, SUCCESSFUL_OPERATION};
use crate::annotations::{AnnotationSource, Api, ApiOperation, Authorization, HandlerClass, HandlerMethod};
use crate::config::Config;
use crate::document::{Document, Operation, Response, Scheme, SecurityRequirement, Tag};
use crate::error::Result;
use crate::routes::{HttpMethod, PathPattern, RouteEntry};
use log::{debug, warn};

/// Class-level values operations fall back to when they declare none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassContext {
    pub tags: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub schemes: Vec<Scheme>,
    pub security: Vec<SecurityRequirement>,
}

impl ClassContext {
    pub fn from_api(api: &Api) -> Self {
        Self {
            tags: api.tags(),
            consumes: comma_list(&api.consumes),
            produces: comma_list(&api.produces),
            schemes: parse_schemes(&api.protocols),
            security: security_requirements(&api.authorizations),
        }
    }
}

/// An operation together with where it goes in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOperation {
    pub path: String,
    pub method: HttpMethod,
    pub operation: Operation,
}

/// Builds one operation from a handler method and the route bound to it.
pub struct OperationBuilder<'b, 'a> {
    config: &'b dyn Config,
    annotations: &'b dyn AnnotationSource,
    mapper: TypeSchemaMapper<'a>,
}

impl<'b, 'a> OperationBuilder<'b, 'a> {
    pub fn new(config: &'b dyn Config, annotations: &'b dyn AnnotationSource, mapper: TypeSchemaMapper<'a>) -> Self {
        Self {
            config,
            annotations,
            mapper,
        }
    }

    /// Returns `Ok(None)` when the method yields no operation: it is hidden
    /// or no HTTP verb can be determined for it.
    ///
    /// Models reached by the responses are registered in `document`, and so
    /// are any tags the operation declares itself.
    ///
    /// # Errors
    ///
    /// Fails only when an implicit parameter cannot be described.
    pub fn build_operation(
        &mut self,
        class: &HandlerClass,
        method: &HandlerMethod,
        route: &RouteEntry,
        context: &ClassContext,
        document: &mut Document,
    ) -> Result<Option<PlacedOperation>> {
        let name = class.full_method_name(&method.name);
        let annotation = method.operation.as_ref();

        let Some(verb) = resolve_verb(annotation, route) else {
            warn!("No HTTP method for {}, skipping", name);
            return Ok(None);
        };
        if annotation.is_some_and(|op| op.hidden) {
            debug!("Operation {} is hidden", name);
            return Ok(None);
        }

        let path = operation_path(&route.path, self.config.base_path());
        debug!("Building {} {} from {}", verb, path, name);

        let mut operation = Operation {
            operation_id: Some(method.name.clone()),
            ..Default::default()
        };

        if let Some(op) = annotation {
            if !op.nickname.trim().is_empty() {
                operation.operation_id = Some(op.nickname.trim().to_string());
            }
            operation.summary = non_empty(&op.value);
            operation.description = non_empty(&op.notes);
            operation.consumes = comma_list(&op.consumes);
            operation.produces = comma_list(&op.produces);
            operation.schemes = parse_schemes(&op.protocols);
            operation.security = security_requirements(&op.authorizations);
            operation.extensions = parse_extensions(&op.extensions);

            for tag in op.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                if !operation.tags.iter().any(|t| t == tag) {
                    operation.tags.push(tag.to_string());
                }
                document.add_tag(Tag::named(tag));
            }
        }

        if operation.tags.is_empty() {
            operation.tags = context.tags.clone();
        }
        if operation.consumes.is_empty() {
            operation.consumes = context.consumes.clone();
        }
        if operation.produces.is_empty() {
            operation.produces = context.produces.clone();
        }
        if operation.schemes.is_empty() {
            operation.schemes = context.schemes.clone();
        }
        if operation.security.is_empty() {
            operation.security = context.security.clone();
        }

        operation.parameters = ParameterResolver::new(&mut self.mapper).resolve_parameters(method, route);
        operation.responses = ResponseResolver::new(&mut self.mapper, self.annotations)
            .resolve_responses(method, &mut document.definitions);
        operation.deprecated = method.deprecated;

        let implicit = ParameterResolver::new(&mut self.mapper).resolve_implicit(&name, &method.implicit_params)?;
        operation.parameters.extend(implicit);

        if operation.responses.is_empty() {
            operation.responses.default = Some(Response::new(SUCCESSFUL_OPERATION));
        }

        Ok(Some(PlacedOperation {
            path,
            method: verb,
            operation,
        }))
    }
}

/// Stores the operation under its path and verb. A previous operation at
/// the same place is replaced.
pub fn register(document: &mut Document, placed: PlacedOperation) {
    let id = placed.operation.operation_id.clone().unwrap_or_default();
    let item = document.paths.entry(placed.path.clone()).or_default();

    if let Some(replaced) = item.set(placed.method, placed.operation) {
        warn!(
            "{} {} was already defined by {}, replacing it with {}",
            placed.method,
            placed.path,
            replaced.operation_id.unwrap_or_default(),
            id
        );
    }
}

/// The route path relative to `base_path`, always starting with `/`.
///
/// The base path is compared without its leading slash and with exactly one
/// trailing slash, so `/api` strips `/api/search` but not `/apis/search`
/// or `/api` itself.
pub fn operation_path(pattern: &PathPattern, base_path: &str) -> String {
    let full = pattern.render();
    let relative = full.trim_start_matches('/');
    let base = base_path.trim_matches('/');

    let stripped = if base.is_empty() {
        relative
    } else {
        relative
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(relative)
    };

    format!("/{}", stripped)
}

fn resolve_verb(annotation: Option<&ApiOperation>, route: &RouteEntry) -> Option<HttpMethod> {
    let declared = annotation
        .map(|op| op.http_method.trim())
        .filter(|verb| !verb.is_empty());

    if let Some(declared) = declared {
        match HttpMethod::parse(declared) {
            Some(verb) => return Some(verb),
            None => warn!("Unknown HTTP method '{}' on {}", declared, route.name()),
        }
    }
    route.verb
}

fn parse_schemes(protocols: &str) -> Vec<Scheme> {
    let mut schemes = Vec::new();
    for protocol in comma_list(protocols) {
        match Scheme::parse(&protocol) {
            Some(scheme) if !schemes.contains(&scheme) => schemes.push(scheme),
            Some(_) => {}
            None => debug!("Ignoring unknown scheme '{}'", protocol),
        }
    }
    schemes
}

fn security_requirements(authorizations: &[Authorization]) -> Vec<SecurityRequirement> {
    authorizations
        .iter()
        .filter(|auth| !auth.value.trim().is_empty())
        .map(|auth| SecurityRequirement {
            name: auth.value.trim().to_string(),
            scopes: auth
                .scopes
                .iter()
                .map(|scope| scope.trim())
                .filter(|scope| !scope.is_empty())
                .map(str::to_string)
                .collect(),
        })
        .collect()
}
