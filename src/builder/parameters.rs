use super::mapper::TypeSchemaMapper;
use crate::annotations::{ApiImplicitParam, ApiParam, HandlerMethod, ParamDetails, ParamKind};
use crate::document::{Parameter, ParameterLocation};
use crate::error::{Error, Result};
use crate::routes::{RouteEntry, RouteParameter};
use crate::schema::Schema;
use crate::types::{TypeDecl, TypeRef};
use log::{debug, warn};

/// Builds the ordered parameter list of one operation.
///
/// Positional parameters come from the route's call declaration; implicit
/// parameters come from the method's annotations and are appended after them.
pub struct ParameterResolver<'m, 'a> {
    mapper: &'m mut TypeSchemaMapper<'a>,
}

impl<'m, 'a> ParameterResolver<'m, 'a> {
    pub fn new(mapper: &'m mut TypeSchemaMapper<'a>) -> Self {
        Self { mapper }
    }

    /// Parameters declared by the route, skipping fixed ones.
    pub fn resolve_parameters(&mut self, method: &HandlerMethod, route: &RouteEntry) -> Vec<Parameter> {
        let mut parameters = Vec::new();

        let declared = route.parameters.iter().filter(|p| p.fixed.is_none());
        for (position, route_param) in declared.enumerate() {
            let ty = self.resolve_type(route_param, method, position);
            let location = if route.path.has(&route_param.name) {
                ParameterLocation::Path
            } else {
                ParameterLocation::Query
            };

            let mut parameter = Parameter::new(
                route_param.name.clone(),
                location,
                self.mapper.parameter_schema(ty.as_ref()),
            );
            if let Some(default) = route_param.default.as_deref() {
                parameter.default = Some(strip_quotes(default).to_string());
            }

            if let Some(api_param) = find_annotation(method, &route_param.name, position) {
                if api_param.details.hidden {
                    debug!("Parameter {} of {} is hidden", route_param.name, method.name);
                    continue;
                }
                if let Err(message) = apply_details(&mut parameter, &api_param.details) {
                    warn!(
                        "Ignoring refinement of parameter {} of {}: {}",
                        route_param.name, method.name, message
                    );
                }
            }

            parameters.push(parameter);
        }

        parameters
    }

    /// Parameters declared only through annotations.
    ///
    /// # Errors
    ///
    /// An implicit parameter without a name, or with a malformed allowable
    /// range, aborts the build with [`Error::InvalidImplicitParameter`].
    pub fn resolve_implicit(&mut self, operation: &str, declared: &[ApiImplicitParam]) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();

        for implicit in declared {
            let location = match &implicit.param_type {
                ParamKind::Path => ParameterLocation::Path,
                ParamKind::Query => ParameterLocation::Query,
                ParamKind::Form => ParameterLocation::FormData,
                ParamKind::Header => ParameterLocation::Header,
                ParamKind::Body => {
                    warn!("Body parameter '{}' of {} is not supported", implicit.name, operation);
                    continue;
                }
                ParamKind::Unknown(kind) => {
                    warn!("Unknown implicit parameter type: [{}]", kind);
                    continue;
                }
            };

            let name = implicit.name.trim();
            if name.is_empty() {
                return Err(Error::InvalidImplicitParameter {
                    operation: operation.to_string(),
                    parameter: String::new(),
                    message: "parameter has no name".to_string(),
                });
            }
            if implicit.details.hidden {
                debug!("Implicit parameter {} of {} is hidden", name, operation);
                continue;
            }

            let ty = self.implicit_type(implicit);
            let mut parameter = Parameter::new(name, location, self.mapper.parameter_schema(ty.as_ref()));
            apply_details(&mut parameter, &implicit.details).map_err(|message| Error::InvalidImplicitParameter {
                operation: operation.to_string(),
                parameter: name.to_string(),
                message,
            })?;

            parameters.push(parameter);
        }

        Ok(parameters)
    }

    /// Primitive table, then optional primitive, then the handler's own
    /// argument type, then a lookup by name.
    fn resolve_type(&mut self, param: &RouteParameter, method: &HandlerMethod, position: usize) -> Option<TypeRef> {
        match &param.type_decl {
            TypeDecl::Primitive(p) => Some(TypeRef::Primitive(*p)),
            TypeDecl::OptionalPrimitive(p) => Some(TypeRef::OptionalPrimitive(*p)),
            TypeDecl::Named(name) => {
                if let Some(argument) = method.parameters.get(position).filter(|a| !a.ty.is_void()) {
                    return Some(argument.ty.clone());
                }
                let resolved = self.mapper.lookup(name);
                if resolved.is_none() {
                    warn!(
                        "Unresolved type '{}' for parameter {} of {}",
                        name, param.name, method.name
                    );
                }
                resolved
            }
        }
    }

    /// `file` and `array` data types cannot be looked up by name; the
    /// explicit type reference is used instead.
    fn implicit_type(&mut self, implicit: &ApiImplicitParam) -> Option<TypeRef> {
        let data_type = implicit.data_type.trim();
        let by_name = !data_type.is_empty()
            && !data_type.eq_ignore_ascii_case("file")
            && !data_type.eq_ignore_ascii_case("array");

        if by_name {
            return match TypeDecl::parse(data_type) {
                TypeDecl::Primitive(p) => Some(TypeRef::Primitive(p)),
                TypeDecl::OptionalPrimitive(p) => Some(TypeRef::OptionalPrimitive(p)),
                TypeDecl::Named(name) => self.mapper.lookup(&name),
            };
        }
        if !implicit.data_type_class.is_void() {
            return Some(implicit.data_type_class.clone());
        }
        None
    }
}

/// The annotation on the argument at `position`; when the handler declares
/// fewer arguments, the first argument annotated with the same name.
fn find_annotation<'h>(method: &'h HandlerMethod, name: &str, position: usize) -> Option<&'h ApiParam> {
    if let Some(argument) = method.parameters.get(position) {
        return argument.api_param.as_ref();
    }
    method.parameters.iter().find_map(|argument| {
        argument
            .api_param
            .as_ref()
            .filter(|api_param| argument.name == name || api_param.name == name)
    })
}

fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Applies annotation refinements to a parameter.
///
/// The only failure is a malformed allowable-values range, in which case the
/// parameter is left untouched.
pub(crate) fn apply_details(parameter: &mut Parameter, details: &ParamDetails) -> std::result::Result<(), String> {
    let allowable = parse_allowable_values(&details.allowable_values)?;

    if !details.value.is_empty() {
        parameter.description = Some(details.value.clone());
    }
    parameter.required |= details.required;
    if !details.default_value.is_empty() {
        parameter.default = Some(details.default_value.clone());
    }
    if !details.format.is_empty() {
        parameter.schema = parameter.schema.clone().with_format(&details.format);
    }
    if !details.pattern.is_empty() {
        parameter.pattern = Some(details.pattern.clone());
    }
    if !details.example.is_empty() {
        parameter.example = Some(details.example.clone());
    }
    if !details.collection_format.is_empty() {
        parameter.collection_format = Some(details.collection_format.clone());
    }
    parameter.allow_empty_value |= details.allow_empty_value;

    if details.allow_multiple && !matches!(parameter.schema, Schema::Array { .. }) {
        parameter.schema = Schema::array(parameter.schema.clone());
        if parameter.collection_format.is_none() {
            parameter.collection_format = Some("multi".to_string());
        }
    }

    match allowable {
        AllowableValues::None => {}
        AllowableValues::List(values) => parameter.enum_values = values,
        AllowableValues::Range(range) => {
            parameter.minimum = range.min;
            parameter.maximum = range.max;
            parameter.exclusive_minimum = range.exclusive_min;
            parameter.exclusive_maximum = range.exclusive_max;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum AllowableValues {
    None,
    List(Vec<String>),
    Range(Range),
}

#[derive(Debug, Clone, PartialEq)]
struct Range {
    min: Option<f64>,
    max: Option<f64>,
    exclusive_min: bool,
    exclusive_max: bool,
}

/// `a, b, c`, `range[1,5]`, `range(0, infinity]`.
fn parse_allowable_values(input: &str) -> std::result::Result<AllowableValues, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(AllowableValues::None);
    }

    if let Some(expr) = input.strip_prefix("range") {
        return parse_range(expr.trim()).map(AllowableValues::Range);
    }

    let values: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok(if values.is_empty() {
        AllowableValues::None
    } else {
        AllowableValues::List(values)
    })
}

fn parse_range(expr: &str) -> std::result::Result<Range, String> {
    let malformed = || format!("malformed range 'range{}'", expr);

    let exclusive_min = match expr.chars().next() {
        Some('[') => false,
        Some('(') => true,
        _ => return Err(malformed()),
    };
    let exclusive_max = match expr.chars().last() {
        Some(']') => false,
        Some(')') => true,
        _ => return Err(malformed()),
    };
    if expr.len() < 2 {
        return Err(malformed());
    }

    let bounds: Vec<&str> = expr[1..expr.len() - 1].split(',').map(str::trim).collect();
    let &[low, high] = bounds.as_slice() else {
        return Err(malformed());
    };

    let bound = |text: &str| -> std::result::Result<Option<f64>, String> {
        match text {
            "" | "infinity" | "-infinity" | "+infinity" => Ok(None),
            number => number.parse::<f64>().map(Some).map_err(|_| malformed()),
        }
    };

    Ok(Range {
        min: bound(low)?,
        max: bound(high)?,
        exclusive_min,
        exclusive_max,
    })
}
