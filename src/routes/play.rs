//! Parser for Play-style `routes` files.
//!
//! ```text
//! # Search
//! GET   /apitest/search/:personalNumber   controllers.SearchController.search(personalNumber: String, limit: Option[Int] ?= None)
//! GET   /assets/*file                     controllers.Assets.versioned(path = "/public", file: Asset)
//! ->    /admin                            admin.Routes
//! ```
//!
//! Malformed lines do not stop parsing; each one is reported as an
//! [`Error::RouteError`] with its line number and skipped.

use super::{HandlerCall, HttpMethod, PathPart, PathPattern, RouteEntry, RouteParameter};
use crate::error::Error;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Routes read from one file, plus the lines that could not be read.
#[derive(Debug, Default)]
pub struct ParsedRoutes {
    pub routes: Vec<RouteEntry>,
    pub errors: Vec<Error>,
}

/// Reads and parses a routes file.
pub fn parse_file(path: &Path) -> Result<ParsedRoutes> {
    debug!("Parsing routes file: {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read routes file: {}", path.display()))?;
    Ok(parse_str(&content))
}

/// Parses routes file content.
pub fn parse_str(content: &str) -> ParsedRoutes {
    let mut parsed = ParsedRoutes::default();

    for (index, raw) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('+') {
            continue;
        }

        match parse_line(line, line_number) {
            Ok(Some(route)) => parsed.routes.push(route),
            Ok(None) => {}
            Err(message) => {
                warn!("Skipping route at line {}: {}", line_number, message);
                parsed.errors.push(Error::RouteError {
                    line: line_number,
                    message,
                });
            }
        }
    }

    debug!(
        "Parsed {} routes ({} malformed lines)",
        parsed.routes.len(),
        parsed.errors.len()
    );
    parsed
}

fn parse_line(line: &str, line_number: usize) -> std::result::Result<Option<RouteEntry>, String> {
    let (verb, rest) = split_token(line).ok_or("missing HTTP verb")?;
    let (path, call) = split_token(rest).ok_or("missing path")?;

    if verb == "->" {
        debug!("Ignoring sub-router include at line {}: {}", line_number, call);
        return Ok(None);
    }
    if !path.starts_with('/') {
        return Err(format!("path '{}' must start with '/'", path));
    }
    if call.is_empty() {
        return Err("missing handler call".to_string());
    }

    let method = HttpMethod::parse(verb);
    if method.is_none() {
        warn!("Unsupported HTTP verb '{}' at line {}", verb, line_number);
    }

    let (call, parameters) = parse_call(call)?;
    Ok(Some(RouteEntry {
        verb: method,
        path: parse_path(path),
        call,
        parameters,
        line: line_number,
    }))
}

/// Splits off the first whitespace-delimited token.
fn split_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], input[end..].trim()))
}

fn parse_path(path: &str) -> PathPattern {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = path;
    let mut at_segment_start = true;

    while let Some(c) = rest.chars().next() {
        if at_segment_start && matches!(c, ':' | '*' | '$') {
            let (part, consumed) = parse_dynamic(rest);
            if !literal.is_empty() {
                parts.push(PathPart::Static(std::mem::take(&mut literal)));
            }
            parts.push(part);
            rest = &rest[consumed..];
            at_segment_start = false;
            continue;
        }

        literal.push(c);
        at_segment_start = c == '/';
        rest = &rest[c.len_utf8()..];
    }

    if !literal.is_empty() {
        parts.push(PathPart::Static(literal));
    }
    PathPattern::new(parts)
}

/// Parses `:name`, `*name` or `$name<regex>` at the start of `input`.
fn parse_dynamic(input: &str) -> (PathPart, usize) {
    let segment_end = input.find('/').unwrap_or(input.len());

    if let Some(dynamic) = input.strip_prefix('$') {
        if let (Some(lt), Some(gt)) = (dynamic.find('<'), dynamic.find('>')) {
            let name = &dynamic[..lt];
            if lt < gt && is_identifier(name) && gt > lt + 1 {
                let part = PathPart::Dynamic {
                    name: name.to_string(),
                    constraint: Some(dynamic[lt + 1..gt].to_string()),
                };
                return (part, gt + 2);
            }
        }
        return (PathPart::Unparsed(input[..segment_end].to_string()), segment_end);
    }

    let name = &input[1..segment_end];
    if is_identifier(name) {
        let part = PathPart::Dynamic {
            name: name.to_string(),
            constraint: None,
        };
        (part, segment_end)
    } else {
        (PathPart::Unparsed(input[..segment_end].to_string()), segment_end)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_call(call: &str) -> std::result::Result<(HandlerCall, Vec<RouteParameter>), String> {
    let call = call.trim().trim_start_matches('@');
    let (target, parameters) = match call.find('(') {
        Some(open) => {
            let inner = call[open + 1..]
                .trim_end()
                .strip_suffix(')')
                .ok_or_else(|| format!("unbalanced parameter list in '{}'", call))?;
            (&call[..open], parse_parameters(inner)?)
        }
        None => (call, Vec::new()),
    };

    let mut segments: Vec<&str> = target.trim().split('.').collect();
    if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
        return Err(format!("'{}' is not a Controller.method reference", target.trim()));
    }
    let method = segments.pop().unwrap_or_default().to_string();
    let controller = segments.pop().unwrap_or_default().to_string();

    Ok((
        HandlerCall {
            package: segments.join("."),
            controller,
            method,
        },
        parameters,
    ))
}

fn parse_parameters(list: &str) -> std::result::Result<Vec<RouteParameter>, String> {
    split_top_level(list, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(parse_parameter)
        .collect()
}

/// `name[: Type] [= fixed | ?= default]`
fn parse_parameter(declaration: &str) -> std::result::Result<RouteParameter, String> {
    let (signature, value) = match split_top_level(declaration, '=').as_slice() {
        [signature] => (*signature, None),
        [signature, value] => (*signature, Some(value.trim())),
        _ => return Err(format!("cannot read parameter '{}'", declaration)),
    };

    let (signature, is_default) = match signature.trim_end().strip_suffix('?') {
        Some(stripped) => (stripped, true),
        None => (signature, false),
    };

    let (name, type_name) = match signature.split_once(':') {
        Some((name, type_name)) => (name.trim(), type_name.trim()),
        None => (signature.trim(), "String"),
    };
    if !is_identifier(name) {
        return Err(format!("invalid parameter name '{}'", name));
    }

    let param = RouteParameter::new(name, type_name);
    Ok(match value {
        Some(value) if is_default => param.with_default(value),
        Some(value) => param.with_fixed(value),
        None => param,
    })
}

/// Splits on `separator` outside quotes and brackets.
fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' | '{' | '<' => depth += 1,
                ')' | ']' | '}' | '>' => depth -= 1,
                c if c == separator && depth == 0 => {
                    pieces.push(&input[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    pieces.push(&input[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveType, TypeDecl};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    const ROUTES: &str = r#"
# Settlements
GET     /apitest/search/:personalNumber/:propertyId   controllers.SettlementsSearcherController.search(personalNumber: String, propertyId: String)
GET     /apitest/settlements                         controllers.SettlementsSearcherController.list(limit: Option[Int] ?= None, sort ?= "date")

+ nocsrf
POST    /apitest/settlements                         @controllers.SettlementsSearcherController.create(version = "v1")
GET     /files/*file                                 controllers.Assets.at(path = "/public", file)
->      /admin                                       admin.Routes
"#;

    #[test]
    fn test_parse_routes() {
        let parsed = parse_str(ROUTES);

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.routes.len(), 4);

        let search = &parsed.routes[0];
        assert_eq!(search.verb, Some(HttpMethod::Get));
        assert_eq!(search.line, 3);
        assert_eq!(search.name(), "controllers.SettlementsSearcherController$.search");
        assert_eq!(
            search.path.render(),
            "/apitest/search/{personalNumber}/{propertyId}"
        );
        assert_eq!(search.parameters.len(), 2);
        assert_eq!(
            search.parameters[1].type_decl,
            TypeDecl::Primitive(PrimitiveType::String)
        );
    }

    #[test]
    fn test_parse_defaults_and_fixed_values() {
        let parsed = parse_str(ROUTES);

        let list = &parsed.routes[1];
        assert_eq!(list.parameters[0].name, "limit");
        assert_eq!(
            list.parameters[0].type_decl,
            TypeDecl::OptionalPrimitive(PrimitiveType::Integer)
        );
        assert_eq!(list.parameters[0].default.as_deref(), Some("None"));
        assert_eq!(list.parameters[1].type_name, "String");
        assert_eq!(list.parameters[1].default.as_deref(), Some("\"date\""));

        let create = &parsed.routes[2];
        assert_eq!(create.verb, Some(HttpMethod::Post));
        assert_eq!(create.call.controller, "SettlementsSearcherController");
        assert_eq!(create.parameters[0].fixed.as_deref(), Some("\"v1\""));
    }

    #[test]
    fn test_parse_wildcard_and_regex_segments() {
        let path = parse_path("/files/*file");
        assert!(path.has("file"));
        assert_eq!(path.render(), "/files/{file}");

        let path = parse_path("/items/$id<[0-9]+>/details");
        assert_eq!(
            path.parts[1],
            PathPart::Dynamic {
                name: "id".to_string(),
                constraint: Some("[0-9]+".to_string())
            }
        );
        assert_eq!(path.render(), "/items/{id}/details");
    }

    #[test]
    fn test_malformed_dynamic_segment_is_unparsed() {
        let path = parse_path("/items/$id<>");
        assert_eq!(path.parts[1], PathPart::Unparsed("$id<>".to_string()));
        assert!(!path.has("id"));
    }

    #[test]
    fn test_unknown_verb_keeps_route_without_verb() {
        let parsed = parse_str("TRACE /debug controllers.Debug.trace");
        assert_eq!(parsed.routes.len(), 1);
        assert_eq!(parsed.routes[0].verb, None);
        assert!(parsed.routes[0].parameters.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_reported() {
        let content = "GET /ok controllers.A.ok\nGET missing-slash controllers.A.b\nGET /broken controllers.A.c(x: Int\nGET /noop\n";
        let parsed = parse_str(content);

        assert_eq!(parsed.routes.len(), 1);
        let lines: Vec<usize> = parsed
            .errors
            .iter()
            .map(|e| match e {
                Error::RouteError { line, .. } => *line,
                other => panic!("unexpected error {:?}", other),
            })
            .collect();
        assert_eq!(lines, vec![2, 3, 4]);
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        assert_eq!(
            split_top_level(r#"a: Map[String, Int], b = "x,y", c"#, ','),
            vec!["a: Map[String, Int]", r#" b = "x,y""#, " c"]
        );
    }

    #[test]
    fn test_parse_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routes");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(ROUTES.as_bytes()).unwrap();

        let parsed = parse_file(&path).unwrap();
        assert_eq!(parsed.routes.len(), 4);

        let missing = parse_file(&temp_dir.path().join("nope"));
        assert!(missing
            .unwrap_err()
            .to_string()
            .contains("Failed to read routes file"));
    }
}
