use super::mapper::TypeSchemaMapper;
use super::SUCCESSFUL_OPERATION;
use crate::annotations::{AnnotationSource, ApiResponse, HandlerMethod, ResponseHeader};
use crate::document::{Header, Response, Responses};
use crate::schema::{Model, Schema};
use crate::types::TypeRef;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Builds the response map of one operation.
pub struct ResponseResolver<'m, 'a> {
    mapper: &'m mut TypeSchemaMapper<'a>,
    annotations: &'m dyn AnnotationSource,
}

impl<'m, 'a> ResponseResolver<'m, 'a> {
    pub fn new(mapper: &'m mut TypeSchemaMapper<'a>, annotations: &'m dyn AnnotationSource) -> Self {
        Self { mapper, annotations }
    }

    /// The primary response comes from, in order: the operation's response
    /// reference, its declared response type, or the method's return type.
    /// Each declared response entry is then added under its own code.
    pub fn resolve_responses(
        &mut self,
        method: &HandlerMethod,
        definitions: &mut BTreeMap<String, Model>,
    ) -> Responses {
        let mut responses = Responses::default();
        let operation = method.operation.as_ref();
        let code = operation.map_or(200, |op| op.code);
        let headers = operation
            .map(|op| self.headers(&op.response_headers, definitions))
            .unwrap_or_default();

        let reference = operation
            .map(|op| op.response_reference.trim())
            .filter(|reference| !reference.is_empty());

        if let Some(reference) = reference {
            let mut response = Response::new(SUCCESSFUL_OPERATION);
            response.schema = Some(Schema::reference(reference));
            response.headers = headers;
            responses.insert(code, response);
        } else {
            let ty = operation
                .map(|op| &op.response)
                .filter(|ty| !ty.is_void())
                .unwrap_or(&method.return_type);
            let container = operation.map_or("", |op| op.response_container.as_str());

            if self.is_valid_response(ty) {
                if let Some(schema) = self.mapper.response_schema(ty, container, definitions) {
                    let mut response = Response::new(SUCCESSFUL_OPERATION);
                    response.schema = Some(schema);
                    response.headers = headers;
                    responses.insert(code, response);
                }
            }
        }

        for declared in &method.responses {
            let response = self.declared_response(declared, definitions);
            responses.insert(declared.code, response);
        }

        responses
    }

    fn declared_response(&mut self, declared: &ApiResponse, definitions: &mut BTreeMap<String, Model>) -> Response {
        let mut response = Response::new(declared.message.clone());
        response.headers = self.headers(&declared.response_headers, definitions);

        let reference = declared.reference.trim();
        if !reference.is_empty() {
            response.schema = Some(Schema::reference(reference));
        } else if !declared.response.is_void() {
            response.schema =
                self.mapper
                    .response_schema(&declared.response, &declared.response_container, definitions);
        }
        response
    }

    fn headers(
        &mut self,
        declared: &[ResponseHeader],
        definitions: &mut BTreeMap<String, Model>,
    ) -> BTreeMap<String, Header> {
        let mut headers = BTreeMap::new();

        for header in declared.iter().filter(|h| !h.name.is_empty()) {
            if header.response.is_void() {
                debug!("Response header {} has no type, skipping", header.name);
                continue;
            }
            match self
                .mapper
                .header_schema(&header.response, &header.response_container, definitions)
            {
                Some(schema) => {
                    let description = Some(header.description.clone()).filter(|d| !d.is_empty());
                    headers.insert(header.name.clone(), Header { description, schema });
                }
                None => warn!("Cannot describe response header {} ({})", header.name, header.response),
            }
        }

        headers
    }

    /// Void types and handler classes are never response bodies.
    fn is_valid_response(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Void => false,
            TypeRef::Named(name) if self.annotations.is_resource_class(name) => {
                debug!("{} is a handler class, not a response model", name);
                false
            }
            _ => true,
        }
    }
}
