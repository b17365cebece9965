//! Document assembly.
//!
//! [`DocumentAssembler`] drives a build in two passes over the handler
//! classes of an [`AnnotationSource`]:
//!
//! 1. Global definition blocks are merged into the document by
//!    [`DefinitionRegistry`], then anything still unset is seeded from the
//!    [`Config`].
//! 2. Every public, non-overridden method of a visible class that has a
//!    matching route in the [`RouteIndex`] becomes an operation through
//!    [`OperationBuilder`].
//!
//! Malformed input degrades locally: the affected field, parameter,
//! response or operation is left out and a warning is logged. The one
//! exception is an implicit parameter that cannot be described, which
//! aborts the build.

pub mod definitions;
pub mod extensions;
pub mod mapper;
pub mod operation;
pub mod parameters;
pub mod responses;

pub use definitions::DefinitionRegistry;
pub use mapper::TypeSchemaMapper;
pub use operation::{operation_path, ClassContext, OperationBuilder, PlacedOperation};
pub use parameters::ParameterResolver;
pub use responses::ResponseResolver;

use crate::annotations::AnnotationSource;
use crate::config::Config;
use crate::document::{Document, Tag};
use crate::error::Result;
use crate::model_converter::ModelConverter;
use crate::routes::RouteIndex;
use log::{debug, info};

/// Description of every synthesised or inferred success response.
pub const SUCCESSFUL_OPERATION: &str = "successful operation";

/// Builds a [`Document`] from handler metadata and a route table.
pub struct DocumentAssembler<'a> {
    config: &'a dyn Config,
    routes: &'a dyn RouteIndex,
    converter: &'a mut dyn ModelConverter,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(config: &'a dyn Config, routes: &'a dyn RouteIndex, converter: &'a mut dyn ModelConverter) -> Self {
        Self {
            config,
            routes,
            converter,
        }
    }

    /// Builds a fresh document.
    pub fn build(&mut self, source: &dyn AnnotationSource) -> Result<Document> {
        self.build_into(source, Document::new())
    }

    /// Builds into an existing document and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::InvalidImplicitParameter`] when an
    /// implicit parameter has no name or a malformed allowable range.
    pub fn build_into(&mut self, source: &dyn AnnotationSource, mut document: Document) -> Result<Document> {
        let classes = source.handler_classes();
        let routes = self.routes;

        let mut registry = DefinitionRegistry::new(&mut document);
        for class in classes {
            if let Some(definition) = &class.definition {
                debug!("Reading global definition from {}", class.name);
                registry.read_definition(definition);
            }
        }
        registry.seed_from_config(self.config);

        let mut operations = OperationBuilder::new(self.config, source, TypeSchemaMapper::new(&mut *self.converter));

        for class in classes {
            let Some(api) = class.api.as_ref() else {
                debug!("{} has no api block, skipping", class.name);
                continue;
            };
            if api.hidden {
                debug!("{} is hidden, skipping", class.name);
                continue;
            }

            let context = ClassContext::from_api(api);
            for tag in &context.tags {
                document.add_tag(Tag::named(tag.clone()));
            }

            for method in class.methods.iter().filter(|m| m.public && !m.overridden) {
                let name = class.full_method_name(&method.name);
                let Some(route) = routes.get(&name) else {
                    debug!("No route bound to {}, skipping", name);
                    continue;
                };

                if let Some(placed) = operations.build_operation(class, method, route, &context, &mut document)? {
                    operation::register(&mut document, placed);
                }
            }
        }

        info!(
            "Built {} operations across {} paths with {} definitions",
            document.operation_count(),
            document.paths.len(),
            document.definitions.len()
        );

        Ok(document)
    }
}

/// Splits a comma separated list, dropping empty items.
pub(crate) fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
