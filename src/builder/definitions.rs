use super::extensions::parse_extensions;
use super::non_empty;
use crate::annotations::{ExternalDocsDefinition, SecurityDefinitions, SwaggerDefinition};
use crate::config::Config;
use crate::document::{Contact, Document, ExternalDocs, License, Scheme, SecurityScheme, Tag};
use log::{debug, warn};

/// Merges global API metadata into a document.
///
/// Empty values never overwrite what is already there, so reading the same
/// definition twice leaves the document unchanged.
pub struct DefinitionRegistry<'d> {
    document: &'d mut Document,
}

impl<'d> DefinitionRegistry<'d> {
    pub fn new(document: &'d mut Document) -> Self {
        Self { document }
    }

    pub fn read_definition(&mut self, definition: &SwaggerDefinition) {
        if let Some(host) = non_empty(&definition.host) {
            self.document.host = Some(host);
        }
        if let Some(base_path) = non_empty(&definition.base_path) {
            self.document.base_path = Some(base_path);
        }

        self.read_info(definition);

        for media_type in &definition.consumes {
            self.document.add_consumes(media_type);
        }
        for media_type in &definition.produces {
            self.document.add_produces(media_type);
        }

        if let Some(docs) = external_docs(&definition.external_docs) {
            self.document.external_docs = Some(docs);
        }

        for tag in &definition.tags {
            let Some(name) = non_empty(&tag.name) else {
                debug!("Skipping tag definition without a name");
                continue;
            };
            self.document.add_tag(Tag {
                name,
                description: non_empty(&tag.description),
                external_docs: external_docs(&tag.external_docs),
                extensions: parse_extensions(&tag.extensions),
            });
        }

        self.read_security(&definition.security_definition);

        for scheme in &definition.schemes {
            if scheme.trim().eq_ignore_ascii_case("default") {
                continue;
            }
            match Scheme::parse(scheme) {
                Some(scheme) => self.document.add_scheme(scheme),
                None => warn!("Ignoring unknown scheme '{}'", scheme),
            }
        }
    }

    /// Fills host, base path, title, version and schemes where the global
    /// definition left them unset.
    pub fn seed_from_config(&mut self, config: &dyn Config) {
        if self.document.host.is_none() {
            self.document.host = config.host().and_then(non_empty);
        }
        if self.document.base_path.is_none() {
            self.document.base_path = non_empty(config.base_path());
        }
        if self.document.info.title.is_empty() {
            if let Some(title) = config.title() {
                self.document.info.title = title.to_string();
            }
        }
        if self.document.info.version.is_empty() {
            if let Some(version) = config.version() {
                self.document.info.version = version.to_string();
            }
        }
        if self.document.schemes.is_empty() {
            for scheme in config.schemes() {
                self.document.add_scheme(*scheme);
            }
        }
    }

    fn read_info(&mut self, definition: &SwaggerDefinition) {
        let declared = &definition.info;
        let info = &mut self.document.info;

        if let Some(title) = non_empty(&declared.title) {
            info.title = title;
        }
        if let Some(version) = non_empty(&declared.version) {
            info.version = version;
        }
        if let Some(description) = non_empty(&declared.description) {
            info.description = Some(description);
        }
        if let Some(terms) = non_empty(&declared.terms_of_service) {
            info.terms_of_service = Some(terms);
        }
        if let Some(name) = non_empty(&declared.contact.name) {
            info.contact = Some(Contact {
                name,
                url: non_empty(&declared.contact.url),
                email: non_empty(&declared.contact.email),
            });
        }
        if let Some(name) = non_empty(&declared.license.name) {
            info.license = Some(License {
                name,
                url: non_empty(&declared.license.url),
            });
        }
        info.extensions.extend(parse_extensions(&declared.extensions));
    }

    fn read_security(&mut self, definitions: &SecurityDefinitions) {
        let schemes = &mut self.document.security_definitions;

        for api_key in &definitions.api_key_auth_definitions {
            let Some(key) = non_empty(&api_key.key) else { continue };
            schemes.insert(
                key,
                SecurityScheme::ApiKey {
                    name: api_key.name.trim().to_string(),
                    location: api_key.location,
                    description: non_empty(&api_key.description),
                },
            );
        }

        for basic in &definitions.basic_auth_definitions {
            let Some(key) = non_empty(&basic.key) else { continue };
            schemes.insert(
                key,
                SecurityScheme::Basic {
                    description: non_empty(&basic.description),
                },
            );
        }

        for oauth in &definitions.oauth2_definitions {
            let Some(key) = non_empty(&oauth.key) else { continue };
            let scopes = oauth
                .scopes
                .iter()
                .filter(|scope| !scope.name.trim().is_empty())
                .map(|scope| (scope.name.trim().to_string(), scope.description.clone()))
                .collect();
            schemes.insert(
                key,
                SecurityScheme::OAuth2 {
                    flow: oauth.flow,
                    authorization_url: non_empty(&oauth.authorization_url),
                    token_url: non_empty(&oauth.token_url),
                    scopes,
                    description: non_empty(&oauth.description),
                },
            );
        }
    }
}

fn external_docs(declared: &ExternalDocsDefinition) -> Option<ExternalDocs> {
    let docs = ExternalDocs {
        description: non_empty(&declared.value),
        url: non_empty(&declared.url),
    };
    (docs.description.is_some() || docs.url.is_some()).then_some(docs)
}
