//! Swagger 2.0 documents from handler annotations and a routes table.
//!
//! The route table says which handler method serves which URL and verb. The
//! annotation manifest says what each handler class and method declares about
//! its API. This crate correlates the two and produces a [`document::Document`].
//!
//! # Architecture
//!
//! 1. [`annotations`] - The per-handler capability table, loaded from YAML
//! 2. [`routes`] - The route model and the Play-style routes file parser
//! 3. [`scanner`] and [`parser`] - Find and parse the Rust sources declaring models
//! 4. [`type_resolver`] and [`model_converter`] - Turn model types into schemas
//! 5. [`builder`] - Assembles the document
//! 6. [`serializer`] - Writes the document as YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use swagger_from_routes::{
//!     annotations::ApiManifest,
//!     builder::DocumentAssembler,
//!     config::SwaggerConfig,
//!     model_converter::SourceModelConverter,
//!     parser::AstParser,
//!     routes::{play, RouteTable},
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//!     type_resolver::TypeResolver,
//! };
//! use std::path::{Path, PathBuf};
//!
//! let manifest = ApiManifest::load(Path::new("conf/api.yaml")).unwrap();
//! let routes = RouteTable::from_entries(play::parse_file(Path::new("conf/routes")).unwrap().routes);
//!
//! let scan = FileScanner::new(vec![PathBuf::from("app/models")]).scan().unwrap();
//! let parsed = AstParser::parse_files(&scan.rust_files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//! let mut converter = SourceModelConverter::new(TypeResolver::new(parsed));
//!
//! let config = SwaggerConfig::new("/apitest");
//! let document = DocumentAssembler::new(&config, &routes, &mut converter)
//!     .build(&manifest)
//!     .unwrap();
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! See the [`cli`] module.

pub mod annotations;
pub mod builder;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod model_converter;
pub mod parser;
pub mod routes;
pub mod scanner;
pub mod schema;
pub mod serializer;
pub mod type_resolver;
pub mod types;
