use crate::annotations::{AnnotationSource, ApiManifest};
use crate::builder::DocumentAssembler;
use crate::config::SwaggerConfig;
use crate::model_converter::SourceModelConverter;
use crate::parser::{AstParser, ParsedFile};
use crate::routes::{play, RouteTable};
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::type_resolver::TypeResolver;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Generate a Swagger 2.0 document from handler annotations and a routes file
#[derive(Parser, Debug)]
#[command(name = "swagger-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Annotation manifest (YAML)
    #[arg(short = 'm', long = "manifest", value_name = "FILE")]
    pub manifest: PathBuf,

    /// Play-style routes file
    #[arg(short = 'r', long = "routes", value_name = "FILE")]
    pub routes: PathBuf,

    /// Directory or file with model structs and enums (repeatable)
    #[arg(long = "models", value_name = "PATH")]
    pub models: Vec<PathBuf>,

    /// Base path stripped from route paths
    #[arg(long = "base-path", default_value = "/")]
    pub base_path: String,

    /// Host written to the document when the manifest declares none
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Checks that the input files exist.
pub fn validate_args(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    for (label, path) in [("Manifest", &args.manifest), ("Routes file", &args.routes)] {
        if !path.is_file() {
            anyhow::bail!("{} does not exist or is not a file: {}", label, path.display());
        }
    }

    info!("Manifest: {}", args.manifest.display());
    info!("Routes: {}", args.routes.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Loads the inputs, builds the document and writes it out.
pub fn run(args: CliArgs) -> Result<()> {
    info!("Loading annotation manifest...");
    let manifest = ApiManifest::load(&args.manifest)?;
    let class_count = manifest.handler_classes().len();

    info!("Parsing routes...");
    let parsed_routes = play::parse_file(&args.routes)?;
    for error in &parsed_routes.errors {
        warn!("{}", error);
    }
    let routes = RouteTable::from_entries(parsed_routes.routes);
    info!("Found {} routes", routes.len());

    let resolver = TypeResolver::new(load_models(&args.models)?);
    let model_files = resolver.file_count();
    let mut converter = SourceModelConverter::new(resolver);

    let mut config = SwaggerConfig::new(args.base_path.clone());
    if let Some(host) = &args.host {
        config = config.with_host(host.clone());
    }

    info!("Building Swagger document...");
    let document = DocumentAssembler::new(&config, &routes, &mut converter)
        .build(&manifest)
        .context("Failed to build Swagger document")?;

    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)?;
        info!("Wrote Swagger document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Summary:");
    info!("  - Handler classes: {}", class_count);
    info!("  - Routes: {}", routes.len());
    info!("  - Model files: {}", model_files);
    info!("  - Operations: {}", document.operation_count());
    info!("  - Definitions: {}", document.definitions.len());

    Ok(())
}

fn load_models(roots: &[PathBuf]) -> Result<Vec<ParsedFile>> {
    if roots.is_empty() {
        warn!("No model sources given, named types will not be described");
        return Ok(Vec::new());
    }

    let scan_result = FileScanner::new(roots.to_vec()).scan()?;
    info!("Found {} model files", scan_result.rust_files.len());

    let parsed = AstParser::parse_files(&scan_result.rust_files)
        .into_iter()
        .filter_map(|result| match result {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping model file: {:#}", e);
                None
            }
        })
        .collect();
    Ok(parsed)
}
