use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use syn::visit::Visit;

/// Parser for the Rust source files that declare API models.
///
/// Model structs and enums are read straight from source with `syn`; the
/// resulting syntax trees feed the [`TypeResolver`](crate::type_resolver::TypeResolver).
///
/// # Example
///
/// ```no_run
/// use swagger_from_routes::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("app/models.rs")).unwrap();
/// println!("Declared models: {:?}", parsed.model_names());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file (or a label for in-memory sources)
    pub path: PathBuf,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl ParsedFile {
    /// Names of all structs and enums declared in the file, including those
    /// nested in inline modules.
    pub fn model_names(&self) -> Vec<String> {
        let mut visitor = ModelNameVisitor::default();
        visitor.visit_file(&self.syntax_tree);
        visitor.names
    }
}

/// Collects struct and enum names, skipping items local to function bodies.
#[derive(Default)]
struct ModelNameVisitor {
    names: Vec<String>,
}

impl<'ast> Visit<'ast> for ModelNameVisitor {
    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        self.names.push(node.ident.to_string());
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        self.names.push(node.ident.to_string());
    }

    fn visit_item_fn(&mut self, _node: &'ast syn::ItemFn) {}

    fn visit_item_impl(&mut self, _node: &'ast syn::ItemImpl) {}
}

impl AstParser {
    /// Parses Rust source text that did not come from disk.
    ///
    /// `label` is recorded as the file path so log messages stay meaningful.
    pub fn parse_source(label: impl Into<PathBuf>, content: &str) -> Result<ParsedFile> {
        let path = label.into();
        let syntax_tree = syn::parse_file(content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        Ok(ParsedFile { path, syntax_tree })
    }

    /// Reads and parses a single model source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid Rust.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing model source: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let parsed = Self::parse_source(path, &content)?;
        debug!(
            "Parsed {} ({} model declarations)",
            path.display(),
            parsed.model_names().len()
        );
        Ok(parsed)
    }

    /// Parses several files, continuing past failures.
    ///
    /// A file with syntax errors only loses its own models; the rest of the
    /// document can still be produced.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} model sources", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| {
                Self::parse_file(path).map_err(|e| {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    e
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}
