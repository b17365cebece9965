use anyhow::{bail, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collects the Rust model sources under one or more directories.
///
/// A root may also name a single `.rs` file. Hidden directories and `target`
/// are skipped.
///
/// # Example
///
/// ```no_run
/// use swagger_from_routes::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(vec![PathBuf::from("./app/models")]);
/// let result = scanner.scan().unwrap();
/// println!("Found {} model sources", result.rust_files.len());
/// ```
pub struct FileScanner {
    roots: Vec<PathBuf>,
}

/// Files found by a scan, sorted and without duplicates.
pub struct ScanResult {
    pub rust_files: Vec<PathBuf>,
    /// Entries that could not be read; the scan continues past them
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// # Errors
    ///
    /// Returns an error if a root does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for root in &self.roots {
            if !root.exists() {
                bail!("Model path does not exist: {}", root.display());
            }
            debug!("Scanning {}", root.display());
            scan_root(root, &mut rust_files, &mut warnings);
        }

        rust_files.sort();
        rust_files.dedup();

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}

fn scan_root(root: &Path, rust_files: &mut Vec<PathBuf>, warnings: &mut Vec<String>) {
    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        if e.path() == root {
            return true;
        }
        let file_name = e.file_name().to_string_lossy();
        !file_name.starts_with('.') && file_name != "target"
    });

    for entry in walker {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                    rust_files.push(path.to_path_buf());
                }
            }
            Err(e) => {
                let warning = format!("Failed to access path: {}", e);
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }
}
