//! Bundle file discovery.
//!
//! Walks the bundle root and yields every `*.php` file that is not under an
//! excluded directory, as a [`SourceUnit`] carrying the absolute path, the
//! root-relative path, and the relative containing directory.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Directory names excluded from the scan by default.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 6] = [
    "Tests",
    "Entity",
    "DependencyInjection",
    "DataFixtures",
    "Form",
    "Security",
];

/// Error type for file discovery.
#[derive(Debug, Error)]
pub enum FileError {
    /// IO error while walking the tree.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for file discovery.
pub type FileResult<T> = Result<T, FileError>;

/// One discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the scanned root, `/`-separated.
    pub rel_path: String,
    /// Containing directory relative to the root; empty at the root itself.
    pub rel_dir: String,
}

/// Collect PHP files by walking the bundle root.
///
/// A file is excluded when any *directory* component of its relative path is
/// named in `exclude` or starts with a dot. Results are sorted by relative
/// path for deterministic processing order.
pub fn collect_source_files(root: &Path, exclude: &[String]) -> FileResult<Vec<SourceUnit>> {
    let mut units = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "php") {
            continue;
        }

        // Filter on workspace-relative components only; the root itself may
        // live under an arbitrarily named parent (e.g. a temp directory).
        let rel = match path.strip_prefix(root) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let rel_dir_path = rel.parent().unwrap_or(Path::new(""));
        let excluded = rel_dir_path.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            name.starts_with('.') || exclude.iter().any(|e| e == name.as_ref())
        });
        if excluded {
            continue;
        }

        units.push(SourceUnit {
            path: path.to_path_buf(),
            rel_path: to_slash_string(rel),
            rel_dir: to_slash_string(rel_dir_path),
        });
    }

    units.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(units)
}

fn to_slash_string(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

// ============================================================================
// Tests
// ============================================================================
