//! Test identity resolver.
//!
//! Computes the expected test class name, test namespace, and test file path
//! for a source class, and reads back the actual identity of a pre-existing
//! test file: namespace, class name, newline-preserving line array, closing
//! brace line, and the set of declared test-method names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::files::SourceUnit;
use crate::php::introspect::introspect;
use crate::php::lexer::tokenize;
use crate::php::locate::locate;

/// Error type for test-target resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// An existing test file has no locatable class; merging into it would
    /// be blind, so the caller skips the source file with a warning.
    #[error("cannot locate a class in existing test file {path}")]
    UnreadableTestFile { path: String },

    /// IO error reading an existing test file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Actual identity and content of a pre-existing test file.
#[derive(Debug, Clone)]
pub struct ExistingTest {
    pub namespace: Option<String>,
    pub class_name: String,
    /// Raw lines, each retaining its line terminator.
    pub lines: Vec<String>,
    /// 1-indexed line of the test class's closing brace.
    pub end_line: u32,
    /// Names of all methods the test class declares.
    pub methods: Vec<String>,
}

impl ExistingTest {
    /// True if the test class already declares this method (PHP method
    /// names are case-insensitive).
    pub fn declares(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(name))
    }
}

/// Expected test identity for one source class, plus the on-disk state.
#[derive(Debug, Clone)]
pub struct TestTarget {
    /// Expected test namespace, `\`-separated.
    pub namespace: String,
    /// Expected test class simple name (`{SourceClass}Test`).
    pub class_name: String,
    /// Expected test file path.
    pub path: PathBuf,
    /// The file as found on disk, when it exists.
    pub existing: Option<ExistingTest>,
}

/// Compute the expected test identity and read back any existing file.
pub fn resolve(
    bundle_root: &Path,
    bundle_namespace: &str,
    unit: &SourceUnit,
    class_name: &str,
) -> Result<TestTarget, ResolveError> {
    let test_class = format!("{}Test", class_name);

    let namespace = if unit.rel_dir.is_empty() {
        format!("{}\\Tests", bundle_namespace)
    } else {
        format!("{}\\Tests\\{}", bundle_namespace, leaf_dir(&unit.rel_dir))
    };

    let mut path = bundle_root.join("Tests");
    if !unit.rel_dir.is_empty() {
        path = path.join(&unit.rel_dir);
    }
    path = path.join(format!("{}.php", test_class));

    let existing = if path.is_file() {
        Some(read_existing(&path)?)
    } else {
        None
    };

    Ok(TestTarget {
        namespace,
        class_name: test_class,
        path,
        existing,
    })
}

/// Final segment of a relative directory path.
fn leaf_dir(rel_dir: &str) -> &str {
    rel_dir.rsplit('/').next().unwrap_or(rel_dir)
}

fn read_existing(path: &Path) -> Result<ExistingTest, ResolveError> {
    let content = fs::read_to_string(path)?;
    let tokens = tokenize(&content);

    let unreadable = || ResolveError::UnreadableTestFile {
        path: path.display().to_string(),
    };
    let located = locate(&tokens).map_err(|_| unreadable())?;
    let descriptor = introspect(&content, &tokens).map_err(|_| unreadable())?;

    Ok(ExistingTest {
        namespace: located.namespace,
        class_name: located.class_name,
        lines: content.split_inclusive('\n').map(String::from).collect(),
        end_line: descriptor.end_line,
        methods: descriptor.method_names(),
    })
}

// ============================================================================
// Tests
// ============================================================================
