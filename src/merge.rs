//! Drift detector and merge planner.
//!
//! Compares an existing test file's actual identity against the expected
//! identity, asks for confirmation before rewriting mismatches, and splices
//! the missing method stubs just before the class's closing brace. The plan
//! is computed on a copy of the file's line array; the caller writes it back
//! verbatim or, on decline, leaves the file untouched.

use regex::Regex;

use thiserror::Error;

use crate::emit::MethodStub;
use crate::interaction::InteractionError;
use crate::resolve::{ExistingTest, TestTarget};

/// Error type for merge planning.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The namespace declaration line vanished between readback and planning.
    #[error("cannot find the namespace declaration line in {path}")]
    NamespaceLineNotFound { path: String },

    /// The class declaration line vanished between readback and planning.
    #[error("cannot find the class declaration line in {path}")]
    ClassLineNotFound { path: String },

    /// The confirmation prompt failed.
    #[error(transparent)]
    Interaction(#[from] InteractionError),
}

/// A computed merge: the full rewritten line array plus the names of the
/// stubs that were spliced in.
#[derive(Debug, Clone)]
pub struct MergePlan {
    /// Lines to write back verbatim (each retains its terminator).
    pub lines: Vec<String>,
    /// Generated method names inserted, in insertion order.
    pub added: Vec<String>,
}

/// Outcome of planning against one existing test file.
#[derive(Debug)]
pub enum PlanOutcome {
    Plan(MergePlan),
    /// The user declined an identity rewrite; the file must be skipped
    /// entirely, with no partial merge.
    Declined,
}

/// Plan the merge of `stubs` into an existing test file.
///
/// `confirm` is called once per identity mismatch with the prompt text; a
/// `false` answer abandons the whole file.
pub fn plan(
    target: &TestTarget,
    existing: &ExistingTest,
    stubs: &[MethodStub],
    base_test_class: &str,
    confirm: &mut dyn FnMut(&str) -> Result<bool, InteractionError>,
) -> Result<PlanOutcome, MergeError> {
    let mut lines = existing.lines.clone();
    // Insertion point: just before the class's closing brace. Identity
    // rewrites that insert a line above it shift the cursor accordingly.
    let mut cursor = (existing.end_line as usize).saturating_sub(1);

    // Namespace drift.
    if existing.namespace.as_deref() != Some(target.namespace.as_str()) {
        let prompt = format!("Namespace in {} is bad, overwrite?", target.path.display());
        if !confirm(&prompt)? {
            return Ok(PlanOutcome::Declined);
        }
        match &existing.namespace {
            Some(actual) => {
                let pattern = Regex::new(&format!(r"namespace\s+{}\s*;", regex::escape(actual)))
                    .expect("escaped namespace pattern is valid");
                let idx = lines
                    .iter()
                    .position(|l| pattern.is_match(l))
                    .ok_or_else(|| MergeError::NamespaceLineNotFound {
                        path: target.path.display().to_string(),
                    })?;
                let ending = line_ending(&lines[idx]).to_string();
                lines[idx] = format!("namespace {};{}", target.namespace, ending);
            }
            None => {
                // No declaration to rewrite: insert one after the open tag.
                let idx = lines
                    .iter()
                    .position(|l| l.contains("<?php"))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                lines.insert(idx, format!("namespace {};\n", target.namespace));
                if idx <= cursor {
                    cursor += 1;
                }
            }
        }
    }

    // Class-name drift.
    if existing.class_name != target.class_name {
        let prompt = format!("Class in {} is bad, overwrite?", target.path.display());
        if !confirm(&prompt)? {
            return Ok(PlanOutcome::Declined);
        }
        let pattern = Regex::new(&format!(r"class\s+{}\b", regex::escape(&existing.class_name)))
            .expect("escaped class pattern is valid");
        let idx = lines
            .iter()
            .position(|l| pattern.is_match(l))
            .ok_or_else(|| MergeError::ClassLineNotFound {
                path: target.path.display().to_string(),
            })?;
        let ending = line_ending(&lines[idx]).to_string();
        lines[idx] = format!(
            "class {} extends {}{}",
            target.class_name, base_test_class, ending
        );
    }

    // Splice missing stubs, advancing the cursor by inserted line count so
    // later stubs land after earlier ones.
    let mut added = Vec::new();
    for stub in stubs {
        if existing.declares(&stub.name) {
            continue;
        }
        let stub_lines: Vec<String> = stub.text.split_inclusive('\n').map(String::from).collect();
        let count = stub_lines.len();
        let at = cursor.min(lines.len());
        lines.splice(at..at, stub_lines);
        cursor += count;
        added.push(stub.name.clone());
    }

    Ok(PlanOutcome::Plan(MergePlan { lines, added }))
}

/// The terminator of a raw line (`\r\n`, `\n`, or nothing at EOF).
fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

// ============================================================================
// Tests
// ============================================================================
