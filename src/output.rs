//! Run summary types for console and JSON output.
//!
//! The generator reports events as it goes (via [`crate::interaction`]) and
//! returns a [`RunSummary`] describing the whole run. With `--format json`
//! the summary is emitted as pretty JSON on stdout; the field set is the
//! stable machine-readable contract of the tool.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

/// Summary of a generation run.
///
/// `processed` counts new files created plus successful merges; skipped
/// files are listed but never counted.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of source files that produced or updated a test artifact.
    pub processed: usize,
    /// Test files created from scratch (paths relative to the bundle root).
    pub created: Vec<String>,
    /// Existing test files that were merged into.
    pub merged: Vec<String>,
    /// Source files skipped (unresolvable, no eligible methods, declined).
    pub skipped: Vec<String>,
    /// Total number of method stubs spliced into existing files.
    pub methods_added: usize,
}

impl RunSummary {
    /// Record a created test file.
    pub fn record_created(&mut self, path: impl Into<String>) {
        self.created.push(path.into());
        self.processed += 1;
    }

    /// Record a merged test file and how many stubs it received.
    pub fn record_merged(&mut self, path: impl Into<String>, added: usize) {
        self.merged.push(path.into());
        self.methods_added += added;
        self.processed += 1;
    }

    /// Record a skipped source file.
    pub fn record_skipped(&mut self, path: impl Into<String>) {
        self.skipped.push(path.into());
    }
}

/// Serialize a run summary as pretty JSON to the given writer.
pub fn emit_summary(summary: &RunSummary, writer: &mut dyn Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| io::Error::other(format!("JSON serialization error: {}", e)))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_update_processed_count() {
        let mut summary = RunSummary::default();
        summary.record_created("Tests/FooTest.php");
        summary.record_merged("Tests/BarTest.php", 2);
        summary.record_skipped("Baz.php");

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.methods_added, 2);
        assert_eq!(summary.created, vec!["Tests/FooTest.php"]);
        assert_eq!(summary.merged, vec!["Tests/BarTest.php"]);
        assert_eq!(summary.skipped, vec!["Baz.php"]);
    }

    #[test]
    fn summary_serializes_all_fields() {
        let mut summary = RunSummary::default();
        summary.record_created("Tests/FooTest.php");

        let mut buf = Vec::new();
        emit_summary(&summary, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("\"processed\": 1"));
        assert!(text.contains("\"created\""));
        assert!(text.contains("Tests/FooTest.php"));
        assert!(text.contains("\"methods_added\": 0"));
    }

    #[test]
    fn summary_round_trips_through_json() {
        let mut summary = RunSummary::default();
        summary.record_merged("Tests/BarTest.php", 3);

        let json = serde_json::to_string(&summary).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.processed, 1);
        assert_eq!(back.methods_added, 3);
    }
}
