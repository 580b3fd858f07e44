//! Unified error type and exit-code constants for stubgen.
//!
//! Subsystem errors (template rendering, interaction, file discovery, merge
//! planning) are bridged into a single [`StubgenError`] via `From` impls so
//! the CLI can map every failure to a stable exit code.
//!
//! ## Exit Code Mapping
//!
//! - `2`: Invalid arguments (bad bundle name, malformed options)
//! - `3`: Resolution errors (bundle root not found)
//! - `4`: Generation errors (template rendering failed)
//! - `10`: Internal errors (IO failures, unexpected state)

use std::fmt;
use std::io;

use thiserror::Error;

use crate::interaction::InteractionError;
use crate::merge::MergeError;
use crate::template::TemplateError;

// ============================================================================
// Exit Codes
// ============================================================================

/// Stable exit codes for CLI failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Invalid arguments from the caller.
    InvalidArguments = 2,
    /// Resolution errors (bundle root not found).
    ResolutionError = 3,
    /// Generation errors (template rendering failed mid-run).
    GenerationError = 4,
    /// Internal errors (IO failures, bugs).
    InternalError = 10,
}

impl ExitCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the CLI and the generator pipeline.
///
/// Skips (unresolvable class, no eligible methods, declined overwrite) are
/// not errors; they are reported as console lines and excluded from the
/// processed count. Everything here aborts the run.
#[derive(Debug, Error)]
pub enum StubgenError {
    /// The supplied bundle name fails the required-suffix check.
    #[error("the bundle name must end with Bundle, got '{name}'")]
    InvalidBundleName { name: String },

    /// The bundle root directory does not exist.
    #[error("bundle root not found: {path}")]
    BundleRootNotFound { path: String },

    /// Template rendering failed (missing template, undefined variable).
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// The confirmation prompt failed.
    #[error("interaction error: {0}")]
    Interaction(#[from] InteractionError),

    /// Merge planning failed on an existing test file.
    #[error("merge error: {0}")]
    Merge(MergeError),

    /// IO error while reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<&StubgenError> for ExitCode {
    fn from(err: &StubgenError) -> Self {
        match err {
            StubgenError::InvalidBundleName { .. } => ExitCode::InvalidArguments,
            StubgenError::BundleRootNotFound { .. } => ExitCode::ResolutionError,
            StubgenError::Template(_) => ExitCode::GenerationError,
            StubgenError::Interaction(_) => ExitCode::InternalError,
            StubgenError::Merge(_) => ExitCode::InternalError,
            StubgenError::Io(_) => ExitCode::InternalError,
        }
    }
}

// MergeError wraps InteractionError; flatten interaction failures so the
// exit-code mapping stays stable either way.
impl From<MergeError> for StubgenError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::Interaction(inner) => StubgenError::Interaction(inner),
            other => StubgenError::Merge(other),
        }
    }
}

impl StubgenError {
    /// Get the exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod exit_code_mapping {
        use super::*;

        #[test]
        fn invalid_bundle_name_maps_to_invalid_arguments() {
            let err = StubgenError::InvalidBundleName {
                name: "App".to_string(),
            };
            assert_eq!(err.exit_code(), ExitCode::InvalidArguments);
            assert_eq!(err.exit_code().code(), 2);
        }

        #[test]
        fn bundle_root_not_found_maps_to_resolution_error() {
            let err = StubgenError::BundleRootNotFound {
                path: "/missing".to_string(),
            };
            assert_eq!(err.exit_code(), ExitCode::ResolutionError);
            assert_eq!(err.exit_code().code(), 3);
        }

        #[test]
        fn template_error_maps_to_generation_error() {
            let err = StubgenError::Template(TemplateError::NotFound {
                name: "method.php.tpl".to_string(),
            });
            assert_eq!(err.exit_code(), ExitCode::GenerationError);
            assert_eq!(err.exit_code().code(), 4);
        }

        #[test]
        fn io_error_maps_to_internal_error() {
            let err = StubgenError::Io(io::Error::other("boom"));
            assert_eq!(err.exit_code(), ExitCode::InternalError);
            assert_eq!(err.exit_code().code(), 10);
        }

        #[test]
        fn code_values_are_stable() {
            assert_eq!(ExitCode::InvalidArguments.code(), 2);
            assert_eq!(ExitCode::ResolutionError.code(), 3);
            assert_eq!(ExitCode::GenerationError.code(), 4);
            assert_eq!(ExitCode::InternalError.code(), 10);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn invalid_bundle_name_display() {
            let err = StubgenError::InvalidBundleName {
                name: "App".to_string(),
            };
            assert_eq!(err.to_string(), "the bundle name must end with Bundle, got 'App'");
        }

        #[test]
        fn display_shows_code() {
            assert_eq!(format!("{}", ExitCode::InvalidArguments), "2");
            assert_eq!(format!("{}", ExitCode::InternalError), "10");
        }
    }

    mod merge_error_conversion {
        use super::*;

        #[test]
        fn interaction_inside_merge_flattens() {
            let merge_err = MergeError::Interaction(InteractionError::Io("pipe closed".to_string()));
            let err = StubgenError::from(merge_err);
            assert!(matches!(err, StubgenError::Interaction(_)));
        }

        #[test]
        fn other_merge_errors_stay_merge() {
            let merge_err = MergeError::ClassLineNotFound {
                path: "Tests/FooTest.php".to_string(),
            };
            let err = StubgenError::from(merge_err);
            assert!(matches!(err, StubgenError::Merge(_)));
            assert_eq!(err.exit_code(), ExitCode::InternalError);
        }
    }
}
