//! Generation pipeline: sequential per-file batch driver.
//!
//! For each discovered source file: locate and introspect the class, filter
//! its methods, render the expected stubs, resolve the test-file identity,
//! and either write a fresh test class or merge the missing stubs into the
//! existing one. Skips are reported and excluded from the processed count;
//! the run ends with `Processed N files`.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::emit::{self, MethodStub, TestClassParams};
use crate::error::StubgenError;
use crate::files::{self, SourceUnit, DEFAULT_EXCLUDED_DIRS};
use crate::interaction::{Interaction, InteractionResult};
use crate::merge::{self, PlanOutcome};
use crate::output::RunSummary;
use crate::php::introspect::{eligible_methods, introspect};
use crate::php::lexer::tokenize;
use crate::resolve::{self, ResolveError};
use crate::template::Renderer;

/// What to do when an existing test file's identity has drifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Prompt interactively (default yes).
    #[default]
    Ask,
    /// Rewrite without asking.
    Always,
    /// Never rewrite; drifted files are skipped.
    Never,
}

/// Configuration for one generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Bundle name; must end with `Bundle`.
    pub bundle: String,
    /// Bundle namespace root; defaults to the bundle name without its
    /// `Bundle` suffix.
    pub namespace: Option<String>,
    /// Bundle root directory.
    pub root: PathBuf,
    /// Directory names excluded from the scan.
    pub exclude: Vec<String>,
    /// Include protected/private methods as stub candidates.
    pub include_non_public: bool,
    /// Base test case class for generated classes and drift rewrites.
    pub base_test_class: String,
    /// Drift overwrite policy.
    pub overwrite: OverwritePolicy,
}

impl GeneratorConfig {
    /// Config with the documented defaults.
    pub fn new(bundle: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        GeneratorConfig {
            bundle: bundle.into(),
            namespace: None,
            root: root.into(),
            exclude: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            include_non_public: true,
            base_test_class: "WebTestCase".to_string(),
            overwrite: OverwritePolicy::Ask,
        }
    }

    /// The effective bundle namespace.
    pub fn resolved_namespace(&self) -> String {
        match &self.namespace {
            Some(ns) => ns.clone(),
            None => self
                .bundle
                .strip_suffix("Bundle")
                .unwrap_or(&self.bundle)
                .to_string(),
        }
    }
}

/// Check the required `Bundle` suffix.
pub fn validate_bundle_name(name: &str) -> Result<(), StubgenError> {
    if name.ends_with("Bundle") && name.len() > "Bundle".len() {
        Ok(())
    } else {
        Err(StubgenError::InvalidBundleName {
            name: name.to_string(),
        })
    }
}

/// Run the generator over the whole bundle.
pub fn run(
    config: &GeneratorConfig,
    renderer: &dyn Renderer,
    interaction: &dyn Interaction,
) -> Result<RunSummary, StubgenError> {
    validate_bundle_name(&config.bundle)?;
    if !config.root.is_dir() {
        return Err(StubgenError::BundleRootNotFound {
            path: config.root.display().to_string(),
        });
    }

    let namespace = config.resolved_namespace();
    let units = files::collect_source_files(&config.root, &config.exclude)
        .map_err(|e| match e {
            files::FileError::Io(io) => StubgenError::Io(io),
        })?;

    let mut summary = RunSummary::default();
    for unit in &units {
        process_unit(config, &namespace, unit, renderer, interaction, &mut summary)?;
    }

    interaction.print_info(&format!("Processed {} files", summary.processed));
    Ok(summary)
}

/// Process one source file; skips are recorded, errors abort the run.
fn process_unit(
    config: &GeneratorConfig,
    bundle_namespace: &str,
    unit: &SourceUnit,
    renderer: &dyn Renderer,
    interaction: &dyn Interaction,
    summary: &mut RunSummary,
) -> Result<(), StubgenError> {
    let source = fs::read_to_string(&unit.path)?;
    let tokens = tokenize(&source);

    let descriptor = match introspect(&source, &tokens) {
        Ok(d) => d,
        Err(_) => {
            debug!(file = %unit.rel_path, "no resolvable class, skipping");
            summary.record_skipped(unit.rel_path.as_str());
            return Ok(());
        }
    };
    if descriptor.is_abstract || descriptor.is_interface {
        debug!(file = %unit.rel_path, "abstract or interface, skipping");
        summary.record_skipped(unit.rel_path.as_str());
        return Ok(());
    }

    let methods = eligible_methods(&descriptor, config.include_non_public);
    if methods.is_empty() {
        debug!(file = %unit.rel_path, "no eligible methods, skipping");
        summary.record_skipped(unit.rel_path.as_str());
        return Ok(());
    }

    let file_class_namespace = descriptor.namespace.clone().unwrap_or_default();
    let mut stubs = Vec::with_capacity(methods.len());
    for method in methods {
        let stub =
            emit::render_method_stub(renderer, &file_class_namespace, &descriptor.name, method)?;
        stubs.push(stub);
    }

    let target = match resolve::resolve(&config.root, bundle_namespace, unit, &descriptor.name) {
        Ok(t) => t,
        Err(ResolveError::UnreadableTestFile { path }) => {
            interaction.print_error(&format!(
                "Skipping file {}: cannot locate a class in {}",
                unit.path.display(),
                path
            ));
            summary.record_skipped(unit.rel_path.as_str());
            return Ok(());
        }
        Err(ResolveError::Io(e)) => return Err(StubgenError::Io(e)),
    };

    match &target.existing {
        Some(existing) => {
            let mut confirm =
                |prompt: &str| confirm_overwrite(config.overwrite, interaction, prompt);
            match merge::plan(
                &target,
                existing,
                &stubs,
                &config.base_test_class,
                &mut confirm,
            )? {
                PlanOutcome::Declined => {
                    interaction.print_error(&format!("Skipping file {}", unit.path.display()));
                    summary.record_skipped(unit.rel_path.as_str());
                }
                PlanOutcome::Plan(plan) => {
                    for name in &plan.added {
                        interaction
                            .print_info(&format!("Add function {} to {}", name, target.class_name));
                    }
                    fs::write(&target.path, plan.lines.concat())?;
                    summary.record_merged(target.path.display().to_string(), plan.added.len());
                }
            }
        }
        None => {
            write_new_class(config, renderer, unit, &descriptor, &file_class_namespace, &stubs, &target)?;
            interaction.print_info(&format!("Created {}", target.path.display()));
            summary.record_created(target.path.display().to_string());
        }
    }

    Ok(())
}

fn write_new_class(
    config: &GeneratorConfig,
    renderer: &dyn Renderer,
    unit: &SourceUnit,
    descriptor: &crate::php::introspect::ClassDescriptor,
    file_class_namespace: &str,
    stubs: &[MethodStub],
    target: &crate::resolve::TestTarget,
) -> Result<(), StubgenError> {
    let constructor_params = descriptor
        .constructor()
        .map(|m| m.params.as_slice())
        .unwrap_or(&[]);

    emit::write_test_class(
        renderer,
        &TestClassParams {
            target,
            file_class_namespace,
            file_class: &descriptor.name,
            stubs,
            constructor_params,
            insert_em: emit::needs_persistence_handle(&unit.rel_dir),
            base_test_class: &config.base_test_class,
        },
    )
    .map_err(|e| match e {
        emit::EmitError::Template(t) => StubgenError::Template(t),
        emit::EmitError::Io(io) => StubgenError::Io(io),
    })
}

/// Resolve one drift prompt through the configured policy.
fn confirm_overwrite(
    policy: OverwritePolicy,
    interaction: &dyn Interaction,
    prompt: &str,
) -> InteractionResult<bool> {
    match policy {
        OverwritePolicy::Always => Ok(true),
        OverwritePolicy::Never => Ok(false),
        OverwritePolicy::Ask => interaction.ask_confirm(prompt, true),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod bundle_name {
        use super::*;

        #[test]
        fn names_ending_in_bundle_pass() {
            assert!(validate_bundle_name("AppBundle").is_ok());
            assert!(validate_bundle_name("AcmeDemoBundle").is_ok());
        }

        #[test]
        fn names_without_the_suffix_fail() {
            assert!(validate_bundle_name("App").is_err());
            assert!(validate_bundle_name("BundleApp").is_err());
        }

        #[test]
        fn the_bare_suffix_is_not_a_name() {
            assert!(validate_bundle_name("Bundle").is_err());
            assert!(validate_bundle_name("").is_err());
        }

        #[test]
        fn invalid_name_maps_to_invalid_arguments() {
            let err = validate_bundle_name("App").unwrap_err();
            assert_eq!(err.exit_code().code(), 2);
        }
    }

    mod config {
        use super::*;

        #[test]
        fn namespace_defaults_to_stripped_bundle_name() {
            let config = GeneratorConfig::new("AppBundle", "/tmp/bundle");
            assert_eq!(config.resolved_namespace(), "App");
        }

        #[test]
        fn explicit_namespace_wins() {
            let mut config = GeneratorConfig::new("AppBundle", "/tmp/bundle");
            config.namespace = Some("Acme\\App".to_string());
            assert_eq!(config.resolved_namespace(), "Acme\\App");
        }

        #[test]
        fn defaults_match_the_documented_contract() {
            let config = GeneratorConfig::new("AppBundle", "/tmp/bundle");
            assert!(config.include_non_public);
            assert_eq!(config.base_test_class, "WebTestCase");
            assert_eq!(config.overwrite, OverwritePolicy::Ask);
            assert_eq!(config.exclude.len(), DEFAULT_EXCLUDED_DIRS.len());
        }
    }

    mod overwrite_policy {
        use super::*;
        use crate::interaction::InteractionResult;

        struct NeverAsked;

        impl Interaction for NeverAsked {
            fn ask_confirm(&self, _prompt: &str, _default: bool) -> InteractionResult<bool> {
                panic!("policy should decide without prompting");
            }
            fn print_info(&self, _message: &str) {}
            fn print_error(&self, _message: &str) {}
        }

        #[test]
        fn always_and_never_bypass_the_prompt() {
            assert!(confirm_overwrite(OverwritePolicy::Always, &NeverAsked, "?").unwrap());
            assert!(!confirm_overwrite(OverwritePolicy::Never, &NeverAsked, "?").unwrap());
        }
    }
}
