//! Binary entry point for the stubgen CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Generate/merge test skeletons for a bundle
//! stubgen AppBundle --root src/AppBundle
//!
//! # Non-interactive run that rewrites drifted identities
//! stubgen AppBundle --root src/AppBundle --overwrite always
//!
//! # Machine-readable summary
//! stubgen AppBundle --root src/AppBundle --format json
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use stubgen::error::StubgenError;
use stubgen::generator::{self, GeneratorConfig, OverwritePolicy};
use stubgen::interaction::TerminalInteraction;
use stubgen::output::emit_summary;
use stubgen::template::TemplateEngine;

// ============================================================================
// CLI Structure
// ============================================================================

/// PHPUnit test skeleton generator for Symfony-style PHP bundles.
///
/// Scans the bundle's classes and creates matching test skeletons under
/// `Tests/`, merging new test-method stubs into previously generated files
/// without clobbering manual edits.
#[derive(Parser, Debug)]
#[command(name = "stubgen", version, about = "PHPUnit test skeleton generator")]
struct Cli {
    /// Bundle name (must end with `Bundle`).
    bundle: String,

    /// Bundle root directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Bundle namespace root (default: the bundle name without `Bundle`).
    #[arg(long)]
    namespace: Option<String>,

    /// Directory names to exclude from the scan (repeatable; replaces the
    /// default list: Tests, Entity, DependencyInjection, DataFixtures,
    /// Form, Security).
    #[arg(long)]
    exclude: Vec<String>,

    /// Only generate stubs for public methods.
    #[arg(long)]
    public_only: bool,

    /// Base test case class for generated classes.
    #[arg(long, default_value = "WebTestCase")]
    base_class: String,

    /// Template directory (default: built-in templates). Files are re-read
    /// on every render.
    #[arg(long)]
    templates: Option<PathBuf>,

    /// What to do when an existing test file's identity has drifted.
    #[arg(long, value_enum, default_value = "ask")]
    overwrite: OverwriteArg,

    /// Output format for the run summary.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Drift overwrite policy.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OverwriteArg {
    /// Prompt interactively (default yes).
    Ask,
    /// Rewrite without asking.
    Always,
    /// Never rewrite; drifted files are skipped.
    Never,
}

impl From<OverwriteArg> for OverwritePolicy {
    fn from(arg: OverwriteArg) -> Self {
        match arg {
            OverwriteArg::Ask => OverwritePolicy::Ask,
            OverwriteArg::Always => OverwritePolicy::Always,
            OverwriteArg::Never => OverwritePolicy::Never,
        }
    }
}

/// Output format for the run summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Console event lines only.
    Text,
    /// Console event lines plus a JSON summary on stdout.
    Json,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code().code())
        }
    }
}

/// Initialize the tracing subscriber on stderr.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), StubgenError> {
    let mut config = GeneratorConfig::new(cli.bundle, cli.root);
    config.namespace = cli.namespace;
    if !cli.exclude.is_empty() {
        config.exclude = cli.exclude;
    }
    config.include_non_public = !cli.public_only;
    config.base_test_class = cli.base_class;
    config.overwrite = cli.overwrite.into();

    let engine = match cli.templates {
        Some(dir) => TemplateEngine::from_dir(dir),
        None => TemplateEngine::builtin(),
    };
    let interaction = TerminalInteraction::new();

    let summary = generator::run(&config, &engine, &interaction)?;

    if cli.format == OutputFormat::Json {
        emit_summary(&summary, &mut io::stdout())?;
    }
    Ok(())
}
