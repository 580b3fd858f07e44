//! Template rendering seam and the default strict template engine.
//!
//! The emitter depends only on the [`Renderer`] trait
//! (`render(template_name, params) -> text`), so the engine can be swapped
//! out in tests. The default [`TemplateEngine`] supports:
//!
//! - `{{name}}` substitution with strict undefined-variable detection;
//! - non-nesting `{% if flag %}...{% endif %}` blocks gated by booleans;
//! - a directory source that re-reads the template file on **every** render
//!   (no caching; on-disk edits take effect immediately), and an embedded
//!   source carrying the crate's default templates.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

/// Default method-stub template name.
pub const METHOD_TEMPLATE: &str = "method.php.tpl";
/// Default test-class template name.
pub const CLASS_TEMPLATE: &str = "class.php.tpl";

const BUILTIN_METHOD: &str = include_str!("../templates/method.php.tpl");
const BUILTIN_CLASS: &str = include_str!("../templates/class.php.tpl");

// ============================================================================
// Errors
// ============================================================================

/// Error type for template loading and rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template with that name in the active source.
    #[error("template not found: {name}")]
    NotFound { name: String },

    /// Failed to read a template file from disk.
    #[error("cannot read template {name}: {message}")]
    Io { name: String, message: String },

    /// A `{{name}}` placeholder had no matching parameter (strict mode).
    #[error("undefined variable '{name}' in template {template}")]
    UndefinedVariable { name: String, template: String },

    /// Malformed tag, unknown directive, or misused parameter kind.
    #[error("syntax error in template {template}: {message}")]
    Syntax { template: String, message: String },
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

// ============================================================================
// Parameters
// ============================================================================

/// A template parameter value: text for `{{name}}`, boolean for `{% if %}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    Text(String),
    Flag(bool),
}

/// Keyed parameter set passed to [`Renderer::render`].
#[derive(Debug, Default, Clone)]
pub struct TemplateParams(BTreeMap<String, TemplateValue>);

impl TemplateParams {
    pub fn new() -> Self {
        TemplateParams::default()
    }

    /// Set a text parameter.
    pub fn set_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), TemplateValue::Text(value.into()));
    }

    /// Set a boolean flag parameter.
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.0.insert(name.into(), TemplateValue::Flag(value));
    }

    fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.0.get(name)
    }
}

// ============================================================================
// Renderer Seam
// ============================================================================

/// Rendering contract consumed by the stub emitter.
pub trait Renderer {
    /// Render the named template with the given parameters.
    fn render(&self, template_name: &str, params: &TemplateParams) -> TemplateResult<String>;
}

// ============================================================================
// Default Engine
// ============================================================================

/// Where template text comes from.
#[derive(Debug, Clone)]
enum TemplateSource {
    /// Read `{dir}/{name}` on every render.
    Dir(PathBuf),
    /// The templates compiled into the binary.
    Builtin,
}

/// The default strict template engine.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    source: TemplateSource,
}

impl TemplateEngine {
    /// Engine backed by a template directory. Files are re-read on every
    /// render so on-disk edits are always reflected.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        TemplateEngine {
            source: TemplateSource::Dir(dir.into()),
        }
    }

    /// Engine backed by the crate's embedded default templates.
    pub fn builtin() -> Self {
        TemplateEngine {
            source: TemplateSource::Builtin,
        }
    }

    fn load(&self, name: &str) -> TemplateResult<String> {
        match &self.source {
            TemplateSource::Dir(dir) => {
                let path = dir.join(name);
                if !path.is_file() {
                    return Err(TemplateError::NotFound {
                        name: name.to_string(),
                    });
                }
                fs::read_to_string(&path).map_err(|e| TemplateError::Io {
                    name: name.to_string(),
                    message: e.to_string(),
                })
            }
            TemplateSource::Builtin => match name {
                METHOD_TEMPLATE => Ok(BUILTIN_METHOD.to_string()),
                CLASS_TEMPLATE => Ok(BUILTIN_CLASS.to_string()),
                _ => Err(TemplateError::NotFound {
                    name: name.to_string(),
                }),
            },
        }
    }
}

impl Renderer for TemplateEngine {
    fn render(&self, template_name: &str, params: &TemplateParams) -> TemplateResult<String> {
        let text = self.load(template_name)?;
        expand(template_name, &text, params)
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Expand directives and placeholders in template text.
fn expand(template: &str, text: &str, params: &TemplateParams) -> TemplateResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    // None = outside any block; Some(emit) = inside an if-block.
    let mut block: Option<bool> = None;

    loop {
        let next_if = rest.find("{%");
        let next_var = rest.find("{{");
        let (pos, is_directive) = match (next_if, next_var) {
            (None, None) => {
                if block.is_none() || block == Some(true) {
                    out.push_str(rest);
                }
                break;
            }
            (Some(i), None) => (i, true),
            (None, Some(v)) => (v, false),
            (Some(i), Some(v)) => {
                if i < v {
                    (i, true)
                } else {
                    (v, false)
                }
            }
        };

        let emitting = block.is_none() || block == Some(true);
        if emitting {
            out.push_str(&rest[..pos]);
        }
        rest = &rest[pos..];

        if is_directive {
            let end = rest.find("%}").ok_or_else(|| TemplateError::Syntax {
                template: template.to_string(),
                message: "unterminated {% tag".to_string(),
            })?;
            let directive = rest[2..end].trim();
            rest = &rest[end + 2..];
            // A directive on its own line should not leave a blank line.
            if let Some(stripped) = rest.strip_prefix('\n') {
                rest = stripped;
            }

            if directive == "endif" {
                if block.is_none() {
                    return Err(TemplateError::Syntax {
                        template: template.to_string(),
                        message: "{% endif %} without {% if %}".to_string(),
                    });
                }
                block = None;
            } else if let Some(flag_name) = directive.strip_prefix("if ") {
                let flag_name = flag_name.trim();
                if block.is_some() {
                    return Err(TemplateError::Syntax {
                        template: template.to_string(),
                        message: "nested {% if %} blocks are not supported".to_string(),
                    });
                }
                let value = match params.get(flag_name) {
                    Some(TemplateValue::Flag(b)) => *b,
                    Some(TemplateValue::Text(_)) => {
                        return Err(TemplateError::Syntax {
                            template: template.to_string(),
                            message: format!("'{}' is not a boolean flag", flag_name),
                        });
                    }
                    None => {
                        return Err(TemplateError::UndefinedVariable {
                            name: flag_name.to_string(),
                            template: template.to_string(),
                        });
                    }
                };
                block = Some(value);
            } else {
                return Err(TemplateError::Syntax {
                    template: template.to_string(),
                    message: format!("unknown directive '{}'", directive),
                });
            }
        } else {
            let end = rest.find("}}").ok_or_else(|| TemplateError::Syntax {
                template: template.to_string(),
                message: "unterminated {{ tag".to_string(),
            })?;
            let name = rest[2..end].trim();
            if emitting {
                match params.get(name) {
                    Some(TemplateValue::Text(value)) => out.push_str(value),
                    Some(TemplateValue::Flag(_)) => {
                        return Err(TemplateError::Syntax {
                            template: template.to_string(),
                            message: format!("boolean flag '{}' used as text", name),
                        });
                    }
                    None => {
                        return Err(TemplateError::UndefinedVariable {
                            name: name.to_string(),
                            template: template.to_string(),
                        });
                    }
                }
            }
            rest = &rest[end + 2..];
        }
    }

    if block.is_some() {
        return Err(TemplateError::Syntax {
            template: template.to_string(),
            message: "unterminated {% if %} block".to_string(),
        });
    }
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
