//! Signature extractor: recovers a [`ClassDescriptor`] from a token stream.
//!
//! Walks the class body with a brace-depth counter, collecting every
//! own-declared method with its visibility, parameters, by-reference flags,
//! type hints, and default values. Method bodies are skipped wholesale; the
//! closing brace of the class itself yields the end-of-class line used as
//! the default stub insertion point.

use thiserror::Error;

use super::lexer::{string_value, TokKind, Token};
use super::locate::{locate, LocateError};

// ============================================================================
// Model
// ============================================================================

/// Method visibility. PHP defaults to public when no modifier is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A parameter default value, classified by kind for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// `null` (case-insensitive in the source).
    Null,
    /// A string literal; holds the decoded value, not the quoted source.
    Str(String),
    /// A numeric literal (including a leading sign), verbatim.
    Num(String),
    /// Anything else (arrays, constants, expressions), raw source text.
    Other(String),
}

impl DefaultValue {
    /// Render as source-literal text.
    ///
    /// Non-empty strings are embedded verbatim without re-quoting; a default
    /// containing quote characters therefore produces invalid output. Known
    /// quirk, kept.
    pub fn render(&self) -> String {
        match self {
            DefaultValue::Null => "null".to_string(),
            DefaultValue::Str(s) if s.is_empty() => "''".to_string(),
            DefaultValue::Str(s) => s.clone(),
            DefaultValue::Num(n) => n.clone(),
            DefaultValue::Other(raw) => raw.clone(),
        }
    }
}

/// One declared parameter, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Name without the `$` sigil.
    pub name: String,
    pub by_ref: bool,
    /// Class-like type hint; `None` for untyped and for builtin hints
    /// (`array`, scalars) which reflection does not resolve to a class.
    pub type_name: Option<String>,
    pub default: Option<DefaultValue>,
}

/// One declared method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Declared abstract, or body-less (interface methods).
    pub is_abstract: bool,
    pub params: Vec<ParameterSpec>,
    /// The class this method was declared in. A source scan only ever sees
    /// own declarations, but the eligibility filter checks it explicitly.
    pub declaring_class: String,
}

impl MethodSignature {
    pub fn is_constructor(&self) -> bool {
        self.name.eq_ignore_ascii_case("__construct")
    }

    pub fn is_destructor(&self) -> bool {
        self.name.eq_ignore_ascii_case("__destruct")
    }
}

/// Everything recovered about the primary class of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub namespace: Option<String>,
    pub name: String,
    pub is_abstract: bool,
    pub is_interface: bool,
    /// 1-indexed line of the class's closing brace.
    pub end_line: u32,
    /// All declared methods, constructors included.
    pub methods: Vec<MethodSignature>,
}

impl ClassDescriptor {
    /// The constructor signature, when one is declared.
    pub fn constructor(&self) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.is_constructor())
    }

    /// True if a method with this name is declared. PHP method names are
    /// case-insensitive, so the comparison is too.
    pub fn declares_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Names of all declared methods, in declaration order.
    pub fn method_names(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.name.clone()).collect()
    }
}

/// Error type for introspection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntrospectError {
    /// No locatable class declaration (or no class body).
    #[error("no class declaration found")]
    ClassNotFound,
}

impl From<LocateError> for IntrospectError {
    fn from(_: LocateError) -> Self {
        IntrospectError::ClassNotFound
    }
}

// ============================================================================
// Eligibility
// ============================================================================

/// Filter the descriptor's methods down to stub candidates.
///
/// A candidate is not a constructor or destructor, not abstract, declared by
/// the class itself, and (unless `include_non_public`) public.
pub fn eligible_methods(
    descriptor: &ClassDescriptor,
    include_non_public: bool,
) -> Vec<&MethodSignature> {
    descriptor
        .methods
        .iter()
        .filter(|m| {
            !m.is_constructor()
                && !m.is_destructor()
                && !m.is_abstract
                && m.declaring_class == descriptor.name
                && (include_non_public || m.visibility == Visibility::Public)
        })
        .collect()
}

// ============================================================================
// Extraction
// ============================================================================

/// Recover the class descriptor from a file's token stream.
///
/// `source` must be the text `tokens` were produced from; default values are
/// sliced out of it verbatim.
pub fn introspect(source: &str, tokens: &[Token]) -> Result<ClassDescriptor, IntrospectError> {
    let located = locate(tokens)?;
    let (decl_idx, is_interface) = find_declaration(tokens, &located.class_name)
        .ok_or(IntrospectError::ClassNotFound)?;
    let is_abstract = has_abstract_modifier(tokens, decl_idx);

    // Skip past any extends/implements clause to the body.
    let body_open = (decl_idx + 1..tokens.len())
        .find(|&i| tokens[i].is_op("{"))
        .ok_or(IntrospectError::ClassNotFound)?;

    let (methods, end_line) = parse_body(source, tokens, body_open, &located.class_name);

    Ok(ClassDescriptor {
        namespace: located.namespace,
        name: located.class_name,
        is_abstract,
        is_interface,
        end_line,
        methods,
    })
}

/// Find the `class`/`interface` keyword that declares `class_name`.
fn find_declaration(tokens: &[Token], class_name: &str) -> Option<(usize, bool)> {
    for (i, tok) in tokens.iter().enumerate() {
        let is_interface = tok.is_keyword("interface");
        if !is_interface && !tok.is_keyword("class") {
            continue;
        }
        if let Some(prev) = i.checked_sub(1).and_then(|p| tokens.get(p)) {
            if prev.is_op("::") || prev.is_keyword("new") {
                continue;
            }
        }
        let named = tokens
            .get(i + 1)
            .is_some_and(|t| t.kind == TokKind::Name && t.text == class_name);
        if named {
            return Some((i, is_interface));
        }
    }
    None
}

/// True when the declaration carries an `abstract` modifier.
fn has_abstract_modifier(tokens: &[Token], decl_idx: usize) -> bool {
    let mut k = decl_idx;
    while k > 0 {
        let prev = &tokens[k - 1];
        if prev.is_keyword("abstract") {
            return true;
        }
        if prev.is_keyword("final") {
            k -= 1;
            continue;
        }
        break;
    }
    false
}

/// Walk the class body, collecting method signatures and the end line.
fn parse_body(
    source: &str,
    tokens: &[Token],
    body_open: usize,
    class_name: &str,
) -> (Vec<MethodSignature>, u32) {
    let mut methods = Vec::new();
    let mut end_line = tokens[body_open].line;
    let mut depth = 1usize;
    let mut i = body_open + 1;

    let mut pending_vis: Option<Visibility> = None;
    let mut pending_static = false;
    let mut pending_abstract = false;

    while i < tokens.len() && depth > 0 {
        let tok = &tokens[i];

        if tok.is_op("{") {
            depth += 1;
            i += 1;
            continue;
        }
        if tok.is_op("}") {
            depth -= 1;
            if depth == 0 {
                end_line = tok.line;
            }
            i += 1;
            continue;
        }
        if depth != 1 {
            i += 1;
            continue;
        }

        if tok.is_op(";") {
            pending_vis = None;
            pending_static = false;
            pending_abstract = false;
            i += 1;
            continue;
        }

        if tok.kind == TokKind::Name {
            if tok.is_keyword("public") {
                pending_vis = Some(Visibility::Public);
            } else if tok.is_keyword("protected") {
                pending_vis = Some(Visibility::Protected);
            } else if tok.is_keyword("private") {
                pending_vis = Some(Visibility::Private);
            } else if tok.is_keyword("static") {
                pending_static = true;
            } else if tok.is_keyword("abstract") {
                pending_abstract = true;
            } else if tok.is_keyword("function") {
                let (method, next) = parse_method(
                    source,
                    tokens,
                    i,
                    class_name,
                    pending_vis.unwrap_or(Visibility::Public),
                    pending_static,
                    pending_abstract,
                );
                if let Some(m) = method {
                    methods.push(m);
                }
                pending_vis = None;
                pending_static = false;
                pending_abstract = false;
                i = next;
                continue;
            }
            // Other names (final, trait use, const, property types) are
            // passed over; the `;` handler resets pending modifiers.
        }

        i += 1;
    }

    // Unterminated body: fall back to the last token's line.
    if depth > 0 {
        if let Some(last) = tokens.last() {
            end_line = last.line;
        }
    }

    (methods, end_line)
}

/// Parse one method declaration starting at the `function` keyword.
///
/// Returns the signature (when a name is present) and the index of the first
/// token after the declaration, its body consumed if it has one.
fn parse_method(
    source: &str,
    tokens: &[Token],
    function_idx: usize,
    class_name: &str,
    visibility: Visibility,
    is_static: bool,
    declared_abstract: bool,
) -> (Option<MethodSignature>, usize) {
    let mut j = function_idx + 1;
    // Return-by-reference marker: `function &name()`.
    if tokens.get(j).is_some_and(|t| t.is_op("&")) {
        j += 1;
    }
    let name = match tokens.get(j) {
        Some(t) if t.kind == TokKind::Name => t.text.clone(),
        _ => return (None, j),
    };
    j += 1;

    let params = if tokens.get(j).is_some_and(|t| t.is_op("(")) {
        let (params, after) = parse_params(source, tokens, j);
        j = after;
        params
    } else {
        Vec::new()
    };

    // Skip any return type; a `{` opens the body, a `;` ends a body-less
    // declaration (abstract or interface method).
    let mut has_body = false;
    while let Some(t) = tokens.get(j) {
        if t.is_op("{") {
            has_body = true;
            j = skip_balanced(tokens, j);
            break;
        }
        if t.is_op(";") {
            j += 1;
            break;
        }
        j += 1;
    }

    let method = MethodSignature {
        name,
        visibility,
        is_static,
        is_abstract: declared_abstract || !has_body,
        params,
        declaring_class: class_name.to_string(),
    };
    (Some(method), j)
}

/// Given the index of a `{`, return the index after its matching `}`.
fn skip_balanced(tokens: &[Token], open_idx: usize) -> usize {
    let mut depth = 0usize;
    let mut j = open_idx;
    while j < tokens.len() {
        if tokens[j].is_op("{") {
            depth += 1;
        } else if tokens[j].is_op("}") {
            depth -= 1;
            if depth == 0 {
                return j + 1;
            }
        }
        j += 1;
    }
    j
}

/// Parse a parenthesized parameter list starting at the `(`.
fn parse_params(source: &str, tokens: &[Token], open_idx: usize) -> (Vec<ParameterSpec>, usize) {
    let mut ranges = Vec::new();
    let mut paren_depth = 1i32;
    let mut bracket_depth = 0i32;
    let mut start = open_idx + 1;
    let mut j = open_idx + 1;

    while j < tokens.len() {
        let t = &tokens[j];
        if t.is_op("(") {
            paren_depth += 1;
        } else if t.is_op(")") {
            paren_depth -= 1;
            if paren_depth == 0 {
                if j > start {
                    ranges.push((start, j));
                }
                j += 1;
                break;
            }
        } else if t.is_op("[") {
            bracket_depth += 1;
        } else if t.is_op("]") {
            bracket_depth -= 1;
        } else if t.is_op(",") && paren_depth == 1 && bracket_depth == 0 {
            ranges.push((start, j));
            start = j + 1;
        }
        j += 1;
    }

    let params = ranges
        .into_iter()
        .filter_map(|(s, e)| parse_param(source, &tokens[s..e]))
        .collect();
    (params, j)
}

/// Parse one parameter from its token slice.
fn parse_param(source: &str, toks: &[Token]) -> Option<ParameterSpec> {
    let mut by_ref = false;
    let mut type_parts: Vec<String> = Vec::new();
    let mut saw_separator = false;
    let mut name: Option<String> = None;
    let mut default = None;

    let mut k = 0;
    while k < toks.len() {
        let t = &toks[k];
        if name.is_none() {
            match t.kind {
                TokKind::Variable => name = Some(t.text.clone()),
                TokKind::Name => {
                    if saw_separator {
                        if let Some(last) = type_parts.last_mut() {
                            last.push('\\');
                            last.push_str(&t.text);
                        } else {
                            // Leading `\` is dropped, as reflection does.
                            type_parts.push(t.text.clone());
                        }
                        saw_separator = false;
                    } else {
                        type_parts.push(t.text.clone());
                    }
                }
                TokKind::Op if t.text == "&" => by_ref = true,
                TokKind::Op if t.text == "\\" => saw_separator = true,
                // `?` (nullable) and `...` (variadic) carry no type info.
                _ => {}
            }
        } else if t.is_op("=") {
            let rest = &toks[k + 1..];
            if !rest.is_empty() {
                default = Some(classify_default(source, rest));
            }
            break;
        }
        k += 1;
    }

    name.map(|n| ParameterSpec {
        name: n,
        by_ref,
        type_name: resolve_type_hint(&type_parts),
        default,
    })
}

/// Type hints that do not resolve to a class.
const BUILTIN_TYPE_HINTS: [&str; 12] = [
    "array", "int", "float", "string", "bool", "callable", "iterable", "object", "mixed", "self",
    "parent", "static",
];

fn resolve_type_hint(parts: &[String]) -> Option<String> {
    let first = parts.first()?;
    if BUILTIN_TYPE_HINTS.iter().any(|b| first.eq_ignore_ascii_case(b)) {
        None
    } else {
        Some(first.clone())
    }
}

/// Classify a default-value token run by value kind.
fn classify_default(source: &str, toks: &[Token]) -> DefaultValue {
    let (Some(first), Some(last)) = (toks.first(), toks.last()) else {
        return DefaultValue::Other(String::new());
    };
    let raw = source[first.start..last.end].to_string();

    if toks.len() == 1 {
        match first.kind {
            TokKind::Name if first.text.eq_ignore_ascii_case("null") => return DefaultValue::Null,
            TokKind::Str => return DefaultValue::Str(string_value(&first.text)),
            TokKind::Number => return DefaultValue::Num(raw),
            _ => {}
        }
    } else if toks.len() == 2
        && (first.is_op("-") || first.is_op("+"))
        && last.kind == TokKind::Number
    {
        return DefaultValue::Num(raw);
    }

    DefaultValue::Other(raw)
}

// ============================================================================
// Tests
// ============================================================================
