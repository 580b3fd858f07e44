//! Lexical class locator.
//!
//! Recovers the declared namespace path and the primary class name from a
//! token stream, without parsing. The scan mirrors the shape of real PHP
//! files: the namespace declaration (if any) precedes the class declaration,
//! and the class name is the identifier immediately following the `class`
//! keyword, whether or not an extends/implements clause follows.

use thiserror::Error;

use super::lexer::{TokKind, Token};

/// Error type for class location.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    /// The token stream contains no class declaration.
    #[error("no class declaration found")]
    NotFound,
}

/// Namespace and class name recovered from one file.
///
/// `namespace` is `None` for files declared in the global namespace; only a
/// missing class is a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedClass {
    pub namespace: Option<String>,
    pub class_name: String,
}

/// Scan the token stream for the namespace and the primary class name.
///
/// `class` and `interface` declarations both count (the introspector flags
/// which one it was); traits and closures do not. `Foo::class` constants and
/// anonymous `new class` expressions are skipped.
pub fn locate(tokens: &[Token]) -> Result<LocatedClass, LocateError> {
    let mut namespace: Option<String> = None;

    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];

        if namespace.is_none() && tok.is_keyword("namespace") {
            let (parts, next) = collect_namespace(tokens, i + 1);
            if !parts.is_empty() {
                namespace = Some(parts.join("\\"));
            }
            i = next;
            continue;
        }

        if (tok.is_keyword("class") || tok.is_keyword("interface")) && is_declaration(tokens, i) {
            if let Some(name) = tokens.get(i + 1) {
                if name.kind == TokKind::Name {
                    return Ok(LocatedClass {
                        namespace,
                        class_name: name.text.clone(),
                    });
                }
            }
        }

        i += 1;
    }

    Err(LocateError::NotFound)
}

/// Accumulate namespace segments until a block-open or statement terminator.
fn collect_namespace(tokens: &[Token], start: usize) -> (Vec<String>, usize) {
    let mut parts = Vec::new();
    let mut j = start;
    while j < tokens.len() {
        let tok = &tokens[j];
        if tok.kind == TokKind::Name {
            parts.push(tok.text.clone());
        } else if tok.is_op("{") || tok.is_op(";") {
            break;
        }
        // Separators and anything else are passed over.
        j += 1;
    }
    (parts, j)
}

/// True when the keyword at `i` opens a named declaration rather than a
/// `::class` constant or an anonymous `new class`.
fn is_declaration(tokens: &[Token], i: usize) -> bool {
    match i.checked_sub(1).and_then(|p| tokens.get(p)) {
        Some(prev) => !prev.is_op("::") && !prev.is_keyword("new"),
        None => true,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::php::lexer::tokenize;

    fn locate_source(source: &str) -> Result<LocatedClass, LocateError> {
        locate(&tokenize(source))
    }

    #[test]
    fn namespace_and_class() {
        let located = locate_source(
            "<?php\nnamespace App\\Controller;\n\nclass WidgetController\n{\n}\n",
        )
        .unwrap();
        assert_eq!(located.namespace.as_deref(), Some("App\\Controller"));
        assert_eq!(located.class_name, "WidgetController");
    }

    #[test]
    fn file_without_namespace_yields_none() {
        let located = locate_source("<?php\nclass Widget\n{\n}\n").unwrap();
        assert_eq!(located.namespace, None);
        assert_eq!(located.class_name, "Widget");
    }

    #[test]
    fn extends_clause_does_not_shift_the_name() {
        let located = locate_source(
            "<?php\nnamespace App;\nclass Widget extends Base implements Countable\n{\n}\n",
        )
        .unwrap();
        assert_eq!(located.class_name, "Widget");
    }

    #[test]
    fn class_constant_is_not_a_declaration() {
        let located = locate_source(
            "<?php\nnamespace App;\n$x = Widget::class;\nclass Real {}\n",
        )
        .unwrap();
        assert_eq!(located.class_name, "Real");
    }

    #[test]
    fn anonymous_class_is_not_a_declaration() {
        let located = locate_source(
            "<?php\nnamespace App;\n$x = new class {};\nclass Real {}\n",
        )
        .unwrap();
        assert_eq!(located.class_name, "Real");
    }

    #[test]
    fn interface_is_locatable() {
        let located = locate_source("<?php\nnamespace App;\ninterface Sortable {}\n").unwrap();
        assert_eq!(located.class_name, "Sortable");
    }

    #[test]
    fn trait_is_not_found() {
        let err = locate_source("<?php\nnamespace App;\ntrait Helper {}\n").unwrap_err();
        assert_eq!(err, LocateError::NotFound);
    }

    #[test]
    fn file_without_class_is_not_found() {
        let err = locate_source("<?php\nnamespace App;\n$x = 1;\n").unwrap_err();
        assert_eq!(err, LocateError::NotFound);
    }

    #[test]
    fn empty_file_is_not_found() {
        assert_eq!(locate_source(""), Err(LocateError::NotFound));
    }

    #[test]
    fn braced_namespace_form() {
        let located = locate_source(
            "<?php\nnamespace App\\Models {\n    class User {}\n}\n",
        )
        .unwrap();
        assert_eq!(located.namespace.as_deref(), Some("App\\Models"));
        assert_eq!(located.class_name, "User");
    }
}
