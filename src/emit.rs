//! Stub emitter.
//!
//! Renders a single test-method stub and whole new test-class files through
//! the [`Renderer`] seam, formats parameter lists into call-site shape, and
//! writes files (creating parent directories on demand).

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::php::introspect::{MethodSignature, ParameterSpec};
use crate::resolve::TestTarget;
use crate::template::{Renderer, TemplateError, TemplateParams, CLASS_TEMPLATE, METHOD_TEMPLATE};

/// Directory roles whose classes get a persistence-context fixture.
pub const PERSISTENCE_ROLES: [&str; 3] = ["Controller", "Entity", "Repository"];

/// Error type for stub emission.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Template rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO error writing the test file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One rendered test-method stub, keyed by its generated name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStub {
    /// Generated name: `test` + capitalized source method name.
    pub name: String,
    /// Rendered source block, newline-terminated.
    pub text: String,
}

/// Capitalize the first character, as PHP's `ucfirst` does.
pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// True when a file in this relative directory needs the persistence
/// fixture: its immediate parent directory is one of [`PERSISTENCE_ROLES`].
pub fn needs_persistence_handle(rel_dir: &str) -> bool {
    let leaf = rel_dir.rsplit('/').next().unwrap_or(rel_dir);
    PERSISTENCE_ROLES.contains(&leaf)
}

/// Format a parameter list into call-site shape.
///
/// Each segment renders as `[TypeName ][&]$name[ ][ = default]`: the type
/// precedes the variable and leaves a trailing space after it. Segments are
/// joined with `, `.
pub fn format_parameters(params: &[ParameterSpec]) -> String {
    let segments: Vec<String> = params
        .iter()
        .map(|p| {
            let mut s = String::new();
            if let Some(type_name) = &p.type_name {
                s.push_str(type_name);
                s.push(' ');
            }
            if p.by_ref {
                s.push('&');
            }
            s.push('$');
            s.push_str(&p.name);
            if p.type_name.is_some() {
                s.push(' ');
            }
            if let Some(default) = &p.default {
                s.push_str(" = ");
                s.push_str(&default.render());
            }
            s
        })
        .collect();
    segments.join(", ")
}

/// Format a constructor parameter list for the fixture comment:
/// `Type $name` pairs (bare `$name` when untyped), joined with `, `.
pub fn format_constructor_parameters(params: &[ParameterSpec]) -> String {
    let segments: Vec<String> = params
        .iter()
        .map(|p| match &p.type_name {
            Some(type_name) => format!("{} ${}", type_name, p.name),
            None => format!("${}", p.name),
        })
        .collect();
    segments.join(", ")
}

/// Render one test-method stub for a source method.
pub fn render_method_stub(
    renderer: &dyn Renderer,
    file_class_namespace: &str,
    file_class: &str,
    method: &MethodSignature,
) -> Result<MethodStub, TemplateError> {
    let capitalized = ucfirst(&method.name);

    let mut params = TemplateParams::new();
    params.set_text("fileClassNamespace", file_class_namespace);
    params.set_text("fileClass", file_class);
    params.set_text("methodName", method.name.as_str());
    params.set_text("ucfirstMethodName", capitalized.as_str());
    params.set_text("methodParameters", format_parameters(&method.params));

    let text = renderer.render(METHOD_TEMPLATE, &params)?;
    Ok(MethodStub {
        name: format!("test{}", capitalized),
        text,
    })
}

/// Inputs for rendering a complete new test-class file.
#[derive(Debug)]
pub struct TestClassParams<'a> {
    pub target: &'a TestTarget,
    pub file_class_namespace: &'a str,
    pub file_class: &'a str,
    pub stubs: &'a [MethodStub],
    /// Constructor parameters of the source class; non-empty sets the
    /// constructor-injection flag for the template.
    pub constructor_params: &'a [ParameterSpec],
    /// Scaffold a persistence-context fixture.
    pub insert_em: bool,
    pub base_test_class: &'a str,
}

/// Render a new test-class file and write it, creating parent directories.
pub fn write_test_class(
    renderer: &dyn Renderer,
    class_params: &TestClassParams<'_>,
) -> Result<(), EmitError> {
    let methods: String = class_params.stubs.iter().map(|s| s.text.as_str()).collect();

    let mut params = TemplateParams::new();
    params.set_text("testClassNamespace", class_params.target.namespace.as_str());
    params.set_text("testClassName", class_params.target.class_name.as_str());
    params.set_text("fileClassNamespace", class_params.file_class_namespace);
    params.set_text("fileClass", class_params.file_class);
    params.set_text("methods", methods);
    params.set_text("baseTestClass", class_params.base_test_class);
    params.set_flag(
        "classConstructorHasParm",
        !class_params.constructor_params.is_empty(),
    );
    params.set_text(
        "constructorParameters",
        format_constructor_parameters(class_params.constructor_params),
    );
    params.set_flag("insertEm", class_params.insert_em);

    let rendered = renderer.render(CLASS_TEMPLATE, &params)?;
    write_file(&class_params.target.path, &rendered)?;
    Ok(())
}

/// Write `content` to `path`, creating missing parent directories first.
fn write_file(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::php::introspect::{eligible_methods, introspect, DefaultValue, Visibility};
    use crate::php::lexer::tokenize;
    use crate::template::TemplateEngine;
    use tempfile::TempDir;

    fn param(name: &str) -> ParameterSpec {
        ParameterSpec {
            name: name.to_string(),
            by_ref: false,
            type_name: None,
            default: None,
        }
    }

    mod parameter_formatting {
        use super::*;

        #[test]
        fn round_trip_of_mixed_parameter_list() {
            // foo($a, SomeType $b, $c = null, $d = '', $e = 5)
            let params = vec![
                param("a"),
                ParameterSpec {
                    type_name: Some("SomeType".to_string()),
                    ..param("b")
                },
                ParameterSpec {
                    default: Some(DefaultValue::Null),
                    ..param("c")
                },
                ParameterSpec {
                    default: Some(DefaultValue::Str(String::new())),
                    ..param("d")
                },
                ParameterSpec {
                    default: Some(DefaultValue::Num("5".to_string())),
                    ..param("e")
                },
            ];
            assert_eq!(
                format_parameters(&params),
                "$a, SomeType $b , $c = null, $d = '', $e = 5"
            );
        }

        #[test]
        fn round_trip_from_parsed_source() {
            let source = "<?php\nnamespace App;\nclass Widget {\n    public function foo($a, SomeType $b, $c = null, $d = '', $e = 5) {}\n}\n";
            let desc = introspect(source, &tokenize(source)).unwrap();
            let foo = &desc.methods[0];
            assert_eq!(
                format_parameters(&foo.params),
                "$a, SomeType $b , $c = null, $d = '', $e = 5"
            );
        }

        #[test]
        fn by_reference_marker_precedes_the_sigil() {
            let params = vec![ParameterSpec {
                by_ref: true,
                ..param("out")
            }];
            assert_eq!(format_parameters(&params), "&$out");
        }

        #[test]
        fn unescaped_string_default_is_embedded_verbatim() {
            let params = vec![ParameterSpec {
                default: Some(DefaultValue::Str("abc".to_string())),
                ..param("s")
            }];
            // Known quirk: no re-quoting.
            assert_eq!(format_parameters(&params), "$s = abc");
        }

        #[test]
        fn constructor_parameters_format() {
            let params = vec![
                ParameterSpec {
                    type_name: Some("Registry".to_string()),
                    ..param("registry")
                },
                param("flags"),
            ];
            assert_eq!(
                format_constructor_parameters(&params),
                "Registry $registry, $flags"
            );
        }
    }

    mod naming {
        use super::*;

        #[test]
        fn ucfirst_capitalizes_first_char_only() {
            assert_eq!(ucfirst("list"), "List");
            assert_eq!(ucfirst("getById"), "GetById");
            assert_eq!(ucfirst(""), "");
        }

        #[test]
        fn persistence_roles_match_the_leaf_directory() {
            assert!(needs_persistence_handle("Controller"));
            assert!(needs_persistence_handle("Entity"));
            assert!(needs_persistence_handle("Repository"));
            assert!(needs_persistence_handle("Deep/Controller"));
            assert!(!needs_persistence_handle(""));
            assert!(!needs_persistence_handle("Service"));
            assert!(!needs_persistence_handle("Controller/Helpers"));
        }
    }

    mod rendering {
        use super::*;

        fn method(name: &str) -> MethodSignature {
            MethodSignature {
                name: name.to_string(),
                visibility: Visibility::Public,
                is_static: false,
                is_abstract: false,
                params: Vec::new(),
                declaring_class: "Widget".to_string(),
            }
        }

        #[test]
        fn method_stub_is_keyed_by_generated_name() {
            let engine = TemplateEngine::builtin();
            let stub =
                render_method_stub(&engine, "App\\Controller", "Widget", &method("list")).unwrap();
            assert_eq!(stub.name, "testList");
            assert!(stub.text.contains("public function testList()"));
            assert!(stub.text.contains("App\\Controller\\Widget::list"));
            assert!(stub.text.ends_with('\n'));
        }

        #[test]
        fn test_class_file_is_written_with_parents() {
            let engine = TemplateEngine::builtin();
            let root = TempDir::new().unwrap();
            let target = TestTarget {
                namespace: "App\\Tests\\Controller".to_string(),
                class_name: "WidgetTest".to_string(),
                path: root.path().join("Tests/Controller/WidgetTest.php"),
                existing: None,
            };
            let stub = render_method_stub(&engine, "App\\Controller", "Widget", &method("list"))
                .unwrap();

            write_test_class(
                &engine,
                &TestClassParams {
                    target: &target,
                    file_class_namespace: "App\\Controller",
                    file_class: "Widget",
                    stubs: &[stub],
                    constructor_params: &[],
                    insert_em: true,
                    base_test_class: "WebTestCase",
                },
            )
            .unwrap();

            let written = std::fs::read_to_string(&target.path).unwrap();
            assert!(written.contains("namespace App\\Tests\\Controller;"));
            assert!(written.contains("class WidgetTest extends WebTestCase"));
            assert!(written.contains("use App\\Controller\\Widget;"));
            assert!(written.contains("$this->em"));
            assert!(written.contains("public function testList()"));
            // No constructor fixture without constructor parameters.
            assert!(!written.contains("fixture: new"));
        }

        #[test]
        fn generated_class_is_reintrospectable() {
            // The merge path reads generated files back; identity and end
            // line must be recoverable.
            let engine = TemplateEngine::builtin();
            let root = TempDir::new().unwrap();
            let target = TestTarget {
                namespace: "App\\Tests".to_string(),
                class_name: "WidgetTest".to_string(),
                path: root.path().join("Tests/WidgetTest.php"),
                existing: None,
            };
            let stub = render_method_stub(&engine, "App", "Widget", &method("run")).unwrap();

            write_test_class(
                &engine,
                &TestClassParams {
                    target: &target,
                    file_class_namespace: "App",
                    file_class: "Widget",
                    stubs: &[stub],
                    constructor_params: &[param("registry")],
                    insert_em: false,
                    base_test_class: "WebTestCase",
                },
            )
            .unwrap();

            let written = std::fs::read_to_string(&target.path).unwrap();
            let desc = introspect(&written, &tokenize(&written)).unwrap();
            assert_eq!(desc.name, "WidgetTest");
            assert_eq!(desc.namespace.as_deref(), Some("App\\Tests"));
            assert!(desc.declares_method("testRun"));
            assert!(written.contains("fixture: new Widget($registry)"));
            // End line points at the closing brace, the file's last line.
            let last_line = written.trim_end().lines().count() as u32;
            assert_eq!(desc.end_line, last_line);
        }

        #[test]
        fn eligible_methods_feed_the_emitter() {
            let source = "<?php\nnamespace App;\nclass Widget {\n    public function run() {}\n    private function helper() {}\n}\n";
            let desc = introspect(source, &tokenize(source)).unwrap();
            let engine = TemplateEngine::builtin();
            let ns = desc.namespace.clone().unwrap_or_default();

            let stubs: Vec<MethodStub> = eligible_methods(&desc, true)
                .into_iter()
                .map(|m| render_method_stub(&engine, &ns, &desc.name, m).unwrap())
                .collect();
            assert_eq!(stubs.len(), 2);
            assert_eq!(stubs[0].name, "testRun");
            assert_eq!(stubs[1].name, "testHelper");
        }
    }
}
