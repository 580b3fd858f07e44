//! Interaction seam for confirmation prompts and console reporting.
//!
//! The generator never talks to a terminal directly; it goes through the
//! [`Interaction`] trait so the drift prompts can be answered by a human, by
//! a fixed policy, or by a scripted test double. The trait is object-safe and
//! is used as `&dyn Interaction` throughout the pipeline.
//!
//! Console output follows the original tool's contract: one `info:` or
//! `error:` prefixed line per notable event.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Error type for interaction operations.
#[derive(Debug, Error)]
pub enum InteractionError {
    /// IO error while prompting or reading the answer.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<io::Error> for InteractionError {
    fn from(err: io::Error) -> Self {
        InteractionError::Io(err.to_string())
    }
}

/// Result type for interaction operations.
pub type InteractionResult<T> = Result<T, InteractionError>;

/// Trait for user interaction during a generation run.
///
/// `ask_confirm` blocks until an answer is available; this is the only
/// blocking point of the whole pipeline and carries no timeout.
pub trait Interaction {
    /// Ask a yes/no question. An empty answer yields `default`.
    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<bool>;

    /// Print an informational event line.
    fn print_info(&self, message: &str);

    /// Print a warning/error event line.
    fn print_error(&self, message: &str);
}

/// Terminal-backed interaction: prompts on stdout, reads stdin, reports
/// events as `info:` lines on stdout and `error:` lines on stderr.
#[derive(Debug, Default)]
pub struct TerminalInteraction;

impl TerminalInteraction {
    pub fn new() -> Self {
        TerminalInteraction
    }
}

impl Interaction for TerminalInteraction {
    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let mut stdout = io::stdout();
        write!(stdout, "{} {} ", prompt, hint)?;
        stdout.flush()?;

        let mut answer = String::new();
        // EOF (piped stdin) falls through to the default.
        io::stdin().lock().read_line(&mut answer)?;
        Ok(parse_answer(&answer, default))
    }

    fn print_info(&self, message: &str) {
        println!("info: {}", message);
    }

    fn print_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

/// Interpret a raw prompt answer. Empty input means `default`; anything
/// unrecognized also falls back to `default` (the prompt hints the default).
fn parse_answer(raw: &str, default: bool) -> bool {
    match raw.trim() {
        "" => default,
        s if s.eq_ignore_ascii_case("y") || s.eq_ignore_ascii_case("yes") => true,
        s if s.eq_ignore_ascii_case("n") || s.eq_ignore_ascii_case("no") => false,
        _ => default,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Scripted double: fixed confirm answers, captured event lines.
    struct ScriptedInteraction {
        answer: bool,
        infos: RefCell<Vec<String>>,
    }

    impl Interaction for ScriptedInteraction {
        fn ask_confirm(&self, _prompt: &str, _default: bool) -> InteractionResult<bool> {
            Ok(self.answer)
        }

        fn print_info(&self, message: &str) {
            self.infos.borrow_mut().push(message.to_string());
        }

        fn print_error(&self, _message: &str) {}
    }

    #[test]
    fn trait_is_object_safe() {
        let scripted: Box<dyn Interaction> = Box::new(ScriptedInteraction {
            answer: true,
            infos: RefCell::new(Vec::new()),
        });
        assert!(scripted.ask_confirm("overwrite?", false).unwrap());
        scripted.print_info("Processed 0 files");
    }

    mod answer_parsing {
        use super::*;

        #[test]
        fn empty_answer_uses_default() {
            assert!(parse_answer("\n", true));
            assert!(!parse_answer("\n", false));
        }

        #[test]
        fn yes_variants() {
            assert!(parse_answer("y\n", false));
            assert!(parse_answer("Yes\n", false));
        }

        #[test]
        fn no_variants() {
            assert!(!parse_answer("n\n", true));
            assert!(!parse_answer("NO\n", true));
        }

        #[test]
        fn unrecognized_answer_uses_default() {
            assert!(parse_answer("maybe\n", true));
            assert!(!parse_answer("maybe\n", false));
        }
    }
}
