//! Token scanner for PHP source text.
//!
//! Produces a flat token stream with comments and whitespace dropped,
//! string literals consumed whole, and 1-indexed line numbers retained.
//! Text outside `<?php ... ?>` regions is inert (newlines still counted).
//!
//! The scanner is lenient: it never fails. Unterminated strings or comments
//! are consumed to end of input; downstream consumers treat a stream without
//! the shapes they need as "class not resolvable".

/// Token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    /// Identifier or keyword (`class`, `function`, `FooBar`, ...).
    Name,
    /// Variable; `text` holds the name without the `$` sigil.
    Variable,
    /// Numeric literal, verbatim.
    Number,
    /// String literal (quoted or heredoc), raw text including delimiters.
    Str,
    /// Punctuation. Single characters, except the combined `::`.
    Op,
}

/// One token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokKind,
    pub text: String,
    /// 1-indexed line the token starts on.
    pub line: u32,
    /// Byte offset of the token start in the source.
    pub start: usize,
    /// Byte offset one past the token end.
    pub end: usize,
}

impl Token {
    /// True if this is a `Name` token with the given text (ASCII
    /// case-insensitive, as PHP keywords are).
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokKind::Name && self.text.eq_ignore_ascii_case(word)
    }

    /// True if this is an `Op` token with the given text.
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokKind::Op && self.text == op
    }
}

/// Decode the value of a quoted string literal token.
///
/// Single-quoted strings unescape `\'` and `\\`; double-quoted strings
/// additionally unescape `\"`, `\n`, `\t`, `\r`, and `\$`. Unknown escapes
/// keep the backslash, as PHP does. Heredoc raw text is returned unchanged.
pub fn string_value(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let quote = match bytes.first() {
        Some(b'\'') => '\'',
        Some(b'"') => '"',
        _ => return raw.to_string(),
    };
    let inner = raw
        .strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some(q) if q == quote => out.push(q),
            Some('n') if quote == '"' => out.push('\n'),
            Some('t') if quote == '"' => out.push('\t'),
            Some('r') if quote == '"' => out.push('\r'),
            Some('$') if quote == '"' => out.push('$'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Tokenize PHP source text.
pub fn tokenize(source: &str) -> Vec<Token> {
    Scanner::new(source).run()
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_cont(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner {
            src,
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        if c == '\n' {
            self.line += 1;
        }
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advance past `n` bytes known to contain no newlines.
    fn skip_bytes(&mut self, n: usize) {
        self.pos += n;
    }

    fn push(&mut self, kind: TokKind, text: String, line: u32, start: usize) {
        self.tokens.push(Token {
            kind,
            text,
            line,
            start,
            end: self.pos,
        });
    }

    fn run(mut self) -> Vec<Token> {
        // Inert prefix: scan for the opening tag, counting newlines.
        while !self.rest().is_empty() {
            if self.rest().starts_with("<?php") {
                self.skip_bytes(5);
                self.scan_php();
            } else {
                self.bump();
            }
        }
        self.tokens
    }

    /// Scan inside a `<?php ... ?>` region.
    fn scan_php(&mut self) {
        while let Some(c) = self.peek() {
            let start = self.pos;
            let line = self.line;
            match c {
                '?' if self.rest().starts_with("?>") => {
                    self.skip_bytes(2);
                    return;
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.rest().starts_with("//") => self.skip_line_comment(),
                '#' => self.skip_line_comment(),
                '/' if self.rest().starts_with("/*") => self.skip_block_comment(),
                '\'' | '"' => {
                    self.scan_quoted(c);
                    let raw = self.src[start..self.pos].to_string();
                    self.push(TokKind::Str, raw, line, start);
                }
                '<' if self.rest().starts_with("<<<") => {
                    self.scan_heredoc();
                    let raw = self.src[start..self.pos].to_string();
                    self.push(TokKind::Str, raw, line, start);
                }
                '$' => {
                    self.skip_bytes(1);
                    if self.peek().is_some_and(is_ident_start) {
                        let name = self.scan_ident();
                        self.push(TokKind::Variable, name, line, start);
                    } else {
                        self.push(TokKind::Op, "$".to_string(), line, start);
                    }
                }
                c if is_ident_start(c) => {
                    let name = self.scan_ident();
                    self.push(TokKind::Name, name, line, start);
                }
                c if c.is_ascii_digit() => {
                    let mut text = String::new();
                    while let Some(d) = self.peek() {
                        if d.is_ascii_alphanumeric() || d == '_' || d == '.' {
                            text.push(d);
                            self.skip_bytes(d.len_utf8());
                        } else {
                            break;
                        }
                    }
                    self.push(TokKind::Number, text, line, start);
                }
                ':' if self.rest().starts_with("::") => {
                    self.skip_bytes(2);
                    self.push(TokKind::Op, "::".to_string(), line, start);
                }
                other => {
                    self.bump();
                    self.push(TokKind::Op, other.to_string(), line, start);
                }
            }
        }
    }

    fn scan_ident(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_ident_cont(c) {
                name.push(c);
                self.skip_bytes(c.len_utf8());
            } else {
                break;
            }
        }
        name
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            // Line comments also end at a close tag.
            if self.rest().starts_with("?>") {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) {
        self.skip_bytes(2);
        while !self.rest().is_empty() {
            if self.rest().starts_with("*/") {
                self.skip_bytes(2);
                return;
            }
            self.bump();
        }
    }

    /// Consume a quoted string, including the delimiters.
    fn scan_quoted(&mut self, quote: char) {
        self.skip_bytes(1);
        while let Some(c) = self.bump() {
            if c == '\\' {
                self.bump();
            } else if c == quote {
                return;
            }
        }
    }

    /// Consume a heredoc/nowdoc (`<<<LABEL ... LABEL`), including the body.
    fn scan_heredoc(&mut self) {
        self.skip_bytes(3);
        // Optional quote around the label (nowdoc / quoted heredoc).
        if matches!(self.peek(), Some('\'') | Some('"')) {
            self.skip_bytes(1);
        }
        let mut label = String::new();
        while let Some(c) = self.peek() {
            if is_ident_cont(c) {
                label.push(c);
                self.skip_bytes(c.len_utf8());
            } else {
                break;
            }
        }
        // To end of the opener line.
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
        if label.is_empty() {
            return;
        }
        // Body runs until a line whose first non-space word is the label.
        loop {
            let line_rest = self.rest();
            if line_rest.is_empty() {
                return;
            }
            let trimmed = line_rest.trim_start_matches([' ', '\t']);
            if let Some(after) = trimmed.strip_prefix(label.as_str()) {
                if !after.chars().next().is_some_and(is_ident_cont) {
                    let indent = line_rest.len() - trimmed.len();
                    self.skip_bytes(indent + label.len());
                    return;
                }
            }
            // Not the terminator; consume the whole line.
            while let Some(c) = self.bump() {
                if c == '\n' {
                    break;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
