use std::fmt;

/// A position in source text, tracking line and column for error reporting.
///
/// `start` and `end` are byte offsets; `line` and `column` are 1-indexed and
/// point at the token's first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Ordering of a list marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `1.` style markers
    Ordered,
    /// `*` or `-` markers
    Unordered,
}

/// Token classification for Idyll source.
///
/// Value-bearing variants embed their text directly, so the parser never has
/// to look for value boundaries. The textual rendering (`Display`) wraps that
/// text in `TOKEN_VALUE_START` / `TOKEN_VALUE_END` markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Prose
    Words(String),
    BlockBreak,
    Heading(u8),
    ListMarker(ListKind),
    CodeFence,
    Backtick,

    // Component tags
    OpenBracket,
    CloseBracket,
    ForwardSlash,
    TagWord(String),
    ParamSeparator,
    StringLiteral(String),

    // End of input
    Eof,
}

impl TokenKind {
    /// Tokens that only ever begin or separate blocks.
    pub fn is_block_boundary(&self) -> bool {
        matches!(
            self,
            TokenKind::BlockBreak
                | TokenKind::Heading(_)
                | TokenKind::ListMarker(_)
                | TokenKind::CodeFence
                | TokenKind::Eof
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Words(text) => write_value(f, "WORDS", text),
            TokenKind::TagWord(text) => write_value(f, "COMPONENT_WORD", text),
            TokenKind::StringLiteral(text) => {
                let escaped = format!("&quot;{}&quot;", text.replace('"', "&quot;"));
                write_value(f, "STRING", &escaped)
            }
            TokenKind::BlockBreak => f.write_str("BREAK"),
            TokenKind::Heading(level) => write!(f, "HEADER_{level}"),
            TokenKind::ListMarker(ListKind::Ordered) => f.write_str("ORDERED_LIST"),
            TokenKind::ListMarker(ListKind::Unordered) => f.write_str("UNORDERED_LIST"),
            TokenKind::CodeFence => f.write_str("CODE_FENCE"),
            TokenKind::Backtick => f.write_str("BACKTICK"),
            TokenKind::OpenBracket => f.write_str("OPEN_BRACKET"),
            TokenKind::CloseBracket => f.write_str("CLOSE_BRACKET"),
            TokenKind::ForwardSlash => f.write_str("FORWARD_SLASH"),
            TokenKind::ParamSeparator => f.write_str("PARAM_SEPARATOR"),
            TokenKind::Eof => f.write_str("EOF"),
        }
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, label: &str, text: &str) -> fmt::Result {
    write!(f, "{label} {}", value_text(text))
}

fn value_text(text: &str) -> String {
    format!("TOKEN_VALUE_START \"{text}\" TOKEN_VALUE_END")
}

/// A token produced by the Idyll lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Render a token stream in its canonical space-separated form.
///
/// The prose run that opens a heading renders as the heading's own value:
/// `HEADER_2 TOKEN_VALUE_START "title" TOKEN_VALUE_END`.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut parts = Vec::with_capacity(tokens.len());
    let mut after_heading = false;

    for token in tokens {
        match &token.kind {
            TokenKind::Words(text) if after_heading => parts.push(value_text(text)),
            kind => parts.push(kind.to_string()),
        }
        after_heading = matches!(token.kind, TokenKind::Heading(_));
    }

    parts.join(" ")
}

/// The position sequence parallel to a token stream.
pub fn positions(tokens: &[Token]) -> Vec<Span> {
    tokens.iter().map(|t| t.span).collect()
}
