//! Idyll Lexer
//!
//! Tokenizes Idyll markup (prose interleaved with `[Component prop:value /]`
//! tags) into a stream of tokens. The scanner switches between prose, tag,
//! quoted-string, backtick and code-fence modes, and tags every token with
//! its line and column.
//!
//! The lexer is total: unrecognized input falls back to prose tokens and the
//! stream always ends with `Eof`.
//!
//! # Example
//!
//! ```
//! use idyll_lexer::Scanner;
//!
//! let tokens = Scanner::tokenize("");
//! assert_eq!(tokens.len(), 1); // Just EOF
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{positions, render_tokens, ListKind, Span, Token, TokenKind};

/// Knobs for the fence-versus-inline backtick decision.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LexerOptions {
    /// Shortest backtick run at the start of a line that opens a code fence.
    pub fence_min_backticks: usize,
    /// Only open a fence after a blank line or at the start of the document.
    pub strict_fences: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            fence_min_backticks: 3,
            strict_fences: false,
        }
    }
}
