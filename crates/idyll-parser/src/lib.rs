//! Idyll Parser
//!
//! Parses the token stream from `idyll-lexer` into a document tree of text
//! leaves and `(name, properties, children)` elements, ready to be
//! serialized for the rendering runtime.
//!
//! Parsing is all-or-nothing: a structural problem (a stray or mismatched
//! closing tag, a property without a value, an unterminated string) yields a
//! `ParseError` with the row and column of the offending token and no tree.
//!
//! # Example
//!
//! ```
//! use idyll_parser::Parser;
//!
//! let doc = Parser::parse("A\n\nB").unwrap();
//! assert_eq!(doc.to_json().unwrap(), r#"[["p",[],["A"]],["p",[],["B"]]]"#);
//! ```

pub mod ast;
pub mod parser;

pub use ast::{
    Declaration, Document, Element, Literal, Node, Number, Property, PropertyValue,
};
pub use idyll_lexer::LexerOptions;
pub use parser::Parser;

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parse error at line {row}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub row: usize,
    pub column: usize,
}
