//! Document parser for Idyll.
//!
//! Parses a stream of source-level tokens (from `idyll-lexer`) into a
//! `Document`. Blocks are paragraphs, headings, lists, code fences and
//! components; components recurse into their bodies until the matching
//! closing tag.
//!
//! Uses recursive descent over the token stream, with one bounded rewind:
//! a component that starts a block but is followed by text on the same
//! paragraph is re-read as part of that paragraph.

use crate::ast::{Document, Element, Literal, Node, Number, Property, PropertyValue};
use crate::ParseError;
use idyll_lexer::{LexerOptions, ListKind, Scanner, Span, Token, TokenKind};

/// Deepest component nesting accepted before parsing fails.
pub const MAX_NESTING: usize = 128;

/// Largest integer a JavaScript number holds exactly (2^53 - 1).
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Where a component sits, which decides what its body may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Starts a block; the body is a sequence of blocks.
    Block,
    /// Embedded in running text; the body is inline and must close
    /// before the paragraph ends.
    Inline,
}

/// Blocks parsed up to a closing tag or the end of input.
struct Blocks {
    nodes: Vec<Node>,
    paragraphs: usize,
    /// Token index just past the first block.
    first_block_end: Option<usize>,
}

impl Blocks {
    /// Unwrap a body that is one paragraph, so `[x]text[/x]` holds the
    /// text directly, as the inline form does.
    fn into_body(self) -> Vec<Node> {
        let mut nodes = self.nodes;
        if self.paragraphs != 1 || nodes.len() != 1 {
            return nodes;
        }
        match nodes.pop() {
            Some(Node::Element(Element {
                children: Some(items),
                ..
            })) => items,
            other => other.into_iter().collect(),
        }
    }
}

/// Idyll document parser.
///
/// Converts a flat token stream into a hierarchical `Document` using
/// recursive descent. The source text is only consulted to quote the
/// offending input in error messages.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser over tokens lexed from `source`.
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse source text into a document with default lexer options.
    pub fn parse(source: &str) -> Result<Document, ParseError> {
        Self::parse_with(source, &LexerOptions::default())
    }

    /// Parse source text into a document.
    pub fn parse_with(source: &str, options: &LexerOptions) -> Result<Document, ParseError> {
        let tokens = Scanner::tokenize_with(source, options);
        Parser::new(source, tokens).parse_document()
    }

    /// Parse a full document.
    pub fn parse_document(&mut self) -> Result<Document, ParseError> {
        let blocks = self.parse_blocks(None)?;
        Ok(Document {
            nodes: blocks.nodes,
        })
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Parse blocks until the end of input, or until a closing tag when
    /// inside the component named `open`.
    fn parse_blocks(&mut self, open: Option<&str>) -> Result<Blocks, ParseError> {
        let mut nodes = Vec::new();
        let mut paragraphs = 0;
        let mut first_block_end = None;

        loop {
            let parsed = nodes.len();
            match &self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::BlockBreak => self.advance(),
                TokenKind::OpenBracket if self.at_close_tag() => {
                    if open.is_none() {
                        return Err(self.stray_close_tag());
                    }
                    break;
                }
                TokenKind::Heading(level) => {
                    let level = *level;
                    nodes.push(self.parse_heading(level)?);
                }
                TokenKind::ListMarker(kind) => {
                    let kind = *kind;
                    nodes.push(self.parse_list(kind)?);
                }
                TokenKind::CodeFence => nodes.push(self.parse_code_fence()?),
                TokenKind::OpenBracket => {
                    if let Some(node) = self.parse_block_element()? {
                        nodes.push(node);
                    } else if let Some(paragraph) = self.parse_paragraph()? {
                        nodes.push(paragraph);
                        paragraphs += 1;
                    }
                }
                TokenKind::Words(_) if self.at_line_separator() => self.advance(),
                TokenKind::Words(_) | TokenKind::Backtick => {
                    if let Some(paragraph) = self.parse_paragraph()? {
                        nodes.push(paragraph);
                        paragraphs += 1;
                    }
                }
                _ => return Err(self.unexpected("text or a component")),
            }
            if parsed == 0 && nodes.len() == 1 {
                first_block_end = Some(self.pos);
            }
        }

        Ok(Blocks {
            nodes,
            paragraphs,
            first_block_end,
        })
    }

    /// Read the component at the current position as a block of its own.
    /// Returns `None`, with the position restored, when text follows it
    /// within the same paragraph.
    fn parse_block_element(&mut self) -> Result<Option<Node>, ParseError> {
        let start = self.pos;
        let element = self.parse_element(Context::Block)?;

        let spans_blocks = self.tokens[start..self.pos]
            .iter()
            .any(|t| t.kind.is_block_boundary());
        if spans_blocks || !self.inline_content_follows() {
            return Ok(Some(Node::Element(element)));
        }

        self.pos = start;
        Ok(None)
    }

    /// Parse a paragraph. Paragraphs holding nothing but whitespace are dropped.
    fn parse_paragraph(&mut self) -> Result<Option<Node>, ParseError> {
        let mut items = self.parse_inline()?;
        trim_edge_line_breaks(&mut items);

        if items.iter().all(is_blank) {
            return Ok(None);
        }
        Ok(Some(Node::Element(Element::new("p", items))))
    }

    /// Parse `## Title` into an `h2` element.
    fn parse_heading(&mut self, level: u8) -> Result<Node, ParseError> {
        self.advance(); // consume heading marker
        let mut items = self.parse_inline()?;
        trim_edge_line_breaks(&mut items);
        Ok(Node::Element(Element::new(format!("h{level}"), items)))
    }

    /// Parse consecutive list items of one kind:
    /// ```text
    /// * first
    /// * second
    /// ```
    fn parse_list(&mut self, kind: ListKind) -> Result<Node, ParseError> {
        let mut entries = Vec::new();

        while self.peek().kind == TokenKind::ListMarker(kind) {
            self.advance(); // consume marker
            let mut items = self.parse_inline()?;
            trim_edge_line_breaks(&mut items);
            entries.push(Node::Element(Element::new("li", items)));
        }

        let name = match kind {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        };
        Ok(Node::Element(Element::new(name, entries)))
    }

    /// Parse a fenced block into `pre > code`. The content is kept verbatim.
    /// A fence left open at the end of input closes there.
    fn parse_code_fence(&mut self) -> Result<Node, ParseError> {
        self.advance(); // consume opening fence

        let content = match &self.peek().kind {
            TokenKind::Words(text) => {
                let text = text.clone();
                self.advance();
                text
            }
            _ => String::new(),
        };

        match self.peek().kind {
            TokenKind::CodeFence => self.advance(),
            TokenKind::Eof => {}
            _ => return Err(self.unexpected("a closing code fence")),
        }

        let code = Element::new("code", vec![Node::Text(content)]);
        Ok(Node::Element(Element::new("pre", vec![Node::Element(code)])))
    }

    // =========================================================================
    // Inline content
    // =========================================================================

    /// Parse text, inline code and inline components up to the end of the
    /// current paragraph or the next closing tag.
    fn parse_inline(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();

        loop {
            match &self.peek().kind {
                TokenKind::Words(text) => {
                    push_text(&mut items, text);
                    self.advance();
                }
                TokenKind::Backtick => items.push(self.parse_inline_code()?),
                TokenKind::OpenBracket if self.at_close_tag() => break,
                TokenKind::OpenBracket => {
                    items.push(Node::Element(self.parse_element(Context::Inline)?));
                }
                kind if kind.is_block_boundary() => break,
                _ => return Err(self.unexpected("text or a component")),
            }
        }

        Ok(items)
    }

    /// Parse `` `code` `` inside prose into a `code` element.
    fn parse_inline_code(&mut self) -> Result<Node, ParseError> {
        let open = self.pos;
        self.advance(); // consume opening backtick

        let mut children = Vec::new();
        if let TokenKind::Words(text) = &self.peek().kind {
            children.push(Node::Text(text.clone()));
            self.advance();
        }

        if self.peek().kind != TokenKind::Backtick {
            return Err(self.error_at(open, "Unterminated inline code".into()));
        }
        self.advance();

        Ok(Node::Element(Element::new("code", children)))
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Parse a component:
    /// ```text
    /// [Name prop:value /]
    /// [Name prop:value] body [/Name]
    /// ```
    fn parse_element(&mut self, context: Context) -> Result<Element, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!(
                "Components nested too deeply (more than {MAX_NESTING} levels)"
            )));
        }

        self.depth += 1;
        let element = self.parse_element_inner(context);
        self.depth -= 1;
        element
    }

    fn parse_element_inner(&mut self, context: Context) -> Result<Element, ParseError> {
        self.advance(); // consume `[`
        let name = self.expect_tag_word("a component name")?;
        let properties = self.parse_properties(&name)?;

        match &self.peek().kind {
            TokenKind::ForwardSlash => {
                self.advance();
                self.expect_close_bracket()?;
                Ok(Element {
                    name,
                    properties,
                    children: None,
                })
            }
            TokenKind::CloseBracket => {
                self.advance();
                let children = match context {
                    Context::Block => {
                        let blocks = self.parse_blocks(Some(&name))?;
                        if self.at_close_tag() {
                            self.parse_close_tag(&name)?;
                        } else {
                            self.close_at_end_of_input(&name, &blocks)?;
                        }
                        blocks.into_body()
                    }
                    Context::Inline => {
                        let mut children = self.parse_inline()?;
                        if !self.at_close_tag() {
                            return Err(self.error_at(
                                self.pos - 1,
                                format!("Unclosed component [{name}]: expected [/{name}] before the end of the paragraph"),
                            ));
                        }
                        self.parse_close_tag(&name)?;
                        trim_edge_line_breaks(&mut children);
                        children
                    }
                };
                Ok(Element {
                    name,
                    properties,
                    children: Some(children),
                })
            }
            _ => Err(self.unexpected("'/]' or ']'")),
        }
    }

    /// A component left open closes at the end of input only when its body
    /// is a single block. Otherwise the close tag was due after the first
    /// block, and that is where the error points.
    fn close_at_end_of_input(&self, name: &str, blocks: &Blocks) -> Result<(), ParseError> {
        match blocks.first_block_end {
            Some(end) if blocks.nodes.len() > 1 => Err(self.error_at(
                end - 1,
                format!("Unclosed component [{name}]: expected [/{name}] before the next block"),
            )),
            _ => Ok(()),
        }
    }

    /// Parse `[/Name]`, which must match the open component.
    fn parse_close_tag(&mut self, expected: &str) -> Result<(), ParseError> {
        self.advance(); // consume `[`
        self.advance(); // consume `/`

        let found_at = self.pos;
        let found = self.expect_tag_word("a component name")?;
        if found != expected {
            return Err(self.error_at(
                found_at,
                format!("Mismatched closing tag: expected [/{expected}], found [/{found}]"),
            ));
        }
        self.expect_close_bracket()
    }

    /// Parse `name:value` pairs up to `/]` or `]`.
    fn parse_properties(&mut self, component: &str) -> Result<Vec<Property>, ParseError> {
        let mut properties = Vec::new();

        loop {
            match &self.peek().kind {
                TokenKind::ForwardSlash | TokenKind::CloseBracket => break,
                TokenKind::TagWord(name) => {
                    let name = name.clone();
                    self.advance();

                    if self.peek().kind != TokenKind::ParamSeparator {
                        return Err(self.unexpected(&format!("':' after property '{name}'")));
                    }
                    self.advance(); // consume `:`

                    let value = self.parse_property_value(&name)?;
                    properties.push(Property { name, value });
                }
                TokenKind::Eof => {
                    return Err(self.error(format!(
                        "Unexpected end of input inside [{component}]"
                    )));
                }
                _ => return Err(self.unexpected("a property name, '/]' or ']'")),
            }
        }

        Ok(properties)
    }

    /// Parse the value half of a property:
    /// `"text"`, `10`, `-2.5`, `true`, `someVariable` or `` `expression` ``.
    fn parse_property_value(&mut self, property: &str) -> Result<PropertyValue, ParseError> {
        match &self.peek().kind {
            TokenKind::StringLiteral(s) => {
                let value = PropertyValue::Literal(Literal::String(s.clone()));
                self.advance();
                Ok(value)
            }
            TokenKind::TagWord(word) => {
                let value = classify_word(word);
                self.advance();
                Ok(value)
            }
            TokenKind::Backtick => {
                let open = self.pos;
                self.advance();

                let source = match &self.peek().kind {
                    TokenKind::Words(text) => {
                        let text = text.clone();
                        self.advance();
                        text
                    }
                    _ => String::new(),
                };

                if self.peek().kind != TokenKind::Backtick {
                    return Err(self.error_at(
                        open,
                        format!("Unterminated expression for property '{property}'"),
                    ));
                }
                self.advance();
                Ok(PropertyValue::Expression(source))
            }
            TokenKind::Words(text) if text.starts_with('"') => {
                Err(self.error("Unterminated string literal".into()))
            }
            _ => Err(self.error(format!("Missing value for property '{property}'"))),
        }
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.token_at(self.pos + offset)
    }

    fn token_at(&self, index: usize) -> &Token {
        static EOF: std::sync::LazyLock<Token> =
            std::sync::LazyLock::new(|| Token::new(TokenKind::Eof, Span::new(0, 0, 0, 0)));
        self.tokens.get(index).unwrap_or(&EOF)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Is the current position at `[/`?
    fn at_close_tag(&self) -> bool {
        self.peek().kind == TokenKind::OpenBracket
            && self.peek_at(1).kind == TokenKind::ForwardSlash
    }

    /// Does paragraph text continue at the current position?
    /// Trailing whitespace before a block boundary does not count, nor does
    /// a line break before the next component.
    fn inline_content_follows(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Words(text) if text.trim().is_empty() => {
                let next = self.peek_at(1);
                let closes = next.kind == TokenKind::OpenBracket
                    && self.peek_at(2).kind == TokenKind::ForwardSlash;
                !(next.kind.is_block_boundary() || closes || self.at_line_separator())
            }
            TokenKind::Words(_) | TokenKind::Backtick => true,
            TokenKind::OpenBracket => !self.at_close_tag(),
            _ => false,
        }
    }

    /// Only line breaks and spaces, then a component on the next line.
    fn at_line_separator(&self) -> bool {
        let TokenKind::Words(text) = &self.peek().kind else {
            return false;
        };
        text.trim().is_empty()
            && text.contains(['\n', '\r'])
            && self.peek_at(1).kind == TokenKind::OpenBracket
            && self.peek_at(2).kind != TokenKind::ForwardSlash
    }

    fn expect_tag_word(&mut self, what: &str) -> Result<String, ParseError> {
        if let TokenKind::TagWord(word) = &self.peek().kind {
            let word = word.clone();
            self.advance();
            Ok(word)
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_close_bracket(&mut self) -> Result<(), ParseError> {
        if self.peek().kind == TokenKind::CloseBracket {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("']'"))
        }
    }

    fn stray_close_tag(&self) -> ParseError {
        let message = match &self.peek_at(2).kind {
            TokenKind::TagWord(name) => {
                format!("Unexpected closing tag [/{name}]: no component is open")
            }
            _ => "Unexpected closing tag: no component is open".to_string(),
        };
        self.error(message)
    }

    /// Error for a token that does not fit, quoting the source it came from.
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if matches!(&token.kind, TokenKind::Words(text) if text.starts_with('"')) {
            return self.error("Unterminated string literal".into());
        }

        let found = match (&token.kind, self.source.get(token.span.start..token.span.end)) {
            (TokenKind::Eof, _) => "end of input".to_string(),
            (_, Some(text)) if !text.trim().is_empty() => format!("{:?}", text.trim()),
            (kind, _) => describe(kind).to_string(),
        };
        self.error(format!("Expected {expected}, found {found}"))
    }

    fn error(&self, message: String) -> ParseError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, index: usize, message: String) -> ParseError {
        let token = self.token_at(index);
        ParseError {
            message,
            row: token.span.line,
            column: token.span.column,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Classify a bare property value: boolean, number, or variable name.
fn classify_word(word: &str) -> PropertyValue {
    match word {
        "true" => PropertyValue::Literal(Literal::Boolean(true)),
        "false" => PropertyValue::Literal(Literal::Boolean(false)),
        _ => match parse_number(word) {
            Some(n) => PropertyValue::Literal(Literal::Number(n)),
            None => PropertyValue::Variable(word.to_string()),
        },
    }
}

/// `-?digits` is an integer, `-?digits.digits` a float. Integers past what a
/// JavaScript number holds exactly become floats.
fn parse_number(text: &str) -> Option<Number> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    match unsigned.split_once('.') {
        None if all_digits(unsigned) => match text.parse::<i64>() {
            Ok(n) if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n) => {
                Some(Number::Integer(n))
            }
            _ => text.parse::<f64>().ok().map(Number::Float),
        },
        Some((whole, fraction)) if all_digits(whole) && all_digits(fraction) => {
            text.parse::<f64>().ok().map(Number::Float)
        }
        _ => None,
    }
}

/// Append text, merging with a preceding text leaf.
fn push_text(items: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(last)) = items.last_mut() {
        last.push_str(text);
    } else {
        items.push(Node::Text(text.to_string()));
    }
}

/// Line breaks at the edges of a paragraph are layout, not content.
fn trim_edge_line_breaks(items: &mut Vec<Node>) {
    let is_break = |c: char| c == '\n' || c == '\r';

    if let Some(Node::Text(text)) = items.first_mut() {
        let cut = text.len() - text.trim_start_matches(is_break).len();
        text.drain(..cut);
    }
    if let Some(Node::Text(text)) = items.last_mut() {
        let len = text.trim_end_matches(is_break).len();
        text.truncate(len);
    }
    items.retain(|node| !matches!(node, Node::Text(text) if text.is_empty()));
}

fn is_blank(node: &Node) -> bool {
    matches!(node, Node::Text(text) if text.trim().is_empty())
}

fn describe(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Words(_) => "text",
        TokenKind::BlockBreak => "a paragraph break",
        TokenKind::Heading(_) => "a heading",
        TokenKind::ListMarker(_) => "a list marker",
        TokenKind::CodeFence => "a code fence",
        TokenKind::Backtick => "'`'",
        TokenKind::OpenBracket => "'['",
        TokenKind::CloseBracket => "']'",
        TokenKind::ForwardSlash => "'/'",
        TokenKind::TagWord(_) => "a word",
        TokenKind::ParamSeparator => "':'",
        TokenKind::StringLiteral(_) => "a string",
        TokenKind::Eof => "end of input",
    }
}
