use crate::token::{ListKind, Span, Token, TokenKind};
use crate::LexerOptions;

/// Scanner mode determines which tokenization rules apply to the next character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerMode {
    /// Running text: words, block breaks, headings, list markers.
    Prose,
    /// Inside `[ ... ]`: tag words, separators, slashes.
    Tag,
    /// Inside a `"..."` string within a tag.
    Quoted,
    /// Between a pair of single backticks.
    Backtick { in_tag: bool },
    /// Inside a fenced code block opened by `ticks` backticks.
    Fence { ticks: usize },
}

/// A marker recognized at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineMarker {
    Heading(u8),
    List(ListKind),
    Fence(usize),
}

/// Idyll source scanner.
///
/// One scan loop drives an explicit mode machine: each mode consumes input
/// from the current position, emits tokens and returns the next mode.
/// Line and column advance on every consumed character, whatever the mode.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Vec<char>,
    options: LexerOptions,
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    words: String,
    words_start: Option<Span>,
    line_start: bool,
    in_heading: bool,
    after_blank: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self::with_options(source, LexerOptions::default())
    }

    /// Create a scanner with explicit lexer options.
    pub fn with_options(source: &'a str, options: LexerOptions) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            options,
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            words: String::new(),
            words_start: None,
            line_start: true,
            in_heading: false,
            after_blank: true,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Self::tokenize_with(source, &LexerOptions::default())
    }

    /// Tokenize with explicit options.
    pub fn tokenize_with(source: &str, options: &LexerOptions) -> Vec<Token> {
        let mut scanner = Scanner::with_options(source, options.clone());
        scanner.scan_tokens();
        scanner.tokens
    }

    fn scan_tokens(&mut self) {
        let mut mode = ScannerMode::Prose;
        while !self.is_at_end() {
            mode = match mode {
                ScannerMode::Prose => self.scan_prose(),
                ScannerMode::Tag => self.scan_tag(),
                ScannerMode::Quoted => self.scan_string(),
                ScannerMode::Backtick { in_tag } => self.scan_backtick(in_tag),
                ScannerMode::Fence { ticks } => self.scan_fence(ticks),
            };
        }

        self.flush_words();
        let end = self.here();
        self.push_token(TokenKind::Eof, end);
    }

    // --- Prose ---

    fn scan_prose(&mut self) -> ScannerMode {
        if self.line_start {
            self.line_start = false;
            if let Some((marker, len)) = self.line_marker_at(self.pos) {
                return self.enter_marker(marker, len);
            }
        }

        match self.peek() {
            '\n' | '\r' => {
                self.scan_newlines();
                ScannerMode::Prose
            }
            '[' => {
                self.flush_words();
                self.emit_single(TokenKind::OpenBracket);
                ScannerMode::Tag
            }
            '`' => self.scan_prose_backtick(),
            c => {
                self.push_word(c);
                ScannerMode::Prose
            }
        }
    }

    /// Consume a run of line breaks. Two or more (blank lines may hold
    /// spaces or tabs) become one `BlockBreak`; a single one stays in the
    /// prose run unless the next line opens a heading, list item or fence.
    fn scan_newlines(&mut self) {
        let start = self.here();
        let mut breaks = 0;

        loop {
            self.skip_line_break();
            breaks += 1;

            let mut i = self.pos;
            while is_space(self.char_at(i)) {
                i += 1;
            }
            if !matches!(self.char_at(i), '\n' | '\r') {
                break;
            }
            self.advance_to(i);
        }

        self.line_start = true;
        if self.is_at_end() {
            self.trim_trailing_space();
            return;
        }

        if breaks >= 2 || self.in_heading {
            self.in_heading = false;
            self.flush_words();
            self.after_blank = breaks >= 2;

            let previous = self.tokens.last().map(|t| &t.kind);
            if !self.tokens.is_empty() && previous != Some(&TokenKind::BlockBreak) {
                self.push_token(TokenKind::BlockBreak, start);
            }
            if breaks >= 2 {
                self.skip_horizontal_whitespace();
            }
            return;
        }

        self.after_blank = self.at_document_start();
        if self.line_marker_at(self.pos).is_some() {
            self.flush_words();
        } else if !self.at_block_start() {
            let source = self.source;
            let text = &source[start.start..self.offset];
            if self.words_start.is_none() {
                self.words_start = Some(start);
            }
            self.words.push_str(text);
        }
    }

    fn enter_marker(&mut self, marker: LineMarker, len: usize) -> ScannerMode {
        self.flush_words();
        self.skip_horizontal_whitespace();
        let start = self.here();

        match marker {
            LineMarker::Heading(level) => {
                self.advance_by(len);
                self.push_token(TokenKind::Heading(level), start);
                self.in_heading = true;
                ScannerMode::Prose
            }
            LineMarker::List(kind) => {
                self.advance_by(len);
                self.push_token(TokenKind::ListMarker(kind), start);
                ScannerMode::Prose
            }
            LineMarker::Fence(ticks) => {
                self.advance_by(ticks);
                self.push_token(TokenKind::CodeFence, start);
                // The info string is not kept.
                while !self.is_at_end() && !matches!(self.peek(), '\n' | '\r') {
                    self.advance();
                }
                self.skip_line_break();
                ScannerMode::Fence { ticks }
            }
        }
    }

    /// Recognize a heading, list or fence marker at the line starting at `pos`.
    /// Returns the marker and its length (after indentation), including any
    /// whitespace that follows heading and list markers.
    fn line_marker_at(&self, pos: usize) -> Option<(LineMarker, usize)> {
        let mut i = pos;
        while is_space(self.char_at(i)) {
            i += 1;
        }
        let marker_start = i;

        match self.char_at(i) {
            '#' => {
                while self.char_at(i) == '#' {
                    i += 1;
                }
                let level = i - marker_start;
                if level > 6 || !is_space(self.char_at(i)) {
                    return None;
                }
                let len = level + self.count_spaces(i);
                Some((LineMarker::Heading(level as u8), len))
            }
            '*' | '-' if is_space(self.char_at(i + 1)) => {
                let len = 1 + self.count_spaces(i + 1);
                Some((LineMarker::List(ListKind::Unordered), len))
            }
            '0'..='9' => {
                while self.char_at(i).is_ascii_digit() {
                    i += 1;
                }
                if self.char_at(i) != '.' || !is_space(self.char_at(i + 1)) {
                    return None;
                }
                let len = i + 1 - marker_start + self.count_spaces(i + 1);
                Some((LineMarker::List(ListKind::Ordered), len))
            }
            '`' => {
                let ticks = self.backtick_run(i);
                let min = self.options.fence_min_backticks.max(2);
                if ticks < min || (self.options.strict_fences && !self.after_blank) {
                    return None;
                }
                Some((LineMarker::Fence(ticks), ticks))
            }
            _ => None,
        }
    }

    // --- Backticks ---

    fn scan_prose_backtick(&mut self) -> ScannerMode {
        let run = self.backtick_run(self.pos);
        if run == 1 && self.has_closing_backtick(self.pos + 1) {
            self.flush_words();
            self.emit_single(TokenKind::Backtick);
            return ScannerMode::Backtick { in_tag: false };
        }

        for _ in 0..run {
            self.push_word('`');
        }
        ScannerMode::Prose
    }

    /// Is there a backtick ahead before the next blank line?
    fn has_closing_backtick(&self, from: usize) -> bool {
        let mut i = from;
        loop {
            match self.char_at(i) {
                '`' => return true,
                '\0' if i >= self.chars.len() => return false,
                '\n' | '\r' => {
                    let mut j = i + 1;
                    if self.char_at(i) == '\r' && self.char_at(j) == '\n' {
                        j += 1;
                    }
                    while is_space(self.char_at(j)) {
                        j += 1;
                    }
                    if matches!(self.char_at(j), '\n' | '\r') || j >= self.chars.len() {
                        return false;
                    }
                    i = j;
                }
                _ => i += 1,
            }
        }
    }

    /// Capture raw text up to the closing backtick. Nothing inside is re-lexed.
    fn scan_backtick(&mut self, in_tag: bool) -> ScannerMode {
        let start = self.here();
        while !self.is_at_end() && self.peek() != '`' {
            self.advance();
        }

        let source = self.source;
        let content = &source[start.start..self.offset];
        if !content.is_empty() {
            self.push_token(TokenKind::Words(content.to_string()), start);
        }
        if !self.is_at_end() {
            self.emit_single(TokenKind::Backtick);
        }

        if in_tag {
            ScannerMode::Tag
        } else {
            ScannerMode::Prose
        }
    }

    // --- Code fences ---

    /// Capture fence content verbatim, line by line, until a closing fence
    /// of at least `ticks` backticks or the end of input.
    fn scan_fence(&mut self, ticks: usize) -> ScannerMode {
        let start = self.here();
        let mut content_end = start.start;

        while !self.is_at_end() && !self.is_closing_fence(self.pos, ticks) {
            while !self.is_at_end() && !matches!(self.peek(), '\n' | '\r') {
                self.advance();
            }
            content_end = self.offset;
            self.skip_line_break();
        }

        let content = &self.source[start.start..content_end];
        if !content.is_empty() {
            let span = Span::new(start.start, content_end, start.line, start.column);
            self.tokens
                .push(Token::new(TokenKind::Words(content.to_string()), span));
        }

        if !self.is_at_end() {
            self.skip_horizontal_whitespace();
            let close = self.here();
            while self.peek() == '`' {
                self.advance();
            }
            self.push_token(TokenKind::CodeFence, close);
            self.skip_horizontal_whitespace();
        }

        ScannerMode::Prose
    }

    fn is_closing_fence(&self, pos: usize, ticks: usize) -> bool {
        let mut i = pos;
        while is_space(self.char_at(i)) {
            i += 1;
        }
        let run = self.backtick_run(i);
        if run < ticks {
            return false;
        }
        i += run;
        while is_space(self.char_at(i)) {
            i += 1;
        }
        i >= self.chars.len() || matches!(self.char_at(i), '\n' | '\r')
    }

    // --- Tags ---

    fn scan_tag(&mut self) -> ScannerMode {
        match self.peek() {
            c if c.is_whitespace() => {
                self.advance();
                ScannerMode::Tag
            }
            ']' => {
                self.emit_single(TokenKind::CloseBracket);
                ScannerMode::Prose
            }
            '/' => {
                self.emit_single(TokenKind::ForwardSlash);
                ScannerMode::Tag
            }
            ':' => {
                self.emit_single(TokenKind::ParamSeparator);
                ScannerMode::Tag
            }
            '"' => ScannerMode::Quoted,
            '`' => {
                self.emit_single(TokenKind::Backtick);
                ScannerMode::Backtick { in_tag: true }
            }
            _ => {
                self.scan_tag_word();
                ScannerMode::Tag
            }
        }
    }

    /// Scan a component name, property name, or bare property value.
    fn scan_tag_word(&mut self) {
        let start = self.here();
        while !self.is_at_end() && !is_tag_delimiter(self.peek()) {
            self.advance();
        }
        let word = self.source[start.start..self.offset].to_string();
        self.push_token(TokenKind::TagWord(word), start);
    }

    /// Scan a quoted string. `\"` and `\\` are the only escapes.
    /// An unterminated string falls back to a raw `Words` token.
    fn scan_string(&mut self) -> ScannerMode {
        let start = self.here();
        self.advance(); // consume opening quote

        let mut value = String::new();
        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\\' && matches!(self.peek_next(), '"' | '\\') {
                self.advance();
            }
            value.push(self.peek());
            self.advance();
        }

        if self.is_at_end() {
            let raw = self.source[start.start..].to_string();
            self.push_token(TokenKind::Words(raw), start);
            return ScannerMode::Tag;
        }

        self.advance(); // consume closing quote
        self.push_token(TokenKind::StringLiteral(value), start);
        ScannerMode::Tag
    }

    // --- Helpers ---

    fn push_word(&mut self, c: char) {
        if self.words_start.is_none() {
            self.words_start = Some(self.here());
        }
        self.words.push(c);
        self.advance();
    }

    fn flush_words(&mut self) {
        if let Some(start) = self.words_start.take() {
            let text = std::mem::take(&mut self.words);
            let span = Span::new(start.start, start.start + text.len(), start.line, start.column);
            self.tokens.push(Token::new(TokenKind::Words(text), span));
        }
    }

    /// Spaces left dangling before the final line breaks are not text.
    fn trim_trailing_space(&mut self) {
        let len = self.words.trim_end_matches(is_space).len();
        self.words.truncate(len);
        if self.words.is_empty() {
            self.words_start = None;
        }
    }

    fn at_document_start(&self) -> bool {
        self.tokens.is_empty() && self.words.is_empty()
    }

    /// Nothing inline has been seen since the last block boundary.
    fn at_block_start(&self) -> bool {
        self.words.is_empty()
            && matches!(
                self.tokens.last().map(|t| &t.kind),
                None | Some(
                    TokenKind::BlockBreak
                        | TokenKind::Heading(_)
                        | TokenKind::ListMarker(_)
                        | TokenKind::CodeFence
                )
            )
    }

    fn here(&self) -> Span {
        Span::new(self.offset, self.offset, self.line, self.column)
    }

    fn push_token(&mut self, kind: TokenKind, start: Span) {
        let span = Span::new(start.start, self.offset, start.line, start.column);
        self.tokens.push(Token::new(kind, span));
    }

    fn emit_single(&mut self, kind: TokenKind) {
        let start = self.here();
        self.advance();
        self.push_token(kind, start);
    }

    fn skip_line_break(&mut self) {
        match self.peek() {
            '\r' => {
                self.advance();
                if self.peek() == '\n' {
                    self.advance();
                }
            }
            '\n' => self.advance(),
            _ => {}
        }
    }

    fn skip_horizontal_whitespace(&mut self) {
        while is_space(self.peek()) {
            self.advance();
        }
    }

    fn count_spaces(&self, from: usize) -> usize {
        let mut i = from;
        while is_space(self.char_at(i)) {
            i += 1;
        }
        i - from
    }

    fn backtick_run(&self, from: usize) -> usize {
        let mut i = from;
        while self.char_at(i) == '`' {
            i += 1;
        }
        i - from
    }

    fn char_at(&self, i: usize) -> char {
        self.chars.get(i).copied().unwrap_or('\0')
    }

    fn peek(&self) -> char {
        self.char_at(self.pos)
    }

    fn peek_next(&self) -> char {
        self.char_at(self.pos + 1)
    }

    fn advance(&mut self) {
        let Some(&c) = self.chars.get(self.pos) else {
            return;
        };
        self.pos += 1;
        self.offset += c.len_utf8();
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            // `\r\n` counts once, on the `\n`
            '\r' if self.peek() == '\n' => {}
            '\r' => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn advance_to(&mut self, pos: usize) {
        while self.pos < pos && !self.is_at_end() {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_tag_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ']' | '/' | ':' | '"' | '`')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::render_tokens;
    use pretty_assertions::assert_eq;

    /// Helper: tokenize and return token kinds (ignoring spans).
    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::tokenize(source)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    /// Helper: tokenize and render in canonical form.
    fn rendered(source: &str) -> String {
        render_tokens(&Scanner::tokenize(source))
    }

    fn words(text: &str) -> TokenKind {
        TokenKind::Words(text.into())
    }

    fn tag(text: &str) -> TokenKind {
        TokenKind::TagWord(text.into())
    }

    // =========================================================================
    // Structure: empty input, breaks, EOF
    // =========================================================================

    #[test]
    fn test_empty_source() {
        let toks = Scanner::tokenize("");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_paragraph_break_and_brackets() {
        assert_eq!(
            rendered("Hello \n\nWorld! []"),
            "WORDS TOKEN_VALUE_START \"Hello \" TOKEN_VALUE_END BREAK WORDS TOKEN_VALUE_START \"World! \" TOKEN_VALUE_END OPEN_BRACKET CLOSE_BRACKET EOF"
        );
    }

    #[test]
    fn test_leading_and_trailing_newlines() {
        assert_eq!(
            rendered("\n\n\n\n text \n\n"),
            "WORDS TOKEN_VALUE_START \"text\" TOKEN_VALUE_END EOF"
        );
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(
            kinds("a\n\n\n\nb"),
            vec![words("a"), TokenKind::BlockBreak, words("b"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_whitespace_only_line_is_blank() {
        assert_eq!(
            kinds("a\n  \t\nb"),
            vec![words("a"), TokenKind::BlockBreak, words("b"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_single_newline_stays_in_prose() {
        assert_eq!(kinds("a\nb"), vec![words("a\nb"), TokenKind::Eof]);
    }

    #[test]
    fn test_windows_line_endings() {
        let toks = Scanner::tokenize("a\r\n\r\nb");
        let k: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            k,
            vec![words("a"), TokenKind::BlockBreak, words("b"), TokenKind::Eof]
        );
        assert_eq!((toks[2].span.line, toks[2].span.column), (3, 1));
    }

    // =========================================================================
    // Headings
    // =========================================================================

    #[test]
    fn test_heading() {
        assert_eq!(
            rendered("\n## my title"),
            "HEADER_2 TOKEN_VALUE_START \"my title\" TOKEN_VALUE_END EOF"
        );
        // The token stream itself keeps the title as a prose run.
        assert_eq!(
            kinds("\n## my title"),
            vec![TokenKind::Heading(2), words("my title"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_trailing_space_kept_without_final_newline() {
        assert_eq!(kinds("text "), vec![words("text "), TokenKind::Eof]);
        assert_eq!(kinds("[a /]  \n"), vec![
            TokenKind::OpenBracket,
            tag("a"),
            TokenKind::ForwardSlash,
            TokenKind::CloseBracket,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_heading_line_ends_block() {
        assert_eq!(
            kinds("# Title\nBody"),
            vec![
                TokenKind::Heading(1),
                words("Title"),
                TokenKind::BlockBreak,
                words("Body"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hash_without_whitespace_is_prose() {
        assert_eq!(kinds("#hashtag"), vec![words("#hashtag"), TokenKind::Eof]);
    }

    #[test]
    fn test_seven_hashes_is_prose() {
        assert_eq!(
            kinds("####### deep"),
            vec![words("####### deep"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_heading_only_at_line_start() {
        assert_eq!(kinds("a ## b"), vec![words("a ## b"), TokenKind::Eof]);
    }

    // =========================================================================
    // Lists
    // =========================================================================

    #[test]
    fn test_unordered_list() {
        assert_eq!(
            kinds("* one\n- two"),
            vec![
                TokenKind::ListMarker(ListKind::Unordered),
                words("one"),
                TokenKind::ListMarker(ListKind::Unordered),
                words("two"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(
            kinds("1. one\n12. two"),
            vec![
                TokenKind::ListMarker(ListKind::Ordered),
                words("one"),
                TokenKind::ListMarker(ListKind::Ordered),
                words("two"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_negative_number_is_not_a_marker() {
        assert_eq!(
            kinds("-10 degrees"),
            vec![words("-10 degrees"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_list_after_paragraph_line() {
        assert_eq!(
            kinds("Items:\n* a"),
            vec![
                words("Items:"),
                TokenKind::ListMarker(ListKind::Unordered),
                words("a"),
                TokenKind::Eof,
            ]
        );
    }

    // =========================================================================
    // Backticks and fences
    // =========================================================================

    #[test]
    fn test_inline_backticks() {
        assert_eq!(
            rendered("regular text and stuff, then some `code`"),
            "WORDS TOKEN_VALUE_START \"regular text and stuff, then some \" TOKEN_VALUE_END BACKTICK WORDS TOKEN_VALUE_START \"code\" TOKEN_VALUE_END BACKTICK EOF"
        );
    }

    #[test]
    fn test_unpaired_backtick_is_prose() {
        assert_eq!(kinds("a ` b"), vec![words("a ` b"), TokenKind::Eof]);
    }

    #[test]
    fn test_backtick_pair_does_not_cross_blank_line() {
        assert_eq!(
            kinds("a `b\n\nc` d"),
            vec![
                words("a `b"),
                TokenKind::BlockBreak,
                words("c` d"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_code_fence_is_verbatim() {
        assert_eq!(
            kinds("text\n\n```js\nvar x = `y`; [a]\n\n# not a heading\n```\n"),
            vec![
                words("text"),
                TokenKind::BlockBreak,
                TokenKind::CodeFence,
                words("var x = `y`; [a]\n\n# not a heading"),
                TokenKind::CodeFence,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_code_fence_after_single_newline() {
        assert_eq!(
            kinds("text\n```\ncode\n```"),
            vec![
                words("text"),
                TokenKind::CodeFence,
                words("code"),
                TokenKind::CodeFence,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strict_fences_need_blank_line() {
        let options = LexerOptions {
            strict_fences: true,
            ..LexerOptions::default()
        };
        let k: Vec<_> = Scanner::tokenize_with("text\n```\ncode\n```", &options)
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(k, vec![words("text\n```\ncode\n```"), TokenKind::Eof]);

        let k: Vec<_> = Scanner::tokenize_with("text\n\n```\ncode\n```", &options)
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            k,
            vec![
                words("text"),
                TokenKind::BlockBreak,
                TokenKind::CodeFence,
                words("code"),
                TokenKind::CodeFence,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        assert_eq!(
            kinds("```\nline one\nline two\n"),
            vec![
                TokenKind::CodeFence,
                words("line one\nline two"),
                TokenKind::Eof
            ]
        );
    }

    // =========================================================================
    // Component tags
    // =========================================================================

    #[test]
    fn test_component_with_properties() {
        assert_eq!(
            rendered("Hello \n\nWorld! \n\n [VarDisplay var:v work:\"no\" /]"),
            "WORDS TOKEN_VALUE_START \"Hello \" TOKEN_VALUE_END BREAK WORDS TOKEN_VALUE_START \"World! \" TOKEN_VALUE_END BREAK OPEN_BRACKET COMPONENT_WORD TOKEN_VALUE_START \"VarDisplay\" TOKEN_VALUE_END COMPONENT_WORD TOKEN_VALUE_START \"var\" TOKEN_VALUE_END PARAM_SEPARATOR COMPONENT_WORD TOKEN_VALUE_START \"v\" TOKEN_VALUE_END COMPONENT_WORD TOKEN_VALUE_START \"work\" TOKEN_VALUE_END PARAM_SEPARATOR STRING TOKEN_VALUE_START \"&quot;no&quot;\" TOKEN_VALUE_END FORWARD_SLASH CLOSE_BRACKET EOF"
        );
    }

    #[test]
    fn test_negative_number_value() {
        assert_eq!(
            kinds("[c prop:-10 /]"),
            vec![
                TokenKind::OpenBracket,
                tag("c"),
                tag("prop"),
                TokenKind::ParamSeparator,
                tag("-10"),
                TokenKind::ForwardSlash,
                TokenKind::CloseBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_close_tag() {
        assert_eq!(
            kinds("[/Slideshow]"),
            vec![
                TokenKind::OpenBracket,
                TokenKind::ForwardSlash,
                tag("Slideshow"),
                TokenKind::CloseBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_expression_value_is_not_relexed() {
        assert_eq!(
            kinds("[c prop:`x > 1 ? [a] : \"b\"` /]"),
            vec![
                TokenKind::OpenBracket,
                tag("c"),
                tag("prop"),
                TokenKind::ParamSeparator,
                TokenKind::Backtick,
                words("x > 1 ? [a] : \"b\""),
                TokenKind::Backtick,
                TokenKind::ForwardSlash,
                TokenKind::CloseBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let toks = Scanner::tokenize("[c s:\"say \\\"hi\\\"\" /]");
        assert_eq!(toks[4].kind, TokenKind::StringLiteral("say \"hi\"".into()));
        assert_eq!(
            toks[4].kind.to_string(),
            "STRING TOKEN_VALUE_START \"&quot;say &quot;hi&quot;&quot;\" TOKEN_VALUE_END"
        );
    }

    #[test]
    fn test_unterminated_string_falls_back_to_words() {
        assert_eq!(
            kinds("[c s:\"abc /]"),
            vec![
                TokenKind::OpenBracket,
                tag("c"),
                tag("s"),
                TokenKind::ParamSeparator,
                words("\"abc /]"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tag_spans_lines() {
        assert_eq!(
            kinds("[c\n  a:1\n/]"),
            vec![
                TokenKind::OpenBracket,
                tag("c"),
                tag("a"),
                TokenKind::ParamSeparator,
                tag("1"),
                TokenKind::ForwardSlash,
                TokenKind::CloseBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unclosed_bracket_at_end() {
        assert_eq!(
            kinds("[a"),
            vec![TokenKind::OpenBracket, tag("a"), TokenKind::Eof]
        );
    }

    // =========================================================================
    // Positions
    // =========================================================================

    #[test]
    fn test_positions() {
        let toks = Scanner::tokenize("ab\n\n[x /]");
        let positions: Vec<_> = toks
            .iter()
            .map(|t| (t.span.line, t.span.column))
            .collect();
        assert_eq!(
            positions,
            vec![(1, 1), (1, 3), (3, 1), (3, 2), (3, 4), (3, 5), (3, 6)]
        );
    }

    #[test]
    fn test_positions_count_characters_not_bytes() {
        let toks = Scanner::tokenize("é [x /]");
        assert_eq!(toks[1].kind, TokenKind::OpenBracket);
        assert_eq!(toks[1].span.column, 3);
        assert_eq!(toks[1].span.start, 3);
    }

    #[test]
    fn test_positions_inside_code_fence() {
        let toks = Scanner::tokenize("```\na\nb\n```\n\n[x /]");
        let bracket = toks
            .iter()
            .find(|t| t.kind == TokenKind::OpenBracket)
            .unwrap();
        assert_eq!((bracket.span.line, bracket.span.column), (6, 1));
    }

    #[test]
    fn test_word_span_covers_text() {
        let source = "Hello [x /]";
        let toks = Scanner::tokenize(source);
        assert_eq!(&source[toks[0].span.start..toks[0].span.end], "Hello ");
    }

    #[test]
    fn test_always_ends_with_eof() {
        for source in ["", "]", "[", "\"", "`", "```", "[a:", "# ", "\r", "[/]"] {
            let toks = Scanner::tokenize(source);
            assert_eq!(toks.last().unwrap().kind, TokenKind::Eof, "source: {source:?}");
        }
    }
}
