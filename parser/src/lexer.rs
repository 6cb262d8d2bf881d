//! Lexer (tokenizer) for snippet source text.

use crate::{ParseError, ParseResult, Span};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Token types.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords (lowercase, case-sensitive)
    Let,
    If,
    Else,
    For,
    In,
    While,
    Break,
    Continue,
    Return,
    Import,
    And,
    Or,
    Not,
    True,
    False,
    Null,

    // Literals
    Ident(String),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),

    // Symbols
    LParen,       // (
    RParen,       // )
    LBrace,       // {
    RBrace,       // }
    LBracket,     // [
    RBracket,     // ]
    Comma,        // ,
    Colon,        // :
    Semicolon,    // ;
    Dot,          // .
    Assign,       // =
    Eq,           // ==
    NotEq,        // !=
    Lt,           // <
    LtEq,         // <=
    Gt,           // >
    GtEq,         // >=
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    NullCoalesce, // ??

    // End of file
    Eof,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Let => "'let'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::For => "'for'",
            TokenKind::In => "'in'",
            TokenKind::While => "'while'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Return => "'return'",
            TokenKind::Import => "'import'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Int(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::String(_) => "string",
            TokenKind::Timestamp(_) => "timestamp",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Assign => "'='",
            TokenKind::Eq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::NullCoalesce => "'??'",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A token with its span.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(pos: usize, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
        }
    }
}

/// Lexer state.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize all input into a vector of tokens. The last token is always `Eof`.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn current_span(&self) -> Span {
        Span::new(self.pos, self.pos, self.line, self.column)
    }

    fn span_from(&self, start: usize, start_line: usize, start_col: usize) -> Span {
        Span::new(start, self.pos, start_line, start_col)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn next_char(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.pos = pos + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }

    /// Skip whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.next_char();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if !matches!(lookahead.peek(), Some((_, '/'))) {
                        return;
                    }
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.next_char();
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_trivia();

        let start = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let Some(c) = self.next_char() else {
            return Ok(Token::eof(self.pos, self.line, self.column));
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '=' => self.if_next('=', TokenKind::Eq, TokenKind::Assign),
            '<' => self.if_next('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.if_next('=', TokenKind::GtEq, TokenKind::Gt),
            '!' => {
                if self.peek_char() == Some('=') {
                    self.next_char();
                    TokenKind::NotEq
                } else {
                    return Err(ParseError::new(
                        "unexpected character '!', use 'not' for negation",
                        self.span_from(start, start_line, start_col),
                    ));
                }
            }
            '?' => {
                if self.peek_char() == Some('?') {
                    self.next_char();
                    TokenKind::NullCoalesce
                } else {
                    return Err(ParseError::new(
                        "unexpected character '?'",
                        self.span_from(start, start_line, start_col),
                    ));
                }
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '@' => self.scan_timestamp(start, start_line, start_col)?,
            '"' => self.scan_string(start, start_line, start_col)?,
            '_' | 'a'..='z' | 'A'..='Z' => self.scan_ident_or_keyword(c),
            '0'..='9' => self.scan_number(c, start, start_line, start_col)?,
            _ => {
                return Err(ParseError::new(
                    format!("unexpected character '{}'", c),
                    self.span_from(start, start_line, start_col),
                ));
            }
        };

        Ok(Token::new(
            kind,
            self.span_from(start, start_line, start_col),
        ))
    }

    fn if_next(&mut self, expected: char, matched: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.peek_char() == Some(expected) {
            self.next_char();
            matched
        } else {
            otherwise
        }
    }

    fn scan_string(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<TokenKind> {
        let mut value = String::new();

        loop {
            match self.next_char() {
                None => {
                    return Err(ParseError::new(
                        "unterminated string literal",
                        self.span_from(start, start_line, start_col),
                    ));
                }
                Some('"') => break,
                Some('\\') => {
                    let escaped = match self.next_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => {
                            return Err(ParseError::new(
                                format!("invalid escape sequence '\\{}'", c),
                                self.current_span(),
                            ));
                        }
                        None => {
                            return Err(ParseError::new(
                                "unterminated escape sequence",
                                self.current_span(),
                            ));
                        }
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }

        Ok(TokenKind::String(value))
    }

    fn scan_ident_or_keyword(&mut self, first: char) -> TokenKind {
        let mut ident = String::new();
        ident.push(first);

        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "let" => TokenKind::Let,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "import" => TokenKind::Import,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident(ident),
        }
    }

    fn scan_number(
        &mut self,
        first: char,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<TokenKind> {
        let mut number = String::new();
        number.push(first);
        self.scan_digits(&mut number);

        // A '.' only continues the number when a digit follows, so `1.abs()` still works.
        let mut lookahead = self.chars.clone();
        let has_decimal = matches!(lookahead.next(), Some((_, '.')))
            && matches!(lookahead.peek(), Some((_, c)) if c.is_ascii_digit());
        if has_decimal {
            number.push('.');
            self.next_char();
            self.scan_digits(&mut number);
        }

        let has_exponent = matches!(self.peek_char(), Some('e' | 'E'));
        if has_exponent {
            self.scan_exponent(&mut number)?;
        }

        if has_decimal || has_exponent {
            let value: f64 = number.parse().map_err(|_| {
                ParseError::new(
                    format!("invalid float literal '{}'", number),
                    self.span_from(start, start_line, start_col),
                )
            })?;
            Ok(TokenKind::Float(value))
        } else {
            let value: i64 = number.parse().map_err(|_| {
                ParseError::new(
                    format!("integer literal '{}' out of range", number),
                    self.span_from(start, start_line, start_col),
                )
            })?;
            Ok(TokenKind::Int(value))
        }
    }

    fn scan_digits(&mut self, number: &mut String) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                number.push(c);
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Scan the exponent part of a number (e.g., e10, E-5, e+3)
    fn scan_exponent(&mut self, number: &mut String) -> ParseResult<()> {
        if let Some(c) = self.next_char() {
            number.push(c);
        }

        if let Some(c) = self.peek_char() {
            if c == '+' || c == '-' {
                number.push(c);
                self.next_char();
            }
        }

        let before = number.len();
        self.scan_digits(number);
        if number.len() == before {
            return Err(ParseError::new(
                format!("invalid exponent in number literal '{}'", number),
                self.current_span(),
            ));
        }

        Ok(())
    }

    /// Scan a timestamp literal (e.g., @2024-01-15 or @2024-01-15T10:30:00Z)
    fn scan_timestamp(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<TokenKind> {
        let mut text = String::new();

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || matches!(c, '-' | ':' | 'T' | 'Z' | '+' | '.') {
                text.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        if text.is_empty() {
            return Err(ParseError::new(
                "expected timestamp after '@'",
                self.span_from(start, start_line, start_col),
            ));
        }

        parse_timestamp(&text).map(TokenKind::Timestamp).ok_or_else(|| {
            ParseError::new(
                format!("invalid timestamp '{}'", text),
                self.span_from(start, start_line, start_col),
            )
        })
    }
}

/// Parse an ISO 8601 date or date-time. Date-only and offset-less values are
/// taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
