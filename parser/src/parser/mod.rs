//! Parser for snippet source text.
//!
//! This module is organized into submodules by parsing category:
//! - `expr`: Expression parsing (operators, literals, calls, field access)
//! - `stmt`: Statement parsing (let, assignment, import, control flow)

mod expr;
mod stmt;

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token, TokenKind};

/// Default bound on expression and block nesting.
pub const MAX_NESTING_DEPTH: usize = 64;

// ==================== PARSER STATE ====================

/// Parser state.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    /// Create a new parser from source text.
    pub fn new(input: &str) -> ParseResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth: MAX_NESTING_DEPTH,
        })
    }

    /// Override the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

// ==================== TOKEN HELPERS ====================

impl Parser {
    pub(crate) fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    pub(crate) fn peek_next(&self) -> &TokenKind {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + 1).min(last)].kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    /// Consume the token if it matches.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.name()))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> ParseResult<(String, Span)> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Eof) {
            ParseError::unexpected_eof(token.span, expected)
        } else {
            ParseError::unexpected_token(token.span, expected, token.kind.name())
        }
    }

    pub(crate) fn span_from(&self, start: Span) -> Span {
        let end_token = if self.pos > 0 {
            &self.tokens[self.pos - 1]
        } else {
            self.peek()
        };
        Span::new(start.start, end_token.span.end, start.line, start.column)
    }

    /// Enter one nesting level; fails once the limit is exceeded.
    pub(crate) fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::nesting_too_deep(self.peek().span, self.max_depth));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

// ==================== PUBLIC API ====================

impl Parser {
    /// Parse a whole snippet.
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    /// Parse exactly one expression followed by end of input.
    pub fn parse_single_expression(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_expr()?;
        if !self.is_at_end() {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }
}

/// Parse a snippet from source text.
pub fn parse_program(input: &str) -> ParseResult<Program> {
    Parser::new(input)?.parse_program()
}

/// Parse a standalone expression from source text.
pub fn parse_expression(input: &str) -> ParseResult<Expr> {
    Parser::new(input)?.parse_single_expression()
}

// ==================== TESTS ====================
