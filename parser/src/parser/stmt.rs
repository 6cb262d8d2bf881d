//! Statement parsing.
//!
//! Handles the statement forms of the snippet language:
//! - let, assignment, import
//! - if / else if / else, for, while
//! - break, continue, return
//! - expression statements

use super::Parser;
use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::TokenKind;

impl Parser {
    /// Parse a single statement with its optional trailing semicolon.
    pub(crate) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let stmt = match self.peek().kind {
            TokenKind::Let => self.parse_let()?,
            TokenKind::Import => self.parse_import()?,
            TokenKind::If => Stmt::If(self.parse_if()?),
            TokenKind::For => self.parse_for()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::Break => Stmt::Break(self.advance().span),
            TokenKind::Continue => Stmt::Continue(self.advance().span),
            TokenKind::Return => Stmt::Return(self.advance().span),
            _ => self.parse_expr_or_assign()?,
        };
        self.eat(&TokenKind::Semicolon);
        Ok(stmt)
    }

    fn parse_let(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::Let)?.span;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::Assign)?;
        let value = self.parse_expr()?;
        let span = self.span_from(start);
        Ok(Stmt::Let(LetStmt { name, value, span }))
    }

    fn parse_import(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::Import)?.span;
        let mut modules = vec![self.expect_ident()?];
        while self.eat(&TokenKind::Comma) {
            modules.push(self.expect_ident()?);
        }
        let span = self.span_from(start);
        Ok(Stmt::Import(ImportStmt { modules, span }))
    }

    fn parse_if(&mut self) -> ParseResult<IfStmt> {
        let start = self.expect(&TokenKind::If)?.span;
        let mut branches = Vec::new();
        let mut else_block = None;

        let condition = self.parse_expr()?;
        let body = self.parse_block()?;
        branches.push((condition, body));

        while self.eat(&TokenKind::Else) {
            if self.eat(&TokenKind::If) {
                let condition = self.parse_expr()?;
                let body = self.parse_block()?;
                branches.push((condition, body));
            } else {
                else_block = Some(self.parse_block()?);
                break;
            }
        }

        let span = self.span_from(start);
        Ok(IfStmt {
            branches,
            else_block,
            span,
        })
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::For)?.span;
        let (var, _) = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let iterable = self.parse_expr()?;
        let body = self.parse_block()?;
        let span = self.span_from(start);
        Ok(Stmt::For(ForStmt {
            var,
            iterable,
            body,
            span,
        }))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(&TokenKind::While)?.span;
        let condition = self.parse_expr()?;
        let body = self.parse_block()?;
        let span = self.span_from(start);
        Ok(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect(&TokenKind::LBrace)?;
        self.enter()?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.unexpected("'}'"));
            }
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace)?;
        self.leave();
        Ok(stmts)
    }

    fn parse_expr_or_assign(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expr()?;
        if !self.eat(&TokenKind::Assign) {
            return Ok(Stmt::Expr(expr));
        }

        let start = expr.span();
        let target = assign_target(expr)?;
        let value = self.parse_expr()?;
        let span = self.span_from(start);
        Ok(Stmt::Assign(AssignStmt {
            target,
            value,
            span,
        }))
    }
}

/// Convert a parsed expression into an assignment target.
fn assign_target(expr: Expr) -> ParseResult<AssignTarget> {
    match expr {
        Expr::Var(name, span) => Ok(AssignTarget::Var(name, span)),
        Expr::Field(base, field, span) => match *base {
            Expr::Var(base, _) => Ok(AssignTarget::Field { base, field, span }),
            other => Err(nested_target(other.span())),
        },
        Expr::Index(base, index, span) => match *base {
            Expr::Var(base, _) => Ok(AssignTarget::Index {
                base,
                index: *index,
                span,
            }),
            other => Err(nested_target(other.span())),
        },
        other => Err(ParseError::new("invalid assignment target", other.span())),
    }
}

fn nested_target(span: Span) -> ParseError {
    ParseError::new(
        "assignment target must be a name, name.field or name[index]",
        span,
    )
}
