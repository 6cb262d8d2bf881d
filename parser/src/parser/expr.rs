//! Expression parsing.
//!
//! Handles operator precedence parsing for snippet expressions:
//! - Logical: or, ??, and, not
//! - Comparison: ==, !=, <, <=, >, >=, in, not in
//! - Additive: +, -
//! - Multiplicative: *, /, %
//! - Unary: -
//! - Postfix: field access (.), indexing ([]), method calls
//! - Primary: literals, variables, function calls, lists, maps

use super::Parser;
use crate::ast::*;
use crate::error::ParseResult;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse an expression.
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.enter()?;
        let expr = self.parse_or()?;
        self.leave();
        Ok(expr)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_null_coalesce()?;

        while self.check(&TokenKind::Or) {
            let start = left.span();
            self.advance();
            let right = self.parse_null_coalesce()?;
            let span = self.span_from(start);
            left = Expr::BinaryOp(BinaryOp::Or, Box::new(left), Box::new(right), span);
        }

        Ok(left)
    }

    fn parse_null_coalesce(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;

        while self.check(&TokenKind::NullCoalesce) {
            let start = left.span();
            self.advance();
            let right = self.parse_and()?;
            let span = self.span_from(start);
            left = Expr::BinaryOp(
                BinaryOp::NullCoalesce,
                Box::new(left),
                Box::new(right),
                span,
            );
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;

        while self.check(&TokenKind::And) {
            let start = left.span();
            self.advance();
            let right = self.parse_not()?;
            let span = self.span_from(start);
            left = Expr::BinaryOp(BinaryOp::And, Box::new(left), Box::new(right), span);
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Not) {
            let start = self.advance().span;
            self.enter()?;
            let expr = self.parse_not()?;
            self.leave();
            let span = self.span_from(start);
            Ok(Expr::UnaryOp(UnaryOp::Not, Box::new(expr), span))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                TokenKind::In => BinaryOp::In,
                TokenKind::Not if matches!(self.peek_next(), TokenKind::In) => BinaryOp::NotIn,
                _ => break,
            };

            let start = left.span();
            if op == BinaryOp::NotIn {
                self.advance();
            }
            self.advance();
            let right = self.parse_additive()?;
            let span = self.span_from(start);
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right), span);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };

            let start = left.span();
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = self.span_from(start);
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right), span);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };

            let start = left.span();
            self.advance();
            let right = self.parse_unary()?;
            let span = self.span_from(start);
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right), span);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Minus) {
            let start = self.advance().span;
            self.enter()?;
            let expr = self.parse_unary()?;
            self.leave();
            let span = self.span_from(start);
            // Fold negative numeric literals.
            return Ok(match expr {
                Expr::Literal(Literal {
                    kind: LiteralKind::Int(n),
                    ..
                }) => Expr::Literal(Literal {
                    kind: LiteralKind::Int(n.wrapping_neg()),
                    span,
                }),
                Expr::Literal(Literal {
                    kind: LiteralKind::Float(f),
                    ..
                }) => Expr::Literal(Literal {
                    kind: LiteralKind::Float(-f),
                    span,
                }),
                other => Expr::UnaryOp(UnaryOp::Neg, Box::new(other), span),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::Dot) {
                let start = expr.span();
                self.advance();
                let (name, _) = self.expect_ident()?;
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    let span = self.span_from(start);
                    expr = Expr::MethodCall(Box::new(expr), Call { name, args, span });
                } else {
                    let span = self.span_from(start);
                    expr = Expr::Field(Box::new(expr), name, span);
                }
            } else if self.check(&TokenKind::LBracket) {
                let start = expr.span();
                self.advance();
                let index = self.parse_expr()?;
                self.expect(&TokenKind::RBracket)?;
                let span = self.span_from(start);
                expr = Expr::Index(Box::new(expr), Box::new(index), span);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let start = token.span;

        let literal =
            move |kind: LiteralKind| -> ParseResult<Expr> { Ok(Expr::Literal(Literal { kind, span: start })) };

        match token.kind {
            TokenKind::Null => {
                self.advance();
                literal(LiteralKind::Null)
            }
            TokenKind::True => {
                self.advance();
                literal(LiteralKind::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                literal(LiteralKind::Bool(false))
            }
            TokenKind::Int(n) => {
                self.advance();
                literal(LiteralKind::Int(n))
            }
            TokenKind::Float(f) => {
                self.advance();
                literal(LiteralKind::Float(f))
            }
            TokenKind::String(s) => {
                self.advance();
                literal(LiteralKind::String(s))
            }
            TokenKind::Timestamp(t) => {
                self.advance();
                literal(LiteralKind::Timestamp(t))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    let span = self.span_from(start);
                    Ok(Expr::Call(Call { name, args, span }))
                } else {
                    Ok(Expr::Var(name, start))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                self.enter()?;
                let mut items = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    items.push(self.parse_expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket)?;
                self.leave();
                Ok(Expr::List(items, self.span_from(start)))
            }
            TokenKind::LBrace => {
                self.advance();
                self.enter()?;
                let mut entries = Vec::new();
                while !self.check(&TokenKind::RBrace) {
                    let key = match self.peek().kind.clone() {
                        TokenKind::String(s) | TokenKind::Ident(s) => {
                            self.advance();
                            s
                        }
                        _ => return Err(self.unexpected("map key")),
                    };
                    self.expect(&TokenKind::Colon)?;
                    entries.push((key, self.parse_expr()?));
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace)?;
                self.leave();
                Ok(Expr::Map(entries, self.span_from(start)))
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}
