//! Warden Parser
//!
//! This crate provides parsing for trigger snippet source text:
//! - Statement parsing (let, assignment, import, if, for, while, break, continue, return)
//! - Expression parsing (arithmetic, comparison, membership, calls, field access)
//! - A nesting limit so hostile input cannot exhaust the host stack
//! - Error handling with location information

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::*;
pub use error::*;
pub use lexer::{parse_timestamp, Lexer, Token, TokenKind};
pub use parser::{parse_expression, parse_program, Parser, MAX_NESTING_DEPTH};
