//! Lexical analysis module for the compiler.
//!
//! The parser accepts any finished token sequence. This module provides the
//! default token source, which turns source text into tokens for it. It handles:
//!
//! - Tokenization of source code using regex patterns
//! - Recognition of keywords, primitive type names, identifiers, literals and operators
//! - Row and column tracking for diagnostics
//! - Line and block comments, kept as tokens

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
