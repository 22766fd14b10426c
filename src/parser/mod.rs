//! Parser module for building the declaration arena.
//!
//! This module transforms a stream of tokens into an `Ast`. Parsing works on
//! whole statements rather than single tokens:
//!
//! - The segmenter cuts the token stream into statements
//! - Declaration and statement handlers are dispatched on the leading token
//! - Expressions are split at their lowest-precedence top-level operator
//! - Type annotations are resolved into type descriptors
//!
//! Errors are collected in the parser's diagnostics. Only a missing body or
//! an unclosed brace stops the build.

pub mod decl;
pub mod expr;
pub mod lookups;
pub mod parser;
pub mod parts;
pub mod segment;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
