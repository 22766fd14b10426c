//! Type checking and semantic analysis module.
//!
//! This module resolves the parsed AST in place:
//!
//! - Building the scoped symbol table (`defmap`)
//! - Resolving type annotations to concrete types
//! - Solving binary operators and folding constants (`solver`, `constant`)
//! - Instantiating generic functions and structs (`generics`)
//! - Checking statements, assignments, calls and returns
//!
//! Every problem found is reported as a diagnostic; checking never stops early.

pub mod constant;
pub mod defmap;
pub mod expr;
pub mod generics;
pub mod solver;
pub mod stmt;
pub mod type_checker;

#[cfg(test)]
mod tests;
