//! Error types and error handling for the compiler.
//!
//! This module defines the diagnostics produced by every phase. It includes:
//!
//! - Error structures with source position and severity
//! - One error variant per stable message key
//! - The ordered `Diagnostics` list that passes accumulate into
//! - Helpful error messages and suggestions

pub mod errors;

#[cfg(test)]
mod tests;
