//! Compiler-wide settings.
//!
//! A `CompilerConfig` is built once by the caller and handed by reference to
//! the parser and the type checker. Nothing in the crate reads settings from
//! global state.

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Bit width of the platform-sized `int`, `uint` and `uintptr` types.
    pub int_bits: u8,
    /// Whether `unsafe` pointer types may appear outside of `unsafe` blocks.
    pub allow_unsafe: bool,
    /// Path prefix that `use std::...` declarations resolve under.
    pub std_root: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            int_bits: 64,
            allow_unsafe: false,
            std_root: String::from("std"),
        }
    }
}

impl CompilerConfig {
    pub fn with_int_bits(mut self, bits: u8) -> Self {
        self.int_bits = bits;
        self
    }

    pub fn with_unsafe(mut self, allow: bool) -> Self {
        self.allow_unsafe = allow;
        self
    }

    /// Resolves a `use` path to the location the surrounding tooling loads it from.
    pub fn std_path(&self, path: &str) -> String {
        let mut out = self.std_root.clone();
        for part in path.split("::").skip(1) {
            out.push('/');
            out.push_str(part);
        }
        out
    }
}
