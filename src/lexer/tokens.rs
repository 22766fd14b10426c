use lazy_static::lazy_static;
use regex::Regex;
use std::{collections::HashMap, fmt::Display};

use crate::Position;

/// Identifier that discards the value bound to it.
pub const IGNORE_ID: &str = "_";
/// Identifier given to declarations without a name.
pub const ANONYMOUS_ID: &str = "<anonymous>";

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("i8", TokenKind::DataType);
        map.insert("i16", TokenKind::DataType);
        map.insert("i32", TokenKind::DataType);
        map.insert("i64", TokenKind::DataType);
        map.insert("u8", TokenKind::DataType);
        map.insert("u16", TokenKind::DataType);
        map.insert("u32", TokenKind::DataType);
        map.insert("u64", TokenKind::DataType);
        map.insert("f32", TokenKind::DataType);
        map.insert("f64", TokenKind::DataType);
        map.insert("int", TokenKind::DataType);
        map.insert("uint", TokenKind::DataType);
        map.insert("uintptr", TokenKind::DataType);
        map.insert("bool", TokenKind::DataType);
        map.insert("str", TokenKind::DataType);
        map.insert("any", TokenKind::DataType);
        map.insert("true", TokenKind::Literal);
        map.insert("false", TokenKind::Literal);
        map.insert("nil", TokenKind::Literal);
        map.insert("const", TokenKind::Const);
        map.insert("ret", TokenKind::Return);
        map.insert("type", TokenKind::Type);
        map.insert("for", TokenKind::For);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("in", TokenKind::In);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("use", TokenKind::Use);
        map.insert("pub", TokenKind::Pub);
        map.insert("goto", TokenKind::Goto);
        map.insert("enum", TokenKind::Enum);
        map.insert("struct", TokenKind::Struct);
        map.insert("co", TokenKind::Co);
        map.insert("match", TokenKind::Match);
        map.insert("self", TokenKind::SelfKw);
        map.insert("trait", TokenKind::Trait);
        map.insert("impl", TokenKind::Impl);
        map.insert("cpp", TokenKind::Cpp);
        map.insert("fall", TokenKind::Fall);
        map.insert("fn", TokenKind::Fn);
        map.insert("let", TokenKind::Let);
        map.insert("unsafe", TokenKind::Unsafe);
        map.insert("mut", TokenKind::Mut);
        map.insert("defer", TokenKind::Defer);
        map
    };

    static ref FLOAT_LITERAL: Regex =
        Regex::new(r"^[0-9][0-9_]*(\.[0-9_]+)?([eE][-+]?[0-9]+)?$").unwrap();
    static ref INT_LITERAL: Regex =
        Regex::new(r"^(0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[0-7_]*|[1-9][0-9_]*)$").unwrap();
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    DataType,
    Identifier,
    Brace,
    Return,
    Semicolon,
    Literal,
    Operator,
    Comma,
    Const,
    Type,
    Colon,
    For,
    Break,
    Continue,
    In,
    If,
    Else,
    Comment,
    Use,
    Dot,
    Pub,
    Goto,
    DoubleColon,
    Enum,
    Struct,
    Co,
    Match,
    SelfKw,
    Trait,
    Impl,
    Cpp,
    Fall,
    Fn,
    Let,
    Unsafe,
    Mut,
    Defer,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Classification of a literal token's text.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LiteralClass {
    Str,
    Rune,
    Nil,
    Bool,
    Float,
    Int,
}

pub fn classify_literal(text: &str) -> Option<LiteralClass> {
    if text.starts_with('"') || text.starts_with('`') {
        Some(LiteralClass::Str)
    } else if text.starts_with('\'') {
        Some(LiteralClass::Rune)
    } else if text == "nil" {
        Some(LiteralClass::Nil)
    } else if text == "true" || text == "false" {
        Some(LiteralClass::Bool)
    } else if INT_LITERAL.is_match(text) {
        Some(LiteralClass::Int)
    } else if FLOAT_LITERAL.is_match(text) {
        Some(LiteralClass::Float)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub position: Position,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Token {
    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }

    pub fn is_brace(&self, value: &str) -> bool {
        self.is(TokenKind::Brace, value)
    }

    pub fn is_op(&self, value: &str) -> bool {
        self.is(TokenKind::Operator, value)
    }

    pub fn is_open_brace(&self) -> bool {
        self.kind == TokenKind::Brace && matches!(self.value.as_str(), "(" | "[" | "{")
    }

    pub fn is_close_brace(&self) -> bool {
        self.kind == TokenKind::Brace && matches!(self.value.as_str(), ")" | "]" | "}")
    }

    pub fn is_ignore_id(&self) -> bool {
        self.kind == TokenKind::Identifier && self.value == IGNORE_ID
    }

    pub fn literal_class(&self) -> Option<LiteralClass> {
        if self.kind != TokenKind::Literal {
            return None;
        }
        classify_literal(&self.value)
    }

    pub fn row(&self) -> u32 {
        self.position.row
    }

    pub fn column(&self) -> u32 {
        self.position.column
    }
}

/// Running brace depth over `(`, `[` and `{`.
pub fn brace_delta(token: &Token) -> i32 {
    if token.is_open_brace() {
        1
    } else if token.is_close_brace() {
        -1
    } else {
        0
    }
}
