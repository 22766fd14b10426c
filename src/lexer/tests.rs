//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords, primitive names and identifiers
//! - Numeric, string and rune literals
//! - Operators and punctuation
//! - Comments
//! - Row and column tracking
//! - Error cases

use super::{
    lexer::tokenize,
    tokens::{classify_literal, LiteralClass, TokenKind},
};

fn lex(source: &str) -> Vec<super::tokens::Token> {
    tokenize(source.to_string(), Some("test.jn".to_string())).unwrap()
}

#[test]
fn test_tokenize_keywords() {
    let tokens = lex("let const fn if else for ret use pub struct enum trait impl cpp goto co match");

    assert_eq!(tokens[0].kind, TokenKind::Let);
    assert_eq!(tokens[1].kind, TokenKind::Const);
    assert_eq!(tokens[2].kind, TokenKind::Fn);
    assert_eq!(tokens[3].kind, TokenKind::If);
    assert_eq!(tokens[4].kind, TokenKind::Else);
    assert_eq!(tokens[5].kind, TokenKind::For);
    assert_eq!(tokens[6].kind, TokenKind::Return);
    assert_eq!(tokens[7].kind, TokenKind::Use);
    assert_eq!(tokens[8].kind, TokenKind::Pub);
    assert_eq!(tokens[9].kind, TokenKind::Struct);
    assert_eq!(tokens[10].kind, TokenKind::Enum);
    assert_eq!(tokens[11].kind, TokenKind::Trait);
    assert_eq!(tokens[12].kind, TokenKind::Impl);
    assert_eq!(tokens[13].kind, TokenKind::Cpp);
    assert_eq!(tokens[14].kind, TokenKind::Goto);
    assert_eq!(tokens[15].kind, TokenKind::Co);
    assert_eq!(tokens[16].kind, TokenKind::Match);
    assert_eq!(tokens.len(), 17);
}

#[test]
fn test_tokenize_identifiers_and_data_types() {
    let tokens = lex("foo i32 _ baz_123 uintptr self");

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[1].kind, TokenKind::DataType);
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert!(tokens[2].is_ignore_id());
    assert_eq!(tokens[3].kind, TokenKind::Identifier);
    assert_eq!(tokens[4].kind, TokenKind::DataType);
    assert_eq!(tokens[5].kind, TokenKind::SelfKw);
}

#[test]
fn test_tokenize_literals() {
    let tokens = lex(r#"42 3.14 0x1F 0b101 1e3 "hi\"there" 'a' `raw` true nil"#);

    assert!(tokens.iter().all(|t| t.kind == TokenKind::Literal));
    assert_eq!(tokens[0].literal_class(), Some(LiteralClass::Int));
    assert_eq!(tokens[1].literal_class(), Some(LiteralClass::Float));
    assert_eq!(tokens[2].literal_class(), Some(LiteralClass::Int));
    assert_eq!(tokens[3].literal_class(), Some(LiteralClass::Int));
    assert_eq!(tokens[4].literal_class(), Some(LiteralClass::Float));
    assert_eq!(tokens[5].value, r#""hi\"there""#);
    assert_eq!(tokens[5].literal_class(), Some(LiteralClass::Str));
    assert_eq!(tokens[6].literal_class(), Some(LiteralClass::Rune));
    assert_eq!(tokens[7].literal_class(), Some(LiteralClass::Str));
    assert_eq!(tokens[8].literal_class(), Some(LiteralClass::Bool));
    assert_eq!(tokens[9].literal_class(), Some(LiteralClass::Nil));
}

#[test]
fn test_classify_literal_rejects_garbage() {
    assert_eq!(classify_literal("abc"), None);
    assert_eq!(classify_literal("1.2.3"), None);
    assert_eq!(classify_literal("007"), Some(LiteralClass::Int));
}

#[test]
fn test_tokenize_operators_longest_first() {
    let tokens = lex("a <<= b >> c == d ... :: += ++ !x");
    let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();

    assert_eq!(
        values,
        vec!["a", "<<=", "b", ">>", "c", "==", "d", "...", "::", "+=", "++", "!", "x"]
    );
    assert_eq!(tokens[8].kind, TokenKind::DoubleColon);
    assert_eq!(tokens[1].kind, TokenKind::Operator);
}

#[test]
fn test_tokenize_punctuation() {
    let tokens = lex("( ) [ ] { } , : ; .");

    for token in &tokens[..6] {
        assert_eq!(token.kind, TokenKind::Brace);
    }
    assert_eq!(tokens[6].kind, TokenKind::Comma);
    assert_eq!(tokens[7].kind, TokenKind::Colon);
    assert_eq!(tokens[8].kind, TokenKind::Semicolon);
    assert_eq!(tokens[9].kind, TokenKind::Dot);
}

#[test]
fn test_tokenize_comments() {
    let tokens = lex("a // trailing\n/* block\ncomment */ b");

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[1].kind, TokenKind::Comment);
    assert_eq!(tokens[1].value, "// trailing");
    assert_eq!(tokens[2].kind, TokenKind::Comment);
    assert_eq!(tokens[3].value, "b");
    assert_eq!(tokens[3].row(), 3);
    assert_eq!(tokens[3].column(), 12);
}

#[test]
fn test_positions_track_rows_and_columns() {
    let tokens = lex("fn main() {\n    x := 1\n}");

    assert_eq!((tokens[0].row(), tokens[0].column()), (1, 1));
    assert_eq!((tokens[1].row(), tokens[1].column()), (1, 4));
    assert_eq!((tokens[5].row(), tokens[5].column()), (2, 5));
    assert_eq!((tokens[6].row(), tokens[6].column()), (2, 7));
    assert_eq!(tokens.last().unwrap().row(), 3);
    assert_eq!(tokens[0].position.file.as_str(), "test.jn");
}

#[test]
fn test_unrecognised_token() {
    let result = tokenize("let a = #".to_string(), Some("test.jn".to_string()));

    let error = result.unwrap_err();
    assert_eq!(error.get_error_name(), "unrecognised_token");
    assert_eq!(error.get_position().column, 9);
}

#[test]
fn test_unterminated_block_comment() {
    let result = tokenize("a /* never closed".to_string(), None);

    let error = result.unwrap_err();
    assert_eq!(error.get_error_name(), "missing_block_comment");
}

#[test]
fn test_empty_source_has_no_tokens() {
    assert!(lex("").is_empty());
    assert!(lex("  \n\t ").is_empty());
}
