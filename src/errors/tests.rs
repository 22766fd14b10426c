//! Unit tests for error handling.
//!
//! This module contains tests for error types and the diagnostics list.

use crate::errors::errors::{Diagnostics, Error, ErrorImpl, ErrorTip, Severity};
use crate::{display_error, Position};
use std::rc::Rc;

fn pos(row: u32, column: u32) -> Position {
    Position::new(row, column, Rc::new("test.jn".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        pos(1, 10),
    );

    assert_eq!(error.get_error_name(), "unrecognised_token");
    assert_eq!(error.args(), vec!["@".to_string()]);
    assert_eq!(error.get_severity(), Severity::Error);
}

#[test]
fn test_error_position() {
    let error = Error::new(ErrorImpl::InvalidSyntax, pos(4, 2));

    assert_eq!(error.get_position().row, 4);
    assert_eq!(error.get_position().column, 2);
    assert_eq!(error.get_position().file.as_str(), "test.jn");
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::IncompatibleTypes {
            expected: "i32".to_string(),
            received: "str".to_string(),
        },
        pos(1, 1),
    );

    assert_eq!(error.get_error_name(), "incompatible_types");
    assert_eq!(error.args(), vec!["i32".to_string(), "str".to_string()]);
}

#[test]
fn test_id_not_exist_error() {
    let error = Error::new(
        ErrorImpl::IdNotExist {
            id: "foo".to_string(),
        },
        pos(1, 1),
    );

    assert_eq!(error.get_error_name(), "id_not_exist");
}

#[test]
fn test_argument_count_errors() {
    let overflow = Error::new(
        ErrorImpl::UnexpectedArguments {
            expected: 2,
            received: 3,
        },
        pos(1, 1),
    );
    let missing = Error::new(
        ErrorImpl::MissingArguments {
            expected: 3,
            received: 1,
        },
        pos(1, 1),
    );

    assert_eq!(overflow.get_error_name(), "argument_overflow");
    assert_eq!(missing.get_error_name(), "missing_argument");
    assert_eq!(missing.args(), vec!["3".to_string(), "1".to_string()]);
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        pos(1, 1),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::ExistId {
            id: "x".to_string(),
        },
        pos(1, 1),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains("`x`")),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_error_display_includes_location() {
    let error = Error::new(ErrorImpl::DivideByZero, pos(3, 7));
    assert_eq!(error.to_string(), "test.jn:3:7: division by zero");
}

#[test]
fn test_diagnostics_accumulate_in_order() {
    let mut diagnostics = Diagnostics::new();
    assert!(diagnostics.is_empty());

    diagnostics.push_error(ErrorImpl::MissingExpr, pos(1, 1));
    diagnostics.push_warning(
        ErrorImpl::DuplicateUse {
            path: "std::io".to_string(),
        },
        pos(2, 1),
    );
    diagnostics.push_error(ErrorImpl::InvalidSyntax, pos(3, 1));

    assert_eq!(diagnostics.len(), 3);
    assert_eq!(
        diagnostics.keys(),
        vec!["missing_expr", "duplicate_use", "invalid_syntax"]
    );
    assert!(diagnostics.contains("duplicate_use"));
    assert!(diagnostics.has_errors());
}

#[test]
fn test_warnings_only_is_not_error() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.push_warning(
        ErrorImpl::DuplicateUse {
            path: "std::io".to_string(),
        },
        pos(1, 1),
    );

    assert!(!diagnostics.is_empty());
    assert!(!diagnostics.has_errors());
}

#[test]
fn test_display_error_renders_caret() {
    let source = "fn main() {\n    let a = #\n}\n";
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "#".to_string(),
        },
        pos(2, 13),
    );

    let rendered = display_error(&error, source);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "Error: unrecognised_token");
    assert_eq!(lines[1], "-> test.jn:2:13");
    assert_eq!(lines[3], "2 | let a = #");
    assert_eq!(lines[2], "  |");
    assert_eq!(lines[4], "  | --------^");
}
