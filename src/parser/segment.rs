//! Statement segmentation.
//!
//! Statements are not delimited by a grammar rule. They end at a semicolon,
//! or implicitly when the next token starts a new source row at brace depth 0.

use crate::lexer::tokens::{Token, TokenKind};

/// Whether `current` begins a new statement after `prev`, and whether it is a `;`.
fn is_statement_boundary(current: &Token, prev: &Token) -> (bool, bool) {
    let terminated = current.kind == TokenKind::Semicolon;
    (terminated || prev.row() < current.row(), terminated)
}

/// Finds the end of the statement that starts at `start`.
///
/// # Arguments
///
/// * `tokens` - The token run to scan
/// * `start` - Index of the first token of the statement
///
/// # Returns
///
/// The exclusive end index of the statement and whether a terminating
/// semicolon was consumed. The semicolon, when present, sits at `end - 1`.
pub fn next_statement(tokens: &[Token], start: usize) -> (usize, bool) {
    let mut depth = 0;
    let mut i = start;

    while i < tokens.len() {
        let token = &tokens[i];

        if token.is_open_brace() {
            if depth == 0 && i > start {
                let (ok, terminated) = is_statement_boundary(token, &tokens[i - 1]);
                if ok {
                    return finish(i, terminated);
                }
            }
            depth += 1;
            i += 1;
            continue;
        }

        if token.is_close_brace() {
            depth -= 1;
            if depth == 0 && i + 1 < tokens.len() {
                let (ok, terminated) = is_statement_boundary(&tokens[i + 1], token);
                if ok {
                    return finish(i + 1, terminated);
                }
            }
            i += 1;
            continue;
        }

        if depth != 0 {
            i += 1;
            continue;
        }

        let prev = if i > start { &tokens[i - 1] } else { token };
        let (ok, terminated) = is_statement_boundary(token, prev);
        if ok {
            return finish(i, terminated);
        }
        i += 1;
    }

    (tokens.len(), false)
}

fn finish(i: usize, terminated: bool) -> (usize, bool) {
    if terminated {
        (i + 1, true)
    } else {
        (i, false)
    }
}
