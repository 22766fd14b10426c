//! Bracket matching and separator-aware splitting over token runs.

use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{brace_delta, Token, TokenKind},
};

/// Extracts the interior of a balanced `open ... close` region.
///
/// The token at `i` must be `open`, otherwise `None` is returned and `i` is
/// left untouched. On success `i` points past the closing token. An
/// unterminated region yields everything up to the end of `tokens`.
pub fn extract_range<'a>(
    tokens: &'a [Token],
    i: &mut usize,
    open: &str,
    close: &str,
) -> Option<&'a [Token]> {
    let token = tokens.get(*i)?;
    if !token.is_brace(open) {
        return None;
    }

    *i += 1;
    let start = *i;
    let mut depth = 1;
    while *i < tokens.len() {
        let token = &tokens[*i];
        *i += 1;
        if token.is_brace(open) {
            depth += 1;
        } else if token.is_brace(close) {
            depth -= 1;
            if depth == 0 {
                return Some(&tokens[start..*i - 1]);
            }
        }
    }

    Some(&tokens[start..])
}

fn is_separator(token: &Token, separator: &str) -> bool {
    token.kind != TokenKind::Literal && token.value == separator
}

/// Splits `tokens` at every `separator` found at brace depth 0.
///
/// With `require_nonempty`, an empty slot between separators records a
/// `missing_expr` diagnostic and a trailing separator produces no trailing
/// part. Without it, a trailing separator yields a final empty part.
pub fn split_on<'a>(
    tokens: &'a [Token],
    separator: &str,
    require_nonempty: bool,
) -> (Vec<&'a [Token]>, Vec<Error>) {
    let mut parts = Vec::new();
    let mut errors = Vec::new();
    if tokens.is_empty() {
        return (parts, errors);
    }

    let mut depth = 0;
    let mut last = 0;
    for (i, token) in tokens.iter().enumerate() {
        depth += brace_delta(token);
        if depth > 0 {
            continue;
        }
        if is_separator(token, separator) {
            if require_nonempty && i == last {
                errors.push(Error::new(ErrorImpl::MissingExpr, token.position.clone()));
            }
            parts.push(&tokens[last..i]);
            last = i + 1;
        }
    }

    if last < tokens.len() {
        parts.push(&tokens[last..]);
    } else if !require_nonempty {
        parts.push(&tokens[tokens.len()..]);
    }

    (parts, errors)
}

/// Splits off a trailing bracketed group.
///
/// `a.b(c)` becomes `(a.b, (c))`. The second element is `None` when the run
/// does not end in a closing brace or the opener cannot be found.
pub fn range_last(tokens: &[Token]) -> (&[Token], Option<&[Token]>) {
    match tokens.last() {
        Some(last) if last.is_close_brace() => {}
        _ => return (tokens, None),
    }

    let mut depth = 0;
    for i in (0..tokens.len()).rev() {
        let token = &tokens[i];
        if token.is_close_brace() {
            depth += 1;
            continue;
        } else if token.is_open_brace() {
            depth -= 1;
        }
        if depth == 0 {
            return (&tokens[..i], Some(&tokens[i..]));
        }
    }

    (tokens, None)
}

/// Reads a `[ ... ]` region starting at `i` and locates its first depth-1 colon.
///
/// Returns the interior tokens and the colon's index inside them. `i` is left
/// on the closing bracket.
pub fn split_colon<'a>(tokens: &'a [Token], i: &mut usize) -> (Option<&'a [Token]>, Option<usize>) {
    let start = *i;
    let mut depth = 0;
    let mut colon = None;

    while *i < tokens.len() {
        let token = &tokens[*i];
        depth += brace_delta(token);
        if depth == 0 {
            if start + 1 > *i {
                return (None, colon);
            }
            return (Some(&tokens[start + 1..*i]), colon);
        } else if depth == 1 && colon.is_none() && token.kind == TokenKind::Colon {
            colon = Some(*i - start - 1);
        }
        *i += 1;
    }

    (None, colon)
}

/// Tokens before the first `{` at depth 0, or `None` when there is no block.
pub fn get_block_expr(tokens: &[Token]) -> Option<&[Token]> {
    let mut depth = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_brace("{") && depth == 0 {
            return Some(&tokens[..i]);
        }
        depth += brace_delta(token);
    }
    None
}

/// Index of the first token at depth 0 satisfying `predicate`.
pub fn find_top_level(tokens: &[Token], predicate: impl Fn(&Token) -> bool) -> Option<usize> {
    let mut depth = 0;
    for (i, token) in tokens.iter().enumerate() {
        if depth == 0 && predicate(token) {
            return Some(i);
        }
        depth += brace_delta(token);
    }
    None
}

/// Whether the run ends with a parenthesised argument list that follows a callee.
pub fn is_fn_call(tokens: &[Token]) -> bool {
    match range_last(tokens) {
        (callee, Some(args)) => !callee.is_empty() && args[0].is_brace("("),
        _ => false,
    }
}

/// First opener left unmatched at the end of the run.
pub fn unclosed_brace(tokens: &[Token]) -> Option<&Token> {
    let mut stack = Vec::new();
    for token in tokens {
        if token.is_open_brace() {
            stack.push(token);
        } else if token.is_close_brace() {
            stack.pop();
        }
    }
    stack.first().copied()
}
