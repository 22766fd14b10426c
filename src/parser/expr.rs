//! Expression parsing.
//!
//! A token run is split at its lowest-precedence binary operator found at
//! brace depth 0, and both halves are parsed recursively. Ties go to the
//! rightmost operator, so chains of equal precedence associate to the left.
//! A run without such an operator is an operand: a literal, an identifier,
//! a unary expression, or a postfix chain of calls, indexes and selectors.

use crate::{
    ast::{
        expressions::{Expr, ExprKind},
        types::Type,
    },
    errors::errors::ErrorImpl,
    lexer::tokens::{brace_delta, Token, TokenKind},
    Position,
};

use super::{
    lookups::{Precedence, PRECEDENCE_LOOKUP},
    parser::Parser,
    parts::{extract_range, find_top_level, range_last, split_on},
    types::{parse_type, parse_whole_type},
};

const UNARY_OPS: [&str; 7] = ["-", "+", "!", "^", "*", "&", "&&"];

fn position_of(tokens: &[Token]) -> Position {
    tokens
        .first()
        .map(|t| t.position.clone())
        .unwrap_or_else(Position::null)
}

/// Parses a token run into an expression tree.
///
/// Comment tokens are dropped first. An empty run yields an invalid
/// expression; callers report it where they know the position.
pub fn parse_expr(parser: &mut Parser, tokens: &[Token]) -> Expr {
    let tokens: Vec<Token> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .cloned()
        .collect();

    if tokens.is_empty() {
        return Expr::invalid(Position::null());
    }
    build_expr(parser, &tokens)
}

fn build_expr(parser: &mut Parser, tokens: &[Token]) -> Expr {
    let Some(split) = find_split_operator(tokens) else {
        return parse_operand(parser, tokens);
    };

    let op = &tokens[split];
    let left = &tokens[..split];
    let right = &tokens[split + 1..];
    if right.is_empty() {
        parser.push_error(ErrorImpl::MissingExpr, op);
        return Expr::invalid(op.position.clone());
    }

    let left = build_expr(parser, left);
    let right = build_expr(parser, right);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op: op.value.clone(),
            right: Box::new(right),
        },
        op.position.clone(),
    )
}

/// Index of the operator the run splits at, if it has a top-level binary operator.
///
/// Operators at index 0, inside braces, or right after another operator are
/// unary and never split.
pub fn find_split_operator(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0;
    let mut lowest: Option<(Precedence, usize)> = None;

    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Brace {
            depth += brace_delta(token);
            continue;
        }
        if i == 0 || token.kind != TokenKind::Operator || depth > 0 {
            continue;
        }
        if tokens[i - 1].kind == TokenKind::Operator {
            continue;
        }
        let Some(precedence) = PRECEDENCE_LOOKUP.get(token.value.as_str()).copied() else {
            continue;
        };
        match lowest {
            Some((current, _)) if precedence > current => {}
            _ => lowest = Some((precedence, i)),
        }
    }

    lowest.map(|(_, i)| i)
}

fn parse_operand(parser: &mut Parser, tokens: &[Token]) -> Expr {
    let first = &tokens[0];

    if tokens.len() == 1 {
        return parse_single(parser, first);
    }

    if first.kind == TokenKind::Operator && UNARY_OPS.contains(&first.value.as_str()) {
        let operand = parse_operand(parser, &tokens[1..]);
        let operand = if first.value == "&&" {
            Expr::new(
                ExprKind::Unary {
                    op: String::from("&"),
                    operand: Box::new(operand),
                },
                first.position.clone(),
            )
        } else {
            operand
        };
        let op = if first.value == "&&" { "&" } else { first.value.as_str() };
        return Expr::new(
            ExprKind::Unary {
                op: String::from(op),
                operand: Box::new(operand),
            },
            first.position.clone(),
        );
    }

    if first.is_brace("(") {
        if let Some(expr) = parse_paren_or_cast(parser, tokens) {
            return expr;
        }
    }

    if first.is_brace("[") {
        if let Some(expr) = parse_bracket_literal(parser, tokens) {
            return expr;
        }
    }

    let last = &tokens[tokens.len() - 1];

    // a.b and a::b
    if last.kind == TokenKind::Identifier && tokens.len() >= 3 {
        let sep = &tokens[tokens.len() - 2];
        if sep.kind == TokenKind::Dot || sep.kind == TokenKind::DoubleColon {
            let target = parse_operand(parser, &tokens[..tokens.len() - 2]);
            return Expr::new(
                ExprKind::Selector {
                    target: Box::new(target),
                    member: last.value.clone(),
                    namespace: sep.kind == TokenKind::DoubleColon,
                },
                sep.position.clone(),
            );
        }
    }

    if let (before, Some(group)) = range_last(tokens) {
        if !before.is_empty() {
            let interior = &group[1..group.len() - 1];
            match group[0].value.as_str() {
                "(" => return parse_call(parser, before, &group[0], interior),
                "[" => return parse_index(parser, before, &group[0], interior),
                "{" => return parse_braced_literal(parser, before, &group[0], interior),
                _ => {}
            }
        }
    }

    parser.push_error(ErrorImpl::InvalidSyntax, &tokens[1]);
    Expr::invalid(first.position.clone())
}

fn parse_single(parser: &mut Parser, token: &Token) -> Expr {
    let kind = match token.kind {
        TokenKind::Literal => match token.literal_class() {
            Some(class) => ExprKind::Literal {
                value: token.value.clone(),
                class,
            },
            None => {
                parser.push_error(ErrorImpl::InvalidSyntax, token);
                ExprKind::Invalid
            }
        },
        TokenKind::Identifier | TokenKind::DataType => ExprKind::Ident(token.value.clone()),
        TokenKind::SelfKw => ExprKind::SelfRef,
        _ => {
            parser.push_error(ErrorImpl::InvalidSyntax, token);
            ExprKind::Invalid
        }
    };
    Expr::new(kind, token.position.clone())
}

/// `(expr)` or `(T)(expr)`. Returns `None` when the run is a postfix chain
/// that merely starts with a parenthesised group.
///
/// `(name)(x)` is kept as a cast; the checker turns it into a call when
/// `name` is a value.
fn parse_paren_or_cast(parser: &mut Parser, tokens: &[Token]) -> Option<Expr> {
    let mut i = 0;
    let inner = extract_range(tokens, &mut i, "(", ")")?;

    if i == tokens.len() {
        if inner.is_empty() {
            parser.push_error(ErrorImpl::MissingExpr, &tokens[0]);
            return Some(Expr::invalid(tokens[0].position.clone()));
        }
        let expr = parse_expr(parser, inner);
        return Some(Expr::new(
            ExprKind::Paren(Box::new(expr)),
            tokens[0].position.clone(),
        ));
    }

    let mut j = i;
    let value = extract_range(tokens, &mut j, "(", ")")?;
    if j != tokens.len() {
        return None;
    }
    // `(f)()` and `(f)(a, b)` can only be calls.
    let bare_name = inner.len() == 1 && inner[0].kind == TokenKind::Identifier;
    if bare_name && (value.is_empty() || find_top_level(value, |t| t.kind == TokenKind::Comma).is_some()) {
        return None;
    }
    let ty = parse_whole_type(parser, inner, true, false)?;
    if value.is_empty() {
        parser.push_error(ErrorImpl::MissingExpr, &tokens[i]);
    }
    let expr = parse_expr(parser, value);
    Some(Expr::new(
        ExprKind::Cast {
            ty,
            expr: Box::new(expr),
        },
        tokens[0].position.clone(),
    ))
}

/// `[a, b]`, `[]T{...}`, `[N]T{...}` and `[K:V]{...}`.
fn parse_bracket_literal(parser: &mut Parser, tokens: &[Token]) -> Option<Expr> {
    let mut i = 0;
    let inner = extract_range(tokens, &mut i, "[", "]")?;
    if i == tokens.len() {
        let elements = parse_args(parser, inner);
        return Some(Expr::new(
            ExprKind::Composite { ty: None, elements },
            tokens[0].position.clone(),
        ));
    }

    let (before, group) = range_last(tokens);
    let group = group?;
    if !group[0].is_brace("{") {
        return None;
    }
    let interior = &group[1..group.len() - 1];
    Some(parse_braced_literal(parser, before, &group[0], interior))
}

fn parse_braced_literal(
    parser: &mut Parser,
    before: &[Token],
    open: &Token,
    interior: &[Token],
) -> Expr {
    let Some(ty) = parse_whole_type(parser, before, true, true) else {
        return Expr::invalid(open.position.clone());
    };
    let position = position_of(before);

    if ty.is_map() {
        let (parts, errors) = split_on(interior, ",", false);
        parser.extend_errors(errors);
        let mut pairs = Vec::new();
        for part in parts.into_iter().filter(|p| !p.is_empty()) {
            match find_top_level(part, |t| t.kind == TokenKind::Colon) {
                Some(colon) if colon > 0 && colon + 1 < part.len() => {
                    let key = parse_expr(parser, &part[..colon]);
                    let value = parse_expr(parser, &part[colon + 1..]);
                    pairs.push((key, value));
                }
                _ => parser.push_error(ErrorImpl::MissingExpr, &part[0]),
            }
        }
        return Expr::new(ExprKind::MapLiteral { ty, pairs }, position);
    }

    let elements = parse_args(parser, interior);
    if ty.is_slice() || ty.is_array() {
        return Expr::new(
            ExprKind::Composite {
                ty: Some(ty),
                elements,
            },
            position,
        );
    }
    Expr::new(ExprKind::StructLit { ty, args: elements }, position)
}

fn parse_call(parser: &mut Parser, before: &[Token], open: &Token, interior: &[Token]) -> Expr {
    let mut callee_tokens = before;
    let mut generics: Vec<Type> = Vec::new();

    // f[T1, T2](...)
    if let (callee, Some(group)) = range_last(before) {
        if !callee.is_empty() && group[0].is_brace("[") {
            let inner = &group[1..group.len() - 1];
            if let Some(types) = parse_generic_args(parser, inner) {
                callee_tokens = callee;
                generics = types;
            }
        }
    }

    let callee = parse_operand(parser, callee_tokens);
    let args = parse_args(parser, interior);
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            generics,
            args,
        },
        open.position.clone(),
    )
}

fn parse_generic_args(parser: &mut Parser, tokens: &[Token]) -> Option<Vec<Type>> {
    if tokens.is_empty() {
        return None;
    }
    let (parts, errors) = split_on(tokens, ",", true);
    if !errors.is_empty() {
        return None;
    }
    let mut types = Vec::new();
    for part in parts {
        let mut i = 0;
        let (ty, ok) = parse_type(parser, part, &mut i, true, false);
        if !ok || i != part.len() {
            return None;
        }
        types.push(ty);
    }
    Some(types)
}

fn parse_index(parser: &mut Parser, before: &[Token], open: &Token, interior: &[Token]) -> Expr {
    let target = parse_operand(parser, before);

    if let Some(colon) = find_top_level(interior, |t| t.kind == TokenKind::Colon) {
        let start = &interior[..colon];
        let end = &interior[colon + 1..];
        let start = (!start.is_empty()).then(|| Box::new(parse_expr(parser, start)));
        let end = (!end.is_empty()).then(|| Box::new(parse_expr(parser, end)));
        return Expr::new(
            ExprKind::Slicing {
                target: Box::new(target),
                start,
                end,
            },
            open.position.clone(),
        );
    }

    if interior.is_empty() {
        parser.push_error(ErrorImpl::MissingExpr, open);
        return Expr::invalid(open.position.clone());
    }
    let index = parse_expr(parser, interior);
    Expr::new(
        ExprKind::Index {
            target: Box::new(target),
            index: Box::new(index),
        },
        open.position.clone(),
    )
}

/// Parses a comma separated expression list.
pub fn parse_args(parser: &mut Parser, tokens: &[Token]) -> Vec<Expr> {
    let (parts, errors) = split_on(tokens, ",", true);
    parser.extend_errors(errors);
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(|part| parse_expr(parser, part))
        .collect()
}
