//! Type parsing implementation.
//!
//! This module turns a run of tokens into a [`Type`] descriptor. It supports:
//!
//! - Primitive types and named types with generic arguments
//! - Pointer and reference sigils (`*T`, `&T`, `*unsafe`)
//! - Slices, sized and auto-sized arrays, and maps
//! - Function types with parameter lists and single or multiple returns
//!
//! Parameter lists are parsed here as well, since function types and
//! function declarations share them.

use crate::{
    ast::types::{primitive_category, ArraySize, FnSig, Param, Type},
    errors::errors::ErrorImpl,
    lexer::tokens::{Token, TokenKind, ANONYMOUS_ID},
};

use super::{
    expr::parse_expr,
    parser::Parser,
    parts::{extract_range, split_colon, split_on},
};

/// Parses a type starting at `i`.
///
/// # Arguments
///
/// * `parser` - The parser that collects diagnostics
/// * `tokens` - Token run containing the type
/// * `i` - Index of the first token of the type, moved past the type on success
/// * `allow_arrays` - Whether `[N]T` and `[...]T` are accepted
/// * `error_on_fail` - Whether a failure is reported as a diagnostic
///
/// # Returns
///
/// The parsed type and `true`, or the void type and `false`.
pub fn parse_type(
    parser: &mut Parser,
    tokens: &[Token],
    i: &mut usize,
    allow_arrays: bool,
    error_on_fail: bool,
) -> (Type, bool) {
    let mut prefix = String::new();

    while *i < tokens.len() {
        let token = &tokens[*i];
        match token.kind {
            TokenKind::DataType => {
                *i += 1;
                return match primitive_category(&token.value, parser.config()) {
                    Some(category) => (
                        Type::primitive(&token.value, category, token.position.clone())
                            .with_prefix(&prefix),
                        true,
                    ),
                    None => fail(parser, tokens, *i - 1, error_on_fail),
                };
            }
            TokenKind::Identifier => {
                return parse_named_type(parser, tokens, i, &prefix, error_on_fail);
            }
            TokenKind::Cpp => {
                let linked = tokens.get(*i + 1).is_some_and(|t| t.kind == TokenKind::Dot)
                    && tokens
                        .get(*i + 2)
                        .is_some_and(|t| t.kind == TokenKind::Identifier);
                if !linked {
                    return fail(parser, tokens, *i, error_on_fail);
                }
                let ident = &tokens[*i + 2];
                *i += 3;
                let mut ty = Type::named(&ident.value, Vec::new(), ident.position.clone());
                ty.cpp_linked = true;
                return (ty.with_prefix(&prefix), true);
            }
            TokenKind::Unsafe => {
                if tokens.get(*i + 1).is_some_and(|t| t.kind == TokenKind::Fn) {
                    return parse_fn_type(parser, tokens, i, &prefix, error_on_fail);
                }
                *i += 1;
                return (Type::unsafe_ptr(token.position.clone()).with_prefix(&prefix), true);
            }
            TokenKind::Fn => {
                return parse_fn_type(parser, tokens, i, &prefix, error_on_fail);
            }
            TokenKind::Operator if matches!(token.value.as_str(), "*" | "&" | "&&") => {
                prefix.push_str(&token.value);
                *i += 1;
            }
            TokenKind::Brace if token.value == "[" => {
                return parse_bracket_type(parser, tokens, i, &prefix, allow_arrays, error_on_fail);
            }
            _ => break,
        }
    }

    let at = (*i).min(tokens.len().saturating_sub(1));
    fail(parser, tokens, at, error_on_fail)
}

/// Parses `tokens` as exactly one type.
pub fn parse_whole_type(
    parser: &mut Parser,
    tokens: &[Token],
    allow_arrays: bool,
    error_on_fail: bool,
) -> Option<Type> {
    let mut i = 0;
    let (ty, ok) = parse_type(parser, tokens, &mut i, allow_arrays, error_on_fail);
    if !ok {
        return None;
    }
    if i < tokens.len() {
        if error_on_fail {
            parser.push_error(ErrorImpl::InvalidSyntax, &tokens[i]);
        }
        return None;
    }
    Some(ty)
}

fn fail(parser: &mut Parser, tokens: &[Token], at: usize, error_on_fail: bool) -> (Type, bool) {
    if error_on_fail {
        match tokens.get(at) {
            Some(token) => parser.push_error(ErrorImpl::InvalidSyntax, token),
            None => {
                let position = tokens
                    .last()
                    .map(|t| t.position.clone())
                    .unwrap_or_else(crate::Position::null);
                parser.push_error_at(ErrorImpl::MissingType, position);
            }
        }
    }
    (Type::void(), false)
}

fn parse_named_type(
    parser: &mut Parser,
    tokens: &[Token],
    i: &mut usize,
    prefix: &str,
    error_on_fail: bool,
) -> (Type, bool) {
    let first = &tokens[*i];
    let mut ident = first.value.clone();
    *i += 1;

    while tokens.get(*i).is_some_and(|t| t.kind == TokenKind::DoubleColon)
        && tokens
            .get(*i + 1)
            .is_some_and(|t| t.kind == TokenKind::Identifier)
    {
        ident.push_str("::");
        ident.push_str(&tokens[*i + 1].value);
        *i += 2;
    }

    let mut generics = Vec::new();
    if tokens.get(*i).is_some_and(|t| t.is_brace("[")) {
        let open = *i;
        let range = extract_range(tokens, i, "[", "]").unwrap_or_default();
        let (parts, errors) = split_on(range, ",", true);
        if error_on_fail {
            parser.extend_errors(errors);
        }
        if parts.is_empty() {
            return fail(parser, tokens, open, error_on_fail);
        }
        for part in parts {
            match parse_whole_type(parser, part, true, error_on_fail) {
                Some(ty) => generics.push(ty),
                None => return (Type::void(), false),
            }
        }
    }

    (
        Type::named(&ident, generics, first.position.clone()).with_prefix(prefix),
        true,
    )
}

fn parse_bracket_type(
    parser: &mut Parser,
    tokens: &[Token],
    i: &mut usize,
    prefix: &str,
    allow_arrays: bool,
    error_on_fail: bool,
) -> (Type, bool) {
    let open = &tokens[*i];

    // []T
    if tokens.get(*i + 1).is_some_and(|t| t.is_brace("]")) {
        *i += 2;
        if *i >= tokens.len() {
            return fail(parser, tokens, *i - 1, error_on_fail);
        }
        let (component, ok) = parse_type(parser, tokens, i, allow_arrays, error_on_fail);
        if !ok {
            return (Type::void(), false);
        }
        return (Type::slice(component, open.position.clone()).with_prefix(prefix), true);
    }

    // [K:V]
    let mut end = *i;
    if let (Some(range), Some(colon)) = split_colon(tokens, &mut end) {
        if colon == 0 || colon + 1 == range.len() {
            if error_on_fail {
                parser.push_error(ErrorImpl::MissingExpr, &range[colon]);
            }
            return (Type::void(), false);
        }
        let key = parse_whole_type(parser, &range[..colon], true, error_on_fail);
        let value = parse_whole_type(parser, &range[colon + 1..], true, error_on_fail);
        return match (key, value) {
            (Some(key), Some(value)) => {
                *i = end + 1;
                (Type::map(key, value, open.position.clone()).with_prefix(prefix), true)
            }
            _ => (Type::void(), false),
        };
    }

    // [N]T and [...]T
    if !allow_arrays {
        return fail(parser, tokens, *i, error_on_fail);
    }
    let range = extract_range(tokens, i, "[", "]").unwrap_or_default();
    let size = if range.len() == 1 && range[0].is_op("...") {
        ArraySize::Auto
    } else {
        ArraySize::Expr(Box::new(parse_expr(parser, range)))
    };
    if *i >= tokens.len() {
        return fail(parser, tokens, *i - 1, error_on_fail);
    }
    let (component, ok) = parse_type(parser, tokens, i, allow_arrays, error_on_fail);
    if !ok {
        return (Type::void(), false);
    }
    (
        Type::array(component, size, open.position.clone()).with_prefix(prefix),
        true,
    )
}

fn parse_fn_type(
    parser: &mut Parser,
    tokens: &[Token],
    i: &mut usize,
    prefix: &str,
    error_on_fail: bool,
) -> (Type, bool) {
    let start = &tokens[*i];
    let is_unsafe = start.kind == TokenKind::Unsafe;
    if is_unsafe {
        *i += 1;
    }
    *i += 1;

    let params = match extract_range(tokens, i, "(", ")") {
        Some(range) => range,
        None => return fail(parser, tokens, *i, error_on_fail),
    };
    let (params, _) = parse_params(parser, params, false);
    let ret = parse_fn_return(parser, tokens, i);

    let sig = FnSig {
        params,
        ret,
        is_unsafe,
    };
    (Type::func(sig, start.position.clone()).with_prefix(prefix), true)
}

/// Parses an optional `: T` or `: (T1, T2)` return clause at `i`.
pub fn parse_fn_return(parser: &mut Parser, tokens: &[Token], i: &mut usize) -> Type {
    if !tokens.get(*i).is_some_and(|t| t.kind == TokenKind::Colon) {
        return Type::void();
    }
    let colon = &tokens[*i];
    *i += 1;

    if tokens.get(*i).is_some_and(|t| t.is_brace("(")) {
        let range = extract_range(tokens, i, "(", ")").unwrap_or_default();
        let (parts, errors) = split_on(range, ",", true);
        parser.extend_errors(errors);
        if parts.is_empty() {
            parser.push_error(ErrorImpl::MissingType, colon);
            return Type::void();
        }
        let mut types = Vec::new();
        for part in parts {
            if let Some(ty) = parse_whole_type(parser, part, true, true) {
                types.push(ty);
            }
        }
        return Type::multi(types, colon.position.clone());
    }

    if *i >= tokens.len() || tokens[*i].is_brace("{") {
        parser.push_error(ErrorImpl::MissingType, colon);
        return Type::void();
    }
    let (ty, ok) = parse_type(parser, tokens, i, true, true);
    if ok {
        ty
    } else {
        Type::void()
    }
}

/// Parses a comma separated parameter list.
///
/// A method's first parameter may be a `[mut] [&] self` receiver, which is
/// returned separately. Untyped identifiers take the type of the next typed
/// parameter; when no typed parameter follows, the identifier itself is the
/// type of an anonymous parameter.
pub fn parse_params(
    parser: &mut Parser,
    tokens: &[Token],
    method: bool,
) -> (Vec<Param>, Option<Param>) {
    let (parts, errors) = split_on(tokens, ",", true);
    parser.extend_errors(errors);

    let mut params = Vec::new();
    let mut receiver = None;
    for (idx, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if method && idx == 0 && part.iter().any(|t| t.kind == TokenKind::SelfKw) {
            receiver = parse_receiver(parser, part);
            continue;
        }
        params.push(parse_param(parser, part));
    }

    let last = params.len().saturating_sub(1);
    for (idx, param) in params.iter().enumerate() {
        if param.variadic && idx != last {
            parser.push_error_at(ErrorImpl::VariadicNotLast, param.position.clone());
        }
    }

    let mut next_ty: Option<Type> = None;
    for param in params.iter_mut().rev() {
        match &param.ty {
            Some(ty) => next_ty = Some(ty.clone()),
            None if param.id != ANONYMOUS_ID => match &next_ty {
                Some(ty) => param.ty = Some(ty.clone()),
                None => {
                    param.ty = Some(Type::named(&param.id, Vec::new(), param.position.clone()));
                    param.id = String::from(ANONYMOUS_ID);
                }
            },
            None => {}
        }
    }

    (params, receiver)
}

fn parse_receiver(parser: &mut Parser, part: &[Token]) -> Option<Param> {
    let mut param = Param::new(String::from("self"), part[0].position.clone());
    let mut i = 0;
    if part[i].kind == TokenKind::Mut {
        param.mutable = true;
        i += 1;
    }
    if part.get(i).is_some_and(|t| t.is_op("&")) {
        param.reference = true;
        i += 1;
    }
    if !part.get(i).is_some_and(|t| t.kind == TokenKind::SelfKw) || i + 1 != part.len() {
        parser.push_error(ErrorImpl::InvalidSyntax, &part[i.min(part.len() - 1)]);
        return None;
    }
    Some(param)
}

fn parse_param(parser: &mut Parser, part: &[Token]) -> Param {
    let mut param = Param::new(String::from(ANONYMOUS_ID), part[0].position.clone());
    let mut i = 0;
    if part[0].kind == TokenKind::Mut {
        param.mutable = true;
        i += 1;
    }
    let Some(token) = part.get(i) else {
        parser.push_error(ErrorImpl::InvalidSyntax, &part[0]);
        return param;
    };

    if token.kind == TokenKind::Identifier {
        if i + 1 == part.len() {
            param.id = token.value.clone();
            return param;
        }
        if part[i + 1].kind == TokenKind::Colon {
            param.id = token.value.clone();
            i += 2;
            if i >= part.len() {
                parser.push_error(ErrorImpl::MissingType, &part[i - 1]);
                return param;
            }
        }
    }

    if part[i].is_op("...") {
        param.variadic = true;
        i += 1;
        if part.get(i).is_some_and(|t| t.is_op("...")) {
            parser.push_error(ErrorImpl::AlreadyVariadic, &part[i]);
            i += 1;
        }
    }

    if i >= part.len() {
        parser.push_error(ErrorImpl::MissingType, &part[part.len() - 1]);
        return param;
    }
    if let Some(ty) = parse_whole_type(parser, &part[i..], true, true) {
        param.ty = Some(ty);
    }
    param
}
