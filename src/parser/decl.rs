//! Declaration parsing.
//!
//! Handlers in this module are registered for the leading token of a
//! top-level statement. Each one consumes the pending `pub` modifier when
//! its declaration supports visibility, and pushes the result into the
//! declaration arena.

use crate::{
    ast::{
        ast::{
            Decl, EnumDecl, EnumItem, FnDecl, ForeignLink, GenericParam, ImplDecl, LinkItem,
            StructDecl, TraitDecl, TypeAlias, UseDecl,
        },
        statements::Var,
        types::{primitive_category, Type, TypeCategory},
    },
    errors::errors::ErrorImpl,
    lexer::tokens::{LiteralClass, Token, TokenKind},
};

use super::{
    expr::parse_expr,
    parser::Parser,
    parts::{extract_range, split_on},
    stmt::{parse_block, strip_comments, BlockState},
    types::{parse_fn_return, parse_params, parse_type, parse_whole_type},
};

pub fn parse_comment_decl(parser: &mut Parser, tokens: &[Token]) {
    parser.push_comment(&tokens[0].value);
    if tokens.len() > 1 {
        parser.build_decl(&tokens[1..]);
    }
}

/// `use std::a::b`, `use std::a::{x, self}`, `use std::a::*` and `use cpp "h"`.
pub fn parse_use_decl(parser: &mut Parser, tokens: &[Token]) {
    let keyword = &tokens[0];
    let rest = &tokens[1..];
    if rest.is_empty() {
        parser.push_error(ErrorImpl::InvalidSyntax, keyword);
        return;
    }

    let mut decl = UseDecl {
        path: String::new(),
        selectors: Vec::new(),
        wildcard: false,
        cpp: false,
        position: keyword.position.clone(),
    };

    if rest[0].kind == TokenKind::Cpp {
        match rest.get(1) {
            Some(header) if rest.len() == 2 && header.literal_class() == Some(LiteralClass::Str) => {
                decl.cpp = true;
                decl.path = header.value.clone();
            }
            _ => {
                parser.push_error(ErrorImpl::InvalidSyntax, &rest[rest.len() - 1]);
                return;
            }
        }
    } else {
        if rest[0].kind != TokenKind::Identifier || rest[0].value != parser.config().std_root {
            parser.push_error(ErrorImpl::InvalidUsePath, &rest[0]);
            return;
        }

        let mut parts = vec![rest[0].value.clone()];
        let mut j = 1;
        while j < rest.len() {
            let separator = &rest[j];
            if separator.kind != TokenKind::DoubleColon && separator.kind != TokenKind::Dot {
                parser.push_error(ErrorImpl::InvalidSyntax, separator);
                return;
            }
            j += 1;
            let Some(next) = rest.get(j) else {
                parser.push_error(ErrorImpl::InvalidSyntax, separator);
                return;
            };

            if next.kind == TokenKind::Identifier {
                parts.push(next.value.clone());
                j += 1;
                continue;
            }

            if next.is_op("*") {
                decl.wildcard = true;
                j += 1;
            } else if next.is_brace("{") {
                let selectors = extract_range(rest, &mut j, "{", "}").unwrap_or_default();
                let (items, errors) = split_on(selectors, ",", true);
                parser.extend_errors(errors);
                if items.is_empty() {
                    parser.push_error(ErrorImpl::InvalidSyntax, next);
                    return;
                }
                for item in items.into_iter().filter(|item| !item.is_empty()) {
                    let valid = item.len() == 1
                        && matches!(item[0].kind, TokenKind::Identifier | TokenKind::SelfKw);
                    if !valid {
                        parser.push_error(ErrorImpl::InvalidSyntax, &item[0]);
                        return;
                    }
                    decl.selectors.push(item[0].value.clone());
                }
            } else {
                parser.push_error(ErrorImpl::InvalidSyntax, next);
                return;
            }

            if let Some(extra) = rest.get(j) {
                parser.push_error(ErrorImpl::InvalidSyntax, extra);
                return;
            }
        }
        decl.path = parts.join("::");
    }

    if !parser.uses.insert(decl.path.clone()) {
        parser.push_error(
            ErrorImpl::DuplicateUse {
                path: decl.path.clone(),
            },
            keyword,
        );
        return;
    }
    parser.ast.push_top(Decl::Use(decl));
}

/// Parses `[G1, G2]` at `i`.
fn parse_generic_params(parser: &mut Parser, tokens: &[Token], i: &mut usize) -> Option<Vec<GenericParam>> {
    if !tokens.get(*i).is_some_and(|t| t.is_brace("[")) {
        return Some(Vec::new());
    }
    let open = &tokens[*i];
    let range = extract_range(tokens, i, "[", "]").unwrap_or_default();
    let (parts, errors) = split_on(range, ",", true);
    parser.extend_errors(errors);
    if parts.is_empty() {
        parser.push_error(ErrorImpl::InvalidSyntax, open);
        return None;
    }

    let mut generics: Vec<GenericParam> = Vec::new();
    for part in parts.into_iter().filter(|part| !part.is_empty()) {
        if part.len() != 1 || part[0].kind != TokenKind::Identifier {
            parser.push_error(ErrorImpl::InvalidSyntax, &part[0]);
            return None;
        }
        if generics.iter().any(|g| g.id == part[0].value) {
            parser.push_error(
                ErrorImpl::ExistId {
                    id: part[0].value.clone(),
                },
                &part[0],
            );
            continue;
        }
        generics.push(GenericParam {
            id: part[0].value.clone(),
            position: part[0].position.clone(),
        });
    }
    Some(generics)
}

/// Parses `[unsafe] fn id[G](params)[: ret]` starting at `i`.
pub fn parse_fn_prototype(
    parser: &mut Parser,
    tokens: &[Token],
    i: &mut usize,
    method: bool,
) -> Option<FnDecl> {
    let start = &tokens[*i];
    let mut func = FnDecl::new(String::new(), start.position.clone());

    if start.kind == TokenKind::Unsafe {
        func.is_unsafe = true;
        *i += 1;
    }
    if !tokens.get(*i).is_some_and(|t| t.kind == TokenKind::Fn) {
        let at = (*i).min(tokens.len() - 1);
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[at]);
        return None;
    }
    *i += 1;

    match tokens.get(*i) {
        Some(ident) if ident.kind == TokenKind::Identifier => {
            func.id = ident.value.clone();
            func.position = ident.position.clone();
            *i += 1;
        }
        _ => {
            let at = (*i).min(tokens.len() - 1);
            parser.push_error(ErrorImpl::InvalidSyntax, &tokens[at]);
            return None;
        }
    }

    func.generics = parse_generic_params(parser, tokens, i)?;

    let Some(params) = extract_range(tokens, i, "(", ")") else {
        let at = (*i).min(tokens.len() - 1);
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[at]);
        return None;
    };
    let (params, receiver) = parse_params(parser, params, method);
    func.params = params;
    func.receiver = receiver;
    func.ret = parse_fn_return(parser, tokens, i);

    Some(func)
}

pub fn parse_fn_decl(parser: &mut Parser, tokens: &[Token]) {
    let is_pub = parser.take_public();
    let mut tokens = tokens.to_vec();
    let mut i = 0;
    let Some(mut func) = parse_fn_prototype(parser, &tokens, &mut i, false) else {
        return;
    };
    func.is_pub = is_pub;

    let keyword = tokens[0].clone();
    let Some(body) = parser.get_range(&mut i, &mut tokens) else {
        parser.push_error(ErrorImpl::BodyNotExist, &keyword);
        parser.stop();
        return;
    };
    if let Some(extra) = tokens.get(i) {
        parser.push_error(ErrorImpl::InvalidSyntax, extra);
    }

    func.body = Some(parse_block(parser, &body));
    parser.ast.push_top(Decl::Func(func));
}

/// Parses `let [mut] id [: T] [= expr]` or `const id [: T] = expr`.
///
/// `allow_uninit` permits a `let` without a value.
pub fn parse_var(parser: &mut Parser, tokens: &[Token], allow_uninit: bool) -> Option<Var> {
    let keyword = &tokens[0];
    let mut var = Var::new(String::new(), keyword.position.clone());
    let mut i = 1;

    match keyword.kind {
        TokenKind::Let => {
            if tokens.get(i).is_some_and(|t| t.kind == TokenKind::Mut) {
                var.mutable = true;
                i += 1;
            }
        }
        TokenKind::Const => {
            var.is_const = true;
            if tokens.get(i).is_some_and(|t| t.kind == TokenKind::Const) {
                parser.push_error(ErrorImpl::AlreadyConst, &tokens[i]);
                i += 1;
            }
        }
        _ => {
            parser.push_error(ErrorImpl::InvalidSyntax, keyword);
            return None;
        }
    }

    match tokens.get(i) {
        Some(ident) if ident.kind == TokenKind::Identifier => {
            var.id = ident.value.clone();
            var.position = ident.position.clone();
            i += 1;
        }
        _ => {
            let at = i.min(tokens.len() - 1);
            parser.push_error(ErrorImpl::InvalidSyntax, &tokens[at]);
            return None;
        }
    }

    if tokens.get(i).is_some_and(|t| t.kind == TokenKind::Colon) {
        let colon = &tokens[i];
        i += 1;
        if i >= tokens.len() || tokens[i].is_op("=") {
            parser.push_error(ErrorImpl::MissingType, colon);
            return None;
        }
        let (ty, ok) = parse_type(parser, tokens, &mut i, true, true);
        if !ok {
            return None;
        }
        var.ty = Some(ty);
    }

    if let Some(token) = tokens.get(i) {
        if !token.is_op("=") {
            parser.push_error(ErrorImpl::InvalidSyntax, token);
            return None;
        }
        let value = &tokens[i + 1..];
        if value.is_empty() {
            parser.push_error(ErrorImpl::MissingExpr, token);
            return None;
        }
        var.init = Some(parse_expr(parser, value));
    } else if var.is_const || (!allow_uninit && var.ty.is_none()) {
        parser.push_error(ErrorImpl::MissingExpr, &tokens[tokens.len() - 1]);
        return None;
    }

    Some(var)
}

pub fn parse_global_var_decl(parser: &mut Parser, tokens: &[Token]) {
    let is_pub = parser.take_public();
    if let Some(mut var) = parse_var(parser, tokens, true) {
        var.is_pub = is_pub;
        parser.ast.push_top(Decl::Var(var));
    }
}

/// Parses `type Id: Type`.
pub fn parse_type_alias(parser: &mut Parser, tokens: &[Token], is_pub: bool) -> Option<TypeAlias> {
    let keyword = &tokens[0];
    if tokens.len() < 3 {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[tokens.len() - 1]);
        return None;
    }
    if tokens[1].kind != TokenKind::Identifier {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[1]);
        return None;
    }
    if tokens[2].kind != TokenKind::Colon {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[2]);
        return None;
    }
    if tokens.len() == 3 {
        parser.push_error(ErrorImpl::MissingType, &tokens[2]);
        return None;
    }

    let ty = parse_whole_type(parser, &tokens[3..], true, true)?;
    Some(TypeAlias {
        id: tokens[1].value.clone(),
        ty,
        is_pub,
        cpp_linked: false,
        position: keyword.position.clone(),
    })
}

pub fn parse_type_alias_decl(parser: &mut Parser, tokens: &[Token]) {
    let is_pub = parser.take_public();
    if let Some(alias) = parse_type_alias(parser, tokens, is_pub) {
        parser.ast.push_top(Decl::TypeAlias(alias));
    }
}

/// Reads the `{ ... }` body at `i`. A missing body stops the build.
fn take_decl_body(parser: &mut Parser, tokens: &[Token], i: &mut usize) -> Option<Vec<Token>> {
    let keyword = tokens[0].clone();
    let mut tokens = tokens.to_vec();
    let Some(body) = parser.get_range(i, &mut tokens) else {
        parser.push_error(ErrorImpl::BodyNotExist, &keyword);
        parser.stop();
        return None;
    };
    if let Some(extra) = tokens.get(*i) {
        parser.push_error(ErrorImpl::InvalidSyntax, extra);
    }
    Some(body)
}

/// `enum Id [: Base] { A, B = expr }`
pub fn parse_enum_decl(parser: &mut Parser, tokens: &[Token]) {
    let is_pub = parser.take_public();
    let keyword = &tokens[0];
    let Some(ident) = tokens.get(1).filter(|t| t.kind == TokenKind::Identifier) else {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[tokens.len().min(2) - 1]);
        return;
    };

    let mut i = 2;
    let base = if tokens.get(i).is_some_and(|t| t.kind == TokenKind::Colon) {
        i += 1;
        let (ty, ok) = parse_type(parser, tokens, &mut i, false, true);
        if !ok {
            return;
        }
        ty
    } else {
        let category = primitive_category("u32", parser.config()).unwrap_or(TypeCategory::UnsignedInt(32));
        Type::primitive("u32", category, keyword.position.clone())
    };

    let Some(body) = take_decl_body(parser, tokens, &mut i) else {
        return;
    };
    let body: Vec<Token> = body.into_iter().filter(|t| t.kind != TokenKind::Comment).collect();

    let mut decl = EnumDecl {
        id: ident.value.clone(),
        base,
        items: Vec::new(),
        is_pub,
        position: ident.position.clone(),
    };

    let (parts, errors) = split_on(&body, ",", false);
    parser.extend_errors(errors);
    for part in parts.into_iter().filter(|part| !part.is_empty()) {
        let item = &part[0];
        if item.kind != TokenKind::Identifier {
            parser.push_error(ErrorImpl::InvalidSyntax, item);
            continue;
        }
        if decl.item(&item.value).is_some() {
            parser.push_error(ErrorImpl::ExistId { id: item.value.clone() }, item);
            continue;
        }

        let mut enum_item = EnumItem {
            id: item.value.clone(),
            expr: None,
            value: None,
            position: item.position.clone(),
        };
        if part.len() > 1 {
            if !part[1].is_op("=") {
                parser.push_error(ErrorImpl::InvalidSyntax, &part[1]);
                continue;
            }
            if part.len() == 2 {
                parser.push_error(ErrorImpl::MissingExpr, &part[1]);
                continue;
            }
            enum_item.expr = Some(parse_expr(parser, &part[2..]));
        }
        decl.items.push(enum_item);
    }

    parser.ast.push_top(Decl::Enum(decl));
}

/// Parses `struct Id[G] { fields }`.
fn parse_struct(parser: &mut Parser, tokens: &[Token], is_pub: bool) -> Option<StructDecl> {
    let Some(ident) = tokens.get(1).filter(|t| t.kind == TokenKind::Identifier) else {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[tokens.len().min(2) - 1]);
        return None;
    };

    let mut i = 2;
    let generics = parse_generic_params(parser, tokens, &mut i)?;
    let body = take_decl_body(parser, tokens, &mut i)?;

    let mut decl = StructDecl {
        id: ident.value.clone(),
        generics,
        fields: Vec::new(),
        traits: Vec::new(),
        methods: Vec::new(),
        is_pub,
        cpp_linked: false,
        position: ident.position.clone(),
    };

    let mut state = BlockState::new(body);
    while let Some(run) = state.next_run() {
        let run = strip_comments(run);
        if run[0].kind == TokenKind::Comment {
            if run.len() > 1 {
                state.push_next(run[1..].to_vec());
            }
            continue;
        }
        if let Some(field) = parse_field(parser, &run) {
            if decl.field(&field.id).is_some() {
                parser.push_error_at(ErrorImpl::ExistId { id: field.id.clone() }, field.position.clone());
                continue;
            }
            decl.fields.push(field);
        }
    }

    Some(decl)
}

/// `[pub] [mut] id: Type [= default]`
fn parse_field(parser: &mut Parser, tokens: &[Token]) -> Option<Var> {
    let mut i = 0;
    let mut field = Var::new(String::new(), tokens[0].position.clone());
    if tokens[i].kind == TokenKind::Pub {
        field.is_pub = true;
        i += 1;
    }
    if tokens.get(i).is_some_and(|t| t.kind == TokenKind::Mut) {
        field.mutable = true;
        i += 1;
    }

    let Some(ident) = tokens.get(i).filter(|t| t.kind == TokenKind::Identifier) else {
        let at = i.min(tokens.len() - 1);
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[at]);
        return None;
    };
    field.id = ident.value.clone();
    field.position = ident.position.clone();
    i += 1;

    if !tokens.get(i).is_some_and(|t| t.kind == TokenKind::Colon) || i + 1 >= tokens.len() {
        parser.push_error(ErrorImpl::MissingType, ident);
        return None;
    }
    i += 1;
    let (ty, ok) = parse_type(parser, tokens, &mut i, true, true);
    if !ok {
        return None;
    }
    field.ty = Some(ty);

    if let Some(token) = tokens.get(i) {
        if !token.is_op("=") || i + 1 >= tokens.len() {
            parser.push_error(ErrorImpl::InvalidSyntax, token);
            return None;
        }
        field.init = Some(parse_expr(parser, &tokens[i + 1..]));
    }
    Some(field)
}

pub fn parse_struct_decl(parser: &mut Parser, tokens: &[Token]) {
    let is_pub = parser.take_public();
    if let Some(decl) = parse_struct(parser, tokens, is_pub) {
        parser.ast.push_top(Decl::Struct(decl));
    }
}

/// `trait Id { fn m(&self): T }`. Methods are prototypes with a receiver.
pub fn parse_trait_decl(parser: &mut Parser, tokens: &[Token]) {
    let is_pub = parser.take_public();
    let Some(ident) = tokens.get(1).filter(|t| t.kind == TokenKind::Identifier) else {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[tokens.len().min(2) - 1]);
        return;
    };

    let mut i = 2;
    let Some(body) = take_decl_body(parser, tokens, &mut i) else {
        return;
    };

    let mut decl = TraitDecl {
        id: ident.value.clone(),
        methods: Vec::new(),
        is_pub,
        position: ident.position.clone(),
    };

    let mut state = BlockState::new(body);
    while let Some(run) = state.next_run() {
        let run = strip_comments(run);
        if run[0].kind == TokenKind::Comment {
            continue;
        }
        let mut j = 0;
        let Some(method) = parse_fn_prototype(parser, &run, &mut j, true) else {
            continue;
        };
        if let Some(extra) = run.get(j) {
            parser.push_error(ErrorImpl::InvalidSyntax, extra);
            continue;
        }
        if method.receiver.is_none() {
            parser.push_error(ErrorImpl::MissingReceiver, &run[0]);
            continue;
        }
        if decl.methods.iter().any(|m| m.id == method.id) {
            parser.push_error(ErrorImpl::ExistId { id: method.id.clone() }, &run[0]);
            continue;
        }
        decl.methods.push(method);
    }

    parser.ast.push_top(Decl::Trait(decl));
}

/// `impl Trait for Struct { ... }` or `impl Struct { ... }`.
pub fn parse_impl_decl(parser: &mut Parser, tokens: &[Token]) {
    let keyword = &tokens[0];
    let Some(base) = tokens.get(1).filter(|t| t.kind == TokenKind::Identifier) else {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[tokens.len().min(2) - 1]);
        return;
    };

    let mut i = 2;
    let target = if tokens.get(i).is_some_and(|t| t.kind == TokenKind::For) {
        i += 1;
        match tokens.get(i) {
            Some(t) if t.kind == TokenKind::Identifier => {}
            _ => {
                let at = i.min(tokens.len() - 1);
                parser.push_error(ErrorImpl::InvalidSyntax, &tokens[at]);
                return;
            }
        }
        let (ty, ok) = parse_type(parser, tokens, &mut i, false, true);
        if !ok {
            return;
        }
        Some(ty)
    } else {
        None
    };

    let Some(body) = take_decl_body(parser, tokens, &mut i) else {
        return;
    };

    let owner = target
        .clone()
        .unwrap_or_else(|| Type::named(&base.value, Vec::new(), base.position.clone()));
    let mut methods = Vec::new();

    let mut state = BlockState::new(body);
    while let Some(run) = state.next_run() {
        let run = strip_comments(run);
        if run[0].kind == TokenKind::Comment {
            continue;
        }
        if let Some(method) = parse_impl_method(parser, &run, &mut state, &owner, target.is_some()) {
            methods.push(parser.ast.push(Decl::Func(method)));
        }
        if parser.stopped() {
            return;
        }
    }

    parser.ast.push_top(Decl::Impl(ImplDecl {
        base: base.value.clone(),
        target,
        methods,
        position: keyword.position.clone(),
    }));
}

fn parse_impl_method(
    parser: &mut Parser,
    run: &[Token],
    state: &mut BlockState,
    owner: &Type,
    trait_impl: bool,
) -> Option<FnDecl> {
    let mut j = 0;
    let is_pub = run[0].kind == TokenKind::Pub;
    if is_pub {
        if trait_impl {
            parser.push_error(ErrorImpl::DefNotSupportPub, &run[0]);
        }
        j += 1;
        if j >= run.len() {
            parser.push_error(ErrorImpl::InvalidSyntax, &run[0]);
            return None;
        }
    }

    let mut method = parse_fn_prototype(parser, run, &mut j, true)?;
    method.is_pub = is_pub || trait_impl;

    let Some(receiver) = method.receiver.as_mut() else {
        parser.push_error(ErrorImpl::MissingReceiver, &run[0]);
        return None;
    };
    let receiver_ty = if receiver.reference {
        owner.clone().with_prefix("&")
    } else {
        owner.clone()
    };
    receiver.ty = Some(receiver_ty);

    let body = match extract_range(run, &mut j, "{", "}") {
        Some(body) => {
            if let Some(extra) = run.get(j) {
                parser.push_error(ErrorImpl::InvalidSyntax, extra);
            }
            body.to_vec()
        }
        None if j >= run.len() && state.peek_run().is_some_and(|next| next[0].is_brace("{")) => {
            let next = state.next_run().unwrap_or_default();
            let mut k = 0;
            extract_range(&next, &mut k, "{", "}").unwrap_or_default().to_vec()
        }
        None => {
            parser.push_error(ErrorImpl::BodyNotExist, &run[0]);
            parser.stop();
            return None;
        }
    };
    method.body = Some(parse_block(parser, &body));
    Some(method)
}

/// `cpp fn`, `cpp let`, `cpp struct` and `cpp type` links.
pub fn parse_foreign_link_decl(parser: &mut Parser, tokens: &[Token]) {
    let keyword = &tokens[0];
    let rest = &tokens[1..];
    if rest.is_empty() {
        parser.push_error(ErrorImpl::InvalidSyntax, keyword);
        return;
    }

    let item = match rest[0].kind {
        TokenKind::Fn | TokenKind::Unsafe => {
            let mut j = 0;
            let Some(mut func) = parse_fn_prototype(parser, rest, &mut j, false) else {
                return;
            };
            if let Some(extra) = rest.get(j) {
                parser.push_error(ErrorImpl::InvalidSyntax, extra);
                return;
            }
            func.cpp_linked = true;
            LinkItem::Fn(func)
        }
        TokenKind::Let => {
            let Some(mut var) = parse_var(parser, rest, false) else {
                return;
            };
            if var.init.is_some() || var.ty.is_none() {
                parser.push_error(ErrorImpl::InvalidSyntax, &rest[0]);
                return;
            }
            var.cpp_linked = true;
            LinkItem::Var(var)
        }
        TokenKind::Struct => {
            let Some(mut decl) = parse_struct(parser, rest, false) else {
                return;
            };
            decl.cpp_linked = true;
            LinkItem::Struct(decl)
        }
        TokenKind::Type => {
            let Some(mut alias) = parse_type_alias(parser, rest, false) else {
                return;
            };
            alias.cpp_linked = true;
            LinkItem::Type(alias)
        }
        _ => {
            parser.push_error(ErrorImpl::InvalidSyntax, &rest[0]);
            return;
        }
    };

    parser.ast.push_top(Decl::ForeignLink(ForeignLink {
        item,
        position: keyword.position.clone(),
    }));
}
