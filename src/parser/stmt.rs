//! Statement parsing.
//!
//! A block body is cut into statements by the segmenter and each statement
//! is dispatched on its leading token. Assignments are recognised before
//! the dispatch, by an assignment operator at brace depth 0.

use crate::{
    ast::{
        ast::TypeAlias,
        expressions::{Expr, ExprKind},
        statements::{
            Assign, AssignTarget, Block, Case, Conditional, IfBranch, Loop, LoopProfile, Match,
            Stmt, StmtKind, Var,
        },
    },
    errors::errors::ErrorImpl,
    lexer::tokens::{brace_delta, Token, TokenKind, IGNORE_ID},
    Position,
};

use super::{
    decl::{parse_type_alias, parse_var},
    expr::{parse_args, parse_expr},
    lookups::{is_assign_op, POSTFIX_OPS},
    parser::Parser,
    parts::{extract_range, find_top_level, get_block_expr, is_fn_call, split_on},
    segment::next_statement,
    types::parse_type,
};

/// Cursor over the statements of one block.
pub struct BlockState {
    tokens: Vec<Token>,
    pos: usize,
    /// Tokens left over by a statement that ended early, such as a label.
    next_tokens: Option<Vec<Token>>,
    /// Whether the statement last returned ended with `;`.
    pub terminated: bool,
}

impl BlockState {
    pub fn new(tokens: Vec<Token>) -> Self {
        BlockState {
            tokens,
            pos: 0,
            next_tokens: None,
            terminated: false,
        }
    }

    /// Returns the next non-empty statement without its terminating `;`.
    pub fn next_run(&mut self) -> Option<Vec<Token>> {
        if let Some(tokens) = self.next_tokens.take() {
            self.terminated = false;
            return Some(tokens);
        }
        while self.pos < self.tokens.len() {
            let start = self.pos;
            let (end, terminated) = next_statement(&self.tokens, start);
            self.pos = end;
            self.terminated = terminated;
            let end = if terminated { end - 1 } else { end };
            if end > start {
                return Some(self.tokens[start..end].to_vec());
            }
        }
        None
    }

    /// Looks at the next statement without consuming it.
    pub fn peek_run(&self) -> Option<Vec<Token>> {
        if let Some(tokens) = &self.next_tokens {
            return Some(tokens.clone());
        }
        let mut pos = self.pos;
        while pos < self.tokens.len() {
            let (end, terminated) = next_statement(&self.tokens, pos);
            let stop = if terminated { end - 1 } else { end };
            if stop > pos {
                return Some(self.tokens[pos..stop].to_vec());
            }
            pos = end;
        }
        None
    }

    pub fn push_next(&mut self, tokens: Vec<Token>) {
        self.next_tokens = Some(tokens);
    }
}

/// Parses a block body into statements.
pub fn parse_block(parser: &mut Parser, tokens: &[Token]) -> Block {
    let mut state = BlockState::new(tokens.to_vec());
    let mut block = Block::default();

    while let Some(run) = state.next_run() {
        let terminated = state.terminated;
        let run = strip_comments(run);
        if let Some(mut stmt) = parse_stmt(parser, &run, &mut state) {
            stmt.terminated = terminated;
            block.stmts.push(stmt);
        }
        if parser.stopped() {
            break;
        }
    }

    block
}

/// Drops comment tokens that trail the first token of a statement.
pub fn strip_comments(run: Vec<Token>) -> Vec<Token> {
    let mut tokens = run.into_iter();
    let mut out: Vec<Token> = tokens.next().into_iter().collect();
    out.extend(tokens.filter(|t| t.kind != TokenKind::Comment));
    out
}

/// Parses one statement.
pub fn parse_stmt(parser: &mut Parser, tokens: &[Token], state: &mut BlockState) -> Option<Stmt> {
    let first = &tokens[0];

    if first.kind == TokenKind::Identifier && tokens.get(1).is_some_and(|t| t.kind == TokenKind::Colon) {
        let multi_target = is_assign(tokens)
            && find_top_level(tokens, |t| t.kind == TokenKind::Comma)
                .is_some_and(|comma| Some(comma) < find_assign_op(tokens));
        if !multi_target {
            return parse_id_stmt(parser, tokens, state);
        }
    }

    if is_assign(tokens) && !(first.kind == TokenKind::Let && !tokens.get(1).is_some_and(|t| t.is_brace("("))) {
        return parse_assign_stmt(parser, tokens, true);
    }

    let handler = match first.kind {
        TokenKind::Brace if !first.is_brace("{") => None,
        kind => parser.get_stmt_lookup().get(&kind).copied(),
    };
    if let Some(handler) = handler {
        return handler(parser, tokens, state);
    }

    if is_fn_call(tokens) {
        let expr = parse_expr(parser, tokens);
        return Some(Stmt::new(StmtKind::Expr(expr), first.position.clone()));
    }

    parser.push_error(ErrorImpl::InvalidSyntax, first);
    None
}

fn is_assign(tokens: &[Token]) -> bool {
    let leading = matches!(
        tokens[0].kind,
        TokenKind::Identifier
            | TokenKind::Cpp
            | TokenKind::Let
            | TokenKind::Dot
            | TokenKind::SelfKw
            | TokenKind::Brace
            | TokenKind::Operator
    );
    leading && find_assign_op(tokens).is_some()
}

fn find_assign_op(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0;
    for (i, token) in tokens.iter().enumerate() {
        depth += brace_delta(token);
        if depth < 0 {
            return None;
        } else if depth > 0 {
            continue;
        }
        if token.kind == TokenKind::Operator && is_assign_op(&token.value) {
            return Some(i);
        }
    }
    None
}

/// `id:` starts a label, unless it reads as `id: Type [= expr]`.
fn parse_id_stmt(parser: &mut Parser, tokens: &[Token], state: &mut BlockState) -> Option<Stmt> {
    let id = &tokens[0];
    let rest = &tokens[2..];

    if !rest.is_empty() {
        let mut i = 0;
        let (_, ok) = parse_type(parser, rest, &mut i, true, false);
        if ok && (i == rest.len() || rest[i].is_op("=")) {
            let mut var = Var::new(id.value.clone(), id.position.clone());
            let mut i = 0;
            let (ty, _) = parse_type(parser, rest, &mut i, true, true);
            var.ty = Some(ty);
            if i < rest.len() {
                let value = &rest[i + 1..];
                if value.is_empty() {
                    parser.push_error(ErrorImpl::MissingExpr, &rest[i]);
                } else {
                    var.init = Some(parse_expr(parser, value));
                }
            }
            return Some(Stmt::new(StmtKind::Var(var), id.position.clone()));
        }
        state.push_next(rest.to_vec());
    }

    Some(Stmt::new(StmtKind::Label(id.value.clone()), id.position.clone()))
}

/// Parses an assignment statement.
///
/// `allow_declare` is false in expression-context positions such as the
/// post statement of a loop, where only plain targets are legal.
pub fn parse_assign_stmt(parser: &mut Parser, tokens: &[Token], allow_declare: bool) -> Option<Stmt> {
    let first = &tokens[0];
    let op_index = find_assign_op(tokens)?;
    let op = &tokens[op_index];
    let left = &tokens[..op_index];
    let right = &tokens[op_index + 1..];
    let postfix = POSTFIX_OPS.contains(&op.value.as_str());

    if left.is_empty() {
        parser.push_error(ErrorImpl::InvalidSyntax, op);
        return None;
    }
    if right.is_empty() && !postfix {
        parser.push_error(ErrorImpl::InvalidSyntax, op);
        return None;
    }
    if !right.is_empty() && postfix {
        parser.push_error(ErrorImpl::InvalidSyntax, &right[0]);
        return None;
    }

    let declares = first.kind == TokenKind::Let;
    let targets = if declares {
        parse_let_targets(parser, left)?
    } else {
        parse_targets(parser, left)?
    };

    let (value_parts, errors) = split_on(right, ",", true);
    parser.extend_errors(errors);
    let values: Vec<Expr> = value_parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(|part| parse_expr(parser, part))
        .collect();

    let compound = op.value != "=" && !postfix;
    if compound && (targets.len() > 1 || values.len() > 1) {
        parser.push_error(ErrorImpl::InvalidSyntax, op);
        return None;
    }
    let has_new = targets.iter().any(|target| target.var.is_some());
    if has_new && (!allow_declare || compound || postfix) {
        parser.push_error(ErrorImpl::InvalidSyntax, first);
        return None;
    }

    // A single `id: T = value` is a plain variable declaration.
    if !declares && targets.len() == 1 && op.value == "=" && values.len() == 1 {
        if let Some(mut var) = targets[0].var.clone() {
            var.init = values.into_iter().next();
            return Some(Stmt::new(StmtKind::Var(var), first.position.clone()));
        }
    }

    Some(Stmt::new(
        StmtKind::Assign(Assign {
            targets,
            op: op.value.clone(),
            values,
            declares,
        }),
        first.position.clone(),
    ))
}

fn parse_targets(parser: &mut Parser, tokens: &[Token]) -> Option<Vec<AssignTarget>> {
    let (parts, errors) = split_on(tokens, ",", true);
    parser.extend_errors(errors);

    let mut targets = Vec::new();
    for part in parts.into_iter().filter(|part| !part.is_empty()) {
        let head = &part[0];
        if head.kind == TokenKind::Identifier && part.get(1).is_some_and(|t| t.kind == TokenKind::Colon) {
            let mut var = Var::new(head.value.clone(), head.position.clone());
            let mut i = 2;
            if i >= part.len() {
                parser.push_error(ErrorImpl::MissingType, &part[1]);
                return None;
            }
            let (ty, ok) = parse_type(parser, part, &mut i, true, true);
            if !ok {
                return None;
            }
            if i < part.len() {
                parser.push_error(ErrorImpl::InvalidSyntax, &part[i]);
                return None;
            }
            var.ty = Some(ty);
            targets.push(AssignTarget {
                expr: Expr::new(ExprKind::Ident(head.value.clone()), head.position.clone()),
                var: Some(var),
            });
            continue;
        }

        targets.push(AssignTarget {
            expr: parse_expr(parser, part),
            var: None,
        });
    }
    Some(targets)
}

/// `let (a, mut b)` target list.
fn parse_let_targets(parser: &mut Parser, tokens: &[Token]) -> Option<Vec<AssignTarget>> {
    let mut i = 1;
    let Some(inner) = extract_range(tokens, &mut i, "(", ")") else {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[0]);
        return None;
    };
    if i < tokens.len() {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[i]);
        return None;
    }

    let (parts, errors) = split_on(inner, ",", true);
    parser.extend_errors(errors);

    let mut targets = Vec::new();
    for part in parts.into_iter().filter(|part| !part.is_empty()) {
        let mut i = 0;
        let mutable = part[0].kind == TokenKind::Mut;
        if mutable {
            i += 1;
        }
        let Some(ident) = part.get(i).filter(|t| t.kind == TokenKind::Identifier) else {
            parser.push_error(ErrorImpl::InvalidSyntax, &part[i.min(part.len() - 1)]);
            return None;
        };
        if i + 1 != part.len() {
            parser.push_error(ErrorImpl::InvalidSyntax, &part[i + 1]);
            return None;
        }

        let expr = Expr::new(ExprKind::Ident(ident.value.clone()), ident.position.clone());
        let var = (ident.value != IGNORE_ID).then(|| {
            let mut var = Var::new(ident.value.clone(), ident.position.clone());
            var.mutable = mutable;
            var
        });
        targets.push(AssignTarget { expr, var });
    }

    if targets.is_empty() {
        parser.push_error(ErrorImpl::MissingIdentifiers, &tokens[0]);
        return None;
    }
    Some(targets)
}

pub fn parse_var_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    let var = parse_var(parser, tokens, true)?;
    let position = tokens[0].position.clone();
    Some(Stmt::new(StmtKind::Var(var), position))
}

pub fn parse_return_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    let values = parse_args(parser, &tokens[1..]);
    Some(Stmt::new(StmtKind::Return(values), tokens[0].position.clone()))
}

fn parse_optional_label(parser: &mut Parser, tokens: &[Token]) -> Option<Option<String>> {
    match tokens.len() {
        1 => Some(None),
        2 if tokens[1].kind == TokenKind::Identifier => Some(Some(tokens[1].value.clone())),
        _ => {
            parser.push_error(ErrorImpl::InvalidSyntax, &tokens[1]);
            None
        }
    }
}

pub fn parse_break_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    let label = parse_optional_label(parser, tokens)?;
    Some(Stmt::new(StmtKind::Break(label), tokens[0].position.clone()))
}

pub fn parse_continue_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    let label = parse_optional_label(parser, tokens)?;
    Some(Stmt::new(StmtKind::Continue(label), tokens[0].position.clone()))
}

pub fn parse_goto_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    match tokens.len() {
        1 => {
            parser.push_error(ErrorImpl::MissingGotoLabel, &tokens[0]);
            None
        }
        2 if tokens[1].kind == TokenKind::Identifier => Some(Stmt::new(
            StmtKind::Goto(tokens[1].value.clone()),
            tokens[0].position.clone(),
        )),
        _ => {
            parser.push_error(ErrorImpl::InvalidSyntax, &tokens[1]);
            None
        }
    }
}

pub fn parse_fall_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    if tokens.len() > 1 {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[1]);
        return None;
    }
    Some(Stmt::new(StmtKind::Fall, tokens[0].position.clone()))
}

pub fn parse_spawn_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    let co = &tokens[0];
    let rest = &tokens[1..];
    if rest.is_empty() {
        parser.push_error(ErrorImpl::MissingExpr, co);
        return None;
    }
    if !is_fn_call(rest) {
        parser.push_error(ErrorImpl::ExprNotFuncCall, &rest[0]);
        return None;
    }
    let expr = parse_expr(parser, rest);
    Some(Stmt::new(StmtKind::Spawn(expr), co.position.clone()))
}

pub fn parse_comment_stmt(_parser: &mut Parser, tokens: &[Token], state: &mut BlockState) -> Option<Stmt> {
    if tokens.len() > 1 {
        state.push_next(tokens[1..].to_vec());
    }
    Some(Stmt::new(
        StmtKind::Comment(tokens[0].value.clone()),
        tokens[0].position.clone(),
    ))
}

pub fn parse_type_alias_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    let alias: TypeAlias = parse_type_alias(parser, tokens, false)?;
    Some(Stmt::new(StmtKind::TypeAlias(alias), tokens[0].position.clone()))
}

/// `[unsafe] [defer] { ... }`
pub fn parse_block_stmt(parser: &mut Parser, tokens: &[Token], _state: &mut BlockState) -> Option<Stmt> {
    let mut i = 0;
    let is_unsafe = tokens[i].kind == TokenKind::Unsafe;
    if is_unsafe {
        i += 1;
    }
    let deferred = tokens.get(i).is_some_and(|t| t.kind == TokenKind::Defer);
    if deferred {
        i += 1;
    }

    let Some(range) = extract_range(tokens, &mut i, "{", "}") else {
        let at = i.min(tokens.len() - 1);
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[at]);
        return None;
    };
    if i < tokens.len() {
        parser.push_error(ErrorImpl::InvalidSyntax, &tokens[i]);
    }

    let mut block = parse_block(parser, range);
    block.is_unsafe = is_unsafe;
    block.deferred = deferred;
    Some(Stmt::new(StmtKind::Block(block), tokens[0].position.clone()))
}

/// Splits `head { body } rest`. When the block starts on the next line the
/// following statement is taken as the body.
fn take_body(
    parser: &mut Parser,
    tokens: &[Token],
    state: &mut BlockState,
    keyword: &Token,
) -> Option<(Vec<Token>, Vec<Token>, Vec<Token>)> {
    if let Some(head) = get_block_expr(tokens) {
        let mut i = head.len();
        let body = extract_range(tokens, &mut i, "{", "}").unwrap_or_default();
        return Some((head.to_vec(), body.to_vec(), tokens[i..].to_vec()));
    }

    if state.peek_run().is_some_and(|run| run[0].is_brace("{")) {
        let run = state.next_run().unwrap_or_default();
        let mut i = 0;
        let body = extract_range(&run, &mut i, "{", "}").unwrap_or_default();
        return Some((tokens.to_vec(), body.to_vec(), run[i..].to_vec()));
    }

    parser.push_error(ErrorImpl::BodyNotExist, keyword);
    parser.stop();
    None
}

pub fn parse_if_stmt(parser: &mut Parser, tokens: &[Token], state: &mut BlockState) -> Option<Stmt> {
    let keyword = &tokens[0];
    let (head, body, mut rest) = take_body(parser, &tokens[1..], state, keyword)?;
    if head.is_empty() {
        parser.push_error(ErrorImpl::MissingExpr, keyword);
    }

    let if_ = IfBranch {
        cond: parse_expr(parser, &head),
        body: parse_block(parser, &body),
    };
    let mut conditional = Conditional {
        if_,
        elifs: Vec::new(),
        default: None,
    };

    loop {
        if rest.is_empty() {
            match state.peek_run() {
                Some(run) if run[0].kind == TokenKind::Else => {
                    rest = state.next_run().unwrap_or_default();
                }
                _ => break,
            }
        }

        let else_token = rest[0].clone();
        if else_token.kind != TokenKind::Else {
            parser.push_error(ErrorImpl::InvalidSyntax, &else_token);
            break;
        }
        if conditional.default.is_some() {
            parser.push_error(ErrorImpl::InvalidSyntax, &else_token);
            break;
        }

        let after = rest[1..].to_vec();
        if after.first().is_some_and(|t| t.kind == TokenKind::If) {
            let if_token = after[0].clone();
            let (head, body, next) = take_body(parser, &after[1..], state, &if_token)?;
            if head.is_empty() {
                parser.push_error(ErrorImpl::MissingExpr, &if_token);
            }
            conditional.elifs.push(IfBranch {
                cond: parse_expr(parser, &head),
                body: parse_block(parser, &body),
            });
            rest = next;
            continue;
        }

        let (head, body, next) = take_body(parser, &after, state, &else_token)?;
        if !head.is_empty() {
            parser.push_error(ErrorImpl::ElseHaveExpr, &head[0]);
        }
        conditional.default = Some(parse_block(parser, &body));
        if !next.is_empty() {
            parser.push_error(ErrorImpl::InvalidSyntax, &next[0]);
        }
        break;
    }

    Some(Stmt::new(StmtKind::If(conditional), keyword.position.clone()))
}

/// Parses the statement of a loop header. Only expressions, assignments
/// and variables are allowed there.
fn parse_header_stmt(parser: &mut Parser, tokens: &[Token], allow_declare: bool) -> Option<Box<Stmt>> {
    if tokens.is_empty() {
        return None;
    }
    let position = tokens[0].position.clone();
    let stmt = match tokens[0].kind {
        TokenKind::Let | TokenKind::Const if allow_declare => {
            if is_assign(tokens) && tokens.get(1).is_some_and(|t| t.is_brace("(")) {
                parse_assign_stmt(parser, tokens, true)?
            } else {
                Stmt::new(StmtKind::Var(parse_var(parser, tokens, true)?), position)
            }
        }
        _ if is_assign(tokens) => parse_assign_stmt(parser, tokens, allow_declare)?,
        _ if is_fn_call(tokens) => Stmt::new(StmtKind::Expr(parse_expr(parser, tokens)), position),
        _ => {
            parser.push_error(ErrorImpl::InvalidSyntax, &tokens[0]);
            return None;
        }
    };
    Some(Box::new(stmt))
}

pub fn parse_loop_stmt(parser: &mut Parser, tokens: &[Token], state: &mut BlockState) -> Option<Stmt> {
    let keyword = &tokens[0];

    if state.terminated {
        return parse_header_loop(parser, &tokens[1..], state, keyword);
    }

    let (head, body, rest) = take_body(parser, &tokens[1..], state, keyword)?;
    if !rest.is_empty() {
        parser.push_error(ErrorImpl::InvalidSyntax, &rest[0]);
    }

    let profile = if head.is_empty() {
        LoopProfile::While {
            cond: None,
            next: None,
        }
    } else if let Some(in_index) = find_top_level(&head, |t| t.kind == TokenKind::In) {
        parse_foreach_profile(parser, &head, in_index)?
    } else {
        LoopProfile::While {
            cond: Some(parse_expr(parser, &head)),
            next: None,
        }
    };

    let body = parse_block(parser, &body);
    Some(Stmt::new(
        StmtKind::Loop(Loop { profile, body }),
        keyword.position.clone(),
    ))
}

/// `for cond; next {}` and `for init; cond; post {}`.
fn parse_header_loop(
    parser: &mut Parser,
    first: &[Token],
    state: &mut BlockState,
    keyword: &Token,
) -> Option<Stmt> {
    let Some(second) = state.next_run() else {
        parser.push_error(ErrorImpl::BodyNotExist, keyword);
        parser.stop();
        return None;
    };
    let second_terminated = state.terminated;

    if second_terminated && get_block_expr(&second).is_none() {
        // C-style: the third statement carries the block.
        let Some(third) = state.next_run() else {
            parser.push_error(ErrorImpl::BodyNotExist, keyword);
            parser.stop();
            return None;
        };
        let (post, body, rest) = take_body(parser, &third, state, keyword)?;
        if !rest.is_empty() {
            parser.push_error(ErrorImpl::InvalidSyntax, &rest[0]);
        }
        let init = parse_header_stmt(parser, first, true);
        let cond = (!second.is_empty()).then(|| parse_expr(parser, &second));
        let post = parse_header_stmt(parser, &post, false);
        let body = parse_block(parser, &body);
        return Some(Stmt::new(
            StmtKind::Loop(Loop {
                profile: LoopProfile::CStyle { init, cond, post },
                body,
            }),
            keyword.position.clone(),
        ));
    }

    let (next, body, rest) = take_body(parser, &second, state, keyword)?;
    if !rest.is_empty() {
        parser.push_error(ErrorImpl::InvalidSyntax, &rest[0]);
    }
    let cond = (!first.is_empty()).then(|| parse_expr(parser, first));
    let next = parse_header_stmt(parser, &next, false);
    let body = parse_block(parser, &body);
    Some(Stmt::new(
        StmtKind::Loop(Loop {
            profile: LoopProfile::While { cond, next },
            body,
        }),
        keyword.position.clone(),
    ))
}

fn parse_foreach_profile(parser: &mut Parser, head: &[Token], in_index: usize) -> Option<LoopProfile> {
    let in_token = &head[in_index];
    let vars = &head[..in_index];
    let iterable = &head[in_index + 1..];
    if iterable.is_empty() {
        parser.push_error(ErrorImpl::MissingExpr, in_token);
        return None;
    }

    let vars = if vars.first().is_some_and(|t| t.is_brace("(")) {
        let mut i = 0;
        let inner = extract_range(vars, &mut i, "(", ")").unwrap_or_default();
        if i < vars.len() {
            parser.push_error(ErrorImpl::InvalidSyntax, &vars[i]);
            return None;
        }
        inner
    } else {
        vars
    };

    let (parts, errors) = split_on(vars, ",", true);
    parser.extend_errors(errors);
    if parts.len() > 2 {
        let at = parts[2].first().unwrap_or(in_token);
        parser.push_error(ErrorImpl::MuchForeachVars, at);
        return None;
    }

    let mut keys = Vec::new();
    for part in parts.iter().filter(|part| !part.is_empty()) {
        keys.push(parse_foreach_var(parser, part)?);
    }

    let ignored = |position: &Position| Var::new(String::from(IGNORE_ID), position.clone());
    let (key_a, key_b) = match keys.len() {
        0 => (ignored(&in_token.position), ignored(&in_token.position)),
        1 => {
            let key_b = keys.remove(0);
            (ignored(&key_b.position), key_b)
        }
        _ => {
            let key_b = keys.remove(1);
            (keys.remove(0), key_b)
        }
    };

    Some(LoopProfile::ForEach {
        key_a,
        key_b,
        expr: parse_expr(parser, iterable),
    })
}

fn parse_foreach_var(parser: &mut Parser, part: &[Token]) -> Option<Var> {
    let mut i = 0;
    let mutable = part[0].kind == TokenKind::Mut;
    if mutable {
        i += 1;
    }
    match part.get(i) {
        Some(token) if token.kind == TokenKind::Identifier && i + 1 == part.len() => {
            let mut var = Var::new(token.value.clone(), token.position.clone());
            var.mutable = mutable;
            Some(var)
        }
        _ => {
            parser.push_error(ErrorImpl::InvalidSyntax, &part[part.len() - 1]);
            None
        }
    }
}

pub fn parse_match_stmt(parser: &mut Parser, tokens: &[Token], state: &mut BlockState) -> Option<Stmt> {
    let keyword = &tokens[0];
    let mut i = 1;
    let type_match = tokens.get(1).is_some_and(|t| t.kind == TokenKind::Type);
    if type_match {
        i += 1;
    }

    let (head, body, rest) = take_body(parser, &tokens[i..], state, keyword)?;
    if !rest.is_empty() {
        parser.push_error(ErrorImpl::InvalidSyntax, &rest[0]);
    }
    if type_match && head.is_empty() {
        parser.push_error(ErrorImpl::MissingExpr, keyword);
        return None;
    }
    let subject = (!head.is_empty()).then(|| parse_expr(parser, &head));

    let mut m = Match {
        subject,
        type_match,
        cases: Vec::new(),
        default: None,
    };
    parse_cases(parser, &body, &mut m);

    Some(Stmt::new(StmtKind::Match(m), keyword.position.clone()))
}

/// A case starts with `|`, lists `|` separated items and ends its head at `:`.
/// The body runs until the next case. An empty item list is the default case.
fn parse_cases(parser: &mut Parser, body: &[Token], m: &mut Match) {
    let mut state = BlockState::new(body.to_vec());
    let mut current: Option<(Vec<Token>, Vec<Token>)> = None;

    while let Some(run) = state.next_run() {
        if run[0].is_op("|") {
            finish_case(parser, m, current.take());
            let Some(colon) = find_top_level(&run, |t| t.kind == TokenKind::Colon) else {
                parser.push_error(ErrorImpl::InvalidSyntax, &run[0]);
                current = Some((Vec::new(), Vec::new()));
                continue;
            };
            current = Some((run[..=colon].to_vec(), run[colon + 1..].to_vec()));
            continue;
        }

        match current.as_mut() {
            Some((_, stmts)) => {
                if let Some(last) = stmts.last().cloned() {
                    stmts.push(semicolon(&last));
                }
                stmts.extend(run);
            }
            None => parser.push_error(ErrorImpl::InvalidSyntax, &run[0]),
        }
    }
    finish_case(parser, m, current.take());
}

fn semicolon(after: &Token) -> Token {
    Token {
        kind: TokenKind::Semicolon,
        value: String::from(";"),
        position: after.position.clone(),
    }
}

fn finish_case(parser: &mut Parser, m: &mut Match, current: Option<(Vec<Token>, Vec<Token>)>) {
    let Some((items, stmts)) = current else {
        return;
    };
    let block = parse_block(parser, &stmts);
    if items.is_empty() {
        return;
    }
    let head = &items[1..items.len() - 1];
    if head.is_empty() {
        if m.default.is_some() {
            parser.push_error(ErrorImpl::InvalidSyntax, &items[0]);
        }
        m.default = Some(block);
        return;
    }

    let (parts, errors) = split_on(head, "|", true);
    parser.extend_errors(errors);
    let mut case = Case {
        exprs: Vec::new(),
        types: Vec::new(),
        body: block,
    };
    for part in parts.into_iter().filter(|part| !part.is_empty()) {
        if m.type_match {
            let mut i = 0;
            let (ty, ok) = parse_type(parser, part, &mut i, true, true);
            if ok {
                case.types.push(ty);
            }
        } else {
            case.exprs.push(parse_expr(parser, part));
        }
    }
    m.cases.push(case);
}
