use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{ast::statements::Stmt, lexer::tokens::{Token, TokenKind}};

use super::{decl::*, parser::Parser, stmt::*};

/// Binary operator precedence bands, lowest first.
#[derive(PartialEq, PartialOrd, Eq, Ord, Clone, Copy, Debug)]
pub enum Precedence {
    LogicalOr = 1,
    LogicalAnd,
    Relational,
    Additive,
    Multiplicative,
}

lazy_static! {
    pub static ref PRECEDENCE_LOOKUP: HashMap<&'static str, Precedence> = {
        let mut map = HashMap::new();
        map.insert("||", Precedence::LogicalOr);
        map.insert("&&", Precedence::LogicalAnd);
        for op in ["==", "!=", "<", "<=", ">", ">="] {
            map.insert(op, Precedence::Relational);
        }
        for op in ["+", "-", "|", "^"] {
            map.insert(op, Precedence::Additive);
        }
        for op in ["*", "/", "%", "<<", ">>", "&"] {
            map.insert(op, Precedence::Multiplicative);
        }
        map
    };
}

pub const ASSIGN_OPS: [&str; 11] = ["=", "+=", "-=", "*=", "/=", "%=", ">>=", "<<=", "|=", "&=", "^="];
pub const POSTFIX_OPS: [&str; 2] = ["++", "--"];

pub fn is_assign_op(op: &str) -> bool {
    ASSIGN_OPS.contains(&op) || POSTFIX_OPS.contains(&op)
}

pub type DeclHandler = fn(&mut Parser, &[Token]);
pub type StmtHandler = fn(&mut Parser, &[Token], &mut BlockState) -> Option<Stmt>;

pub type DeclLookup = HashMap<TokenKind, DeclHandler>;
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;

pub fn create_token_lookups(parser: &mut Parser) {
    // Declarations
    parser.decl(TokenKind::Use, parse_use_decl);
    parser.decl(TokenKind::Fn, parse_fn_decl);
    parser.decl(TokenKind::Unsafe, parse_fn_decl);
    parser.decl(TokenKind::Const, parse_global_var_decl);
    parser.decl(TokenKind::Let, parse_global_var_decl);
    parser.decl(TokenKind::Type, parse_type_alias_decl);
    parser.decl(TokenKind::Enum, parse_enum_decl);
    parser.decl(TokenKind::Struct, parse_struct_decl);
    parser.decl(TokenKind::Trait, parse_trait_decl);
    parser.decl(TokenKind::Impl, parse_impl_decl);
    parser.decl(TokenKind::Cpp, parse_foreign_link_decl);
    parser.decl(TokenKind::Comment, parse_comment_decl);

    // Statements
    parser.stmt(TokenKind::Const, parse_var_stmt);
    parser.stmt(TokenKind::Let, parse_var_stmt);
    parser.stmt(TokenKind::Return, parse_return_stmt);
    parser.stmt(TokenKind::For, parse_loop_stmt);
    parser.stmt(TokenKind::Break, parse_break_stmt);
    parser.stmt(TokenKind::Continue, parse_continue_stmt);
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::Comment, parse_comment_stmt);
    parser.stmt(TokenKind::Co, parse_spawn_stmt);
    parser.stmt(TokenKind::Goto, parse_goto_stmt);
    parser.stmt(TokenKind::Fall, parse_fall_stmt);
    parser.stmt(TokenKind::Type, parse_type_alias_stmt);
    parser.stmt(TokenKind::Match, parse_match_stmt);
    parser.stmt(TokenKind::Unsafe, parse_block_stmt);
    parser.stmt(TokenKind::Defer, parse_block_stmt);
    parser.stmt(TokenKind::Brace, parse_block_stmt);
}
