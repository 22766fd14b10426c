//! Parser implementation for building the declaration arena.
//!
//! This module contains the main Parser struct and the top-level build loop.
//! The parser works on whole statements: the token stream is cut into
//! statements by the segmenter, each statement is dispatched on its leading
//! token, and the handler works on that statement's token run.
//!
//! It maintains lookup tables for:
//! - Declaration handlers, keyed by the leading token of a top-level statement
//! - Statement handlers, keyed by the leading token of a block statement

use std::{collections::{HashMap, HashSet}, rc::Rc};

use crate::{
    ast::ast::{Ast, Decl, LinkItem, Node},
    config::CompilerConfig,
    errors::errors::{Diagnostics, Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position,
};

use super::{
    lookups::{create_token_lookups, DeclHandler, DeclLookup, StmtHandler, StmtLookup},
    parts::{extract_range, unclosed_brace},
    segment::next_statement,
    stmt::strip_comments,
};

/// Value of `pos` once a fatal error stopped the build.
const STOPPED: i32 = -1;

/// The main parser structure that maintains parsing state.
///
/// This struct holds the token stream and the lookup tables for parsing
/// declarations and statements. It tracks the current position in the token
/// stream, the accumulated diagnostics and the declarations built so far.
pub struct Parser {
    /// The list of tokens to parse
    tokens: Vec<Token>,
    /// Current position in the token stream, or `STOPPED`
    pos: i32,
    /// The name of the source file being parsed
    file: Rc<String>,
    /// Settings shared with the type checker
    config: CompilerConfig,
    /// Every error and warning found so far
    diagnostics: Diagnostics,
    /// Declarations built so far
    pub(crate) ast: Ast,
    /// Set by a leading `pub` until a declaration consumes it
    pub(crate) public: bool,
    /// Paths imported by `use` declarations
    pub(crate) uses: HashSet<String>,
    /// Lookup table for top-level declaration handlers
    decl_lookup: DeclLookup,
    /// Lookup table for block statement handlers
    stmt_lookup: StmtLookup,
}

impl Parser {
    /// Creates a new Parser instance.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Vector of tokens to parse
    /// * `config` - Compiler settings
    ///
    /// # Returns
    ///
    /// A new Parser instance ready to parse the token stream.
    pub fn new(tokens: Vec<Token>, config: &CompilerConfig) -> Self {
        let file = tokens
            .first()
            .map(|token| token.position.file.clone())
            .unwrap_or_else(|| Position::null().file);

        Parser {
            tokens,
            pos: 0,
            file,
            config: config.clone(),
            diagnostics: Diagnostics::new(),
            ast: Ast::new(),
            public: false,
            uses: HashSet::new(),
            decl_lookup: HashMap::new(),
            stmt_lookup: HashMap::new(),
        }
    }

    pub fn get_file(&self) -> Rc<String> {
        self.file.clone()
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Records an error at `token`.
    pub fn push_error(&mut self, error: ErrorImpl, token: &Token) {
        self.diagnostics.push_error(error, token.position.clone());
    }

    pub fn push_error_at(&mut self, error: ErrorImpl, position: Position) {
        self.diagnostics.push_error(error, position);
    }

    pub fn extend_errors(&mut self, errors: Vec<Error>) {
        self.diagnostics.extend(errors);
    }

    /// Registers a handler for top-level declarations.
    pub fn decl(&mut self, kind: TokenKind, handler: DeclHandler) {
        self.decl_lookup.insert(kind, handler);
    }

    /// Registers a handler for block statements.
    pub fn stmt(&mut self, kind: TokenKind, handler: StmtHandler) {
        self.stmt_lookup.insert(kind, handler);
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    /// Aborts the build. The top-level loop stops before the next statement.
    pub fn stop(&mut self) {
        self.pos = STOPPED;
    }

    pub fn stopped(&self) -> bool {
        self.pos == STOPPED
    }

    /// Whether the top-level cursor has no statements left.
    pub fn ended(&self) -> bool {
        self.stopped() || self.pos as usize >= self.tokens.len()
    }

    /// Returns the next top-level statement without its terminating `;`.
    ///
    /// A statement whose braces never close consumes the rest of the input.
    /// In that case `unclosed_brace` is reported and the build stops.
    pub fn next_builder_st(&mut self) -> Vec<Token> {
        if self.ended() {
            return Vec::new();
        }

        let start = self.pos as usize;
        let (end, terminated) = next_statement(&self.tokens, start);
        self.pos = end as i32;

        let end = if terminated { end - 1 } else { end };
        let run = self.tokens[start..end].to_vec();

        if end == self.tokens.len() {
            if let Some(brace) = unclosed_brace(&run).cloned() {
                self.push_error(
                    ErrorImpl::UnclosedBrace {
                        brace: brace.value.clone(),
                    },
                    &brace,
                );
                self.stop();
            }
        }

        run
    }

    /// Extracts a `{ ... }` region at `i`, pulling the next top-level
    /// statement when the block starts on a later line.
    pub fn get_range(&mut self, i: &mut usize, tokens: &mut Vec<Token>) -> Option<Vec<Token>> {
        if let Some(range) = extract_range(tokens, i, "{", "}") {
            return Some(range.to_vec());
        }
        if *i < tokens.len() || self.ended() {
            return None;
        }

        *tokens = self.next_builder_st();
        *i = 0;
        extract_range(tokens, i, "{", "}").map(|range| range.to_vec())
    }

    /// Builds every top-level declaration.
    pub fn build(&mut self) {
        while !self.ended() {
            let run = strip_comments(self.next_builder_st());
            if run.is_empty() {
                continue;
            }
            self.build_decl(&run);
        }

        if self.public && !self.stopped() {
            let position = self
                .tokens
                .last()
                .map(|token| token.position.clone())
                .unwrap_or_else(Position::null);
            self.push_error_at(ErrorImpl::InvalidSyntax, position);
        }
    }

    pub(crate) fn build_decl(&mut self, run: &[Token]) {
        let mut tokens = run;
        if tokens[0].kind == TokenKind::Pub {
            self.public = true;
            tokens = &tokens[1..];
            if tokens.is_empty() {
                return;
            }
        }

        let first = tokens[0].clone();
        match self.decl_lookup.get(&first.kind).copied() {
            Some(handler) => handler(self, tokens),
            None => self.push_error(ErrorImpl::InvalidSyntax, &first),
        }

        if self.public {
            self.public = false;
            self.push_error(ErrorImpl::DefNotSupportPub, &first);
        }
    }

    /// Takes the pending `pub` modifier.
    pub fn take_public(&mut self) -> bool {
        std::mem::take(&mut self.public)
    }

    /// Confirms that every parameter of every built function carries a type.
    ///
    /// Runs once after the build, over finalized declarations only.
    pub fn check_params(&mut self) {
        let mut missing = Vec::new();
        for decl in &self.ast.decls {
            let params = match decl {
                Decl::Func(func) => func.params.iter().collect::<Vec<_>>(),
                Decl::Trait(t) => t.methods.iter().flat_map(|m| m.params.iter()).collect(),
                Decl::ForeignLink(link) => match &link.item {
                    LinkItem::Fn(func) => func.params.iter().collect(),
                    _ => continue,
                },
                _ => continue,
            };
            for param in params {
                if param.ty.is_none() {
                    missing.push(param.position.clone());
                }
            }
        }
        for position in missing {
            self.push_error_at(ErrorImpl::MissingType, position);
        }
    }

    pub(crate) fn push_comment(&mut self, text: &str) {
        self.ast.order.push(Node::Comment(String::from(text)));
    }
}

/// Parses a token stream into a declaration arena.
///
/// # Arguments
///
/// * `tokens` - Tokens of one compilation unit
/// * `config` - Compiler settings
///
/// # Returns
///
/// The parser, which owns the accumulated diagnostics, and the built AST.
pub fn parse(tokens: Vec<Token>, config: &CompilerConfig) -> (Parser, Ast) {
    let mut parser = Parser::new(tokens, config);
    create_token_lookups(&mut parser);

    parser.build();
    parser.check_params();

    let ast = std::mem::take(&mut parser.ast);
    (parser, ast)
}
