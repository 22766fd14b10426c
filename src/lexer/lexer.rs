use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

#[derive(Clone)]
pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new("^\n").unwrap(), handler: newline_handler },
        RegexPattern { regex: Regex::new("^[ \t\r]+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^//[^\n]*").unwrap(), handler: comment_handler },
        RegexPattern { regex: Regex::new(r"^/\*").unwrap(), handler: block_comment_handler },
        RegexPattern { regex: Regex::new(r#"^"(\\.|[^"\\\n])*""#).unwrap(), handler: literal_handler },
        RegexPattern { regex: Regex::new("^`[^`]*`").unwrap(), handler: literal_handler },
        RegexPattern { regex: Regex::new(r"^'(\\.|[^'\\\n])+'").unwrap(), handler: literal_handler },
        RegexPattern { regex: Regex::new("^0[xX][0-9a-fA-F_]+").unwrap(), handler: literal_handler },
        RegexPattern { regex: Regex::new("^0[bB][01_]+").unwrap(), handler: literal_handler },
        RegexPattern { regex: Regex::new(r"^[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][-+]?[0-9]+)?").unwrap(), handler: literal_handler },
        RegexPattern { regex: Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new(r"^\.\.\.").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "...") },
        RegexPattern { regex: Regex::new("^<<=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "<<=") },
        RegexPattern { regex: Regex::new("^>>=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, ">>=") },
        RegexPattern { regex: Regex::new("^::").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::DoubleColon, "::") },
        RegexPattern { regex: Regex::new("^==").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "==") },
        RegexPattern { regex: Regex::new("^!=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "!=") },
        RegexPattern { regex: Regex::new("^<=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "<=") },
        RegexPattern { regex: Regex::new("^>=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, ">=") },
        RegexPattern { regex: Regex::new("^&&").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "&&") },
        RegexPattern { regex: Regex::new(r"^\|\|").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "||") },
        RegexPattern { regex: Regex::new("^<<").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "<<") },
        RegexPattern { regex: Regex::new("^>>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, ">>") },
        RegexPattern { regex: Regex::new(r"^\+\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "++") },
        RegexPattern { regex: Regex::new("^--").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "--") },
        RegexPattern { regex: Regex::new(r"^\+=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "+=") },
        RegexPattern { regex: Regex::new("^-=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "-=") },
        RegexPattern { regex: Regex::new(r"^\*=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "*=") },
        RegexPattern { regex: Regex::new("^/=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "/=") },
        RegexPattern { regex: Regex::new("^%=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "%=") },
        RegexPattern { regex: Regex::new("^&=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "&=") },
        RegexPattern { regex: Regex::new(r"^\|=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "|=") },
        RegexPattern { regex: Regex::new(r"^\^=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "^=") },
        RegexPattern { regex: Regex::new(r"^\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "+") },
        RegexPattern { regex: Regex::new("^-").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "-") },
        RegexPattern { regex: Regex::new(r"^\*").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "*") },
        RegexPattern { regex: Regex::new("^/").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "/") },
        RegexPattern { regex: Regex::new("^%").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "%") },
        RegexPattern { regex: Regex::new("^&").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "&") },
        RegexPattern { regex: Regex::new(r"^\|").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "|") },
        RegexPattern { regex: Regex::new(r"^\^").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "^") },
        RegexPattern { regex: Regex::new("^!").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "!") },
        RegexPattern { regex: Regex::new("^<").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "<") },
        RegexPattern { regex: Regex::new("^>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, ">") },
        RegexPattern { regex: Regex::new("^=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "=") },
        RegexPattern { regex: Regex::new("^~").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Operator, "~") },
        RegexPattern { regex: Regex::new(r"^\.").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dot, ".") },
        RegexPattern { regex: Regex::new("^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new("^:").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Colon, ":") },
        RegexPattern { regex: Regex::new("^;").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";") },
        RegexPattern { regex: Regex::new(r"^\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Brace, "(") },
        RegexPattern { regex: Regex::new(r"^\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Brace, ")") },
        RegexPattern { regex: Regex::new(r"^\[").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Brace, "[") },
        RegexPattern { regex: Regex::new(r"^\]").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Brace, "]") },
        RegexPattern { regex: Regex::new(r"^\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Brace, "{") },
        RegexPattern { regex: Regex::new(r"^\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Brace, "}") },
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    row: u32,
    line_start: usize,
    file: Rc<String>,
    error: Option<Error>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            row: 1,
            line_start: 0,
            file: file_name,
            error: None,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn position(&self) -> Position {
        Position::new(
            self.row,
            (self.pos - self.line_start + 1) as u32,
            Rc::clone(&self.file),
        )
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at(&self) -> Option<char> {
        self.remainder().chars().next()
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn matched(&self, regex: &Regex) -> String {
        regex
            .find(self.remainder())
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Consumes `text`, keeping the row counter in step with any newlines inside it.
    fn consume_multiline(&mut self, text: &str) {
        for (offset, ch) in text.char_indices() {
            if ch == '\n' {
                self.row += 1;
                self.line_start = self.pos + offset + 1;
            }
        }
        self.advance_n(text.len());
    }
}

fn newline_handler(lexer: &mut Lexer, _regex: &Regex) {
    lexer.advance_n(1);
    lexer.row += 1;
    lexer.line_start = lexer.pos;
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    lexer.advance_n(matched.len());
}

fn comment_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let position = lexer.position();
    lexer.push(MK_TOKEN!(TokenKind::Comment, matched.clone(), position));
    lexer.advance_n(matched.len());
}

fn block_comment_handler(lexer: &mut Lexer, _regex: &Regex) {
    let position = lexer.position();
    match lexer.remainder().find("*/") {
        Some(end) => {
            let text = lexer.remainder()[..end + 2].to_string();
            lexer.push(MK_TOKEN!(TokenKind::Comment, text.clone(), position));
            lexer.consume_multiline(&text);
        }
        None => {
            lexer.error = Some(Error::new(ErrorImpl::MissingBlockComment, position));
            lexer.pos = lexer.source.len();
        }
    }
}

fn literal_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let position = lexer.position();
    lexer.push(MK_TOKEN!(TokenKind::Literal, matched.clone(), position));
    lexer.consume_multiline(&matched);
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let value = lexer.matched(regex);
    let position = lexer.position();
    let kind = RESERVED_LOOKUP
        .get(value.as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier);

    lexer.push(MK_TOKEN!(kind, value.clone(), position));
    lexer.advance_n(value.len());
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let mut matched = false;

        for pattern in PATTERNS.iter() {
            if pattern.regex.is_match(lex.remainder()) {
                (pattern.handler)(&mut lex, &pattern.regex);
                matched = true;
                break;
            }
        }

        if let Some(error) = lex.error.take() {
            return Err(error);
        }

        if !matched {
            let token = lex.at().map(String::from).unwrap_or_default();
            return Err(Error::new(
                ErrorImpl::UnrecognisedToken { token },
                lex.position(),
            ));
        }
    }

    Ok(lex.tokens)
}
