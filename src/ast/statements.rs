use std::fmt::Display;

use crate::Position;

use super::{ast::TypeAlias, expressions::Expr, types::Type};

/// A variable or constant, either global, local, a struct field or a loop key.
#[derive(Debug, Clone)]
pub struct Var {
    pub id: String,
    /// Declared type annotation.
    pub ty: Option<Type>,
    pub init: Option<Expr>,
    pub mutable: bool,
    pub is_const: bool,
    pub is_pub: bool,
    pub cpp_linked: bool,
    pub position: Position,
    /// Final type after checking.
    pub resolved: Option<Type>,
}

impl Var {
    pub fn new(id: String, position: Position) -> Self {
        Var {
            id,
            ty: None,
            init: None,
            mutable: false,
            is_const: false,
            is_pub: false,
            cpp_linked: false,
            position,
            resolved: None,
        }
    }

    pub fn ty(&self) -> Type {
        self.resolved
            .clone()
            .or_else(|| self.ty.clone())
            .unwrap_or_else(Type::void)
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        } else {
            write!(f, "let ")?;
        }
        if self.mutable {
            write!(f, "mut ")?;
        }
        write!(f, "{}", self.id)?;
        if let Some(ty) = self.resolved.as_ref().or(self.ty.as_ref()) {
            write!(f, ": {}", ty)?;
        }
        if let Some(init) = &self.init {
            write!(f, " = {}", init)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub is_unsafe: bool,
    pub deferred: bool,
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unsafe {
            write!(f, "unsafe ")?;
        }
        if self.deferred {
            write!(f, "defer ")?;
        }
        if self.stmts.is_empty() {
            return write!(f, "{{}}");
        }
        let stmts: Vec<String> = self.stmts.iter().map(|stmt| stmt.to_string()).collect();
        write!(f, "{{ {} }}", stmts.join("; "))
    }
}

/// One selector on the left of an assignment.
#[derive(Debug, Clone)]
pub struct AssignTarget {
    pub expr: Expr,
    /// Set when the selector declares a new variable.
    pub var: Option<Var>,
}

impl AssignTarget {
    pub fn is_ignored(&self) -> bool {
        self.var.is_none() && self.expr.ident() == Some(crate::lexer::tokens::IGNORE_ID)
    }
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub targets: Vec<AssignTarget>,
    pub op: String,
    pub values: Vec<Expr>,
    /// `let (a, b) = ...`
    pub declares: bool,
}

impl Assign {
    pub fn is_postfix(&self) -> bool {
        self.op == "++" || self.op == "--"
    }
}

#[derive(Debug, Clone)]
pub struct IfBranch {
    pub cond: Expr,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct Conditional {
    pub if_: IfBranch,
    pub elifs: Vec<IfBranch>,
    pub default: Option<Block>,
}

#[derive(Debug, Clone)]
pub enum LoopProfile {
    /// `for {}`, `for cond {}` or `for cond; next {}`.
    While {
        cond: Option<Expr>,
        next: Option<Box<Stmt>>,
    },
    /// `for a, b in expr {}`
    ForEach { key_a: Var, key_b: Var, expr: Expr },
    /// `for init; cond; post {}`
    CStyle {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
    },
}

#[derive(Debug, Clone)]
pub struct Loop {
    pub profile: LoopProfile,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub exprs: Vec<Expr>,
    /// Case types of a `match type` statement.
    pub types: Vec<Type>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct Match {
    pub subject: Option<Expr>,
    pub type_match: bool,
    pub cases: Vec<Case>,
    pub default: Option<Block>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
    pub terminated: bool,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Var(Var),
    Assign(Assign),
    Return(Vec<Expr>),
    Break(Option<String>),
    Continue(Option<String>),
    If(Conditional),
    Loop(Loop),
    Match(Match),
    Label(String),
    Goto(String),
    Fall,
    /// `co f()`
    Spawn(Expr),
    Block(Block),
    TypeAlias(TypeAlias),
    Comment(String),
}

impl Stmt {
    pub fn new(kind: StmtKind, position: Position) -> Self {
        Stmt {
            kind,
            position,
            terminated: false,
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            StmtKind::Expr(expr) => write!(f, "{}", expr),
            StmtKind::Var(var) => write!(f, "{}", var),
            StmtKind::Assign(assign) => {
                let targets: Vec<String> = assign
                    .targets
                    .iter()
                    .map(|target| match &target.var {
                        Some(var) => var.to_string(),
                        None => target.expr.to_string(),
                    })
                    .collect();
                if assign.is_postfix() {
                    return write!(f, "{}{}", targets.join(", "), assign.op);
                }
                let values: Vec<String> = assign.values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} {} {}", targets.join(", "), assign.op, values.join(", "))
            }
            StmtKind::Return(values) => {
                if values.is_empty() {
                    return write!(f, "ret");
                }
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "ret {}", values.join(", "))
            }
            StmtKind::Break(label) => match label {
                Some(label) => write!(f, "break {}", label),
                None => write!(f, "break"),
            },
            StmtKind::Continue(label) => match label {
                Some(label) => write!(f, "continue {}", label),
                None => write!(f, "continue"),
            },
            StmtKind::If(cond) => {
                write!(f, "if {} {}", cond.if_.cond, cond.if_.body)?;
                for elif in &cond.elifs {
                    write!(f, " else if {} {}", elif.cond, elif.body)?;
                }
                if let Some(default) = &cond.default {
                    write!(f, " else {}", default)?;
                }
                Ok(())
            }
            StmtKind::Loop(l) => match &l.profile {
                LoopProfile::While { cond, next } => {
                    write!(f, "for ")?;
                    if let Some(cond) = cond {
                        write!(f, "{} ", cond)?;
                    }
                    if let Some(next) = next {
                        write!(f, "; {} ", next)?;
                    }
                    write!(f, "{}", l.body)
                }
                LoopProfile::ForEach { key_a, key_b, expr } => {
                    write!(f, "for {}, {} in {} {}", key_a.id, key_b.id, expr, l.body)
                }
                LoopProfile::CStyle { init, cond, post } => {
                    write!(f, "for ")?;
                    if let Some(init) = init {
                        write!(f, "{}", init)?;
                    }
                    write!(f, "; ")?;
                    if let Some(cond) = cond {
                        write!(f, "{}", cond)?;
                    }
                    write!(f, "; ")?;
                    if let Some(post) = post {
                        write!(f, "{} ", post)?;
                    }
                    write!(f, "{}", l.body)
                }
            },
            StmtKind::Match(m) => {
                write!(f, "match ")?;
                if m.type_match {
                    write!(f, "type ")?;
                }
                if let Some(subject) = &m.subject {
                    write!(f, "{} ", subject)?;
                }
                write!(f, "{{")?;
                for case in &m.cases {
                    let mut items: Vec<String> = case.exprs.iter().map(|e| e.to_string()).collect();
                    items.extend(case.types.iter().map(|t| t.to_string()));
                    write!(f, " | {}: {}", items.join(" | "), case.body)?;
                }
                if let Some(default) = &m.default {
                    write!(f, " | : {}", default)?;
                }
                write!(f, " }}")
            }
            StmtKind::Label(label) => write!(f, "{}:", label),
            StmtKind::Goto(label) => write!(f, "goto {}", label),
            StmtKind::Fall => write!(f, "fall"),
            StmtKind::Spawn(expr) => write!(f, "co {}", expr),
            StmtKind::Block(block) => write!(f, "{}", block),
            StmtKind::TypeAlias(alias) => write!(f, "{}", alias),
            StmtKind::Comment(text) => write!(f, "{}", text),
        }
    }
}
