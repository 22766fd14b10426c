use std::fmt::Display;

use crate::{lexer::tokens::LiteralClass, type_checker::constant::Constant, Position};

use super::types::Type;

/// An expression node together with the annotations the type checker fills in.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
    pub resolved: Option<Type>,
    pub constant: Option<Constant>,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal {
        value: String,
        class: LiteralClass,
    },
    Ident(String),
    SelfRef,
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// `f(a)` or `f[T](a)`.
    Call {
        callee: Box<Expr>,
        generics: Vec<Type>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Slicing {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
    /// `a.b`, or `a::b` when `namespace` is set.
    Selector {
        target: Box<Expr>,
        member: String,
        namespace: bool,
    },
    /// `[a, b]` or `[]T{a, b}`. An untyped literal takes its type from context.
    Composite {
        ty: Option<Type>,
        elements: Vec<Expr>,
    },
    MapLiteral {
        ty: Type,
        pairs: Vec<(Expr, Expr)>,
    },
    StructLit {
        ty: Type,
        args: Vec<Expr>,
    },
    /// `(T)(expr)`
    Cast {
        ty: Type,
        expr: Box<Expr>,
    },
    Invalid,
}

impl Expr {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Expr {
            kind,
            position,
            resolved: None,
            constant: None,
        }
    }

    pub fn invalid(position: Position) -> Self {
        Expr::new(ExprKind::Invalid, position)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.kind, ExprKind::Invalid)
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. })
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(id) => Some(id),
            _ => None,
        }
    }

    /// Resolved type, or void when the expression has not been resolved.
    pub fn ty(&self) -> Type {
        self.resolved.clone().unwrap_or_else(Type::void)
    }
}

fn join(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(|expr| expr.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Literal { value, .. } => write!(f, "{}", value),
            ExprKind::Ident(id) => write!(f, "{}", id),
            ExprKind::SelfRef => write!(f, "self"),
            ExprKind::Unary { op, operand } => write!(f, "{}{}", op, operand),
            ExprKind::Binary { left, op, right } => write!(f, "({} {} {})", left, op, right),
            ExprKind::Paren(inner) => write!(f, "({})", inner),
            ExprKind::Call {
                callee,
                generics,
                args,
            } => {
                write!(f, "{}", callee)?;
                if !generics.is_empty() {
                    let kinds: Vec<&str> = generics.iter().map(|ty| ty.kind.as_str()).collect();
                    write!(f, "[{}]", kinds.join(","))?;
                }
                write!(f, "({})", join(args))
            }
            ExprKind::Index { target, index } => write!(f, "{}[{}]", target, index),
            ExprKind::Slicing { target, start, end } => {
                write!(f, "{}[", target)?;
                if let Some(start) = start {
                    write!(f, "{}", start)?;
                }
                write!(f, ":")?;
                if let Some(end) = end {
                    write!(f, "{}", end)?;
                }
                write!(f, "]")
            }
            ExprKind::Selector {
                target,
                member,
                namespace,
            } => {
                if *namespace {
                    write!(f, "{}::{}", target, member)
                } else {
                    write!(f, "{}.{}", target, member)
                }
            }
            ExprKind::Composite { ty, elements } => match ty {
                Some(ty) => write!(f, "{}{{{}}}", ty, join(elements)),
                None => write!(f, "[{}]", join(elements)),
            },
            ExprKind::MapLiteral { ty, pairs } => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{}{{{}}}", ty, pairs.join(", "))
            }
            ExprKind::StructLit { ty, args } => write!(f, "{}{{{}}}", ty, join(args)),
            ExprKind::Cast { ty, expr } => write!(f, "({})({})", ty, expr),
            ExprKind::Invalid => write!(f, "<invalid>"),
        }
    }
}
