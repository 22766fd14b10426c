//! Declarations and the arena that owns them.
//!
//! Every top-level and member declaration lives in [`Ast::decls`] and is
//! referred to by its [`DeclId`]. Methods point back at their owning struct
//! through the same ids, so the tree has no ownership cycles.

use std::fmt::Display;

use crate::{type_checker::constant::Constant, Position};

use super::{
    expressions::Expr,
    statements::{Block, Var},
    types::{Param, Type},
};

/// Index into [`Ast::decls`].
pub type DeclId = usize;

#[derive(Debug, Clone)]
pub struct GenericParam {
    pub id: String,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct UseDecl {
    /// `std::a::b`, or the header path of a foreign include.
    pub path: String,
    /// Names inside `{...}`. `self` selects the module itself.
    pub selectors: Vec<String>,
    pub wildcard: bool,
    pub cpp: bool,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct FnDecl {
    pub id: String,
    pub generics: Vec<GenericParam>,
    pub params: Vec<Param>,
    pub ret: Type,
    pub receiver: Option<Param>,
    /// `None` for prototypes.
    pub body: Option<Block>,
    pub is_pub: bool,
    pub is_unsafe: bool,
    pub cpp_linked: bool,
    /// Struct the method belongs to.
    pub owner: Option<DeclId>,
    pub position: Position,
}

impl FnDecl {
    pub fn new(id: String, position: Position) -> Self {
        FnDecl {
            id,
            generics: Vec::new(),
            params: Vec::new(),
            ret: Type::void(),
            receiver: None,
            body: None,
            is_pub: false,
            is_unsafe: false,
            cpp_linked: false,
            owner: None,
            position,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }

    pub fn sig(&self) -> crate::ast::types::FnSig {
        crate::ast::types::FnSig {
            params: self.params.clone(),
            ret: self.ret.clone(),
            is_unsafe: self.is_unsafe,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeAlias {
    pub id: String,
    pub ty: Type,
    pub is_pub: bool,
    pub cpp_linked: bool,
    pub position: Position,
}

impl Display for TypeAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type {}: {}", self.id, self.ty)
    }
}

#[derive(Debug, Clone)]
pub struct EnumItem {
    pub id: String,
    pub expr: Option<Expr>,
    pub value: Option<Constant>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub id: String,
    pub base: Type,
    pub items: Vec<EnumItem>,
    pub is_pub: bool,
    pub position: Position,
}

impl EnumDecl {
    pub fn item(&self, id: &str) -> Option<&EnumItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub id: String,
    pub generics: Vec<GenericParam>,
    pub fields: Vec<Var>,
    pub traits: Vec<DeclId>,
    pub methods: Vec<DeclId>,
    pub is_pub: bool,
    pub cpp_linked: bool,
    pub position: Position,
}

impl StructDecl {
    pub fn field(&self, id: &str) -> Option<&Var> {
        self.fields.iter().find(|field| field.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct TraitDecl {
    pub id: String,
    pub methods: Vec<FnDecl>,
    pub is_pub: bool,
    pub position: Position,
}

impl TraitDecl {
    pub fn has_ref_receiver(&self) -> bool {
        self.methods
            .iter()
            .any(|method| method.receiver.as_ref().is_some_and(|r| r.reference))
    }
}

#[derive(Debug, Clone)]
pub struct ImplDecl {
    /// Trait name with `for`, struct name without.
    pub base: String,
    /// Struct named after `for`.
    pub target: Option<Type>,
    pub methods: Vec<DeclId>,
    pub position: Position,
}

/// Declaration bound to a symbol of the target language.
#[derive(Debug, Clone)]
pub enum LinkItem {
    Fn(FnDecl),
    Var(Var),
    Struct(StructDecl),
    Type(TypeAlias),
}

#[derive(Debug, Clone)]
pub struct ForeignLink {
    pub item: LinkItem,
    pub position: Position,
}

impl ForeignLink {
    pub fn id(&self) -> &str {
        match &self.item {
            LinkItem::Fn(f) => &f.id,
            LinkItem::Var(v) => &v.id,
            LinkItem::Struct(s) => &s.id,
            LinkItem::Type(t) => &t.id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Decl {
    Use(UseDecl),
    Func(FnDecl),
    Var(Var),
    TypeAlias(TypeAlias),
    Enum(EnumDecl),
    Struct(StructDecl),
    Trait(TraitDecl),
    Impl(ImplDecl),
    ForeignLink(ForeignLink),
}

impl Decl {
    /// Identifier the declaration binds, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Decl::Use(_) | Decl::Impl(_) => None,
            Decl::Func(f) => Some(&f.id),
            Decl::Var(v) => Some(&v.id),
            Decl::TypeAlias(t) => Some(&t.id),
            Decl::Enum(e) => Some(&e.id),
            Decl::Struct(s) => Some(&s.id),
            Decl::Trait(t) => Some(&t.id),
            Decl::ForeignLink(l) => Some(l.id()),
        }
    }

    pub fn is_pub(&self) -> bool {
        match self {
            Decl::Use(_) | Decl::Impl(_) | Decl::ForeignLink(_) => false,
            Decl::Func(f) => f.is_pub,
            Decl::Var(v) => v.is_pub,
            Decl::TypeAlias(t) => t.is_pub,
            Decl::Enum(e) => e.is_pub,
            Decl::Struct(s) => s.is_pub,
            Decl::Trait(t) => t.is_pub,
        }
    }

    pub fn position(&self) -> &Position {
        match self {
            Decl::Use(u) => &u.position,
            Decl::Func(f) => &f.position,
            Decl::Var(v) => &v.position,
            Decl::TypeAlias(t) => &t.position,
            Decl::Enum(e) => &e.position,
            Decl::Struct(s) => &s.position,
            Decl::Trait(t) => &t.position,
            Decl::Impl(i) => &i.position,
            Decl::ForeignLink(l) => &l.position,
        }
    }
}

/// Entry of the top-level source order.
#[derive(Debug, Clone)]
pub enum Node {
    Decl(DeclId),
    Comment(String),
}

/// A parsed compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub decls: Vec<Decl>,
    pub order: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn push(&mut self, decl: Decl) -> DeclId {
        self.decls.push(decl);
        self.decls.len() - 1
    }

    /// Pushes a declaration and records it in source order.
    pub fn push_top(&mut self, decl: Decl) -> DeclId {
        let id = self.push(decl);
        self.order.push(Node::Decl(id));
        id
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id)
    }

    pub fn func(&self, id: DeclId) -> Option<&FnDecl> {
        match self.decls.get(id)? {
            Decl::Func(f) => Some(f),
            Decl::ForeignLink(ForeignLink {
                item: LinkItem::Fn(f),
                ..
            }) => Some(f),
            _ => None,
        }
    }

    pub fn func_mut(&mut self, id: DeclId) -> Option<&mut FnDecl> {
        match self.decls.get_mut(id)? {
            Decl::Func(f) => Some(f),
            Decl::ForeignLink(ForeignLink {
                item: LinkItem::Fn(f),
                ..
            }) => Some(f),
            _ => None,
        }
    }

    pub fn structure(&self, id: DeclId) -> Option<&StructDecl> {
        match self.decls.get(id)? {
            Decl::Struct(s) => Some(s),
            Decl::ForeignLink(ForeignLink {
                item: LinkItem::Struct(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    pub fn structure_mut(&mut self, id: DeclId) -> Option<&mut StructDecl> {
        match self.decls.get_mut(id)? {
            Decl::Struct(s) => Some(s),
            Decl::ForeignLink(ForeignLink {
                item: LinkItem::Struct(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    pub fn trait_decl(&self, id: DeclId) -> Option<&TraitDecl> {
        match self.decls.get(id)? {
            Decl::Trait(t) => Some(t),
            _ => None,
        }
    }

    pub fn enum_decl(&self, id: DeclId) -> Option<&EnumDecl> {
        match self.decls.get(id)? {
            Decl::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn var(&self, id: DeclId) -> Option<&Var> {
        match self.decls.get(id)? {
            Decl::Var(v) => Some(v),
            Decl::ForeignLink(ForeignLink {
                item: LinkItem::Var(v),
                ..
            }) => Some(v),
            _ => None,
        }
    }

    pub fn var_mut(&mut self, id: DeclId) -> Option<&mut Var> {
        match self.decls.get_mut(id)? {
            Decl::Var(v) => Some(v),
            Decl::ForeignLink(ForeignLink {
                item: LinkItem::Var(v),
                ..
            }) => Some(v),
            _ => None,
        }
    }

    /// Top-level declarations in source order.
    pub fn top_level(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.order.iter().filter_map(|node| match node {
            Node::Decl(id) => Some(*id),
            Node::Comment(_) => None,
        })
    }
}

fn generics_text(generics: &[GenericParam]) -> String {
    if generics.is_empty() {
        return String::new();
    }
    let ids: Vec<&str> = generics.iter().map(|g| g.id.as_str()).collect();
    format!("[{}]", ids.join(","))
}

impl Display for FnDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_pub {
            write!(f, "pub ")?;
        }
        if self.is_unsafe {
            write!(f, "unsafe ")?;
        }
        write!(f, "fn {}{}(", self.id, generics_text(&self.generics))?;
        let mut params: Vec<String> = Vec::new();
        if let Some(receiver) = &self.receiver {
            params.push(if receiver.reference {
                String::from("&self")
            } else {
                String::from("self")
            });
        }
        params.extend(self.params.iter().map(|p| p.to_string()));
        write!(f, "{})", params.join(", "))?;
        if !self.ret.is_void() {
            write!(f, ": {}", self.ret)?;
        }
        if let Some(body) = &self.body {
            write!(f, " {}", body)?;
        }
        Ok(())
    }
}

impl Display for Decl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decl::Use(u) => {
                if u.cpp {
                    return write!(f, "use cpp {}", u.path);
                }
                write!(f, "use {}", u.path)?;
                if u.wildcard {
                    write!(f, "::*")?;
                } else if !u.selectors.is_empty() {
                    write!(f, "::{{{}}}", u.selectors.join(", "))?;
                }
                Ok(())
            }
            Decl::Func(func) => write!(f, "{}", func),
            Decl::Var(v) => write!(f, "{}", v),
            Decl::TypeAlias(t) => write!(f, "{}", t),
            Decl::Enum(e) => {
                let items: Vec<String> = e
                    .items
                    .iter()
                    .map(|item| match &item.expr {
                        Some(expr) => format!("{} = {}", item.id, expr),
                        None => item.id.clone(),
                    })
                    .collect();
                write!(f, "enum {}: {} {{ {} }}", e.id, e.base, items.join(", "))
            }
            Decl::Struct(s) => {
                let fields: Vec<String> = s
                    .fields
                    .iter()
                    .map(|field| format!("{}: {}", field.id, field.ty()))
                    .collect();
                write!(
                    f,
                    "struct {}{} {{ {} }}",
                    s.id,
                    generics_text(&s.generics),
                    fields.join(", ")
                )
            }
            Decl::Trait(t) => {
                let methods: Vec<String> = t.methods.iter().map(|m| m.to_string()).collect();
                write!(f, "trait {} {{ {} }}", t.id, methods.join("; "))
            }
            Decl::Impl(i) => match &i.target {
                Some(target) => write!(f, "impl {} for {}", i.base, target),
                None => write!(f, "impl {}", i.base),
            },
            Decl::ForeignLink(link) => match &link.item {
                LinkItem::Fn(func) => write!(f, "cpp {}", func),
                LinkItem::Var(v) => write!(f, "cpp {}", v),
                LinkItem::Struct(s) => write!(f, "cpp struct {}", s.id),
                LinkItem::Type(t) => write!(f, "cpp {}", t),
            },
        }
    }
}
