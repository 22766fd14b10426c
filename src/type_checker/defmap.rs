//! Scoped symbol table.
//!
//! Scopes nest as block, function, owner (struct, trait or impl) and file.
//! Lookups walk from the innermost scope outwards and finally consult the
//! side map of an imported module. The side map is searched one level deep
//! only: its own imports are not visible.

use std::collections::HashMap;

use crate::{
    ast::{ast::DeclId, types::Type},
    errors::errors::ErrorImpl,
    Position,
};

use super::constant::Constant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Global,
    Local,
    Func,
    Enum,
    Struct,
    Trait,
    TypeAlias,
}

/// One entry of the symbol table.
#[derive(Debug, Clone)]
pub struct Def {
    pub id: String,
    pub kind: DefKind,
    pub decl: Option<DeclId>,
    /// Value type for variables and functions, the named type otherwise.
    pub ty: Type,
    pub mutable: bool,
    pub constant: Option<Constant>,
    pub is_pub: bool,
    /// Where the definition was declared; its file decides visibility.
    pub position: Position,
}

impl Def {
    pub fn new(id: &str, kind: DefKind, ty: Type, position: Position) -> Self {
        Def {
            id: String::from(id),
            kind,
            decl: None,
            ty,
            mutable: false,
            constant: None,
            is_pub: false,
            position,
        }
    }

    pub fn with_decl(mut self, decl: DeclId) -> Self {
        self.decl = Some(decl);
        self
    }

    pub fn with_pub(mut self, is_pub: bool) -> Self {
        self.is_pub = is_pub;
        self
    }

    pub fn with_mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    pub fn with_constant(mut self, constant: Option<Constant>) -> Self {
        self.constant = constant;
        self
    }
}

/// A non-public definition is visible only from its own directory.
pub fn is_accessible(requester: &Position, def: &Def) -> bool {
    def.is_pub || requester.dir() == def.position.dir()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    File,
    Owner,
    Func,
    Block,
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    defs: HashMap<String, Def>,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Scope {
            kind,
            defs: HashMap::new(),
        }
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy)]
pub struct Found<'a> {
    pub def: &'a Def,
    /// Set when the definition came from the side map of an import.
    pub imported: bool,
}

#[derive(Debug, Clone)]
pub struct Defmap {
    scopes: Vec<Scope>,
    side: Option<Box<Defmap>>,
}

impl Default for Defmap {
    fn default() -> Self {
        Defmap::new()
    }
}

impl Defmap {
    pub fn new() -> Self {
        Defmap {
            scopes: vec![Scope::new(ScopeKind::File)],
            side: None,
        }
    }

    /// Attaches the file-level definitions of an imported module.
    pub fn with_side(mut self, side: Defmap) -> Self {
        self.side = Some(Box::new(side));
        self
    }

    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope::new(kind));
    }

    /// Leaves the innermost scope. The file scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.last().is_some_and(|scope| scope.kind != ScopeKind::File) {
            self.scopes.pop();
        }
    }

    /// Declares `def` in the innermost scope.
    ///
    /// Redeclaring an identifier of the same scope is `exist_id`; shadowing
    /// an identifier of an outer scope is allowed.
    pub fn declare(&mut self, def: Def) -> Result<(), ErrorImpl> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(ErrorImpl::InvalidSyntax);
        };
        if scope.defs.contains_key(&def.id) {
            return Err(ErrorImpl::ExistId { id: def.id });
        }
        scope.defs.insert(def.id.clone(), def);
        Ok(())
    }

    /// Finds `id` as seen from `requester`.
    ///
    /// # Returns
    /// `id_not_exist` when nothing matches, `not_accessible` when the match is
    /// private to another directory.
    pub fn lookup(&self, id: &str, requester: &Position) -> Result<Found<'_>, ErrorImpl> {
        let local = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.defs.get(id));

        let found = match local {
            Some(def) => Found {
                def,
                imported: false,
            },
            None => match self.side.as_ref().and_then(|side| side.file_def(id)) {
                Some(def) => Found {
                    def,
                    imported: true,
                },
                None => {
                    return Err(ErrorImpl::IdNotExist {
                        id: String::from(id),
                    })
                }
            },
        };

        if !is_accessible(requester, found.def) {
            return Err(ErrorImpl::NotAccessible {
                id: String::from(id),
            });
        }
        Ok(found)
    }

    /// Innermost definition of `id`, ignoring visibility and imports.
    pub fn get(&self, id: &str) -> Option<&Def> {
        self.scopes.iter().rev().find_map(|scope| scope.defs.get(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Def> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.defs.get_mut(id))
    }

    /// Definition of the file scope.
    pub fn file_def(&self, id: &str) -> Option<&Def> {
        self.scopes.first().and_then(|scope| scope.defs.get(id))
    }
}
