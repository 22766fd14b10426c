//! Semantic analysis over the declaration arena.
//!
//! Checking runs in passes so that declarations may refer to each other
//! regardless of source order:
//!
//! - collect top-level identifiers into the file scope
//! - attach `impl` blocks to their structs
//! - resolve aliases, enums, struct fields and every signature
//! - check globals, then function bodies
//! - check the bodies of every generic instantiation requested on the way

use std::collections::HashSet;

use crate::{
    ast::{
        ast::{Ast, Decl, DeclId, EnumDecl, GenericParam, ImplDecl, LinkItem, StructDecl, TraitDecl, UseDecl},
        expressions::{Expr, ExprKind},
        statements::{Block, LoopProfile, StmtKind, Var},
        types::{ArraySize, EnumRef, FnSig, Param, StructRef, TraitRef, Type, TypeCategory, TypeTag},
    },
    config::CompilerConfig,
    errors::errors::{Diagnostics, ErrorImpl},
    lexer::tokens::LiteralClass,
    Position,
};

use super::{
    constant::{range_assignable, Constant},
    defmap::{Def, DefKind, Defmap, ScopeKind},
    generics, solver,
};

const MAX_ALIAS_DEPTH: usize = 32;

/// A generic function or struct method checked with concrete types.
#[derive(Debug, Clone)]
pub struct Instance {
    pub decl: DeclId,
    pub generics: Vec<Type>,
    /// Checked copy of the body for this instantiation.
    pub body: Option<Block>,
}

impl Instance {
    fn matches(&self, decl: DeclId, generics: &[Type]) -> bool {
        self.decl == decl
            && self.generics.len() == generics.len()
            && self.generics.iter().zip(generics).all(|(a, b)| a.equals(b))
    }
}

/// Per-function context while a body is checked.
#[derive(Debug)]
pub(super) struct FnFrame {
    pub ret: Type,
    pub labels: HashSet<String>,
}

#[derive(Debug)]
pub struct TypeChecker {
    pub config: CompilerConfig,
    pub defmap: Defmap,
    /// Resolved locations of `use std::...` declarations.
    pub imports: Vec<String>,
    /// Headers named by `use cpp`.
    pub includes: Vec<String>,
    /// Generic function instantiations, in request order.
    pub fn_instances: Vec<Instance>,
    /// Generic struct instantiations. Method bodies checked for each of them
    /// are stored in `method_instances`.
    pub struct_instances: Vec<Instance>,
    pub method_instances: Vec<Instance>,
    pending_fns: Vec<usize>,
    pending_structs: Vec<usize>,
    diagnostics: Diagnostics,
    pub(super) generic_scope: Vec<(String, Type)>,
    pub(super) frames: Vec<FnFrame>,
    pub(super) unsafe_depth: usize,
    alias_depth: usize,
}

/// Checks a parsed compilation unit.
///
/// Annotation fields of the tree (resolved types, constants, enum values,
/// struct traits and method owners) are filled in place.
///
/// # Arguments
/// * `ast` - The parsed unit
/// * `config` - Compiler settings, the same the parser was given
///
/// # Returns
/// The checker, holding the symbol table and instantiations, and the diagnostics.
pub fn type_check(ast: &mut Ast, config: &CompilerConfig) -> (TypeChecker, Diagnostics) {
    let mut checker = TypeChecker::new(config, None);
    checker.check(ast);
    let diagnostics = checker.take_diagnostics();
    (checker, diagnostics)
}

/// Same as [`type_check`], with the file-level definitions of an imported
/// module visible as a fallback scope.
pub fn type_check_with_imports(
    ast: &mut Ast,
    config: &CompilerConfig,
    imported: Defmap,
) -> (TypeChecker, Diagnostics) {
    let mut checker = TypeChecker::new(config, Some(imported));
    checker.check(ast);
    let diagnostics = checker.take_diagnostics();
    (checker, diagnostics)
}

pub(super) fn is_concrete(ty: &Type) -> bool {
    ty.category != TypeCategory::Named
        && ty.generics.iter().all(is_concrete)
        && ty.component.as_ref().map_or(true, |component| is_concrete(component))
        && ty.multi.as_ref().map_or(true, |types| types.iter().all(is_concrete))
        && match &ty.tag {
            TypeTag::Map(key, value) => is_concrete(key) && is_concrete(value),
            TypeTag::Fn(sig) => {
                is_concrete(&sig.ret)
                    && sig
                        .params
                        .iter()
                        .all(|param| param.ty.as_ref().map_or(true, is_concrete))
            }
            _ => true,
        }
}

pub(super) fn bool_type(position: Position) -> Type {
    Type::primitive("bool", TypeCategory::Bool, position)
}

pub(super) fn struct_type(id: DeclId, decl: &StructDecl) -> Type {
    let mut ty = Type::named(&decl.id, Vec::new(), decl.position.clone());
    ty.category = TypeCategory::Struct;
    ty.cpp_linked = decl.cpp_linked;
    ty.tag = TypeTag::Struct(StructRef {
        decl: id,
        file: decl.position.file.clone(),
        traits: decl.traits.clone(),
    });
    ty.refresh_kind();
    ty
}

fn trait_type(id: DeclId, decl: &TraitDecl) -> Type {
    let mut ty = Type::named(&decl.id, Vec::new(), decl.position.clone());
    ty.category = TypeCategory::Trait;
    ty.tag = TypeTag::Trait(TraitRef {
        decl: id,
        has_ref_receiver: decl.has_ref_receiver(),
    });
    ty.refresh_kind();
    ty
}

fn enum_type(id: DeclId, decl: &EnumDecl) -> Type {
    let mut ty = Type::named(&decl.id, Vec::new(), decl.position.clone());
    ty.category = TypeCategory::Enum;
    ty.tag = TypeTag::Enum(EnumRef {
        decl: id,
        base: Box::new(decl.base.clone()),
    });
    ty.refresh_kind();
    ty
}

fn alias_type(ast: &Ast, id: DeclId) -> Option<Type> {
    match ast.get(id)? {
        Decl::TypeAlias(alias) => Some(alias.ty.clone()),
        Decl::ForeignLink(link) => match &link.item {
            LinkItem::Type(alias) => Some(alias.ty.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn next_enum_value(previous: Option<&Constant>, category: TypeCategory) -> Constant {
    let value = previous
        .and_then(|constant| constant.as_i128())
        .map(|v| v + 1)
        .unwrap_or(0);
    if category.is_unsigned() {
        Constant::Uint(value as u64)
    } else {
        Constant::Int(value as i64)
    }
}

/// Whether the block returns on every path that reaches its end.
fn returns(block: &Block) -> bool {
    let last = block
        .stmts
        .iter()
        .rev()
        .find(|stmt| !matches!(stmt.kind, StmtKind::Comment(_)));
    let Some(last) = last else {
        return false;
    };
    match &last.kind {
        StmtKind::Return(_) | StmtKind::Goto(_) => true,
        StmtKind::Block(inner) => returns(inner),
        StmtKind::If(cond) => {
            cond.default.as_ref().is_some_and(returns)
                && returns(&cond.if_.body)
                && cond.elifs.iter().all(|elif| returns(&elif.body))
        }
        StmtKind::Match(m) => {
            m.default.as_ref().is_some_and(returns) && m.cases.iter().all(|case| returns(&case.body))
        }
        StmtKind::Loop(l) => matches!(l.profile, LoopProfile::While { cond: None, .. }),
        _ => false,
    }
}

fn collect_labels(block: &Block, labels: &mut HashSet<String>) {
    for stmt in &block.stmts {
        match &stmt.kind {
            StmtKind::Label(label) => {
                labels.insert(label.clone());
            }
            StmtKind::Block(inner) => collect_labels(inner, labels),
            StmtKind::If(cond) => {
                collect_labels(&cond.if_.body, labels);
                for elif in &cond.elifs {
                    collect_labels(&elif.body, labels);
                }
                if let Some(default) = &cond.default {
                    collect_labels(default, labels);
                }
            }
            StmtKind::Loop(l) => collect_labels(&l.body, labels),
            StmtKind::Match(m) => {
                for case in &m.cases {
                    collect_labels(&case.body, labels);
                }
                if let Some(default) = &m.default {
                    collect_labels(default, labels);
                }
            }
            _ => {}
        }
    }
}

impl TypeChecker {
    pub fn new(config: &CompilerConfig, imported: Option<Defmap>) -> Self {
        let defmap = match imported {
            Some(side) => Defmap::new().with_side(side),
            None => Defmap::new(),
        };
        TypeChecker {
            config: config.clone(),
            defmap,
            imports: Vec::new(),
            includes: Vec::new(),
            fn_instances: Vec::new(),
            struct_instances: Vec::new(),
            method_instances: Vec::new(),
            pending_fns: Vec::new(),
            pending_structs: Vec::new(),
            diagnostics: Diagnostics::new(),
            generic_scope: Vec::new(),
            frames: Vec::new(),
            unsafe_depth: 0,
            alias_depth: 0,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    pub(super) fn push_error(&mut self, error: ErrorImpl, position: &Position) {
        self.diagnostics.push_error(error, position.clone());
    }

    pub(super) fn declare(&mut self, def: Def) {
        let position = def.position.clone();
        if let Err(error) = self.defmap.declare(def) {
            self.push_error(error, &position);
        }
    }

    pub(super) fn unsafe_allowed(&self) -> bool {
        self.config.allow_unsafe || self.unsafe_depth > 0
    }

    pub fn check(&mut self, ast: &mut Ast) {
        self.collect(ast);
        self.register_builtins();
        self.attach_impls(ast);
        self.check_aliases(ast);
        self.check_enums(ast);
        self.check_structs(ast);
        self.check_traits(ast);
        self.check_signatures(ast);
        self.check_globals(ast);
        self.check_bodies(ast);
    }

    /// `out` and `outln` print any value. A user definition with the same
    /// name takes precedence.
    fn register_builtins(&mut self) {
        for id in ["out", "outln"] {
            if self.defmap.file_def(id).is_some() {
                continue;
            }
            let mut param = Param::new(String::from("v"), Position::null());
            param.ty = Some(Type::primitive("any", TypeCategory::Any, Position::null()));
            let ty = Type::func(
                FnSig {
                    params: vec![param],
                    ret: Type::void(),
                    is_unsafe: false,
                },
                Position::null(),
            );
            let def = Def::new(id, DefKind::Func, ty, Position::null()).with_pub(true);
            self.declare(def);
        }
    }

    fn collect(&mut self, ast: &Ast) {
        for id in ast.top_level() {
            let Some(decl) = ast.get(id) else {
                continue;
            };
            let def = match decl {
                Decl::Use(use_decl) => {
                    self.collect_use(use_decl);
                    continue;
                }
                Decl::Impl(_) => continue,
                Decl::Func(f) => Def::new(&f.id, DefKind::Func, Type::void(), f.position.clone()).with_pub(f.is_pub),
                Decl::Var(v) => Def::new(&v.id, DefKind::Global, Type::void(), v.position.clone())
                    .with_pub(v.is_pub)
                    .with_mutable(v.mutable),
                Decl::TypeAlias(t) => Def::new(&t.id, DefKind::TypeAlias, t.ty.clone(), t.position.clone()).with_pub(t.is_pub),
                Decl::Enum(e) => Def::new(&e.id, DefKind::Enum, enum_type(id, e), e.position.clone()).with_pub(e.is_pub),
                Decl::Struct(s) => Def::new(&s.id, DefKind::Struct, struct_type(id, s), s.position.clone()).with_pub(s.is_pub),
                Decl::Trait(t) => Def::new(&t.id, DefKind::Trait, trait_type(id, t), t.position.clone()).with_pub(t.is_pub),
                Decl::ForeignLink(link) => match &link.item {
                    LinkItem::Fn(f) => Def::new(&f.id, DefKind::Func, Type::void(), f.position.clone()).with_pub(f.is_pub),
                    LinkItem::Var(v) => Def::new(&v.id, DefKind::Global, Type::void(), v.position.clone())
                        .with_pub(v.is_pub)
                        .with_mutable(v.mutable),
                    LinkItem::Struct(s) => {
                        Def::new(&s.id, DefKind::Struct, struct_type(id, s), s.position.clone()).with_pub(s.is_pub)
                    }
                    LinkItem::Type(t) => {
                        Def::new(&t.id, DefKind::TypeAlias, t.ty.clone(), t.position.clone()).with_pub(t.is_pub)
                    }
                },
            };
            self.declare(def.with_decl(id));
        }
    }

    fn collect_use(&mut self, use_decl: &UseDecl) {
        if use_decl.cpp {
            if !self.includes.contains(&use_decl.path) {
                self.includes.push(use_decl.path.clone());
            }
            return;
        }
        let path = self.config.std_path(&use_decl.path);
        if !self.imports.contains(&path) {
            self.imports.push(path);
        }
    }

    /// Finds a file-level declaration of the given kind in this unit.
    fn lookup_decl(&mut self, id: &str, kind: DefKind, position: &Position) -> Option<DeclId> {
        let found = match self.defmap.lookup(id, position) {
            Ok(found) => found,
            Err(error) => {
                self.push_error(error, position);
                return None;
            }
        };
        if found.def.kind != kind || found.imported {
            self.push_error(
                ErrorImpl::IdNotExist {
                    id: String::from(id),
                },
                position,
            );
            return None;
        }
        found.def.decl
    }

    fn attach_impls(&mut self, ast: &mut Ast) {
        let impls: Vec<ImplDecl> = ast
            .top_level()
            .filter_map(|id| match ast.get(id) {
                Some(Decl::Impl(i)) => Some(i.clone()),
                _ => None,
            })
            .collect();

        for imp in impls {
            let struct_name = imp
                .target
                .as_ref()
                .map(|target| target.ident.clone())
                .unwrap_or_else(|| imp.base.clone());
            let Some(struct_id) = self.lookup_decl(&struct_name, DefKind::Struct, &imp.position) else {
                continue;
            };

            if imp.target.is_some() {
                let Some(trait_id) = self.lookup_decl(&imp.base, DefKind::Trait, &imp.position) else {
                    continue;
                };
                self.implement_trait(ast, struct_id, trait_id, &imp);
                if let Some(structure) = ast.structure_mut(struct_id) {
                    if !structure.traits.contains(&trait_id) {
                        structure.traits.push(trait_id);
                    }
                }
                if let Some(def) = self.defmap.get_mut(&struct_name) {
                    if let TypeTag::Struct(struct_ref) = &mut def.ty.tag {
                        if !struct_ref.traits.contains(&trait_id) {
                            struct_ref.traits.push(trait_id);
                        }
                    }
                }
            }

            for method_id in imp.methods {
                let Some(method) = ast.func(method_id) else {
                    continue;
                };
                let (name, position) = (method.id.clone(), method.position.clone());
                let Some(structure) = ast.structure(struct_id) else {
                    continue;
                };
                let taken = structure.field(&name).is_some()
                    || structure
                        .methods
                        .iter()
                        .any(|m| ast.func(*m).is_some_and(|m| m.id == name));
                if taken {
                    self.push_error(ErrorImpl::ExistId { id: name }, &position);
                    continue;
                }
                if let Some(method) = ast.func_mut(method_id) {
                    method.owner = Some(struct_id);
                }
                if let Some(structure) = ast.structure_mut(struct_id) {
                    structure.methods.push(method_id);
                }
            }
        }
    }

    /// Every trait method needs an implementation in the `impl` block.
    fn implement_trait(&mut self, ast: &Ast, struct_id: DeclId, trait_id: DeclId, imp: &ImplDecl) {
        let Some(trait_decl) = ast.trait_decl(trait_id) else {
            return;
        };
        for method in &trait_decl.methods {
            let implemented = imp
                .methods
                .iter()
                .any(|m| ast.func(*m).is_some_and(|m| m.id == method.id));
            if !implemented {
                let owner = ast.structure(struct_id).map(|s| s.id.clone()).unwrap_or_default();
                self.push_error(
                    ErrorImpl::MemberNotExist {
                        id: format!("{}.{}", owner, method.id),
                    },
                    &imp.position,
                );
            }
        }
    }

    fn check_aliases(&mut self, ast: &Ast) {
        for id in ast.top_level() {
            let Some(alias) = alias_type(ast, id) else {
                continue;
            };
            let Some(name) = ast.get(id).and_then(|decl| decl.id()).map(String::from) else {
                continue;
            };
            if let Some(resolved) = self.resolve_type(ast, &alias) {
                if let Some(def) = self.defmap.get_mut(&name) {
                    def.ty = resolved;
                }
            }
        }
    }

    fn check_enums(&mut self, ast: &mut Ast) {
        let ids: Vec<DeclId> = ast.top_level().filter(|id| ast.enum_decl(*id).is_some()).collect();

        for id in ids {
            let Some(mut decl) = ast.enum_decl(id).cloned() else {
                continue;
            };
            let Some(base) = self.resolve_type(ast, &decl.base) else {
                continue;
            };
            let is_str = base.category == TypeCategory::Str && base.prefix.is_empty();
            if !is_str && !(base.is_numeric() && base.category.is_integer()) {
                self.push_error(
                    ErrorImpl::IncompatibleTypes {
                        expected: String::from("integer"),
                        received: base.kind.clone(),
                    },
                    &base.position,
                );
                continue;
            }

            let mut previous: Option<Constant> = None;
            for item in decl.items.iter_mut() {
                let value = match item.expr.as_mut() {
                    Some(expr) => {
                        if self.check_expr(ast, expr, Some(&base)).is_none() {
                            continue;
                        }
                        match expr.constant.clone() {
                            Some(constant) => constant,
                            None => {
                                self.push_error(ErrorImpl::ExprNotConst, &expr.position);
                                continue;
                            }
                        }
                    }
                    None if is_str => Constant::Str(item.id.clone()),
                    None => next_enum_value(previous.as_ref(), base.category),
                };

                let value = if is_str {
                    if !matches!(value, Constant::Str(_)) {
                        self.push_error(
                            ErrorImpl::IncompatibleTypes {
                                expected: base.kind.clone(),
                                received: value.to_string(),
                            },
                            &item.position,
                        );
                        continue;
                    }
                    value
                } else {
                    if !range_assignable(&value, &base) {
                        self.push_error(ErrorImpl::OverflowLimits, &item.position);
                        continue;
                    }
                    value.convert(base.category)
                };
                previous = Some(value.clone());
                item.value = Some(value);
            }

            decl.base = base;
            let ty = enum_type(id, &decl);
            if let Some(def) = self.defmap.get_mut(&decl.id) {
                def.ty = ty;
            }
            if let Some(Decl::Enum(slot)) = ast.decls.get_mut(id) {
                *slot = decl;
            }
        }
    }

    pub(super) fn push_generic_params(&mut self, params: &[GenericParam]) {
        for param in params {
            let placeholder = Type::named(&param.id, Vec::new(), param.position.clone());
            self.generic_scope.push((param.id.clone(), placeholder));
        }
    }

    fn bind_generics(&mut self, params: &[GenericParam], args: &[Type]) {
        for (param, arg) in params.iter().zip(args) {
            self.generic_scope.push((param.id.clone(), arg.clone()));
        }
    }

    fn check_structs(&mut self, ast: &mut Ast) {
        let ids: Vec<DeclId> = (0..ast.decls.len()).filter(|id| ast.structure(*id).is_some()).collect();

        for id in ids {
            let Some(decl) = ast.structure(id) else {
                continue;
            };
            let generics = decl.generics.clone();
            let mut fields = decl.fields.clone();

            let mark = self.generic_scope.len();
            self.push_generic_params(&generics);
            for field in fields.iter_mut() {
                let Some(declared) = field.ty.as_ref() else {
                    self.push_error(ErrorImpl::MissingType, &field.position);
                    continue;
                };
                let Some(ty) = self.resolve_type(ast, declared) else {
                    continue;
                };
                if let Some(init) = field.init.as_mut() {
                    if self.check_expr(ast, init, Some(&ty)).is_some() {
                        self.check_assign(&ty, init);
                    }
                }
                field.resolved = Some(ty);
            }
            self.generic_scope.truncate(mark);

            if let Some(structure) = ast.structure_mut(id) {
                structure.fields = fields;
            }
        }
    }

    fn resolve_sig(&mut self, ast: &Ast, params: &mut [Param], ret: &mut Type, receiver: Option<&mut Param>) {
        for param in params.iter_mut().chain(receiver) {
            let Some(ty) = param.ty.as_ref() else {
                self.push_error(ErrorImpl::MissingType, &param.position);
                continue;
            };
            if let Some(resolved) = self.resolve_type(ast, ty) {
                param.ty = Some(resolved);
            }
        }
        if let Some(resolved) = self.resolve_type(ast, ret) {
            *ret = resolved;
        }
    }

    fn check_traits(&mut self, ast: &mut Ast) {
        let ids: Vec<DeclId> = ast.top_level().filter(|id| ast.trait_decl(*id).is_some()).collect();

        for id in ids {
            let Some(mut decl) = ast.trait_decl(id).cloned() else {
                continue;
            };
            for method in decl.methods.iter_mut() {
                self.resolve_sig(ast, &mut method.params, &mut method.ret, None);
            }
            if let Some(Decl::Trait(slot)) = ast.decls.get_mut(id) {
                *slot = decl;
            }
        }
    }

    fn check_signatures(&mut self, ast: &mut Ast) {
        for id in 0..ast.decls.len() {
            let Some(func) = ast.func(id) else {
                continue;
            };
            let mut params = func.params.clone();
            let mut ret = func.ret.clone();
            let mut receiver = func.receiver.clone();
            let is_unsafe = func.is_unsafe;
            let name = func.id.clone();
            let is_method = func.owner.is_some() || func.receiver.is_some();
            let owner_generics = func
                .owner
                .and_then(|owner| ast.structure(owner))
                .map(|owner| owner.generics.clone())
                .unwrap_or_default();
            let fn_generics = func.generics.clone();

            // Receivers of generic struct methods are written without the
            // struct's generics.
            if let Some(receiver_ty) = receiver.as_mut().and_then(|r| r.ty.as_mut()) {
                if receiver_ty.generics.is_empty() && !owner_generics.is_empty() {
                    receiver_ty.generics = owner_generics
                        .iter()
                        .map(|g| Type::named(&g.id, Vec::new(), g.position.clone()))
                        .collect();
                    receiver_ty.refresh_kind();
                }
            }

            let mark = self.generic_scope.len();
            self.push_generic_params(&owner_generics);
            self.push_generic_params(&fn_generics);
            if is_unsafe {
                self.unsafe_depth += 1;
            }
            self.resolve_sig(ast, &mut params, &mut ret, receiver.as_mut());
            if is_unsafe {
                self.unsafe_depth -= 1;
            }
            self.generic_scope.truncate(mark);

            let Some(func) = ast.func_mut(id) else {
                continue;
            };
            func.params = params;
            func.ret = ret;
            func.receiver = receiver;
            let ty = Type::func(func.sig(), func.position.clone());

            if !is_method {
                if let Some(def) = self.defmap.get_mut(&name) {
                    if def.decl == Some(id) {
                        def.ty = ty;
                    }
                }
            }
        }
    }

    fn check_globals(&mut self, ast: &mut Ast) {
        let ids: Vec<DeclId> = ast.top_level().filter(|id| ast.var(*id).is_some()).collect();

        for id in ids {
            let Some(mut var) = ast.var(id).cloned() else {
                continue;
            };
            let checked = if var.cpp_linked {
                var.ty
                    .as_ref()
                    .and_then(|ty| self.resolve_type(ast, ty))
                    .map(|ty| (ty, None))
            } else {
                self.check_var(ast, &mut var)
            };
            if let Some((ty, constant)) = checked {
                var.resolved = Some(ty.clone());
                if let Some(def) = self.defmap.get_mut(&var.id) {
                    if def.decl == Some(id) {
                        def.ty = ty;
                        def.constant = constant;
                    }
                }
            }
            if let Some(slot) = ast.var_mut(id) {
                *slot = var;
            }
        }
    }

    fn check_bodies(&mut self, ast: &mut Ast) {
        for id in 0..ast.decls.len() {
            let Some(func) = ast.func(id) else {
                continue;
            };
            let generic_owner = func
                .owner
                .and_then(|owner| ast.structure(owner))
                .is_some_and(|owner| !owner.generics.is_empty());
            if func.body.is_none() || func.is_generic() || generic_owner {
                continue;
            }
            let Some(mut body) = ast.func_mut(id).and_then(|f| f.body.take()) else {
                continue;
            };
            self.check_fn_body(ast, id, &mut body, &[], &[]);
            if let Some(func) = ast.func_mut(id) {
                func.body = Some(body);
            }
        }

        loop {
            if let Some(index) = self.pending_fns.pop() {
                let decl = self.fn_instances[index].decl;
                let args = self.fn_instances[index].generics.clone();
                let Some(mut body) = ast.func(decl).and_then(|f| f.body.clone()) else {
                    continue;
                };
                self.check_fn_body(ast, decl, &mut body, &args, &[]);
                self.fn_instances[index].body = Some(body);
                continue;
            }
            if let Some(index) = self.pending_structs.pop() {
                let decl = self.struct_instances[index].decl;
                let args = self.struct_instances[index].generics.clone();
                let methods = ast.structure(decl).map(|s| s.methods.clone()).unwrap_or_default();
                for method in methods {
                    let Some(mut body) = ast.func(method).and_then(|f| f.body.clone()) else {
                        continue;
                    };
                    self.check_fn_body(ast, method, &mut body, &[], &args);
                    self.method_instances.push(Instance {
                        decl: method,
                        generics: args.clone(),
                        body: Some(body),
                    });
                }
                continue;
            }
            break;
        }
    }

    /// Queues a generic function body for checking with `args`.
    pub(super) fn request_fn_instance(&mut self, decl: DeclId, args: &[Type]) {
        if !args.iter().all(is_concrete) || self.fn_instances.iter().any(|i| i.matches(decl, args)) {
            return;
        }
        self.fn_instances.push(Instance {
            decl,
            generics: args.to_vec(),
            body: None,
        });
        self.pending_fns.push(self.fn_instances.len() - 1);
    }

    fn request_struct_instance(&mut self, decl: DeclId, args: &[Type]) {
        if !args.iter().all(is_concrete) || self.struct_instances.iter().any(|i| i.matches(decl, args)) {
            return;
        }
        self.struct_instances.push(Instance {
            decl,
            generics: args.to_vec(),
            body: None,
        });
        self.pending_structs.push(self.struct_instances.len() - 1);
    }

    /// Applies the generic bindings in scope to an already resolved type.
    pub(super) fn substitute(&self, ty: &Type) -> Type {
        if self.generic_scope.is_empty() {
            return ty.clone();
        }
        let params: Vec<GenericParam> = self
            .generic_scope
            .iter()
            .rev()
            .map(|(id, _)| GenericParam {
                id: id.clone(),
                position: Position::null(),
            })
            .collect();
        let args: Vec<Type> = self.generic_scope.iter().rev().map(|(_, ty)| ty.clone()).collect();
        generics::instantiate(ty, &params, &args)
    }

    fn check_fn_body(&mut self, ast: &Ast, id: DeclId, body: &mut Block, fn_args: &[Type], owner_args: &[Type]) {
        let Some(func) = ast.func(id) else {
            return;
        };
        let owner_generics = func
            .owner
            .and_then(|owner| ast.structure(owner))
            .map(|owner| owner.generics.clone())
            .unwrap_or_default();

        let mark = self.generic_scope.len();
        self.bind_generics(&owner_generics, owner_args);
        self.bind_generics(&func.generics, fn_args);

        // The receiver lives in the owner scope, parameters in the function scope.
        let is_method = func.owner.is_some() || func.receiver.is_some();
        if is_method {
            self.defmap.push_scope(ScopeKind::Owner);
        }
        if let Some(receiver) = &func.receiver {
            let ty = receiver.ty.as_ref().map(|ty| self.substitute(ty)).unwrap_or_else(Type::void);
            let def = Def::new("self", DefKind::Local, ty, receiver.position.clone()).with_mutable(receiver.mutable);
            self.declare(def);
        }
        self.defmap.push_scope(ScopeKind::Func);
        for param in &func.params {
            if param.id == crate::lexer::tokens::IGNORE_ID {
                continue;
            }
            let Some(ty) = param.ty.as_ref() else {
                continue;
            };
            let mut ty = self.substitute(ty);
            if param.variadic {
                ty = Type::slice(ty, param.position.clone());
            }
            let def = Def::new(&param.id, DefKind::Local, ty, param.position.clone()).with_mutable(param.mutable);
            self.declare(def);
        }

        let mut labels = HashSet::new();
        collect_labels(body, &mut labels);
        let ret = self.substitute(&func.ret);
        self.frames.push(FnFrame {
            ret: ret.clone(),
            labels,
        });
        if func.is_unsafe {
            self.unsafe_depth += 1;
        }

        self.check_block(ast, body);

        if func.is_unsafe {
            self.unsafe_depth -= 1;
        }
        if !ret.is_void() && !returns(body) {
            self.push_error(ErrorImpl::RequireReturnValue, &func.position);
        }
        self.frames.pop();
        self.defmap.pop_scope();
        if is_method {
            self.defmap.pop_scope();
        }
        self.generic_scope.truncate(mark);
    }

    /// Resolves a parsed type against the symbol table.
    ///
    /// Named types become structs, traits, enums or the target of an alias;
    /// generic parameters in scope are substituted; array size expressions
    /// are folded.
    ///
    /// # Returns
    /// `None` after a diagnostic has been reported.
    pub fn resolve_type(&mut self, ast: &Ast, ty: &Type) -> Option<Type> {
        if let Some(types) = &ty.multi {
            let mut resolved = Vec::new();
            for inner in types {
                resolved.push(self.resolve_type(ast, inner)?);
            }
            return Some(Type::multi(resolved, ty.position.clone()));
        }

        let mut out = ty.clone();
        match ty.category {
            TypeCategory::Named => return self.resolve_named(ast, ty),
            TypeCategory::UnsafePtr => {
                if !self.unsafe_allowed() {
                    self.push_error(ErrorImpl::UnsafeOutsideBlock, &ty.position);
                }
            }
            TypeCategory::Slice | TypeCategory::Array => {
                if let Some(component) = &ty.component {
                    out.component = Some(Box::new(self.resolve_type(ast, component)?));
                }
                if let ArraySize::Expr(expr) = &ty.size {
                    out.size = self.fold_array_size(ast, expr)?;
                }
            }
            TypeCategory::Map => {
                if let Some((key, value)) = ty.map_types() {
                    let key = self.resolve_type(ast, key)?;
                    let value = self.resolve_type(ast, value)?;
                    out.tag = TypeTag::Map(Box::new(key), Box::new(value));
                }
            }
            TypeCategory::Fn => {
                if let Some(sig) = ty.fn_sig() {
                    let mut sig = sig.clone();
                    for param in sig.params.iter_mut() {
                        if let Some(param_ty) = &param.ty {
                            param.ty = Some(self.resolve_type(ast, param_ty)?);
                        }
                    }
                    sig.ret = self.resolve_type(ast, &sig.ret)?;
                    out.tag = TypeTag::Fn(Box::new(sig));
                }
            }
            TypeCategory::Struct | TypeCategory::Enum | TypeCategory::Trait => {
                return Some(self.substitute(ty));
            }
            _ => {}
        }
        out.refresh_kind();
        Some(out)
    }

    fn fold_array_size(&mut self, ast: &Ast, expr: &Expr) -> Option<ArraySize> {
        let mut expr = expr.clone();
        self.check_expr(ast, &mut expr, None)?;
        match expr.constant.as_ref().and_then(|c| c.as_i128()) {
            Some(n) if n >= 0 && expr.ty().category.is_integer() => Some(ArraySize::Fixed(n as u64)),
            _ => {
                self.push_error(ErrorImpl::ExprNotConst, &expr.position);
                None
            }
        }
    }

    fn resolve_named(&mut self, ast: &Ast, ty: &Type) -> Option<Type> {
        if ty.generics.is_empty() {
            if let Some((_, bound)) = self.generic_scope.iter().rev().find(|(id, _)| *id == ty.ident) {
                let mut out = bound.clone();
                if !ty.prefix.is_empty() {
                    out = out.with_prefix(&ty.prefix);
                }
                return Some(out);
            }
        }

        let (def, imported) = match self.defmap.lookup(&ty.ident, &ty.position) {
            Ok(found) => (found.def.clone(), found.imported),
            Err(error) => {
                self.push_error(error, &ty.position);
                return None;
            }
        };
        let local_decl = def.decl.filter(|_| !imported);

        let mut args = Vec::new();
        for generic in &ty.generics {
            args.push(self.resolve_type(ast, generic)?);
        }

        let mut out = match def.kind {
            DefKind::Struct => {
                let structure = local_decl.and_then(|id| ast.structure(id));
                if let Some(structure) = structure {
                    let expected = structure.generics.len();
                    let error = if expected == 0 && !args.is_empty() {
                        Some(ErrorImpl::HasGenerics)
                    } else if args.len() > expected {
                        Some(ErrorImpl::GenericsOverflow)
                    } else if args.len() < expected {
                        Some(ErrorImpl::MissingGenerics)
                    } else {
                        None
                    };
                    if let Some(error) = error {
                        self.push_error(error, &ty.position);
                        return None;
                    }
                }

                let mut out = match (local_decl, structure) {
                    (Some(id), Some(structure)) => struct_type(id, structure),
                    _ => def.ty.clone(),
                };
                out.generics = args;
                out.refresh_kind();
                if let Some(id) = local_decl {
                    if !out.generics.is_empty() && is_concrete(&out) {
                        let generics = out.generics.clone();
                        self.request_struct_instance(id, &generics);
                    }
                }
                out
            }
            DefKind::Enum | DefKind::Trait => {
                if !args.is_empty() {
                    self.push_error(ErrorImpl::HasGenerics, &ty.position);
                    return None;
                }
                def.ty.clone()
            }
            DefKind::TypeAlias => {
                if !args.is_empty() {
                    self.push_error(ErrorImpl::HasGenerics, &ty.position);
                    return None;
                }
                match local_decl.and_then(|id| alias_type(ast, id)) {
                    Some(target) => {
                        if self.alias_depth >= MAX_ALIAS_DEPTH {
                            self.push_error(ErrorImpl::InvalidSyntax, &ty.position);
                            return None;
                        }
                        self.alias_depth += 1;
                        let resolved = self.resolve_type(ast, &target);
                        self.alias_depth -= 1;
                        resolved?
                    }
                    None => def.ty.clone(),
                }
            }
            _ => {
                self.push_error(
                    ErrorImpl::IdNotExist {
                        id: ty.ident.clone(),
                    },
                    &ty.position,
                );
                return None;
            }
        };

        out.position = ty.position.clone();
        if !ty.prefix.is_empty() {
            out = out.with_prefix(&ty.prefix);
        }
        Some(out)
    }

    /// Checks a variable declaration and fills in its resolved type.
    ///
    /// # Returns
    /// The variable's type and, for constants, its folded value.
    pub(super) fn check_var(&mut self, ast: &Ast, var: &mut Var) -> Option<(Type, Option<Constant>)> {
        let declared = match &var.ty {
            Some(ty) => Some(self.resolve_type(ast, ty)?),
            None => None,
        };

        let Some(init) = var.init.as_mut() else {
            let Some(ty) = declared else {
                self.push_error(ErrorImpl::MissingType, &var.position);
                return None;
            };
            var.resolved = Some(ty.clone());
            return Some((ty, None));
        };

        let ty = match declared {
            Some(mut declared) => {
                self.check_expr(ast, init, Some(&declared))?;
                if declared.is_array() && matches!(declared.size, ArraySize::Auto) {
                    let value = init.ty();
                    if value.is_array() {
                        declared.size = value.size.clone();
                        declared.refresh_kind();
                    }
                }
                self.check_assign(&declared, init);
                declared
            }
            None => {
                let ty = self.check_expr(ast, init, None)?;
                if ty.is_multi() {
                    self.push_error(ErrorImpl::MissingIdentifiers, &var.position);
                    return None;
                }
                if ty.is_void() || ty.is_nil() {
                    self.push_error(ErrorImpl::MissingType, &var.position);
                    return None;
                }
                self.default_type(init, ty)
            }
        };

        let constant = if var.is_const {
            match init.constant.clone() {
                Some(constant) => Some(constant),
                None => {
                    self.push_error(ErrorImpl::ExprNotConst, &init.position);
                    None
                }
            }
        } else {
            None
        };

        var.resolved = Some(ty.clone());
        Some((ty, constant))
    }

    /// Untyped numeric constants default to `int`, `u64` or `f64` when they
    /// initialise a variable without an annotation.
    pub(super) fn default_type(&self, init: &mut Expr, ty: Type) -> Type {
        let untyped = match &init.kind {
            ExprKind::Literal { class, .. } => *class != LiteralClass::Rune,
            ExprKind::Unary { .. } | ExprKind::Binary { .. } | ExprKind::Paren(_) => true,
            _ => false,
        };
        let Some(constant) = init.constant.clone() else {
            return ty;
        };
        if !untyped || !ty.is_numeric() {
            return ty;
        }

        let target = match constant {
            Constant::Float(_) => Type::primitive("f64", TypeCategory::Float(64), ty.position.clone()),
            Constant::Uint(_) => Type::primitive("u64", TypeCategory::UnsignedInt(64), ty.position.clone()),
            _ => Type::primitive("int", TypeCategory::SignedInt(self.config.int_bits), ty.position.clone()),
        };
        if !range_assignable(&constant, &target) {
            return ty;
        }
        init.constant = Some(constant.convert(target.category));
        init.resolved = Some(target.clone());
        target
    }

    /// Checks that a resolved expression may be stored into `target`.
    ///
    /// Numeric constants are judged by range instead of by type and take the
    /// target type when they fit.
    pub(super) fn check_assign(&mut self, target: &Type, expr: &mut Expr) -> bool {
        let Some(value) = expr.resolved.clone() else {
            return false;
        };

        if let Some(constant) = expr.constant.clone() {
            let float_into_int = value.category.is_float() && target.category.is_integer();
            if target.is_numeric() && value.is_numeric() && constant.is_numeric() && !float_into_int {
                if range_assignable(&constant, target) {
                    expr.constant = Some(constant.convert(target.category));
                    expr.resolved = Some(target.clone());
                    return true;
                }
                self.push_error(ErrorImpl::OverflowLimits, &expr.position);
                return false;
            }
        }

        match solver::check_compatible(target, &value, false) {
            Ok(()) => true,
            Err(error) => {
                self.push_error(error, &expr.position);
                false
            }
        }
    }

    pub(super) fn check_block(&mut self, ast: &Ast, block: &mut Block) {
        self.defmap.push_scope(ScopeKind::Block);
        if block.is_unsafe {
            self.unsafe_depth += 1;
        }
        for stmt in block.stmts.iter_mut() {
            self.check_stmt(ast, stmt);
        }
        if block.is_unsafe {
            self.unsafe_depth -= 1;
        }
        self.defmap.pop_scope();
    }
}
