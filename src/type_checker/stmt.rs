use crate::{
    ast::{
        ast::Ast,
        expressions::{Expr, ExprKind},
        statements::{Assign, AssignTarget, Conditional, Loop, LoopProfile, Match, Stmt, StmtKind, Var},
        types::{Type, TypeCategory},
    },
    errors::errors::ErrorImpl,
    lexer::tokens::IGNORE_ID,
    Position,
};

use super::{
    defmap::{Def, DefKind, ScopeKind},
    solver::{self, Operand},
    type_checker::TypeChecker,
};

fn any_type(position: &Position) -> Type {
    Type::primitive("any", TypeCategory::Any, position.clone())
}

impl TypeChecker {
    pub(super) fn check_stmt(&mut self, ast: &Ast, stmt: &mut Stmt) {
        let position = stmt.position.clone();
        match &mut stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Spawn(expr) => {
                self.check_expr(ast, expr, None);
            }
            StmtKind::Var(var) => self.check_local_var(ast, var),
            StmtKind::Assign(assign) => self.check_assignment(ast, assign, &position),
            StmtKind::Return(values) => self.check_return(ast, values, &position),
            StmtKind::Break(Some(label)) | StmtKind::Continue(Some(label)) | StmtKind::Goto(label) => {
                let label = label.clone();
                self.check_label(&label, &position);
            }
            StmtKind::If(cond) => self.check_if(ast, cond),
            StmtKind::Loop(l) => self.check_loop(ast, l),
            StmtKind::Match(m) => self.check_match(ast, m),
            StmtKind::Block(block) => self.check_block(ast, block),
            StmtKind::TypeAlias(alias) => {
                if let Some(ty) = self.resolve_type(ast, &alias.ty) {
                    alias.ty = ty.clone();
                    self.declare(Def::new(&alias.id, DefKind::TypeAlias, ty, alias.position.clone()));
                }
            }
            StmtKind::Break(None)
            | StmtKind::Continue(None)
            | StmtKind::Label(_)
            | StmtKind::Fall
            | StmtKind::Comment(_) => {}
        }
    }

    fn check_local_var(&mut self, ast: &Ast, var: &mut Var) {
        if var.id == IGNORE_ID {
            if let Some(init) = var.init.as_mut() {
                self.check_expr(ast, init, None);
            }
            return;
        }
        let (ty, constant) = match self.check_var(ast, var) {
            Some(checked) => checked,
            None => (any_type(&var.position), None),
        };
        let def = Def::new(&var.id, DefKind::Local, ty, var.position.clone())
            .with_mutable(var.mutable)
            .with_constant(constant);
        self.declare(def);
    }

    fn check_label(&mut self, label: &str, position: &Position) {
        let exists = self.frames.last().is_some_and(|frame| frame.labels.contains(label));
        if !exists {
            self.push_error(
                ErrorImpl::LabelNotExist {
                    label: String::from(label),
                },
                position,
            );
        }
    }

    fn check_condition(&mut self, ast: &Ast, cond: &mut Expr) {
        let Some(ty) = self.check_expr(ast, cond, None) else {
            return;
        };
        if ty.category != TypeCategory::Bool || !ty.is_pure() {
            self.push_error(
                ErrorImpl::IncompatibleTypes {
                    expected: String::from("bool"),
                    received: ty.kind.clone(),
                },
                &cond.position,
            );
        }
    }

    fn check_if(&mut self, ast: &Ast, cond: &mut Conditional) {
        self.check_condition(ast, &mut cond.if_.cond);
        self.check_block(ast, &mut cond.if_.body);
        for elif in cond.elifs.iter_mut() {
            self.check_condition(ast, &mut elif.cond);
            self.check_block(ast, &mut elif.body);
        }
        if let Some(default) = cond.default.as_mut() {
            self.check_block(ast, default);
        }
    }

    fn check_loop(&mut self, ast: &Ast, l: &mut Loop) {
        let Loop { profile, body } = l;
        self.defmap.push_scope(ScopeKind::Block);
        match profile {
            LoopProfile::While { cond, next } => {
                if let Some(cond) = cond {
                    self.check_condition(ast, cond);
                }
                if let Some(next) = next {
                    self.check_stmt(ast, next);
                }
            }
            LoopProfile::ForEach { key_a, key_b, expr } => {
                if let Some((a, b)) = self.foreach_keys(ast, expr) {
                    self.bind_foreach_key(ast, key_a, a);
                    self.bind_foreach_key(ast, key_b, b);
                }
            }
            LoopProfile::CStyle { init, cond, post } => {
                if let Some(init) = init {
                    self.check_stmt(ast, init);
                }
                if let Some(cond) = cond {
                    self.check_condition(ast, cond);
                }
                if let Some(post) = post {
                    self.check_stmt(ast, post);
                }
            }
        }
        self.check_block(ast, body);
        self.defmap.pop_scope();
    }

    /// Key and value types of an iterable.
    fn foreach_keys(&mut self, ast: &Ast, expr: &mut Expr) -> Option<(Type, Type)> {
        let ty = self.check_expr(ast, expr, None)?;
        let base = if ty.is_ref() { ty.elem() } else { ty.clone() };
        let int = Type::primitive("int", TypeCategory::SignedInt(self.config.int_bits), expr.position.clone());

        if base.is_slice() || base.is_array() {
            let elem = base.component.as_ref().map(|c| (**c).clone())?;
            return Some((int, elem));
        }
        if base.is_map() {
            let (key, value) = base.map_types()?;
            return Some((key.clone(), value.clone()));
        }
        if base.category == TypeCategory::Str && base.prefix.is_empty() {
            let byte = Type::primitive("u8", TypeCategory::UnsignedInt(8), expr.position.clone());
            return Some((int, byte));
        }
        self.push_error(ErrorImpl::ForeachNotIterable { type_: ty.kind.clone() }, &expr.position);
        None
    }

    fn bind_foreach_key(&mut self, ast: &Ast, var: &mut Var, ty: Type) {
        if var.id == IGNORE_ID {
            return;
        }
        let ty = match var.ty.as_ref() {
            Some(declared) => {
                let Some(declared) = self.resolve_type(ast, declared) else {
                    return;
                };
                if let Err(error) = solver::check_compatible(&declared, &ty, false) {
                    self.push_error(error, &var.position);
                }
                declared
            }
            None => ty,
        };
        var.resolved = Some(ty.clone());
        self.declare(Def::new(&var.id, DefKind::Local, ty, var.position.clone()).with_mutable(var.mutable));
    }

    fn check_match(&mut self, ast: &Ast, m: &mut Match) {
        let Match {
            subject,
            type_match,
            cases,
            default,
        } = m;
        let subject_ty = match subject.as_mut() {
            Some(subject) => self.check_expr(ast, subject, None),
            None => None,
        };

        for case in cases.iter_mut() {
            if *type_match {
                for ty in case.types.iter_mut() {
                    if let Some(resolved) = self.resolve_type(ast, ty) {
                        *ty = resolved;
                    }
                }
            }
            for expr in case.exprs.iter_mut() {
                match (&subject_ty, subject.is_some()) {
                    (Some(subject_ty), _) => {
                        if self.check_expr(ast, expr, Some(subject_ty)).is_some() {
                            self.check_assign(subject_ty, expr);
                        }
                    }
                    (None, false) => self.check_condition(ast, expr),
                    (None, true) => {
                        self.check_expr(ast, expr, None);
                    }
                }
            }
            self.check_block(ast, &mut case.body);
        }
        if let Some(default) = default.as_mut() {
            self.check_block(ast, default);
        }
    }

    fn check_return(&mut self, ast: &Ast, values: &mut [Expr], position: &Position) {
        let Some(ret) = self.frames.last().map(|frame| frame.ret.clone()) else {
            return;
        };

        if ret.is_void() {
            if !values.is_empty() {
                self.push_error(ErrorImpl::VoidFunctionReturnValue, position);
            }
            for value in values.iter_mut() {
                self.check_expr(ast, value, None);
            }
            return;
        }
        if values.is_empty() {
            self.push_error(ErrorImpl::RequireReturnValue, position);
            return;
        }

        let Some(types) = ret.multi.clone() else {
            if values.len() > 1 {
                self.push_error(ErrorImpl::OverflowReturn, position);
                return;
            }
            if self.check_expr(ast, &mut values[0], Some(&ret)).is_some() {
                self.check_assign(&ret, &mut values[0]);
            }
            return;
        };

        if values.len() == 1 {
            let Some(ty) = self.check_expr(ast, &mut values[0], None) else {
                return;
            };
            if !ty.is_multi() {
                self.push_error(ErrorImpl::RequireReturnValue, position);
                return;
            }
            if let Err(error) = solver::check_compatible(&ret, &ty, false) {
                self.push_error(error, &values[0].position);
            }
            return;
        }
        if values.len() > types.len() {
            self.push_error(ErrorImpl::OverflowReturn, position);
            return;
        }
        if values.len() < types.len() {
            self.push_error(ErrorImpl::RequireReturnValue, position);
            return;
        }
        for (value, ty) in values.iter_mut().zip(types.iter()) {
            if self.check_expr(ast, value, Some(ty)).is_some() {
                self.check_assign(ty, value);
            }
        }
    }

    /// Reports assignments to constants and to variables declared without `mut`.
    fn check_mutable(&mut self, target: &Expr) {
        match &target.kind {
            ExprKind::Ident(id) => {
                let immutable = self
                    .defmap
                    .get(id)
                    .is_some_and(|def| !def.mutable || def.constant.is_some() || !matches!(def.kind, DefKind::Local | DefKind::Global));
                if immutable {
                    self.push_error(ErrorImpl::AssignImmutable { id: id.clone() }, &target.position);
                }
            }
            ExprKind::Paren(inner) => self.check_mutable(inner),
            ExprKind::SelfRef | ExprKind::Selector { .. } | ExprKind::Index { .. } | ExprKind::Unary { .. } => {}
            _ => self.push_error(ErrorImpl::InvalidSyntax, &target.position),
        }
    }

    fn check_assignment(&mut self, ast: &Ast, assign: &mut Assign, position: &Position) {
        if assign.is_postfix() {
            let Some(target) = assign.targets.first_mut() else {
                return;
            };
            let Some(ty) = self.check_expr(ast, &mut target.expr, None) else {
                return;
            };
            if !ty.is_numeric() && !(ty.is_ptr() && !ty.is_unsafe_ptr()) {
                self.push_error(
                    ErrorImpl::OperatorNotForType {
                        operator: assign.op.clone(),
                        type_: ty.kind.clone(),
                    },
                    position,
                );
            }
            self.check_mutable(&target.expr);
            return;
        }

        if assign.op != "=" {
            self.check_compound(ast, assign, position);
            return;
        }

        let mut target_types: Vec<Option<Type>> = Vec::new();
        for target in assign.targets.iter_mut() {
            let ty = if target.is_ignored() {
                None
            } else if let Some(var) = &target.var {
                var.ty.as_ref().and_then(|ty| self.resolve_type(ast, ty))
            } else {
                self.check_expr(ast, &mut target.expr, None)
            };
            target_types.push(ty);
        }

        if assign.values.len() == 1 && assign.targets.len() > 1 {
            self.distribute_tuple(ast, assign, &target_types, position);
            return;
        }

        if assign.targets.len() < assign.values.len() {
            self.push_error(ErrorImpl::MissingIdentifiers, position);
            return;
        }
        if assign.targets.len() > assign.values.len() {
            self.push_error(ErrorImpl::OverflowMultiAssign, position);
            return;
        }

        for ((target, declared), value) in assign
            .targets
            .iter_mut()
            .zip(target_types.iter())
            .zip(assign.values.iter_mut())
        {
            let Some(value_ty) = self.check_expr(ast, value, declared.as_ref()) else {
                continue;
            };
            if target.is_ignored() {
                continue;
            }
            match target.var.as_mut() {
                Some(var) => {
                    let ty = match declared {
                        Some(declared) => {
                            self.check_assign(declared, value);
                            declared.clone()
                        }
                        None => self.default_type(value, value_ty),
                    };
                    self.bind_new_target(var, ty);
                }
                None => {
                    if let Some(declared) = declared {
                        self.check_assign(declared, value);
                    }
                    self.check_mutable(&target.expr);
                }
            }
        }
    }

    /// `a, b = f()` where `f` returns a tuple.
    fn distribute_tuple(&mut self, ast: &Ast, assign: &mut Assign, target_types: &[Option<Type>], position: &Position) {
        let Some(ty) = self.check_expr(ast, &mut assign.values[0], None) else {
            return;
        };
        let Some(types) = ty.multi.clone() else {
            self.push_error(ErrorImpl::OverflowMultiAssign, position);
            return;
        };
        if assign.targets.len() < types.len() {
            self.push_error(ErrorImpl::MissingIdentifiers, position);
            return;
        }
        if assign.targets.len() > types.len() {
            self.push_error(ErrorImpl::OverflowMultiAssign, position);
            return;
        }

        for ((target, declared), value_ty) in assign
            .targets
            .iter_mut()
            .zip(target_types.iter())
            .zip(types.into_iter())
        {
            if target.is_ignored() {
                continue;
            }
            if let Some(declared) = declared {
                if let Err(error) = solver::check_compatible(declared, &value_ty, false) {
                    self.push_error(error, &target.expr.position);
                    continue;
                }
            }
            let AssignTarget { expr, var } = target;
            match var.as_mut() {
                Some(var) => {
                    let ty = declared.clone().unwrap_or(value_ty);
                    self.bind_new_target(var, ty);
                }
                None => self.check_mutable(expr),
            }
        }
    }

    fn bind_new_target(&mut self, var: &mut Var, ty: Type) {
        var.resolved = Some(ty.clone());
        let def = Def::new(&var.id, DefKind::Local, ty, var.position.clone()).with_mutable(var.mutable);
        self.declare(def);
    }

    /// `a op= b` is solved as `a op b` and stored back into `a`.
    fn check_compound(&mut self, ast: &Ast, assign: &mut Assign, position: &Position) {
        if assign.targets.len() != 1 || assign.values.len() != 1 {
            self.push_error(ErrorImpl::InvalidSyntax, position);
            return;
        }
        let op = assign.op.trim_end_matches('=').to_string();
        let target = &mut assign.targets[0];
        let value = &mut assign.values[0];

        let target_ty = self.check_expr(ast, &mut target.expr, None);
        let value_ty = self.check_expr(ast, value, target_ty.as_ref());
        let (Some(target_ty), Some(mut value_ty)) = (target_ty, value_ty) else {
            return;
        };

        let shift = op == "<<" || op == ">>";
        let constant_operand = value.constant.as_ref().is_some_and(|c| c.is_numeric());
        if !shift && constant_operand && target_ty.is_numeric() && value_ty.is_numeric() {
            if !self.check_assign(&target_ty, value) {
                return;
            }
            value_ty = value.ty();
        }

        let solved = solver::solve_binop(
            Operand::new(&target_ty, None),
            Operand::new(&value_ty, value.constant.as_ref()),
            &op,
        );
        match solved {
            // A shift keeps the type of the shifted target.
            Ok(_) if shift => {}
            Ok(solved) => {
                if let Err(error) = solver::check_compatible(&target_ty, &solved.ty, false) {
                    self.push_error(error, position);
                }
            }
            Err(error) => self.push_error(error, position),
        }
        self.check_mutable(&target.expr);
    }
}
