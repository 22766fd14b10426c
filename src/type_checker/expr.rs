use crate::{
    ast::{
        ast::Ast,
        expressions::{Expr, ExprKind},
        types::{ArraySize, FnSig, Type, TypeCategory, TypeTag},
    },
    errors::errors::ErrorImpl,
    lexer::tokens::LiteralClass,
    Position,
};

use super::{
    constant::{minimal_category, Constant},
    defmap::DefKind,
    generics,
    solver::{self, sized_type, Operand},
    type_checker::{bool_type, TypeChecker},
};

type Checked = Option<(Type, Option<Constant>)>;

fn int_type(bits: u8, position: Position) -> Type {
    Type::primitive("int", TypeCategory::SignedInt(bits), position)
}

fn is_str(ty: &Type) -> bool {
    ty.category == TypeCategory::Str && ty.prefix.is_empty()
}

fn is_integer(ty: &Type) -> bool {
    ty.is_numeric() && ty.category.is_integer()
}

fn is_lvalue(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::SelfRef | ExprKind::Selector { .. } | ExprKind::Index { .. } => true,
        ExprKind::Paren(inner) => is_lvalue(inner),
        ExprKind::Unary { op, .. } => op == "*",
        _ => false,
    }
}

/// A generic parameter written as a bare name, e.g. the `i` of `f[i]`.
fn plain_name(ty: &Type) -> Option<&str> {
    (ty.category == TypeCategory::Named && ty.prefix.is_empty() && ty.generics.is_empty())
        .then_some(ty.ident.as_str())
}

fn component(ty: &Type) -> Type {
    ty.component
        .as_ref()
        .map(|component| (**component).clone())
        .unwrap_or_else(Type::void)
}

impl TypeChecker {
    /// Resolves an expression, recording its type and constant value on the node.
    ///
    /// # Arguments
    /// * `ast` - The unit being checked, for declaration lookups
    /// * `expr` - Expression to resolve in place
    /// * `expected` - Type required by the context, used by untyped literals
    ///
    /// # Returns
    /// The resolved type, or `None` after a diagnostic.
    pub fn check_expr(&mut self, ast: &Ast, expr: &mut Expr, expected: Option<&Type>) -> Option<Type> {
        self.rewrite_index_call(ast, expr);
        self.rewrite_cast_call(expr);

        let position = expr.position.clone();
        let checked = match &mut expr.kind {
            ExprKind::Literal { value, class } => self.check_literal(value, *class, &position),
            ExprKind::Ident(id) => {
                let id = id.clone();
                self.check_ident(ast, &id, &position)
            }
            ExprKind::SelfRef => self.check_ident(ast, "self", &position),
            ExprKind::Unary { op, operand } => {
                let op = op.clone();
                self.check_unary(ast, &op, operand, expected, &position)
            }
            ExprKind::Binary { left, op, right } => {
                let op = op.clone();
                self.check_binary(ast, left, &op, right, &position)
            }
            ExprKind::Paren(inner) => self
                .check_expr(ast, inner, expected)
                .map(|ty| (ty, inner.constant.clone())),
            ExprKind::Call { callee, generics, args } => self.check_call(ast, callee, generics, args, &position),
            ExprKind::Index { target, index } => self.check_index(ast, target, index),
            ExprKind::Slicing { target, start, end } => self.check_slicing(ast, target, start.as_deref_mut(), end.as_deref_mut()),
            ExprKind::Selector {
                target,
                member,
                namespace,
            } => {
                let member = member.clone();
                if *namespace {
                    self.check_namespace(ast, target, &member, &position)
                } else {
                    self.check_member(ast, target, &member, &position)
                }
            }
            ExprKind::Composite { ty, elements } => self.check_composite(ast, ty.as_ref(), elements, expected, &position),
            ExprKind::MapLiteral { ty, pairs } => {
                let ty = ty.clone();
                self.check_map_literal(ast, &ty, pairs)
            }
            ExprKind::StructLit { ty, args } => {
                let ty = ty.clone();
                self.check_struct_literal(ast, &ty, args, &position)
            }
            ExprKind::Cast { ty, expr: inner } => {
                let ty = ty.clone();
                self.check_cast(ast, &ty, inner, &position)
            }
            ExprKind::Invalid => None,
        };

        match checked {
            Some((ty, constant)) => {
                expr.resolved = Some(ty.clone());
                expr.constant = constant;
                Some(ty)
            }
            None => {
                expr.resolved = None;
                expr.constant = None;
                None
            }
        }
    }

    /// `a[i](x)` is parsed as a generic call. When `a` is not a generic
    /// function and `i` names a value, it is an index followed by a call.
    fn rewrite_index_call(&mut self, ast: &Ast, expr: &mut Expr) {
        let ExprKind::Call { callee, generics, .. } = &mut expr.kind else {
            return;
        };
        if generics.len() != 1 || self.generic_callee(ast, callee).is_some() {
            return;
        }
        let Some(name) = plain_name(&generics[0]) else {
            return;
        };
        let is_value = self
            .defmap
            .get(name)
            .is_some_and(|def| matches!(def.kind, DefKind::Local | DefKind::Global));
        if !is_value {
            return;
        }

        let index = Expr::new(ExprKind::Ident(String::from(name)), generics[0].position.clone());
        let position = callee.position.clone();
        let target = std::mem::replace(callee.as_mut(), Expr::invalid(position.clone()));
        **callee = Expr::new(
            ExprKind::Index {
                target: Box::new(target),
                index: Box::new(index),
            },
            position,
        );
        generics.clear();
    }

    /// `(f)(x)` is parsed as a cast. When `f` names a value it is a call.
    fn rewrite_cast_call(&self, expr: &mut Expr) {
        let ExprKind::Cast { ty, expr: inner } = &mut expr.kind else {
            return;
        };
        let Some(name) = plain_name(ty) else {
            return;
        };
        let is_value = self
            .defmap
            .get(name)
            .is_some_and(|def| matches!(def.kind, DefKind::Local | DefKind::Global | DefKind::Func));
        if !is_value {
            return;
        }

        let callee = Expr::new(
            ExprKind::Paren(Box::new(Expr::new(ExprKind::Ident(String::from(name)), ty.position.clone()))),
            expr.position.clone(),
        );
        let arg = std::mem::replace(inner.as_mut(), Expr::invalid(expr.position.clone()));
        expr.kind = ExprKind::Call {
            callee: Box::new(callee),
            generics: Vec::new(),
            args: vec![arg],
        };
    }

    fn check_literal(&mut self, value: &str, class: LiteralClass, position: &Position) -> Checked {
        let Some(constant) = Constant::from_literal(value, class) else {
            self.push_error(ErrorImpl::OverflowLimits, position);
            return None;
        };
        let ty = match class {
            LiteralClass::Int | LiteralClass::Float => match minimal_category(&constant) {
                Some(category) => sized_type(category, position.clone()),
                None => {
                    self.push_error(ErrorImpl::OverflowLimits, position);
                    return None;
                }
            },
            LiteralClass::Rune => Type::primitive("i32", TypeCategory::SignedInt(32), position.clone()),
            LiteralClass::Str => Type::primitive("str", TypeCategory::Str, position.clone()),
            LiteralClass::Bool => bool_type(position.clone()),
            LiteralClass::Nil => Type::nil(),
        };
        Some((ty, Some(constant)))
    }

    fn check_ident(&mut self, ast: &Ast, id: &str, position: &Position) -> Checked {
        let (def, imported) = match self.defmap.lookup(id, position) {
            Ok(found) => (found.def.clone(), found.imported),
            Err(error) => {
                self.push_error(error, position);
                return None;
            }
        };

        match def.kind {
            DefKind::Local | DefKind::Global => Some((def.ty, def.constant)),
            DefKind::Func => {
                let generic = !imported && def.decl.and_then(|decl| ast.func(decl)).is_some_and(|f| f.is_generic());
                if generic {
                    self.push_error(ErrorImpl::MissingGenerics, position);
                    return None;
                }
                Some((def.ty, None))
            }
            _ => {
                self.push_error(ErrorImpl::InvalidSyntax, position);
                None
            }
        }
    }

    fn check_unary(
        &mut self,
        ast: &Ast,
        op: &str,
        operand: &mut Expr,
        expected: Option<&Type>,
        position: &Position,
    ) -> Checked {
        let ty = self.check_expr(ast, operand, expected)?;
        let not_for_type = |ty: &Type| ErrorImpl::OperatorNotForType {
            operator: String::from(op),
            type_: ty.kind.clone(),
        };

        match op {
            "-" | "+" => {
                if !ty.is_numeric() {
                    self.push_error(not_for_type(&ty), position);
                    return None;
                }
                let folded = self.fold_operand(operand, op, position)?;
                if op == "-" && folded.is_none() && ty.category.is_unsigned() {
                    self.push_error(
                        ErrorImpl::OperatorNotForUint {
                            operator: String::from(op),
                        },
                        position,
                    );
                    return None;
                }
                let ty = match folded.as_ref().and_then(minimal_category) {
                    Some(category) => sized_type(category, position.clone()),
                    None => ty,
                };
                Some((ty, folded))
            }
            "!" => {
                if ty.category != TypeCategory::Bool || !ty.is_pure() {
                    self.push_error(not_for_type(&ty), position);
                    return None;
                }
                let folded = self.fold_operand(operand, op, position)?;
                Some((ty, folded))
            }
            "^" => {
                if !is_integer(&ty) {
                    self.push_error(not_for_type(&ty), position);
                    return None;
                }
                let folded = self.fold_operand(operand, op, position)?;
                Some((ty, folded))
            }
            "*" => {
                if !ty.is_ptr() || ty.is_unsafe_ptr() {
                    self.push_error(not_for_type(&ty), position);
                    return None;
                }
                if !self.unsafe_allowed() {
                    self.push_error(ErrorImpl::UnsafeOutsideBlock, position);
                }
                Some((ty.elem(), None))
            }
            "&" => {
                if !is_lvalue(operand) {
                    self.push_error(not_for_type(&ty), position);
                    return None;
                }
                Some((ty.with_prefix("*"), None))
            }
            _ => {
                self.push_error(ErrorImpl::InvalidSyntax, position);
                None
            }
        }
    }

    /// Folds a constant operand. The outer `None` means an overflow was reported.
    fn fold_operand(&mut self, operand: &Expr, op: &str, position: &Position) -> Option<Option<Constant>> {
        match operand.constant.as_ref().map(|c| c.fold_unary(op)).transpose() {
            Ok(folded) => Some(folded.flatten()),
            Err(error) => {
                self.push_error(error, position);
                None
            }
        }
    }

    fn check_binary(&mut self, ast: &Ast, left: &mut Expr, op: &str, right: &mut Expr, position: &Position) -> Checked {
        let l = self.check_expr(ast, left, None);
        let r = self.check_expr(ast, right, None);
        let (l, r) = (l?, r?);

        let solved = solver::solve_binop(
            Operand::new(&l, left.constant.as_ref()),
            Operand::new(&r, right.constant.as_ref()),
            op,
        );
        match solved {
            Ok(solved) => Some((solved.ty, solved.constant)),
            Err(error) => {
                self.push_error(error, position);
                None
            }
        }
    }

    /// The generic function a callee names, if any.
    fn generic_callee(&self, ast: &Ast, callee: &Expr) -> Option<usize> {
        let id = callee.ident()?;
        let def = self.defmap.get(id)?;
        if def.kind != DefKind::Func {
            return None;
        }
        let decl = def.decl?;
        ast.func(decl).filter(|f| f.is_generic()).map(|_| decl)
    }

    fn check_call(
        &mut self,
        ast: &Ast,
        callee: &mut Expr,
        generics: &mut [Type],
        args: &mut [Expr],
        position: &Position,
    ) -> Checked {
        let mut args_checked = false;

        let sig = match self.generic_callee(ast, callee) {
            Some(decl) => {
                let func = ast.func(decl)?;
                let params = func.generics.clone();
                let bound = if generics.is_empty() {
                    args_checked = true;
                    self.infer_generics(ast, decl, args, position)?
                } else {
                    if generics.len() > params.len() {
                        self.push_error(ErrorImpl::GenericsOverflow, position);
                        return None;
                    }
                    if generics.len() < params.len() {
                        self.push_error(ErrorImpl::MissingGenerics, position);
                        return None;
                    }
                    let mut bound = Vec::new();
                    for generic in generics.iter() {
                        bound.push(self.resolve_type(ast, generic)?);
                    }
                    bound
                };

                self.request_fn_instance(decl, &bound);
                let mut sig = func.sig();
                for param in sig.params.iter_mut() {
                    param.ty = param.ty.as_ref().map(|ty| generics::instantiate(ty, &params, &bound));
                }
                sig.ret = generics::instantiate(&sig.ret, &params, &bound);
                callee.resolved = Some(Type::func(sig.clone(), callee.position.clone()));
                sig
            }
            None => {
                if !generics.is_empty() {
                    self.push_error(ErrorImpl::HasGenerics, position);
                    return None;
                }
                let callee_ty = self.check_expr(ast, callee, None)?;
                match callee_ty.fn_sig().filter(|_| callee_ty.is_fn()) {
                    Some(sig) => sig.clone(),
                    None => {
                        self.push_error(ErrorImpl::ExprNotFuncCall, position);
                        return None;
                    }
                }
            }
        };

        if sig.is_unsafe && !self.unsafe_allowed() {
            self.push_error(ErrorImpl::UnsafeOutsideBlock, position);
        }
        self.check_args(ast, &sig, args, args_checked, position);
        Some((sig.ret, None))
    }

    /// Binds the generics of a call from its arguments.
    fn infer_generics(&mut self, ast: &Ast, decl: usize, args: &mut [Expr], position: &Position) -> Option<Vec<Type>> {
        let func = ast.func(decl)?;
        let mut bindings: Vec<Option<Type>> = vec![None; func.generics.len()];

        for (i, arg) in args.iter_mut().enumerate() {
            let Some(param) = func.params.get(i).or_else(|| func.params.last().filter(|p| p.variadic)) else {
                break;
            };
            let Some(ty) = self.check_expr(ast, arg, None) else {
                continue;
            };
            let ty = self.default_type(arg, ty);
            if let Some(param_ty) = &param.ty {
                generics::infer(param_ty, &ty, &func.generics, &mut bindings);
            }
        }

        if bindings.iter().any(Option::is_none) {
            self.push_error(ErrorImpl::MissingGenerics, position);
            return None;
        }
        Some(bindings.into_iter().flatten().collect())
    }

    fn check_args(&mut self, ast: &Ast, sig: &FnSig, args: &mut [Expr], checked: bool, position: &Position) {
        let variadic = sig.params.last().is_some_and(|param| param.variadic);
        let fixed = if variadic { sig.params.len() - 1 } else { sig.params.len() };

        if args.len() < fixed {
            self.push_error(
                ErrorImpl::MissingArguments {
                    expected: fixed,
                    received: args.len(),
                },
                position,
            );
        } else if !variadic && args.len() > fixed {
            self.push_error(
                ErrorImpl::UnexpectedArguments {
                    expected: fixed,
                    received: args.len(),
                },
                position,
            );
        }

        for (i, arg) in args.iter_mut().enumerate() {
            let param = match sig.params.get(i) {
                Some(param) => param,
                None if variadic => &sig.params[sig.params.len() - 1],
                None => break,
            };
            let ty = param.ty.clone().unwrap_or_else(Type::void);
            if !checked && self.check_expr(ast, arg, Some(&ty)).is_none() {
                continue;
            }
            if arg.resolved.is_some() {
                self.check_assign(&ty, arg);
            }
        }
    }

    fn check_index(&mut self, ast: &Ast, target: &mut Expr, index: &mut Expr) -> Checked {
        let target_ty = self.check_expr(ast, target, None);
        let index_ty = self.check_expr(ast, index, None);
        let (target_ty, index_ty) = (target_ty?, index_ty?);
        let base = if target_ty.is_ref() { target_ty.elem() } else { target_ty };

        if base.is_map() {
            let (key, value) = base.map_types()?;
            let (key, value) = (key.clone(), value.clone());
            self.check_assign(&key, index);
            return Some((value, None));
        }

        let indexable = base.is_slice() || base.is_array() || is_str(&base) || (base.is_ptr() && !base.is_unsafe_ptr());
        if !indexable {
            self.push_error(ErrorImpl::NotSupportsIndexing { type_: base.kind.clone() }, &target.position);
            return None;
        }
        if !is_integer(&index_ty) {
            self.push_error(
                ErrorImpl::IncompatibleTypes {
                    expected: String::from("int"),
                    received: index_ty.kind.clone(),
                },
                &index.position,
            );
            return None;
        }

        let position = index.position.clone();
        if let Some(at) = index.constant.as_ref().and_then(|c| c.as_i128()) {
            let out_of_range = at < 0 || matches!(base.size, ArraySize::Fixed(n) if base.is_array() && at >= n as i128);
            if out_of_range {
                self.push_error(ErrorImpl::OverflowLimits, &position);
                return None;
            }
        }

        if is_str(&base) {
            let byte = match (&target.constant, index.constant.as_ref().and_then(|c| c.as_i128())) {
                (Some(Constant::Str(text)), Some(at)) => text.as_bytes().get(at as usize).map(|b| Constant::Uint(*b as u64)),
                _ => None,
            };
            return Some((Type::primitive("u8", TypeCategory::UnsignedInt(8), position), byte));
        }
        if base.is_ptr() {
            if !self.unsafe_allowed() {
                self.push_error(ErrorImpl::UnsafeOutsideBlock, &position);
            }
            return Some((base.elem(), None));
        }
        Some((component(&base), None))
    }

    fn check_slicing(&mut self, ast: &Ast, target: &mut Expr, start: Option<&mut Expr>, end: Option<&mut Expr>) -> Checked {
        let ty = self.check_expr(ast, target, None)?;
        for bound in [start, end].into_iter().flatten() {
            let bound_ty = self.check_expr(ast, bound, None)?;
            if !is_integer(&bound_ty) {
                self.push_error(
                    ErrorImpl::IncompatibleTypes {
                        expected: String::from("int"),
                        received: bound_ty.kind.clone(),
                    },
                    &bound.position,
                );
                return None;
            }
        }

        if is_str(&ty) || ty.is_slice() {
            return Some((ty, None));
        }
        if ty.is_array() {
            return Some((Type::slice(component(&ty), ty.position.clone()), None));
        }
        self.push_error(ErrorImpl::NotSupportsIndexing { type_: ty.kind.clone() }, &target.position);
        None
    }

    /// `Enum::Item`
    fn check_namespace(&mut self, ast: &Ast, target: &mut Expr, member: &str, position: &Position) -> Checked {
        let Some(id) = target.ident().map(String::from) else {
            self.push_error(ErrorImpl::InvalidSyntax, &target.position);
            return None;
        };
        let (def, imported) = match self.defmap.lookup(&id, &target.position) {
            Ok(found) => (found.def.clone(), found.imported),
            Err(error) => {
                self.push_error(error, &target.position);
                return None;
            }
        };
        if def.kind != DefKind::Enum {
            self.push_error(ErrorImpl::InvalidSyntax, &target.position);
            return None;
        }
        target.resolved = Some(def.ty.clone());

        let item = def
            .decl
            .filter(|_| !imported)
            .and_then(|decl| ast.enum_decl(decl))
            .and_then(|decl| decl.item(member));
        match item {
            Some(item) => Some((def.ty, item.value.clone())),
            None => {
                self.push_error(
                    ErrorImpl::MemberNotExist {
                        id: String::from(member),
                    },
                    position,
                );
                None
            }
        }
    }

    /// `value.member`: struct fields and methods, trait methods and `len`.
    fn check_member(&mut self, ast: &Ast, target: &mut Expr, member: &str, position: &Position) -> Checked {
        let ty = self.check_expr(ast, target, None)?;
        let base = if ty.is_ref() || (ty.is_ptr() && !ty.is_unsafe_ptr()) { ty.elem() } else { ty };

        if member == "len" && (base.is_slice() || base.is_array() || base.is_map() || is_str(&base)) {
            let constant = match (&target.constant, &base.size) {
                (Some(Constant::Str(text)), _) => Some(Constant::Int(text.len() as i64)),
                (_, ArraySize::Fixed(n)) if base.is_array() => Some(Constant::Int(*n as i64)),
                _ => None,
            };
            return Some((int_type(self.config.int_bits, position.clone()), constant));
        }

        let not_exist = || ErrorImpl::MemberNotExist {
            id: String::from(member),
        };
        match &base.tag {
            TypeTag::Struct(struct_ref) if base.prefix.is_empty() => {
                let Some(structure) = ast.structure(struct_ref.decl).filter(|s| s.position.file == struct_ref.file) else {
                    self.push_error(not_exist(), position);
                    return None;
                };
                let accessible = |is_pub: bool| is_pub || structure.position.dir() == position.dir();

                if let Some(field) = structure.field(member) {
                    if !accessible(field.is_pub) {
                        self.push_error(
                            ErrorImpl::NotAccessible {
                                id: String::from(member),
                            },
                            position,
                        );
                        return None;
                    }
                    let ty = generics::instantiate(&field.ty(), &structure.generics, &base.generics);
                    return Some((ty, None));
                }

                let method = structure
                    .methods
                    .iter()
                    .filter_map(|id| ast.func(*id))
                    .find(|method| method.id == member);
                match method {
                    Some(method) => {
                        if !accessible(method.is_pub) {
                            self.push_error(
                                ErrorImpl::NotAccessible {
                                    id: String::from(member),
                                },
                                position,
                            );
                            return None;
                        }
                        let ty = Type::func(method.sig(), position.clone());
                        Some((generics::instantiate(&ty, &structure.generics, &base.generics), None))
                    }
                    None => {
                        self.push_error(not_exist(), position);
                        None
                    }
                }
            }
            TypeTag::Trait(trait_ref) if base.prefix.is_empty() => {
                let method = ast
                    .trait_decl(trait_ref.decl)
                    .and_then(|decl| decl.methods.iter().find(|method| method.id == member));
                match method {
                    Some(method) => Some((Type::func(method.sig(), position.clone()), None)),
                    None => {
                        self.push_error(not_exist(), position);
                        None
                    }
                }
            }
            _ => {
                self.push_error(not_exist(), position);
                None
            }
        }
    }

    fn check_composite(
        &mut self,
        ast: &Ast,
        ty: Option<&Type>,
        elements: &mut [Expr],
        expected: Option<&Type>,
        position: &Position,
    ) -> Checked {
        let declared = match ty {
            Some(ty) => Some(self.resolve_type(ast, ty)?),
            None => expected.filter(|e| e.is_slice() || e.is_array()).cloned(),
        };

        let Some(mut declared) = declared else {
            return self.infer_composite(ast, elements, position);
        };
        if !declared.is_slice() && !declared.is_array() {
            self.push_error(
                ErrorImpl::IncompatibleTypes {
                    expected: declared.kind.clone(),
                    received: String::from("[]"),
                },
                position,
            );
            return None;
        }

        let elem = component(&declared);
        for element in elements.iter_mut() {
            if self.check_expr(ast, element, Some(&elem)).is_some() {
                self.check_assign(&elem, element);
            }
        }

        if declared.is_array() {
            match declared.size {
                ArraySize::Fixed(n) if n as usize != elements.len() => {
                    self.push_error(
                        ErrorImpl::ArraySizeMismatch {
                            expected: n as usize,
                            received: elements.len(),
                        },
                        position,
                    );
                    return None;
                }
                ArraySize::Fixed(_) => {}
                _ => {
                    declared.size = ArraySize::Fixed(elements.len() as u64);
                    declared.refresh_kind();
                }
            }
        }
        Some((declared, None))
    }

    /// `[a, b]` without context is a slice of the first element's type.
    fn infer_composite(&mut self, ast: &Ast, elements: &mut [Expr], position: &Position) -> Checked {
        let Some((first, rest)) = elements.split_first_mut() else {
            self.push_error(ErrorImpl::MissingType, position);
            return None;
        };
        let ty = self.check_expr(ast, first, None)?;
        let elem = self.default_type(first, ty);
        for element in rest.iter_mut() {
            if self.check_expr(ast, element, Some(&elem)).is_some() {
                self.check_assign(&elem, element);
            }
        }
        Some((Type::slice(elem, position.clone()), None))
    }

    fn check_map_literal(&mut self, ast: &Ast, ty: &Type, pairs: &mut [(Expr, Expr)]) -> Checked {
        let resolved = self.resolve_type(ast, ty)?;
        let Some((key, value)) = resolved.map_types() else {
            self.push_error(ErrorImpl::InvalidSyntax, &ty.position);
            return None;
        };
        let (key, value) = (key.clone(), value.clone());

        for (k, v) in pairs.iter_mut() {
            if self.check_expr(ast, k, Some(&key)).is_some() {
                self.check_assign(&key, k);
            }
            if self.check_expr(ast, v, Some(&value)).is_some() {
                self.check_assign(&value, v);
            }
        }
        Some((resolved, None))
    }

    fn check_struct_literal(&mut self, ast: &Ast, ty: &Type, args: &mut [Expr], position: &Position) -> Checked {
        let resolved = self.resolve_type(ast, ty)?;
        let TypeTag::Struct(struct_ref) = &resolved.tag else {
            self.push_error(ErrorImpl::InvalidSyntax, position);
            return None;
        };
        let Some(structure) = ast.structure(struct_ref.decl).filter(|s| s.position.file == struct_ref.file) else {
            for arg in args.iter_mut() {
                self.check_expr(ast, arg, None);
            }
            return Some((resolved, None));
        };

        let fields: Vec<Type> = structure
            .fields
            .iter()
            .map(|field| generics::instantiate(&field.ty(), &structure.generics, &resolved.generics))
            .collect();
        let required = structure.fields.iter().filter(|field| field.init.is_none()).count();

        if args.len() > fields.len() {
            self.push_error(
                ErrorImpl::UnexpectedArguments {
                    expected: fields.len(),
                    received: args.len(),
                },
                position,
            );
        } else if args.len() < required {
            self.push_error(
                ErrorImpl::MissingArguments {
                    expected: required,
                    received: args.len(),
                },
                position,
            );
        }

        for (arg, field) in args.iter_mut().zip(fields.iter()) {
            if self.check_expr(ast, arg, Some(field)).is_some() {
                self.check_assign(field, arg);
            }
        }
        Some((resolved, None))
    }

    fn check_cast(&mut self, ast: &Ast, ty: &Type, inner: &mut Expr, position: &Position) -> Checked {
        let target = self.resolve_type(ast, ty)?;
        let from = self.check_expr(ast, inner, None)?;

        if !self.castable(&from, &target) {
            self.push_error(
                ErrorImpl::NotSupportsCasting {
                    from: from.kind.clone(),
                    to: target.kind.clone(),
                },
                position,
            );
            return None;
        }

        let constant = match &inner.constant {
            Some(constant) if constant.is_numeric() && target.is_numeric() => Some(constant.convert(target.category)),
            Some(Constant::Str(text)) if is_str(&target) => Some(Constant::Str(text.clone())),
            _ => None,
        };
        Some((target, constant))
    }

    fn castable(&mut self, from: &Type, to: &Type) -> bool {
        if from.equals(to) {
            return true;
        }
        if to.category == TypeCategory::Any && to.prefix.is_empty() {
            return true;
        }
        if from.category == TypeCategory::Any && from.prefix.is_empty() {
            return true;
        }
        if from.is_numeric() && to.is_numeric() {
            return true;
        }
        if let TypeTag::Enum(enum_ref) = &from.tag {
            if from.prefix.is_empty() {
                let base = (*enum_ref.base).clone();
                return self.castable(&base, to);
            }
        }

        let is_text_slice = |ty: &Type| {
            ty.is_slice()
                && ty
                    .component
                    .as_ref()
                    .is_some_and(|c| c.is_numeric() && matches!(c.category, TypeCategory::UnsignedInt(8) | TypeCategory::SignedInt(32)))
        };
        if (is_str(to) && is_text_slice(from)) || (is_str(from) && is_text_slice(to)) {
            return true;
        }

        let is_uintptr = |ty: &Type| ty.is_numeric() && ty.ident == "uintptr";
        let pointer_cast = (from.is_ptr() && to.is_ptr() && (from.is_unsafe_ptr() || to.is_unsafe_ptr()))
            || (from.is_ptr() && is_uintptr(to))
            || (is_uintptr(from) && to.is_ptr());
        if pointer_cast {
            if !self.unsafe_allowed() {
                self.push_error(ErrorImpl::UnsafeOutsideBlock, &from.position);
            }
            return true;
        }
        false
    }
}
