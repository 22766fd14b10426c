//! Type compatibility and binary operator solving.
//!
//! [`compatible`] decides whether a value of the right type may be used where
//! the left type is expected. Mixed categories are normalised by swapping the
//! operands so that the dominant category is on the left, in the order trait,
//! reference, pointer, slice, array, map, nil-compatible, enum, struct and
//! finally the primitive table.
//!
//! [`solve_binop`] gives the result type of a binary expression and folds it
//! when both operands are constant.

use crate::{
    ast::types::{ArraySize, Type, TypeCategory, TypeTag},
    errors::errors::ErrorImpl,
    Position,
};

use super::constant::{minimal_category, Constant};

pub const COMPARISON_OPS: [&str; 6] = ["==", "!=", "<", ">", "<=", ">="];

fn is_equality(op: &str) -> bool {
    op == "==" || op == "!="
}

fn is_comparison(op: &str) -> bool {
    COMPARISON_OPS.contains(&op)
}

fn is_trait(ty: &Type) -> bool {
    ty.category == TypeCategory::Trait
}

fn is_struct(ty: &Type) -> bool {
    ty.category == TypeCategory::Struct
}

fn is_enum(ty: &Type) -> bool {
    ty.category == TypeCategory::Enum && ty.prefix.is_empty()
}

/// Whether a value of type `right` may be used where `left` is expected.
pub fn compatible(left: &Type, right: &Type, ignore_any: bool) -> bool {
    check_compatible(left, right, ignore_any).is_ok()
}

/// Same judgement as [`compatible`], with the reason for a rejection.
///
/// A struct passed by value where a trait with `&self` methods is expected is
/// reported as `trait_has_reference_parametered_function`; every other
/// mismatch is `incompatible_types`.
pub fn check_compatible(left: &Type, right: &Type, ignore_any: bool) -> Result<(), ErrorImpl> {
    let allow_assign = !left.is_ref();
    match check(left.clone(), right.clone(), ignore_any, allow_assign) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ErrorImpl::IncompatibleTypes {
            expected: left.kind.clone(),
            received: right.kind.clone(),
        }),
        Err(error) => Err(error),
    }
}

fn check(left: Type, right: Type, ignore_any: bool, allow_assign: bool) -> Result<bool, ErrorImpl> {
    if left.is_multi() || right.is_multi() {
        return Ok(left.kind == right.kind);
    }

    if is_trait(&left) || is_trait(&right) {
        let (left, right) = if is_trait(&right) { (right, left) } else { (left, right) };
        return check_trait(&left, right);
    }
    if left.is_ref() || right.is_ref() {
        let (left, right) = if right.is_ref() { (right, left) } else { (left, right) };
        if left.kind == right.kind {
            return Ok(true);
        }
        if !allow_assign {
            return Ok(false);
        }
        return check(left.elem(), right, ignore_any, allow_assign);
    }
    if left.is_ptr() || right.is_ptr() {
        let (left, right) = if !left.is_ptr() { (right, left) } else { (left, right) };
        return Ok(right.is_nil() || left.is_unsafe_ptr() || left.kind == right.kind);
    }
    if left.is_slice() || right.is_slice() {
        let (left, right) = if right.is_slice() { (right, left) } else { (left, right) };
        return Ok(right.is_nil() || left.kind == right.kind);
    }
    if left.is_array() || right.is_array() {
        let (left, right) = if right.is_array() { (right, left) } else { (left, right) };
        return Ok(check_array(&left, &right));
    }
    if left.is_map() || right.is_map() {
        let (left, right) = if right.is_map() { (right, left) } else { (left, right) };
        return Ok(right.is_nil() || left.kind == right.kind);
    }
    if left.is_fn() && right.is_fn() {
        return Ok(left.kind == right.kind);
    }
    if left.is_nil_compatible() {
        return Ok(right.is_nil());
    }
    if right.is_nil_compatible() {
        return Ok(left.is_nil());
    }
    if is_enum(&left) || is_enum(&right) {
        return Ok(left.category == right.category && left.kind == right.kind);
    }
    if is_struct(&left) || is_struct(&right) {
        let (left, right) = if is_struct(&right) { (right, left) } else { (left, right) };
        return Ok(check_struct(&left, &right));
    }

    Ok(primitive_compatible(left.category, right.category, ignore_any))
}

fn check_trait(left: &Type, right: Type) -> Result<bool, ErrorImpl> {
    if right.is_nil() {
        return Ok(true);
    }
    let TypeTag::Trait(trait_ref) = &left.tag else {
        return Ok(false);
    };

    let mut right = right;
    let mut by_ref = false;
    if right.is_ref() {
        by_ref = true;
        right = right.elem();
        if !is_struct(&right) {
            return Ok(false);
        }
    }

    if is_struct(&right) {
        if !left.prefix.is_empty() || !right.prefix.is_empty() {
            return Ok(false);
        }
        let TypeTag::Struct(struct_ref) = &right.tag else {
            return Ok(false);
        };
        if !struct_ref.traits.contains(&trait_ref.decl) {
            return Ok(false);
        }
        if trait_ref.has_ref_receiver && !by_ref {
            return Err(ErrorImpl::TraitHasReferenceParameteredFunction);
        }
        return Ok(true);
    }

    if is_trait(&right) {
        return Ok(right.decl() == Some(trait_ref.decl) && left.prefix == right.prefix);
    }
    Ok(false)
}

fn check_array(left: &Type, right: &Type) -> bool {
    if !right.is_array() {
        return false;
    }
    let same_size = match (&left.size, &right.size) {
        (ArraySize::Fixed(l), ArraySize::Fixed(r)) => l == r,
        _ => false,
    };
    let same_component = match (&left.component, &right.component) {
        (Some(l), Some(r)) => l.kind == r.kind,
        _ => false,
    };
    same_size && same_component
}

fn check_struct(left: &Type, right: &Type) -> bool {
    let (TypeTag::Struct(l), TypeTag::Struct(r)) = (&left.tag, &right.tag) else {
        return false;
    };
    if l.decl != r.decl || l.file != r.file || left.ident != right.ident {
        return false;
    }
    if left.generics.len() != right.generics.len() {
        return false;
    }
    left.generics
        .iter()
        .zip(right.generics.iter())
        .all(|(l, r)| l.equals(r))
}

/// Widening table for primitive categories.
pub fn primitive_compatible(target: TypeCategory, value: TypeCategory, ignore_any: bool) -> bool {
    use TypeCategory::*;

    match target {
        Any => !ignore_any,
        SignedInt(bits) => match value {
            SignedInt(v) => v <= bits,
            UnsignedInt(v) => v < bits,
            _ => false,
        },
        UnsignedInt(bits) => matches!(value, UnsignedInt(v) if v <= bits),
        Float(32) => matches!(value, Float(32) | SignedInt(_) | UnsignedInt(_)),
        Float(_) => matches!(value, Float(_) | SignedInt(_) | UnsignedInt(_)),
        Bool => value == Bool,
        Str => value == Str,
        Nil => value == Nil,
        _ => false,
    }
}

/// Whether `a` outranks `b` when picking the result of mixed arithmetic.
pub fn is_greater(a: TypeCategory, b: TypeCategory) -> bool {
    use TypeCategory::*;

    match a {
        SignedInt(16) => b == UnsignedInt(8),
        SignedInt(32) => matches!(b, SignedInt(8) | SignedInt(16)),
        SignedInt(64) => matches!(b, SignedInt(8) | SignedInt(16) | SignedInt(32)),
        UnsignedInt(16) => b == UnsignedInt(8),
        UnsignedInt(32) => matches!(b, UnsignedInt(8) | UnsignedInt(16)),
        UnsignedInt(64) => matches!(b, UnsignedInt(8) | UnsignedInt(16) | UnsignedInt(32)),
        Float(32) => b != Any && b != Float(64),
        Float(_) => b != Any,
        Enum | Any => true,
        _ => false,
    }
}

/// A binary operand: its type and, when known, its constant value.
#[derive(Debug, Clone, Copy)]
pub struct Operand<'a> {
    pub ty: &'a Type,
    pub constant: Option<&'a Constant>,
}

impl<'a> Operand<'a> {
    pub fn new(ty: &'a Type, constant: Option<&'a Constant>) -> Self {
        Operand { ty, constant }
    }
}

/// Result of solving a binary expression.
#[derive(Debug, Clone)]
pub struct Solved {
    pub ty: Type,
    pub constant: Option<Constant>,
}

fn bool_type() -> Type {
    Type::primitive("bool", TypeCategory::Bool, Position::null())
}

fn u64_type() -> Type {
    Type::primitive("u64", TypeCategory::UnsignedInt(64), Position::null())
}

/// Sized numeric type of `category`, e.g. `i16` or `f64`.
pub fn sized_type(category: TypeCategory, position: Position) -> Type {
    let name = match category {
        TypeCategory::SignedInt(bits) => format!("i{}", bits),
        TypeCategory::UnsignedInt(bits) => format!("u{}", bits),
        TypeCategory::Float(bits) => format!("f{}", bits),
        _ => String::new(),
    };
    Type::primitive(&name, category, position)
}

fn incompatible(left: &Type, right: &Type) -> ErrorImpl {
    ErrorImpl::IncompatibleTypes {
        expected: left.kind.clone(),
        received: right.kind.clone(),
    }
}

fn not_for_type(op: &str, ty: &str) -> ErrorImpl {
    ErrorImpl::OperatorNotForType {
        operator: String::from(op),
        type_: String::from(ty),
    }
}

/// Result type of `left op right`.
///
/// When both operands are constant the result is folded, and a folded numeric
/// result takes the smallest sized type that holds it.
///
/// # Arguments
/// * `left` - Left operand
/// * `right` - Right operand
/// * `op` - Operator text, e.g. `+` or `<<`
///
/// # Returns
/// The solved type and folded value, or the diagnostic for an illegal operation.
pub fn solve_binop(left: Operand, right: Operand, op: &str) -> Result<Solved, ErrorImpl> {
    let ty = solve_type(left, right, op)?;

    let constant = match (left.constant, right.constant) {
        (Some(l), Some(r)) => l.fold_binary(op, r, ty.category)?,
        _ => None,
    };

    let ty = match constant.as_ref().and_then(minimal_category) {
        Some(category) if ty.is_numeric() => sized_type(category, ty.position.clone()),
        _ => ty,
    };
    Ok(Solved { ty, constant })
}

fn solve_type(left: Operand, right: Operand, op: &str) -> Result<Type, ErrorImpl> {
    let (l, r) = (left.ty, right.ty);

    if op == "&&" || op == "||" {
        if l.category != TypeCategory::Bool || r.category != TypeCategory::Bool || !l.is_pure() || !r.is_pure() {
            return Err(ErrorImpl::LogicalNotBool);
        }
        return Ok(bool_type());
    }

    if l.is_fn() || r.is_fn() {
        if !l.is_nil() && !r.is_nil() {
            return Err(incompatible(l, r));
        }
        return equality_only(op, "fn");
    }

    if l.is_array() || r.is_array() || l.is_slice() || r.is_slice() || l.is_map() || r.is_map() {
        if !compatible(l, r, true) {
            return Err(incompatible(l, r));
        }
        let kind = if l.is_nil() { &r.kind } else { &l.kind };
        return equality_only(op, kind);
    }

    if l.is_ptr() || r.is_ptr() || l.is_ref() || r.is_ref() {
        if !compatible(l, r, true) {
            return Err(incompatible(l, r));
        }
        let pointer = if l.is_ptr() || l.is_ref() { l } else { r };
        return match op {
            "+" | "-" => Ok(pointer.clone()),
            _ if is_comparison(op) => Ok(bool_type()),
            _ => Err(not_for_type(op, "pointer")),
        };
    }

    if is_enum(l) || is_enum(r) {
        let l = enum_base(l);
        let r = enum_base(r);
        return solve_type(Operand::new(&l, left.constant), Operand::new(&r, right.constant), op);
    }

    if is_struct(l) || is_struct(r) {
        if l.kind != r.kind {
            return Err(incompatible(l, r));
        }
        return equality_only(op, "struct");
    }

    if is_trait(l) || is_trait(r) {
        check_compatible(l, r, true).map_err(|error| match error {
            ErrorImpl::IncompatibleTypes { .. } => incompatible(l, r),
            other => other,
        })?;
        return equality_only(op, "trait");
    }

    if l.is_nil() || r.is_nil() {
        if !compatible(l, r, false) {
            return Err(incompatible(l, r));
        }
        return equality_only(op, "nil");
    }

    if l.category == TypeCategory::Any || r.category == TypeCategory::Any {
        return equality_only(op, "any");
    }

    if l.category == TypeCategory::Bool || r.category == TypeCategory::Bool {
        if !compatible(l, r, true) {
            return Err(incompatible(l, r));
        }
        return equality_only(op, "bool");
    }

    if l.category == TypeCategory::Str || r.category == TypeCategory::Str {
        if l.category != r.category {
            return Err(incompatible(l, r));
        }
        return match op {
            "+" => Ok(Type::primitive("str", TypeCategory::Str, Position::null())),
            _ if is_equality(op) => Ok(bool_type()),
            _ => Err(not_for_type(op, "str")),
        };
    }

    if !l.is_numeric() || !r.is_numeric() {
        return Err(incompatible(l, r));
    }

    if l.category.is_float() || r.category.is_float() {
        return solve_float(l, r, op);
    }
    if l.category.is_unsigned() || r.category.is_unsigned() {
        return solve_integer(l, right, op, ErrorImpl::OperatorNotForUint {
            operator: String::from(op),
        });
    }
    solve_integer(l, right, op, ErrorImpl::OperatorNotForInt {
        operator: String::from(op),
    })
}

fn equality_only(op: &str, type_name: &str) -> Result<Type, ErrorImpl> {
    if is_equality(op) {
        Ok(bool_type())
    } else {
        Err(not_for_type(op, type_name))
    }
}

fn enum_base(ty: &Type) -> Type {
    match &ty.tag {
        TypeTag::Enum(e) if is_enum(ty) => (*e.base).clone(),
        _ => ty.clone(),
    }
}

fn greater(l: &Type, r: &Type) -> Type {
    if is_greater(r.category, l.category) {
        r.clone()
    } else {
        l.clone()
    }
}

fn solve_float(l: &Type, r: &Type, op: &str) -> Result<Type, ErrorImpl> {
    match op {
        _ if is_comparison(op) => Ok(bool_type()),
        "+" | "-" | "*" | "/" => Ok(greater(l, r)),
        "%" if l.category.is_integer() => Ok(l.clone()),
        "%" if r.category.is_integer() => Ok(r.clone()),
        _ => Err(ErrorImpl::OperatorNotForFloat {
            operator: String::from(op),
        }),
    }
}

/// Shift amounts are unsigned integers or non-negative integer constants.
fn is_ok_for_shifting(right: &Operand) -> bool {
    if !right.ty.is_pure() || !right.ty.category.is_integer() {
        return false;
    }
    match right.constant {
        Some(constant) => !constant.is_negative(),
        None => right.ty.category.is_unsigned(),
    }
}

fn solve_integer(l: &Type, right: Operand, op: &str, not_for: ErrorImpl) -> Result<Type, ErrorImpl> {
    let r = right.ty;
    match op {
        _ if is_comparison(op) => Ok(bool_type()),
        "+" | "-" | "*" | "/" | "%" | "&" | "|" | "^" => Ok(greater(l, r)),
        "<<" | ">>" => {
            if !is_ok_for_shifting(&right) {
                return Err(ErrorImpl::BitshiftMustUnsigned);
            }
            Ok(u64_type())
        }
        _ => Err(not_for),
    }
}
