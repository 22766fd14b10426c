//! Compile-time constant values and folding.
//!
//! Folding works on 64-bit payloads: signed values are `i64`, unsigned values
//! `u64`, floats `f64`. The solver decides the result type; this module only
//! computes values and reports division by a constant zero or a result that
//! leaves the 64-bit range.

use std::fmt::Display;

use crate::{
    ast::types::{Type, TypeCategory},
    errors::errors::ErrorImpl,
    lexer::tokens::LiteralClass,
};

pub const MAX_F32: f64 = f32::MAX as f64;
pub const MIN_F32: f64 = f32::MIN as f64;

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    Nil,
}

impl Constant {
    /// Evaluates a literal token.
    ///
    /// # Arguments
    /// * `value` - Literal text as it appears in the source
    /// * `class` - Literal class assigned by the lexer
    ///
    /// # Returns
    /// `None` when a numeric literal does not fit in 64 bits.
    pub fn from_literal(value: &str, class: LiteralClass) -> Option<Constant> {
        match class {
            LiteralClass::Int => parse_int(value),
            LiteralClass::Float => value.replace('_', "").parse::<f64>().ok().map(Constant::Float),
            LiteralClass::Bool => Some(Constant::Bool(value == "true")),
            LiteralClass::Nil => Some(Constant::Nil),
            LiteralClass::Str => Some(Constant::Str(unquote(value))),
            LiteralClass::Rune => {
                let inner = unquote(value);
                let code = unescape(&inner).chars().next().map(|c| c as i64)?;
                Some(Constant::Int(code))
            }
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Constant::Int(_) | Constant::Uint(_) | Constant::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Constant::Int(v) => Some(*v as f64),
            Constant::Uint(v) => Some(*v as f64),
            Constant::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Exact integer value, or `None` for floats with a fraction.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Constant::Int(v) => Some(*v as i128),
            Constant::Uint(v) => Some(*v as i128),
            Constant::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i128),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Constant::Int(v) => *v == 0,
            Constant::Uint(v) => *v == 0,
            Constant::Float(v) => *v == 0.0,
            _ => false,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Constant::Int(v) => *v < 0,
            Constant::Float(v) => *v < 0.0,
            _ => false,
        }
    }

    /// Converts a numeric constant into the payload used by `category`.
    pub fn convert(&self, category: TypeCategory) -> Constant {
        match category {
            TypeCategory::SignedInt(_) => match self {
                Constant::Uint(v) => Constant::Int(*v as i64),
                Constant::Float(v) => Constant::Int(*v as i64),
                other => other.clone(),
            },
            TypeCategory::UnsignedInt(_) => match self {
                Constant::Int(v) => Constant::Uint(*v as u64),
                Constant::Float(v) => Constant::Uint(*v as u64),
                other => other.clone(),
            },
            TypeCategory::Float(_) => match self.as_f64() {
                Some(v) => Constant::Float(v),
                None => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Folds a unary operator.
    ///
    /// # Returns
    /// `Ok(None)` when the operator does not apply, `Err` when a negated
    /// value falls below `i64::MIN`.
    pub fn fold_unary(&self, op: &str) -> Result<Option<Constant>, ErrorImpl> {
        Ok(match (op, self) {
            ("-", Constant::Int(v)) => Some(match v.checked_neg() {
                Some(negated) => Constant::Int(negated),
                None => Constant::Uint(v.unsigned_abs()),
            }),
            ("-", Constant::Uint(v)) => Some(Constant::Int(negate_unsigned(*v)?)),
            ("-", Constant::Float(v)) => Some(Constant::Float(-v)),
            ("+", value) if value.is_numeric() => Some(value.clone()),
            ("!", Constant::Bool(v)) => Some(Constant::Bool(!v)),
            ("^", Constant::Int(v)) => Some(Constant::Int(!v)),
            ("^", Constant::Uint(v)) => Some(Constant::Uint(!v)),
            _ => None,
        })
    }

    /// Folds `self op right` for a result of category `result`.
    ///
    /// Comparison operators produce booleans regardless of `result`.
    ///
    /// # Returns
    /// `Ok(None)` when the pair cannot be folded, `Err` on division by zero.
    pub fn fold_binary(
        &self,
        op: &str,
        right: &Constant,
        result: TypeCategory,
    ) -> Result<Option<Constant>, ErrorImpl> {
        if matches!(op, "/" | "%") && right.is_zero() {
            return Err(ErrorImpl::DivideByZero);
        }

        match (self, right) {
            (Constant::Bool(l), Constant::Bool(r)) => {
                return Ok(match op {
                    "&&" => Some(Constant::Bool(*l && *r)),
                    "||" => Some(Constant::Bool(*l || *r)),
                    "==" => Some(Constant::Bool(l == r)),
                    "!=" => Some(Constant::Bool(l != r)),
                    _ => None,
                });
            }
            (Constant::Str(l), Constant::Str(r)) => {
                return Ok(match op {
                    "+" => Some(Constant::Str(format!("{}{}", l, r))),
                    "==" => Some(Constant::Bool(l == r)),
                    "!=" => Some(Constant::Bool(l != r)),
                    _ => None,
                });
            }
            (Constant::Nil, Constant::Nil) => {
                return Ok(match op {
                    "==" => Some(Constant::Bool(true)),
                    "!=" => Some(Constant::Bool(false)),
                    _ => None,
                });
            }
            _ => {}
        }

        if !self.is_numeric() || !right.is_numeric() {
            return Ok(None);
        }
        if let Some(compared) = compare(self, op, right) {
            return Ok(Some(Constant::Bool(compared)));
        }

        match result {
            TypeCategory::Float(_) => Ok(fold_float(self, op, right)),
            TypeCategory::UnsignedInt(_) => fold_unsigned(self, op, right),
            _ => fold_signed(self, op, right),
        }
    }
}

fn negate_unsigned(v: u64) -> Result<i64, ErrorImpl> {
    if v <= i64::MAX as u64 {
        Ok(-(v as i64))
    } else if v == i64::MIN.unsigned_abs() {
        Ok(i64::MIN)
    } else {
        Err(ErrorImpl::OverflowLimits)
    }
}

fn compare(left: &Constant, op: &str, right: &Constant) -> Option<bool> {
    let ordering = match (left.as_i128(), right.as_i128()) {
        (Some(l), Some(r)) if !matches!(left, Constant::Float(_)) && !matches!(right, Constant::Float(_)) => {
            l.partial_cmp(&r)
        }
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }?;

    match op {
        "==" => Some(ordering.is_eq()),
        "!=" => Some(ordering.is_ne()),
        "<" => Some(ordering.is_lt()),
        "<=" => Some(ordering.is_le()),
        ">" => Some(ordering.is_gt()),
        ">=" => Some(ordering.is_ge()),
        _ => None,
    }
}

fn fold_float(left: &Constant, op: &str, right: &Constant) -> Option<Constant> {
    let l = left.as_f64()?;
    let r = right.as_f64()?;
    let value = match op {
        "+" => l + r,
        "-" => l - r,
        "*" => l * r,
        "/" => l / r,
        "%" => l % r,
        _ => return None,
    };
    Some(Constant::Float(value))
}

fn shift_amount(right: &Constant) -> Option<u32> {
    let amount = right.as_i128()?;
    if amount < 0 {
        return None;
    }
    Some(amount.min(64) as u32)
}

fn fold_unsigned(left: &Constant, op: &str, right: &Constant) -> Result<Option<Constant>, ErrorImpl> {
    let (Some(l), Some(r)) = (left.as_i128(), right.as_i128()) else {
        return Ok(None);
    };
    let (l, r) = (l as u64, r as u64);
    let value = match op {
        "+" => l.checked_add(r),
        "-" => l.checked_sub(r),
        "*" => l.checked_mul(r),
        "/" => Some(l / r),
        "%" => Some(l % r),
        "&" => Some(l & r),
        "|" => Some(l | r),
        "^" => Some(l ^ r),
        "<<" | ">>" => {
            let Some(amount) = shift_amount(right) else {
                return Ok(None);
            };
            let shifted = if op == "<<" { l.checked_shl(amount) } else { l.checked_shr(amount) };
            Some(shifted.unwrap_or(0))
        }
        _ => return Ok(None),
    };
    value.map(|v| Some(Constant::Uint(v))).ok_or(ErrorImpl::OverflowLimits)
}

fn fold_signed(left: &Constant, op: &str, right: &Constant) -> Result<Option<Constant>, ErrorImpl> {
    let (Some(l), Some(r)) = (left.as_i128(), right.as_i128()) else {
        return Ok(None);
    };
    let (l, r) = (l as i64, r as i64);
    let value = match op {
        "+" => l.checked_add(r),
        "-" => l.checked_sub(r),
        "*" => l.checked_mul(r),
        "/" => l.checked_div(r),
        "%" => l.checked_rem(r),
        "&" => Some(l & r),
        "|" => Some(l | r),
        "^" => Some(l ^ r),
        "<<" | ">>" => {
            let Some(amount) = shift_amount(right) else {
                return Ok(None);
            };
            let shifted = if op == "<<" { l.checked_shl(amount) } else { l.checked_shr(amount) };
            Some(shifted.unwrap_or(0))
        }
        _ => return Ok(None),
    };
    value.map(|v| Some(Constant::Int(v))).ok_or(ErrorImpl::OverflowLimits)
}

/// Inclusive value range of an integer category.
pub fn int_limits(category: TypeCategory) -> Option<(i128, i128)> {
    match category {
        TypeCategory::SignedInt(bits) if bits > 0 && bits <= 64 => {
            let max = (1i128 << (bits - 1)) - 1;
            Some((-max - 1, max))
        }
        TypeCategory::UnsignedInt(bits) if bits > 0 && bits <= 64 => {
            Some((0, (1i128 << bits) - 1))
        }
        _ => None,
    }
}

/// Whether a constant fits the numeric type it is assigned to.
///
/// Integer targets take integral values inside their signed or unsigned
/// range. Float targets take any numeric value within the float's limits.
pub fn range_assignable(value: &Constant, target: &Type) -> bool {
    if !target.is_numeric() {
        return false;
    }

    match target.category {
        TypeCategory::Float(bits) => {
            let Some(v) = value.as_f64() else {
                return false;
            };
            if bits == 32 {
                (MIN_F32..=MAX_F32).contains(&v)
            } else {
                v.is_finite()
            }
        }
        category => {
            let (Some((min, max)), Some(v)) = (int_limits(category), value.as_i128()) else {
                return false;
            };
            v >= min && v <= max
        }
    }
}

/// Smallest sized type that holds a folded numeric constant.
pub fn minimal_category(value: &Constant) -> Option<TypeCategory> {
    match value {
        Constant::Int(v) => {
            let v = *v as i128;
            [8, 16, 32, 64]
                .into_iter()
                .map(TypeCategory::SignedInt)
                .find(|category| int_limits(*category).is_some_and(|(min, max)| v >= min && v <= max))
        }
        Constant::Uint(v) => {
            let v = *v as i128;
            [8, 16, 32, 64]
                .into_iter()
                .map(TypeCategory::UnsignedInt)
                .find(|category| int_limits(*category).is_some_and(|(_, max)| v <= max))
        }
        Constant::Float(v) => {
            if (MIN_F32..=MAX_F32).contains(v) {
                Some(TypeCategory::Float(32))
            } else {
                Some(TypeCategory::Float(64))
            }
        }
        _ => None,
    }
}

fn parse_int(value: &str) -> Option<Constant> {
    let text = value.replace('_', "");
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (bin, 2)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text.as_str(), 10)
    };

    let parsed = u64::from_str_radix(digits, radix).ok()?;
    if parsed <= i64::MAX as u64 {
        Some(Constant::Int(parsed as i64))
    } else {
        Some(Constant::Uint(parsed))
    }
}

fn unquote(value: &str) -> String {
    let mut chars = value.chars();
    chars.next();
    chars.next_back();
    String::from(chars.as_str())
}

fn unescape(value: &str) -> String {
    let mut out = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Uint(v) => write!(f, "{}", v),
            Constant::Float(v) => write!(f, "{}", v),
            Constant::Bool(v) => write!(f, "{}", v),
            Constant::Str(v) => write!(f, "{:?}", v),
            Constant::Nil => write!(f, "nil"),
        }
    }
}
