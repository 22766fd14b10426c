//! Type descriptors for the AST.
//!
//! This module defines the structured type used everywhere after parsing:
//!
//! - Primitive categories (sized integers, floats, `bool`, `str`, `any`)
//! - Composite types (slices, arrays, maps, functions, tuples)
//! - References to declarations (structs, traits, enums) by arena id
//! - Pointer and reference modifiers, kept as a sigil prefix
//!
//! Types are produced by the parser with `Named` placeholders and are then
//! refined by the type checker into concrete categories.

use std::{collections::HashMap, fmt::Display, rc::Rc};

use lazy_static::lazy_static;

use crate::{config::CompilerConfig, Position};

use super::{ast::DeclId, expressions::Expr};

pub const VOID_KIND: &str = "<void>";
pub const NIL_KIND: &str = "<nil>";
pub const UNSAFE_KIND: &str = "unsafe";

lazy_static! {
    /// Primitive keywords. A width of 0 stands for the platform width.
    pub static ref PRIMITIVE_LOOKUP: HashMap<&'static str, TypeCategory> = {
        let mut map = HashMap::new();
        map.insert("i8", TypeCategory::SignedInt(8));
        map.insert("i16", TypeCategory::SignedInt(16));
        map.insert("i32", TypeCategory::SignedInt(32));
        map.insert("i64", TypeCategory::SignedInt(64));
        map.insert("int", TypeCategory::SignedInt(0));
        map.insert("u8", TypeCategory::UnsignedInt(8));
        map.insert("u16", TypeCategory::UnsignedInt(16));
        map.insert("u32", TypeCategory::UnsignedInt(32));
        map.insert("u64", TypeCategory::UnsignedInt(64));
        map.insert("uint", TypeCategory::UnsignedInt(0));
        map.insert("uintptr", TypeCategory::UnsignedInt(0));
        map.insert("f32", TypeCategory::Float(32));
        map.insert("f64", TypeCategory::Float(64));
        map.insert("bool", TypeCategory::Bool);
        map.insert("str", TypeCategory::Str);
        map.insert("any", TypeCategory::Any);
        map
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Void,
    SignedInt(u8),
    UnsignedInt(u8),
    Bool,
    Str,
    Float(u8),
    Any,
    Named,
    Fn,
    Nil,
    Map,
    Enum,
    Struct,
    Trait,
    Slice,
    Array,
    UnsafePtr,
}

impl TypeCategory {
    pub fn is_signed(&self) -> bool {
        matches!(self, TypeCategory::SignedInt(_))
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, TypeCategory::UnsignedInt(_))
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, TypeCategory::Float(_))
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Bit width of a numeric category, 0 for everything else.
    pub fn bits(&self) -> u8 {
        match self {
            TypeCategory::SignedInt(bits)
            | TypeCategory::UnsignedInt(bits)
            | TypeCategory::Float(bits) => *bits,
            _ => 0,
        }
    }
}

/// Resolves a primitive keyword, replacing the platform width with the configured one.
pub fn primitive_category(name: &str, config: &CompilerConfig) -> Option<TypeCategory> {
    PRIMITIVE_LOOKUP.get(name).map(|category| match category {
        TypeCategory::SignedInt(0) => TypeCategory::SignedInt(config.int_bits),
        TypeCategory::UnsignedInt(0) => TypeCategory::UnsignedInt(config.int_bits),
        other => *other,
    })
}

/// Declared length of an array type.
#[derive(Debug, Clone)]
pub enum ArraySize {
    None,
    /// `[...]T`, sized from the initializer.
    Auto,
    /// Size expression not yet folded.
    Expr(Box<Expr>),
    Fixed(u64),
}

#[derive(Debug, Clone)]
pub struct Param {
    pub id: String,
    pub ty: Option<Type>,
    pub mutable: bool,
    pub variadic: bool,
    /// `&self` style receivers.
    pub reference: bool,
    pub position: Position,
}

impl Param {
    pub fn new(id: String, position: Position) -> Self {
        Param {
            id,
            ty: None,
            mutable: false,
            variadic: false,
            reference: false,
            position,
        }
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.mutable {
            write!(f, "mut ")?;
        }
        write!(f, "{}", self.id)?;
        if let Some(ty) = &self.ty {
            write!(f, ": ")?;
            if self.variadic {
                write!(f, "...")?;
            }
            write!(f, "{}", ty)?;
        }
        Ok(())
    }
}

/// Signature of a function type or declaration.
#[derive(Debug, Clone)]
pub struct FnSig {
    pub params: Vec<Param>,
    pub ret: Type,
    pub is_unsafe: bool,
}

impl FnSig {
    pub fn kind(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|param| {
                let ty = param
                    .ty
                    .as_ref()
                    .map(|ty| ty.kind.clone())
                    .unwrap_or_else(|| String::from("?"));
                if param.variadic {
                    format!("...{}", ty)
                } else {
                    ty
                }
            })
            .collect();

        let mut out = String::new();
        if self.is_unsafe {
            out.push_str("unsafe ");
        }
        out.push_str(&format!("fn({})", params.join(",")));
        if !self.ret.is_void() {
            out.push_str(&format!(":{}", self.ret.kind));
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct StructRef {
    pub decl: DeclId,
    pub file: Rc<String>,
    /// Traits the struct implements, filled in from `impl` declarations.
    pub traits: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub struct TraitRef {
    pub decl: DeclId,
    pub has_ref_receiver: bool,
}

#[derive(Debug, Clone)]
pub struct EnumRef {
    pub decl: DeclId,
    pub base: Box<Type>,
}

/// Category-specific payload of a type.
#[derive(Debug, Clone)]
pub enum TypeTag {
    None,
    Struct(StructRef),
    Trait(TraitRef),
    Enum(EnumRef),
    Fn(Box<FnSig>),
    Map(Box<Type>, Box<Type>),
}

/// A structured type descriptor.
///
/// `kind` is the canonical string used for identity. It is rebuilt by
/// [`Type::refresh_kind`] whenever the structure changes, so two types are the
/// same type exactly when their categories and kinds match.
#[derive(Debug, Clone)]
pub struct Type {
    pub category: TypeCategory,
    pub kind: String,
    /// Pointer and reference sigils, outermost first.
    pub prefix: String,
    pub ident: String,
    pub generics: Vec<Type>,
    pub component: Option<Box<Type>>,
    pub tag: TypeTag,
    pub multi: Option<Vec<Type>>,
    /// The generic parameter this type was substituted for.
    pub original: Option<Box<Type>>,
    pub size: ArraySize,
    pub cpp_linked: bool,
    pub position: Position,
}

impl Type {
    fn bare(category: TypeCategory, ident: &str, position: Position) -> Self {
        let mut ty = Type {
            category,
            kind: String::new(),
            prefix: String::new(),
            ident: String::from(ident),
            generics: Vec::new(),
            component: None,
            tag: TypeTag::None,
            multi: None,
            original: None,
            size: ArraySize::None,
            cpp_linked: false,
            position,
        };
        ty.refresh_kind();
        ty
    }

    pub fn void() -> Self {
        Type::bare(TypeCategory::Void, VOID_KIND, Position::null())
    }

    pub fn nil() -> Self {
        Type::bare(TypeCategory::Nil, NIL_KIND, Position::null())
    }

    pub fn primitive(name: &str, category: TypeCategory, position: Position) -> Self {
        Type::bare(category, name, position)
    }

    pub fn unsafe_ptr(position: Position) -> Self {
        Type::bare(TypeCategory::UnsafePtr, UNSAFE_KIND, position)
    }

    pub fn named(ident: &str, generics: Vec<Type>, position: Position) -> Self {
        let mut ty = Type::bare(TypeCategory::Named, ident, position);
        ty.generics = generics;
        ty.refresh_kind();
        ty
    }

    pub fn slice(component: Type, position: Position) -> Self {
        let mut ty = Type::bare(TypeCategory::Slice, "", position);
        ty.component = Some(Box::new(component));
        ty.refresh_kind();
        ty
    }

    pub fn array(component: Type, size: ArraySize, position: Position) -> Self {
        let mut ty = Type::bare(TypeCategory::Array, "", position);
        ty.component = Some(Box::new(component));
        ty.size = size;
        ty.refresh_kind();
        ty
    }

    pub fn map(key: Type, value: Type, position: Position) -> Self {
        let mut ty = Type::bare(TypeCategory::Map, "", position);
        ty.tag = TypeTag::Map(Box::new(key), Box::new(value));
        ty.refresh_kind();
        ty
    }

    pub fn func(sig: FnSig, position: Position) -> Self {
        let mut ty = Type::bare(TypeCategory::Fn, "", position);
        ty.tag = TypeTag::Fn(Box::new(sig));
        ty.refresh_kind();
        ty
    }

    /// A tuple-like return type. A single element collapses to itself.
    pub fn multi(mut types: Vec<Type>, position: Position) -> Self {
        if types.len() == 1 {
            return types.remove(0);
        }
        let mut ty = Type::bare(TypeCategory::Void, "", position);
        ty.multi = Some(types);
        ty.refresh_kind();
        ty
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = format!("{}{}", prefix, self.prefix);
        self.refresh_kind();
        self
    }

    /// Rebuilds `kind` from the structure of the type.
    pub fn refresh_kind(&mut self) {
        let base = if let Some(types) = &self.multi {
            let kinds: Vec<&str> = types.iter().map(|ty| ty.kind.as_str()).collect();
            format!("({})", kinds.join(","))
        } else {
            match self.category {
                TypeCategory::Slice => format!("[]{}", self.component_kind()),
                TypeCategory::Array => match &self.size {
                    ArraySize::Fixed(n) => format!("[{}]{}", n, self.component_kind()),
                    ArraySize::Expr(expr) => format!("[{}]{}", expr, self.component_kind()),
                    _ => format!("[...]{}", self.component_kind()),
                },
                TypeCategory::Map => match &self.tag {
                    TypeTag::Map(key, value) => format!("[{}:{}]", key.kind, value.kind),
                    _ => String::from("[?:?]"),
                },
                TypeCategory::Fn => match &self.tag {
                    TypeTag::Fn(sig) => sig.kind(),
                    _ => String::from("fn()"),
                },
                TypeCategory::Named
                | TypeCategory::Struct
                | TypeCategory::Enum
                | TypeCategory::Trait => {
                    if self.generics.is_empty() {
                        self.ident.clone()
                    } else {
                        let kinds: Vec<&str> =
                            self.generics.iter().map(|ty| ty.kind.as_str()).collect();
                        format!("{}[{}]", self.ident, kinds.join(","))
                    }
                }
                _ => self.ident.clone(),
            }
        };
        self.kind = format!("{}{}", self.prefix, base);
    }

    fn component_kind(&self) -> &str {
        self.component
            .as_ref()
            .map(|component| component.kind.as_str())
            .unwrap_or("?")
    }

    pub fn equals(&self, other: &Type) -> bool {
        self.category == other.category && self.kind == other.kind
    }

    pub fn is_void(&self) -> bool {
        self.category == TypeCategory::Void && self.multi.is_none()
    }

    pub fn is_nil(&self) -> bool {
        self.category == TypeCategory::Nil
    }

    pub fn is_unsafe_ptr(&self) -> bool {
        self.category == TypeCategory::UnsafePtr && self.prefix == "*"
    }

    /// `*T`, including the unsafe pointer.
    pub fn is_ptr(&self) -> bool {
        self.prefix.starts_with('*')
    }

    pub fn is_ref(&self) -> bool {
        self.prefix.starts_with('&')
    }

    pub fn is_slice(&self) -> bool {
        self.category == TypeCategory::Slice && self.prefix.is_empty()
    }

    pub fn is_array(&self) -> bool {
        self.category == TypeCategory::Array && self.prefix.is_empty()
    }

    pub fn is_map(&self) -> bool {
        self.category == TypeCategory::Map && self.prefix.is_empty()
    }

    pub fn is_fn(&self) -> bool {
        self.category == TypeCategory::Fn && self.prefix.is_empty()
    }

    pub fn is_multi(&self) -> bool {
        self.multi.is_some()
    }

    /// Not a pointer, reference or container.
    pub fn is_pure(&self) -> bool {
        self.prefix.is_empty()
            && !matches!(
                self.category,
                TypeCategory::Slice | TypeCategory::Array | TypeCategory::Map | TypeCategory::Fn
            )
            && self.multi.is_none()
    }

    pub fn is_nil_compatible(&self) -> bool {
        self.is_nil()
            || self.is_fn()
            || self.is_ptr()
            || self.is_slice()
            || self.is_map()
            || (self.category == TypeCategory::Trait && self.prefix.is_empty())
    }

    pub fn is_numeric(&self) -> bool {
        self.prefix.is_empty() && self.category.is_numeric()
    }

    /// Drops the outermost pointer or reference sigil.
    pub fn elem(&self) -> Type {
        let mut ty = self.clone();
        if !ty.prefix.is_empty() {
            ty.prefix.remove(0);
        }
        ty.refresh_kind();
        ty
    }

    pub fn fn_sig(&self) -> Option<&FnSig> {
        match &self.tag {
            TypeTag::Fn(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn map_types(&self) -> Option<(&Type, &Type)> {
        match &self.tag {
            TypeTag::Map(key, value) => Some((key, value)),
            _ => None,
        }
    }

    pub fn decl(&self) -> Option<DeclId> {
        match &self.tag {
            TypeTag::Struct(s) => Some(s.decl),
            TypeTag::Trait(t) => Some(t.decl),
            TypeTag::Enum(e) => Some(e.decl),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}
