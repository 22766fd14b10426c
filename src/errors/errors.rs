use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
    severity: Severity,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
            severity: Severity::Error,
        }
    }

    pub fn warning(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
            severity: Severity::Warning,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_severity(&self) -> Severity {
        self.severity
    }

    pub fn internal(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// Stable message key of the diagnostic.
    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "unrecognised_token",
            ErrorImpl::InvalidSyntax => "invalid_syntax",
            ErrorImpl::MissingExpr => "missing_expr",
            ErrorImpl::MissingType => "missing_type",
            ErrorImpl::MissingGotoLabel => "missing_goto_label",
            ErrorImpl::MissingReceiver => "missing_receiver",
            ErrorImpl::MissingIdentifiers => "missing_identifiers",
            ErrorImpl::OverflowMultiAssign => "overflow_multi_assign_identifiers",
            ErrorImpl::AlreadyConst => "already_const",
            ErrorImpl::AlreadyVariadic => "already_variadic",
            ErrorImpl::VariadicNotLast => "variadic_parameter_not_last",
            ErrorImpl::DefNotSupportPub => "def_not_support_pub",
            ErrorImpl::BodyNotExist => "body_not_exist",
            ErrorImpl::ElseHaveExpr => "else_have_expr",
            ErrorImpl::MuchForeachVars => "much_foreach_vars",
            ErrorImpl::ExprNotFuncCall => "expr_not_func_call",
            ErrorImpl::UnclosedBrace { .. } => "unclosed_brace",
            ErrorImpl::MissingBlockComment => "missing_block_comment",
            ErrorImpl::InvalidUsePath => "invalid_use_path",
            ErrorImpl::DuplicateUse { .. } => "duplicate_use",
            ErrorImpl::UnsafeOutsideBlock => "unsafe_outside_block",
            ErrorImpl::IncompatibleTypes { .. } => "incompatible_types",
            ErrorImpl::OperatorNotForType { .. } => "operator_not_for_type",
            ErrorImpl::OperatorNotForFloat { .. } => "operator_not_for_float",
            ErrorImpl::OperatorNotForInt { .. } => "operator_not_for_int",
            ErrorImpl::OperatorNotForUint { .. } => "operator_not_for_uint",
            ErrorImpl::LogicalNotBool => "logical_not_bool",
            ErrorImpl::BitshiftMustUnsigned => "bitshift_must_unsigned",
            ErrorImpl::DivideByZero => "divide_by_zero",
            ErrorImpl::OverflowLimits => "overflow_limits",
            ErrorImpl::ExistId { .. } => "exist_id",
            ErrorImpl::IdNotExist { .. } => "id_not_exist",
            ErrorImpl::NotAccessible { .. } => "not_accessible",
            ErrorImpl::TraitHasReferenceParameteredFunction => {
                "trait_has_reference_parametered_function"
            }
            ErrorImpl::GenericsOverflow => "generics_overflow",
            ErrorImpl::HasGenerics => "has_generics",
            ErrorImpl::MissingGenerics => "missing_generics",
            ErrorImpl::ArraySizeMismatch { .. } => "array_size_mismatch",
            ErrorImpl::ExprNotConst => "expr_not_const",
            ErrorImpl::AssignImmutable { .. } => "assign_immutable",
            ErrorImpl::VoidFunctionReturnValue => "void_function_return_value",
            ErrorImpl::RequireReturnValue => "require_return_value",
            ErrorImpl::OverflowReturn => "overflow_return",
            ErrorImpl::ForeachNotIterable { .. } => "foreach_not_iterable",
            ErrorImpl::LabelNotExist { .. } => "label_not_exist",
            ErrorImpl::MissingArguments { .. } => "missing_argument",
            ErrorImpl::UnexpectedArguments { .. } => "argument_overflow",
            ErrorImpl::NotSupportsIndexing { .. } => "not_supports_indexing",
            ErrorImpl::NotSupportsCasting { .. } => "type_not_supports_casting",
            ErrorImpl::MemberNotExist { .. } => "member_not_exist",
        }
    }

    /// Positional message arguments, in the order the message key expects them.
    pub fn args(&self) -> Vec<String> {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { token } => vec![token.clone()],
            ErrorImpl::UnclosedBrace { brace } => vec![brace.clone()],
            ErrorImpl::DuplicateUse { path } => vec![path.clone()],
            ErrorImpl::IncompatibleTypes { expected, received } => {
                vec![expected.clone(), received.clone()]
            }
            ErrorImpl::OperatorNotForType { operator, type_ } => {
                vec![operator.clone(), type_.clone()]
            }
            ErrorImpl::OperatorNotForFloat { operator }
            | ErrorImpl::OperatorNotForInt { operator }
            | ErrorImpl::OperatorNotForUint { operator } => vec![operator.clone()],
            ErrorImpl::ExistId { id }
            | ErrorImpl::IdNotExist { id }
            | ErrorImpl::NotAccessible { id }
            | ErrorImpl::AssignImmutable { id }
            | ErrorImpl::MemberNotExist { id } => vec![id.clone()],
            ErrorImpl::ArraySizeMismatch { expected, received }
            | ErrorImpl::MissingArguments { expected, received }
            | ErrorImpl::UnexpectedArguments { expected, received } => {
                vec![expected.to_string(), received.to_string()]
            }
            ErrorImpl::ForeachNotIterable { type_ } | ErrorImpl::NotSupportsIndexing { type_ } => {
                vec![type_.clone()]
            }
            ErrorImpl::LabelNotExist { label } => vec![label.clone()],
            ErrorImpl::NotSupportsCasting { from, to } => vec![from.clone(), to.clone()],
            _ => vec![],
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::InvalidSyntax => ErrorTip::None,
            ErrorImpl::MissingExpr => {
                ErrorTip::Suggestion(String::from("an expression is required here"))
            }
            ErrorImpl::MissingType => {
                ErrorTip::Suggestion(String::from("add a type annotation after `:`"))
            }
            ErrorImpl::MissingReceiver => ErrorTip::Suggestion(String::from(
                "trait methods take `self` or `&self` as their first parameter",
            )),
            ErrorImpl::MissingIdentifiers => ErrorTip::Suggestion(String::from(
                "the right side returns more values than there are identifiers",
            )),
            ErrorImpl::OverflowMultiAssign => ErrorTip::Suggestion(String::from(
                "there are more identifiers than returned values",
            )),
            ErrorImpl::VariadicNotLast => ErrorTip::Suggestion(String::from(
                "only the last parameter may be variadic",
            )),
            ErrorImpl::BodyNotExist => {
                ErrorTip::Suggestion(String::from("expected a `{ ... }` body"))
            }
            ErrorImpl::UnclosedBrace { brace } => {
                ErrorTip::Suggestion(format!("`{}` is never closed", brace))
            }
            ErrorImpl::IncompatibleTypes { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::OperatorNotForType { operator, type_ } => ErrorTip::Suggestion(format!(
                "`{}` cannot be used with `{}`",
                operator, type_
            )),
            ErrorImpl::BitshiftMustUnsigned => ErrorTip::Suggestion(String::from(
                "shift amounts must be unsigned or a non-negative constant",
            )),
            ErrorImpl::OverflowLimits => ErrorTip::Suggestion(String::from(
                "the constant does not fit in the target type",
            )),
            ErrorImpl::ExistId { id } => {
                ErrorTip::Suggestion(format!("`{}` is already declared in this scope", id))
            }
            ErrorImpl::IdNotExist { id } => {
                ErrorTip::Suggestion(format!("`{}` is not declared", id))
            }
            ErrorImpl::NotAccessible { id } => ErrorTip::Suggestion(format!(
                "`{}` is not public and is declared in another directory",
                id
            )),
            ErrorImpl::TraitHasReferenceParameteredFunction => ErrorTip::Suggestion(
                String::from("the trait has `&self` methods, pass the structure by reference"),
            ),
            ErrorImpl::ArraySizeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "array is declared with {} elements, initializer has {}",
                expected, received
            )),
            ErrorImpl::MissingArguments { expected, received }
            | ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(
                format!("Expected {} arguments, received {}", expected, received),
            ),
            ErrorImpl::LabelNotExist { label } => {
                ErrorTip::Suggestion(format!("no label named `{}` in this function", label))
            }
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.position.file, self.position.row, self.position.column, self.internal_error
        )
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("invalid syntax")]
    InvalidSyntax,
    #[error("missing expression")]
    MissingExpr,
    #[error("missing type")]
    MissingType,
    #[error("goto statement without a label")]
    MissingGotoLabel,
    #[error("method has no receiver")]
    MissingReceiver,
    #[error("missing identifiers for the assigned values")]
    MissingIdentifiers,
    #[error("more identifiers than assigned values")]
    OverflowMultiAssign,
    #[error("already constant")]
    AlreadyConst,
    #[error("parameter is already variadic")]
    AlreadyVariadic,
    #[error("variadic parameter is not the last parameter")]
    VariadicNotLast,
    #[error("definition does not support `pub`")]
    DefNotSupportPub,
    #[error("body does not exist")]
    BodyNotExist,
    #[error("else branch cannot have a condition")]
    ElseHaveExpr,
    #[error("foreach loops take at most two variables")]
    MuchForeachVars,
    #[error("expression is not a function call")]
    ExprNotFuncCall,
    #[error("unclosed {brace:?}")]
    UnclosedBrace { brace: String },
    #[error("block comment is never closed")]
    MissingBlockComment,
    #[error("invalid use path")]
    InvalidUsePath,
    #[error("{path:?} is already used")]
    DuplicateUse { path: String },
    #[error("unsafe behavior outside of an unsafe scope")]
    UnsafeOutsideBlock,
    #[error("incompatible types: expected {expected:?}, received {received:?}")]
    IncompatibleTypes { expected: String, received: String },
    #[error("operator {operator:?} is not defined for {type_:?}")]
    OperatorNotForType { operator: String, type_: String },
    #[error("operator {operator:?} is not defined for floating-point types")]
    OperatorNotForFloat { operator: String },
    #[error("operator {operator:?} is not defined for signed integers")]
    OperatorNotForInt { operator: String },
    #[error("operator {operator:?} is not defined for unsigned integers")]
    OperatorNotForUint { operator: String },
    #[error("logical operators require boolean operands")]
    LogicalNotBool,
    #[error("shift amount must be unsigned")]
    BitshiftMustUnsigned,
    #[error("division by zero")]
    DivideByZero,
    #[error("constant overflows the limits of its type")]
    OverflowLimits,
    #[error("{id:?} already exists")]
    ExistId { id: String },
    #[error("{id:?} does not exist")]
    IdNotExist { id: String },
    #[error("{id:?} is not accessible")]
    NotAccessible { id: String },
    #[error("trait has reference-receiver methods")]
    TraitHasReferenceParameteredFunction,
    #[error("too many generic arguments")]
    GenericsOverflow,
    #[error("definition has no generic parameters")]
    HasGenerics,
    #[error("missing generic arguments")]
    MissingGenerics,
    #[error("array size mismatch: expected {expected}, received {received}")]
    ArraySizeMismatch { expected: usize, received: usize },
    #[error("expression is not constant")]
    ExprNotConst,
    #[error("{id:?} is immutable")]
    AssignImmutable { id: String },
    #[error("void function returns a value")]
    VoidFunctionReturnValue,
    #[error("return value required")]
    RequireReturnValue,
    #[error("too many return values")]
    OverflowReturn,
    #[error("{type_:?} is not iterable")]
    ForeachNotIterable { type_: String },
    #[error("label {label:?} does not exist")]
    LabelNotExist { label: String },
    #[error("missing arguments: expected {expected:?}, received {received:?}")]
    MissingArguments { expected: usize, received: usize },
    #[error("unexpected arguments: expected {expected:?}, received {received:?}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("{type_:?} does not support indexing")]
    NotSupportsIndexing { type_: String },
    #[error("{from:?} cannot be cast to {to:?}")]
    NotSupportsCasting { from: String, to: String },
    #[error("member {id:?} does not exist")]
    MemberNotExist { id: String },
}

/// Ordered list of every diagnostic produced by a pass.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { items: vec![] }
    }

    pub fn push(&mut self, error: Error) {
        self.items.push(error);
    }

    pub fn push_error(&mut self, error_impl: ErrorImpl, position: Position) {
        self.items.push(Error::new(error_impl, position));
    }

    pub fn push_warning(&mut self, error_impl: ErrorImpl, position: Position) {
        self.items.push(Error::warning(error_impl, position));
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = Error>) {
        self.items.extend(errors);
    }

    pub fn append(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.get_severity() == Severity::Error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.items.iter()
    }

    /// Message keys in report order.
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.get_error_name()).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|item| item.get_error_name() == key)
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
