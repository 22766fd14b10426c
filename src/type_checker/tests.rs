//! Unit tests for the type checker module.
//!
//! Covers the building blocks on their own (constants, the compatibility
//! solver, the symbol table, generic instantiation) and the checker as a
//! whole on small programs.

use std::rc::Rc;

use crate::{
    ast::{
        ast::{Ast, Decl, GenericParam},
        expressions::ExprKind,
        statements::{Block, StmtKind, Var},
        types::{ArraySize, Type, TypeCategory},
    },
    config::CompilerConfig,
    errors::errors::{Diagnostics, ErrorImpl},
    lexer::{lexer::tokenize, tokens::LiteralClass},
    parser::parser::parse,
    Position,
};

use super::{
    constant::{minimal_category, range_assignable, Constant},
    defmap::{Def, DefKind, Defmap, ScopeKind},
    generics::instantiate,
    solver::{compatible, sized_type, solve_binop, Operand},
    type_checker::{type_check, TypeChecker},
};

fn check_with(source: &str, config: &CompilerConfig) -> (Ast, TypeChecker, Diagnostics) {
    let tokens = tokenize(source.to_string(), Some("test.jn".to_string())).unwrap();
    let (parser, mut ast) = parse(tokens, config);
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());
    let (checker, diagnostics) = type_check(&mut ast, config);
    (ast, checker, diagnostics)
}

fn check(source: &str) -> (Ast, TypeChecker, Diagnostics) {
    check_with(source, &CompilerConfig::default())
}

fn keys(source: &str) -> Vec<String> {
    let (_, _, diagnostics) = check(source);
    diagnostics.keys().into_iter().map(String::from).collect()
}

fn body<'a>(ast: &'a Ast, name: &str) -> &'a Block {
    ast.decls
        .iter()
        .find_map(|decl| match decl {
            Decl::Func(func) if func.id == name => func.body.as_ref(),
            _ => None,
        })
        .unwrap()
}

fn local<'a>(block: &'a Block, id: &str) -> &'a Var {
    block
        .stmts
        .iter()
        .find_map(|stmt| match &stmt.kind {
            StmtKind::Var(var) if var.id == id => Some(var),
            _ => None,
        })
        .unwrap()
}

fn prim(name: &str, category: TypeCategory) -> Type {
    Type::primitive(name, category, Position::null())
}

fn at(file: &str) -> Position {
    Position::new(1, 1, Rc::new(String::from(file)))
}

#[test]
fn test_literal_constants() {
    assert_eq!(Constant::from_literal("0x1F", LiteralClass::Int), Some(Constant::Int(31)));
    assert_eq!(Constant::from_literal("1_000", LiteralClass::Int), Some(Constant::Int(1000)));
    assert_eq!(Constant::from_literal("'a'", LiteralClass::Rune), Some(Constant::Int(97)));
    assert_eq!(
        Constant::from_literal("\"hi\"", LiteralClass::Str),
        Some(Constant::Str(String::from("hi")))
    );
}

#[test]
fn test_range_assignable() {
    let i8_ty = prim("i8", TypeCategory::SignedInt(8));
    let u8_ty = prim("u8", TypeCategory::UnsignedInt(8));
    let f32_ty = prim("f32", TypeCategory::Float(32));

    assert!(range_assignable(&Constant::Int(120), &i8_ty));
    assert!(range_assignable(&Constant::Int(-128), &i8_ty));
    assert!(!range_assignable(&Constant::Int(300), &i8_ty));
    assert!(!range_assignable(&Constant::Int(-1), &u8_ty));
    assert!(range_assignable(&Constant::Uint(255), &u8_ty));
    assert!(!range_assignable(&Constant::Float(1.5), &i8_ty));
    assert!(!range_assignable(&Constant::Float(1e39), &f32_ty));
    assert!(range_assignable(&Constant::Int(7), &f32_ty));
}

#[test]
fn test_minimal_category() {
    assert_eq!(minimal_category(&Constant::Int(100)), Some(TypeCategory::SignedInt(8)));
    assert_eq!(minimal_category(&Constant::Int(-129)), Some(TypeCategory::SignedInt(16)));
    assert_eq!(minimal_category(&Constant::Uint(70_000)), Some(TypeCategory::UnsignedInt(32)));
    assert_eq!(minimal_category(&Constant::Float(0.5)), Some(TypeCategory::Float(32)));
    assert_eq!(minimal_category(&Constant::Bool(true)), None);
}

#[test]
fn test_primitive_compatibility() {
    let i16_ty = prim("i16", TypeCategory::SignedInt(16));
    let i32_ty = prim("i32", TypeCategory::SignedInt(32));
    let i64_ty = prim("i64", TypeCategory::SignedInt(64));
    let u32_ty = prim("u32", TypeCategory::UnsignedInt(32));
    let f32_ty = prim("f32", TypeCategory::Float(32));
    let any_ty = prim("any", TypeCategory::Any);

    assert!(compatible(&i32_ty, &i16_ty, false));
    assert!(!compatible(&i16_ty, &i32_ty, false));
    assert!(compatible(&i64_ty, &u32_ty, false));
    assert!(!compatible(&i32_ty, &u32_ty, false));
    assert!(compatible(&f32_ty, &i64_ty, false));
    assert!(compatible(&any_ty, &i32_ty, false));
    assert!(!compatible(&any_ty, &i32_ty, true));
}

#[test]
fn test_compatibility_symmetry() {
    let source = "trait Err {\n    fn message(self): str\n}\nstruct S {\n    code: int\n}\nimpl Err for S {\n    fn message(self): str {\n        ret \"failed\"\n    }\n}\nstruct Plain {\n    code: int\n}";
    let (_, checker, diagnostics) = check(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());
    let named = |id: &str| checker.defmap.get(id).unwrap().ty.clone();
    let (err, s, plain) = (named("Err"), named("S"), named("Plain"));

    let i32_ty = prim("i32", TypeCategory::SignedInt(32));
    let str_ty = prim("str", TypeCategory::Str);
    let four = Type::array(i32_ty.clone(), ArraySize::Fixed(4), Position::null());
    let five = Type::array(i32_ty.clone(), ArraySize::Fixed(5), Position::null());
    let bytes = Type::array(prim("u8", TypeCategory::UnsignedInt(8)), ArraySize::Fixed(4), Position::null());
    let counts = Type::map(str_ty.clone(), i32_ty.clone(), Position::null());
    let flags = Type::map(str_ty.clone(), prim("bool", TypeCategory::Bool), Position::null());
    let nil = Type::nil();

    let pairs = [
        (&s, &s),
        (&s, &plain),
        (&four, &four),
        (&four, &five),
        (&four, &bytes),
        (&counts, &counts),
        (&counts, &flags),
        (&counts, &nil),
        (&err, &s),
        (&err, &plain),
        (&err, &err),
        (&err, &nil),
    ];
    for (a, b) in pairs {
        assert_eq!(compatible(a, b, false), compatible(b, a, false), "{} and {}", a.kind, b.kind);
    }

    assert!(compatible(&s, &err, false));
    assert!(compatible(&nil, &counts, false));
    assert!(!compatible(&five, &four, false));
    assert!(!compatible(&plain, &s, false));
}

#[test]
fn test_solve_binop_folds() {
    let i8_ty = prim("i8", TypeCategory::SignedInt(8));
    let five = Constant::Int(5);
    let three = Constant::Int(3);

    let solved = solve_binop(Operand::new(&i8_ty, Some(&five)), Operand::new(&i8_ty, Some(&three)), "*").unwrap();
    assert_eq!(solved.constant, Some(Constant::Int(15)));
    assert_eq!(solved.ty.kind, "i8");

    let solved = solve_binop(Operand::new(&i8_ty, Some(&five)), Operand::new(&i8_ty, Some(&three)), "<").unwrap();
    assert_eq!(solved.constant, Some(Constant::Bool(false)));
    assert_eq!(solved.ty.category, TypeCategory::Bool);

    let solved = solve_binop(Operand::new(&i8_ty, Some(&five)), Operand::new(&i8_ty, Some(&three)), "/").unwrap();
    assert_eq!(solved.constant, Some(Constant::Int(1)));
}

#[test]
fn test_solve_binop_rejects() {
    let i32_ty = prim("i32", TypeCategory::SignedInt(32));
    let f64_ty = prim("f64", TypeCategory::Float(64));
    let bool_ty = prim("bool", TypeCategory::Bool);
    let str_ty = prim("str", TypeCategory::Str);
    let zero = Constant::Int(0);
    let one = Constant::Int(1);

    let err = solve_binop(Operand::new(&i32_ty, Some(&one)), Operand::new(&i32_ty, Some(&zero)), "/").unwrap_err();
    assert!(matches!(err, ErrorImpl::DivideByZero));

    let err = solve_binop(Operand::new(&i32_ty, None), Operand::new(&i32_ty, None), "<<").unwrap_err();
    assert!(matches!(err, ErrorImpl::BitshiftMustUnsigned));

    let err = solve_binop(Operand::new(&f64_ty, None), Operand::new(&f64_ty, None), "%").unwrap_err();
    assert!(matches!(err, ErrorImpl::OperatorNotForFloat { .. }));

    let err = solve_binop(Operand::new(&bool_ty, None), Operand::new(&i32_ty, None), "&&").unwrap_err();
    assert!(matches!(err, ErrorImpl::LogicalNotBool));

    let err = solve_binop(Operand::new(&str_ty, None), Operand::new(&str_ty, None), "-").unwrap_err();
    assert!(matches!(err, ErrorImpl::OperatorNotForType { .. }));

    let joined = solve_binop(Operand::new(&str_ty, None), Operand::new(&str_ty, None), "+").unwrap();
    assert_eq!(joined.ty.kind, "str");
}

#[test]
fn test_sized_type_names() {
    assert_eq!(sized_type(TypeCategory::SignedInt(16), Position::null()).kind, "i16");
    assert_eq!(sized_type(TypeCategory::UnsignedInt(64), Position::null()).kind, "u64");
    assert_eq!(sized_type(TypeCategory::Float(32), Position::null()).kind, "f32");
}

#[test]
fn test_defmap_scoping() {
    let mut defmap = Defmap::new();
    let int = prim("int", TypeCategory::SignedInt(64));
    let here = at("test.jn");

    defmap.declare(Def::new("x", DefKind::Global, int.clone(), here.clone())).unwrap();
    let err = defmap.declare(Def::new("x", DefKind::Global, int.clone(), here.clone())).unwrap_err();
    assert!(matches!(err, ErrorImpl::ExistId { .. }));

    defmap.push_scope(ScopeKind::Owner);
    defmap.declare(Def::new("self", DefKind::Local, int.clone(), here.clone())).unwrap();
    defmap.push_scope(ScopeKind::Func);
    defmap
        .declare(Def::new("x", DefKind::Local, int.clone(), here.clone()).with_mutable(true))
        .unwrap();
    assert_eq!(defmap.lookup("x", &here).unwrap().def.kind, DefKind::Local);
    assert!(defmap.lookup("self", &here).is_ok());

    defmap.pop_scope();
    assert_eq!(defmap.lookup("x", &here).unwrap().def.kind, DefKind::Global);
    assert!(defmap.lookup("self", &here).is_ok());
    defmap.pop_scope();
    assert!(defmap.lookup("self", &here).is_err());

    // The file scope stays.
    defmap.pop_scope();
    assert!(defmap.file_def("x").is_some());

    let err = defmap.lookup("y", &here).unwrap_err();
    assert!(matches!(err, ErrorImpl::IdNotExist { .. }));
}

#[test]
fn test_defmap_visibility_and_imports() {
    let int = prim("int", TypeCategory::SignedInt(64));

    let mut imported = Defmap::new();
    imported
        .declare(Def::new("hidden", DefKind::Global, int.clone(), at("lib/io.jn")))
        .unwrap();
    imported
        .declare(Def::new("shown", DefKind::Global, int.clone(), at("lib/io.jn")).with_pub(true))
        .unwrap();
    let defmap = Defmap::new().with_side(imported);

    let found = defmap.lookup("shown", &at("app/main.jn")).unwrap();
    assert!(found.imported);

    let err = defmap.lookup("hidden", &at("app/main.jn")).unwrap_err();
    assert!(matches!(err, ErrorImpl::NotAccessible { .. }));
    assert!(defmap.lookup("hidden", &at("lib/other.jn")).is_ok());
}

#[test]
fn test_instantiate_generics() {
    let params = vec![GenericParam {
        id: String::from("T"),
        position: Position::null(),
    }];
    let args = vec![prim("i32", TypeCategory::SignedInt(32))];

    let ptr = Type::named("T", Vec::new(), Position::null()).with_prefix("*");
    let out = instantiate(&ptr, &params, &args);
    assert_eq!(out.kind, "*i32");
    assert!(out.original.is_some());

    let slice = Type::slice(Type::named("T", Vec::new(), Position::null()), Position::null());
    assert_eq!(instantiate(&slice, &params, &args).kind, "[]i32");

    let array = Type::array(prim("u8", TypeCategory::UnsignedInt(8)), ArraySize::Fixed(4), Position::null());
    assert_eq!(instantiate(&array, &params, &args).kind, "[4]u8");
}

#[test]
fn test_constant_range_on_declaration() {
    assert!(keys("fn main() {\n    let x: i8 = 300\n}").contains(&String::from("overflow_limits")));
    assert!(keys("fn main() {\n    let x: i8 = 120\n}").is_empty());
    assert!(keys("fn main() {\n    let x: u8 = -1\n}").contains(&String::from("overflow_limits")));
}

#[test]
fn test_negated_unsigned_literals() {
    assert_eq!(Constant::Uint(5).fold_unary("-").unwrap(), Some(Constant::Int(-5)));
    assert_eq!(Constant::Uint(1 << 63).fold_unary("-").unwrap(), Some(Constant::Int(i64::MIN)));
    assert!(matches!(Constant::Uint(u64::MAX).fold_unary("-"), Err(ErrorImpl::OverflowLimits)));
    assert_eq!(Constant::Int(i64::MIN).fold_unary("-").unwrap(), Some(Constant::Uint(1 << 63)));

    let (ast, _, diagnostics) = check("fn main() {\n    let x: i64 = -9223372036854775808\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());
    let x = local(body(&ast, "main"), "x");
    assert_eq!(x.init.as_ref().unwrap().constant, Some(Constant::Int(i64::MIN)));

    assert!(keys("fn main() {\n    let x: i64 = -9223372036854775807\n}").is_empty());
    assert_eq!(keys("fn main() {\n    let x: i64 = -10000000000000000000\n}"), vec!["overflow_limits"]);
    assert_eq!(keys("fn main() {\n    let x: i8 = -18446744073709551615\n}"), vec!["overflow_limits"]);
}

#[test]
fn test_folding_overflow() {
    let int = TypeCategory::SignedInt(64);
    let err = Constant::Int(i64::MAX).fold_binary("*", &Constant::Int(2), int).unwrap_err();
    assert!(matches!(err, ErrorImpl::OverflowLimits));
    let err = Constant::Int(i64::MIN).fold_binary("/", &Constant::Int(-1), int).unwrap_err();
    assert!(matches!(err, ErrorImpl::OverflowLimits));
    let err = Constant::Uint(1).fold_binary("-", &Constant::Uint(2), TypeCategory::UnsignedInt(64)).unwrap_err();
    assert!(matches!(err, ErrorImpl::OverflowLimits));
    assert_eq!(
        Constant::Int(i64::MAX - 1).fold_binary("+", &Constant::Int(1), int).unwrap(),
        Some(Constant::Int(i64::MAX))
    );

    assert_eq!(keys("fn main() {\n    let x = 9223372036854775807 + 1\n}"), vec!["overflow_limits"]);
    assert!(keys("fn main() {\n    let x: i64 = 9223372036854775806 + 1\n}").is_empty());
}

#[test]
fn test_folded_initializer() {
    let (ast, _, diagnostics) = check("fn main() {\n    let x: i32 = 1 + 2 * 3\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    let x = local(body(&ast, "main"), "x");
    assert_eq!(x.resolved.as_ref().unwrap().kind, "i32");
    assert_eq!(x.init.as_ref().unwrap().constant, Some(Constant::Int(7)));
}

#[test]
fn test_untyped_defaults() {
    let (ast, _, diagnostics) = check("fn main() {\n    let a = 1\n    let b = 2.5\n    let c = \"s\"\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    let block = body(&ast, "main");
    assert_eq!(local(block, "a").resolved.as_ref().unwrap().kind, "int");
    assert_eq!(local(block, "b").resolved.as_ref().unwrap().kind, "f64");
    assert_eq!(local(block, "c").resolved.as_ref().unwrap().kind, "str");
}

#[test]
fn test_generic_struct_identity() {
    let source = "struct Box[T] {\n    v: T\n}\nfn main() {\n    let a: Box[i32] = Box[i32]{1}\n    let b: Box[i64] = a\n}";
    let (_, checker, diagnostics) = check(source);
    assert_eq!(diagnostics.keys(), vec!["incompatible_types"]);
    assert_eq!(checker.struct_instances.len(), 2);
}

#[test]
fn test_generic_counts() {
    let source = "struct Box[T] {\n    v: T\n}\nfn main() {\n    let a: Box = nil\n}";
    assert!(keys(source).contains(&String::from("missing_generics")));

    let source = "struct Box[T] {\n    v: T\n}\nfn main() {\n    let a: Box[i32, str] = nil\n}";
    assert!(keys(source).contains(&String::from("generics_overflow")));

    let source = "fn plain() {}\nfn main() {\n    plain[int]()\n}";
    assert_eq!(keys(source), vec!["has_generics"]);
}

#[test]
fn test_generic_function_instances() {
    let source = "fn id[T](v: T): T {\n    ret v\n}\nfn main() {\n    let x: i64 = id[i64](5)\n    let y = id(true)\n    let z = id[i64](6)\n}";
    let (ast, checker, diagnostics) = check(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    assert_eq!(checker.fn_instances.len(), 2);
    assert_eq!(checker.fn_instances[0].generics[0].kind, "i64");
    assert_eq!(checker.fn_instances[1].generics[0].kind, "bool");
    assert!(checker.fn_instances.iter().all(|instance| instance.body.is_some()));
    assert_eq!(local(body(&ast, "main"), "y").resolved.as_ref().unwrap().kind, "bool");

    let source = "fn id[T](v: T): T {\n    ret v\n}\nfn main() {\n    id[i64, bool](5)\n}";
    assert_eq!(keys(source), vec!["generics_overflow"]);
}

#[test]
fn test_multi_assign_arity() {
    let prelude = "fn pair(): (int, int) {\n    ret 1, 2\n}\n";

    let source = format!("{}fn main() {{\n    let (a, b) = pair()\n}}", prelude);
    assert!(keys(&source).is_empty());

    let source = format!("{}fn main() {{\n    let (a, b, c) = pair()\n}}", prelude);
    assert_eq!(keys(&source), vec!["overflow_multi_assign_identifiers"]);

    let source = format!("{}fn main() {{\n    let x = pair()\n}}", prelude);
    assert_eq!(keys(&source), vec!["missing_identifiers"]);

    let source = "fn main() {\n    let mut a = 1\n    let mut b = 2\n    a, b = 1\n}";
    assert_eq!(keys(source), vec!["overflow_multi_assign_identifiers"]);
}

#[test]
fn test_swap_assignment() {
    let source = "fn main() {\n    let mut a = 1\n    let mut b = 2\n    a, b = b, a\n}";
    assert!(keys(source).is_empty());
}

#[test]
fn test_assign_immutable() {
    assert_eq!(keys("fn main() {\n    let x = 1\n    x = 2\n}"), vec!["assign_immutable"]);
    assert!(keys("fn main() {\n    let mut x = 1\n    x = 2\n}").is_empty());
    assert_eq!(keys("const LIMIT = 4\nfn main() {\n    LIMIT = 5\n}"), vec!["assign_immutable"]);
}

#[test]
fn test_compound_assign_range() {
    assert!(keys("fn main() {\n    let mut x: u8 = 1\n    x += 3\n}").is_empty());
    assert_eq!(keys("fn main() {\n    let mut x: u8 = 1\n    x += 300\n}"), vec!["overflow_limits"]);
    assert!(keys("fn main() {\n    let mut x: i32 = 1\n    x <<= 2\n    x >>= 1\n}").is_empty());
    assert_eq!(keys("fn main() {\n    let mut x: i32 = 1\n    x <<= -1\n}"), vec!["bitshift_must_unsigned"]);
}

#[test]
fn test_parenthesised_callee() {
    let source = "fn inc(x: int): int {\n    ret x + 1\n}\nfn main() {\n    let y = (inc)(2)\n    let z = (i64)(2)\n}";
    let (ast, _, diagnostics) = check(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    let main = body(&ast, "main");
    let y = local(main, "y");
    assert!(matches!(y.init.as_ref().unwrap().kind, ExprKind::Call { .. }));
    assert_eq!(y.resolved.as_ref().unwrap().kind, "int");
    let z = local(main, "z");
    assert!(matches!(z.init.as_ref().unwrap().kind, ExprKind::Cast { .. }));
}

#[test]
fn test_redeclare_and_missing_ids() {
    assert_eq!(keys("fn main() {\n    let x = 1\n    let x = 2\n}"), vec!["exist_id"]);
    assert_eq!(keys("fn main() {\n    y = 1\n}"), vec!["id_not_exist"]);
    assert!(keys("fn main() {\n    let x = 1\n    {\n        let x = \"inner\"\n    }\n}").is_empty());
}

#[test]
fn test_trait_reference_receivers() {
    let prelude = "trait Shape {\n    fn area(&self): f64\n}\nstruct Circle {\n    r: f64\n}\nimpl Shape for Circle {\n    fn area(&self): f64 {\n        ret self.r\n    }\n}\nfn take(s: Shape) {}\n";

    let source = format!("{}fn main() {{\n    let c = Circle{{1.0}}\n    take(c)\n}}", prelude);
    assert_eq!(keys(&source), vec!["trait_has_reference_parametered_function"]);

    let source = format!(
        "{}impl Circle {{\n    fn describe(&self) {{\n        take(self)\n    }}\n}}",
        prelude
    );
    assert!(keys(&source).is_empty());
}

#[test]
fn test_missing_trait_method() {
    let source = "trait Shape {\n    fn area(&self): f64\n}\nstruct Square {\n    side: f64\n}\nimpl Shape for Square {}";
    assert_eq!(keys(source), vec!["member_not_exist"]);
}

#[test]
fn test_enum_values() {
    let (ast, _, diagnostics) = check("enum Color: u8 {\n    Red,\n    Green = 5,\n    Blue\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    let color = ast
        .decls
        .iter()
        .find_map(|decl| match decl {
            Decl::Enum(e) => Some(e),
            _ => None,
        })
        .unwrap();
    let values: Vec<_> = color.items.iter().map(|item| item.value.clone().unwrap()).collect();
    assert_eq!(values, vec![Constant::Uint(0), Constant::Uint(5), Constant::Uint(6)]);

    assert_eq!(keys("enum Flag: u8 {\n    A = 255,\n    B\n}"), vec!["overflow_limits"]);
}

#[test]
fn test_enum_member_access() {
    let source = "enum Color: u8 {\n    Red,\n    Green\n}\nfn main() {\n    let c = Color::Green\n    let d = Color::Purple\n}";
    assert_eq!(keys(source), vec!["member_not_exist"]);
}

#[test]
fn test_foreach_keys() {
    let source = "fn main() {\n    let m: [str:int] = [str:int]{\"a\": 1}\n    for k, v in m {\n        let x: str = k\n        let y: int = v\n    }\n    for i, c in \"abc\" {\n        let b: u8 = c\n        let n: int = i\n    }\n}";
    assert!(keys(source).is_empty());

    assert_eq!(keys("fn main() {\n    for v in 5 {}\n}"), vec!["foreach_not_iterable"]);
}

#[test]
fn test_condition_must_be_bool() {
    assert_eq!(keys("fn main() {\n    if 1 {}\n}"), vec!["incompatible_types"]);
    assert!(keys("fn main() {\n    if 1 < 2 {} else {}\n}").is_empty());
}

#[test]
fn test_return_checks() {
    assert_eq!(keys("fn f(): int {}"), vec!["require_return_value"]);
    assert_eq!(keys("fn g() {\n    ret 1\n}"), vec!["void_function_return_value"]);
    assert_eq!(keys("fn h(): int {\n    ret 1, 2\n}"), vec!["overflow_return"]);
    assert!(keys("fn k(x: bool): int {\n    if x {\n        ret 1\n    } else {\n        ret 2\n    }\n}").is_empty());
}

#[test]
fn test_labels() {
    assert_eq!(keys("fn main() {\n    goto nowhere\n}"), vec!["label_not_exist"]);
    assert!(keys("fn main() {\n    outer:\n    for {\n        break outer\n    }\n}").is_empty());
}

#[test]
fn test_call_arguments() {
    let prelude = "fn add(a: int, b: int): int {\n    ret a + b\n}\n";
    assert_eq!(keys(&format!("{}fn main() {{\n    add(1)\n}}", prelude)), vec!["missing_argument"]);
    assert_eq!(keys(&format!("{}fn main() {{\n    add(1, 2, 3)\n}}", prelude)), vec!["argument_overflow"]);

    let source = "fn sum(xs: ...int): int {\n    ret 0\n}\nfn main() {\n    sum()\n    sum(1, 2, 3)\n}";
    assert!(keys(source).is_empty());
}

#[test]
fn test_index_call_fallback() {
    let source = "fn inc(x: int): int {\n    ret x + 1\n}\nfn main() {\n    let fs = [inc]\n    let i = 0\n    let y: int = fs[i](1)\n}";
    let (ast, _, diagnostics) = check(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());
    assert_eq!(local(body(&ast, "main"), "y").resolved.as_ref().unwrap().kind, "int");
}

#[test]
fn test_array_sizes() {
    let (ast, _, diagnostics) = check("fn main() {\n    let a: [...]int = [1, 2, 3]\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());
    assert_eq!(local(body(&ast, "main"), "a").resolved.as_ref().unwrap().kind, "[3]int");

    assert_eq!(keys("fn main() {\n    let b: [2]int = [1, 2, 3]\n}"), vec!["array_size_mismatch"]);
}

#[test]
fn test_unsafe_pointers() {
    let source = "fn f(p: *unsafe) {}";
    assert_eq!(keys(source), vec!["unsafe_outside_block"]);

    let config = CompilerConfig::default().with_unsafe(true);
    let (_, _, diagnostics) = check_with(source, &config);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());
}

#[test]
fn test_platform_int_width() {
    let config = CompilerConfig::default().with_int_bits(32);
    let (_, _, diagnostics) = check_with("fn main() {\n    let x: int = 3000000000\n}", &config);
    assert_eq!(diagnostics.keys(), vec!["overflow_limits"]);

    assert!(keys("fn main() {\n    let x: int = 3000000000\n}").is_empty());
}

#[test]
fn test_casts() {
    assert!(keys("fn main() {\n    let x: i32 = 5\n    let y = (f64)(x)\n}").is_empty());
    assert_eq!(
        keys("fn main() {\n    let x: i32 = 5\n    let y = (bool)(x)\n}"),
        vec!["type_not_supports_casting"]
    );
}

#[test]
fn test_builtins_and_uses() {
    let (_, checker, diagnostics) = check("use std::io\nfn main() {\n    outln(\"hi\")\n    out(1)\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());
    assert_eq!(checker.imports, vec![String::from("std/io")]);
}
