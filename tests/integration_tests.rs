//! Integration tests for the whole front end.
//!
//! These tests run source text through tokenization, parsing and type
//! checking, then inspect the annotated tree and the symbol table.

use janec::{
    ast::{
        ast::{Ast, Decl},
        expressions::ExprKind,
        statements::{Block, LoopProfile, StmtKind},
    },
    config::CompilerConfig,
    errors::errors::Diagnostics,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::{
        constant::Constant,
        solver::compatible,
        type_checker::{type_check, TypeChecker},
    },
};

fn front_end(source: &str) -> (Ast, TypeChecker, Diagnostics) {
    let config = CompilerConfig::default();
    let tokens = tokenize(source.to_string(), Some("main.jn".to_string())).unwrap();
    let (parser, mut ast) = parse(tokens, &config);
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());
    let (checker, diagnostics) = type_check(&mut ast, &config);
    (ast, checker, diagnostics)
}

fn main_body(ast: &Ast) -> &Block {
    ast.decls
        .iter()
        .find_map(|decl| match decl {
            Decl::Func(func) if func.id == "main" => func.body.as_ref(),
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_typed_declaration_folds() {
    let (ast, _, diagnostics) = front_end("fn main() {\n    x: i32 = 1 + 2 * 3\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    let StmtKind::Assign(assign) = &main_body(&ast).stmts[0].kind else {
        panic!("expected an assignment");
    };
    assert!(assign.declares);
    let var = assign.targets[0].var.as_ref().unwrap();
    assert_eq!(var.id, "x");
    assert_eq!(var.resolved.as_ref().unwrap().kind, "i32");

    let value = &assign.values[0];
    assert_eq!(value.to_string(), "(1 + (2 * 3))");
    assert_eq!(value.constant, Some(Constant::Int(7)));
    assert_eq!(value.ty().kind, "i32");
}

#[test]
fn test_swap_existing_values() {
    let (ast, _, diagnostics) = front_end("fn main() {\n    let mut a = 1\n    let mut b = 2\n    a, b = b, a\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    let StmtKind::Assign(assign) = &main_body(&ast).stmts[2].kind else {
        panic!("expected an assignment");
    };
    assert!(!assign.declares);
    assert_eq!(assign.op, "=");
    assert!(assign.targets.iter().all(|target| target.var.is_none()));
    let targets: Vec<String> = assign.targets.iter().map(|target| target.expr.to_string()).collect();
    let values: Vec<String> = assign.values.iter().map(|value| value.to_string()).collect();
    assert_eq!(targets, vec!["a", "b"]);
    assert_eq!(values, vec!["b", "a"]);
}

#[test]
fn test_foreach_over_slice() {
    let (ast, _, diagnostics) = front_end("fn main() {\n    let arr: []i32 = [1, 2, 3]\n    for v in arr {}\n}");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    let StmtKind::Loop(l) = &main_body(&ast).stmts[1].kind else {
        panic!("expected a loop");
    };
    let LoopProfile::ForEach { key_a, key_b, expr } = &l.profile else {
        panic!("expected a foreach loop");
    };
    assert_eq!(key_a.id, "_");
    assert_eq!(key_b.id, "v");
    assert_eq!(key_b.resolved.as_ref().unwrap().kind, "i32");
    assert!(matches!(expr.kind, ExprKind::Ident(_)));
}

#[test]
fn test_generic_function_instance() {
    let source = "fn max[T](a: T, b: T): T {\n    if a > b {\n        ret a\n    }\n    ret b\n}\nfn main() {\n    let m = max[i32](1, 2)\n}";
    let (ast, checker, diagnostics) = front_end(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    assert_eq!(checker.fn_instances.len(), 1);
    let instance = &checker.fn_instances[0];
    assert_eq!(instance.generics[0].kind, "i32");
    assert!(instance.body.is_some());

    let StmtKind::Var(m) = &main_body(&ast).stmts[0].kind else {
        panic!("expected a variable");
    };
    assert_eq!(m.resolved.as_ref().unwrap().kind, "i32");
    let ExprKind::Call { callee, .. } = &m.init.as_ref().unwrap().kind else {
        panic!("expected a call");
    };
    assert_eq!(callee.ty().kind, "fn(i32,i32):i32");
}

#[test]
fn test_trait_implementation_compatibility() {
    let prelude = "trait Err {\n    fn message(self): str\n}\nstruct S {\n    code: int\n}\nimpl Err for S {\n    fn message(self): str {\n        ret \"failed\"\n    }\n}\nstruct Plain {\n    code: int\n}\nfn report(e: Err) {}\n";

    let (_, checker, diagnostics) = front_end(&format!("{}fn main() {{\n    let s = S{{1}}\n    report(s)\n}}", prelude));
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.keys());

    let err = &checker.defmap.get("Err").unwrap().ty;
    let s = &checker.defmap.get("S").unwrap().ty;
    let plain = &checker.defmap.get("Plain").unwrap().ty;
    assert!(compatible(err, s, false));
    assert!(!compatible(err, plain, false));

    let (_, _, diagnostics) = front_end(&format!("{}fn main() {{\n    let p = Plain{{1}}\n    report(p)\n}}", prelude));
    assert_eq!(diagnostics.keys(), vec!["incompatible_types"]);
}

#[test]
fn test_diagnostics_accumulate() {
    let source = "fn main() {\n    let x: i8 = 300\n    let y: bool = 1\n    goto nowhere\n}";
    let (_, _, diagnostics) = front_end(source);
    assert_eq!(
        diagnostics.keys(),
        vec!["overflow_limits", "incompatible_types", "label_not_exist"]
    );
    assert!(diagnostics.has_errors());
}

#[test]
fn test_lex_error_reports() {
    let result = tokenize(String::from("let x = 1 $ 2"), Some("main.jn".to_string()));
    assert!(result.is_err());
}
