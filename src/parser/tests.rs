//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Statement segmentation and bracket matching
//! - Operator precedence and associativity
//! - Assignments, variables and labels
//! - Control flow statements
//! - Type annotations
//! - Top-level declarations
//! - Error reporting and build aborts

use crate::{
    ast::{
        ast::{Ast, Decl, LinkItem},
        expressions::ExprKind,
        statements::{Block, LoopProfile, StmtKind},
        types::{ArraySize, TypeCategory},
    },
    config::CompilerConfig,
    lexer::{lexer::tokenize, tokens::Token},
};

use super::{
    expr::parse_expr,
    parser::{parse, Parser},
    parts::{extract_range, range_last, split_on},
    segment::next_statement,
    types::parse_whole_type,
};

fn lex(source: &str) -> Vec<Token> {
    tokenize(source.to_string(), Some("test.jn".to_string())).unwrap()
}

fn parse_source(source: &str) -> (Parser, Ast) {
    parse(lex(source), &CompilerConfig::default())
}

fn expr_text(source: &str) -> String {
    let tokens = lex(source);
    let mut parser = Parser::new(tokens.clone(), &CompilerConfig::default());
    let expr = parse_expr(&mut parser, &tokens);
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());
    expr.to_string()
}

fn type_kind(source: &str) -> String {
    let tokens = lex(source);
    let mut parser = Parser::new(tokens.clone(), &CompilerConfig::default());
    parse_whole_type(&mut parser, &tokens, true, true).unwrap().kind
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

#[test]
fn test_segment_semicolons_and_rows() {
    let tokens = lex("a = 1; b = 2\nc = 3");

    assert_eq!(next_statement(&tokens, 0), (4, true));
    assert_eq!(next_statement(&tokens, 4), (7, false));
    assert_eq!(next_statement(&tokens, 7), (10, false));
}

#[test]
fn test_segment_keeps_braced_regions_together() {
    let tokens = lex("fn f() {\n    a\n}\nb");

    assert_eq!(next_statement(&tokens, 0), (7, false));
    assert_eq!(tokens[7].value, "b");
}

#[test]
fn test_extract_range() {
    let tokens = lex("( a ( b ) ) c");
    let mut i = 0;
    let range = extract_range(&tokens, &mut i, "(", ")").unwrap();
    assert_eq!(range.len(), 4);
    assert_eq!(i, 6);

    let mut i = 6;
    assert!(extract_range(&tokens, &mut i, "(", ")").is_none());
    assert_eq!(i, 6);

    let tokens = lex("( a b");
    let mut i = 0;
    assert_eq!(extract_range(&tokens, &mut i, "(", ")").unwrap().len(), 2);
}

#[test]
fn test_split_on_reports_empty_parts() {
    let tokens = lex("a, , f(b, c)");
    let (parts, errors) = split_on(&tokens, ",", true);
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[2].len(), 6);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error_name(), "missing_expr");

    let tokens = lex("a,");
    assert_eq!(split_on(&tokens, ",", true).0.len(), 1);
    assert_eq!(split_on(&tokens, ",", false).0.len(), 2);
}

#[test]
fn test_range_last() {
    let tokens = lex("a.b(c)");
    let (before, group) = range_last(&tokens);
    assert_eq!(before.len(), 3);
    assert_eq!(group.unwrap().len(), 3);

    let tokens = lex("a + b");
    assert!(range_last(&tokens).1.is_none());
}

#[test]
fn test_parse_precedence() {
    assert_eq!(expr_text("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(expr_text("a || b && c"), "(a || (b && c))");
    assert_eq!(expr_text("a == b + 1"), "(a == (b + 1))");
    assert_eq!(expr_text("x << 2 | y"), "((x << 2) | y)");
}

#[test]
fn test_parse_left_associative_chains() {
    assert_eq!(expr_text("a - b - c"), "((a - b) - c)");
    assert_eq!(expr_text("a / b * c"), "((a / b) * c)");
}

#[test]
fn test_parse_unary_operators() {
    assert_eq!(expr_text("-a * b"), "(-a * b)");
    assert_eq!(expr_text("a * -b"), "(a * -b)");
    assert_eq!(expr_text("!ok && *p"), "(!ok && *p)");
    assert_eq!(expr_text("(a + b) * c"), "(((a + b)) * c)");
}

#[test]
fn test_parse_postfix_chain() {
    let tokens = lex("f(a, b)[0].x");
    let mut parser = Parser::new(tokens.clone(), &CompilerConfig::default());
    let expr = parse_expr(&mut parser, &tokens);

    let ExprKind::Selector { target, member, namespace } = &expr.kind else {
        panic!("expected selector, got {}", expr);
    };
    assert_eq!(member, "x");
    assert!(!namespace);
    let ExprKind::Index { target, .. } = &target.kind else {
        panic!("expected index");
    };
    assert!(matches!(&target.kind, ExprKind::Call { args, .. } if args.len() == 2));
}

#[test]
fn test_parse_generic_call_and_cast() {
    let tokens = lex("make[int, str](1)");
    let mut parser = Parser::new(tokens.clone(), &CompilerConfig::default());
    let expr = parse_expr(&mut parser, &tokens);
    let ExprKind::Call { generics, args, .. } = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(generics.len(), 2);
    assert_eq!(generics[1].kind, "str");
    assert_eq!(args.len(), 1);

    let tokens = lex("(f64)(x)");
    let expr = parse_expr(&mut parser, &tokens);
    assert!(matches!(&expr.kind, ExprKind::Cast { ty, .. } if ty.kind == "f64"));
}

#[test]
fn test_parse_parenthesised_callee() {
    let tokens = lex("(f)(1, 2)");
    let mut parser = Parser::new(tokens.clone(), &CompilerConfig::default());
    let expr = parse_expr(&mut parser, &tokens);
    let ExprKind::Call { callee, args, .. } = &expr.kind else {
        panic!("expected call");
    };
    assert!(matches!(callee.kind, ExprKind::Paren(_)));
    assert_eq!(args.len(), 2);

    let tokens = lex("(f)()");
    let expr = parse_expr(&mut parser, &tokens);
    assert!(matches!(&expr.kind, ExprKind::Call { args, .. } if args.is_empty()));
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    // A single argument stays ambiguous until names are resolved.
    let tokens = lex("(f)(x)");
    let expr = parse_expr(&mut parser, &tokens);
    assert!(matches!(&expr.kind, ExprKind::Cast { .. }));
}

#[test]
fn test_parse_composite_literals() {
    assert_eq!(expr_text("[1, 2, 3]"), "[1, 2, 3]");
    assert_eq!(expr_text("[]int{1, 2}"), "[]int{1, 2}");
    assert_eq!(expr_text("[str:int]{\"a\": 1}"), "[str:int]{\"a\": 1}");
    assert_eq!(expr_text("Point{1, 2}"), "Point{1, 2}");
}

#[test]
fn test_parse_types() {
    assert_eq!(type_kind("*&int"), "*&int");
    assert_eq!(type_kind("[str:[]int]"), "[str:[]int]");
    assert_eq!(type_kind("[...]u8"), "[...]u8");
    assert_eq!(type_kind("[5]u8"), "[5]u8");
    assert_eq!(type_kind("fn(int, str): bool"), "fn(int,str):bool");
    assert_eq!(type_kind("Box[int]"), "Box[int]");
    assert_eq!(type_kind("*unsafe"), "*unsafe");
}

#[test]
fn test_parse_type_categories() {
    let tokens = lex("[...]int");
    let mut parser = Parser::new(tokens.clone(), &CompilerConfig::default().with_int_bits(32));
    let ty = parse_whole_type(&mut parser, &tokens, true, true).unwrap();
    assert!(ty.is_array());
    assert!(matches!(ty.size, ArraySize::Auto));
    assert_eq!(ty.component.unwrap().category, TypeCategory::SignedInt(32));

    let tokens = lex("[5]int");
    assert!(parse_whole_type(&mut parser, &tokens, false, false).is_none());
}

#[test]
fn test_parse_variables_and_assignments() {
    let (parser, ast) = parse_source(
        "fn main() {\n    let mut x: int = 1\n    x += 2\n    let (a, _) = pair()\n    y: int = 3\n    x++\n    a, x = x, a\n}",
    );
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let stmts = &body(&ast, "main").stmts;
    assert_eq!(stmts.len(), 6);

    let StmtKind::Var(x) = &stmts[0].kind else { panic!() };
    assert!(x.mutable);
    assert_eq!(x.ty.as_ref().unwrap().kind, "int");

    let StmtKind::Assign(assign) = &stmts[1].kind else { panic!() };
    assert_eq!(assign.op, "+=");

    let StmtKind::Assign(assign) = &stmts[2].kind else { panic!() };
    assert!(assign.declares);
    assert_eq!(assign.targets.len(), 2);
    assert!(assign.targets[0].var.is_some());
    assert!(assign.targets[1].is_ignored());

    let StmtKind::Var(y) = &stmts[3].kind else { panic!() };
    assert_eq!(y.id, "y");
    assert!(!y.mutable);

    let StmtKind::Assign(assign) = &stmts[4].kind else { panic!() };
    assert!(assign.is_postfix());
    assert!(assign.values.is_empty());

    let StmtKind::Assign(assign) = &stmts[5].kind else { panic!() };
    assert_eq!(assign.targets.len(), 2);
    assert_eq!(assign.values.len(), 2);
}

#[test]
fn test_parse_invalid_assignments() {
    let (parser, _) = parse_source("fn main() {\n    a, b += 1\n}");
    assert!(parser.diagnostics().contains("invalid_syntax"));

    let (parser, _) = parse_source("fn main() {\n    x++ 1\n}");
    assert!(parser.diagnostics().contains("invalid_syntax"));

    let (parser, _) = parse_source("fn main() {\n    x =\n}");
    assert!(parser.diagnostics().contains("invalid_syntax"));
}

#[test]
fn test_parse_labels() {
    let (parser, ast) = parse_source("fn main() {\n    outer:\n    for {\n        break outer\n    }\n    goto outer\n}");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let stmts = &body(&ast, "main").stmts;
    assert!(matches!(&stmts[0].kind, StmtKind::Label(label) if label == "outer"));
    assert!(matches!(&stmts[1].kind, StmtKind::Loop(_)));
    assert!(matches!(&stmts[2].kind, StmtKind::Goto(label) if label == "outer"));
}

#[test]
fn test_parse_loop_forms() {
    let (parser, ast) = parse_source(
        "fn main() {\n    for {}\n    for i < 10 {}\n    for i, v in items {}\n    for v in items {}\n    for let mut i = 0; i < 10; i++ {}\n    for i < 10; i++ {}\n}",
    );
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let profiles: Vec<&LoopProfile> = body(&ast, "main")
        .stmts
        .iter()
        .map(|stmt| match &stmt.kind {
            StmtKind::Loop(l) => &l.profile,
            _ => panic!("expected loop"),
        })
        .collect();

    assert!(matches!(profiles[0], LoopProfile::While { cond: None, next: None }));
    assert!(matches!(profiles[1], LoopProfile::While { cond: Some(_), next: None }));
    match profiles[2] {
        LoopProfile::ForEach { key_a, key_b, .. } => {
            assert_eq!(key_a.id, "i");
            assert_eq!(key_b.id, "v");
        }
        _ => panic!("expected foreach"),
    }
    match profiles[3] {
        LoopProfile::ForEach { key_a, key_b, .. } => {
            assert_eq!(key_a.id, "_");
            assert_eq!(key_b.id, "v");
        }
        _ => panic!("expected foreach"),
    }
    assert!(matches!(
        profiles[4],
        LoopProfile::CStyle { init: Some(_), cond: Some(_), post: Some(_) }
    ));
    assert!(matches!(profiles[5], LoopProfile::While { cond: Some(_), next: Some(_) }));
}

#[test]
fn test_parse_much_foreach_vars() {
    let (parser, _) = parse_source("fn main() {\n    for a, b, c in items {}\n}");
    assert!(parser.diagnostics().contains("much_foreach_vars"));
}

#[test]
fn test_parse_if_chain() {
    let (parser, ast) = parse_source(
        "fn main() {\n    if x == 1 {\n        a()\n    } else if x == 2 {\n        b()\n    }\n    else {\n        c()\n    }\n}",
    );
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let stmts = &body(&ast, "main").stmts;
    assert_eq!(stmts.len(), 1);
    let StmtKind::If(cond) = &stmts[0].kind else { panic!() };
    assert_eq!(cond.if_.cond.to_string(), "(x == 1)");
    assert_eq!(cond.elifs.len(), 1);
    assert_eq!(cond.default.as_ref().unwrap().stmts.len(), 1);
}

#[test]
fn test_parse_else_with_expression() {
    let (parser, _) = parse_source("fn main() {\n    if x {} else y {}\n}");
    assert!(parser.diagnostics().contains("else_have_expr"));
}

#[test]
fn test_parse_match() {
    let (parser, ast) = parse_source(
        "fn main() {\n    match x {\n    | 1 | 2: a()\n    | 3:\n        b()\n        c()\n    |: d()\n    }\n}",
    );
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let StmtKind::Match(m) = &body(&ast, "main").stmts[0].kind else { panic!() };
    assert!(!m.type_match);
    assert_eq!(m.cases.len(), 2);
    assert_eq!(m.cases[0].exprs.len(), 2);
    assert_eq!(m.cases[1].body.stmts.len(), 2);
    assert_eq!(m.default.as_ref().unwrap().stmts.len(), 1);
}

#[test]
fn test_parse_statement_errors() {
    let (parser, _) = parse_source("fn main() {\n    co x\n    goto\n}");
    assert!(parser.diagnostics().contains("expr_not_func_call"));
    assert!(parser.diagnostics().contains("missing_goto_label"));

    let (parser, _) = parse_source("fn main() {\n    let x:\n    const const y = 1\n}");
    assert!(parser.diagnostics().contains("missing_type"));
    assert!(parser.diagnostics().contains("already_const"));
}

#[test]
fn test_parse_function_declaration() {
    let (parser, ast) = parse_source("pub fn add[T](a, b: T, mut c: ...int): (T, bool) {\n    ret a, true\n}");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let func = ast.func(0).unwrap();
    assert!(func.is_pub);
    assert_eq!(func.generics.len(), 1);
    assert_eq!(func.params.len(), 3);
    assert_eq!(func.params[0].ty.as_ref().unwrap().kind, "T");
    assert!(func.params[2].mutable);
    assert!(func.params[2].variadic);
    assert_eq!(func.ret.kind, "(T,bool)");
}

#[test]
fn test_parse_variadic_not_last() {
    let (parser, _) = parse_source("fn f(a: ...int, b: int) {}");
    assert!(parser.diagnostics().contains("variadic_parameter_not_last"));
}

#[test]
fn test_parse_body_on_next_line() {
    let (parser, ast) = parse_source("fn main()\n{\n    a()\n}");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());
    assert_eq!(body(&ast, "main").stmts.len(), 1);
}

#[test]
fn test_missing_body_stops_build() {
    let (parser, ast) = parse_source("fn f()\nlet x = 1\nfn g() {}");
    assert!(parser.diagnostics().contains("body_not_exist"));
    assert!(parser.stopped());
    assert!(ast.decls.is_empty());
}

#[test]
fn test_unclosed_brace_stops_build() {
    let (parser, _) = parse_source("fn f() {\n    a()\n");
    assert!(parser.diagnostics().contains("unclosed_brace"));
    assert!(parser.stopped());
}

#[test]
fn test_pub_handling() {
    let (parser, ast) = parse_source("pub use std::io");
    assert!(parser.diagnostics().contains("def_not_support_pub"));
    assert_eq!(ast.decls.len(), 1);

    let (parser, _) = parse_source("fn main() {}\npub");
    assert!(parser.diagnostics().contains("invalid_syntax"));

    let (parser, ast) = parse_source("pub const MAX: int = 10");
    assert!(parser.diagnostics().is_empty());
    assert!(ast.decls[0].is_pub());
}

#[test]
fn test_parse_struct() {
    let (parser, ast) = parse_source("struct Point[T] {\n    pub x: T\n    mut y: int = 5\n}");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let s = ast.structure(0).unwrap();
    assert_eq!(s.id, "Point");
    assert_eq!(s.generics.len(), 1);
    assert_eq!(s.fields.len(), 2);
    assert!(s.fields[0].is_pub);
    assert!(s.fields[1].mutable);
    assert!(s.fields[1].init.is_some());
}

#[test]
fn test_parse_enum() {
    let (parser, ast) = parse_source("enum Color: u8 {\n    Red,\n    Green = 5,\n    Blue,\n}\nenum Flag { On, Off }");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let color = ast.enum_decl(0).unwrap();
    assert_eq!(color.base.kind, "u8");
    assert_eq!(color.items.len(), 3);
    assert!(color.item("Green").unwrap().expr.is_some());

    let flag = ast.enum_decl(1).unwrap();
    assert_eq!(flag.base.kind, "u32");
}

#[test]
fn test_parse_trait_and_impl() {
    let (parser, ast) = parse_source(
        "trait Shape {\n    fn area(&self): f64\n}\nstruct Circle {\n    r: f64\n}\nimpl Shape for Circle {\n    fn area(&self): f64 {\n        ret self.r\n    }\n}",
    );
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let shape = ast.trait_decl(0).unwrap();
    assert!(shape.has_ref_receiver());

    let Some(Decl::Impl(imp)) = ast.decls.iter().find(|d| matches!(d, Decl::Impl(_))) else {
        panic!("expected impl");
    };
    assert_eq!(imp.base, "Shape");
    assert_eq!(imp.target.as_ref().unwrap().kind, "Circle");

    let method = ast.func(imp.methods[0]).unwrap();
    assert_eq!(method.receiver.as_ref().unwrap().ty.as_ref().unwrap().kind, "&Circle");
    assert!(method.body.is_some());
    assert!(method.is_pub);

    let (parser, ast) = parse_source("struct P {\n    x: int\n}\nimpl P {\n    fn get(self): int {\n        ret self.x\n    }\n}");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());
    let Some(Decl::Impl(imp)) = ast.decls.iter().find(|d| matches!(d, Decl::Impl(_))) else {
        panic!("expected impl");
    };
    assert!(!ast.func(imp.methods[0]).unwrap().is_pub);
}

#[test]
fn test_parse_missing_receiver() {
    let (parser, _) = parse_source("trait Shape {\n    fn area(): f64\n}");
    assert!(parser.diagnostics().contains("missing_receiver"));
}

#[test]
fn test_parse_use_declarations() {
    let (parser, ast) = parse_source("use std::fmt::{self, Display}\nuse std::io::*\nuse cpp \"stdio.h\"");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let Decl::Use(fmt) = &ast.decls[0] else { panic!() };
    assert_eq!(fmt.path, "std::fmt");
    assert_eq!(fmt.selectors, vec!["self", "Display"]);
    let Decl::Use(io) = &ast.decls[1] else { panic!() };
    assert!(io.wildcard);
    let Decl::Use(header) = &ast.decls[2] else { panic!() };
    assert!(header.cpp);

    let (parser, _) = parse_source("use foo::bar\nuse std::io::\nuse std::os\nuse std::os");
    assert!(parser.diagnostics().contains("invalid_use_path"));
    assert!(parser.diagnostics().contains("invalid_syntax"));
    assert!(parser.diagnostics().contains("duplicate_use"));
}

#[test]
fn test_parse_foreign_links_and_aliases() {
    let (parser, ast) = parse_source("cpp fn printf(fmt: str, args: ...any)\ncpp let errno: int\ntype Int: i32");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    let Decl::ForeignLink(link) = &ast.decls[0] else { panic!() };
    assert!(matches!(&link.item, LinkItem::Fn(f) if f.cpp_linked && f.params.len() == 2));
    assert_eq!(link.id(), "printf");
    let Decl::ForeignLink(link) = &ast.decls[1] else { panic!() };
    assert!(matches!(&link.item, LinkItem::Var(v) if v.cpp_linked));
    let Decl::TypeAlias(alias) = &ast.decls[2] else { panic!() };
    assert_eq!(alias.ty.kind, "i32");
}

#[test]
fn test_comments_are_kept_in_order() {
    let (parser, ast) = parse_source("// header\nfn main() {\n    // inside\n    a() // trailing\n}");
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics().keys());

    assert_eq!(ast.order.len(), 2);
    let stmts = &body(&ast, "main").stmts;
    assert!(matches!(&stmts[0].kind, StmtKind::Comment(text) if text == "// inside"));
    assert!(matches!(&stmts[1].kind, StmtKind::Expr(_)));
}
