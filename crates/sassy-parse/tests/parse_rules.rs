use sassy_ast::ast::{Expr, LitKind, Op, Stmt};
use sassy_parse::{parse_str, parse_with_mode, ScanMode};

fn lit_value(e: &Expr) -> &str {
    match e {
        Expr::Lit(l) => &l.value,
        Expr::Ident(id) => &id.text,
        other => panic!("expected a word, got {other:?}"),
    }
}

#[test]
fn rule_with_one_property() {
    let s = parse_str("<mem>", ".a { color: red; }").unwrap();
    assert_eq!(s.items.len(), 1);
    let Stmt::Rule(rule) = &s.items[0] else {
        panic!("expected rule");
    };
    assert_eq!(lit_value(&rule.sel.sel), ".a");
    assert!(rule.sel.resolved().is_none());
    let Stmt::Prop(p) = &rule.block.stmts[0] else {
        panic!("expected property");
    };
    assert_eq!(p.name.text, "color");
    assert_eq!(p.values.len(), 1);
    assert_eq!(lit_value(&p.values[0]), "red");
}

#[test]
fn nested_rules_and_optional_last_semicolon() {
    let s = parse_str("<mem>", ".a { .b { color: blue } width: 1px }").unwrap();
    let Stmt::Rule(outer) = &s.items[0] else {
        panic!("expected rule");
    };
    assert_eq!(outer.block.stmts.len(), 2);
    let Stmt::Rule(inner) = &outer.block.stmts[0] else {
        panic!("expected nested rule");
    };
    assert_eq!(lit_value(&inner.sel.sel), ".b");
    assert!(matches!(outer.block.stmts[1], Stmt::Prop(_)));
}

#[test]
fn selector_prelude_keeps_dropped_bytes() {
    let s = parse_str("<mem>", ".a { > li { x: y; } &:hover { x: z; } }").unwrap();
    let Stmt::Rule(outer) = &s.items[0] else {
        panic!("expected rule");
    };
    let Stmt::Rule(child) = &outer.block.stmts[0] else {
        panic!("expected child rule");
    };
    let Expr::Unary { op, expr, .. } = &child.sel.sel else {
        panic!("expected unary combinator");
    };
    assert_eq!(*op, Op::Gt);
    assert_eq!(lit_value(expr), "li");

    let Stmt::Rule(hover) = &outer.block.stmts[1] else {
        panic!("expected hover rule");
    };
    assert_eq!(lit_value(&hover.sel.sel), "&:hover");
}

#[test]
fn variables() {
    let s = parse_str("<mem>", "$x: 1px;\n$y : $x;").unwrap();
    let Stmt::Var(x) = &s.items[0] else {
        panic!("expected variable");
    };
    assert_eq!(x.name.text, "$x");
    let Expr::Lit(l) = &x.values[0] else {
        panic!("expected literal");
    };
    assert_eq!(l.kind, LitKind::Number);

    let Stmt::Var(y) = &s.items[1] else {
        panic!("expected variable");
    };
    let Expr::Lit(l) = &y.values[0] else {
        panic!("expected literal");
    };
    assert_eq!(l.kind, LitKind::Var);
    assert_eq!(l.value, "$x");
}

#[test]
fn comments_imports_and_directives() {
    let src = r#"
/* top */
@import "base";
@mixin m { color: red; }
@include m;
.a { x: y; }
"#;
    let s = parse_str("<mem>", src).unwrap();
    let kinds: Vec<_> = s.items.iter().map(Stmt::kind).collect();
    use sassy_ast::ast::NodeKind::*;
    assert_eq!(kinds, vec![Comment, Import, Directive, Directive, Rule]);
    let Stmt::Import(i) = &s.items[1] else {
        panic!("expected import");
    };
    assert_eq!(i.path, "base");
    let Stmt::Directive(d) = &s.items[2] else {
        panic!("expected directive");
    };
    assert_eq!(d.keyword, "@mixin");
}

#[test]
fn spans_point_into_the_source() {
    let src = "$x: 1px;\n.a { width: $x; }";
    let s = parse_str("<mem>", src).unwrap();
    let Stmt::Rule(rule) = &s.items[1] else {
        panic!("expected rule");
    };
    let sp = rule.sel.span;
    assert_eq!(&src[sp.start as usize..sp.end as usize], ".a");
    let Stmt::Prop(p) = &rule.block.stmts[0] else {
        panic!("expected property");
    };
    let sp = p.name.span;
    assert_eq!(&src[sp.start as usize..sp.end as usize], "width");
}

#[test]
fn structural_errors() {
    let err = parse_str("<mem>", ".a { color: red;").unwrap_err();
    assert!(err.to_string().contains("expected `}`"));

    let err = parse_str("<mem>", "}").unwrap_err();
    assert!(err.to_string().contains("unmatched"));

    let err = parse_str("<mem>", ".a { width: #{$x}; }").unwrap_err();
    assert!(err.to_string().contains("interpolation"));
}

#[test]
fn strict_scan_errors_surface_as_parse_errors() {
    assert!(parse_str("<mem>", ".a & .b { x: y; }").is_ok());
    let err = parse_with_mode("<mem>", ".a & .b { x: y; }", ScanMode::Strict).unwrap_err();
    assert!(err.to_string().contains("unexpected character"));
}

#[test]
fn unterminated_string_in_a_value_is_an_error() {
    let err = parse_str("<mem>", ".a { content: \"\u{e9}; }").unwrap_err();
    assert!(err.to_string().contains("unterminated string"));

    let err = parse_str("<mem>", ".a { content: \"ab; }").unwrap_err();
    assert!(err.to_string().contains("unterminated string at offset 14"));
}
