//! End-to-end compilation: source text through the parser and compiler.

use sassy_compile::{compile, BuiltinError, CompileError, Compiler, Mode, Options};
use sassy_parse::parse_str;

fn css(src: &str) -> String {
    let sheet = parse_str("<test>", src).expect("parse failed");
    compile(&sheet).expect("compile failed")
}

fn css_err(src: &str) -> CompileError {
    let sheet = parse_str("<test>", src).expect("parse failed");
    compile(&sheet).expect_err("compile should fail")
}

#[test]
fn flat_rule() {
    assert_eq!(css(".a { color: red; }"), ".a {\n  color: red;\n}\n");
}

#[test]
fn nested_rule_without_parent_properties() {
    assert_eq!(
        css(".a { .b { color: blue; } }"),
        ".a .b {\n  color: blue;\n}\n"
    );
}

#[test]
fn nested_rule_after_parent_properties() {
    let out = css(".a { color: red; .b { color: blue; } }");
    assert_eq!(out, ".a {\n  color: red;\n}\n  .a .b {\n    color: blue;\n  }\n");
}

#[test]
fn parent_reopens_after_child() {
    let out = css(".a { .b { x: 1; } y: 2; }");
    assert_eq!(out, ".a .b {\n  x: 1;\n}\n\n.a {\n  y: 2;\n}\n");
}

#[test]
fn sibling_rules_are_separated() {
    let out = css(".a { x: 1; }\n.b { y: 2; }");
    assert_eq!(out, ".a {\n  x: 1;\n}\n\n.b {\n  y: 2;\n}\n");
}

#[test]
fn empty_input_and_empty_blocks() {
    assert_eq!(css(""), "");
    assert_eq!(css(".a { }"), "");
    assert_eq!(css(".a { .b { } }"), "");
}

#[test]
fn variables_resolve_to_values() {
    assert_eq!(
        css("$x: 1px; .a { width: $x; }"),
        ".a {\n  width: 1px;\n}\n"
    );
}

#[test]
fn alias_sees_the_value_at_declaration() {
    let out = css("$a: 1px; $b: $a; $a: 2px; .x { w: $b; h: $a; }");
    assert_eq!(out, ".x {\n  w: 1px;\n  h: 2px;\n}\n");
}

#[test]
fn block_variables_do_not_leak() {
    assert_eq!(
        css(".a { $c: red; color: $c; }"),
        ".a {\n  color: red;\n}\n"
    );
    let err = css_err(".a { $c: red; } .b { color: $c; }");
    assert!(matches!(err, CompileError::UndefinedVariable { ref name, .. } if name == "$c"));
}

#[test]
fn undefined_variable_carries_its_span() {
    let src = ".a { color: $nope; }";
    let err = css_err(src);
    let span = err.span().expect("span");
    assert_eq!(&src[span.start as usize..span.end as usize], "$nope");
    assert!(err.to_string().contains("undefined variable '$nope'"));
}

#[test]
fn arithmetic_in_values() {
    assert_eq!(
        css(".a { width: 1px + 2px; }"),
        ".a {\n  width: 3px;\n}\n"
    );
    assert_eq!(
        css("$w: 10px; .a { width: $w * 2; }"),
        ".a {\n  width: 20px;\n}\n"
    );
    assert_eq!(
        css(".a { color: #010203 + #040506; }"),
        ".a {\n  color: #050709;\n}\n"
    );
}

#[test]
fn value_lists() {
    assert_eq!(
        css(".a { font-family: Arial, sans-serif; }"),
        ".a {\n  font-family: Arial, sans-serif;\n}\n"
    );
    assert_eq!(
        css(".a { margin: 0 -1px; }"),
        ".a {\n  margin: 0 -1px;\n}\n"
    );
    assert_eq!(
        css(".a { content: \"a b\"; }"),
        ".a {\n  content: \"a b\";\n}\n"
    );
}

#[test]
fn parent_alternatives_expand() {
    assert_eq!(
        css("a, b { .x { c: d; } }"),
        "a .x, b .x {\n  c: d;\n}\n"
    );
    assert_eq!(
        css("a, b { &:hover { c: d; } }"),
        "a:hover, b:hover {\n  c: d;\n}\n"
    );
}

#[test]
fn comma_groups_merge_in_source_order() {
    assert_eq!(
        css(".a, .b { .x, .y { c: d; } }"),
        ".a .x, .a .y, .b .x, .b .y {\n  c: d;\n}\n"
    );
}

#[test]
fn child_combinators() {
    assert_eq!(css("ul { > li { c: d; } }"), "ul > li {\n  c: d;\n}\n");
    assert_eq!(css("ul { li > a { c: d; } }"), "ul li > a {\n  c: d;\n}\n");
    assert_eq!(css("a > b { c: d; }"), "a > b {\n  c: d;\n}\n");
}

#[test]
fn selector_errors() {
    assert!(matches!(
        css_err("> li { c: d; }"),
        CompileError::UnaryWithoutParent { .. }
    ));
    assert!(matches!(
        css_err("&:hover { c: d; }"),
        CompileError::UnresolvedParent { .. }
    ));
}

#[test]
fn functions() {
    assert_eq!(
        css(".a { content: unquote(\"x\"); }"),
        ".a {\n  content: x;\n}\n"
    );
    assert_eq!(
        css(".a { width: calc(1px, 2px); }"),
        ".a {\n  width: calc(1px, 2px);\n}\n"
    );

    let sheet = parse_str("<test>", ".a { width: calc(1px); }").unwrap();
    let strict = Compiler::new(Options { mode: Mode::Strict });
    assert!(matches!(
        strict.compile(&sheet),
        Err(CompileError::UnknownFunction { ref name, .. }) if name == "calc"
    ));
}

#[test]
fn builtin_failures_are_wrapped() {
    let err = css_err(".a { content: quote(a, b); }");
    let CompileError::Builtin { name, source, .. } = &err else {
        panic!("expected builtin error, got {err:?}");
    };
    assert_eq!(name, "quote");
    assert!(matches!(source, BuiltinError::Arity { found: 2, .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn custom_builtins() {
    fn twice(args: &[sassy_ast::ast::Lit]) -> Result<sassy_ast::ast::Lit, BuiltinError> {
        let a = &args[0];
        Ok(sassy_ast::ast::Lit::new(
            a.kind,
            format!("{} {}", a.value, a.value),
            a.span,
        ))
    }
    let mut c = Compiler::default();
    c.builtins_mut().register("twice($v)", twice).unwrap();
    let sheet = parse_str("<test>", ".a { margin: twice(4px); }").unwrap();
    assert_eq!(c.compile(&sheet).unwrap(), ".a {\n  margin: 4px 4px;\n}\n");
}

#[test]
fn comments_and_skipped_statements() {
    let out = css("/* head */\n@import \"base\";\n// gone\n.a { /* in */ x: y; }\n@include m;");
    assert_eq!(out, "/* head */\n\n.a {\n  /* in */\n  x: y;\n}\n");
}

#[test]
fn missing_operand() {
    assert!(matches!(
        css_err(".a { width: 1px + ; }"),
        CompileError::MissingOperand { .. }
    ));
}

#[test]
fn ampersand_on_both_sides_of_a_combinator() {
    assert_eq!(
        css(".a { & + & { x: 1; } }"),
        ".a + .a {\n  x: 1;\n}\n"
    );
}

#[test]
fn block_comment_inside_a_value_is_dropped() {
    assert_eq!(
        css(".a {\n  color: red /* brand */;\n}"),
        ".a {\n  color: red;\n}\n"
    );
}

#[test]
fn url_with_scheme_survives() {
    let want = ".a {\n  background: url(http://x.com/a.png);\n}\n";
    assert_eq!(css(".a { background: url(http://x.com/a.png); }"), want);
    assert_eq!(css(".a {\n  background: url(http://x.com/a.png);\n}"), want);
}

#[test]
fn unparented_selector_prints_as_written() {
    assert_eq!(css("a>b { x: 1; }"), "a>b {\n  x: 1;\n}\n");
}
