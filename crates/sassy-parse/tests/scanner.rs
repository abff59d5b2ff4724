use sassy_parse::{tokenize, ScanMode, Scanner, TokKind};

fn kinds(src: &str) -> Vec<TokKind> {
    tokenize(src, ScanMode::Lenient)
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn texts(src: &str) -> Vec<String> {
    tokenize(src, ScanMode::Lenient)
        .into_iter()
        .map(|t| t.text)
        .collect()
}

#[test]
fn variable_declaration() {
    use TokKind::*;
    assert_eq!(kinds("$x: 1px;"), vec![VarDecl, Colon, Text, Semicolon, Eof]);
    assert_eq!(texts("$x: 1px;")[0], "$x");
    // a space before the colon makes it a use
    assert_eq!(kinds("$x : 1px;")[0], VarUse);
}

#[test]
fn rule_tokens_cover_the_source() {
    let src = ".a{color:red;}";
    let toks = tokenize(src, ScanMode::Lenient);
    for t in &toks {
        assert_eq!(&src[t.span.start as usize..t.span.end as usize], t.text);
    }
    let joined: String = toks.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(joined, src);
}

#[test]
fn offsets_never_decrease() {
    let src = "/* c */ $a: 1px;\n.a > .b { width: $a * 2; @include m; }\n";
    let toks = tokenize(src, ScanMode::Lenient);
    assert!(toks.windows(2).all(|w| w[0].offset() <= w[1].offset()));
}

#[test]
fn arithmetic_symbols() {
    use TokKind::*;
    assert_eq!(
        kinds("a * b / c + d - e"),
        vec![Text, Mul, Text, Mul, Text, Plus, Text, Minus, Text, Eof]
    );
    // division shares the multiply kind but keeps its lexeme
    assert_eq!(texts("a / b")[1], "/");
}

#[test]
fn directives_and_unknown_at_rules() {
    use TokKind::*;
    assert_eq!(kinds("@import \"a.scss\";"), vec![Import, File, Semicolon, Eof]);
    assert_eq!(texts("@import \"a.scss\";")[1], "a.scss");
    assert_eq!(kinds("@mixin @function @each @if @else @include")[..6], [
        Mixin, Function, Each, If, Else, Include
    ]);
    assert_eq!(kinds("@media screen"), vec![Text, Text, Eof]);
    assert_eq!(texts("@media screen")[0], "@media");
}

#[test]
fn comments() {
    use TokKind::*;
    let src = "/* hi */ a // tail\nb";
    assert_eq!(kinds(src), vec![Comment, Text, Comment, Text, Eof]);
    let t = texts(src);
    assert_eq!(t[0], "/* hi */");
    assert_eq!(t[2], "// tail");
}

#[test]
fn url_scheme_is_not_a_line_comment() {
    let k = kinds("a: url(http://x.com/a.png);\n}");
    assert!(!k.contains(&TokKind::Comment));
    assert!(k.contains(&TokKind::RBrace));
    assert_eq!(kinds("a: b // note")[3], TokKind::Comment);
}

#[test]
fn unterminated_block_comment_is_truncated() {
    use TokKind::*;
    assert_eq!(kinds("a /* open"), vec![Text, Comment, Eof]);
    assert_eq!(texts("a /* open")[1], "/* open");
}

#[test]
fn sprite_commands() {
    use TokKind::*;
    assert_eq!(
        kinds("sprite-map(\"*.png\")"),
        vec![CmdVar, LParen, File, RParen, Eof]
    );
    assert_eq!(texts("sprite-map(\"*.png\")")[2], "*.png");
    assert_eq!(kinds("sprite-map-name")[0], Cmd);
    assert_eq!(kinds("sprite-width")[0], Cmd);

    assert_eq!(
        kinds("sprite($map, foo)"),
        vec![Cmd, LParen, VarUse, File, RParen, Eof]
    );
    assert_eq!(texts("sprite($map, foo)")[2], "$map");
    assert_eq!(texts("sprite($map, foo)")[3], "foo");
}

#[test]
fn image_size_argument_is_a_file() {
    use TokKind::*;
    assert_eq!(
        kinds("image-width(logo.png)"),
        vec![Cmd, LParen, File, RParen, Eof]
    );
    assert_eq!(kinds("url(logo.png)"), vec![Text, LParen, Text, RParen, Eof]);
}

#[test]
fn interpolation_and_colors() {
    use TokKind::*;
    assert_eq!(kinds("#{$x}"), vec![Interp, VarUse, RBrace, Eof]);
    assert_eq!(kinds("#fff"), vec![Text, Eof]);
    assert_eq!(texts("#fff")[0], "#fff");
}

#[test]
fn lenient_mode_keeps_unknown_bytes_pending() {
    // `%` is flushed as text by the `;`
    assert_eq!(texts("50%;")[..3], ["50", "%", ";"]);
    // `&` is dropped by the following space
    assert_eq!(kinds("a & b"), vec![TokKind::Text, TokKind::Text, TokKind::Eof]);
}

#[test]
fn strict_mode_rejects_unknown_bytes() {
    let toks = tokenize("a & b", ScanMode::Strict);
    let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokKind::Text, TokKind::Error, TokKind::Eof]);
    assert!(toks[1].text.contains("unexpected character '&' at offset 2"));
}

#[test]
fn invalid_encoding_is_fatal_and_sticky() {
    let mut s = Scanner::from_bytes(b"a \xff b");
    assert_eq!(s.next_tok().kind, TokKind::Text);
    let err = s.next_tok();
    assert_eq!(err.kind, TokKind::Error);
    assert_eq!(err.offset(), 2);
    let pos = s.pos();
    for _ in 0..3 {
        let t = s.next_tok();
        assert_eq!(t.kind, TokKind::Eof);
        assert_eq!(s.pos(), pos);
    }
}

#[test]
fn iterator_ends_after_eof() {
    let mut s = Scanner::new("a");
    assert_eq!(s.next().map(|t| t.kind), Some(TokKind::Text));
    assert_eq!(s.next().map(|t| t.kind), Some(TokKind::Eof));
    assert!(s.next().is_none());
}
