pub mod span {
    use serde::Serialize;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
    pub struct Span {
        pub start: u32,
        pub end: u32,
    }

    impl Span {
        pub fn new(start: u32, end: u32) -> Self {
            Self { start, end }
        }

        /// Smallest span covering both `self` and `other`.
        pub fn to(self, other: Span) -> Span {
            Span {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
            }
        }
    }
}

pub mod ast {
    use super::span::Span;
    use serde::Serialize;
    use std::cell::OnceCell;

    #[derive(Debug, Serialize)]
    pub struct Stylesheet {
        pub items: Vec<Stmt>,
        pub span: Span,
    }

    /// Explicit node-kind tag. Consumers dispatch on this (or on the enums
    /// directly), never on node identity.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
    pub enum NodeKind {
        Rule,
        Prop,
        Var,
        Comment,
        Import,
        Directive,
        Lit,
        Ident,
        Unary,
        Binary,
        Call,
    }

    #[derive(Debug, Serialize)]
    pub enum Stmt {
        /// `selector { ... }`
        Rule(RuleBlock),
        /// `name: values;`
        Prop(PropDecl),
        /// `$name: values;`
        Var(VarDecl),
        Comment(Comment),
        Import(Import),
        /// `@include`, `@mixin`, `@each`, ... recognized but not compiled.
        Directive(Directive),
    }

    impl Stmt {
        pub fn kind(&self) -> NodeKind {
            match self {
                Stmt::Rule(_) => NodeKind::Rule,
                Stmt::Prop(_) => NodeKind::Prop,
                Stmt::Var(_) => NodeKind::Var,
                Stmt::Comment(_) => NodeKind::Comment,
                Stmt::Import(_) => NodeKind::Import,
                Stmt::Directive(_) => NodeKind::Directive,
            }
        }

        pub fn span(&self) -> Span {
            match self {
                Stmt::Rule(r) => r.span,
                Stmt::Prop(p) => p.span,
                Stmt::Var(v) => v.span,
                Stmt::Comment(c) => c.span,
                Stmt::Import(i) => i.span,
                Stmt::Directive(d) => d.span,
            }
        }
    }

    #[derive(Debug, Serialize)]
    pub struct RuleBlock {
        pub sel: SelStmt,
        pub block: Block,
        pub span: Span,
    }

    #[derive(Debug, Serialize)]
    pub struct Block {
        pub stmts: Vec<Stmt>,
        pub span: Span,
    }

    /// A selector expression plus its flattened form.
    ///
    /// `resolved` is written once, by the selector resolver, when the
    /// statement is first visited. The enclosing statement is supplied by
    /// whoever walks the tree.
    #[derive(Debug, Serialize)]
    pub struct SelStmt {
        pub sel: Expr,
        #[serde(skip)]
        pub resolved: OnceCell<String>,
        /// Prelude text as written, when the selector came from source.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub source: Option<String>,
        pub span: Span,
    }

    impl SelStmt {
        pub fn new(sel: Expr, span: Span) -> Self {
            Self {
                sel,
                resolved: OnceCell::new(),
                source: None,
                span,
            }
        }

        pub fn with_source(sel: Expr, source: impl Into<String>, span: Span) -> Self {
            Self {
                source: Some(source.into()),
                ..Self::new(sel, span)
            }
        }

        pub fn resolved(&self) -> Option<&str> {
            self.resolved.get().map(String::as_str)
        }
    }

    #[derive(Debug, Serialize)]
    pub struct PropDecl {
        pub name: Ident,
        pub values: Vec<Expr>,
        pub span: Span,
    }

    #[derive(Debug, Serialize)]
    pub struct VarDecl {
        /// Includes the leading `$`.
        pub name: Ident,
        pub values: Vec<Expr>,
        pub span: Span,
    }

    #[derive(Debug, Serialize)]
    pub struct Comment {
        pub text: String,
        pub span: Span,
    }

    #[derive(Debug, Serialize)]
    pub struct Import {
        pub path: String,
        pub span: Span,
    }

    #[derive(Debug, Serialize)]
    pub struct Directive {
        pub keyword: String,
        pub span: Span,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Ident {
        pub text: String,
        pub span: Span,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub enum Expr {
        Lit(Lit),
        Ident(Ident),
        Unary {
            op: Op,
            expr: Box<Expr>,
            span: Span,
        },
        Binary {
            lhs: Box<Expr>,
            op: Op,
            rhs: Box<Expr>,
            span: Span,
        },
        Call {
            callee: Ident,
            args: Vec<Expr>,
            span: Span,
        },
    }

    impl Expr {
        pub fn lit(kind: LitKind, value: impl Into<String>, span: Span) -> Self {
            Expr::Lit(Lit::new(kind, value, span))
        }

        pub fn unary(op: Op, expr: Expr, span: Span) -> Self {
            Expr::Unary {
                op,
                expr: Box::new(expr),
                span,
            }
        }

        pub fn binary(lhs: Expr, op: Op, rhs: Expr) -> Self {
            let span = lhs.span().to(rhs.span());
            Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                span,
            }
        }

        pub fn kind(&self) -> NodeKind {
            match self {
                Expr::Lit(_) => NodeKind::Lit,
                Expr::Ident(_) => NodeKind::Ident,
                Expr::Unary { .. } => NodeKind::Unary,
                Expr::Binary { .. } => NodeKind::Binary,
                Expr::Call { .. } => NodeKind::Call,
            }
        }

        pub fn span(&self) -> Span {
            match self {
                Expr::Lit(l) => l.span,
                Expr::Ident(id) => id.span,
                Expr::Unary { span, .. } | Expr::Binary { span, .. } | Expr::Call { span, .. } => {
                    *span
                }
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Lit {
        pub kind: LitKind,
        pub value: String,
        pub span: Span,
    }

    impl Lit {
        pub fn new(kind: LitKind, value: impl Into<String>, span: Span) -> Self {
            Self {
                kind,
                value: value.into(),
                span,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub enum LitKind {
        /// Integer or decimal, optionally followed by a unit: `10`, `1.5em`.
        Number,
        Str,
        /// Marker standing in for an opening or closing quote of a value list.
        Quote,
        /// `#rgb` or `#rrggbb`.
        Color,
        /// `$name` used as a value.
        Var,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub enum Op {
        // arithmetic; `Add` doubles as the `+` sibling combinator in selectors
        Add,
        Sub,
        Mul,
        Div,
        // selectors
        Comma,
        Gt,
        Tilde,
        Nest,
    }

    impl Op {
        pub fn as_str(self) -> &'static str {
            match self {
                Op::Add => "+",
                Op::Sub => "-",
                Op::Mul => "*",
                Op::Div => "/",
                Op::Comma => ",",
                Op::Gt => ">",
                Op::Tilde => "~",
                Op::Nest => "&",
            }
        }

        /// Binding power for value arithmetic. Selector operators never appear
        /// in value position and report 0.
        pub fn binding_power(self) -> u8 {
            match self {
                Op::Mul | Op::Div => 2,
                Op::Add | Op::Sub => 1,
                _ => 0,
            }
        }
    }

    impl std::fmt::Display for Op {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Split `1.5px` into `(1.5, "px")`. The unit is a run of ASCII letters
    /// or a single `%`; anything else is not a number.
    pub fn split_number(s: &str) -> Option<(f64, &str)> {
        let (neg, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let digits_end = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(body.len());
        let (num, unit) = body.split_at(digits_end);
        if !num.bytes().any(|b| b.is_ascii_digit()) || num.matches('.').count() > 1 {
            return None;
        }
        if !(unit.is_empty() || unit == "%" || unit.bytes().all(|b| b.is_ascii_alphabetic())) {
            return None;
        }
        let n: f64 = num.parse().ok()?;
        Some((if neg { -n } else { n }, unit))
    }

    /// `#rgb` or `#rrggbb` to channels.
    pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
        let hex = s.strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
        match hex.len() {
            3 => Some([digit(0)? * 17, digit(1)? * 17, digit(2)? * 17]),
            6 => Some([
                digit(0)? * 16 + digit(1)?,
                digit(2)? * 16 + digit(3)?,
                digit(4)? * 16 + digit(5)?,
            ]),
            _ => None,
        }
    }
}
