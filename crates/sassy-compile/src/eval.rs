//! Expression evaluation under loose, Sass-like typing.

use sassy_ast::ast::{parse_hex_color, split_number, Expr, Ident, Lit, LitKind, Op, VarDecl};
use sassy_ast::span::Span;
use tracing::debug;

use crate::builtins::Builtins;
use crate::error::CompileError;
use crate::scope::{BindingId, Bindings, Bound, Scope};

/// How calls to unregistered functions are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Emitted verbatim as a CSS function, `name(args)`.
    #[default]
    Lenient,
    /// Rejected with `UnknownFunction`.
    Strict,
}

pub struct Evaluator<'c> {
    pub scope: Scope,
    pub bindings: Bindings,
    builtins: &'c Builtins,
    mode: Mode,
}

impl<'c> Evaluator<'c> {
    pub fn new(builtins: &'c Builtins, mode: Mode) -> Self {
        Self {
            scope: Scope::new(),
            bindings: Bindings::new(),
            builtins,
            mode,
        }
    }

    /// Bind a declaration in the innermost scope. A value that is a single
    /// variable reference becomes an alias of that variable's record.
    pub fn declare(&mut self, decl: &VarDecl) -> Result<BindingId, CompileError> {
        let value = match decl.values.as_slice() {
            [Expr::Lit(l)] if l.kind == LitKind::Var => Bound::Alias(self.lookup(&l.value, l.span)?),
            [Expr::Ident(id)] if id.text.starts_with('$') => {
                Bound::Alias(self.lookup(&id.text, id.span)?)
            }
            [single] => Bound::Value(self.eval(single)?),
            values => Bound::Value(Lit::new(
                LitKind::Str,
                self.eval_list(values)?,
                decl.span,
            )),
        };
        debug!(name = %decl.name.text, "declare");
        let id = self.bindings.declare(&decl.name.text, value, decl.span);
        self.scope.bind(&decl.name.text, id);
        Ok(id)
    }

    fn lookup(&self, name: &str, span: Span) -> Result<BindingId, CompileError> {
        self.scope
            .lookup(name)
            .ok_or_else(|| CompileError::UndefinedVariable {
                name: name.to_string(),
                span,
            })
    }

    fn resolve_var(&self, name: &str, span: Span) -> Result<Lit, CompileError> {
        let id = self.lookup(name, span)?;
        let lit = self.bindings.chase(id)?;
        Ok(Lit::new(lit.kind, lit.value.clone(), span))
    }

    pub fn eval(&self, e: &Expr) -> Result<Lit, CompileError> {
        match e {
            Expr::Lit(l) if l.kind == LitKind::Var => self.resolve_var(&l.value, l.span),
            Expr::Lit(l) => Ok(l.clone()),
            Expr::Ident(id) if id.text.starts_with('$') => self.resolve_var(&id.text, id.span),
            Expr::Ident(id) => Ok(Lit::new(LitKind::Str, id.text.clone(), id.span)),
            Expr::Unary { op, expr, span } => {
                let v = self.eval(expr)?;
                Ok(unary(*op, v, *span))
            }
            Expr::Binary { lhs, op, rhs, span } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                binary(*op, l, r, *span)
            }
            Expr::Call { callee, args, span } => self.call(callee, args, *span),
        }
    }

    fn call(&self, callee: &Ident, args: &[Expr], span: Span) -> Result<Lit, CompileError> {
        let mut vals = Vec::with_capacity(args.len());
        for a in args {
            vals.push(self.eval(a)?);
        }
        let name = &callee.text;
        if self.builtins.contains(name) {
            return match self.builtins.call(name, &vals) {
                Ok(lit) => Ok(Lit::new(lit.kind, lit.value, span)),
                Err(source) => Err(CompileError::Builtin {
                    name: name.clone(),
                    source,
                    span,
                }),
            };
        }
        match self.mode {
            Mode::Strict => Err(CompileError::UnknownFunction {
                name: name.clone(),
                span,
            }),
            Mode::Lenient => {
                debug!(%name, "passing unknown function through");
                let args: Vec<&str> = vals.iter().map(|v| v.value.as_str()).collect();
                Ok(Lit::new(
                    LitKind::Str,
                    format!("{}({})", name, args.join(", ")),
                    span,
                ))
            }
        }
    }

    /// Evaluate a value list to its CSS text. A leading quote marker
    /// (and its closing partner) is stripped, the rest joined by spaces,
    /// and the result re-quoted. Comma items attach to the previous value.
    pub fn eval_list(&self, values: &[Expr]) -> Result<String, CompileError> {
        let mut items = values;
        let mut quote = None;
        if let [Expr::Lit(first), rest @ ..] = items {
            if first.kind == LitKind::Quote {
                quote = Some(first.value.as_str());
                items = rest;
            }
        }
        if let [rest @ .., Expr::Lit(last)] = items {
            if last.kind == LitKind::Quote {
                items = rest;
            }
        }

        let mut out = String::new();
        for e in items {
            if matches!(e, Expr::Lit(l) if l.kind == LitKind::Str && l.value == ",") {
                out.push(',');
                continue;
            }
            let v = self.eval(e)?;
            if v.value.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&v.value);
        }
        Ok(match quote {
            Some(q) => format!("{q}{out}{q}"),
            None => out,
        })
    }
}

fn unary(op: Op, v: Lit, span: Span) -> Lit {
    if v.kind == LitKind::Number {
        if let Some((n, unit)) = split_number(&v.value) {
            let n = if op == Op::Sub { -n } else { n };
            return Lit::new(LitKind::Number, format!("{}{}", format_number(n), unit), span);
        }
    }
    Lit::new(LitKind::Str, format!("{}{}", op, v.value), span)
}

fn binary(op: Op, l: Lit, r: Lit, span: Span) -> Result<Lit, CompileError> {
    if l.value.is_empty() || r.value.is_empty() {
        return Err(CompileError::MissingOperand { op, span });
    }
    if !matches!(op, Op::Add | Op::Sub | Op::Mul | Op::Div) {
        return Ok(Lit::new(LitKind::Str, format!("{} {} {}", l.value, op, r.value), span));
    }

    if l.kind == LitKind::Color || r.kind == LitKind::Color {
        let lit = match color_math(op, &l, &r) {
            Some(hex) => Lit::new(LitKind::Color, hex, span),
            // failed color math degrades to concatenation
            None => Lit::new(LitKind::Str, format!("{}{}", l.value, r.value), span),
        };
        return Ok(lit);
    }

    let ln = number_of(&l);
    let rn = number_of(&r);
    let lit = match (ln, rn) {
        (Some(a), Some(b)) => match number_math(op, a, b) {
            Some((n, unit)) => {
                Lit::new(LitKind::Number, format!("{}{}", format_number(n), unit), span)
            }
            None => Lit::new(LitKind::Str, format!("{}{}{}", l.value, op, r.value), span),
        },
        (Some(_), None) | (None, Some(_)) => {
            Lit::new(LitKind::Str, format!("{}{}{}", l.value, op, r.value), span)
        }
        (None, None) if op == Op::Add => concat(&l.value, &r.value, span),
        (None, None) => Lit::new(LitKind::Str, format!("{} {} {}", l.value, op, r.value), span),
    };
    Ok(lit)
}

fn number_of(l: &Lit) -> Option<(f64, &str)> {
    if l.kind == LitKind::Number {
        split_number(&l.value)
    } else {
        None
    }
}

fn number_math(op: Op, (a, ua): (f64, &str), (b, ub): (f64, &str)) -> Option<(f64, String)> {
    let unit = |x: &str, y: &str| -> Option<String> {
        if x == y || y.is_empty() {
            Some(x.to_string())
        } else if x.is_empty() {
            Some(y.to_string())
        } else {
            None
        }
    };
    match op {
        Op::Add => Some((a + b, unit(ua, ub)?)),
        Op::Sub => Some((a - b, unit(ua, ub)?)),
        Op::Mul if ua.is_empty() || ub.is_empty() => Some((a * b, format!("{ua}{ub}"))),
        Op::Div if b != 0.0 && ua == ub => Some((a / b, String::new())),
        Op::Div if b != 0.0 && ub.is_empty() => Some((a / b, ua.to_string())),
        _ => None,
    }
}

/// Per-channel arithmetic against another color or a unitless number.
fn color_math(op: Op, l: &Lit, r: &Lit) -> Option<String> {
    let channels = |lit: &Lit| -> Option<[f64; 3]> {
        match lit.kind {
            LitKind::Color => parse_hex_color(&lit.value).map(|c| c.map(f64::from)),
            LitKind::Number => match split_number(&lit.value)? {
                (n, "") => Some([n; 3]),
                _ => None,
            },
            _ => None,
        }
    };
    let a = channels(l)?;
    let b = channels(r)?;
    let mut out = [0u8; 3];
    for i in 0..3 {
        let v = match op {
            Op::Add => a[i] + b[i],
            Op::Sub => a[i] - b[i],
            Op::Mul => a[i] * b[i],
            Op::Div if b[i] != 0.0 => a[i] / b[i],
            _ => return None,
        };
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    Some(format!("#{:02x}{:02x}{:02x}", out[0], out[1], out[2]))
}

fn strip_quotes(s: &str) -> Option<(char, &str)> {
    let q = s.chars().next()?;
    if (q == '"' || q == '\'') && s.len() >= 2 && s.ends_with(q) {
        Some((q, &s[1..s.len() - 1]))
    } else {
        None
    }
}

fn concat(l: &str, r: &str, span: Span) -> Lit {
    // a quoted left side keeps its quotes around the whole result
    let value = match strip_quotes(l) {
        Some((q, a)) => {
            let b = strip_quotes(r).map_or(r, |(_, b)| b);
            format!("{q}{a}{b}{q}")
        }
        None => format!("{l}{r}"),
    };
    Lit::new(LitKind::Str, value, span)
}

/// Integers print without a fraction; others get at most five decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let s = format!("{:.5}", n);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
