//! Selector preludes are parsed from the source text a rule's token run
//! covers, since the scanner drops combinator bytes as whitespace-separated
//! noise.

use anyhow::{bail, Result};
use sassy_ast::ast::{Expr, LitKind, Op};
use sassy_ast::span::Span;

/// Parse `text` (found at byte `base` of the source) into a selector tree.
///
/// Alternatives separated by top-level commas form a right-associative
/// `Comma` chain. Inside one alternative, explicit `>`, `~` and `+`
/// combinators split compound parts; a leading combinator becomes a unary
/// node. Descendant whitespace and `&` stay inside literal text.
pub fn parse_selector(text: &str, base: usize) -> Result<Expr> {
    let alts = split_top_level(text, |c| c == ',');
    let mut exprs = Vec::with_capacity(alts.len());
    for (start, end) in alts {
        let (s, e) = trim_range(text, start, end);
        if s == e {
            bail!("empty selector in `{}` at offset {}", text, base + start);
        }
        exprs.push(parse_alternative(&text[s..e], base + s)?);
    }
    let Some(mut acc) = exprs.pop() else {
        bail!("empty selector at offset {}", base);
    };
    while let Some(lhs) = exprs.pop() {
        acc = Expr::binary(lhs, Op::Comma, acc);
    }
    Ok(acc)
}

fn parse_alternative(text: &str, base: usize) -> Result<Expr> {
    // (op before part, part range)
    let mut parts: Vec<(Option<(Op, usize)>, usize, usize)> = Vec::new();
    let mut pending: Option<(Op, usize)> = None;
    let mut seg_start = 0;
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '>' | '~' | '+' if depth == 0 => {
                let op = match c {
                    '>' => Op::Gt,
                    '~' => Op::Tilde,
                    _ => Op::Add,
                };
                let (s, e) = trim_range(text, seg_start, i);
                if s == e {
                    if pending.is_some() || !parts.is_empty() {
                        bail!("two combinators in a row at offset {}", base + i);
                    }
                } else {
                    parts.push((pending.take(), s, e));
                }
                pending = Some((op, i));
                seg_start = i + 1;
            }
            _ => {}
        }
    }
    let (s, e) = trim_range(text, seg_start, text.len());
    if s == e {
        match pending {
            Some((op, at)) => bail!("combinator `{}` without a right-hand side at offset {}", op, base + at),
            None => bail!("empty selector at offset {}", base),
        }
    }
    parts.push((pending.take(), s, e));

    let mut iter = parts.into_iter();
    let Some((lead, s, e)) = iter.next() else {
        bail!("empty selector at offset {}", base);
    };
    let mut acc = leaf(text, base, s, e);
    if let Some((op, at)) = lead {
        let span = Span::new((base + at) as u32, (base + e) as u32);
        acc = Expr::unary(op, acc, span);
    }
    for (op, s, e) in iter {
        let Some((op, _)) = op else {
            bail!("missing combinator at offset {}", base + s);
        };
        acc = Expr::binary(acc, op, leaf(text, base, s, e));
    }
    Ok(acc)
}

fn leaf(text: &str, base: usize, s: usize, e: usize) -> Expr {
    Expr::lit(
        LitKind::Str,
        &text[s..e],
        Span::new((base + s) as u32, (base + e) as u32),
    )
}

/// Byte ranges between top-level separators, ignoring separators nested in
/// parentheses or brackets.
pub fn split_top_level(text: &str, is_sep: impl Fn(char) -> bool) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if depth == 0 && is_sep(c) => {
                out.push((start, i));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push((start, text.len()));
    out
}

fn trim_range(text: &str, start: usize, end: usize) -> (usize, usize) {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    (start + lead, start + lead + trimmed.len())
}
