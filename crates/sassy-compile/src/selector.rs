//! Flattening of nested selectors.
//!
//! A selector tree is folded post-order into a list of alternatives, each
//! node at its precedence tier. The parent's alternatives come from its
//! already-resolved text, split at top-level commas.

use sassy_ast::ast::{Expr, Op, SelStmt};
use sassy_ast::span::Span;
use tracing::trace;

use crate::error::CompileError;

/// Precedence tier a node is folded at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Leaf = 2,
    Group = 3,
    Combinator = 4,
    Unary = 5,
}

impl Tier {
    pub fn of(e: &Expr) -> Tier {
        match e {
            Expr::Unary { .. } => Tier::Unary,
            Expr::Binary { op: Op::Comma, .. } => Tier::Group,
            Expr::Binary { .. } => Tier::Combinator,
            Expr::Lit(_) | Expr::Ident(_) | Expr::Call { .. } => Tier::Leaf,
        }
    }
}

/// Resolve `stmt` against its enclosing rule, storing the result in the
/// statement. A statement that is already resolved is returned as is.
pub fn resolve<'s>(stmt: &'s SelStmt, parent: Option<&SelStmt>) -> Result<&'s str, CompileError> {
    if let Some(done) = stmt.resolved() {
        return Ok(done);
    }
    let parents = match parent {
        Some(p) => match p.resolved() {
            Some(text) => split_alternatives(text),
            None => return Err(CompileError::UnresolvedParent { span: p.span }),
        },
        None => Vec::new(),
    };
    let alts = fold(&stmt.sel, Tier::of(&stmt.sel), &parents)?;
    let joined = match &stmt.source {
        // a lone unparented alternative prints as written
        Some(text) if parents.is_empty() && Tier::of(&stmt.sel) != Tier::Group => text.clone(),
        _ => alts.join(", "),
    };
    trace!(selector = %joined, parents = parents.len(), "resolved selector");
    Ok(stmt.resolved.get_or_init(|| joined).as_str())
}

fn fold(e: &Expr, tier: Tier, parents: &[String]) -> Result<Vec<String>, CompileError> {
    match (tier, e) {
        (Tier::Group, Expr::Binary { .. }) => {
            let mut operands = Vec::new();
            flatten_commas(e, &mut operands);
            let mut lists = Vec::with_capacity(operands.len());
            for operand in operands {
                lists.push(fold(operand, Tier::of(operand), parents)?);
            }
            let Some(mut acc) = lists.pop() else {
                return Ok(Vec::new());
            };
            while let Some(left) = lists.pop() {
                acc = merge_alternatives(&left, &acc, e.span())?;
            }
            Ok(acc)
        }
        (Tier::Unary, Expr::Unary { op, expr, span }) => {
            if parents.is_empty() {
                return Err(CompileError::UnaryWithoutParent { op: *op, span: *span });
            }
            let child = render(expr)?;
            let fragment = match op {
                Op::Nest => format!("&{child}"),
                _ => format!("& {op} {child}"),
            };
            Ok(inject(parents, &[fragment], " "))
        }
        (Tier::Combinator, Expr::Binary { lhs, op, rhs, .. }) => {
            if matches!(**lhs, Expr::Unary { .. }) && matches!(**rhs, Expr::Unary { .. }) {
                let left = fold(lhs, Tier::Unary, parents)?;
                let right = fold(rhs, Tier::Unary, parents)?;
                return Ok(inject(&left, &right, &format!(" {op} ")));
            }
            if !matches!(**lhs, Expr::Unary { .. }) {
                let whole = render(e)?;
                if whole.contains('&') {
                    if parents.is_empty() {
                        return Err(CompileError::UnresolvedParent { span: e.span() });
                    }
                    return Ok(parents.iter().map(|p| whole.replace('&', p)).collect());
                }
            }
            // only the leading operand meets the parent
            let left = fold(lhs, Tier::of(lhs), parents)?;
            let right = render(rhs)?;
            Ok(left
                .into_iter()
                .map(|l| format!("{l} {op} {right}"))
                .collect())
        }
        (Tier::Leaf, Expr::Lit(l)) => leaf(&l.value, parents, l.span),
        (Tier::Leaf, Expr::Ident(id)) => leaf(&id.text, parents, id.span),
        _ => Err(CompileError::InvalidSelector {
            kind: e.kind(),
            span: e.span(),
        }),
    }
}

fn leaf(text: &str, parents: &[String], span: Span) -> Result<Vec<String>, CompileError> {
    if parents.is_empty() {
        if text.contains('&') {
            return Err(CompileError::UnresolvedParent { span });
        }
        return Ok(vec![text.to_string()]);
    }
    Ok(inject(parents, &[text.to_string()], " "))
}

fn flatten_commas<'e>(e: &'e Expr, out: &mut Vec<&'e Expr>) {
    match e {
        Expr::Binary {
            lhs,
            op: Op::Comma,
            rhs,
            ..
        } => {
            flatten_commas(lhs, out);
            flatten_commas(rhs, out);
        }
        other => out.push(other),
    }
}

/// Selector text of a subtree that is not joined to the parent.
fn render(e: &Expr) -> Result<String, CompileError> {
    match e {
        Expr::Lit(l) => Ok(l.value.clone()),
        Expr::Ident(id) => Ok(id.text.clone()),
        Expr::Unary {
            op: Op::Nest, expr, ..
        } => Ok(format!("&{}", render(expr)?)),
        Expr::Unary { op, expr, .. } => Ok(format!("{op} {}", render(expr)?)),
        Expr::Binary { lhs, op, rhs, .. } if *op != Op::Comma => {
            Ok(format!("{} {op} {}", render(lhs)?, render(rhs)?))
        }
        _ => Err(CompileError::InvalidSelector {
            kind: e.kind(),
            span: e.span(),
        }),
    }
}

/// Every parent x child pairing, parent-major. Children mentioning `&` get
/// the parent substituted; others are joined with `delim`.
pub fn inject(parents: &[String], children: &[String], delim: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(parents.len() * children.len());
    for p in parents {
        for c in children {
            if c.contains('&') {
                out.push(c.replace('&', p));
            } else {
                out.push(format!("{p}{delim}{c}"));
            }
        }
    }
    out
}

/// Interleave two alternative lists by run length.
///
/// Both lists are cut into as many runs as the shorter one has items; each
/// output run is the head of the left run, then the whole right run, then
/// the rest of the left run. `[1,3] + [2]` gives `[1,2,3]`.
pub fn merge_alternatives(
    left: &[String],
    right: &[String],
    span: Span,
) -> Result<Vec<String>, CompileError> {
    if left.is_empty() || right.is_empty() {
        return Ok(left.iter().chain(right).cloned().collect());
    }
    let slots = left.len().min(right.len());
    if left.len().max(right.len()) % slots != 0 {
        return Err(CompileError::UnevenMerge {
            left: left.len(),
            right: right.len(),
            span,
        });
    }
    let mut out = Vec::with_capacity(left.len() + right.len());
    for (l, r) in left
        .chunks(left.len() / slots)
        .zip(right.chunks(right.len() / slots))
    {
        out.push(l[0].clone());
        out.extend(r.iter().cloned());
        out.extend(l[1..].iter().cloned());
    }
    Ok(out)
}

/// Split resolved selector text at commas outside parentheses and brackets.
pub fn split_alternatives(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                out.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(text[start..].trim().to_string());
    out.retain(|s| !s.is_empty());
    out
}
