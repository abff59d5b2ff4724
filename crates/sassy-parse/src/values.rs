//! Value lists on the right of `name:` and `$name:`.
//!
//! Values are re-read from the source range the statement's tokens cover:
//! the scanner drops quotes and stray punctuation, both of which matter
//! here.

use anyhow::{bail, Result};
use sassy_ast::ast::{parse_hex_color, split_number, Expr, Ident, LitKind, Op};
use sassy_ast::span::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Atom {
    Word,
    Var,
    Quoted,
    Comma,
    Op(Op),
    Open,
    Close,
}

#[derive(Clone, Copy, Debug)]
struct Piece {
    atom: Atom,
    start: usize,
    end: usize,
    space_before: bool,
    space_after: bool,
}

/// Parse the value list found in `src[start..end]`.
pub fn parse_values(src: &str, start: usize, end: usize) -> Result<Vec<Expr>> {
    let pieces = atomize(src, start, end)?;
    if let [only] = pieces.as_slice() {
        if only.atom == Atom::Quoted && only.end - only.start >= 2 {
            return Ok(quoted_words(src, *only));
        }
    }
    let mut p = ValueParser {
        src,
        pieces,
        pos: 0,
    };
    p.parse_list(None)
}

fn atomize(src: &str, start: usize, end: usize) -> Result<Vec<Piece>> {
    let text = &src[start..end];
    let mut out = Vec::new();
    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if c.is_whitespace() {
            continue;
        }
        let atom = match c {
            '"' | '\'' => {
                if !iter.by_ref().any(|(_, q)| q == c) {
                    bail!("unterminated string at offset {}", start + i);
                }
                Atom::Quoted
            }
            '/' if matches!(iter.peek(), Some((_, '*'))) => {
                iter.next();
                let mut prev = ' ';
                for (_, n) in iter.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                continue;
            }
            ';' => break,
            ',' => Atom::Comma,
            '(' => Atom::Open,
            ')' => Atom::Close,
            '+' => Atom::Op(Op::Add),
            '-' => Atom::Op(Op::Sub),
            '*' => Atom::Op(Op::Mul),
            '/' => Atom::Op(Op::Div),
            '#' if matches!(iter.peek(), Some((_, '{'))) => {
                bail!("interpolation `#{{` is not supported (offset {})", start + i)
            }
            '$' => {
                while let Some(&(_, n)) = iter.peek() {
                    if !(n.is_alphanumeric() || n == '-' || n == '_') {
                        break;
                    }
                    iter.next();
                }
                Atom::Var
            }
            _ => {
                while let Some(&(j, n)) = iter.peek() {
                    if n.is_whitespace()
                        || "(),;'\"+".contains(n)
                        || text[j..].starts_with("/*")
                    {
                        break;
                    }
                    iter.next();
                }
                Atom::Word
            }
        };
        let atom_end = iter.peek().map_or(text.len(), |&(j, _)| j);
        out.push(Piece {
            atom,
            start: start + i,
            end: start + atom_end,
            space_before: text[..i].chars().next_back().map_or(true, char::is_whitespace),
            space_after: text[atom_end..].chars().next().map_or(true, char::is_whitespace),
        });
    }
    Ok(out)
}

/// A value that is one quoted string becomes quote markers around its words.
fn quoted_words(src: &str, piece: Piece) -> Vec<Expr> {
    let quote = &src[piece.start..piece.start + 1];
    let open = Span::new(piece.start as u32, piece.start as u32 + 1);
    let close = Span::new(piece.end as u32 - 1, piece.end as u32);
    let mut out = vec![Expr::lit(LitKind::Quote, quote, open)];
    let inner_start = piece.start + 1;
    let inner = &src[inner_start..piece.end - 1];
    let mut word_start = None;
    for (i, c) in inner.char_indices().chain(std::iter::once((inner.len(), ' '))) {
        match (c.is_whitespace(), word_start) {
            (false, None) => word_start = Some(i),
            (true, Some(s)) => {
                let span = Span::new((inner_start + s) as u32, (inner_start + i) as u32);
                out.push(Expr::lit(LitKind::Str, &inner[s..i], span));
                word_start = None;
            }
            _ => {}
        }
    }
    out.push(Expr::lit(LitKind::Quote, quote, close));
    out
}

struct ValueParser<'a> {
    src: &'a str,
    pieces: Vec<Piece>,
    pos: usize,
}

impl<'a> ValueParser<'a> {
    fn cur(&self) -> Option<Piece> {
        self.pieces.get(self.pos).copied()
    }

    fn text(&self, p: Piece) -> &'a str {
        &self.src[p.start..p.end]
    }

    fn span(p: Piece) -> Span {
        Span::new(p.start as u32, p.end as u32)
    }

    fn starts_term(p: Option<Piece>) -> bool {
        !matches!(
            p.map(|p| p.atom),
            None | Some(Atom::Comma) | Some(Atom::Close)
        )
    }

    /// Items up to the end, or up to the `)` matching `open`.
    fn parse_list(&mut self, open: Option<Piece>) -> Result<Vec<Expr>> {
        let mut out = Vec::new();
        loop {
            match self.cur() {
                None => match open {
                    Some(o) => bail!("unclosed `(` at offset {}", o.start),
                    None => break,
                },
                Some(p) if p.atom == Atom::Close => match open {
                    Some(_) => break,
                    None => bail!("unexpected `)` at offset {}", p.start),
                },
                Some(p) if p.atom == Atom::Comma => {
                    out.push(Expr::lit(LitKind::Str, ",", Self::span(p)));
                    self.pos += 1;
                }
                Some(_) => out.push(self.parse_expr_bp(0)?),
            }
        }
        Ok(out)
    }

    // infix binding: (lbp, rbp); an operator is infix only when spaced the
    // same on both sides, so `0 -1px` stays two values
    fn infix(p: Piece) -> Option<(Op, u8, u8)> {
        let Atom::Op(op) = p.atom else {
            return None;
        };
        if p.space_before != p.space_after {
            return None;
        }
        match op.binding_power() {
            2 => Some((op, 20, 21)),
            _ => Some((op, 10, 11)),
        }
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;
        while let Some(p) = self.cur() {
            let Some((op, lbp, rbp)) = Self::infix(p) else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_operand(rbp, p.end)?;
            lhs = Expr::binary(lhs, op, rhs);
        }
        Ok(lhs)
    }

    /// The right side of an operator; empty when the list ends first.
    fn parse_operand(&mut self, rbp: u8, at: usize) -> Result<Expr> {
        if Self::starts_term(self.cur()) {
            self.parse_expr_bp(rbp)
        } else {
            Ok(Expr::lit(LitKind::Str, "", Span::new(at as u32, at as u32)))
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        let Some(p) = self.cur() else {
            bail!("expected a value");
        };
        self.pos += 1;
        match p.atom {
            Atom::Word => {
                let text = self.text(p);
                match self.cur() {
                    Some(next) if next.atom == Atom::Open && next.start == p.end => {
                        let callee = Ident {
                            text: text.to_string(),
                            span: Self::span(p),
                        };
                        self.parse_call(callee, next)
                    }
                    _ => Ok(classify(text, Self::span(p))),
                }
            }
            Atom::Var => Ok(Expr::lit(LitKind::Var, self.text(p), Self::span(p))),
            Atom::Quoted => Ok(Expr::lit(LitKind::Str, self.text(p), Self::span(p))),
            Atom::Open => {
                let mut items = self.parse_list(Some(p))?;
                let close = self.pieces[self.pos];
                self.pos += 1;
                if items.len() == 1 {
                    if let Some(only) = items.pop() {
                        return Ok(only);
                    }
                }
                let inner = self.src[p.end..close.start].trim();
                let span = Span::new(p.start as u32, close.end as u32);
                Ok(Expr::lit(LitKind::Str, format!("({inner})"), span))
            }
            Atom::Op(op @ (Op::Sub | Op::Add))
                if !p.space_after && Self::starts_term(self.cur()) =>
            {
                let inner = self.parse_expr_bp(100)?;
                let span = Self::span(p).to(inner.span());
                Ok(Expr::unary(op, inner, span))
            }
            Atom::Op(op) => {
                // operator with nothing on its left
                let empty = Expr::lit(LitKind::Str, "", Span::new(p.start as u32, p.start as u32));
                let rhs = self.parse_operand(21, p.end)?;
                Ok(Expr::binary(empty, op, rhs))
            }
            Atom::Comma | Atom::Close => bail!("expected a value at offset {}", p.start),
        }
    }

    fn parse_call(&mut self, callee: Ident, open: Piece) -> Result<Expr> {
        self.pos += 1;
        let mut args = Vec::new();
        let mut current = Vec::new();
        let mut arg_start = open.end;
        loop {
            let Some(p) = self.cur() else {
                bail!(
                    "unclosed `(` in call to `{}` at offset {}",
                    callee.text,
                    open.start
                );
            };
            match p.atom {
                Atom::Close | Atom::Comma => {
                    self.finish_arg(&mut current, arg_start, p.start, &mut args);
                    self.pos += 1;
                    arg_start = p.end;
                    if p.atom == Atom::Close {
                        let span = callee.span.to(Self::span(p));
                        return Ok(Expr::Call { callee, args, span });
                    }
                }
                _ => current.push(self.parse_expr_bp(0)?),
            }
        }
    }

    // An argument with several values is kept as its source text.
    fn finish_arg(&self, current: &mut Vec<Expr>, start: usize, end: usize, args: &mut Vec<Expr>) {
        match current.len() {
            0 => {}
            1 => args.extend(current.drain(..)),
            _ => {
                let text = self.src[start..end].trim();
                let lead = self.src[start..end].len() - self.src[start..end].trim_start().len();
                let s = start + lead;
                let span = Span::new(s as u32, (s + text.len()) as u32);
                args.push(Expr::lit(LitKind::Str, text, span));
                current.clear();
            }
        }
    }
}

fn classify(text: &str, span: Span) -> Expr {
    if parse_hex_color(text).is_some() {
        Expr::lit(LitKind::Color, text, span)
    } else if split_number(text).is_some() {
        Expr::lit(LitKind::Number, text, span)
    } else if text.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        Expr::Ident(Ident {
            text: text.to_string(),
            span,
        })
    } else {
        Expr::lit(LitKind::Str, text, span)
    }
}
