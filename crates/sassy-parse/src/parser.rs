use crate::scanner::{ScanMode, Scanner};
use crate::selector::parse_selector;
use crate::token::{Tok, TokKind};
use crate::values::parse_values;
use anyhow::{bail, Result};
use sassy_ast::ast::{
    Block, Comment, Directive, Ident, Import, PropDecl, RuleBlock, SelStmt, Stmt, Stylesheet,
    VarDecl,
};
use sassy_ast::span::Span;
use tracing::{debug, warn};

pub fn parse_str(file: &str, src: &str) -> Result<Stylesheet> {
    parse_with_mode(file, src, ScanMode::Lenient)
}

pub fn parse_with_mode(file: &str, src: &str, mode: ScanMode) -> Result<Stylesheet> {
    debug!(file, bytes = src.len(), ?mode, "parsing stylesheet");
    let mut p = Parser::new(src, mode);
    p.parse_stylesheet()
}

struct Parser<'a> {
    src: &'a str,
    scan: Scanner<'a>,
    cur: Tok,
    nxt: Tok,
    /// End of the last consumed token. Statement text starts here so bytes
    /// the scanner dropped (`>`, `&`, quotes) are still seen.
    prev_end: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, mode: ScanMode) -> Self {
        let mut scan = Scanner::new(src).with_mode(mode);
        let cur = scan.next_tok();
        let nxt = scan.next_tok();
        Self {
            src,
            scan,
            cur,
            nxt,
            prev_end: 0,
        }
    }

    fn bump(&mut self) {
        self.prev_end = self.cur.span.end as usize;
        self.cur = std::mem::replace(&mut self.nxt, self.scan.next_tok());
    }

    fn expect(&mut self, k: TokKind) -> Result<Tok> {
        if self.cur.kind == k {
            let t = self.cur.clone();
            self.bump();
            Ok(t)
        } else {
            bail!(
                "expected {:?}, found {:?} at offset {}",
                k,
                self.cur.kind,
                self.cur.offset()
            )
        }
    }

    /// Trimmed byte range of `src[start..end]`.
    fn trimmed(&self, start: usize, end: usize) -> (usize, usize) {
        let slice = &self.src[start..end];
        let lead = slice.len() - slice.trim_start().len();
        (start + lead, start + lead + slice.trim().len())
    }

    // ======= stylesheet / statements =======

    fn parse_stylesheet(&mut self) -> Result<Stylesheet> {
        let items = self.parse_stmts(false)?;
        Ok(Stylesheet {
            items,
            span: Span::new(0, self.src.len() as u32),
        })
    }

    fn parse_stmts(&mut self, nested: bool) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            match self.cur.kind {
                TokKind::Eof if nested => {
                    bail!("expected `}}` before end of input at offset {}", self.cur.offset())
                }
                TokKind::Eof => break,
                TokKind::RBrace if nested => break,
                TokKind::RBrace => bail!("unmatched `}}` at offset {}", self.cur.offset()),
                TokKind::Semicolon => self.bump(),
                _ => stmts.push(self.parse_stmt()?),
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.cur.kind {
            TokKind::Comment => {
                let c = Comment {
                    text: self.cur.text.clone(),
                    span: self.cur.span,
                };
                self.bump();
                Ok(Stmt::Comment(c))
            }
            TokKind::VarDecl => self.parse_var_decl(),
            TokKind::VarUse if self.nxt.kind == TokKind::Colon => self.parse_var_decl(),
            TokKind::Import => self.parse_import(),
            TokKind::Include
            | TokKind::Each
            | TokKind::Function
            | TokKind::Mixin
            | TokKind::If
            | TokKind::Else => self.parse_directive(),
            TokKind::Error => bail!("{}", self.cur.text),
            TokKind::Interp => bail!(
                "interpolation `#{{` is not supported (offset {})",
                self.cur.offset()
            ),
            _ => self.parse_rule_or_prop(),
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt> {
        let name_tok = self.cur.clone();
        self.bump();
        let colon = self.expect(TokKind::Colon)?;
        let end = self.skip_to_terminator()?;
        if self.cur.kind == TokKind::LBrace {
            bail!(
                "unexpected `{{` in declaration of `{}` at offset {}",
                name_tok.text,
                self.cur.offset()
            );
        }
        let values = parse_values(self.src, colon.span.end as usize, end)?;
        let span = Span::new(name_tok.span.start, end as u32);
        if self.cur.kind == TokKind::Semicolon {
            self.bump();
        }
        Ok(Stmt::Var(VarDecl {
            name: Ident {
                text: name_tok.text,
                span: name_tok.span,
            },
            values,
            span,
        }))
    }

    fn parse_import(&mut self) -> Result<Stmt> {
        let kw = self.expect(TokKind::Import)?;
        let end = self.skip_to_terminator()?;
        let path = self.src[kw.span.end as usize..end]
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string();
        if self.cur.kind == TokKind::Semicolon {
            self.bump();
        }
        Ok(Stmt::Import(Import {
            path,
            span: Span::new(kw.span.start, end as u32),
        }))
    }

    /// `@include`, `@mixin`, `@if`, ...: skipped through their `;` or over
    /// one balanced block.
    fn parse_directive(&mut self) -> Result<Stmt> {
        let kw = self.cur.clone();
        self.bump();
        let mut depth = 0usize;
        loop {
            match self.cur.kind {
                TokKind::Eof if depth > 0 => bail!(
                    "unclosed block in `{}` at offset {}",
                    kw.text,
                    kw.offset()
                ),
                TokKind::Eof => break,
                TokKind::Error => bail!("{}", self.cur.text),
                TokKind::Semicolon if depth == 0 => {
                    self.bump();
                    break;
                }
                TokKind::RBrace if depth == 0 => break,
                TokKind::RBrace => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                    continue;
                }
                TokKind::LBrace => depth += 1,
                _ => {}
            }
            self.bump();
        }
        Ok(Stmt::Directive(Directive {
            keyword: kw.text,
            span: Span::new(kw.span.start, self.prev_end as u32),
        }))
    }

    /// Consume tokens up to (not including) `;`, `{`, `}` or end of input and
    /// return the byte offset where that terminator starts.
    fn skip_to_terminator(&mut self) -> Result<usize> {
        loop {
            match self.cur.kind {
                TokKind::Semicolon | TokKind::LBrace | TokKind::RBrace | TokKind::Eof => {
                    return Ok(self.cur.offset())
                }
                TokKind::Error => bail!("{}", self.cur.text),
                TokKind::Interp => bail!(
                    "interpolation `#{{` is not supported (offset {})",
                    self.cur.offset()
                ),
                _ => self.bump(),
            }
        }
    }

    fn parse_rule_or_prop(&mut self) -> Result<Stmt> {
        let stmt_start = self.prev_end;
        let mut colon: Option<Tok> = None;
        loop {
            match self.cur.kind {
                TokKind::Semicolon | TokKind::LBrace | TokKind::RBrace | TokKind::Eof => break,
                TokKind::Error => bail!("{}", self.cur.text),
                TokKind::Interp => bail!(
                    "interpolation `#{{` is not supported (offset {})",
                    self.cur.offset()
                ),
                TokKind::Colon if colon.is_none() => colon = Some(self.cur.clone()),
                _ => {}
            }
            self.bump();
        }
        let end = self.cur.offset();

        if self.cur.kind == TokKind::LBrace {
            let (s, e) = self.trimmed(stmt_start, end);
            if s == e {
                bail!("rule without a selector at offset {}", end);
            }
            let sel = parse_selector(&self.src[s..e], s)?;
            let sel_span = Span::new(s as u32, e as u32);
            let lbrace = self.expect(TokKind::LBrace)?;
            let stmts = self.parse_stmts(true)?;
            let rbrace = self.expect(TokKind::RBrace)?;
            return Ok(Stmt::Rule(RuleBlock {
                sel: SelStmt::with_source(sel, &self.src[s..e], sel_span),
                block: Block {
                    stmts,
                    span: lbrace.span.to(rbrace.span),
                },
                span: Span::new(s as u32, rbrace.span.end),
            }));
        }

        let Some(colon) = colon else {
            let (s, e) = self.trimmed(stmt_start, end);
            warn!(offset = s, "statement without `:` kept as an unsupported directive");
            if self.cur.kind == TokKind::Semicolon {
                self.bump();
            }
            return Ok(Stmt::Directive(Directive {
                keyword: self.src[s..e].to_string(),
                span: Span::new(s as u32, e as u32),
            }));
        };

        let (ns, ne) = self.trimmed(stmt_start, colon.offset());
        if ns == ne {
            bail!("property without a name at offset {}", colon.offset());
        }
        let values = parse_values(self.src, colon.span.end as usize, end)?;
        if self.cur.kind == TokKind::Semicolon {
            self.bump();
        }
        Ok(Stmt::Prop(PropDecl {
            name: Ident {
                text: self.src[ns..ne].to_string(),
                span: Span::new(ns as u32, ne as u32),
            },
            values,
            span: Span::new(ns as u32, end as u32),
        }))
    }
}
