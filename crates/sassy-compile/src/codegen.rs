//! Depth-first walk from the AST to indented CSS.
//!
//! Braces open lazily on the first emitted child, so a block with nothing
//! to print leaves no trace in the output. A nested rule closes its
//! parent's brace first; when the parent already printed something, the
//! nested block is indented one level deeper.

use sassy_ast::ast::{Comment, PropDecl, RuleBlock, SelStmt, Stmt, Stylesheet};
use tracing::{debug, warn};

use crate::builtins::Builtins;
use crate::error::CompileError;
use crate::eval::{Evaluator, Mode};
use crate::selector::resolve;

/// Compiler configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub mode: Mode,
}

#[derive(Debug, Default)]
pub struct Compiler {
    options: Options,
    builtins: Builtins,
}

impl Compiler {
    pub fn new(options: Options) -> Self {
        Self::with_builtins(options, Builtins::new())
    }

    pub fn with_builtins(options: Options, builtins: Builtins) -> Self {
        Self { options, builtins }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Register extra functions before compiling.
    pub fn builtins_mut(&mut self) -> &mut Builtins {
        &mut self.builtins
    }

    /// Compile one stylesheet. Nothing is returned alongside an error.
    pub fn compile(&self, sheet: &Stylesheet) -> Result<String, CompileError> {
        debug!(
            items = sheet.items.len(),
            mode = ?self.options.mode,
            "compiling stylesheet"
        );
        let mut em = Emitter {
            eval: Evaluator::new(&self.builtins, self.options.mode),
            out: String::new(),
            depth: 0,
            open: false,
            last_closed: None,
        };
        em.walk(&sheet.items, None)?;
        if !em.out.is_empty() && !em.out.ends_with('\n') {
            em.out.push('\n');
        }
        Ok(em.out)
    }
}

/// Compile with default options and builtins.
pub fn compile(sheet: &Stylesheet) -> Result<String, CompileError> {
    Compiler::default().compile(sheet)
}

struct Emitter<'c> {
    eval: Evaluator<'c>,
    out: String,
    /// Indent level of the active block.
    depth: usize,
    /// Whether the active block's brace has been written.
    open: bool,
    /// Depth of the last brace closed, for sibling separation.
    last_closed: Option<usize>,
}

impl Emitter<'_> {
    fn walk(&mut self, stmts: &[Stmt], active: Option<&SelStmt>) -> Result<(), CompileError> {
        for stmt in stmts {
            match stmt {
                Stmt::Rule(rule) => self.rule(rule, active)?,
                Stmt::Prop(prop) => self.prop(prop, active)?,
                Stmt::Var(decl) => {
                    self.eval.declare(decl)?;
                }
                Stmt::Comment(c) => self.comment(c, active),
                Stmt::Import(i) => {
                    warn!(path = %i.path, offset = i.span.start, "@import is not resolved; skipped");
                }
                Stmt::Directive(d) => {
                    warn!(keyword = %d.keyword, offset = d.span.start, "unsupported directive skipped");
                }
            }
        }
        Ok(())
    }

    fn rule(&mut self, rule: &RuleBlock, parent: Option<&SelStmt>) -> Result<(), CompileError> {
        let selector = resolve(&rule.sel, parent)?;
        debug!(%selector, depth = self.depth, "enter rule");
        let deeper = self.eval.scope.rule_len() > 0;
        self.close();
        let saved = self.depth;
        if deeper {
            self.depth += 1;
        }
        self.eval.scope.push();
        self.walk(&rule.block.stmts, Some(&rule.sel))?;
        self.close();
        self.eval.scope.pop()?;
        self.depth = saved;
        Ok(())
    }

    fn prop(&mut self, prop: &PropDecl, active: Option<&SelStmt>) -> Result<(), CompileError> {
        let Some(sel) = active else {
            warn!(name = %prop.name.text, offset = prop.span.start, "property outside of a rule skipped");
            return Ok(());
        };
        let value = self.eval.eval_list(&prop.values)?;
        self.open(sel);
        self.eval.scope.rule_add();
        self.line(self.depth + 1, &format!("{}: {};", prop.name.text, value));
        Ok(())
    }

    fn comment(&mut self, c: &Comment, active: Option<&SelStmt>) {
        if c.text.starts_with("//") {
            return;
        }
        match active {
            Some(sel) => {
                self.open(sel);
                self.eval.scope.rule_add();
                self.line(self.depth + 1, &c.text);
            }
            None => {
                if !self.out.is_empty() {
                    self.out.push('\n');
                }
                self.line(0, &c.text);
                self.last_closed = None;
            }
        }
    }

    fn open(&mut self, sel: &SelStmt) {
        if self.open {
            return;
        }
        if !self.out.is_empty() && (self.depth == 0 || self.last_closed == Some(self.depth)) {
            self.out.push('\n');
        }
        let text = sel.resolved().unwrap_or_default();
        self.line(self.depth, &format!("{} {{", text));
        self.open = true;
        self.last_closed = None;
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.line(self.depth, "}");
        self.open = false;
        self.last_closed = Some(self.depth);
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}
