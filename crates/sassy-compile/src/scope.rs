//! Variable bindings and the block scope stack.

use std::collections::{HashMap, HashSet};

use sassy_ast::ast::Lit;
use sassy_ast::span::Span;

use crate::error::CompileError;

/// Handle to a record in [`Bindings`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingId(u32);

#[derive(Clone, Debug, PartialEq)]
pub enum Bound {
    Value(Lit),
    /// `$a: $b;` points at `$b`'s record as it was when `$a` was declared.
    Alias(BindingId),
}

#[derive(Clone, Debug)]
pub struct Binding {
    pub name: String,
    pub value: Bound,
    pub span: Span,
}

/// Arena of every declaration made while compiling one stylesheet.
#[derive(Debug, Default)]
pub struct Bindings {
    records: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next `declare` will return.
    pub fn next_id(&self) -> BindingId {
        BindingId(self.records.len() as u32)
    }

    pub fn declare(&mut self, name: &str, value: Bound, span: Span) -> BindingId {
        let id = self.next_id();
        self.records.push(Binding {
            name: name.to_string(),
            value,
            span,
        });
        id
    }

    pub fn get(&self, id: BindingId) -> Option<&Binding> {
        self.records.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Follow aliases from `id` to a value.
    pub fn chase(&self, id: BindingId) -> Result<&Lit, CompileError> {
        let mut seen = HashSet::new();
        let mut cur = id;
        let mut last: Option<&Binding> = None;
        loop {
            let Some(b) = self.get(cur) else {
                let (name, span) = last.map_or((String::new(), Span::default()), |b| {
                    (b.name.clone(), b.span)
                });
                return Err(CompileError::UndefinedVariable { name, span });
            };
            if !seen.insert(cur) {
                return Err(CompileError::CircularBinding {
                    name: b.name.clone(),
                    span: b.span,
                });
            }
            match &b.value {
                Bound::Value(lit) => return Ok(lit),
                Bound::Alias(next) => cur = *next,
            }
            last = Some(b);
        }
    }
}

#[derive(Debug, Default)]
struct Frame {
    names: HashMap<String, BindingId>,
    rules: usize,
}

/// One frame per open block; the root frame is never popped.
#[derive(Debug)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop(&mut self) -> Result<(), CompileError> {
        if self.frames.len() <= 1 {
            return Err(CompileError::ScopeUnderflow);
        }
        self.frames.pop();
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn bind(&mut self, name: &str, id: BindingId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.names.insert(name.to_string(), id);
        }
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<BindingId> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.names.get(name).copied())
    }

    /// Count one emitted rule in the innermost frame.
    pub fn rule_add(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.rules += 1;
        }
    }

    pub fn rule_len(&self) -> usize {
        self.frames.last().map_or(0, |f| f.rules)
    }
}
