use sassy_ast::ast::{NodeKind, Op};
use sassy_ast::span::Span;

use crate::builtins::BuiltinError;

/// First fatal error found while compiling one stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Leading combinator (`> a`, `&a`, ...) in a rule with no enclosing rule
    UnaryWithoutParent { op: Op, span: Span },
    /// Comma alternatives whose counts are not multiples of each other
    UnevenMerge {
        left: usize,
        right: usize,
        span: Span,
    },
    /// `&` in a top-level selector
    UnresolvedParent { span: Span },
    /// Node kind that has no meaning inside a selector
    InvalidSelector { kind: NodeKind, span: Span },
    UndefinedVariable { name: String, span: Span },
    /// Alias chain that loops back on itself
    CircularBinding { name: String, span: Span },
    /// Call to an unregistered function (strict mode only)
    UnknownFunction { name: String, span: Span },
    /// Arithmetic with an empty side
    MissingOperand { op: Op, span: Span },
    Builtin {
        name: String,
        source: BuiltinError,
        span: Span,
    },
    /// Internal invariant violation: the root scope frame was popped
    ScopeUnderflow,
}

impl CompileError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::UnaryWithoutParent { span, .. }
            | CompileError::UnevenMerge { span, .. }
            | CompileError::UnresolvedParent { span }
            | CompileError::InvalidSelector { span, .. }
            | CompileError::UndefinedVariable { span, .. }
            | CompileError::CircularBinding { span, .. }
            | CompileError::UnknownFunction { span, .. }
            | CompileError::MissingOperand { span, .. }
            | CompileError::Builtin { span, .. } => Some(*span),
            CompileError::ScopeUnderflow => None,
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CompileError::UnaryWithoutParent { op, span } => write!(
                f,
                "combinator '{}' needs an enclosing rule (offset {})",
                op, span.start
            ),
            CompileError::UnevenMerge { left, right, span } => write!(
                f,
                "cannot merge {} selector(s) with {} selector(s) (offset {})",
                left, right, span.start
            ),
            CompileError::UnresolvedParent { span } => write!(
                f,
                "'&' used outside of a nested rule (offset {})",
                span.start
            ),
            CompileError::InvalidSelector { kind, span } => write!(
                f,
                "{:?} node is not valid in a selector (offset {})",
                kind, span.start
            ),
            CompileError::UndefinedVariable { name, span } => {
                write!(f, "undefined variable '{}' (offset {})", name, span.start)
            }
            CompileError::CircularBinding { name, span } => write!(
                f,
                "variable '{}' refers back to itself (offset {})",
                name, span.start
            ),
            CompileError::UnknownFunction { name, span } => {
                write!(f, "unknown function '{}' (offset {})", name, span.start)
            }
            CompileError::MissingOperand { op, span } => write!(
                f,
                "operator '{}' is missing an operand (offset {})",
                op, span.start
            ),
            CompileError::Builtin { name, source, span } => {
                write!(f, "{}(): {} (offset {})", name, source, span.start)
            }
            CompileError::ScopeUnderflow => write!(f, "internal error: popped the root scope"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Builtin { source, .. } => Some(source),
            _ => None,
        }
    }
}
