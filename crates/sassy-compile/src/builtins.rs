//! Builtin function table.
//!
//! Functions are registered under a signature string such as
//! `unquote($string)`. The evaluator checks the argument count against the
//! signature, then hands the already-evaluated literals to the function.

use std::collections::HashMap;
use std::str::FromStr;

use sassy_ast::ast::{Lit, LitKind};
use tracing::warn;

pub type BuiltinFn = fn(&[Lit]) -> Result<Lit, BuiltinError>;

/// Errors from builtin registration and invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinError {
    /// Name not found in the table
    UnknownFunction(String),
    /// Signature string that is not `name($a, $b...)`
    InvalidSignature(String),
    /// Wrong number of arguments
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    /// Argument the function cannot work with
    InvalidArgument(String),
}

impl std::fmt::Display for BuiltinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuiltinError::UnknownFunction(name) => write!(f, "unknown function: {}", name),
            BuiltinError::InvalidSignature(sig) => write!(f, "invalid signature: {}", sig),
            BuiltinError::Arity {
                name,
                expected,
                found,
            } => write!(
                f,
                "{}() takes {} argument(s), {} given",
                name, expected, found
            ),
            BuiltinError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for BuiltinError {}

/// Parsed `name($a, $b, $rest...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<String>,
    /// Last parameter takes any number of arguments.
    pub variadic: bool,
}

impl FromStr for Signature {
    type Err = BuiltinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BuiltinError::InvalidSignature(s.to_string());
        let (name, rest) = s.split_once('(').ok_or_else(invalid)?;
        let inner = rest.trim_end().strip_suffix(')').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        let mut params = Vec::new();
        let mut variadic = false;
        for raw in inner.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if variadic {
                return Err(invalid());
            }
            let (p, dots) = match raw.strip_suffix("...") {
                Some(p) => (p, true),
                None => (raw, false),
            };
            let Some(p) = p.strip_prefix('$') else {
                return Err(invalid());
            };
            if p.is_empty() {
                return Err(invalid());
            }
            variadic = dots;
            params.push(p.to_string());
        }
        Ok(Signature {
            name: name.to_string(),
            params,
            variadic,
        })
    }
}

impl Signature {
    fn check_arity(&self, found: usize) -> Result<(), BuiltinError> {
        let fixed = self.params.len() - usize::from(self.variadic);
        let ok = if self.variadic {
            found >= fixed
        } else {
            found == fixed
        };
        if ok {
            Ok(())
        } else {
            Err(BuiltinError::Arity {
                name: self.name.clone(),
                expected: fixed,
                found,
            })
        }
    }
}

const DEFAULTS: &[(&str, BuiltinFn)] = &[
    ("unquote($string)", unquote),
    ("quote($string)", quote),
    ("length($value)", length),
];

pub struct Builtins {
    functions: HashMap<String, (Signature, BuiltinFn)>,
}

impl std::fmt::Debug for Builtins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("Builtins").field("functions", &names).finish()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    /// Table with the default functions.
    pub fn new() -> Self {
        let mut table = Self::empty();
        for &(sig, f) in DEFAULTS {
            if let Err(e) = table.register(sig, f) {
                warn!(%e, "skipping builtin");
            }
        }
        table
    }

    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register `f` under `signature`, replacing any function of that name.
    pub fn register(&mut self, signature: &str, f: BuiltinFn) -> Result<(), BuiltinError> {
        let sig: Signature = signature.parse()?;
        self.functions.insert(sig.name.clone(), (sig, f));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.functions.get(name).map(|(sig, _)| sig)
    }

    pub fn call(&self, name: &str, args: &[Lit]) -> Result<Lit, BuiltinError> {
        let (sig, f) = self
            .functions
            .get(name)
            .ok_or_else(|| BuiltinError::UnknownFunction(name.to_string()))?;
        sig.check_arity(args.len())?;
        f(args)
    }
}

// ---------------------------------------------------------------------------
// Default functions
// ---------------------------------------------------------------------------

fn strip_quotes(s: &str) -> Option<&str> {
    let first = s.chars().next()?;
    if (first == '"' || first == '\'') && s.len() >= 2 && s.ends_with(first) {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn unquote(args: &[Lit]) -> Result<Lit, BuiltinError> {
    let arg = &args[0];
    let value = strip_quotes(&arg.value).unwrap_or(&arg.value);
    Ok(Lit::new(LitKind::Str, value, arg.span))
}

fn quote(args: &[Lit]) -> Result<Lit, BuiltinError> {
    let arg = &args[0];
    if strip_quotes(&arg.value).is_some() {
        return Ok(Lit::new(LitKind::Str, arg.value.clone(), arg.span));
    }
    if arg.value.contains('"') {
        return Err(BuiltinError::InvalidArgument(format!(
            "cannot quote {}",
            arg.value
        )));
    }
    Ok(Lit::new(LitKind::Str, format!("\"{}\"", arg.value), arg.span))
}

/// Items separated by spaces or commas; a quoted string is one item.
fn length(args: &[Lit]) -> Result<Lit, BuiltinError> {
    let arg = &args[0];
    let n = if strip_quotes(&arg.value).is_some() {
        1
    } else {
        arg.value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .count()
    };
    Ok(Lit::new(LitKind::Number, n.to_string(), arg.span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sassy_ast::span::Span;

    fn s(v: &str) -> Lit {
        Lit::new(LitKind::Str, v, Span::default())
    }

    #[test]
    fn signatures() {
        let sig: Signature = "unquote($string)".parse().unwrap();
        assert_eq!(sig.name, "unquote");
        assert_eq!(sig.params, vec!["string"]);
        assert!(!sig.variadic);

        let sig: Signature = "join($a, $rest...)".parse().unwrap();
        assert!(sig.variadic);
        assert!(sig.check_arity(1).is_ok());
        assert!(sig.check_arity(4).is_ok());
        assert!(sig.check_arity(0).is_err());

        assert!("nope".parse::<Signature>().is_err());
        assert!("f(a)".parse::<Signature>().is_err());
        assert!("f($a..., $b)".parse::<Signature>().is_err());
    }

    #[test]
    fn defaults_are_registered() {
        let b = Builtins::new();
        assert!(b.contains("unquote"));
        assert!(b.contains("quote"));
        assert!(b.contains("length"));
        assert!(!Builtins::empty().contains("unquote"));
    }

    #[test]
    fn quote_round_trip() {
        let b = Builtins::new();
        assert_eq!(b.call("unquote", &[s("\"a b\"")]).unwrap().value, "a b");
        assert_eq!(b.call("unquote", &[s("plain")]).unwrap().value, "plain");
        assert_eq!(b.call("quote", &[s("a")]).unwrap().value, "\"a\"");
        assert_eq!(b.call("quote", &[s("'a'")]).unwrap().value, "'a'");
    }

    #[test]
    fn length_counts_items() {
        let b = Builtins::new();
        let n = b.call("length", &[s("1px 2px, 3px")]).unwrap();
        assert_eq!(n.kind, LitKind::Number);
        assert_eq!(n.value, "3");
        assert_eq!(b.call("length", &[s("\"a b\"")]).unwrap().value, "1");
    }

    #[test]
    fn arity_and_unknown() {
        let b = Builtins::new();
        assert_eq!(
            b.call("quote", &[]),
            Err(BuiltinError::Arity {
                name: "quote".into(),
                expected: 1,
                found: 0
            })
        );
        assert!(matches!(
            b.call("nope", &[]),
            Err(BuiltinError::UnknownFunction(_))
        ));
    }

    #[test]
    fn custom_registration() {
        fn first(args: &[Lit]) -> Result<Lit, BuiltinError> {
            Ok(args[0].clone())
        }
        let mut b = Builtins::empty();
        b.register("first($list...)", first).unwrap();
        assert_eq!(b.call("first", &[s("x"), s("y")]).unwrap().value, "x");
        assert!(b.register("broken", first).is_err());
    }
}
