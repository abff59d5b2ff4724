use sassy_ast::span::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokKind {
    // eof / error
    Eof,
    /// Scanner failure; the token text carries the message.
    Error,
    // words
    Text,
    /// Builtin image/sprite function name
    Cmd,
    /// `sprite-map`, which takes a variable number of arguments
    CmdVar,
    /// `$name` immediately followed by `:`
    VarDecl,
    /// `$name` anywhere else
    VarUse,
    /// Bare file or path argument
    File,
    Comment,
    // directives
    Import,
    Include,
    Each,
    Function,
    Mixin,
    If,
    Else,
    // arithmetic; `/` scans as `Mul` with its own lexeme
    Mul,
    Plus,
    Minus,
    // punctuation
    Interp, // #{
    LParen,
    RParen,
    LBrace,
    RBrace,
    Colon,
    Semicolon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tok {
    pub kind: TokKind,
    pub span: Span,
    pub text: String,
}

impl Tok {
    /// Byte offset of the token in the source.
    pub fn offset(&self) -> usize {
        self.span.start as usize
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokKind::Eof
    }
}

impl std::fmt::Display for Tok {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokKind::Eof => f.write_str("EOF"),
            _ => f.write_str(&self.text),
        }
    }
}

/// Builtin function names recognized as commands while scanning text.
///
/// `sprite-map` and bare `sprite` are handled separately by the text state.
pub const COMMANDS: &[&str] = &[
    "sprite-width",
    "sprite-height",
    "sprite-file",
    "sprite-path",
    "sprite-position",
    "sprite-url",
    "sprite-dimensions",
    "sprite-map-name",
    "sprite-names",
    "image-url",
    "inline-image",
    "image-width",
    "image-height",
];

/// True if `s` names a builtin command, including `sprite-map` and `sprite`.
pub fn is_command(s: &str) -> bool {
    s == "sprite-map" || s == "sprite" || COMMANDS.contains(&s)
}
