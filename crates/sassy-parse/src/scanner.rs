//! State-machine scanner.
//!
//! Each [`State`] consumes some input, may emit tokens into the pending
//! queue, and names the state to run next. `None` is terminal: after it
//! every pull yields a synthetic end-of-stream token.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use sassy_ast::span::Span;
use tracing::{trace, warn};

use crate::token::{is_command, Tok, TokKind, COMMANDS};

/// Symbols allowed inside text runs besides letters and digits.
pub const SYMBOLS: &str = "/\\.*-_";

/// Structural bytes that flush the pending lexeme and route to `Paren`.
const STRUCTURAL: &str = "(),;{}#:";

/// Longest keywords first so a prefix never shadows a longer directive.
const DIRECTIVES: &[(&str, TokKind)] = &[
    ("@function", TokKind::Function),
    ("@include", TokKind::Include),
    ("@import", TokKind::Import),
    ("@mixin", TokKind::Mixin),
    ("@each", TokKind::Each),
    ("@else", TokKind::Else),
    ("@if", TokKind::If),
];

/// How the scanner treats bytes that no state recognizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanMode {
    /// Unknown bytes stay in the pending lexeme and are either glued onto
    /// the next token or dropped by the next whitespace.
    #[default]
    Lenient,
    /// Unknown bytes produce an error token and stop the scan.
    Strict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Dispatch,
    Math,
    Directive,
    Paren,
    Comment,
    Var,
    Text,
    File,
}

/// Result of decoding one codepoint at the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rune {
    Char(char),
    Eof,
    /// Invalid UTF-8 at the cursor. Sticky: the cursor does not move, so
    /// every later decode reports it again.
    Invalid,
}

pub fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || SYMBOLS.contains(c)
}

pub struct Scanner<'a> {
    input: &'a [u8],
    start: usize,
    pos: usize,
    width: usize,
    state: Option<State>,
    queue: VecDeque<Tok>,
    last_text: Option<String>,
    mode: ScanMode,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::from_bytes(src.as_bytes())
    }

    pub fn from_bytes(input: &'a [u8]) -> Self {
        Self {
            input,
            start: 0,
            pos: 0,
            width: 0,
            state: Some(State::Dispatch),
            queue: VecDeque::new(),
            last_text: None,
            mode: ScanMode::default(),
            done: false,
        }
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Start of the lexeme being built.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Next byte to be read.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes of the lexeme being built.
    pub fn current(&self) -> &'a [u8] {
        let input = self.input;
        &input[self.start..self.pos]
    }

    /// Pull the next token, running states until one is queued.
    pub fn next_tok(&mut self) -> Tok {
        loop {
            if let Some(tok) = self.queue.pop_front() {
                return tok;
            }
            match self.state {
                Some(state) => self.state = self.step(state),
                None => {
                    return Tok {
                        kind: TokKind::Eof,
                        span: Span::new(self.pos as u32, self.pos as u32),
                        text: String::new(),
                    }
                }
            }
        }
    }

    fn step(&mut self, state: State) -> Option<State> {
        match state {
            State::Dispatch => self.dispatch(),
            State::Math => self.math(),
            State::Directive => self.directive(),
            State::Paren => self.paren(),
            State::Comment => self.comment(),
            State::Var => self.var(),
            State::Text => self.text(),
            State::File => self.file(),
        }
    }

    // ---- primitives ----

    fn decode(&self) -> (Rune, usize) {
        let rest = &self.input[self.pos.min(self.input.len())..];
        let Some(&b) = rest.first() else {
            return (Rune::Eof, 0);
        };
        let len = match b {
            0x00..=0x7f => 1,
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return (Rune::Invalid, 0),
        };
        let Some(bytes) = rest.get(..len) else {
            return (Rune::Invalid, 0);
        };
        match std::str::from_utf8(bytes).ok().and_then(|s| s.chars().next()) {
            Some(c) => (Rune::Char(c), len),
            None => (Rune::Invalid, 0),
        }
    }

    /// Consume one codepoint. At end of input, or on invalid encoding, the
    /// cursor stays put and the width is zero.
    pub fn advance(&mut self) -> Rune {
        let (rune, width) = self.decode();
        self.width = width;
        self.pos += width;
        rune
    }

    /// Undo the most recent `advance`. Calling it twice in a row is not
    /// supported.
    pub fn backup(&mut self) {
        self.pos -= self.width;
        self.width = 0;
    }

    /// Decode the next codepoint without consuming it.
    pub fn peek(&self) -> Rune {
        self.decode().0
    }

    /// Whether the `/` just consumed starts a comment. A `//` right after
    /// `:` is a URL scheme separator, not a line comment.
    fn opens_comment(&self) -> bool {
        match self.peek() {
            Rune::Char('*') => true,
            Rune::Char('/') => self.pos < 2 || self.input[self.pos - 2] != b':',
            _ => false,
        }
    }

    /// Drop the pending lexeme.
    pub fn ignore(&mut self) {
        self.start = self.pos;
    }

    pub fn accept(&mut self, valid: &str) -> bool {
        self.accept_fn(|c| valid.contains(c))
    }

    pub fn accept_fn(&mut self, f: impl Fn(char) -> bool) -> bool {
        match self.decode() {
            (Rune::Char(c), width) if f(c) => {
                self.width = width;
                self.pos += width;
                true
            }
            _ => false,
        }
    }

    pub fn accept_range(&mut self, range: RangeInclusive<char>) -> bool {
        self.accept_fn(|c| range.contains(&c))
    }

    pub fn accept_run(&mut self, valid: &str) -> usize {
        let mut n = 0;
        while self.accept(valid) {
            n += 1;
        }
        n
    }

    pub fn accept_run_fn(&mut self, f: impl Fn(char) -> bool) -> usize {
        let mut n = 0;
        while self.accept_fn(&f) {
            n += 1;
        }
        n
    }

    pub fn accept_run_range(&mut self, range: RangeInclusive<char>) -> usize {
        let mut n = 0;
        while self.accept_range(range.clone()) {
            n += 1;
        }
        n
    }

    /// Consume `s` if the input continues with exactly those bytes.
    pub fn accept_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s.as_bytes()) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn emit(&mut self, kind: TokKind) {
        let text = String::from_utf8_lossy(self.current()).into_owned();
        trace!(?kind, offset = self.start, %text, "emit");
        self.queue.push_back(Tok {
            kind,
            span: Span::new(self.start as u32, self.pos as u32),
            text: text.clone(),
        });
        self.last_text = Some(text);
        self.start = self.pos;
    }

    fn errorf(&mut self, msg: String) -> Option<State> {
        self.queue.push_back(Tok {
            kind: TokKind::Error,
            span: Span::new(self.start as u32, self.pos as u32),
            text: msg,
        });
        None
    }

    // ---- states ----

    fn dispatch(&mut self) -> Option<State> {
        loop {
            match self.advance() {
                Rune::Eof => {
                    self.queue.push_back(Tok {
                        kind: TokKind::Eof,
                        span: Span::new(self.pos as u32, self.pos as u32),
                        text: String::new(),
                    });
                    return None;
                }
                Rune::Invalid => {
                    let at = self.pos;
                    return self.errorf(format!("invalid UTF-8 encoding at offset {at}"));
                }
                Rune::Char(c) if c.is_whitespace() => self.ignore(),
                Rune::Char(c) if STRUCTURAL.contains(c) => {
                    self.backup();
                    if self.pos > self.start {
                        self.emit(TokKind::Text);
                    }
                    return Some(State::Paren);
                }
                Rune::Char('/') if self.opens_comment() => {
                    // anything pending before the opener is dropped
                    self.start = self.pos - 1;
                    self.advance();
                    return Some(State::Comment);
                }
                Rune::Char('*' | '-' | '+' | '/') => {
                    self.backup();
                    return Some(State::Math);
                }
                Rune::Char('@') => {
                    self.backup();
                    return Some(State::Directive);
                }
                Rune::Char('"' | '\'') => return Some(State::File),
                Rune::Char('$') => {
                    self.backup();
                    return Some(State::Var);
                }
                Rune::Char(c) if is_allowed(c) => {
                    self.backup();
                    return Some(State::Text);
                }
                Rune::Char(c) => match self.mode {
                    ScanMode::Lenient => {}
                    ScanMode::Strict => {
                        let at = self.pos - c.len_utf8();
                        return self.errorf(format!("unexpected character {c:?} at offset {at}"));
                    }
                },
            }
        }
    }

    fn math(&mut self) -> Option<State> {
        if self.accept("*/") {
            self.emit(TokKind::Mul);
        } else if self.accept("+") {
            self.emit(TokKind::Plus);
        } else if self.accept("-") {
            self.emit(TokKind::Minus);
        }
        Some(State::Dispatch)
    }

    fn directive(&mut self) -> Option<State> {
        for &(keyword, kind) in DIRECTIVES {
            if self.accept_str(keyword) {
                self.emit(kind);
                return Some(State::Dispatch);
            }
        }
        // unknown at-rules scan as text
        self.accept("@");
        Some(State::Text)
    }

    fn paren(&mut self) -> Option<State> {
        if self.accept_str("#{") {
            self.emit(TokKind::Interp);
        } else if self.accept("(") {
            let image_arg = matches!(
                self.last_text.as_deref(),
                Some("image-width" | "image-height")
            );
            self.emit(TokKind::LParen);
            if self.accept("$") {
                self.accept_run_fn(is_allowed);
                self.emit(TokKind::VarUse);
                self.accept(", ");
                return Some(State::File);
            }
            if image_arg {
                return Some(State::File);
            }
        } else if self.accept(")") {
            self.emit(TokKind::RParen);
        } else if self.accept("{") {
            self.emit(TokKind::LBrace);
        } else if self.accept("}") {
            self.emit(TokKind::RBrace);
        } else if self.accept(":") {
            self.emit(TokKind::Colon);
        } else if self.accept(";") {
            self.emit(TokKind::Semicolon);
        } else {
            // `#` or `,`: stays pending
            self.advance();
        }
        Some(State::Dispatch)
    }

    fn comment(&mut self) -> Option<State> {
        if self.current() == b"/*" {
            let mut prev = None;
            loop {
                match self.advance() {
                    Rune::Char('/') if prev == Some('*') => break,
                    Rune::Char(c) => prev = Some(c),
                    Rune::Eof => {
                        warn!(offset = self.start, "unterminated block comment");
                        break;
                    }
                    Rune::Invalid => {
                        let at = self.pos;
                        return self.errorf(format!("invalid UTF-8 encoding at offset {at}"));
                    }
                }
            }
        } else {
            loop {
                match self.advance() {
                    Rune::Char(c) if !c.is_control() => {}
                    _ => {
                        self.backup();
                        break;
                    }
                }
            }
        }
        self.emit(TokKind::Comment);
        Some(State::Dispatch)
    }

    fn var(&mut self) -> Option<State> {
        self.accept("$");
        self.accept_run_fn(is_allowed);
        if self.peek() == Rune::Char(':') {
            self.emit(TokKind::VarDecl);
        } else {
            self.emit(TokKind::VarUse);
        }
        Some(State::Dispatch)
    }

    fn text(&mut self) -> Option<State> {
        // `background:sprite(...)`
        if self.current() == b":" {
            self.ignore();
        }
        let input = self.input;
        let rest = &input[self.pos..];
        let longest = COMMANDS
            .iter()
            .filter(|cmd| rest.starts_with(cmd.as_bytes()))
            .max_by_key(|cmd| cmd.len());
        if rest.starts_with(b"sprite-map") && longest.map_or(true, |cmd| cmd.len() <= 10) {
            self.accept_str("sprite-map");
            self.emit(TokKind::CmdVar);
            return Some(State::Dispatch);
        }
        if let Some(cmd) = longest {
            self.accept_str(cmd);
            self.emit(TokKind::Cmd);
            return Some(State::Dispatch);
        }
        // after every sprite-* name
        if self.accept_str("sprite") {
            self.emit(TokKind::Cmd);
            return Some(State::Dispatch);
        }
        if self.accept("-") {
            self.ignore();
            return Some(State::Text);
        }
        self.accept_run_fn(is_allowed);
        if self.pos > self.start {
            self.emit(TokKind::Text);
        }
        Some(State::Dispatch)
    }

    fn file(&mut self) -> Option<State> {
        self.accept_fn(char::is_whitespace);
        self.ignore();
        self.accept_run_fn(is_allowed);
        if self.pos > self.start {
            let kind = match std::str::from_utf8(self.current()) {
                Ok(s) if is_command(s) => TokKind::Cmd,
                _ => TokKind::File,
            };
            self.emit(kind);
        }
        Some(State::Dispatch)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Tok;

    /// Yields tokens up to and including the first end-of-stream token.
    fn next(&mut self) -> Option<Tok> {
        if self.done {
            return None;
        }
        let tok = self.next_tok();
        if tok.kind == TokKind::Eof {
            self.done = true;
        }
        Some(tok)
    }
}
