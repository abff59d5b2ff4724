#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

//! Shared plumbing for the `sassy` binary: source loading, logging setup
//! and the compile pipeline with positioned error messages.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use sassy_compile::{Compiler, Mode, Options};
use sassy_parse::{ScanMode, Scanner, TokKind};
use serde::Serialize;
use tracing::debug;

/// Maximum source file size in bytes (1MB)
pub const MAX_SOURCE_SIZE: usize = 1_000_000;

/// Read a source file, refusing anything over [`MAX_SOURCE_SIZE`].
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    if bytes.len() > MAX_SOURCE_SIZE {
        bail!(
            "source file exceeds {}MB limit ({} bytes)",
            MAX_SOURCE_SIZE / 1_000_000,
            bytes.len()
        );
    }
    debug!(path = %path.display(), bytes = bytes.len(), "read source");
    Ok(bytes)
}

/// Source bytes as text, for the stages that need it.
pub fn source_text<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| {
        anyhow!(
            "'{}' is not valid UTF-8 (offset {})",
            path.display(),
            e.valid_up_to()
        )
    })
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// 1-based line and column of a byte offset.
pub fn line_col(src: &[u8], offset: usize) -> (usize, usize) {
    let upto = &src[..offset.min(src.len())];
    let line = upto.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = upto.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    let col = String::from_utf8_lossy(&upto[line_start..]).chars().count() + 1;
    (line, col)
}

/// Parse and compile `src`. Errors name the file and the line/column of
/// the offending node.
pub fn compile_source(file: &str, src: &str, strict: bool) -> Result<String> {
    let sheet = sassy_parse::parse_str(file, src)?;
    let mode = if strict { Mode::Strict } else { Mode::Lenient };
    let compiler = Compiler::new(Options { mode });
    compiler.compile(&sheet).map_err(|e| match e.span() {
        Some(span) => {
            let (line, col) = line_col(src.as_bytes(), span.start as usize);
            anyhow!("{}:{}:{}: {}", file, line, col, e)
        }
        None => anyhow!("{}: {}", file, e),
    })
}

/// One token as dumped by `sassy tokens`.
#[derive(Debug, Serialize)]
pub struct TokenRecord {
    pub kind: TokKind,
    pub text: String,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

/// Scan `bytes` to completion, positioning every token.
pub fn token_records(bytes: &[u8], mode: ScanMode) -> Vec<TokenRecord> {
    Scanner::from_bytes(bytes)
        .with_mode(mode)
        .map(|tok| {
            let offset = tok.offset();
            let (line, col) = line_col(bytes, offset);
            TokenRecord {
                kind: tok.kind,
                text: tok.text,
                offset,
                line,
                col,
            }
        })
        .collect()
}
