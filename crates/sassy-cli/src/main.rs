use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sassy_cli::{compile_source, init_logging, read_source, source_text, token_records};
use sassy_parse::ScanMode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sassy")]
#[command(about = "sassy: compile nested stylesheets to flat CSS")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a stylesheet to CSS
    Compile {
        /// Path to the source stylesheet
        file: PathBuf,

        /// Write CSS here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reject calls to unknown functions
        #[arg(long)]
        strict: bool,
    },

    /// Dump the token stream
    Tokens {
        /// Path to the source stylesheet
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,

        /// Stop at the first byte no scan state recognizes
        #[arg(long)]
        strict: bool,
    },

    /// Parse a stylesheet and dump the AST
    Parse {
        /// Path to the source stylesheet
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            file,
            output,
            strict,
        } => cmd_compile(&file, output.as_deref(), strict),
        Commands::Tokens {
            file,
            format,
            strict,
        } => cmd_tokens(&file, format, strict),
        Commands::Parse { file, format } => cmd_parse(&file, format),
    }
}

fn cmd_compile(file: &Path, output: Option<&Path>, strict: bool) -> Result<()> {
    let bytes = read_source(file)?;
    let src = source_text(file, &bytes)?;
    let css = compile_source(&file.display().to_string(), src, strict)?;

    match output {
        Some(out) => {
            std::fs::write(out, &css)
                .with_context(|| format!("failed to write '{}'", out.display()))?;
            info!(path = %out.display(), bytes = css.len(), "wrote css");
        }
        None => print!("{}", css),
    }
    Ok(())
}

fn cmd_tokens(file: &Path, format: Format, strict: bool) -> Result<()> {
    let bytes = read_source(file)?;
    let mode = if strict {
        ScanMode::Strict
    } else {
        ScanMode::Lenient
    };
    let records = token_records(&bytes, mode);

    match format {
        Format::Pretty => {
            for r in &records {
                println!("{}:{}\t{:?}\t{:?}", r.line, r.col, r.kind, r.text);
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

fn cmd_parse(file: &Path, format: Format) -> Result<()> {
    let bytes = read_source(file)?;
    let src = source_text(file, &bytes)?;
    let sheet = sassy_parse::parse_str(&file.display().to_string(), src)?;

    match format {
        Format::Pretty => println!("{:#?}", sheet),
        Format::Json => println!("{}", serde_json::to_string_pretty(&sheet)?),
    }
    Ok(())
}
