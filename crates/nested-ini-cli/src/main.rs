//! nested-ini CLI - parse an INI file and print the nested tree

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use nested_ini::{Delimiter, ParseOptions, ScannerMode, parse_with_options};
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod diagnostic;
mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "nested-ini")]
#[command(version)]
#[command(about = "Parse INI files with nested keys and sections", long_about = None)]
struct Cli {
    /// Input file ('-' or omitted reads stdin)
    input: Option<PathBuf>,

    /// Treat [section] headers as the top level of the tree
    #[arg(short, long)]
    sections: bool,

    /// Separator between path segments in keys and section names
    #[arg(short, long, default_value = ".")]
    delimiter: Delimiter,

    /// How unquoted values are interpreted (normal, raw, typed)
    #[arg(short, long, default_value = "normal")]
    mode: ScannerMode,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "nested_ini=warn",
        1 => "nested_ini=debug",
        _ => "nested_ini=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (name, text) = read_input(cli.input.as_deref())?;
    debug!(input = %name, bytes = text.len(), "read input");

    let options = ParseOptions::default()
        .with_sections(cli.sections)
        .with_mode(cli.mode)
        .with_delimiter(cli.delimiter);

    let tree = match parse_with_options(&text, &options) {
        Ok(tree) => tree,
        Err(err) => {
            // The report carries its own "Error:" prefix; print it directly.
            eprint!("{}", diagnostic::render(&err, &name, &text));
            std::process::exit(1);
        }
    };
    info!(entries = tree.len(), "parsed");

    println!("{}", output::format(&tree, cli.format)?);
    Ok(())
}

/// Read the whole input, returning a display name and the text.
fn read_input(path: Option<&std::path::Path>) -> Result<(String, String)> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((path.display().to_string(), text))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(("<stdin>".to_string(), text))
        }
    }
}
