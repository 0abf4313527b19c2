//! Output formats for a parsed tree.

use anyhow::Result;
use clap::ValueEnum;
use nested_ini::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// Indented key listing
    Tree,
}

/// Render `tree` in `format`, without a trailing newline.
pub fn format(tree: &Collection, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(tree)?,
        OutputFormat::Yaml => serde_yaml::to_string(tree)?,
        OutputFormat::Tree => tree.dump(),
    };
    Ok(rendered.trim_end().to_string())
}
