//! Parser configuration: delimiter, scanner mode and section handling.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Separator used to encode a hierarchical path inside a flat key.
///
/// Never empty. Defaults to `"."`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Delimiter(String);

impl Delimiter {
    pub fn new(delimiter: impl Into<String>) -> Result<Self, ConfigError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        Ok(Delimiter(delimiter))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter(".".to_string())
    }
}

impl TryFrom<String> for Delimiter {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Delimiter::new(value)
    }
}

impl FromStr for Delimiter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Delimiter::new(s)
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the tokenizer interprets unquoted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerMode {
    /// Quotes are processed; `true`/`on`/`yes` become `"1"` and
    /// `false`/`off`/`no`/`none`/`null` become `""`.
    #[default]
    Normal,

    /// Values are taken literally, apart from removing one pair of
    /// surrounding quotes.
    Raw,

    /// Like `Normal`, but keywords become booleans or null and integers
    /// become integers.
    Typed,
}

impl FromStr for ScannerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(ScannerMode::Normal),
            "raw" => Ok(ScannerMode::Raw),
            "typed" => Ok(ScannerMode::Typed),
            _ => Err(ConfigError::UnknownScannerMode(s.to_string())),
        }
    }
}

impl fmt::Display for ScannerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScannerMode::Normal => "normal",
            ScannerMode::Raw => "raw",
            ScannerMode::Typed => "typed",
        };
        f.write_str(name)
    }
}

/// Everything a single parse needs, in one deserializable value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Keep `[section]` headers as the top level of the tree.
    pub sections: bool,

    pub mode: ScannerMode,

    pub delimiter: Delimiter,
}

impl ParseOptions {
    pub fn with_sections(mut self, sections: bool) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_mode(mut self, mode: ScannerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }
}
