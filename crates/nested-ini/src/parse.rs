//! Parse entry point: preamble, tokenizer, expansion.

use crate::error::{Result, TokenizeError};
use crate::expand::expand;
use crate::node::Collection;
use crate::options::{Delimiter, ParseOptions, ScannerMode};
use crate::preamble::preamble_len;
use crate::tokenizer::tokenize;

/// Parser for INI text with delimiter-expanded keys and section names.
///
/// The parser only holds the delimiter; every call to [`parse`](Self::parse)
/// works on a fresh tree, so one parser can be shared between threads.
///
/// ```rust
/// use nested_ini::{IniParser, ScannerMode};
///
/// let parser = IniParser::new();
/// let config = parser
///     .parse("[db.primary]\nhost = localhost\n", true, ScannerMode::Normal)
///     .unwrap();
/// assert_eq!(
///     config.get_path(&["db", "primary", "host"]).unwrap().as_str(),
///     Some("localhost")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniParser {
    delimiter: Delimiter,
}

impl IniParser {
    /// A parser splitting keys on `.`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(delimiter: Delimiter) -> Self {
        IniParser { delimiter }
    }

    /// Change the delimiter used by subsequent parses.
    pub fn set_delimiter(&mut self, delimiter: Delimiter) {
        self.delimiter = delimiter;
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    /// Parse `text` into a nested collection.
    ///
    /// A leading PHP guard preamble is ignored. With `sections` enabled the
    /// top level holds sections (and any entries before the first header);
    /// otherwise section headers are skipped. Tokenizer errors are returned
    /// with positions relative to `text`; no partial tree is produced.
    pub fn parse(&self, text: &str, sections: bool, mode: ScannerMode) -> Result<Collection> {
        let skip = preamble_len(text);
        if skip > 0 {
            tracing::debug!(bytes = skip, "stripped preamble");
        }

        let mut root = tokenize(&text[skip..], sections, mode)
            .map_err(|err| offset_error(err, &text[..skip]))?;
        expand(&mut root, &self.delimiter);
        Ok(root)
    }
}

/// Parse with every setting taken from `options`.
pub fn parse_with_options(text: &str, options: &ParseOptions) -> Result<Collection> {
    IniParser::with_delimiter(options.delimiter.clone()).parse(text, options.sections, options.mode)
}

/// Parse with the default `.` delimiter.
pub fn parse(text: &str, sections: bool, mode: ScannerMode) -> Result<Collection> {
    IniParser::new().parse(text, sections, mode)
}

/// Shift an error found after a stripped `prefix` back to positions in the
/// full text.
fn offset_error(mut err: TokenizeError, prefix: &str) -> TokenizeError {
    if prefix.is_empty() {
        return err;
    }
    let newlines = prefix.matches('\n').count()
        + prefix.matches('\r').count()
        - prefix.matches("\r\n").count();
    if err.line == 1 {
        let last_line_start = prefix.rfind(['\n', '\r']).map_or(0, |i| i + 1);
        err.column += prefix[last_line_start..].chars().count();
    }
    err.line += newlines;
    err.span = err.span.start + prefix.len()..err.span.end + prefix.len();
    err
}
