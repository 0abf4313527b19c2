//! Error types for INI parsing.

use std::ops::Range;
use thiserror::Error;

/// What went wrong while tokenizing a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeErrorKind {
    #[error("section header is missing its closing ']'")]
    UnterminatedSection,

    #[error("unexpected text after section header")]
    TrailingAfterSection,

    #[error("section name is empty")]
    EmptySectionName,

    #[error("quoted value is missing its closing quote")]
    UnterminatedQuote,

    #[error("unexpected text after quoted value")]
    TrailingAfterQuote,

    #[error("key is empty")]
    EmptyKey,

    #[error("key is missing its closing ']'")]
    UnterminatedKeyBracket,

    #[error("unexpected text after ']' in key")]
    TrailingAfterKeyBracket,

    #[error("key contains reserved character '{0}'")]
    InvalidKeyCharacter(char),
}

/// A tokenizer failure with its position in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error on line {line}, column {column}: {kind}")]
pub struct TokenizeError {
    pub kind: TokenizeErrorKind,

    /// 1-based line number.
    pub line: usize,

    /// 1-based column, counted in characters.
    pub column: usize,

    /// Byte range of the offending text in the tokenized input.
    pub span: Range<usize>,
}

/// Failure of a complete parse.
///
/// There is no partial result: a failed parse never yields a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}

impl ParseError {
    /// The source span the error points at, relative to the text passed to
    /// `parse` (after preamble stripping offsets are accounted for).
    pub fn span(&self) -> Range<usize> {
        match self {
            ParseError::Tokenize(err) => err.span.clone(),
        }
    }
}

/// Invalid parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("delimiter must not be empty")]
    EmptyDelimiter,

    #[error("unknown scanner mode '{0}' (expected normal, raw or typed)")]
    UnknownScannerMode(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
