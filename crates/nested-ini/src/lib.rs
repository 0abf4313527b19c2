//! INI parsing with nested keys and sections.
//!
//! Plain INI has one level of sections and flat keys. This crate reads keys
//! and section names containing a delimiter (`.` by default) as paths, and
//! builds one nested tree out of them:
//!
//! ```ini
//! [section]
//! subsection.arg.foo = "source foo"
//! subsection.array[] = "value 0"
//! subsection.array[] = "value 1"
//!
//! [section.subsection]
//! arg.foo = "overridden foo"
//! array.newKey = "new key"
//! ```
//!
//! parses (with sections enabled) to
//!
//! ```text
//! section:
//!   subsection:
//!     arg:
//!       foo: "overridden foo"
//!     array:
//!       0: "value 0"
//!       1: "value 1"
//!       newKey: "new key"
//! ```
//!
//! # Architecture
//!
//! - [`tokenize`]: flat INI text → [`Collection`] of raw keys
//! - [`expand`]: splits delimited keys and builds the nested tree, merging
//!   with [`merge`] where a path already holds a collection
//! - [`IniParser::parse`]: strips a PHP guard preamble, tokenizes, expands
//!
//! Later declarations win over earlier ones for scalar values; collections
//! declared at the same path are merged.

mod error;
mod expand;
mod merge;
mod node;
mod options;
mod parse;
mod preamble;
mod tokenizer;

pub use error::{ConfigError, ParseError, Result, TokenizeError, TokenizeErrorKind};

pub use node::{Collection, ConfigNode, Key, MAX_SERIALIZE_DEPTH, Scalar};

pub use options::{Delimiter, ParseOptions, ScannerMode};

pub use expand::{expand, expand_node};

pub use merge::{merge, merge_nodes};

pub use parse::{IniParser, parse, parse_with_options};

pub use preamble::{preamble_len, strip_preamble};

pub use tokenizer::tokenize;
