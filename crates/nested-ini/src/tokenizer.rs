//! Baseline INI tokenizer.
//!
//! Produces the flat input the expander works on: a collection of sections
//! (or a single flat collection when sections are disabled) holding raw keys,
//! with `key[]` appends and `key[sub]` entries already grouped into
//! collections. Keys are kept verbatim, delimiters included.
//!
//! Supported syntax:
//!
//! ```ini
//! ; comment
//! # comment
//! global = value          ; trailing comment
//!
//! [section]
//! plain = unquoted value
//! double = "escapes \" and \\"
//! single = 'taken literally'
//! list[] = first
//! list[] = second
//! map[name] = value
//! bare
//! ```

use crate::error::{TokenizeError, TokenizeErrorKind};
use crate::node::{parse_canonical_integer, Collection, Key, Scalar};
use crate::options::ScannerMode;
use std::ops::Range;

/// Characters a key may not contain.
const RESERVED_KEY_CHARS: &[char] = &['?', '{', '}', '|', '&', '~', '!', '(', ')', '^', '"'];

/// Tokenize INI `text`.
///
/// With `sections` enabled the result maps section names to collections of
/// entries; entries before the first header sit at the top level. With
/// `sections` disabled, headers are skipped and every entry lands in one
/// collection.
pub fn tokenize(text: &str, sections: bool, mode: ScannerMode) -> Result<Collection, TokenizeError> {
    let mut tokenizer = Tokenizer {
        root: Collection::new(),
        section: None,
        sections,
        mode,
    };

    let mut line_count = 0;
    for line in lines(text) {
        line_count = line.number;
        tokenizer.line(&line)?;
    }

    tracing::debug!(
        lines = line_count,
        entries = tokenizer.root.len(),
        sections,
        mode = %mode,
        "tokenized ini input"
    );
    Ok(tokenizer.root)
}

/// A line of input and where it starts.
struct Line<'a> {
    /// 1-based line number.
    number: usize,

    /// Byte offset of the line in the tokenized text.
    offset: usize,

    text: &'a str,
}

impl Line<'_> {
    /// Build an error covering `range` (byte offsets within the line).
    fn error(&self, kind: TokenizeErrorKind, range: Range<usize>) -> TokenizeError {
        TokenizeError {
            kind,
            line: self.number,
            column: self.text[..range.start].chars().count() + 1,
            span: self.offset + range.start..self.offset + range.end,
        }
    }
}

/// Split on `\n`, `\r\n` or `\r`, keeping byte offsets.
fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    let mut number = 0;
    std::iter::from_fn(move || {
        if offset >= text.len() {
            return None;
        }
        let rest = &text[offset..];
        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        let terminator = if rest[end..].starts_with("\r\n") {
            2
        } else if end < rest.len() {
            1
        } else {
            0
        };
        number += 1;
        let line = Line {
            number,
            offset,
            text: &rest[..end],
        };
        offset += end + terminator;
        Some(line)
    })
}

/// How an entry's key addresses its value.
#[derive(Debug, PartialEq)]
enum Target {
    /// `key = value`
    Plain,
    /// `key[] = value`
    Append,
    /// `key[sub] = value`
    Entry(Key),
}

struct Tokenizer {
    root: Collection,
    section: Option<Key>,
    sections: bool,
    mode: ScannerMode,
}

impl Tokenizer {
    fn line(&mut self, line: &Line<'_>) -> Result<(), TokenizeError> {
        let content = line.text.trim_start();
        let start = line.text.len() - content.len();

        if content.is_empty() || content.starts_with(';') || content.starts_with('#') {
            return Ok(());
        }
        if content.starts_with('[') {
            return self.section_header(line, start);
        }
        self.entry(line, start)
    }

    fn section_header(&mut self, line: &Line<'_>, start: usize) -> Result<(), TokenizeError> {
        let text = line.text;
        let Some(close) = text[start..].find(']').map(|i| start + i) else {
            return Err(line.error(TokenizeErrorKind::UnterminatedSection, start..text.len()));
        };
        if !is_blank_or_comment(&text[close + 1..]) {
            return Err(line.error(
                TokenizeErrorKind::TrailingAfterSection,
                close + 1..text.trim_end().len().max(close + 1),
            ));
        }
        let name = text[start + 1..close].trim();
        if name.is_empty() {
            return Err(line.error(TokenizeErrorKind::EmptySectionName, start..close + 1));
        }

        tracing::trace!(line = line.number, section = name, "section header");
        if self.sections {
            let key = Key::parse(name);
            self.root.child_collection_mut(key.clone());
            self.section = Some(key);
        }
        Ok(())
    }

    fn entry(&mut self, line: &Line<'_>, start: usize) -> Result<(), TokenizeError> {
        let text = line.text;
        // A `;` before any `=` comments out the rest of the line.
        let (key_range, value) = match text[start..].find(['=', ';']).map(|i| start + i) {
            Some(eq) if text[eq..].starts_with('=') => {
                let value = parse_value(line, eq + 1, self.mode)?;
                (start..eq, value)
            }
            comment => {
                let end = comment.unwrap_or(text.len());
                let value = match self.mode {
                    ScannerMode::Typed => Scalar::Null,
                    ScannerMode::Normal | ScannerMode::Raw => Scalar::String(String::new()),
                };
                (start..end, value)
            }
        };
        let (name, target) = parse_key(line, key_range)?;

        let collection = match (&self.section, self.sections) {
            (Some(section), true) => self.root.child_collection_mut(section.clone()),
            _ => &mut self.root,
        };
        match target {
            Target::Plain => {
                collection.insert(name, value);
            }
            Target::Append => {
                collection.child_collection_mut(name).push(value);
            }
            Target::Entry(sub) => {
                collection.child_collection_mut(name).insert(sub, value);
            }
        }
        Ok(())
    }
}

/// Parse the key part of an entry: `name`, `name[]` or `name[sub]`.
fn parse_key(line: &Line<'_>, range: Range<usize>) -> Result<(Key, Target), TokenizeError> {
    let raw = &line.text[range.clone()];
    let (name_end, target) = match raw.find('[') {
        None => (raw.len(), Target::Plain),
        Some(open) => {
            let Some(close) = raw[open..].find(']').map(|i| open + i) else {
                return Err(line.error(
                    TokenizeErrorKind::UnterminatedKeyBracket,
                    range.start + open..range.start + raw.trim_end().len(),
                ));
            };
            let trailing = raw[close + 1..].trim();
            if !trailing.is_empty() {
                let trailing_start = raw[close + 1..].find(trailing).map_or(close + 1, |i| close + 1 + i);
                return Err(line.error(
                    TokenizeErrorKind::TrailingAfterKeyBracket,
                    range.start + trailing_start..range.start + trailing_start + trailing.len(),
                ));
            }
            let sub = raw[open + 1..close].trim();
            let target = if sub.is_empty() {
                Target::Append
            } else {
                Target::Entry(Key::parse(sub))
            };
            (open, target)
        }
    };

    let name = raw[..name_end].trim();
    if name.is_empty() {
        return Err(line.error(
            TokenizeErrorKind::EmptyKey,
            range.start..range.end.max(range.start + 1).min(line.text.len()),
        ));
    }
    if let Some((i, c)) = raw[..name_end].char_indices().find(|(_, c)| RESERVED_KEY_CHARS.contains(c)) {
        return Err(line.error(
            TokenizeErrorKind::InvalidKeyCharacter(c),
            range.start + i..range.start + i + c.len_utf8(),
        ));
    }
    Ok((Key::parse(name), target))
}

/// Parse the value starting at byte `start` of the line (just after `=`).
fn parse_value(line: &Line<'_>, start: usize, mode: ScannerMode) -> Result<Scalar, TokenizeError> {
    let text = line.text;
    let rest = &text[start..];
    let value_start = start + (rest.len() - rest.trim_start().len());
    let rest = &text[value_start..];

    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'');
    if let Some(quote) = quote {
        let (value, close) = match (mode, quote) {
            (ScannerMode::Raw, _) | (_, '\'') => literal_quoted(rest, quote),
            _ => escaped_quoted(rest),
        }
        .ok_or_else(|| line.error(TokenizeErrorKind::UnterminatedQuote, value_start..text.len()))?;

        let after = value_start + close + 1;
        if !is_blank_or_comment(&text[after..]) {
            let end = text.trim_end().len().max(after);
            return Err(line.error(TokenizeErrorKind::TrailingAfterQuote, after..end));
        }
        return Ok(Scalar::String(value));
    }

    let end = rest.find(';').unwrap_or(rest.len());
    let unquoted = rest[..end].trim_end();
    Ok(convert_unquoted(unquoted, mode))
}

/// Read a quoted value without escape processing. Returns the value and the
/// byte index of the closing quote within `rest`.
fn literal_quoted(rest: &str, quote: char) -> Option<(String, usize)> {
    let close = rest[1..].find(quote)? + 1;
    Some((rest[1..close].to_string(), close))
}

/// Read a double-quoted value, unescaping `\"` and `\\`.
fn escaped_quoted(rest: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, i)),
            '\\' => match chars.next() {
                Some((_, next @ ('"' | '\\'))) => value.push(next),
                Some((_, next)) => {
                    value.push('\\');
                    value.push(next);
                }
                None => value.push('\\'),
            },
            _ => value.push(c),
        }
    }
    None
}

fn convert_unquoted(value: &str, mode: ScannerMode) -> Scalar {
    if mode == ScannerMode::Raw {
        return Scalar::String(value.to_string());
    }
    let keyword = value.to_ascii_lowercase();
    match (mode, keyword.as_str()) {
        (ScannerMode::Typed, "true" | "on" | "yes") => Scalar::Boolean(true),
        (ScannerMode::Typed, "false" | "off" | "no" | "none") => Scalar::Boolean(false),
        (ScannerMode::Typed, "null") => Scalar::Null,
        (ScannerMode::Typed, _) => match parse_canonical_integer(value) {
            Some(integer) => Scalar::Integer(integer),
            None => Scalar::String(value.to_string()),
        },
        (_, "true" | "on" | "yes") => Scalar::String("1".to_string()),
        (_, "false" | "off" | "no" | "none" | "null") => Scalar::String(String::new()),
        _ => Scalar::String(value.to_string()),
    }
}

fn is_blank_or_comment(text: &str) -> bool {
    let text = text.trim_start();
    text.is_empty() || text.starts_with(';')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal(text: &str) -> Collection {
        tokenize(text, true, ScannerMode::Normal).unwrap()
    }

    fn error(text: &str) -> TokenizeError {
        tokenize(text, true, ScannerMode::Normal).unwrap_err()
    }

    #[test]
    fn test_sections_and_global_keys() {
        let result = normal("global = 1\n[first]\na = x\n[second]\nb = y\n");
        insta::assert_snapshot!(result.dump(), @r#"
        global: "1"
        first:
          a: "x"
        second:
          b: "y"
        "#);
    }

    #[test]
    fn test_without_sections_entries_are_flat() {
        let result = tokenize("[first]\na = x\n[second]\na = y\nb = z\n", false, ScannerMode::Normal).unwrap();
        insta::assert_snapshot!(result.dump(), @r#"
        a: "y"
        b: "z"
        "#);
    }

    #[test]
    fn test_delimited_keys_are_kept_verbatim() {
        let result = normal("[a.b]\nc.d = 1\n");
        assert!(result.get_str("a.b").is_some());
        assert_eq!(result.get_path(&["a.b", "c.d"]).unwrap().as_str(), Some("1"));
    }

    #[test]
    fn test_reopened_section_continues() {
        let result = normal("[s]\na = 1\n[t]\n[s]\nb = 2\n");
        let s = result.get_str("s").unwrap().as_collection().unwrap();
        assert_eq!(s.len(), 2);
        assert!(result.get_str("t").unwrap().as_collection().unwrap().is_empty());
    }

    #[test]
    fn test_arrays_and_entries() {
        let result = normal("[s]\nlist[] = a\nlist[] = b\nmap[x] = 1\nmap[ 7 ] = 2\n");
        insta::assert_snapshot!(result.dump(), @r#"
        s:
          list:
            0: "a"
            1: "b"
          map:
            x: "1"
            7: "2"
        "#);
        let map = result.get_path(&["s", "map"]).unwrap().as_collection().unwrap();
        assert!(map.contains_key(&Key::Index(7)));
    }

    #[test]
    fn test_append_over_scalar_replaces_it() {
        let result = normal("a = scalar\na[] = item\n");
        assert_eq!(result.get_path(&["a", "0"]).unwrap().as_str(), Some("item"));
    }

    #[test]
    fn test_append_after_max_index_keeps_existing_value() {
        let result = normal("a[9223372036854775807] = first\na[] = second\n");
        let a = result.get_str("a").unwrap().as_collection().unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(&Key::Index(i64::MAX)).unwrap().as_str(), Some("first"));
    }

    #[test]
    fn test_quoting() {
        let result = normal(concat!(
            "double = \"a \\\"quoted\\\" \\\\ value ; not a comment\"\n",
            "literal = 'no \\n escapes'\n",
            "padded =    spaced out   ; comment\n",
            "empty =\n",
        ));
        assert_eq!(
            result.get_str("double").unwrap().as_str(),
            Some("a \"quoted\" \\ value ; not a comment")
        );
        assert_eq!(result.get_str("literal").unwrap().as_str(), Some("no \\n escapes"));
        assert_eq!(result.get_str("padded").unwrap().as_str(), Some("spaced out"));
        assert_eq!(result.get_str("empty").unwrap().as_str(), Some(""));
    }

    #[test]
    fn test_normal_mode_keywords() {
        let result = normal("a = yes\nb = On\nc = false\nd = none\ne = null\nf = \"true\"\ng = 42\n");
        assert_eq!(result.get_str("a").unwrap().as_str(), Some("1"));
        assert_eq!(result.get_str("b").unwrap().as_str(), Some("1"));
        assert_eq!(result.get_str("c").unwrap().as_str(), Some(""));
        assert_eq!(result.get_str("d").unwrap().as_str(), Some(""));
        assert_eq!(result.get_str("e").unwrap().as_str(), Some(""));
        assert_eq!(result.get_str("f").unwrap().as_str(), Some("true"));
        assert_eq!(result.get_str("g").unwrap().as_str(), Some("42"));
    }

    #[test]
    fn test_raw_mode() {
        let result = tokenize(
            "a = yes\nb = \"a\\\\b\"\nc = 'single'\nd = 42\n",
            false,
            ScannerMode::Raw,
        )
        .unwrap();
        assert_eq!(result.get_str("a").unwrap().as_str(), Some("yes"));
        assert_eq!(result.get_str("b").unwrap().as_str(), Some("a\\\\b"));
        assert_eq!(result.get_str("c").unwrap().as_str(), Some("single"));
        assert_eq!(result.get_str("d").unwrap().as_str(), Some("42"));
    }

    #[test]
    fn test_typed_mode() {
        let result = tokenize(
            "a = yes\nb = off\nc = null\nd = 42\ne = -7\nf = 007\ng = \"42\"\nh = 1.5\nbare\n",
            false,
            ScannerMode::Typed,
        )
        .unwrap();
        assert_eq!(result.get_str("a").unwrap().as_scalar(), Some(&Scalar::Boolean(true)));
        assert_eq!(result.get_str("b").unwrap().as_scalar(), Some(&Scalar::Boolean(false)));
        assert_eq!(result.get_str("c").unwrap().as_scalar(), Some(&Scalar::Null));
        assert_eq!(result.get_str("d").unwrap().as_scalar(), Some(&Scalar::Integer(42)));
        assert_eq!(result.get_str("e").unwrap().as_scalar(), Some(&Scalar::Integer(-7)));
        assert_eq!(result.get_str("f").unwrap().as_str(), Some("007"));
        assert_eq!(result.get_str("g").unwrap().as_str(), Some("42"));
        assert_eq!(result.get_str("h").unwrap().as_str(), Some("1.5"));
        assert_eq!(result.get_str("bare").unwrap().as_scalar(), Some(&Scalar::Null));
    }

    #[test]
    fn test_comments_and_line_endings() {
        let result = normal("; leading\r\n# hash\r\n[s]\r\na = 1\rb = 2\n\n");
        assert_eq!(result.get_path(&["s", "a"]).unwrap().as_str(), Some("1"));
        assert_eq!(result.get_path(&["s", "b"]).unwrap().as_str(), Some("2"));
    }

    #[test]
    fn test_bare_key() {
        let result = normal("flag\nother ; comment\n");
        assert_eq!(result.get_str("flag").unwrap().as_str(), Some(""));
        assert_eq!(result.get_str("other").unwrap().as_str(), Some(""));
    }

    #[test]
    fn test_comment_before_equals_ends_key() {
        let result = tokenize("foo ; note = x\nbar = y ; note = z\n", false, ScannerMode::Normal).unwrap();
        insta::assert_snapshot!(result.dump(), @r#"
        foo: ""
        bar: "y"
        "#);
    }

    #[test]
    fn test_empty_input() {
        assert!(normal("").is_empty());
        assert!(normal("\n; only comments\n").is_empty());
    }

    #[test]
    fn test_unterminated_section() {
        let err = error("a = 1\n[section\n");
        assert_eq!(err.kind, TokenizeErrorKind::UnterminatedSection);
        assert_eq!((err.line, err.column), (2, 1));
        assert_eq!(err.span, 6..14);
    }

    #[test]
    fn test_trailing_after_section() {
        let err = error("[section] junk\n");
        assert_eq!(err.kind, TokenizeErrorKind::TrailingAfterSection);
        assert_eq!(err.column, 10);
        assert!(normal("[section] ; fine\n").get_str("section").is_some());
    }

    #[test]
    fn test_empty_section_name() {
        assert_eq!(error("[  ]\n").kind, TokenizeErrorKind::EmptySectionName);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = error("[s]\nkey = \"open\n");
        assert_eq!(err.kind, TokenizeErrorKind::UnterminatedQuote);
        assert_eq!((err.line, err.column), (2, 7));
        assert_eq!(err.span, 10..15);
    }

    #[test]
    fn test_trailing_after_quote() {
        let err = error("key = \"a\" b\n");
        assert_eq!(err.kind, TokenizeErrorKind::TrailingAfterQuote);
        assert_eq!(err.column, 10);
    }

    #[test]
    fn test_key_errors() {
        assert_eq!(error("= value\n").kind, TokenizeErrorKind::EmptyKey);
        assert_eq!(error("key[ = value\n").kind, TokenizeErrorKind::UnterminatedKeyBracket);
        assert_eq!(error("key[a]b = value\n").kind, TokenizeErrorKind::TrailingAfterKeyBracket);

        let err = error("ke!y = value\n");
        assert_eq!(err.kind, TokenizeErrorKind::InvalidKeyCharacter('!'));
        assert_eq!(err.column, 3);
    }

    #[test]
    fn test_error_column_counts_characters() {
        let err = error("ключ = \"open\n");
        assert_eq!(err.column, 8);
    }
}
