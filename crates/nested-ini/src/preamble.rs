//! Removal of the PHP guard preamble.
//!
//! Configuration files are often stored with a `.php` extension and start
//! with a doc comment followed by `__halt_compiler();`, so a web server that
//! executes them instead of serving them as text reveals nothing:
//!
//! ```text
//! <?php
//! /**
//!  * Application settings.
//!  */
//! __halt_compiler(); ?>
//! [section]
//! key = value
//! ```
//!
//! Everything up to and including the halt call (and an optional closing
//! `?>` tag) is dropped before tokenizing.

use once_cell::sync::Lazy;
use regex::Regex;

static PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)\A<\?php\s*/\*\*.*__halt_compiler\(\);\s*(?:\?>\s*)?").unwrap()
});

/// Byte length of the preamble at the start of `text`, `0` when there is
/// none.
pub fn preamble_len(text: &str) -> usize {
    PREAMBLE.find(text).map_or(0, |m| m.end())
}

/// `text` without its leading preamble.
pub fn strip_preamble(text: &str) -> &str {
    &text[preamble_len(text)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_docblock_and_halt() {
        let text = "<?php\n/**\n * Settings.\n */\n__halt_compiler();\n[section]\nkey = 1\n";
        assert_eq!(strip_preamble(text), "[section]\nkey = 1\n");
    }

    #[test]
    fn test_strips_closing_tag() {
        let text = "<?php /** x */ __halt_compiler(); ?>\n\nkey = 1";
        assert_eq!(strip_preamble(text), "key = 1");
    }

    #[test]
    fn test_case_insensitive() {
        let text = "<?PHP\n/** doc */\n__HALT_COMPILER();key = 1";
        assert_eq!(strip_preamble(text), "key = 1");
    }

    #[test]
    fn test_without_preamble_unchanged() {
        let text = "; <?php die; __halt_compiler();\n[section]\n";
        assert_eq!(strip_preamble(text), text);
        assert_eq!(preamble_len("key = 1"), 0);
    }

    #[test]
    fn test_requires_docblock() {
        let text = "<?php /* plain comment */ __halt_compiler();\nkey = 1";
        assert_eq!(strip_preamble(text), text);
    }

    #[test]
    fn test_must_be_at_start() {
        let text = "\n<?php /** doc */ __halt_compiler();\nkey = 1";
        assert_eq!(strip_preamble(text), text);
    }
}
