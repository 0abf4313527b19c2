//! Source-snippet rendering of parse errors.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use nested_ini::ParseError;
use std::io::IsTerminal;

/// Render `err` against the `text` it came from, as an ariadne report.
///
/// Colors are used only when stderr is a terminal.
pub fn render(err: &ParseError, name: &str, text: &str) -> String {
    render_with_color(err, name, text, std::io::stderr().is_terminal())
}

pub fn render_with_color(err: &ParseError, name: &str, text: &str, color: bool) -> String {
    let ParseError::Tokenize(tokenize_error) = err;
    let span = clamp(err.span(), text.len());

    let report = Report::build(ReportKind::Error, name.to_string(), span.start)
        .with_config(Config::default().with_color(color))
        .with_message(format!(
            "syntax error on line {}, column {}",
            tokenize_error.line, tokenize_error.column
        ))
        .with_label(
            Label::new((name.to_string(), span))
                .with_message(tokenize_error.kind.to_string())
                .with_color(Color::Red),
        )
        .finish();

    let mut output = Vec::new();
    if report
        .write((name.to_string(), Source::from(text)), &mut output)
        .is_err()
    {
        return format!("{}\n", err);
    }
    String::from_utf8(output).unwrap_or_else(|_| format!("{}\n", err))
}

/// Keep the span inside the text; an error at end of input still needs a
/// non-empty label.
fn clamp(span: std::ops::Range<usize>, len: usize) -> std::ops::Range<usize> {
    let start = span.start.min(len);
    let end = span.end.clamp(start, len);
    start..end
}
