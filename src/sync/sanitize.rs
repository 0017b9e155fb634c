//! Formula-injection escaping for sheet values.
//!
//! Spreadsheets evaluate text starting with `=`, `+`, `-` or `@` as a formula,
//! even when preceded by whitespace or control characters. Prefixing a single
//! quote forces the value to be stored as literal text.

use std::borrow::Cow;

use crate::model::Cell;

/// Prefix that marks a value as literal text.
pub const ESCAPE_PREFIX: char = '\'';

const FORMULA_TRIGGERS: [char; 4] = ['=', '+', '-', '@'];

/// Escape a string if a spreadsheet would treat it as a formula.
#[must_use]
pub fn sanitize_str(value: &str) -> Cow<'_, str> {
    let stripped = value.trim_start_matches(|c: char| c <= '\u{20}');
    if stripped.starts_with(FORMULA_TRIGGERS) {
        Cow::Owned(format!("{ESCAPE_PREFIX}{value}"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Escape a cell; only text cells can carry formulas.
#[must_use]
pub fn sanitize(value: &Cell) -> Cell {
    match value {
        Cell::Text(s) => Cell::Text(sanitize_str(s).into_owned()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_formula_triggers() {
        for s in ["=SUM(A1)", "+1", "-1", "@cmd"] {
            let out = sanitize_str(s);
            assert!(out.starts_with('\''), "{s} should be escaped");
            assert_eq!(&out[1..], s);
        }
    }

    #[test]
    fn test_escapes_after_leading_control_chars() {
        for s in [" =1", "\t+1", "\n-1", "\u{0}@x", "\r\n =A1"] {
            let out = sanitize_str(s);
            assert_eq!(out, format!("'{s}"));
        }
    }

    #[test]
    fn test_leaves_plain_text_untouched() {
        for s in ["Meeting", "", "a=b", "  hello", "'=already", "\u{a0}=nbsp"] {
            assert!(matches!(sanitize_str(s), Cow::Borrowed(_)), "{s:?}");
            assert_eq!(sanitize_str(s), s);
        }
    }

    #[test]
    fn test_non_text_cells_pass_through() {
        assert_eq!(sanitize(&Cell::Number(-5.0)), Cell::Number(-5.0));
        assert_eq!(sanitize(&Cell::Empty), Cell::Empty);
        assert_eq!(sanitize(&Cell::text("=X")), Cell::text("'=X"));
    }
}
