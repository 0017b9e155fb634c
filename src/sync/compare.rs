//! Row equivalence for deciding whether an update is needed.
//!
//! A stored row matches a freshly projected row when every schema position
//! holds an equivalent value. Cells beyond the projected length are foreign
//! columns and never take part in the comparison.

use crate::model::{Cell, Row, col};
use crate::sync::sanitize::ESCAPE_PREFIX;

/// Whether `stored` already holds everything `desired` would write.
#[must_use]
pub fn rows_equal(desired: &Row, stored: &Row) -> bool {
    desired.iter().enumerate().all(|(i, want)| {
        stored.get(i).is_some_and(|have| {
            cells_equal(want, have) || (is_date_column(i) && same_instant(want, have))
        })
    })
}

const fn is_date_column(i: usize) -> bool {
    i == col::START || i == col::END
}

/// Equivalence of a desired cell and a stored cell.
#[must_use]
pub fn cells_equal(desired: &Cell, stored: &Cell) -> bool {
    if desired == stored {
        return true;
    }

    match (desired, stored) {
        // Sheets do not distinguish an empty string from an empty cell.
        (Cell::Text(want), Cell::Empty) => want.is_empty(),
        // Auto-parsed timestamps come back as dates.
        (Cell::Text(want), Cell::Date(have)) => {
            Cell::text(want.as_str()).as_instant() == Some(*have)
        }
        (Cell::Text(want), Cell::Text(have)) => unescaped_matches(want, have),
        // An escaped value reads back without its quote; the remainder may
        // then have been typed by the sheet.
        (Cell::Text(want), other) => want
            .strip_prefix(ESCAPE_PREFIX)
            .is_some_and(|rest| rest == other.display()),
        _ => false,
    }
}

fn unescaped_matches(want: &str, have: &str) -> bool {
    want.strip_prefix(ESCAPE_PREFIX)
        .is_some_and(|rest| rest == have)
}

/// A different ISO rendering of the same instant, in a date column.
fn same_instant(want: &Cell, have: &Cell) -> bool {
    let want = match want {
        Cell::Text(_) => want.as_instant(),
        _ => None,
    };
    want.is_some() && want == have.as_instant()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    #[test]
    fn test_identical_rows_are_equal() {
        let r = row(&["e1", "Meeting", "2026-02-02T10:00:00.000Z"]);
        assert!(rows_equal(&r, &r.clone()));
    }

    #[test]
    fn test_any_mismatch_is_unequal() {
        let desired = row(&["e1", "Meeting A updated"]);
        let stored = row(&["e1", "Meeting A"]);
        assert!(!rows_equal(&desired, &stored));
    }

    #[test]
    fn test_trailing_foreign_columns_are_ignored() {
        let desired = row(&["e1", "Meeting"]);
        let stored = row(&["e1", "Meeting", "my notes", "follow up"]);
        assert!(rows_equal(&desired, &stored));
    }

    #[test]
    fn test_shorter_stored_row_is_unequal() {
        let desired = row(&["e1", "Meeting", ""]);
        let stored = row(&["e1", "Meeting"]);
        assert!(!rows_equal(&desired, &stored));
    }

    #[test]
    fn test_iso_string_matches_date_cell() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap();
        assert!(cells_equal(&Cell::text("2026-02-02T10:00:00.000Z"), &Cell::Date(dt)));
        assert!(!cells_equal(
            &Cell::text("2026-02-02T10:00:00.000Z"),
            &Cell::Date(dt + chrono::Duration::seconds(1))
        ));
    }

    #[test]
    fn test_iso_string_matches_other_rendering_in_date_columns() {
        let desired = row(&["e1", "Meeting", "2026-02-02T10:00:00.000Z", "2026-02-02T11:00:00.000Z"]);
        let stored = row(&["e1", "Meeting", "2026-02-02T11:00:00+01:00", "2026-02-02T11:00:00Z"]);
        assert!(rows_equal(&desired, &stored));
    }

    #[test]
    fn test_iso_rendering_change_in_text_column_is_unequal() {
        let desired = row(&["e1", "2026-02-02T10:00:00.000Z"]);
        let stored = row(&["e1", "2026-02-02T11:00:00+01:00"]);
        assert!(!rows_equal(&desired, &stored));
        assert!(!cells_equal(&desired[1], &stored[1]));
    }

    #[test]
    fn test_escaped_value_matches_unescaped_read() {
        assert!(cells_equal(&Cell::text("'=MALICIOUS()"), &Cell::text("=MALICIOUS()")));
        assert!(cells_equal(&Cell::text("'=MALICIOUS()"), &Cell::text("'=MALICIOUS()")));
        assert!(cells_equal(&Cell::text("'-5"), &Cell::Number(-5.0)));
        assert!(!cells_equal(&Cell::text("'=A()"), &Cell::text("=B()")));
    }

    #[test]
    fn test_empty_string_matches_empty_cell() {
        assert!(cells_equal(&Cell::text(""), &Cell::Empty));
        assert!(!cells_equal(&Cell::text("x"), &Cell::Empty));
    }

    #[test]
    fn test_plain_text_does_not_match_number() {
        assert!(!cells_equal(&Cell::text("5"), &Cell::Number(5.0)));
    }
}
