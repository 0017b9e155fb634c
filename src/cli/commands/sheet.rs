//! Sheet command implementations.

use colored::Colorize;
use serde::Serialize;

use crate::cli::SheetCommands;
use crate::cli::commands::{Paths, format_millis, open_storage};
use crate::error::{Error, Result};
use crate::model::Row;
use crate::storage::SqliteStorage;
use crate::sync::TabularStore;
use crate::{csv_escape, is_csv};

/// Widest column rendered in table output.
const MAX_COL_WIDTH: usize = 40;

#[derive(Serialize)]
struct SheetOutput<'a> {
    sheet: &'a str,
    total: usize,
    rows: Vec<Vec<String>>,
}

/// Execute sheet commands.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the sheet has no rows.
pub fn execute(command: &SheetCommands, paths: &Paths<'_>, json: bool) -> Result<()> {
    let storage = open_storage(paths)?;

    match command {
        SheetCommands::Show { name, limit } => show(&storage, name, *limit, json),
        SheetCommands::List => list(&storage, json),
    }
}

fn display_rows(rows: &[Row]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(crate::model::Cell::display).collect())
        .collect()
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn show(storage: &SqliteStorage, name: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let rows = storage.sheet(name).read_all()?;
    if rows.is_empty() {
        return Err(Error::SheetNotFound {
            name: name.to_string(),
        });
    }

    let total = rows.len();
    let shown = limit.map_or(total, |n| n.min(total));
    let cells = display_rows(&rows[..shown]);

    if is_csv() {
        for row in &cells {
            let line: Vec<String> = row.iter().map(|c| csv_escape(c)).collect();
            println!("{}", line.join(","));
        }
        return Ok(());
    }

    if json {
        let output = SheetOutput {
            sheet: name,
            total,
            rows: cells,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count().min(MAX_COL_WIDTH))
                .max()
                .unwrap_or(0)
        })
        .collect();

    for (position, row) in cells.iter().enumerate() {
        let line = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = truncate(row.get(i).map_or("", String::as_str), *width);
                format!("{cell:<width$}")
            })
            .collect::<Vec<_>>()
            .join("  ");
        if position == 0 {
            println!("{}", line.bold());
        } else {
            println!("{line}");
        }
    }

    if shown < total {
        println!("{}", format!("... {} more row(s)", total - shown).dimmed());
    }
    Ok(())
}

fn list(storage: &SqliteStorage, json: bool) -> Result<()> {
    let sheets = storage.list_sheets()?;

    if is_csv() {
        println!("name,rows,updated_at");
        for sheet in &sheets {
            println!(
                "{},{},{}",
                csv_escape(&sheet.name),
                sheet.rows,
                sheet.updated_at.map(format_millis).unwrap_or_default()
            );
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&sheets)?);
        return Ok(());
    }

    if sheets.is_empty() {
        println!("No sheets yet. Run `calsheet sync` to create them.");
        return Ok(());
    }

    for sheet in &sheets {
        let updated = sheet
            .updated_at
            .map(format_millis)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {} row(s)  {}",
            sheet.name.bold(),
            sheet.rows,
            format!("updated {updated}").dimmed()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, header_row};

    #[test]
    fn test_show_unknown_sheet() {
        let storage = SqliteStorage::open_memory().unwrap();
        assert!(matches!(
            show(&storage, "Nope", None, true),
            Err(Error::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_show_existing_sheet() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut sheet = storage.sheet("Work");
        sheet.append_row(&header_row()).unwrap();
        sheet
            .append_row(&vec![Cell::text("e1"), Cell::Number(3.0), Cell::Bool(true)])
            .unwrap();

        assert!(show(&storage, "Work", Some(1), false).is_ok());
        assert!(list(&storage, true).is_ok());
    }

    #[test]
    fn test_display_rows_renders_every_cell_type() {
        let rows = vec![vec![Cell::Empty, Cell::Number(2.0), Cell::text("x")]];
        assert_eq!(display_rows(&rows), vec![vec!["", "2", "x"]]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
