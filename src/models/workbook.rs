//! Tabular (spreadsheet) input submitted as JSON.
//!
//! The client converts the uploaded file into an ordered map of sheet name to
//! row objects keyed by the header cell, e.g.
//! `{"sheets": {"Ausleihen": [{"student_id": 4711, "book_barcode": "buch-12", "due_date": "2025-03-01"}]}}`.
//! Cells arrive as strings or numbers; everything here normalizes them.

use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::{lending::LendingImportRow, reconciliation::RosterEntry};
use crate::error::{AppError, AppResult};

/// Sheet that holds lendings to import
pub const LENDING_SHEET: &str = "Ausleihen";

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct Workbook {
    #[schema(value_type = Object)]
    pub sheets: IndexMap<String, Vec<Row>>,
}

impl Workbook {
    /// Rows of the first sheet; roster files carry a single sheet
    pub fn first_sheet(&self) -> AppResult<&[Row]> {
        let (name, rows) = self
            .sheets
            .first()
            .ok_or_else(|| AppError::Validation("The file contains no sheet".to_string()))?;
        non_empty(name, rows)
    }

    /// Rows of a sheet looked up by its exact name
    pub fn sheet(&self, name: &str) -> AppResult<&[Row]> {
        let rows = self.sheets.get(name).ok_or_else(|| {
            AppError::Validation(format!("Sheet '{}' was not found in the file", name))
        })?;
        non_empty(name, rows)
    }
}

fn non_empty<'a>(name: &str, rows: &'a [Row]) -> AppResult<&'a [Row]> {
    if rows.is_empty() {
        return Err(AppError::Validation(format!("Sheet '{}' contains no data", name)));
    }
    Ok(rows)
}

/// Spreadsheet row number of the n-th data row (the header is row 1)
fn sheet_row(index: usize) -> usize {
    index + 2
}

/// Cell as trimmed text. Integral numbers lose their fraction (`4711.0` → `4711`).
pub fn cell_text(row: &Row, key: &str) -> Option<String> {
    let text = match row.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn required_text(row: &Row, key: &str, index: usize) -> AppResult<String> {
    cell_text(row, key).ok_or_else(|| {
        AppError::Validation(format!(
            "Row {}: column '{}' is missing or empty",
            sheet_row(index),
            key
        ))
    })
}

/// Date cell: ISO (`2025-03-01`), German (`01.03.2025`) or a spreadsheet
/// serial day number.
pub fn cell_date(row: &Row, key: &str, index: usize) -> AppResult<NaiveDate> {
    let invalid = || {
        AppError::Validation(format!(
            "Row {}: column '{}' is not a valid date",
            sheet_row(index),
            key
        ))
    };

    match row.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|serial| *serial >= 1.0)
            .and_then(serial_to_date)
            .ok_or_else(invalid),
        Some(Value::String(s)) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(s, "%d.%m.%Y"))
                .map_err(|_| invalid())
        }
        _ => Err(AppError::Validation(format!(
            "Row {}: column '{}' is missing or empty",
            sheet_row(index),
            key
        ))),
    }
}

/// Spreadsheet serial dates count days from 1899-12-30
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Roster rows with the `id`, `name`, `class` columns
pub fn roster_entries(rows: &[Row]) -> AppResult<Vec<RosterEntry>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            Ok(RosterEntry {
                id: required_text(row, "id", index)?,
                name: required_text(row, "name", index)?,
                class: required_text(row, "class", index)?,
            })
        })
        .collect()
}

/// Lending rows with the `student_id`, `book_barcode`, `due_date` columns
pub fn lending_rows(rows: &[Row]) -> AppResult<Vec<LendingImportRow>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            Ok(LendingImportRow {
                row: sheet_row(index),
                student_id: required_text(row, "student_id", index)?,
                book_barcode: required_text(row, "book_barcode", index)?,
                due_date: cell_date(row, "due_date", index)?,
            })
        })
        .collect()
}
