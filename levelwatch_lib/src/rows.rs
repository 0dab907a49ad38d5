//! Turning the rows of the schedule table into [`ClassRecord`]s.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Serialize;

use crate::dates::{normalize_date_text, parse_date_span_with_default, DateSpan};
use crate::error::PipelineError;
use crate::locate::{element_text, locate_table, LocateStrategy, CELLS, ROWS};

static SEATS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+seats?\s+left").unwrap());

/// One intake row of the schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRecord {
    /// Raw text of the status cell, e.g. `"6 seats left"` or `"FULL"`.
    pub status_text: String,
    /// Whitespace- and comma-normalized text of the date cell.
    pub date_text: String,
    #[serde(rename = "start_date_iso")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "end_date_iso")]
    pub end_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub seats_left: Option<u32>,
    pub is_full: bool,
}

impl ClassRecord {
    /// Builds a record from the two cell texts, using `span` for the dates.
    pub fn from_cells(status_text: &str, date_text: &str, span: DateSpan) -> Self {
        let status_text = status_text.trim().to_string();
        Self {
            seats_left: extract_seats(&status_text),
            is_full: is_full(&status_text),
            date_text: normalize_date_text(date_text),
            start_date: span.start,
            end_date: span.end,
            year: span.year,
            status_text,
        }
    }

    /// Seats are reported as open, either as a number or in words.
    pub fn shows_open_seats(&self) -> bool {
        self.seats_left.is_some() || self.status_text.to_lowercase().contains("seats left")
    }
}

/// Number in an `"N seats left"` / `"1 seat left"` phrase, if any.
pub fn extract_seats(status_text: &str) -> Option<u32> {
    SEATS_RE
        .captures(status_text)
        .and_then(|caps| caps[1].parse().ok())
}

/// `FULL` appears anywhere in the status, in any case.
pub fn is_full(status_text: &str) -> bool {
    status_text.to_uppercase().contains("FULL")
}

/// Parses every data row of `table`, skipping the header row and rows with
/// fewer than two cells. Date parts missing from a cell come from `today`.
pub fn parse_rows(table: ElementRef<'_>, today: NaiveDate) -> Vec<ClassRecord> {
    table
        .select(&ROWS)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&CELLS).collect();
            if cells.len() < 2 {
                return None;
            }
            let status_text = element_text(cells[0]);
            let date_text = element_text(cells[1]);
            let span = parse_date_span_with_default(&date_text, today);
            Some(ClassRecord::from_cells(&status_text, &date_text, span))
        })
        .collect()
}

/// Locates the table for `level` in `html` and parses its rows.
///
/// When no table is found the document is returned inside the error so the
/// caller can keep it for diagnostics.
pub fn parse_classes(
    html: &str,
    level: &str,
    strategies: &[LocateStrategy],
    today: NaiveDate,
) -> Result<Vec<ClassRecord>, PipelineError> {
    let document = Html::parse_document(html);
    let table = locate_table(&document, level, strategies).ok_or_else(|| {
        PipelineError::TableNotFound {
            level: level.to_string(),
            document: html.to_string(),
        }
    })?;
    Ok(parse_rows(table, today))
}
