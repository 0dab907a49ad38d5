//! Finding the schedule table inside an arbitrary HTML document.
//!
//! The page layout is not under our control, so the table is located by an
//! ordered list of strategies. The first strategy that yields a table wins.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static HEADINGS_AND_TABLES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3, h4, table").unwrap());
static TABLES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
pub(crate) static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
pub(crate) static CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").unwrap());

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2}(?:,?\s*\d{4})?\b")
        .unwrap()
});

/// One way of picking the schedule table out of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    /// First table after the first `h2`-`h4` heading mentioning the level.
    Heading,
    /// First table whose text contains a `"Jan 05"`-style date.
    DateShaped,
    /// First table with at least two rows of two or more cells.
    Salvage,
}

impl LocateStrategy {
    /// Heading match, then the date-shaped fallback.
    pub const DEFAULT: &'static [LocateStrategy] =
        &[LocateStrategy::Heading, LocateStrategy::DateShaped];

    /// [`Self::DEFAULT`] followed by the structural salvage pass.
    pub const WITH_SALVAGE: &'static [LocateStrategy] = &[
        LocateStrategy::Heading,
        LocateStrategy::DateShaped,
        LocateStrategy::Salvage,
    ];

    pub fn apply<'a>(self, document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
        match self {
            Self::Heading => table_after_heading(document, label),
            Self::DateShaped => first_date_shaped_table(document),
            Self::Salvage => first_tabular_table(document),
        }
    }
}

/// Tries each strategy in order and returns the first table found.
pub fn locate_table<'a>(
    document: &'a Html,
    label: &str,
    strategies: &[LocateStrategy],
) -> Option<ElementRef<'a>> {
    strategies.iter().find_map(|strategy| {
        let table = strategy.apply(document, label)?;
        tracing::debug!("schedule table located by {:?} strategy", strategy);
        Some(table)
    })
}

/// Text of an element with each text node trimmed and joined by one space.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn table_after_heading<'a>(document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
    let label = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut heading_found = false;

    // Selection order is document order, so the first table seen after a
    // matching heading is the one that follows it.
    for element in document.select(&HEADINGS_AND_TABLES) {
        if element.value().name() == "table" {
            if heading_found {
                return Some(element);
            }
        } else if !heading_found && heading_text(element).contains(&label) {
            heading_found = true;
        }
    }
    None
}

fn heading_text(element: ElementRef<'_>) -> String {
    element_text(element)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn first_date_shaped_table(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&TABLES)
        .find(|table| DATE_RE.is_match(&element_text(*table)))
}

fn first_tabular_table(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&TABLES).find(|table| {
        table
            .select(&ROWS)
            .filter(|row| row.select(&CELLS).count() >= 2)
            .count()
            >= 2
    })
}
