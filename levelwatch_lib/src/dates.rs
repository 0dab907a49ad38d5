//! Parsing of the free-text date spans shown in the schedule table.
//!
//! The page writes intakes as `"Jan 05 to Feb 20, 2026"`, but spacing,
//! commas and line breaks vary from row to row. Anything that cannot be read
//! as a date yields an empty [`DateSpan`] rather than an error.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::Serialize;

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+\s+\d{1,2})\s+to\s+(\w+\s+\d{1,2}),\s*(\d{4})").unwrap()
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Start, end and year read from a date span. All fields are absent when the
/// text could not be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub year: Option<i32>,
}

/// Collapses whitespace (including line breaks) to single spaces and makes
/// sure every comma is followed by a space.
pub fn normalize_date_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len() + 4);
    let mut chars = collapsed.chars().peekable();
    while let Some(ch) = chars.next() {
        out.push(ch);
        if ch == ',' && !chars.peek().is_some_and(|next| next.is_whitespace()) {
            out.push(' ');
        }
    }
    out
}

/// Parses a date span, filling a missing year or day from today's date.
pub fn parse_date_span(text: &str) -> DateSpan {
    parse_date_span_with_default(text, Local::now().date_naive())
}

/// Parses a date span, filling a missing year or day from `default`.
///
/// `"<Mon> <DD> to <Mon> <DD>, <YYYY>"` gives both ends in the trailing year.
/// Otherwise only the part before `" to "` is read as a single date and the
/// end stays empty.
pub fn parse_date_span_with_default(text: &str, default: NaiveDate) -> DateSpan {
    let cleaned = normalize_date_text(text);

    if let Some(caps) = RANGE_RE.captures(&cleaned) {
        if let Ok(year) = caps[3].parse::<i32>() {
            let start = parse_loose_date(&format!("{} {}", &caps[1], year), default);
            let end = parse_loose_date(&format!("{} {}", &caps[2], year), default);
            if let (Some(start), Some(end)) = (start, end) {
                return DateSpan {
                    start: Some(start),
                    end: Some(end),
                    year: Some(year),
                };
            }
        }
    }

    let first = cleaned.split(" to ").next().unwrap_or(&cleaned);
    match parse_loose_date(first, default) {
        Some(date) => DateSpan {
            start: Some(date),
            end: None,
            year: Some(date.year()),
        },
        None => DateSpan::default(),
    }
}

/// Reads a single date written with a month name, e.g. `"Jan 05"`,
/// `"March 3rd, 2026"`, `"Mon, Feb 2 2026"`, or an ISO `"2026-02-02"`.
///
/// A missing year or day is taken from `default`; a defaulted day is clamped
/// to the end of the month. Unknown words make the whole text unparseable.
pub fn parse_loose_date(text: &str, default: NaiveDate) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;
    let mut year: Option<i32> = None;

    let tokens = trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim_end_matches('.'))
        .filter(|t| !t.is_empty());

    for token in tokens {
        let lower = token.to_lowercase();
        if let Some(m) = month_from_name(&lower) {
            if month.replace(m).is_some() {
                return None;
            }
        } else if is_weekday(&lower) || lower == "of" {
            continue;
        } else if let Some(n) = leading_number(&lower) {
            match (n.len(), day, year) {
                (4, _, None) => year = Some(n.parse().ok()?),
                (1 | 2, None, _) => day = Some(n.parse().ok()?),
                (2, Some(_), None) => year = Some(2000 + n.parse::<i32>().ok()?),
                _ => return None,
            }
        } else {
            return None;
        }
    }

    let month = month?;
    let year = year.unwrap_or_else(|| default.year());
    match day {
        Some(day) => NaiveDate::from_ymd_opt(year, month, day),
        None => (28..=default.day())
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .or_else(|| NaiveDate::from_ymd_opt(year, month, default.day())),
    }
}

fn month_from_name(lower: &str) -> Option<u32> {
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|name| name.starts_with(lower))
        .map(|idx| idx as u32 + 1)
}

fn is_weekday(lower: &str) -> bool {
    lower.len() >= 3 && WEEKDAYS.iter().any(|name| name.starts_with(lower))
}

/// Digits of a number token, allowing an ordinal suffix (`3rd`, `21st`).
fn leading_number(lower: &str) -> Option<&str> {
    let digits_end = lower
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(lower.len());
    if digits_end == 0 {
        return None;
    }
    match &lower[digits_end..] {
        "" | "st" | "nd" | "rd" | "th" => Some(&lower[..digits_end]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 10, 17)
    }

    #[test]
    fn full_range_takes_trailing_year() {
        let span = parse_date_span_with_default("Jan 05 to Feb 20, 2026", today());
        assert_eq!(span.start, Some(date(2026, 1, 5)));
        assert_eq!(span.end, Some(date(2026, 2, 20)));
        assert_eq!(span.year, Some(2026));
    }

    #[test]
    fn range_tolerates_line_breaks_and_missing_comma_space() {
        let span = parse_date_span_with_default("Nov 03\n   to Dec 19,2025", today());
        assert_eq!(span.start, Some(date(2025, 11, 3)));
        assert_eq!(span.end, Some(date(2025, 12, 19)));
        assert_eq!(span.year, Some(2025));
    }

    #[test]
    fn range_accepts_full_month_names() {
        let span = parse_date_span_with_default("March 2 to April 24, 2026", today());
        assert_eq!(span.start, Some(date(2026, 3, 2)));
        assert_eq!(span.end, Some(date(2026, 4, 24)));
    }

    #[test]
    fn range_across_new_year_keeps_single_year() {
        // Both halves inherit the one trailing year, as the page intends it.
        let span = parse_date_span_with_default("Dec 15 to Jan 20, 2026", today());
        assert_eq!(span.start, Some(date(2026, 12, 15)));
        assert_eq!(span.end, Some(date(2026, 1, 20)));
    }

    #[test]
    fn single_date_has_no_end() {
        let span = parse_date_span_with_default("Feb 02, 2026", today());
        assert_eq!(span.start, Some(date(2026, 2, 2)));
        assert_eq!(span.end, None);
        assert_eq!(span.year, Some(2026));
    }

    #[test]
    fn range_without_year_falls_back_to_first_date() {
        let span = parse_date_span_with_default("Jan 05 to Feb 20", today());
        assert_eq!(span.start, Some(date(2025, 1, 5)));
        assert_eq!(span.end, None);
        assert_eq!(span.year, Some(2025));
    }

    #[test]
    fn unknown_month_word_in_range_falls_back() {
        let span = parse_date_span_with_default("Week 05 to Feb 20, 2026", today());
        assert_eq!(span, DateSpan::default());
    }

    #[test]
    fn garbage_yields_empty_span() {
        assert_eq!(parse_date_span_with_default("???", today()), DateSpan::default());
        assert_eq!(parse_date_span_with_default("", today()), DateSpan::default());
        assert_eq!(parse_date_span_with_default("TBA", today()), DateSpan::default());
    }

    #[test]
    fn impossible_day_yields_empty_span() {
        let span = parse_date_span_with_default("Feb 30, 2026", today());
        assert_eq!(span, DateSpan::default());
    }

    #[test]
    fn loose_date_variants() {
        assert_eq!(parse_loose_date("March 3rd, 2026", today()), Some(date(2026, 3, 3)));
        assert_eq!(parse_loose_date("Mon, Feb 2 2026", today()), Some(date(2026, 2, 2)));
        assert_eq!(parse_loose_date("Sept. 8 2026", today()), Some(date(2026, 9, 8)));
        assert_eq!(parse_loose_date("2026-02-02", today()), Some(date(2026, 2, 2)));
        assert_eq!(parse_loose_date("Jan 5 26", today()), Some(date(2026, 1, 5)));
        assert_eq!(parse_loose_date("05 Jan 2026", today()), Some(date(2026, 1, 5)));
    }

    #[test]
    fn missing_day_is_clamped_to_month_end() {
        let default = date(2025, 10, 31);
        assert_eq!(parse_loose_date("Feb 2026", default), Some(date(2026, 2, 28)));
        assert_eq!(parse_loose_date("Jan 2026", default), Some(date(2026, 1, 31)));
    }

    #[test]
    fn two_months_are_rejected() {
        assert_eq!(parse_loose_date("Jan Feb 2026", today()), None);
    }

    #[test]
    fn normalize_spaces_commas_and_newlines() {
        assert_eq!(
            normalize_date_text("  Jan 05\n to  Feb 20,2026 "),
            "Jan 05 to Feb 20, 2026"
        );
        assert_eq!(normalize_date_text("Jan 05, 2026"), "Jan 05, 2026");
    }
}
