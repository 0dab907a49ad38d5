//! Business rules applied to the parsed schedule.
//!
//! Two independent questions are answered for every future intake: does it
//! match one of the watched intake keywords (and if so, is it open, full or
//! unclear), and does it start before the cutoff with seats still open.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::rows::ClassRecord;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Seat status of a single watched intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntakeStatus {
    Full,
    Open,
    Unknown,
}

impl IntakeStatus {
    /// `Full` wins over any seat count; otherwise open seats mean `Open`.
    pub fn classify(record: &ClassRecord) -> Self {
        if record.is_full {
            Self::Full
        } else if record.shows_open_seats() {
            Self::Open
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Open => "OPEN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for IntakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to look for in the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRules {
    /// Literal, case-sensitive fragments of `date_text` marking watched intakes.
    pub intake_keywords: Vec<String>,
    pub cutoff_year: i32,
    /// Last month (1-12, inclusive) of the early-year window.
    pub cutoff_month: u32,
}

impl EvaluationRules {
    /// Human label of the early-year window, e.g. `"through Mar 2026"`.
    pub fn cutoff_label(&self) -> String {
        let month = MONTH_ABBREVIATIONS
            .get(self.cutoff_month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("Dec");
        format!("through {} {}", month, self.cutoff_year)
    }

    fn matches_keyword(&self, record: &ClassRecord) -> bool {
        self.intake_keywords
            .iter()
            .any(|k| record.date_text.contains(k.as_str()))
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    /// `FULL`, `OPEN`, `UNKNOWN` or `MIXED`, suffixed with the intake count
    /// when several intakes matched; `UNKNOWN (no match)` when none did.
    pub specific_status: String,
    /// `"<date_text>: <status_text>"` for early intakes with open seats.
    pub pre_cutoff_matches: Vec<String>,
    /// How many future intakes matched a keyword.
    pub match_count: usize,
}

impl CheckSummary {
    /// An alert is due when a watched intake is open or an early intake has seats.
    pub fn warrants_alert(&self) -> bool {
        self.specific_status.contains("OPEN") || !self.pre_cutoff_matches.is_empty()
    }

    pub fn pre_cutoff_message(&self, rules: &EvaluationRules) -> String {
        if self.pre_cutoff_matches.is_empty() {
            format!("No opens {}", rules.cutoff_label())
        } else {
            format!(
                "OPEN {}: {}",
                rules.cutoff_label(),
                self.pre_cutoff_matches.join(", ")
            )
        }
    }
}

/// Evaluates `records` against `rules`, ignoring intakes that do not start
/// strictly after `now`.
pub fn evaluate(records: &[ClassRecord], now: NaiveDateTime, rules: &EvaluationRules) -> CheckSummary {
    let mut statuses: Vec<IntakeStatus> = Vec::new();
    let mut pre_cutoff_matches = Vec::new();

    for record in records {
        let Some(start) = record.start_date else {
            continue;
        };
        if start.and_time(NaiveTime::MIN) <= now {
            continue;
        }

        if rules.matches_keyword(record) {
            statuses.push(IntakeStatus::classify(record));
        }

        if start.year() == rules.cutoff_year
            && start.month() <= rules.cutoff_month
            && record.shows_open_seats()
        {
            pre_cutoff_matches.push(format!("{}: {}", record.date_text, record.status_text));
        }
    }

    CheckSummary {
        specific_status: roll_up(&statuses),
        pre_cutoff_matches,
        match_count: statuses.len(),
    }
}

fn roll_up(statuses: &[IntakeStatus]) -> String {
    let Some(first) = statuses.first() else {
        return "UNKNOWN (no match)".to_string();
    };
    let mut status = if statuses.iter().all(|s| s == first) {
        first.to_string()
    } else {
        "MIXED".to_string()
    };
    if statuses.len() > 1 {
        status.push_str(&format!(" ({} intakes)", statuses.len()));
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date_span_with_default;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 17)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn record(status: &str, dates: &str) -> ClassRecord {
        let span = parse_date_span_with_default(dates, now().date());
        ClassRecord::from_cells(status, dates, span)
    }

    fn rules(keywords: &[&str]) -> EvaluationRules {
        EvaluationRules {
            intake_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            cutoff_year: 2026,
            cutoff_month: 3,
        }
    }

    #[test]
    fn single_full_match() {
        let records = vec![record("FULL", "Jan 05 to Feb 20, 2026")];
        let summary = evaluate(&records, now(), &rules(&["Jan 05"]));
        assert_eq!(summary.specific_status, "FULL");
        assert_eq!(summary.match_count, 1);
        assert!(summary.pre_cutoff_matches.is_empty());
        assert!(!summary.warrants_alert());
    }

    #[test]
    fn open_and_full_are_mixed() {
        let records = vec![
            record("6 seats left", "Jan 05 to Feb 20, 2026"),
            record("FULL", "Jan 05 to Feb 27, 2026"),
        ];
        let summary = evaluate(&records, now(), &rules(&["Jan 05"]));
        assert_eq!(summary.specific_status, "MIXED (2 intakes)");
        assert_eq!(summary.match_count, 2);
    }

    #[test]
    fn same_status_keeps_count_suffix() {
        let records = vec![
            record("2 seats left", "Jan 05 to Feb 20, 2026"),
            record("Seats left", "Nov 03 to Feb 20, 2026"),
        ];
        let summary = evaluate(&records, now(), &rules(&["Jan 05", "Feb 20, 2026"]));
        assert_eq!(summary.specific_status, "OPEN (2 intakes)");
        assert!(summary.warrants_alert());
    }

    #[test]
    fn no_keyword_match() {
        let records = vec![record("6 seats left", "Apr 06 to May 22, 2026")];
        let summary = evaluate(&records, now(), &rules(&["Jan 05"]));
        assert_eq!(summary.specific_status, "UNKNOWN (no match)");
        assert_eq!(summary.match_count, 0);
    }

    #[test]
    fn unclear_status_is_unknown() {
        let records = vec![record("Waitlist", "Jan 05 to Feb 20, 2026")];
        let summary = evaluate(&records, now(), &rules(&["Jan 05"]));
        assert_eq!(summary.specific_status, "UNKNOWN");
    }

    #[test]
    fn keyword_match_is_case_sensitive() {
        let records = vec![record("6 seats left", "Jan 05 to Feb 20, 2026")];
        let summary = evaluate(&records, now(), &rules(&["jan 05"]));
        assert_eq!(summary.specific_status, "UNKNOWN (no match)");
    }

    #[test]
    fn past_and_undated_intakes_are_ignored() {
        let records = vec![
            record("6 seats left", "Jan 05 to Feb 20, 2025"),
            record("6 seats left", "TBA Jan 05"),
            record("6 seats left", "Oct 17 to Nov 28, 2025"),
        ];
        let summary = evaluate(&records, now(), &rules(&["Jan 05", "Oct 17"]));
        assert_eq!(summary.specific_status, "UNKNOWN (no match)");
        assert_eq!(summary.match_count, 0);
    }

    #[test]
    fn pre_cutoff_opens_are_listed_in_order() {
        let records = vec![
            record("3 seats left", "Feb 02 to Mar 27, 2026"),
            record("FULL", "Jan 05 to Feb 20, 2026"),
            record("Seats left", "Mar 30 to May 15, 2026"),
            record("8 seats left", "Apr 06 to May 22, 2026"),
            record("5 seats left", "Jan 04 to Feb 19, 2027"),
        ];
        let summary = evaluate(&records, now(), &rules(&[]));
        assert_eq!(
            summary.pre_cutoff_matches,
            vec![
                "Feb 02 to Mar 27, 2026: 3 seats left".to_string(),
                "Mar 30 to May 15, 2026: Seats left".to_string(),
            ]
        );
        assert!(summary.warrants_alert());
        assert_eq!(
            summary.pre_cutoff_message(&rules(&[])),
            "OPEN through Mar 2026: Feb 02 to Mar 27, 2026: 3 seats left, Mar 30 to May 15, 2026: Seats left"
        );
    }

    #[test]
    fn full_with_seat_count_counts_as_full_but_open_pre_cutoff() {
        // Free-form status text can claim both; classification prefers FULL
        // while the seat count still counts as open-seat evidence.
        let records = vec![record("FULL - 1 seat left", "Jan 05 to Feb 20, 2026")];
        let summary = evaluate(&records, now(), &rules(&["Jan 05"]));
        assert_eq!(summary.specific_status, "FULL");
        assert_eq!(summary.pre_cutoff_matches.len(), 1);
    }

    #[test]
    fn no_pre_cutoff_message() {
        let summary = evaluate(&[], now(), &rules(&["Jan 05"]));
        assert_eq!(summary.pre_cutoff_message(&rules(&[])), "No opens through Mar 2026");
        assert!(!summary.warrants_alert());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let records = vec![
            record("6 seats left", "Jan 05 to Feb 20, 2026"),
            record("FULL", "Jan 05 to Mar 20, 2026"),
            record("Waitlist", "Feb 02 to Mar 27, 2026"),
        ];
        let r = rules(&["Jan 05"]);
        assert_eq!(evaluate(&records, now(), &r), evaluate(&records, now(), &r));
    }

    #[test]
    fn intake_status_display() {
        assert_eq!(IntakeStatus::Open.to_string(), "OPEN");
        assert_eq!(IntakeStatus::Full.to_string(), "FULL");
        assert_eq!(IntakeStatus::Unknown.to_string(), "UNKNOWN");
    }
}
