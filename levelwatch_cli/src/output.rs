use levelwatch_lib::{CheckReport, ClassRecord};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct ClassRow {
    #[tabled(rename = "Dates")]
    dates: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Seats")]
    seats: String,
    #[tabled(rename = "Full")]
    full: String,
}

fn build_class_rows(classes: &[ClassRecord]) -> Vec<ClassRow> {
    classes
        .iter()
        .map(|c| ClassRow {
            dates: c.date_text.clone(),
            status: c.status_text.clone(),
            start: c.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            end: c.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            seats: c.seats_left.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            full: if c.is_full { "yes" } else { "no" }.to_string(),
        })
        .collect()
}

pub fn print_classes_table(classes: &[ClassRecord]) {
    let mut table = Table::new(build_class_rows(classes));
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn print_check_report(report: &CheckReport) {
    println!("{}", report.result_text);
    println!();
    println!("{}", report.details);
}

pub fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(status: &str, date: &str, start: Option<NaiveDate>, seats: Option<u32>) -> ClassRecord {
        ClassRecord {
            status_text: status.to_string(),
            date_text: date.to_string(),
            start_date: start,
            end_date: None,
            year: start.map(|_| 2026),
            seats_left: seats,
            is_full: status.to_uppercase().contains("FULL"),
        }
    }

    #[test]
    fn class_rows_fill_missing_values_with_dash() {
        let rows = build_class_rows(&[
            record("6 seats left", "Jan 05 to Feb 20, 2026", NaiveDate::from_ymd_opt(2026, 1, 5), Some(6)),
            record("TBA", "To be announced", None, None),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, "2026-01-05");
        assert_eq!(rows[0].end, "-");
        assert_eq!(rows[0].seats, "6");
        assert_eq!(rows[0].full, "no");
        assert_eq!(rows[1].start, "-");
        assert_eq!(rows[1].seats, "-");
    }

    #[test]
    fn class_rows_mark_full() {
        let rows = build_class_rows(&[record("FULL", "Mar 02 to Apr 24, 2026", None, None)]);
        assert_eq!(rows[0].full, "yes");
        assert_eq!(rows[0].status, "FULL");
    }

    #[test]
    fn classes_table_has_headers() {
        let table = Table::new(build_class_rows(&[record("FULL", "Mar 02", None, None)])).to_string();
        for header in ["Dates", "Status", "Start", "End", "Seats", "Full"] {
            assert!(table.contains(header), "missing header {}", header);
        }
    }
}
