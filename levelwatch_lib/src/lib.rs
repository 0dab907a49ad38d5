//! Library layer for levelwatch: locating, parsing and evaluating a class
//! schedule page, plus the state, alerting and loop around it.
//!
//! Fetching lives in the `levelwatch_fetch` crate; everything downstream of
//! the raw HTML lives here.

pub mod config;
pub mod dates;
pub mod error;
pub mod evaluate;
pub mod locate;
pub mod monitor;
pub mod notify;
pub mod rows;
pub mod state;

pub use levelwatch_fetch;
pub use levelwatch_fetch::{FetchPolicy, PageClient, RawPage};

pub use config::{MonitorConfig, StatePaths};
pub use dates::{parse_date_span, parse_date_span_with_default, DateSpan};
pub use error::PipelineError;
pub use evaluate::{evaluate, CheckSummary, EvaluationRules, IntakeStatus};
pub use locate::{locate_table, LocateStrategy};
pub use monitor::{CheckReport, Monitor};
pub use notify::{Alerter, LogNotifier, Notifier, NotifyError, SmtpNotifier, SmtpSettings};
pub use rows::{parse_classes, parse_rows, ClassRecord};
pub use state::{Health, StateError, StateStore};
