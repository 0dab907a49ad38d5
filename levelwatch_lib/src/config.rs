//! Monitor configuration, read once from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use levelwatch_fetch::FetchPolicy;

use crate::evaluate::EvaluationRules;
use crate::locate::LocateStrategy;
use crate::notify::SmtpSettings;

pub const DEFAULT_URL: &str =
    "https://www.bcit.ca/apprenticeship/students/training/carpentry-apprentice-harmonized/";
pub const DEFAULT_LEVEL: &str = "Level 04";
pub const DEFAULT_KEYWORDS: &str = "Jan 05|Feb 20, 2026";

/// Where the monitor keeps its small state files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    /// Timestamp of the last successful check.
    pub status_file: PathBuf,
    /// Consecutive failure count.
    pub failure_file: PathBuf,
    /// Present once the startup alert has been sent.
    pub started_file: PathBuf,
    /// Last document in which no schedule table was found.
    pub capture_file: PathBuf,
}

impl Default for StatePaths {
    fn default() -> Self {
        Self {
            status_file: PathBuf::from("last_success.flag"),
            failure_file: PathBuf::from("consecutive_failures.count"),
            started_file: PathBuf::from("started.flag"),
            capture_file: PathBuf::from("last_error.html"),
        }
    }
}

/// Everything one monitor process needs. Built once and passed down; nothing
/// reads the environment after startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub url: String,
    pub target_level: String,
    pub rules: EvaluationRules,
    /// Enables the structural salvage pass after the heading and date strategies.
    pub table_salvage: bool,
    pub fetch: FetchPolicy,
    pub email_alert: bool,
    pub recipients: Vec<String>,
    pub smtp: SmtpSettings,
    pub state: StatePaths,
    pub check_interval: Duration,
    pub stale_after: Duration,
    /// Consecutive failures before an error alert goes out.
    pub failure_alert_threshold: u32,
    /// Required `token` query value for the on-demand endpoints; `None` disables them.
    pub test_token: Option<String>,
    pub bind_addr: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, falling back to defaults for missing
    /// or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let secs = |key: &str, default: u64| Duration::from_secs(parse_or(lookup(key), default));
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|val| val.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };

        let intake_keywords = string("SPECIFIC_INTAKE_KEYWORDS", DEFAULT_KEYWORDS)
            .split('|')
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        let cutoff_month = parse_or(lookup("CUTOFF_MONTH"), 3u32).clamp(1, 12);

        let recipients = string("RECIPIENTS", "")
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();

        let fetch = FetchPolicy {
            max_attempts: parse_or(lookup("FETCH_MAX_ATTEMPTS"), 4u32).max(1),
            ..FetchPolicy::default()
        };

        let defaults = StatePaths::default();
        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);
        let state = StatePaths {
            status_file: path("STATUS_FILE", defaults.status_file),
            failure_file: path("FAILURE_FILE", defaults.failure_file),
            started_file: path("STARTED_FILE", defaults.started_file),
            capture_file: path("CAPTURE_FILE", defaults.capture_file),
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| format!("0.0.0.0:{}", parse_or(lookup("PORT"), 8080u16)));

        Self {
            url: string("LEVELWATCH_URL", DEFAULT_URL),
            target_level: string("TARGET_LEVEL", DEFAULT_LEVEL),
            rules: EvaluationRules {
                intake_keywords,
                cutoff_year: parse_or(lookup("CUTOFF_YEAR"), 2026i32),
                cutoff_month,
            },
            table_salvage: flag("TABLE_SALVAGE", false),
            fetch,
            email_alert: flag("EMAIL_ALERT", true),
            recipients,
            smtp: SmtpSettings {
                server: string("SMTP_SERVER", "smtp.gmail.com"),
                port: parse_or(lookup("SMTP_PORT"), 587u16),
                user: string("SMTP_USER", ""),
                password: string("SMTP_PASS", ""),
            },
            state,
            check_interval: secs("CHECK_INTERVAL_SEC", 1800),
            stale_after: secs("STALE_AFTER_SEC", 1800),
            failure_alert_threshold: parse_or(lookup("FAILURE_ALERT_THRESHOLD"), 3u32).max(1),
            test_token: lookup("TEST_TOKEN").filter(|t| !t.is_empty()),
            bind_addr,
        }
    }

    /// Locate strategies in the order they are tried.
    pub fn locate_strategies(&self) -> &'static [LocateStrategy] {
        if self.table_salvage {
            LocateStrategy::WITH_SALVAGE
        } else {
            LocateStrategy::DEFAULT
        }
    }
}

/// Parses `raw` into `T`, falling back to `default` when it is missing, not a
/// number, or out of range for `T`.
fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|val| val.trim().parse().ok()).unwrap_or(default)
}
