//! One check cycle and the loop that repeats it.
//!
//! The monitor owns the I/O around the pipeline: it records success and
//! failure state, captures unparseable documents, and decides when to alert.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local, NaiveDate};
use levelwatch_fetch::PageClient;
use tokio::sync::Mutex;

use crate::config::MonitorConfig;
use crate::error::PipelineError;
use crate::evaluate::{evaluate, CheckSummary};
use crate::notify::{notifier_for, Alerter, Notifier};
use crate::rows::{parse_classes, ClassRecord};
use crate::state::StateStore;

/// Rows echoed to the log after each successful check.
const SAMPLE_ROWS: usize = 8;

/// Outcome of one check, ready for logs, email bodies and HTTP responses.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub ok: bool,
    /// One-line result.
    pub result_text: String,
    /// Multi-line details: row count, summary and a sample of parsed rows.
    pub details: String,
    pub summary: Option<CheckSummary>,
}

pub struct Monitor {
    config: MonitorConfig,
    client: PageClient,
    state: StateStore,
    alerter: Alerter,
    /// Held for the duration of a check so runs never overlap.
    running: Mutex<()>,
}

impl Monitor {
    /// Creates a monitor delivering alerts over SMTP when credentials are set.
    pub fn new(config: MonitorConfig) -> Result<Self, levelwatch_fetch::Error> {
        let notifier = notifier_for(&config.smtp, &config.recipients);
        Self::with_notifier(config, notifier)
    }

    pub fn with_notifier(
        config: MonitorConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, levelwatch_fetch::Error> {
        let client = PageClient::with_policy(config.fetch.clone())?;
        let state = StateStore::new(config.state.clone());
        let alerter = Alerter::new(notifier, config.email_alert, &config.target_level, &config.url);
        Ok(Self {
            config,
            client,
            state,
            alerter,
            running: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn alerter(&self) -> &Alerter {
        &self.alerter
    }

    pub fn client(&self) -> &PageClient {
        &self.client
    }

    /// Fetches the page and parses the target level's classes. Dates without
    /// a year or day are completed from `today`.
    pub async fn fetch_classes(&self, today: NaiveDate) -> Result<Vec<ClassRecord>, PipelineError> {
        let page = self.client.fetch(&self.config.url).await?;
        tracing::debug!(
            "fetched {} ({} bytes, attempt {})",
            page.url,
            page.body.len(),
            page.attempts
        );
        parse_classes(
            &page.body,
            &self.config.target_level,
            self.config.locate_strategies(),
            today,
        )
    }

    /// Runs the pipeline without touching state or sending alerts.
    pub async fn check(
        &self,
        now: DateTime<Local>,
    ) -> Result<(Vec<ClassRecord>, CheckSummary), PipelineError> {
        let records = self.fetch_classes(now.date_naive()).await?;
        let summary = evaluate(&records, now.naive_local(), &self.config.rules);
        Ok((records, summary))
    }

    pub async fn run_check_once(&self) -> CheckReport {
        self.run_check_at(Local::now()).await
    }

    /// Runs one full cycle at `now`: check, record state, alert if needed.
    pub async fn run_check_at(&self, now: DateTime<Local>) -> CheckReport {
        let _running = self.running.lock().await;
        tracing::debug!("checking {}", self.config.url);

        match self.check(now).await {
            Ok((records, summary)) => self.on_success(now, &records, summary).await,
            Err(err) => self.on_failure(&err).await,
        }
    }

    async fn on_success(
        &self,
        now: DateTime<Local>,
        records: &[ClassRecord],
        summary: CheckSummary,
    ) -> CheckReport {
        if let Err(e) = self.state.mark_success(now) {
            tracing::warn!("could not record success: {}", e);
        }
        if let Err(e) = self.state.set_failure_count(0) {
            tracing::warn!("could not reset failure count: {}", e);
        }

        let level = &self.config.target_level;
        let pre_cutoff = summary.pre_cutoff_message(&self.config.rules);
        let result_text = format!(
            "{} summary: {} for target intake(s). {}",
            level, summary.specific_status, pre_cutoff
        );
        let details = format!(
            "Parsed {} rows.\nSpecific: {}  |  {}\nSample:\n{}",
            records.len(),
            summary.specific_status,
            pre_cutoff,
            sample_lines(records)
        );
        tracing::info!("CHECK RESULT\n{}", details);

        if summary.warrants_alert() {
            let msg = format!(
                "{} Alert: {} for target intake(s)! {}",
                level, summary.specific_status, pre_cutoff
            );
            self.alerter.send_alert(&msg, None).await;
        }

        CheckReport {
            ok: true,
            result_text,
            details,
            summary: Some(summary),
        }
    }

    async fn on_failure(&self, err: &PipelineError) -> CheckReport {
        let failures = self.state.failure_count() + 1;
        if let Err(e) = self.state.set_failure_count(failures) {
            tracing::warn!("could not record failure count: {}", e);
        }
        if let Some(document) = err.captured_document() {
            match self.state.capture_document(document) {
                Ok(()) => tracing::info!(
                    "saved unparseable page to {}",
                    self.state.paths().capture_file.display()
                ),
                Err(e) => tracing::warn!("could not capture page: {}", e),
            }
        }
        tracing::warn!("Error in monitor: {} (consecutive={})", err, failures);

        if failures >= self.config.failure_alert_threshold {
            self.alerter
                .send_alert(
                    &format!("Error in monitor: {} (consecutive={})", err, failures),
                    Some("Monitor Error (persistent)"),
                )
                .await;
        }

        CheckReport {
            ok: false,
            result_text: format!("Error: {}", err),
            details: format!("Failure (consecutive={})", failures),
            summary: None,
        }
    }

    /// Sends the one-time startup alert, then checks every `check_interval`
    /// forever.
    pub async fn run_loop(&self) {
        if !self.state.is_started() {
            self.alerter
                .send_alert("Monitor started. You will be alerted on changes.", None)
                .await;
            if let Err(e) = self.state.mark_started() {
                tracing::warn!("could not write started flag: {}", e);
            }
        }

        loop {
            let started = Instant::now();
            let report = self.run_check_once().await;
            tracing::info!(
                "LOOP COMPLETED in {:.1}s -> {}",
                started.elapsed().as_secs_f64(),
                report.result_text
            );
            tokio::time::sleep(self.config.check_interval).await;
        }
    }
}

fn sample_lines(records: &[ClassRecord]) -> String {
    if records.is_empty() {
        return "(no rows parsed)".to_string();
    }
    records
        .iter()
        .take(SAMPLE_ROWS)
        .map(|r| {
            format!(
                "- {}  |  status='{}'  start={} end={} seats={} full={}",
                r.date_text,
                r.status_text,
                display_opt(r.start_date),
                display_opt(r.end_date),
                display_opt(r.seats_left),
                r.is_full
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}
