//! HTTP client that fetches a schedule page and rejects anything that does
//! not look like the real page.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, PRAGMA, USER_AGENT,
};
use url::Url;

use crate::{tracker::FetchTracker, user_agent::get_user_agent, Error};

/// Phrases found on bot-defense interstitials rather than on the real page.
pub const BOT_DEFENSE_MARKERS: [&str; 4] = [
    "attention required",
    "access denied",
    "just a moment",
    "verify you are a human",
];

/// Retry and validation settings for [`PageClient`].
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Backoff grows by this much per failed attempt.
    pub backoff_step: Duration,
    /// Upper bound (exclusive) of the random jitter added to each backoff.
    pub max_jitter: Duration,
    /// Bodies shorter than this are treated as incomplete.
    pub min_body_len: usize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            timeout: Duration::from_secs(15),
            backoff_step: Duration::from_secs(2),
            max_jitter: Duration::from_millis(1500),
            min_body_len: 2000,
        }
    }
}

impl FetchPolicy {
    /// Delay after failed attempt `attempt` (1-based): `step * attempt` plus jitter.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.backoff_step * attempt;
        if self.max_jitter.is_zero() {
            return base;
        }
        let jitter = rand::thread_rng().gen_range(0.0..self.max_jitter.as_secs_f64());
        base + Duration::from_secs_f64(jitter)
    }

    /// Largest total backoff a fully failed fetch can sleep for.
    pub fn max_total_backoff(&self) -> Duration {
        (1..self.max_attempts).fold(Duration::ZERO, |acc, attempt| {
            acc + self.backoff_step * attempt + self.max_jitter
        })
    }
}

/// A fetched page together with where and how it was obtained.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
    /// Attempt number that succeeded.
    pub attempts: u32,
}

/// Fetches HTML pages with browser-like headers, a rotating user agent and
/// linear backoff between attempts.
pub struct PageClient {
    http: reqwest::Client,
    policy: FetchPolicy,
    tracker: FetchTracker,
}

impl PageClient {
    /// Creates a client with the default policy (4 attempts, 15s timeout).
    pub fn new() -> Result<Self, Error> {
        Self::with_policy(FetchPolicy::default())
    }

    /// Creates a client with a custom policy. Used by tests to shrink delays.
    pub fn with_policy(policy: FetchPolicy) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Client(e.to_string())
            })?;
        Ok(Self {
            http,
            policy,
            tracker: FetchTracker::new(),
        })
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Access the tracker for attempt and backoff counters.
    pub fn tracker(&self) -> &FetchTracker {
        &self.tracker
    }

    /// Fetches `url`, retrying transient failures up to `max_attempts` times.
    ///
    /// Returns the last error once attempts are exhausted. Invalid URLs fail
    /// immediately without a request.
    pub async fn fetch(&self, url: &str) -> Result<RawPage, Error> {
        let url = Url::parse(url)?;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(&url).await {
                Ok(mut page) => {
                    self.tracker.record_success();
                    page.attempts = attempt;
                    return Ok(page);
                }
                Err(err) => {
                    self.tracker.record_failure();
                    if attempt >= max_attempts || !err.is_retryable() {
                        tracing::warn!(
                            "fetch of {} failed after {} attempt(s): {}",
                            url,
                            attempt,
                            err
                        );
                        return Err(err);
                    }
                    let delay = self.policy.backoff_for_attempt(attempt);
                    tracing::warn!(
                        "fetch attempt {}/{} failed: {} -> retrying in {:.1}s",
                        attempt,
                        max_attempts,
                        err,
                        delay.as_secs_f64()
                    );
                    self.tracker.record_backoff(delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<RawPage, Error> {
        let resp = self
            .http
            .get(url.clone())
            .header(USER_AGENT, get_user_agent())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-CA,en;q=0.9")
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .header(CONNECTION, "close")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
            });
        }

        let final_url = resp.url().to_string();
        let body = resp.text().await?;
        check_body(&body, self.policy.min_body_len)?;

        Ok(RawPage {
            url: final_url,
            status: status.as_u16(),
            body,
            attempts: 0,
        })
    }
}

/// Rejects bodies that carry a bot-defense marker or are too short.
pub fn check_body(body: &str, min_len: usize) -> Result<(), Error> {
    let lower = body.to_lowercase();
    if let Some(marker) = BOT_DEFENSE_MARKERS.iter().find(|m| lower.contains(**m)) {
        return Err(Error::BotDefense { marker: *marker });
    }
    if body.len() < min_len {
        return Err(Error::Incomplete { len: body.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_linearly_with_bounded_jitter() {
        let policy = FetchPolicy::default();
        for attempt in 1..=4 {
            let delay = policy.backoff_for_attempt(attempt);
            let base = Duration::from_secs(2 * attempt as u64);
            assert!(delay >= base, "attempt {} delay {:?}", attempt, delay);
            assert!(delay < base + Duration::from_millis(1500));
        }
    }

    #[test]
    fn zero_jitter_is_exact() {
        let policy = FetchPolicy {
            max_jitter: Duration::ZERO,
            ..FetchPolicy::default()
        };
        assert_eq!(policy.backoff_for_attempt(3), Duration::from_secs(6));
    }

    #[test]
    fn max_total_backoff_covers_retries_only() {
        let policy = FetchPolicy::default();
        // 2 + 4 + 6 seconds plus three jitter ceilings
        assert_eq!(
            policy.max_total_backoff(),
            Duration::from_secs(12) + Duration::from_millis(4500)
        );
    }

    #[test]
    fn check_body_rejects_markers_case_insensitively() {
        let body = format!("<title>Just a Moment...</title>{}", "x".repeat(3000));
        match check_body(&body, 2000) {
            Err(Error::BotDefense { marker }) => assert_eq!(marker, "just a moment"),
            other => panic!("expected bot defense, got {:?}", other),
        }
    }

    #[test]
    fn check_body_rejects_short_pages() {
        assert!(matches!(
            check_body("<html></html>", 2000),
            Err(Error::Incomplete { len: 13 })
        ));
    }

    #[test]
    fn check_body_accepts_real_page() {
        let body = format!("<h2>Level 04</h2>{}", "y".repeat(2500));
        assert!(check_body(&body, 2000).is_ok());
    }

    #[test]
    fn client_creation_with_defaults() {
        let client = PageClient::new();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().policy().max_attempts, 4);
    }
}
