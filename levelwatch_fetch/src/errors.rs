//! Error types for the page fetcher.

/// Errors that can occur while fetching a page. Every variant except
/// `InvalidUrl` and `Client` is treated as transient and retried.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(String),
    /// Network failure or timeout.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("unexpected status {status}")]
    HttpStatus { status: u16 },
    /// The body was too short to be the real page.
    #[error("fetched html looks incomplete ({len} bytes)")]
    Incomplete { len: usize },
    /// The body contained a bot-defense interstitial marker.
    #[error("fetched html looks bot-defended (\"{marker}\")")]
    BotDefense { marker: &'static str },
}

impl Error {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_) | Self::Client(_))
    }
}
