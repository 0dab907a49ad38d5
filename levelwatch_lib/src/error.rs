//! Error types for the check pipeline.

use std::fmt;

/// Errors that end a single check: either the page could not be fetched
/// after all retries, or it was fetched but held no schedule table.
#[derive(Debug)]
pub enum PipelineError {
    /// Fetching failed after exhausting every attempt.
    Fetch(levelwatch_fetch::Error),
    /// No table matched any locate strategy. Carries the fetched document
    /// so it can be captured for inspection.
    TableNotFound { level: String, document: String },
}

impl PipelineError {
    /// The document that failed to parse, when there is one.
    pub fn captured_document(&self) -> Option<&str> {
        match self {
            Self::TableNotFound { document, .. } => Some(document),
            Self::Fetch(_) => None,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Fetch failed: {}", e),
            Self::TableNotFound { level, .. } => write!(f, "No {} table found", level),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::TableNotFound { .. } => None,
        }
    }
}

impl From<levelwatch_fetch::Error> for PipelineError {
    fn from(e: levelwatch_fetch::Error) -> Self {
        Self::Fetch(e)
    }
}
