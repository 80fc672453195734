//! Error types for the sync adapter.
//!
//! Every failure a save or fetch can hit lands in one [`SyncError`] variant,
//! and each variant has a fixed answer to "is retrying worth it". Transport
//! problems and 5xx responses are transient; everything else means the
//! request itself is wrong and must not be repeated.

use thiserror::Error;

/// Errors that can occur while talking to the notes API.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote rejected the request (4xx). Retrying cannot help.
    #[error("request rejected by the notes API (HTTP {status})")]
    ClientRejected { status: u16 },

    /// The remote failed to serve the request (5xx).
    #[error("notes API unavailable (HTTP {status})")]
    ServerUnavailable { status: u16 },

    /// The request timed out before the remote answered.
    #[error("request to the notes API timed out")]
    Timeout,

    /// Connection-level failure: refused, reset, DNS.
    #[error("connection to the notes API failed: {0}")]
    Connection(String),

    /// Transport succeeded but the response violated the API contract.
    #[error("malformed notes API response: {0}")]
    MalformedResponse(String),

    /// Every retry attempt was spent. Carries the last underlying cause.
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<SyncError>,
    },

    /// Anything without a category. Surfaced unmodified.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryability {
    /// Transient: back off and try again.
    Retryable,
    /// Permanent: surface to the caller, no further attempts.
    Fatal,
}

impl SyncError {
    /// Classifies this error for the retry loop.
    ///
    /// Pure: no side effects, no inspection beyond the variant.
    pub fn classify(&self) -> Retryability {
        match self {
            SyncError::ServerUnavailable { .. }
            | SyncError::Timeout
            | SyncError::Connection(_) => Retryability::Retryable,
            SyncError::ClientRejected { .. }
            | SyncError::MalformedResponse(_)
            | SyncError::RetriesExhausted { .. }
            | SyncError::Unexpected(_) => Retryability::Fatal,
        }
    }

    /// True when [`classify`](Self::classify) says the error is transient.
    pub fn is_retryable(&self) -> bool {
        self.classify() == Retryability::Retryable
    }

    /// Maps a non-2xx HTTP status to its error variant.
    ///
    /// Returns `None` for success statuses.
    pub fn from_status(status: u16) -> Option<SyncError> {
        match status {
            200..=299 => None,
            400..=499 => Some(SyncError::ClientRejected { status }),
            500..=599 => Some(SyncError::ServerUnavailable { status }),
            other => Some(SyncError::Unexpected(format!(
                "unexpected HTTP status {other}"
            ))),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SyncError::Timeout
        } else if e.is_connect() {
            SyncError::Connection(e.to_string())
        } else if e.is_decode() {
            SyncError::MalformedResponse(e.to_string())
        } else if e.is_request() {
            // Send-side failures after the connection was up (reset mid-body
            // and friends) are transport problems like a refused connect.
            SyncError::Connection(e.to_string())
        } else {
            SyncError::Unexpected(e.to_string())
        }
    }
}
