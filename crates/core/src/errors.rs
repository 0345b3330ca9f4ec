use thiserror::Error;

/// Unified error type for the entire portfolio-insight-core library.
///
/// Only the API layer produces errors. The metrics engine, the series builder
/// and the crosshair mapping never fail: malformed numbers are coerced to zero
/// and empty inputs produce explicit empty results.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport ───────────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    // ── Envelope ────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    Api { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Caller input ────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// Transient failures the UI may offer to retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Network(_) | CoreError::Timeout(_))
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Query strings can carry search keywords and user codes; keep them out of logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
