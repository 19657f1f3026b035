use thiserror::Error;

/// Unified error type for the fund-valuation-core library.
/// Every provider call and public fallible function returns `Result<T, CoreError>`.
///
/// Provider failures (`ProviderUnavailable`, `MalformedResponse`, `Network`)
/// are recoverable: the services substitute a neutral value and keep going.
/// A valid empty answer ("no data") is never an error.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Provider / Network ──────────────────────────────────────────
    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable {
        provider: String,
        message: String,
    },

    #[error("Malformed response ({provider}): {message}")]
    MalformedResponse {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Resolution ──────────────────────────────────────────────────
    #[error("Fund {0} could not be resolved to any metadata")]
    UnresolvableFund(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File I/O error: {0}")]
    FileIO(String),
}

impl CoreError {
    /// Whether the engine recovers from this error locally by substituting
    /// a neutral value (zero change, empty holdings) instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::ProviderUnavailable { .. }
                | CoreError::MalformedResponse { .. }
                | CoreError::Network(_)
                | CoreError::Deserialization(_)
        )
    }

    pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> Self {
        CoreError::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn unavailable(provider: &str, message: impl Into<String>) -> Self {
        CoreError::ProviderUnavailable {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters: data-feed URLs carry fund codes and tokens.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        if e.is_timeout() {
            CoreError::Network(format!("timed out: {sanitized}"))
        } else {
            CoreError::Network(sanitized)
        }
    }
}
