//! Capture error kinds
//!
//! Neither kind is fatal. `CaptureUnavailable` is reported for a single tick and the
//! next tick retries; `InvalidConfiguration` rejects a request before any session
//! state changes.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The platform could not produce an image for this tick
    #[error("Capture unavailable: {reason}")]
    CaptureUnavailable { reason: String },

    /// A request was rejected synchronously; no session was created or changed
    #[error("Configuration invalid: {reason}")]
    InvalidConfiguration { reason: String },
}

impl CaptureError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        CaptureError::CaptureUnavailable {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        CaptureError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Transient errors are retried by the next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::CaptureUnavailable { .. })
    }
}
