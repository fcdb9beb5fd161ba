//! Language model client seam.
//!
//! The model is an opaque text-in/text-out service. Concrete clients live in
//! `codewise-interaction`; the core only depends on this trait.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single model invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The request never produced an HTTP response (DNS, connect, reset).
    #[error("Model transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("Model API error (status {status}): {message}")]
    Http {
        status: u16,
        message: String,
        retryable: bool,
    },

    /// The call exceeded its time budget.
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered but carried no text.
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The endpoint's envelope could not be decoded.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    /// Whether the caller may reasonably try the same call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Http { retryable, .. } => *retryable,
            Self::EmptyResponse | Self::MalformedResponse(_) => false,
        }
    }
}

/// A text-in/text-out language model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Short identifier used in log lines (e.g. the model name).
    fn name(&self) -> &str;

    /// Sends the rendered prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ModelError::Transport("reset".into()).is_retryable());
        assert!(ModelError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(
            ModelError::Http {
                status: 503,
                message: "busy".into(),
                retryable: true
            }
            .is_retryable()
        );
        assert!(
            !ModelError::Http {
                status: 400,
                message: "bad".into(),
                retryable: false
            }
            .is_retryable()
        );
        assert!(!ModelError::EmptyResponse.is_retryable());
    }
}
