//! Core error types.
//!
//! These errors never reach the rendering layer. Every operation in the
//! session core catches them at its own boundary, emits a `tracing`
//! diagnostic, and degrades to an absent or default return value so a
//! dashboard page is always renderable.

use thiserror::Error;

use super::ports::GatewayError;

/// Failure categories raised inside the session core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No session token is available, or the cached user summary is missing.
    #[error("authentication required: {message}")]
    Auth { message: String },
    /// The backend returned a non-success response or was unreachable.
    #[error("fetch failed: {message}")]
    Fetch { message: String },
    /// A serialized onboarding field could not be decoded into its
    /// structured form.
    #[error("normalisation of `{field}` failed: {message}")]
    Normalization {
        field: &'static str,
        message: String,
    },
}

impl CoreError {
    /// Helper for missing or invalid session state.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Helper for failed backend fetches.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Helper for malformed serialized fields.
    pub fn normalization(field: &'static str, message: impl Into<String>) -> Self {
        Self::Normalization {
            field,
            message: message.into(),
        }
    }
}

impl From<GatewayError> for CoreError {
    /// Classify a gateway failure at the cache boundary: rejected
    /// credentials are an auth problem, everything else is a failed
    /// fetch.
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Unauthorised { message } => Self::Auth { message },
            GatewayError::Status { .. } | GatewayError::Transport { .. } => {
                Self::fetch(error.to_string())
            }
            GatewayError::Decode { message } => Self::Fetch { message },
        }
    }
}
