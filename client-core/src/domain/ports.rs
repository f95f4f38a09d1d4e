//! Domain ports defining the edges of the session core.
//!
//! Ports describe how the core expects to interact with the browser
//! environment (storage, navigation) and the backend API. Each trait
//! exposes strongly typed errors so adapters map their failures into
//! predictable variants.

use async_trait::async_trait;
use thiserror::Error;

use super::onboarding::OnboardingPayload;
use super::user::UserSummary;

/// Synchronous key-value storage in the shape of the Web Storage API.
///
/// Two instances back the core: a persistent store (token, legacy user
/// blob) and a tab-scoped store (redirect loop state). Reads are always
/// live so a logout in another tab is observed immediately.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
    /// Remove the value stored under `key`.
    fn remove(&self, key: &str);
    /// Remove every stored value.
    fn clear(&self);
}

/// Navigation side effects: the current location and redirects.
pub trait Navigator: Send + Sync {
    /// Path of the page currently loading, e.g. `/dashboard.html`.
    fn current_path(&self) -> String;
    /// Navigate the page to `location`.
    fn navigate(&self, location: &str);
}

/// Errors surfaced by backend gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The backend rejected the bearer token.
    #[error("request unauthorised: {message}")]
    Unauthorised { message: String },
    /// The backend returned a non-success status.
    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },
    /// The request never completed (connection refused, timeout).
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// The response body could not be decoded.
    #[error("payload decode failed: {message}")]
    Decode { message: String },
}

impl GatewayError {
    /// Helper for rejected credentials.
    pub fn unauthorised(message: impl Into<String>) -> Self {
        Self::Unauthorised {
            message: message.into(),
        }
    }

    /// Helper for non-success statuses.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Helper for transport-level failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for body decode failures.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Source of the signed-in user's onboarding snapshot.
#[async_trait]
pub trait OnboardingGateway: Send + Sync {
    /// Fetch the raw onboarding payload using the given bearer token.
    async fn fetch_onboarding(&self, token: &str) -> Result<OnboardingPayload, GatewayError>;
}

/// Source of the signed-in user's profile summary.
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    /// Fetch the current user summary using the given bearer token.
    async fn fetch_profile(&self, token: &str) -> Result<UserSummary, GatewayError>;
}
