//! User summary and subscription tiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier attached to a user account.
///
/// Tiers are ordered so that "has at least this tier" is a plain
/// comparison: `Free < Plus < Premium`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    /// Default tier for accounts with no paid plan.
    #[default]
    Free,
    /// Entry-level paid plan.
    Plus,
    /// Full-featured paid plan.
    Premium,
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => f.write_str("free"),
            Self::Plus => f.write_str("plus"),
            Self::Premium => f.write_str("premium"),
        }
    }
}

/// Error returned when a tier label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subscription tier: {label}")]
pub struct UnknownTierError {
    /// The label that failed to parse.
    pub label: String,
}

impl std::str::FromStr for SubscriptionTier {
    type Err = UnknownTierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "plus" => Ok(Self::Plus),
            "premium" => Ok(Self::Premium),
            other => Err(UnknownTierError {
                label: other.to_owned(),
            }),
        }
    }
}

/// Summary of the signed-in user as returned by the profile endpoint and
/// stored in the legacy `ifi_current_user` blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Stable account identifier.
    pub id: Uuid,
    /// Login name shown in dashboard headers.
    pub username: String,
    /// Contact address, when the profile provides one.
    #[serde(default)]
    pub email: Option<String>,
    /// Active subscription tier; absent in old blobs, defaulting to free.
    #[serde(default)]
    pub subscription_tier: SubscriptionTier,
}

impl UserSummary {
    /// Name suitable for greeting banners.
    pub fn display_name(&self) -> &str {
        self.username.as_str()
    }
}
