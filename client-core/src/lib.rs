//! Client-side session core for the ifi personal-finance dashboards.
//!
//! Gates page access behind a valid session, caches the signed-in user's
//! onboarding snapshot with a TTL, and gives dashboard pages a uniform
//! bootstrap path. Chart rendering, DOM wiring, and the backend API
//! itself are external collaborators; this crate owns the state-
//! management contracts between them.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(feature = "test-support")]
pub mod test_support;

pub use config::CoreSettings;
pub use domain::{
    CoreError, OnboardingCache, OnboardingRecord, PageContext, PageData, PageEntry, SessionGuard,
    SubscriptionTier, TokenStore, UserSummary,
};
