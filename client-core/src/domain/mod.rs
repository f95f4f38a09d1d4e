//! Domain types and services of the session core.
//!
//! Purpose: define the strongly typed entities, ports, and services the
//! dashboard pages build on. Keep types immutable where possible and
//! document invariants in each type's Rustdoc.
//!
//! Public surface:
//! - [`CoreError`] — failure categories, always degraded at boundaries.
//! - [`UserSummary`] / [`SubscriptionTier`] — signed-in user identity.
//! - [`OnboardingPayload`] / [`OnboardingRecord`] — wire and normalised
//!   onboarding snapshots.
//! - [`TokenStore`] — live token reads from persistent storage.
//! - [`SessionGuard`] — authentication gating and redirect-loop breaker.
//! - [`OnboardingCache`] — TTL cache with derived accessors.
//! - [`PageBootstrap`] / [`PageData`] — readiness wait and initial load.
//! - [`PageContext`] — per-page composition root.

pub mod context;
pub mod error;
pub mod onboarding;
pub mod onboarding_cache;
pub mod page_bootstrap;
pub mod ports;
pub mod session_guard;
pub mod token_store;
pub mod user;

pub use self::context::PageContext;
pub use self::error::CoreError;
pub use self::onboarding::{OnboardingPayload, OnboardingRecord};
pub use self::onboarding_cache::{DEFAULT_CACHE_TTL, OnboardingCache};
pub use self::page_bootstrap::{CacheSlot, PageBootstrap, PageData};
pub use self::ports::{GatewayError, KeyValueStore, Navigator, OnboardingGateway, ProfileGateway};
pub use self::session_guard::{GuardSettings, PageEntry, SessionGuard};
pub use self::token_store::{ACCESS_TOKEN_KEY, TokenStore};
pub use self::user::{SubscriptionTier, UserSummary};
