//! TTL cache over the user's onboarding snapshot.
//!
//! One cache instance exists per page context. The entry is mutated only
//! by [`OnboardingCache::get_data`] and [`OnboardingCache::clear_cache`];
//! the async mutex guarding it is held across the fetch so concurrent
//! misses coalesce into a single network request instead of
//! double-fetching.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::CoreError;
use super::onboarding::OnboardingRecord;
use super::ports::{KeyValueStore, OnboardingGateway};
use super::token_store::TokenStore;

/// Cached records older than this are refetched.
pub const DEFAULT_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(300);

struct CacheEntry {
    record: OnboardingRecord,
    fetched_at: DateTime<Utc>,
}

/// Single source of truth for the current user's onboarding snapshot.
pub struct OnboardingCache<S> {
    tokens: TokenStore<S>,
    gateway: Arc<dyn OnboardingGateway>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    state: Mutex<Option<CacheEntry>>,
}

impl<S: KeyValueStore> OnboardingCache<S> {
    /// Build a cache with the default five-minute TTL.
    pub fn new(
        tokens: TokenStore<S>,
        gateway: Arc<dyn OnboardingGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_ttl(tokens, gateway, clock, DEFAULT_CACHE_TTL)
    }

    /// Build a cache with an explicit TTL.
    pub fn with_ttl(
        tokens: TokenStore<S>,
        gateway: Arc<dyn OnboardingGateway>,
        clock: Arc<dyn Clock>,
        ttl: std::time::Duration,
    ) -> Self {
        Self {
            tokens,
            gateway,
            clock,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            state: Mutex::new(None),
        }
    }

    /// Fetch the onboarding record, reusing a fresh cached copy.
    ///
    /// Returns `None` rather than failing when no token is stored or the
    /// backend responds with an error, so pages treat absent data exactly
    /// like data that has not arrived yet. A failed fetch leaves any
    /// previous entry in place; it is simply no longer fresh.
    pub async fn get_data(&self, force_refresh: bool) -> Option<OnboardingRecord> {
        let mut state = self.state.lock().await;

        if !force_refresh
            && let Some(entry) = state.as_ref()
            && self.clock.utc() - entry.fetched_at < self.ttl
        {
            return Some(entry.record.clone());
        }

        let Some(token) = self.tokens.token() else {
            debug!("onboarding fetch skipped: no session token");
            return None;
        };

        match self.gateway.fetch_onboarding(&token).await {
            Ok(payload) => {
                let record = OnboardingRecord::normalise(payload);
                *state = Some(CacheEntry {
                    record: record.clone(),
                    fetched_at: self.clock.utc(),
                });
                Some(record)
            }
            Err(error) => {
                let error = CoreError::from(error);
                warn!(error = %error, "onboarding fetch failed");
                None
            }
        }
    }

    /// Drop the cached entry so the next [`Self::get_data`] refetches.
    ///
    /// Called on logout so a following sign-in never sees the previous
    /// user's snapshot.
    pub async fn clear_cache(&self) {
        *self.state.lock().await = None;
    }

    /// Expense category to amount mapping; empty when no data.
    pub async fn expenses(&self) -> Map<String, Value> {
        self.get_data(false).await.map(|r| r.expenses).unwrap_or_default()
    }

    /// Recurring subscription entries; empty when no data.
    pub async fn subscriptions(&self) -> Vec<Value> {
        self.get_data(false)
            .await
            .map(|r| r.subscriptions)
            .unwrap_or_default()
    }

    /// Declared asset entries; empty when no data.
    pub async fn assets(&self) -> Vec<Value> {
        self.get_data(false).await.map(|r| r.assets).unwrap_or_default()
    }

    /// Investment entries; empty when no data.
    pub async fn investments(&self) -> Vec<Value> {
        self.get_data(false)
            .await
            .map(|r| r.investments)
            .unwrap_or_default()
    }

    /// Debt entries; empty when no data.
    pub async fn debts(&self) -> Vec<Value> {
        self.get_data(false).await.map(|r| r.debts).unwrap_or_default()
    }

    /// Additional income entries; empty when no data.
    pub async fn additional_income(&self) -> Vec<Value> {
        self.get_data(false)
            .await
            .map(|r| r.additional_income)
            .unwrap_or_default()
    }

    /// Linked bank account entries; empty when no data.
    pub async fn linked_accounts(&self) -> Vec<Value> {
        self.get_data(false)
            .await
            .map(|r| r.linked_accounts)
            .unwrap_or_default()
    }

    /// Sum of expense category amounts; 0 when no data.
    pub async fn total_expenses(&self) -> f64 {
        self.get_data(false)
            .await
            .map(|r| r.total_expenses())
            .unwrap_or_default()
    }

    /// Total declared asset value; 0 when no data.
    pub async fn total_assets(&self) -> f64 {
        self.get_data(false)
            .await
            .map(|r| r.total_assets_value)
            .unwrap_or_default()
    }

    /// Total declared debt amount; 0 when no data.
    pub async fn total_debts(&self) -> f64 {
        self.get_data(false)
            .await
            .map(|r| r.total_debt_amount)
            .unwrap_or_default()
    }

    /// Assets minus debts; 0 when no data.
    pub async fn net_worth(&self) -> f64 {
        self.get_data(false)
            .await
            .map(|r| r.net_worth())
            .unwrap_or_default()
    }

    /// Monthly take-home pay; 0 when no data or onboarding incomplete.
    pub async fn monthly_income(&self) -> f64 {
        self.get_data(false)
            .await
            .map(|r| r.monthly_income())
            .unwrap_or_default()
    }

    /// Monthly income minus total expenses; 0 when no data.
    pub async fn cash_flow(&self) -> f64 {
        self.get_data(false)
            .await
            .map(|r| r.cash_flow())
            .unwrap_or_default()
    }
}
