//! Page bootstrap: readiness waiting and the initial data load.
//!
//! Dashboard script load order is not guaranteed, so pages historically
//! polled for the cache instead of assuming it existed. The slot keeps
//! that bounded-retry wait available while the preferred path, wiring the
//! cache into the slot during page-context construction, makes the wait
//! return immediately.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, warn};

use super::onboarding::OnboardingRecord;
use super::onboarding_cache::OnboardingCache;
use super::ports::KeyValueStore;

/// Interval between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long a page waits for the cache before giving up.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5);

/// Write-once slot holding the page's onboarding cache.
pub struct CacheSlot<S>(OnceLock<Arc<OnboardingCache<S>>>);

impl<S> CacheSlot<S> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Install the cache. A second install is ignored with a warning;
    /// the first instance stays authoritative for the page's lifetime.
    pub fn install(&self, cache: Arc<OnboardingCache<S>>) {
        if self.0.set(cache).is_err() {
            warn!("onboarding cache already installed; keeping the first instance");
        }
    }

    /// The installed cache, if any.
    pub fn get(&self) -> Option<&Arc<OnboardingCache<S>>> {
        self.0.get()
    }
}

impl<S> Default for CacheSlot<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a page's initial data load.
///
/// "Onboarding incomplete" is a distinct case from "fetch failed" so
/// pages can render a finish-onboarding prompt instead of the generic
/// no-data state.
#[derive(Debug, Clone, PartialEq)]
pub enum PageData {
    /// A complete record is available for rendering.
    Ready(OnboardingRecord),
    /// The record exists but `monthly_takehome` is missing: the user has
    /// not finished onboarding.
    Incomplete,
    /// The cache never became ready or the fetch failed.
    Unavailable,
}

/// Generic helper dashboard pages use to obtain their data.
pub struct PageBootstrap<S> {
    slot: Arc<CacheSlot<S>>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl<S: KeyValueStore> PageBootstrap<S> {
    /// Build a bootstrap helper with default timing.
    pub fn new(slot: Arc<CacheSlot<S>>) -> Self {
        Self::with_timing(slot, DEFAULT_POLL_INTERVAL, DEFAULT_MAX_WAIT)
    }

    /// Build a bootstrap helper with explicit poll interval and wait cap.
    pub fn with_timing(slot: Arc<CacheSlot<S>>, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            slot,
            poll_interval,
            max_wait,
        }
    }

    /// Poll until the cache is installed or `max_wait` elapses.
    ///
    /// Returns whether the cache became available.
    pub async fn wait_for_data_service(&self, max_wait: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            if self.slot.get().is_some() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Wait for the cache, fetch the record, and classify the outcome.
    ///
    /// Never fails; every failure path degrades to a [`PageData`] variant
    /// with a logged diagnostic so the page always renders something.
    pub async fn load_page_data(&self, page_name: &str) -> PageData {
        if !self.wait_for_data_service(self.max_wait).await {
            warn!(page = page_name, "onboarding cache never became ready");
            return PageData::Unavailable;
        }
        let Some(cache) = self.slot.get() else {
            warn!(page = page_name, "onboarding cache disappeared after readiness");
            return PageData::Unavailable;
        };

        match cache.get_data(false).await {
            None => {
                warn!(page = page_name, "onboarding data unavailable");
                PageData::Unavailable
            }
            Some(record) if record.monthly_takehome.is_none() => {
                debug!(page = page_name, "onboarding incomplete; prompting completion");
                PageData::Incomplete
            }
            Some(record) => PageData::Ready(record),
        }
    }
}
