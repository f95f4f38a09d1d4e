//! Per-page composition root.
//!
//! The original front end kept the guard and cache as page-global
//! singletons and let every script reach for them. The context replaces
//! that: one explicit object constructed at the top of the page script,
//! before any page logic runs, and passed to consumers. Constructing the
//! context installs the cache into the bootstrap slot, so the historical
//! readiness race cannot occur on the preferred path.

use std::sync::Arc;

use mockable::Clock;

use super::onboarding_cache::OnboardingCache;
use super::page_bootstrap::{CacheSlot, PageBootstrap};
use super::ports::{KeyValueStore, Navigator, OnboardingGateway, ProfileGateway};
use super::session_guard::{GuardSettings, PageEntry, SessionGuard};
use super::token_store::TokenStore;
use crate::config::CoreSettings;

/// Everything a dashboard page needs from the session core.
pub struct PageContext<S, T, N> {
    guard: Arc<SessionGuard<S, T, N>>,
    cache: Arc<OnboardingCache<S>>,
    bootstrap: PageBootstrap<S>,
}

impl<S, T, N> PageContext<S, T, N>
where
    S: KeyValueStore,
    T: KeyValueStore,
    N: Navigator,
{
    /// Wire the guard, cache, slot, and bootstrap from one settings
    /// object and the page's adapters.
    pub fn new(
        settings: &CoreSettings,
        persistent: Arc<S>,
        tab: Arc<T>,
        navigator: Arc<N>,
        onboarding: Arc<dyn OnboardingGateway>,
        profile: Arc<dyn ProfileGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let guard = Arc::new(SessionGuard::new(
            Arc::clone(&persistent),
            tab,
            profile,
            navigator,
            Arc::clone(&clock),
            GuardSettings {
                login_path: settings.login_path().to_owned(),
                onboarding_path: settings.onboarding_path().to_owned(),
                profile_refresh: settings.profile_refresh(),
            },
        ));
        let cache = Arc::new(OnboardingCache::with_ttl(
            TokenStore::new(persistent),
            onboarding,
            clock,
            settings.cache_ttl(),
        ));
        let slot = Arc::new(CacheSlot::new());
        slot.install(Arc::clone(&cache));
        let bootstrap = PageBootstrap::with_timing(
            slot,
            settings.bootstrap_poll_interval(),
            settings.bootstrap_max_wait(),
        );

        Self {
            guard,
            cache,
            bootstrap,
        }
    }

    /// The session guard.
    pub fn guard(&self) -> &Arc<SessionGuard<S, T, N>> {
        &self.guard
    }

    /// The onboarding cache.
    pub fn cache(&self) -> &Arc<OnboardingCache<S>> {
        &self.cache
    }

    /// The page bootstrap helper.
    pub fn bootstrap(&self) -> &PageBootstrap<S> {
        &self.bootstrap
    }

    /// Run the guard's page-entry algorithm.
    pub fn enforce_page_entry(&self) -> PageEntry {
        self.guard.enforce_page_entry()
    }

    /// Log out: clear the cached snapshot, then the persisted session.
    ///
    /// The cache is cleared first so no accessor can serve the old
    /// user's record between the two steps.
    pub async fn logout(&self) {
        self.cache.clear_cache().await;
        self.guard.logout();
    }
}
