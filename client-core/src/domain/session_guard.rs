//! Session guard: authentication gating with redirect-loop protection.
//!
//! The guard runs synchronously at the top of every page script, before
//! any rendering, so its redirect decision always completes before a
//! dashboard starts drawing. Asynchronous work (profile refresh) never
//! participates in that decision; it only keeps the cached user summary
//! warm.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::{debug, warn};
use url::form_urlencoded;

use super::error::CoreError;
use super::ports::{KeyValueStore, Navigator, ProfileGateway};
use super::token_store::TokenStore;
use super::user::{SubscriptionTier, UserSummary};

/// Storage key holding the legacy string-encoded user summary blob.
pub const CURRENT_USER_KEY: &str = "ifi_current_user";
/// Tab-scoped key counting consecutive unauthenticated redirects.
pub const REDIRECT_COUNT_KEY: &str = "redirect_count";
/// Tab-scoped presence flag set when a login redirect is issued.
pub const LOGIN_REDIRECT_CHECK_KEY: &str = "login_redirect_check";

/// Redirects allowed before the loop breaker clears client storage.
const REDIRECT_LIMIT: u32 = 2;

/// Default age after which the cached user summary is refreshed.
pub const DEFAULT_PROFILE_REFRESH: std::time::Duration = std::time::Duration::from_secs(300);

/// Decision taken by [`SessionGuard::enforce_page_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEntry {
    /// The login page performs no checks.
    SkippedLoginPage,
    /// The onboarding page runs its own gating logic.
    SkippedOnboardingPage,
    /// Authenticated; loop-detection state was reset.
    Allowed,
    /// Unauthenticated; redirected to login carrying the return path.
    RedirectedToLogin {
        /// Consecutive redirect number recorded in tab storage (1-based).
        attempt: u32,
    },
    /// Redirect loop detected; persistent storage was cleared and the
    /// user sent to login without a return path.
    RecoveredFromLoop,
}

/// Paths the guard treats specially, plus the profile refresh interval.
#[derive(Debug, Clone)]
pub struct GuardSettings {
    /// Login page path, the redirect target.
    pub login_path: String,
    /// Onboarding page path, exempt from gating.
    pub onboarding_path: String,
    /// Age after which the cached user summary is refreshed on demand.
    pub profile_refresh: std::time::Duration,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            login_path: "/login.html".to_owned(),
            onboarding_path: "/onboarding.html".to_owned(),
            profile_refresh: DEFAULT_PROFILE_REFRESH,
        }
    }
}

struct CachedProfile {
    summary: UserSummary,
    refreshed_at: DateTime<Utc>,
}

/// Gate keeping dashboard pages behind a valid session.
pub struct SessionGuard<S, T, N> {
    tokens: TokenStore<S>,
    persistent: Arc<S>,
    tab: Arc<T>,
    profile: Arc<dyn ProfileGateway>,
    navigator: Arc<N>,
    clock: Arc<dyn Clock>,
    settings: GuardSettings,
    refresh_after: TimeDelta,
    user: Mutex<Option<CachedProfile>>,
}

impl<S, T, N> SessionGuard<S, T, N>
where
    S: KeyValueStore,
    T: KeyValueStore,
    N: Navigator,
{
    /// Build a guard, hydrating the user summary from the legacy
    /// `ifi_current_user` blob when one is stored.
    ///
    /// A hydrated summary is marked stale so the first
    /// [`Self::current_user`] call attempts a refresh, falling back to
    /// the blob when the backend is unreachable.
    pub fn new(
        persistent: Arc<S>,
        tab: Arc<T>,
        profile: Arc<dyn ProfileGateway>,
        navigator: Arc<N>,
        clock: Arc<dyn Clock>,
        settings: GuardSettings,
    ) -> Self {
        let user = persistent.get(CURRENT_USER_KEY).and_then(|raw| {
            match serde_json::from_str::<UserSummary>(&raw) {
                Ok(summary) => Some(CachedProfile {
                    summary,
                    refreshed_at: DateTime::<Utc>::MIN_UTC,
                }),
                Err(error) => {
                    warn!(error = %error, "stored user summary is malformed; ignoring it");
                    None
                }
            }
        });
        let refresh_after =
            TimeDelta::from_std(settings.profile_refresh).unwrap_or(TimeDelta::MAX);

        Self {
            tokens: TokenStore::new(Arc::clone(&persistent)),
            persistent,
            tab,
            profile,
            navigator,
            clock,
            settings,
            refresh_after,
            user: Mutex::new(user),
        }
    }

    /// True iff a session token and a cached user summary are both present.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.token().is_some() && self.lock_user().is_some()
    }

    /// Whether the signed-in user holds at least the given tier.
    ///
    /// Pure predicate; locking and unlocking UI elements is the caller's
    /// concern.
    pub fn has_subscription(&self, tier: SubscriptionTier) -> bool {
        self.tokens.token().is_some()
            && self
                .lock_user()
                .as_ref()
                .is_some_and(|cached| cached.summary.subscription_tier >= tier)
    }

    /// Current user summary, refreshing a stale one from the profile
    /// endpoint on demand.
    ///
    /// Refresh failures are logged and swallowed; the stale summary is
    /// returned instead.
    ///
    /// # Errors
    ///
    /// [`CoreError::Auth`] when no token is stored or no summary has
    /// ever been cached.
    pub async fn current_user(&self) -> Result<UserSummary, CoreError> {
        let token = self
            .tokens
            .token()
            .ok_or_else(|| CoreError::auth("no session token stored"))?;

        let (summary, refreshed_at) = {
            let cached = self.lock_user();
            let cached = cached
                .as_ref()
                .ok_or_else(|| CoreError::auth("no user summary cached"))?;
            (cached.summary.clone(), cached.refreshed_at)
        };

        if self.clock.utc() - refreshed_at < self.refresh_after {
            return Ok(summary);
        }

        match self.profile.fetch_profile(&token).await {
            Ok(fresh) => {
                self.store_profile(fresh.clone());
                Ok(fresh)
            }
            Err(error) => {
                warn!(error = %error, "profile refresh failed; keeping stale summary");
                Ok(summary)
            }
        }
    }

    /// Refresh the cached user summary unconditionally.
    ///
    /// Used by the periodic refresh task; failures are logged and
    /// swallowed, never surfaced to callers.
    pub async fn refresh_profile(&self) {
        let Some(token) = self.tokens.token() else {
            debug!("profile refresh skipped: no session token");
            return;
        };
        match self.profile.fetch_profile(&token).await {
            Ok(fresh) => self.store_profile(fresh),
            Err(error) => warn!(error = %error, "background profile refresh failed"),
        }
    }

    /// Run the page-entry algorithm once, before any page logic.
    ///
    /// Login and onboarding pages skip all checks. Authenticated entry
    /// resets the loop-detection state. Unauthenticated entry increments
    /// the tab-scoped redirect count and redirects to login with the
    /// original path percent-encoded in a `redirect` query parameter; on
    /// the third consecutive attempt the guard assumes a redirect loop,
    /// clears all persistent client storage, and redirects bare.
    pub fn enforce_page_entry(&self) -> PageEntry {
        let path = self.navigator.current_path();
        if path_matches(&path, &self.settings.login_path) {
            return PageEntry::SkippedLoginPage;
        }
        if path_matches(&path, &self.settings.onboarding_path) {
            return PageEntry::SkippedOnboardingPage;
        }

        if self.is_authenticated() {
            self.tab.set(REDIRECT_COUNT_KEY, "0");
            self.tab.remove(LOGIN_REDIRECT_CHECK_KEY);
            return PageEntry::Allowed;
        }

        let count = self
            .tab
            .get(REDIRECT_COUNT_KEY)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0);

        if count < REDIRECT_LIMIT {
            let attempt = count + 1;
            self.tab.set(REDIRECT_COUNT_KEY, &attempt.to_string());
            self.tab.set(LOGIN_REDIRECT_CHECK_KEY, "1");
            let query: String = form_urlencoded::Serializer::new(String::new())
                .append_pair("redirect", &path)
                .finish();
            let target = format!("{}?{query}", self.settings.login_path);
            debug!(%path, attempt, "unauthenticated access; redirecting to login");
            self.navigator.navigate(&target);
            PageEntry::RedirectedToLogin { attempt }
        } else {
            warn!(count, "redirect loop detected; clearing client storage");
            self.persistent.clear();
            self.tab.set(REDIRECT_COUNT_KEY, "0");
            self.tab.remove(LOGIN_REDIRECT_CHECK_KEY);
            self.navigator.navigate(&self.settings.login_path);
            PageEntry::RecoveredFromLoop
        }
    }

    /// Clear the persisted session and navigate to login.
    ///
    /// Callers confirm the action with the user first; the guard only
    /// implements the confirm-then-clear convention's clearing half.
    pub fn logout(&self) {
        self.persistent.remove(super::token_store::ACCESS_TOKEN_KEY);
        self.persistent.remove(CURRENT_USER_KEY);
        *self.lock_user() = None;
        self.navigator.navigate(&self.settings.login_path);
    }

    fn store_profile(&self, summary: UserSummary) {
        if let Ok(raw) = serde_json::to_string(&summary) {
            self.persistent.set(CURRENT_USER_KEY, &raw);
        }
        *self.lock_user() = Some(CachedProfile {
            summary,
            refreshed_at: self.clock.utc(),
        });
    }

    fn lock_user(&self) -> MutexGuard<'_, Option<CachedProfile>> {
        match self.user.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<S, T, N> SessionGuard<S, T, N>
where
    S: KeyValueStore + 'static,
    T: KeyValueStore + 'static,
    N: Navigator + 'static,
{
    /// Spawn the periodic profile refresh task.
    ///
    /// The task runs for the lifetime of the page; no stop signal is
    /// exposed and teardown happens only at page unload, matching the
    /// browser behaviour this core models.
    pub fn spawn_profile_refresh(
        self: &Arc<Self>,
        every: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately; skip it so the
            // refresh cadence starts one interval after page load.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                guard.refresh_profile().await;
            }
        })
    }
}

/// Whether the current location refers to the given page path.
///
/// Matches both exact paths and paths nested under a site prefix, e.g.
/// `/app/login.html` against `/login.html`.
fn path_matches(current: &str, page: &str) -> bool {
    current == page || current.ends_with(page)
}
