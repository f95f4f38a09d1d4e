//! Behaviour tests for the session guard: page-entry gating, the
//! redirect-loop breaker, logout, and profile refresh.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use client_core::domain::ports::KeyValueStore;
use client_core::domain::session_guard::{
    CURRENT_USER_KEY, GuardSettings, LOGIN_REDIRECT_CHECK_KEY, PageEntry, REDIRECT_COUNT_KEY,
    SessionGuard,
};
use client_core::domain::token_store::ACCESS_TOKEN_KEY;
use client_core::domain::user::{SubscriptionTier, UserSummary};
use client_core::outbound::MemoryStorage;
use client_core::test_support::{
    MutableClock, RecordingNavigator, StubProfileGateway, init_tracing,
};
use client_core::CoreError;
use uuid::Uuid;

struct Fixture {
    persistent: Arc<MemoryStorage>,
    tab: Arc<MemoryStorage>,
    navigator: Arc<RecordingNavigator>,
    profile: Arc<StubProfileGateway>,
    clock: Arc<MutableClock>,
}

fn summary(tier: SubscriptionTier) -> UserSummary {
    UserSummary {
        id: Uuid::from_u128(7),
        username: "ada".to_owned(),
        email: Some("ada@example.test".to_owned()),
        subscription_tier: tier,
    }
}

impl Fixture {
    fn new(path: &str) -> Self {
        init_tracing();
        Self {
            persistent: Arc::new(MemoryStorage::new()),
            tab: Arc::new(MemoryStorage::new()),
            navigator: Arc::new(RecordingNavigator::at(path)),
            profile: Arc::new(StubProfileGateway::serving(summary(SubscriptionTier::Plus))),
            clock: Arc::new(MutableClock::new(
                Utc.with_ymd_and_hms(2026, 8, 25, 9, 0, 0).single().expect("valid instant"),
            )),
        }
    }

    fn signed_in(path: &str) -> Self {
        let fixture = Self::new(path);
        fixture.persistent.set(ACCESS_TOKEN_KEY, "tok-1");
        fixture.persistent.set(
            CURRENT_USER_KEY,
            &serde_json::to_string(&summary(SubscriptionTier::Plus)).expect("blob encodes"),
        );
        fixture
    }

    fn guard(&self) -> Arc<SessionGuard<MemoryStorage, MemoryStorage, RecordingNavigator>> {
        Arc::new(SessionGuard::new(
            Arc::clone(&self.persistent),
            Arc::clone(&self.tab),
            Arc::clone(&self.profile) as Arc<dyn client_core::domain::ports::ProfileGateway>,
            Arc::clone(&self.navigator),
            Arc::clone(&self.clock) as Arc<dyn mockable::Clock>,
            GuardSettings::default(),
        ))
    }
}

#[test]
fn login_and_onboarding_pages_skip_all_checks() {
    let fixture = Fixture::new("/login.html");
    let guard = fixture.guard();
    assert_eq!(guard.enforce_page_entry(), PageEntry::SkippedLoginPage);

    fixture.navigator.set_path("/onboarding.html");
    assert_eq!(guard.enforce_page_entry(), PageEntry::SkippedOnboardingPage);
    assert!(
        fixture.navigator.navigations().is_empty(),
        "exempt pages must not be redirected"
    );
}

#[test]
fn three_unauthenticated_loads_trip_the_loop_breaker() {
    let fixture = Fixture::new("/budget.html");
    fixture.persistent.set("ifi_theme", "dark");
    let guard = fixture.guard();

    assert_eq!(
        guard.enforce_page_entry(),
        PageEntry::RedirectedToLogin { attempt: 1 }
    );
    assert_eq!(fixture.tab.get(REDIRECT_COUNT_KEY).as_deref(), Some("1"));
    assert!(fixture.tab.get(LOGIN_REDIRECT_CHECK_KEY).is_some());

    assert_eq!(
        guard.enforce_page_entry(),
        PageEntry::RedirectedToLogin { attempt: 2 }
    );
    assert_eq!(fixture.tab.get(REDIRECT_COUNT_KEY).as_deref(), Some("2"));

    assert_eq!(guard.enforce_page_entry(), PageEntry::RecoveredFromLoop);
    assert_eq!(
        fixture.tab.get(REDIRECT_COUNT_KEY).as_deref(),
        Some("0"),
        "loop recovery must reset the count"
    );
    assert!(
        fixture.persistent.get("ifi_theme").is_none(),
        "loop recovery must clear persistent storage"
    );

    let navigations = fixture.navigator.navigations();
    assert_eq!(navigations.len(), 3);
    assert_eq!(
        navigations.first().map(String::as_str),
        Some("/login.html?redirect=%2Fbudget.html"),
        "return path must travel percent-encoded"
    );
    assert_eq!(
        navigations.last().map(String::as_str),
        Some("/login.html"),
        "loop recovery must not carry a return path"
    );
}

#[test]
fn authenticated_entry_resets_loop_state() {
    let fixture = Fixture::signed_in("/debt.html");
    fixture.tab.set(REDIRECT_COUNT_KEY, "1");
    fixture.tab.set(LOGIN_REDIRECT_CHECK_KEY, "1");
    let guard = fixture.guard();

    assert_eq!(guard.enforce_page_entry(), PageEntry::Allowed);
    assert_eq!(fixture.tab.get(REDIRECT_COUNT_KEY).as_deref(), Some("0"));
    assert!(fixture.tab.get(LOGIN_REDIRECT_CHECK_KEY).is_none());
    assert!(fixture.navigator.navigations().is_empty());
}

#[test]
fn garbled_redirect_count_is_treated_as_zero() {
    let fixture = Fixture::new("/goals.html");
    fixture.tab.set(REDIRECT_COUNT_KEY, "banana");
    let guard = fixture.guard();

    assert_eq!(
        guard.enforce_page_entry(),
        PageEntry::RedirectedToLogin { attempt: 1 }
    );
}

#[test]
fn logout_clears_session_and_returns_to_login() {
    let fixture = Fixture::signed_in("/networth.html");
    let guard = fixture.guard();
    assert!(guard.is_authenticated());

    guard.logout();
    assert!(!guard.is_authenticated());
    assert!(fixture.persistent.get(ACCESS_TOKEN_KEY).is_none());
    assert!(fixture.persistent.get(CURRENT_USER_KEY).is_none());
    assert_eq!(
        fixture.navigator.last_navigation().as_deref(),
        Some("/login.html")
    );
}

#[test]
fn subscription_predicate_orders_tiers() {
    let fixture = Fixture::signed_in("/budget.html");
    let guard = fixture.guard();

    assert!(guard.has_subscription(SubscriptionTier::Free));
    assert!(guard.has_subscription(SubscriptionTier::Plus));
    assert!(!guard.has_subscription(SubscriptionTier::Premium));

    fixture.persistent.remove(ACCESS_TOKEN_KEY);
    assert!(
        !guard.has_subscription(SubscriptionTier::Free),
        "a summary without a token is not a valid session"
    );
}

#[tokio::test]
async fn current_user_without_token_is_an_auth_error() {
    let fixture = Fixture::new("/budget.html");
    let guard = fixture.guard();

    let error = guard.current_user().await.expect_err("must fail");
    assert!(matches!(error, CoreError::Auth { .. }));
}

#[tokio::test]
async fn hydrated_summary_survives_a_failed_refresh() {
    let fixture = Fixture::signed_in("/budget.html");
    fixture.profile.set_response(Err(
        client_core::domain::ports::GatewayError::transport("backend down"),
    ));
    let guard = fixture.guard();

    let user = guard.current_user().await.expect("stale summary is fine");
    assert_eq!(user.username, "ada");
    assert_eq!(fixture.profile.calls(), 1, "a refresh must have been tried");
}

#[tokio::test]
async fn fresh_summary_skips_the_profile_endpoint() {
    let fixture = Fixture::signed_in("/budget.html");
    let guard = fixture.guard();

    // Hydrated blobs are stale, so the first call refreshes and persists.
    let first = guard.current_user().await.expect("refresh succeeds");
    assert_eq!(first.subscription_tier, SubscriptionTier::Plus);
    assert_eq!(fixture.profile.calls(), 1);
    assert!(
        fixture
            .persistent
            .get(CURRENT_USER_KEY)
            .is_some_and(|raw| raw.contains("plus")),
        "refreshed summary must be persisted for the next page load"
    );

    guard.current_user().await.expect("cached summary");
    assert_eq!(fixture.profile.calls(), 1, "fresh summary needs no fetch");

    fixture.clock.advance_seconds(301);
    guard.current_user().await.expect("stale summary refreshes");
    assert_eq!(fixture.profile.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_task_polls_the_profile_endpoint() {
    let fixture = Fixture::signed_in("/budget.html");
    let guard = fixture.guard();

    let handle = guard.spawn_profile_refresh(std::time::Duration::from_secs(300));
    tokio::time::sleep(std::time::Duration::from_secs(301)).await;

    assert!(
        fixture.profile.calls() >= 1,
        "the timer must have refreshed at least once"
    );
    // No stop signal exists; tests stand in for page unload.
    handle.abort();
}

#[tokio::test]
async fn background_refresh_swallows_failures() {
    let fixture = Fixture::signed_in("/budget.html");
    fixture.profile.set_response(Err(
        client_core::domain::ports::GatewayError::status(503, "unavailable"),
    ));
    let guard = fixture.guard();

    guard.refresh_profile().await;
    assert_eq!(fixture.profile.calls(), 1);
    assert!(guard.is_authenticated(), "failure must not drop the session");
}
