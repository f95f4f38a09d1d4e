//! Shared test doubles for session-core tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use tracing_subscriber::EnvFilter;

use crate::domain::onboarding::OnboardingPayload;
use crate::domain::ports::{GatewayError, Navigator, OnboardingGateway, ProfileGateway};
use crate::domain::user::UserSummary;

/// Initialise a compact tracing subscriber for tests; repeated calls are
/// harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .try_init();
}

/// Clock whose current instant tests can move forward.
pub struct MutableClock {
    now: Mutex<DateTime<Utc>>,
}

impl MutableClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Advance the clock by a standard duration.
    ///
    /// # Panics
    ///
    /// Panics when `delta` exceeds the chrono range.
    pub fn advance(&self, delta: Duration) {
        let delta = TimeDelta::from_std(delta)
            .unwrap_or_else(|error| panic!("clock advance out of range ({delta:?}): {error}"));
        *lock(&self.now) += delta;
    }

    /// Advance the clock by whole seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.now) += TimeDelta::seconds(seconds);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// Navigator recording every redirect and serving a settable path.
#[derive(Debug)]
pub struct RecordingNavigator {
    path: Mutex<String>,
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create a navigator currently at `path`.
    pub fn at(path: &str) -> Self {
        Self {
            path: Mutex::new(path.to_owned()),
            visited: Mutex::new(Vec::new()),
        }
    }

    /// Move the simulated page to `path` without recording a redirect.
    pub fn set_path(&self, path: &str) {
        *lock(&self.path) = path.to_owned();
    }

    /// Every location navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.visited).clone()
    }

    /// The most recent navigation target, if any.
    pub fn last_navigation(&self) -> Option<String> {
        lock(&self.visited).last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        lock(&self.path).clone()
    }

    fn navigate(&self, location: &str) {
        lock(&self.visited).push(location.to_owned());
    }
}

/// Onboarding gateway serving a canned response and counting calls.
pub struct StubOnboardingGateway {
    response: Mutex<Result<OnboardingPayload, GatewayError>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl StubOnboardingGateway {
    /// Always serve the given payload.
    pub fn serving(payload: OnboardingPayload) -> Self {
        Self {
            response: Mutex::new(Ok(payload)),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Always fail with the given error.
    pub fn failing(error: GatewayError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep for `delay` inside each fetch, widening the window in which
    /// concurrent calls overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the canned response.
    pub fn set_response(&self, response: Result<OnboardingPayload, GatewayError>) {
        *lock(&self.response) = response;
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OnboardingGateway for StubOnboardingGateway {
    async fn fetch_onboarding(&self, _token: &str) -> Result<OnboardingPayload, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.response).clone()
    }
}

/// Profile gateway serving a canned response and counting calls.
pub struct StubProfileGateway {
    response: Mutex<Result<UserSummary, GatewayError>>,
    calls: AtomicUsize,
}

impl StubProfileGateway {
    /// Always serve the given summary.
    pub fn serving(summary: UserSummary) -> Self {
        Self {
            response: Mutex::new(Ok(summary)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail with the given error.
    pub fn failing(error: GatewayError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the canned response.
    pub fn set_response(&self, response: Result<UserSummary, GatewayError>) {
        *lock(&self.response) = response;
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileGateway for StubProfileGateway {
    async fn fetch_profile(&self, _token: &str) -> Result<UserSummary, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.response).clone()
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
