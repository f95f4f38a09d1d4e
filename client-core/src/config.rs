//! Core settings loaded via OrthoConfig.
//!
//! Every knob has a code-side default so a page can construct a context
//! with `CoreSettings::default()` and no environment at all.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_LOGIN_PATH: &str = "/login.html";
const DEFAULT_ONBOARDING_PATH: &str = "/onboarding.html";
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_PROFILE_REFRESH_SECONDS: u64 = 300;
const DEFAULT_BOOTSTRAP_POLL_MILLIS: u64 = 50;
const DEFAULT_BOOTSTRAP_MAX_WAIT_MILLIS: u64 = 5_000;

/// Configuration values controlling the session core.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "IFI")]
pub struct CoreSettings {
    /// Base URL of the backend API.
    pub api_base_url: Option<String>,
    /// Login page path, the guard's redirect target.
    pub login_path: Option<String>,
    /// Onboarding page path, exempt from gating.
    pub onboarding_path: Option<String>,
    /// Onboarding cache TTL in seconds.
    pub cache_ttl_seconds: Option<u64>,
    /// User-profile refresh interval in seconds.
    pub profile_refresh_seconds: Option<u64>,
    /// Bootstrap readiness poll interval in milliseconds.
    pub bootstrap_poll_millis: Option<u64>,
    /// Bootstrap readiness wait cap in milliseconds.
    pub bootstrap_max_wait_millis: Option<u64>,
}

impl CoreSettings {
    /// Backend API base URL, falling back to the local default.
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    /// Login page path.
    pub fn login_path(&self) -> &str {
        self.login_path.as_deref().unwrap_or(DEFAULT_LOGIN_PATH)
    }

    /// Onboarding page path.
    pub fn onboarding_path(&self) -> &str {
        self.onboarding_path.as_deref().unwrap_or(DEFAULT_ONBOARDING_PATH)
    }

    /// Onboarding cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// User-profile refresh interval.
    pub fn profile_refresh(&self) -> Duration {
        Duration::from_secs(
            self.profile_refresh_seconds
                .unwrap_or(DEFAULT_PROFILE_REFRESH_SECONDS),
        )
    }

    /// Bootstrap readiness poll interval.
    pub fn bootstrap_poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.bootstrap_poll_millis
                .unwrap_or(DEFAULT_BOOTSTRAP_POLL_MILLIS),
        )
    }

    /// Bootstrap readiness wait cap.
    pub fn bootstrap_max_wait(&self) -> Duration {
        Duration::from_millis(
            self.bootstrap_max_wait_millis
                .unwrap_or(DEFAULT_BOOTSTRAP_MAX_WAIT_MILLIS),
        )
    }
}
