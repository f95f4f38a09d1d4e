//! Reqwest-backed backend gateway adapter.
//!
//! This adapter owns transport details only: bearer authentication,
//! timeout and HTTP error mapping, and JSON decoding into the wire
//! payloads the domain normalises.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::onboarding::OnboardingPayload;
use crate::domain::ports::{GatewayError, OnboardingGateway, ProfileGateway};
use crate::domain::user::UserSummary;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const ONBOARDING_ENDPOINT: &str = "onboarding/data";
const PROFILE_ENDPOINT: &str = "users/me";

/// Errors raised while constructing the HTTP gateway.
#[derive(Debug, Error)]
pub enum HttpGatewayBuildError {
    /// The configured base URL did not parse.
    #[error("invalid API base URL {base}: {source}")]
    InvalidBaseUrl {
        base: String,
        #[source]
        source: url::ParseError,
    },
    /// The reqwest client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
}

/// Backend gateway performing authenticated GET requests against the
/// onboarding-data and user-profile endpoints.
#[derive(Debug)]
pub struct HttpGateway {
    client: Client,
    onboarding_url: Url,
    profile_url: Url,
}

impl HttpGateway {
    /// Build a gateway from the API base URL with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpGatewayBuildError`] when the base URL is invalid or
    /// the client cannot be constructed.
    pub fn new(api_base_url: &str) -> Result<Self, HttpGatewayBuildError> {
        Self::with_timeout(api_base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a gateway with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpGatewayBuildError`] when the base URL is invalid or
    /// the client cannot be constructed.
    pub fn with_timeout(
        api_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, HttpGatewayBuildError> {
        let base = parse_base(api_base_url)?;
        let onboarding_url = join_endpoint(&base, ONBOARDING_ENDPOINT, api_base_url)?;
        let profile_url = join_endpoint(&base, PROFILE_ENDPOINT, api_base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| HttpGatewayBuildError::Client { source })?;

        Ok(Self {
            client,
            onboarding_url,
            profile_url,
        })
    }

    async fn get_json<P: DeserializeOwned>(
        &self,
        url: &Url,
        token: &str,
    ) -> Result<P, GatewayError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        serde_json::from_slice(body.as_ref())
            .map_err(|error| GatewayError::decode(format!("invalid JSON payload: {error}")))
    }
}

#[async_trait]
impl OnboardingGateway for HttpGateway {
    async fn fetch_onboarding(&self, token: &str) -> Result<OnboardingPayload, GatewayError> {
        self.get_json(&self.onboarding_url, token).await
    }
}

#[async_trait]
impl ProfileGateway for HttpGateway {
    async fn fetch_profile(&self, token: &str) -> Result<UserSummary, GatewayError> {
        self.get_json(&self.profile_url, token).await
    }
}

/// Parse the base URL, appending a trailing slash so relative joins
/// extend the path instead of replacing its last segment.
fn parse_base(api_base_url: &str) -> Result<Url, HttpGatewayBuildError> {
    let normalised = if api_base_url.ends_with('/') {
        api_base_url.to_owned()
    } else {
        format!("{api_base_url}/")
    };
    Url::parse(&normalised).map_err(|source| HttpGatewayBuildError::InvalidBaseUrl {
        base: api_base_url.to_owned(),
        source,
    })
}

fn join_endpoint(base: &Url, endpoint: &str, raw_base: &str) -> Result<Url, HttpGatewayBuildError> {
    base.join(endpoint)
        .map_err(|source| HttpGatewayBuildError::InvalidBaseUrl {
            base: raw_base.to_owned(),
            source,
        })
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    GatewayError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GatewayError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::unauthorised(message),
        _ => GatewayError::status(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network mapping helpers.

    use super::*;
    use rstest::rstest;

    #[test]
    fn base_without_trailing_slash_keeps_its_path() {
        let gateway = HttpGateway::new("http://localhost:8000/api").expect("gateway should build");
        assert_eq!(
            gateway.onboarding_url.as_str(),
            "http://localhost:8000/api/onboarding/data"
        );
        assert_eq!(
            gateway.profile_url.as_str(),
            "http://localhost:8000/api/users/me"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let error = HttpGateway::new("not a url").expect_err("build must fail");
        assert!(matches!(error, HttpGatewayBuildError::InvalidBaseUrl { .. }));
    }

    #[rstest]
    #[case::unauthorised(StatusCode::UNAUTHORIZED)]
    #[case::forbidden(StatusCode::FORBIDDEN)]
    fn auth_statuses_map_to_unauthorised(#[case] status: StatusCode) {
        let error = map_status_error(status, b"{\"detail\":\"bad token\"}");
        assert!(matches!(error, GatewayError::Unauthorised { .. }));
    }

    #[test]
    fn other_statuses_keep_their_code() {
        let error = map_status_error(StatusCode::INTERNAL_SERVER_ERROR, b"");
        assert!(matches!(error, GatewayError::Status { status: 500, .. }));
    }

    #[test]
    fn long_bodies_are_truncated_in_previews() {
        let body = "x".repeat(500);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= 163);
    }
}
