//! HTTP client for the WING seller back-office APIs.
//!
//! Wraps `reqwest` with WING-specific auth and error handling: the session
//! XSRF token rides on every request, a missing token short-circuits to
//! [`WingError::Unauthenticated`], and non-success statuses map to typed
//! errors (429 gets its own rate-limit variant). Every call reflects the
//! current session state — no caching and no client-level retry; retry
//! policy belongs to the reconciliation orchestrator.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use rocketlens_core::AppConfig;

use crate::error::WingError;
use crate::types::{SearchResponse, WingProduct};

const SEARCH_PATH: &str = "tenants/rg/pre-matching/search";

/// Client for the WING seller APIs (keyword search, vendor return).
///
/// Use [`WingClient::new`] for production or [`WingClient::with_base_url`]
/// to point at a mock server in tests.
pub struct WingClient {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) session_token: Option<String>,
}

impl WingClient {
    /// Creates a client pointed at the configured WING base URL.
    ///
    /// # Errors
    ///
    /// Returns [`WingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`WingError::InvalidBaseUrl`] for an
    /// unparseable base URL.
    pub fn new(config: &AppConfig) -> Result<Self, WingError> {
        Self::with_base_url(
            &config.wing_base_url,
            config.session_token.clone(),
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`WingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`WingError::InvalidBaseUrl`] for an
    /// unparseable base URL.
    pub fn with_base_url(
        base_url: &str,
        session_token: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, WingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: exactly one trailing slash so joined paths land under
        // the base rather than replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| WingError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            session_token,
        })
    }

    /// Searches the pre-matching index by keyword.
    ///
    /// # Errors
    ///
    /// - [`WingError::Unauthenticated`] — no session token available.
    /// - [`WingError::RateLimited`] — HTTP 429.
    /// - [`WingError::SearchFailed`] — any other non-success status.
    /// - [`WingError::Http`] — network or TLS failure.
    /// - [`WingError::Deserialize`] — response body is not the expected shape.
    pub async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<WingProduct>, WingError> {
        let token = self.require_token()?;

        let mut url = self.base_url.join(SEARCH_PATH).map_err(|e| {
            WingError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            }
        })?;
        url.query_pairs_mut().append_pair("keyword", keyword);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header("x-xsrf-token", token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(WingError::RateLimited { retry_after_secs });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(WingError::SearchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed =
            serde_json::from_str::<SearchResponse>(&body).map_err(|e| WingError::Deserialize {
                context: format!("keyword search \"{keyword}\""),
                source: e,
            })?;

        Ok(parsed.result)
    }

    /// Looks up a single item: keyword search with the identifier, then an
    /// exact filter on `item_id`.
    ///
    /// # Errors
    ///
    /// - [`WingError::EmptyResult`] — the search succeeded but nothing
    ///   matched the identifier exactly (expected, low-severity outcome).
    /// - Everything [`Self::search_by_keyword`] returns.
    pub async fn fetch_single(&self, item_id: &str) -> Result<WingProduct, WingError> {
        let results = self.search_by_keyword(item_id).await?;
        results
            .into_iter()
            .find(|r| r.item_id.to_string() == item_id)
            .ok_or_else(|| WingError::EmptyResult {
                item_id: item_id.to_owned(),
            })
    }

    pub(crate) fn require_token(&self) -> Result<&str, WingError> {
        self.session_token
            .as_deref()
            .ok_or(WingError::Unauthenticated)
    }
}
