use thiserror::Error;

/// Errors returned by the WING and retail API clients.
#[derive(Debug, Error)]
pub enum WingError {
    /// No session token is available for the vendor domain. The user must
    /// sign in to WING before any seller API call can succeed.
    #[error("not signed in to WING — no session token for the vendor domain")]
    Unauthenticated,

    /// HTTP 429 from the search endpoint. Surfaced with its own message so
    /// the host can tell the user to slow down rather than retry blindly.
    #[error("WING search rate limited (HTTP 429) — wait before retrying")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The search endpoint returned a non-success status.
    #[error("WING search failed with HTTP {status}: {body}")]
    SearchFailed { status: u16, body: String },

    /// A single-item lookup succeeded but no record matched the identifier.
    /// A normal, expected outcome — the item settles as having no data.
    #[error("no WING record matches item {item_id}")]
    EmptyResult { item_id: String },

    /// Non-success status from an endpoint without a dedicated mapping
    /// (quantity-info, vendor-return).
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl WingError {
    /// Whether this error means the vendor session is missing or expired,
    /// so the host should surface a login prompt instead of an error toast.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            WingError::Unauthenticated
                | WingError::SearchFailed {
                    status: 401 | 403,
                    ..
                }
        )
    }
}
