use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

pub const WARDROBE_DEFAULT_BASE: &str = "http://localhost:8000";

/// Environment variable consulted for the default API base URL.
pub const ENV_API_BASE: &str = "WARDROBE_API_BASE";

/// Header carrying the anti-forgery token on mutating requests.
pub const HDR_CSRF_TOKEN: &str = "x-csrf-token";
/// Per-request correlation identifier header.
pub const HDR_REQUEST_ID: &str = "x-request-id";

/// Every request gets a fixed ceiling; expiry surfaces as a transport error.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration seam for the client.
///
/// Implementations provide the base URL, static headers, and the request
/// timeout. Credential-derived headers (bearer token, CSRF token) are not
/// part of the config; the client attaches those per attempt from the
/// [`CredentialStore`](crate::credentials::CredentialStore).
pub trait Config: Clone + Send + Sync + 'static {
    /// Resolves an endpoint path against the API base.
    fn url(&self, path: &str) -> String;
    /// Static headers attached to every request.
    fn headers(&self) -> HeaderMap;
    /// Per-request timeout ceiling.
    fn timeout(&self) -> Duration;
}

/// Default configuration for the wardrobe API.
///
/// The base URL is taken from `WARDROBE_API_BASE` when set, falling back to
/// the local development server.
#[derive(Debug, Clone)]
pub struct WardrobeConfig {
    api_base: String,
    timeout: Duration,
}

impl Default for WardrobeConfig {
    fn default() -> Self {
        let api_base =
            std::env::var(ENV_API_BASE).unwrap_or_else(|_| WARDROBE_DEFAULT_BASE.into());
        Self {
            api_base,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl WardrobeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl Config for WardrobeConfig {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn headers(&self) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(ACCEPT, HeaderValue::from_static("application/json"));
        h
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
