//! CSRF token lifecycle.
//!
//! The manager never propagates fetch failures: callers treat a missing token
//! as "not yet available" and the route guard blocks state-changing UI until
//! one arrives. It also watches successful response bodies for server-driven
//! rotation.

use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};

use crate::client::request_id;
use crate::config::{Config, HDR_REQUEST_ID};
use crate::credentials::CredentialStore;
use crate::error::{Error, classify};
use crate::types::auth::CsrfTokenResponse;

pub(crate) const CSRF_PATH: &str = "/api/auth/csrf";

/// Fetches and caches the anti-forgery token.
#[derive(Debug, Clone)]
pub struct CsrfManager<C: Config> {
    http: reqwest::Client,
    config: C,
    store: CredentialStore,
}

impl<C: Config> CsrfManager<C> {
    pub(crate) fn new(http: reqwest::Client, config: C, store: CredentialStore) -> Self {
        Self {
            http,
            config,
            store,
        }
    }

    /// Fetches a fresh CSRF token and caches it in the credential store.
    ///
    /// Returns `None` on any failure. The failure is logged, never
    /// propagated; the interceptor deliberately sends mutating requests
    /// without a token rather than blocking on this call, and the server's
    /// rejection drives recovery.
    pub async fn fetch_csrf_token(&self) -> Option<String> {
        match self.try_fetch().await {
            Ok(token) => {
                self.store.set_csrf(token.clone());
                debug!("CSRF token cached");
                Some(token)
            }
            Err(err) => {
                warn!(error = %err, "CSRF token fetch failed");
                None
            }
        }
    }

    async fn try_fetch(&self) -> Result<String, Error> {
        // Works both anonymously (login/register bootstrap) and with a
        // session; attach the bearer token when one exists.
        let mut builder = self
            .http
            .get(self.config.url(CSRF_PATH))
            .headers(self.config.headers())
            .header(HDR_REQUEST_ID, request_id());
        if let Some(token) = self.store.access_token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(classify(status, &headers, &bytes));
        }
        let body: CsrfTokenResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Serde(format!("{e}: {}", String::from_utf8_lossy(&bytes))))?;
        Ok(body.csrf_token)
    }

    /// Inspects a successful response body for a rotated `csrf_token` field
    /// and replaces the cached token when one is present.
    pub(crate) fn observe_rotation(&self, body: &[u8]) {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body)
            && let Some(token) = value.get("csrf_token").and_then(|t| t.as_str())
        {
            debug!("server rotated CSRF token");
            self.store.set_csrf(token);
        }
    }
}
