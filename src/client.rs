use bytes::Bytes;
use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{Config, HDR_CSRF_TOKEN, HDR_REQUEST_ID};
use crate::credentials::CredentialStore;
use crate::csrf::CsrfManager;
use crate::error::{Error, classify};
use crate::refresh::RefreshCoordinator;

/// Wardrobe API client.
///
/// The client is generic over a [`Config`] implementation providing the base
/// URL and static headers, and owns the full session-management pipeline:
/// credential attachment, CSRF lifecycle, and recovery from rejected
/// credentials.
#[derive(Debug, Clone)]
pub struct Client<C: Config> {
    http: reqwest::Client,
    config: C,
    store: CredentialStore,
    csrf: CsrfManager<C>,
    refresh: RefreshCoordinator,
    cancel: Option<CancellationToken>,
}

impl Client<crate::config::WardrobeConfig> {
    /// Creates a client with default configuration and the given store.
    ///
    /// The base URL comes from `WARDROBE_API_BASE` when set.
    #[must_use]
    pub fn new(store: CredentialStore) -> Self {
        Self::with_config(crate::config::WardrobeConfig::new(), store)
    }
}

impl<C: Config> Client<C> {
    /// Creates a client with the given configuration and credential store.
    ///
    /// # Panics
    ///
    /// Panics if the reqwest client cannot be built.
    #[must_use]
    pub fn with_config(config: C, store: CredentialStore) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.timeout())
            .build()
            .expect("reqwest client");
        let csrf = CsrfManager::new(http.clone(), config.clone(), store.clone());
        Self {
            http,
            config,
            store,
            csrf,
            refresh: RefreshCoordinator::new(),
            cancel: None,
        }
    }

    /// Replaces the HTTP client with a custom one.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.csrf = CsrfManager::new(http.clone(), self.config.clone(), self.store.clone());
        self.http = http;
        self
    }

    /// Returns a handle scoped to a cancellation token.
    ///
    /// Requests issued through the returned handle abort with
    /// [`Error::Cancelled`] once the token fires. A component tears down by
    /// cancelling its token instead of leaking in-flight work.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        let mut scoped = self.clone();
        scoped.cancel = Some(token);
        scoped
    }

    /// The shared credential store.
    #[must_use]
    pub const fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// The CSRF token manager.
    #[must_use]
    pub const fn csrf(&self) -> &CsrfManager<C> {
        &self.csrf
    }

    /// The client's configuration.
    #[must_use]
    pub const fn config(&self) -> &C {
        &self.config
    }

    pub(crate) async fn get<O: DeserializeOwned>(&self, path: &str) -> Result<O, Error> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    pub(crate) async fn post<I, O>(&self, path: &str, body: &I) -> Result<O, Error>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn post_empty<O: DeserializeOwned>(&self, path: &str) -> Result<O, Error> {
        self.execute(Method::POST, path, None::<&()>).await
    }

    pub(crate) async fn put<I, O>(&self, path: &str, body: &I) -> Result<O, Error>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn refresh_session(&self) -> Result<(), Error> {
        self.refresh
            .refresh(&self.http, &self.config, &self.store)
            .await
    }

    async fn execute<I, O>(&self, method: Method, path: &str, body: Option<&I>) -> Result<O, Error>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let bytes = self.execute_raw(method, path, body).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Serde(format!("{e}: {}", String::from_utf8_lossy(&bytes))))
    }

    /// Sends a request through the full interceptor pipeline.
    ///
    /// Each attempt rebuilds the request so replays pick up rotated tokens
    /// and carry a fresh correlation id. Recovery budget per original
    /// request: one replay after token refresh, one replay after CSRF
    /// re-fetch (independent flags), unlimited rate-limit replays.
    async fn execute_raw<I: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&I>,
    ) -> Result<Bytes, Error> {
        let url = self.config.url(path);
        let mut refresh_retried = false;
        let mut csrf_retried = false;

        loop {
            let request = self.build_request(&method, &url, body)?;
            let response = self.send(request).await?;

            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;

            if status.is_success() {
                self.csrf.observe_rotation(&bytes);
                return Ok(bytes);
            }

            match classify(status, &headers, &bytes) {
                Error::AuthExpired(_) | Error::AuthInvalid(_) if !refresh_retried => {
                    refresh_retried = true;
                    debug!(%url, "stale access token, refreshing session");
                    self.refresh_session().await?;
                }
                Error::CsrfRejected(_) if !csrf_retried => {
                    csrf_retried = true;
                    debug!(%url, "CSRF rejection, re-fetching token");
                    // A failed fetch still replays once; the server's next
                    // rejection then propagates.
                    self.csrf.fetch_csrf_token().await;
                }
                Error::RateLimited { retry_after, .. } => {
                    debug!(%url, wait = ?retry_after, "rate limited, delaying replay");
                    self.pause(retry_after).await?;
                }
                Error::Forbidden(fault) => {
                    warn!(%url, "forbidden response, tearing down session");
                    self.store.clear_all();
                    return Err(Error::Forbidden(fault));
                }
                other => return Err(other),
            }
        }
    }

    fn build_request<I: Serialize>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&I>,
    ) -> Result<reqwest::Request, Error> {
        let mut builder = self
            .http
            .request(method.clone(), url)
            .headers(self.config.headers());

        if let Some(token) = self.store.access_token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        // GET is the only idempotent read this API uses; everything else is
        // state-changing and carries the anti-forgery token. A missing token
        // passes through rather than blocking on a fetch.
        if *method != Method::GET
            && let Some(csrf) = self.store.csrf_token()
        {
            builder = builder.header(HDR_CSRF_TOKEN, csrf);
        }
        builder = builder.header(HDR_REQUEST_ID, request_id());

        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }

    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, Error> {
        match &self.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => Err(Error::Cancelled),
                response = self.http.execute(request) => Ok(response?),
            },
            None => Ok(self.http.execute(request).await?),
        }
    }

    async fn pause(&self, duration: std::time::Duration) -> Result<(), Error> {
        match &self.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => Err(Error::Cancelled),
                () = tokio::time::sleep(duration) => Ok(()),
            },
            None => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }
}

/// Generates a short, practically-unique request correlation id.
///
/// No cryptographic requirement; a truncated v4 UUID is plenty for tracing.
pub(crate) fn request_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("req_{}", &id[..12])
}
