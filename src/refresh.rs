//! Single-flight token refresh.
//!
//! N requests failing with expired tokens at the same time share one call to
//! the refresh endpoint. Without coalescing, a server that invalidates the
//! prior refresh token on rotation would fail all but the first concurrent
//! refresh and cascade into a forced logout.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::request_id;
use crate::config::{Config, HDR_REQUEST_ID};
use crate::credentials::CredentialStore;
use crate::error::{Error, classify};
use crate::types::auth::{RefreshRequest, TokenGrant};

pub(crate) const REFRESH_PATH: &str = "/api/auth/refresh";

type RefreshFuture = Shared<BoxFuture<'static, Result<(), Arc<Error>>>>;

/// Coalesces concurrent refresh attempts onto one in-flight call.
#[derive(Clone, Default)]
pub(crate) struct RefreshCoordinator {
    slot: Arc<Mutex<Option<RefreshFuture>>>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator").finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Runs the refresh protocol, joining an in-flight refresh if one exists.
    ///
    /// On failure the credential store has already been cleared; every joiner
    /// observes [`Error::SessionExpired`].
    pub(crate) async fn refresh<C: Config>(
        &self,
        http: &reqwest::Client,
        config: &C,
        store: &CredentialStore,
    ) -> Result<(), Error> {
        let fut = {
            let mut slot = self.slot.lock().await;
            // A completed flight left in the slot counts as absent. Any task
            // awaiting the shared future can be dropped before it gets to
            // clean up, so the slot must never gate a new flight on one that
            // already finished.
            match slot.as_ref().filter(|f| f.peek().is_none()) {
                Some(existing) => {
                    debug!("joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    let fut = perform_refresh(http.clone(), config.clone(), store.clone())
                        .boxed()
                        .shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let outcome = fut.await;
        // Whichever task finishes first clears the completed flight, unless a
        // newer one has already taken the slot.
        {
            let mut slot = self.slot.lock().await;
            if slot.as_ref().is_some_and(|f| f.peek().is_some()) {
                *slot = None;
            }
        }
        outcome.map_err(|_| Error::SessionExpired)
    }
}

async fn perform_refresh<C: Config>(
    http: reqwest::Client,
    config: C,
    store: CredentialStore,
) -> Result<(), Arc<Error>> {
    let Some(refresh_token) = store.refresh_token() else {
        warn!("no refresh token available, clearing session");
        store.clear_all();
        return Err(Arc::new(Error::SessionExpired));
    };

    match request_grant(&http, &config, refresh_token).await {
        Ok(grant) => {
            store.set_session(grant.access_token, grant.refresh_token, grant.csrf_token);
            info!("session tokens rotated");
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, "token refresh failed, clearing session");
            store.clear_all();
            Err(Arc::new(err))
        }
    }
}

// Deliberately bypasses the interceptor chain: no bearer token, no CSRF
// header, no recovery. A failing refresh must not trigger another refresh.
// Only the correlation id is attached.
async fn request_grant<C: Config>(
    http: &reqwest::Client,
    config: &C,
    refresh_token: String,
) -> Result<TokenGrant, Error> {
    let response = http
        .post(config.url(REFRESH_PATH))
        .headers(config.headers())
        .header(HDR_REQUEST_ID, request_id())
        .json(&RefreshRequest { refresh_token })
        .send()
        .await?;

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(classify(status, &headers, &bytes));
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Serde(format!("{e}: {}", String::from_utf8_lossy(&bytes))))
}
