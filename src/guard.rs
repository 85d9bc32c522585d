//! Session-aware route guard.
//!
//! Gates protected UI on authentication state and CSRF readiness. CSRF
//! acquisition runs under a bounded backoff; exhaustion surfaces
//! [`GuardState::AwaitingCsrf`] as a recoverable state the caller may retry,
//! never an indefinite wait.

use tracing::warn;

use crate::client::Client;
use crate::config::Config;
use crate::retry;

/// Guard states, in the order a UI typically renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Initial state while [`SessionGuard::resolve`] is running.
    Checking,
    /// No access token; render the login redirect.
    Unauthenticated,
    /// Authenticated but no CSRF token could be acquired within the retry
    /// budget; state-changing UI stays blocked. Calling `resolve` again
    /// retries.
    AwaitingCsrf,
    /// Authenticated with a cached CSRF token; render protected content.
    Ready,
}

/// Decides whether protected content may render.
#[derive(Debug, Clone)]
pub struct SessionGuard<C: Config> {
    client: Client<C>,
    policy: backoff::ExponentialBackoff,
}

impl<C: Config> SessionGuard<C> {
    #[must_use]
    pub fn new(client: Client<C>) -> Self {
        Self {
            client,
            policy: retry::csrf_backoff(),
        }
    }

    /// Overrides the CSRF acquisition backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, policy: backoff::ExponentialBackoff) -> Self {
        self.policy = policy;
        self
    }

    /// Resolves the current guard state.
    ///
    /// A fresh CSRF token is always acquired, even when one is cached, so a
    /// remount revalidates against the server the way the original flow did.
    pub async fn resolve(&self) -> GuardState {
        if self.client.store().access_token().is_none() {
            return GuardState::Unauthenticated;
        }

        let acquire = || async {
            match self.client.csrf().fetch_csrf_token().await {
                Some(_) => Ok(()),
                None => Err(backoff::Error::transient(())),
            }
        };

        match backoff::future::retry(self.policy.clone(), acquire).await {
            Ok(()) => GuardState::Ready,
            Err(()) => {
                warn!("CSRF token unavailable after bounded retries");
                GuardState::AwaitingCsrf
            }
        }
    }
}
