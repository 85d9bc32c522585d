use tracing::warn;

use crate::client::Client;
use crate::config::Config;
use crate::error::Error;
use crate::types::auth::{
    LoginRequest, RegisterRequest, RevokeResponse, SessionRecord, SessionsResponse, TokenGrant,
};

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const LOGOUT_PATH: &str = "/api/auth/logout";
const SESSIONS_PATH: &str = "/api/auth/sessions";

/// Authentication and session-management endpoints.
pub struct Auth<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Auth<'c, C> {
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Logs in and stores the issued token set.
    ///
    /// A CSRF token is fetched first and sent in the body, per the login
    /// contract; when the fetch fails the login is attempted without one and
    /// the server's verdict stands.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenGrant, Error> {
        let csrf_token = self.client.csrf().fetch_csrf_token().await;
        let req = LoginRequest {
            email: email.into(),
            password: password.into(),
            csrf_token,
        };
        let grant: TokenGrant = self.client.post(LOGIN_PATH, &req).await?;
        self.store_grant(&grant);
        Ok(grant)
    }

    /// Registers a new account and stores the issued token set.
    ///
    /// The CSRF token travels in the `X-CSRF-Token` header here (the
    /// interceptor attaches the cached one), not in the body.
    ///
    /// # Errors
    ///
    /// Returns an error if registration is rejected or the request fails.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenGrant, Error> {
        // Prime the cache so the interceptor has a token to attach.
        self.client.csrf().fetch_csrf_token().await;
        let req = RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        };
        let grant: TokenGrant = self.client.post(REGISTER_PATH, &req).await?;
        self.store_grant(&grant);
        Ok(grant)
    }

    /// Explicitly rotates the session tokens via the refresh protocol.
    ///
    /// Normally the response interceptor does this reactively; exposing it
    /// lets callers refresh ahead of a known-long operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionExpired`] if no refresh token is stored or the
    /// server rejects it; all credentials are cleared in that case.
    pub async fn refresh(&self) -> Result<(), Error> {
        self.client.refresh_session().await
    }

    /// Logs out. Best-effort on the wire: local credentials are cleared no
    /// matter what the server says, and a failed request only logs a warning.
    pub async fn logout(&self) {
        let result: Result<serde_json::Value, Error> = self.client.post_empty(LOGOUT_PATH).await;
        if let Err(err) = result {
            warn!(error = %err, "logout request failed, clearing local session anyway");
        }
        self.client.store().clear_all();
    }

    /// Lists the account's server-side sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn sessions(&self) -> Result<Vec<SessionRecord>, Error> {
        let response: SessionsResponse = self.client.get(SESSIONS_PATH).await?;
        Ok(response.sessions)
    }

    /// Revokes one server-side session by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the session does not exist or the request fails.
    pub async fn revoke_session(&self, session_id: &str) -> Result<RevokeResponse, Error> {
        self.client
            .post_empty(&format!("{SESSIONS_PATH}/{session_id}/revoke"))
            .await
    }

    fn store_grant(&self, grant: &TokenGrant) {
        self.client.store().set_session(
            grant.access_token.clone(),
            grant.refresh_token.clone(),
            grant.csrf_token.clone(),
        );
    }
}

impl<C: Config> Client<C> {
    /// Returns the authentication resource.
    #[must_use]
    pub const fn auth(&self) -> Auth<'_, C> {
        Auth::new(self)
    }
}
