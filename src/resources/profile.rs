use crate::client::Client;
use crate::config::Config;
use crate::error::Error;
use crate::types::profile::{ProfileUpdate, ProfileUpdateResponse, UserProfile};

const PROFILE_PATH: &str = "/api/profile";

/// The authenticated user's profile.
///
/// Fetching the profile doubles as session validation at startup: a stored
/// access token is only trusted once this endpoint accepts it.
pub struct Profile<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Profile<'c, C> {
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Fetches the current user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is invalid or the request fails.
    pub async fn get(&self) -> Result<UserProfile, Error> {
        self.client.get(PROFILE_PATH).await
    }

    /// Applies a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the request fails.
    pub async fn update(&self, update: &ProfileUpdate) -> Result<UserProfile, Error> {
        let response: ProfileUpdateResponse = self.client.put(PROFILE_PATH, update).await?;
        Ok(response.user)
    }
}

impl<C: Config> Client<C> {
    /// Returns the profile resource.
    #[must_use]
    pub const fn profile(&self) -> Profile<'_, C> {
        Profile::new(self)
    }
}
