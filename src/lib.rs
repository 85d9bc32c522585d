//! # `wardrobe_client`
//!
//! Client for the wardrobe-management API, built around an authenticated
//! session-management layer: durable credential storage, CSRF token
//! lifecycle, request-level credential attachment, and automatic recovery
//! from rejected credentials via a single-flight refresh protocol.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wardrobe_client::{Client, CredentialStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CredentialStore::open(".wardrobe/credentials.json")?;
//! let client = Client::new(store);
//!
//! let grant = client.auth().login("me@example.com", "hunter2").await?;
//! println!("token type: {:?}", grant.token_type);
//!
//! let profile = client.profile().get().await?;
//! println!("hello, {}", profile.username);
//! # Ok(())
//! # }
//! ```
//!
//! ## Session recovery
//!
//! Every request goes through an interceptor pair. Outgoing: bearer token,
//! `X-CSRF-Token` on mutating methods, and a fresh `X-Request-ID`. Incoming:
//! a 401 with stale-token wording triggers one coalesced refresh and one
//! replay; a 401 with CSRF wording triggers one token re-fetch and one
//! replay; 429 waits out `Retry-After` and replays; 403 clears all
//! credentials and publishes [`AuthState::Anonymous`] for UI layers watching
//! [`CredentialStore::subscribe`].
//!
//! ## Gating UI
//!
//! [`SessionGuard`] resolves to one of {checking, unauthenticated,
//! awaiting-csrf, ready} with a bounded backoff on CSRF acquisition, so a
//! protected screen never spins forever.

/// HTTP client and interceptor pipeline
pub mod client;
/// Configuration types
pub mod config;
/// Durable credential storage
pub mod credentials;
/// CSRF token lifecycle
pub mod csrf;
/// Error types and response classification
pub mod error;
/// Session-aware route guard
pub mod guard;
/// Single-flight token refresh
mod refresh;
/// API resource implementations
pub mod resources;
/// Retry-after parsing and backoff policies
pub mod retry;
/// Request and response types
pub mod types;

pub use crate::client::Client;
pub use crate::config::{Config, WardrobeConfig};
pub use crate::credentials::{AuthState, CredentialKey, CredentialStore};
pub use crate::csrf::CsrfManager;
pub use crate::error::{ApiFault, Error};
pub use crate::guard::{GuardState, SessionGuard};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::types::auth::*;
    pub use crate::types::profile::*;
    pub use crate::{Client, CredentialStore, GuardState, SessionGuard, WardrobeConfig};
}
