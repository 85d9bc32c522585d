//! API resource implementations.

/// Authentication and session endpoints
pub mod auth;
/// User profile endpoints
pub mod profile;

pub use auth::Auth;
pub use profile::Profile;
