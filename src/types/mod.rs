//! Wire types for the wardrobe API.

/// Authentication request and response types
pub mod auth;
/// User profile types
pub mod profile;
