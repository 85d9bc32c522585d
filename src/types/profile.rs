use serde::{Deserialize, Serialize};

/// The authenticated user's profile, as returned by `GET /api/profile`.
///
/// Fetching this is how a restored session is validated at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub style_preferences: serde_json::Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial update for `PUT /api/profile`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_preferences: Option<serde_json::Value>,
}

/// Envelope returned by `PUT /api/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdateResponse {
    pub user: UserProfile,
}
