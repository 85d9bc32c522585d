use serde::{Deserialize, Serialize};

/// Body of `GET /api/auth/csrf`.
#[derive(Debug, Clone, Deserialize)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
    /// Server-side token lifetime in seconds; informational only, the client
    /// performs no expiry tracking.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Token set issued by login, register, and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/refresh`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// A server-side session, for display and revocation only.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub last_activity: Option<String>,
}

/// Body of `GET /api/auth/sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionRecord>,
}

/// Body of `POST /api/auth/sessions/{id}/revoke`.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeResponse {
    #[serde(default)]
    pub message: Option<String>,
}
