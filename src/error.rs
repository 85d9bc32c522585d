use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use thiserror::Error;

use crate::config::HDR_REQUEST_ID;
use crate::retry;

/// Errors surfaced by the client.
///
/// The recoverable classes (`AuthExpired`, `AuthInvalid`, `CsrfRejected`,
/// `RateLimited`) are normally consumed by the response interceptor and only
/// reach callers once their retry budget is spent.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure, including the 30s request timeout.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// 401 with a detail indicating an expired access token.
    #[error("access token expired: {0}")]
    AuthExpired(ApiFault),

    /// 401 with a detail indicating an invalid access token.
    #[error("access token invalid: {0}")]
    AuthInvalid(ApiFault),

    /// 401 with a detail indicating a CSRF failure.
    #[error("CSRF token rejected: {0}")]
    CsrfRejected(ApiFault),

    /// 429 with the wait the server asked for.
    #[error("rate limited, retry after {retry_after:?}: {fault}")]
    RateLimited {
        retry_after: Duration,
        fault: ApiFault,
    },

    /// 403; the session has been torn down locally.
    #[error("forbidden: {0}")]
    Forbidden(ApiFault),

    /// Refresh was impossible or failed; all credentials were cleared.
    #[error("session expired, re-authentication required")]
    SessionExpired,

    /// Any other non-2xx response.
    #[error("API error: {0}")]
    Api(ApiFault),

    /// Response body did not match the expected shape.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The caller's cancellation token fired while the request was in flight.
    #[error("request cancelled")]
    Cancelled,

    /// Credential persistence failure.
    #[error("credential storage error: {0}")]
    Storage(String),
}

/// Server-reported failure payload.
#[derive(Debug, Clone)]
pub struct ApiFault {
    /// HTTP status of the failed response.
    pub status: u16,
    /// The server's `detail` message, when the body carried one.
    pub detail: Option<String>,
    /// Correlation id echoed by the server, when present.
    pub request_id: Option<String>,
}

impl std::fmt::Display for ApiFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}", self.status)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        if let Some(id) = &self.request_id {
            write!(f, " (request {id})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Classifies a failed response into the error taxonomy.
///
/// 401 responses are routed by the server's `detail` string: a mention of
/// CSRF wins over token wording (a detail like "CSRF token invalid" is a
/// CSRF failure, not a bearer-token one), then "expired", then "invalid".
pub(crate) fn classify(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Error {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);
    let request_id = headers
        .get(HDR_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let fault = ApiFault {
        status: status.as_u16(),
        detail,
        request_id,
    };

    match status {
        StatusCode::UNAUTHORIZED => {
            let lowered = fault
                .detail
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_default();
            if lowered.contains("csrf") {
                Error::CsrfRejected(fault)
            } else if lowered.contains("expired") {
                Error::AuthExpired(fault)
            } else if lowered.contains("invalid") {
                Error::AuthInvalid(fault)
            } else {
                Error::Api(fault)
            }
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            retry_after: retry::parse_retry_after(headers)
                .unwrap_or(retry::DEFAULT_RETRY_AFTER),
            fault,
        },
        StatusCode::FORBIDDEN => Error::Forbidden(fault),
        _ => Error::Api(fault),
    }
}
