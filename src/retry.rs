use std::time::Duration;

use reqwest::header::HeaderMap;

/// Wait applied to a 429 response that carries no `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Parses the `Retry-After` header as whole seconds, capped at 60.
///
/// Returns `None` if the header is missing or malformed; callers fall back
/// to [`DEFAULT_RETRY_AFTER`].
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let v = headers.get("retry-after")?;
    let secs = v.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)))
}

/// Bounded backoff policy for CSRF acquisition in the route guard.
///
/// Roughly ten seconds of total budget; after that the guard surfaces
/// `AwaitingCsrf` instead of spinning forever.
#[must_use]
pub fn csrf_backoff() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoff {
        initial_interval: Duration::from_millis(250),
        max_interval: Duration::from_secs(2),
        max_elapsed_time: Some(Duration::from_secs(10)),
        randomization_factor: 0.25,
        multiplier: 2.0,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seconds() {
        let mut h = HeaderMap::new();
        h.insert("retry-after", "2".parse().unwrap());
        assert_eq!(parse_retry_after(&h), Some(Duration::from_secs(2)));
    }

    #[test]
    fn parse_caps_at_sixty() {
        let mut h = HeaderMap::new();
        h.insert("retry-after", "300".parse().unwrap());
        assert_eq!(parse_retry_after(&h), Some(Duration::from_secs(60)));
    }

    #[test]
    fn missing_header_is_none() {
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn malformed_header_is_none() {
        let mut h = HeaderMap::new();
        h.insert("retry-after", "soon".parse().unwrap());
        assert_eq!(parse_retry_after(&h), None);
    }

    #[test]
    fn csrf_backoff_is_bounded() {
        let policy = csrf_backoff();
        assert!(policy.max_elapsed_time.is_some());
    }
}
