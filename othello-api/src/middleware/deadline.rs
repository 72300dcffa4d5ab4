/// Caller-supplied deadlines
///
/// Callers bound a call with the `grpc-timeout` header: one to eight ASCII
/// digits followed by a unit (`H`, `M`, `S`, `m`, `u`, `n`). A missing
/// header means "no caller deadline" and the service default applies; a
/// malformed one is rejected as `invalid_argument`.
///
/// # Example
///
/// ```
/// use othello_api::middleware::deadline::parse_grpc_timeout;
/// use std::time::Duration;
///
/// assert_eq!(parse_grpc_timeout("250m"), Some(Duration::from_millis(250)));
/// assert_eq!(parse_grpc_timeout("soon"), None);
/// ```

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::time::Duration;

/// Header carrying the caller deadline
pub const GRPC_TIMEOUT: &str = "grpc-timeout";

/// Deadline extracted from the request, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDeadline(pub Option<Duration>);

#[async_trait]
impl<S> FromRequestParts<S> for RequestDeadline
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(GRPC_TIMEOUT) else {
            return Ok(RequestDeadline(None));
        };

        value
            .to_str()
            .ok()
            .and_then(parse_grpc_timeout)
            .map(|deadline| RequestDeadline(Some(deadline)))
            .ok_or_else(|| {
                ApiError::InvalidArgument(format!("Malformed {} header", GRPC_TIMEOUT))
            })
    }
}

/// Parses a `grpc-timeout` value
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if !value.is_ascii() || value.len() < 2 || value.len() > 9 {
        return None;
    }

    let (digits, unit) = value.split_at(value.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    match unit {
        "H" => Some(Duration::from_secs(amount * 3600)),
        "M" => Some(Duration::from_secs(amount * 60)),
        "S" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_millis(amount)),
        "u" => Some(Duration::from_micros(amount)),
        "n" => Some(Duration::from_nanos(amount)),
        _ => None,
    }
}
