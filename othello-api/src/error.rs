/// Error handling for the RPC dispatcher
///
/// Handlers return `ApiResult<T>`; `ApiError` renders as a JSON body with
/// a stable error code and a matching HTTP status.
///
/// # Example
///
/// ```
/// use othello_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::Unimplemented("ShowGames".to_string()))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use othello_shared::error::AccountError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (400)
    InvalidArgument(String),

    /// Field-level validation failures (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Credentials or session token rejected (401)
    Unauthenticated(String),

    /// Caller may not perform the operation (403)
    PermissionDenied(String),

    /// Unknown RPC method (404)
    NotFound(String),

    /// Deadline expired before the call finished (504)
    DeadlineExceeded,

    /// Internal server error (500)
    InternalError(String),

    /// Store unreachable (503)
    ServiceUnavailable(String),

    /// Declared RPC with no implementation yet (501)
    Unimplemented(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "invalid_argument", "permission_denied")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            ApiError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DeadlineExceeded => write!(f, "Deadline exceeded"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::Unimplemented(method) => write!(f, "Unimplemented: {}", method),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_argument", msg, None)
            }
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", msg, None)
            }
            ApiError::PermissionDenied(msg) => {
                (StatusCode::FORBIDDEN, "permission_denied", msg, None)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::DeadlineExceeded => (
                StatusCode::GATEWAY_TIMEOUT,
                "deadline_exceeded",
                "Deadline exceeded".to_string(),
                None,
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "Service temporarily unavailable".to_string(),
                    None,
                )
            }
            ApiError::Unimplemented(method) => (
                StatusCode::NOT_IMPLEMENTED,
                "unimplemented",
                format!("{} is not implemented", method),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert account service errors to API errors
impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Unauthenticated => {
                ApiError::Unauthenticated("Invalid credentials".to_string())
            }
            AccountError::PermissionDenied(msg) => ApiError::PermissionDenied(msg.to_string()),
            AccountError::Internal(msg) => ApiError::InternalError(msg),
            AccountError::DeadlineExceeded => ApiError::DeadlineExceeded,
            AccountError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

/// Convert field validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field)),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

/// Convert JSON body rejections to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidArgument(rejection.body_text())
    }
}
