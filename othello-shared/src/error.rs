/// Account service error taxonomy
///
/// Every operation of [`crate::service::AccountService`] returns
/// `AccountResult<T>`. Store and hashing failures are converted into
/// `Internal` here; callers decide how to present them. `NotFound` from
/// the store is never surfaced as such, so callers cannot learn which
/// account ids exist.

use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Account service result type alias
pub type AccountResult<T> = Result<T, AccountError>;

/// Message returned when a delete presents an unknown token
pub const NO_SUCH_SESSION: &str = "No such session.";

/// Message returned when a delete presents the wrong password
pub const PASSWORD_MISMATCH: &str = "Password didn't match";

/// Errors surfaced by the account service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// Presented credentials or token do not identify a live account
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Caller is not allowed to perform the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(&'static str),

    /// Store or hashing failure; details are for logs only
    #[error("Internal error: {0}")]
    Internal(String),

    /// The effective deadline expired before the operation finished
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// A dependency is temporarily unreachable
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        AccountError::Internal(format!("Store operation failed: {}", err))
    }
}

impl From<PasswordError> for AccountError {
    fn from(err: PasswordError) -> Self {
        AccountError::Internal(format!("Password operation failed: {}", err))
    }
}
