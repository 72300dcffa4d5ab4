/// Account RPC handlers
///
/// # Endpoints
///
/// - `POST /rpc/CreateAccount` - Create an account and its first session
/// - `POST /rpc/Authenticate` - Validate a session token, or log in with a password
/// - `POST /rpc/Login` - Alias of `Authenticate`
/// - `POST /rpc/DeleteAccount` - Scrub and soft-delete the session's account
///
/// Every handler honors the `grpc-timeout` header (see
/// [`crate::middleware::deadline`]).

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::deadline::RequestDeadline,
};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use othello_shared::{
    models::{account::AccountId, session::SessionToken},
    service::{CreateAccount, Credentials},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

const REDACTED: &str = "[REDACTED]";

/// CreateAccount request
#[derive(Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    #[validate(length(max = 255, message = "Phone must be at most 255 characters"))]
    pub phone: String,

    #[validate(length(min = 1, max = 1024, message = "Password must be 1 to 1024 characters"))]
    pub password: String,
}

impl fmt::Debug for CreateAccountRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateAccountRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &REDACTED)
            .finish()
    }
}

/// CreateAccount response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub session_token: SessionToken,
}

/// Authenticate request
///
/// Either a previously issued token, or an account id with its password.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AuthenticateRequest {
    Session {
        session_token: SessionToken,
    },
    Password(PasswordLogin),
}

/// Password form of an Authenticate request
#[derive(Deserialize, Validate)]
pub struct PasswordLogin {
    pub account_id: AccountId,

    #[validate(length(min = 1, max = 1024, message = "Password must be 1 to 1024 characters"))]
    pub password: String,
}

impl fmt::Debug for PasswordLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordLogin")
            .field("account_id", &self.account_id)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Authenticate response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub account_id: AccountId,

    /// Present only when a password login issued a new session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<SessionToken>,
}

/// DeleteAccount request
#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    pub session_token: SessionToken,

    /// Re-entered password; never logged
    pub password: String,
}

impl fmt::Debug for DeleteAccountRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteAccountRequest")
            .field("session_token", &self.session_token)
            .field("password", &REDACTED)
            .finish()
    }
}

/// DeleteAccount response (empty object)
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAccountResponse {}

/// Create an account
///
/// # Endpoint
///
/// ```text
/// POST /rpc/CreateAccount
/// Content-Type: application/json
///
/// {
///   "name": "David",
///   "email": "david@weekly.org",
///   "phone": "+1 650 555 1212",
///   "password": "insecure"
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "session_token": 8254512368127362418 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or a field is too long
/// - `500 Internal Server Error`: Hashing or storage failed; nothing was created
/// - `504 Gateway Timeout`: Deadline expired
pub async fn create_account(
    State(state): State<AppState>,
    RequestDeadline(deadline): RequestDeadline,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<Json<CreateAccountResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let session_token = state
        .accounts
        .create_account(
            CreateAccount {
                name: req.name,
                email: req.email,
                phone: req.phone,
                password: req.password,
            },
            deadline,
        )
        .await?;

    Ok(Json(CreateAccountResponse { session_token }))
}

/// Authenticate by session token or password
///
/// # Endpoint
///
/// ```text
/// POST /rpc/Authenticate
/// Content-Type: application/json
///
/// { "session_token": 8254512368127362418 }
/// ```
///
/// or
///
/// ```text
/// { "account_id": 1, "password": "insecure" }
/// ```
///
/// # Response
///
/// ```json
/// { "account_id": 1, "session_token": 4611686018427387904 }
/// ```
///
/// `session_token` is present only for password logins.
///
/// # Errors
///
/// - `400 Bad Request`: Body matches neither form, or the password is empty
///   or too long
/// - `401 Unauthorized`: Unknown token, unknown or deleted account, wrong password
pub async fn authenticate(
    State(state): State<AppState>,
    RequestDeadline(deadline): RequestDeadline,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> ApiResult<Json<AuthenticateResponse>> {
    let Json(req) = payload?;

    let credentials = match req {
        AuthenticateRequest::Session { session_token } => Credentials::Session(session_token),
        AuthenticateRequest::Password(login) => {
            login.validate()?;
            Credentials::Password {
                account_id: login.account_id,
                password: login.password,
            }
        }
    };

    let authenticated = state.accounts.authenticate(credentials, deadline).await?;

    Ok(Json(AuthenticateResponse {
        account_id: authenticated.account_id,
        session_token: authenticated.session_token,
    }))
}

/// Delete the account bound to a session
///
/// # Endpoint
///
/// ```text
/// POST /rpc/DeleteAccount
/// Content-Type: application/json
///
/// { "session_token": 8254512368127362418, "password": "insecure" }
/// ```
///
/// # Response
///
/// ```json
/// {}
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: `No such session.` or `Password didn't match`
/// - `500 Internal Server Error`: Storage failed; nothing changed
pub async fn delete_account(
    State(state): State<AppState>,
    RequestDeadline(deadline): RequestDeadline,
    payload: Result<Json<DeleteAccountRequest>, JsonRejection>,
) -> ApiResult<Json<DeleteAccountResponse>> {
    let Json(req) = payload?;

    state
        .accounts
        .delete_account(req.session_token, req.password, deadline)
        .await?;

    Ok(Json(DeleteAccountResponse {}))
}
