/// Account lifecycle orchestration
///
/// [`AccountService`] implements the three account RPCs on top of an
/// injected [`Store`]. It holds no mutable state of its own, so one instance
/// is shared by every in-flight request.
///
/// # Lifecycle
///
/// ```text
/// create_account ──> Active ──delete_account──> Deleted (terminal)
/// ```
///
/// # Guarantees
///
/// - Each operation runs in one store transaction. A failure at any step
///   leaves no partial writes: no account without its first session, and no
///   account stripped of sessions but still active.
/// - Deleting requires both a live session token and the account password.
/// - Every call runs under a deadline; on expiry the work is dropped (the
///   open transaction rolls back) and `DeadlineExceeded` is returned.
///
/// # Example
///
/// ```
/// use othello_shared::service::{AccountService, CreateAccount};
/// use othello_shared::store::memory::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), othello_shared::error::AccountError> {
/// let service = AccountService::new(Arc::new(MemoryStore::new()));
///
/// let token = service
///     .create_account(
///         CreateAccount {
///             name: "David".to_string(),
///             email: "david@weekly.org".to_string(),
///             phone: "415-336-2617".to_string(),
///             password: "tr33tr33".to_string(),
///         },
///         None,
///     )
///     .await?;
///
/// service.delete_account(token, "tr33tr33".to_string(), None).await?;
/// # Ok(())
/// # }
/// ```

use crate::auth::audit::{AuditEvent, AuditSink, TracingAuditSink};
use crate::auth::password;
use crate::error::{AccountError, AccountResult, NO_SUCH_SESSION, PASSWORD_MISMATCH};
use crate::models::{
    account::{AccountId, NewAccount},
    session::SessionToken,
};
use crate::store::{AccountStore, SessionStore, Store, StoreError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Deadline applied when the caller supplies none (30 seconds)
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Input for account creation
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub name: String,
    pub email: String,
    pub phone: String,

    /// Plaintext password; hashed before anything is stored
    pub password: String,
}

/// What a caller presents to authenticate
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Validate a previously issued token
    Session(SessionToken),

    /// Re-verify the password and issue a new token
    Password {
        account_id: AccountId,
        password: String,
    },
}

/// Successful authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated {
    pub account_id: AccountId,

    /// Set only when a new session was issued (password login)
    pub session_token: Option<SessionToken>,
}

/// Account lifecycle service
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditSink>,
    default_deadline: Duration,
}

impl AccountService {
    /// Creates a service over `store` with the tracing audit sink
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            audit: Arc::new(TracingAuditSink),
            default_deadline: DEFAULT_DEADLINE,
        }
    }

    /// Replaces the audit sink
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Sets the deadline used when callers supply none; it also caps caller deadlines
    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    /// Checks store reachability
    pub async fn ping(&self) -> AccountResult<()> {
        self.store
            .ping()
            .await
            .map_err(|e| AccountError::Unavailable(e.to_string()))
    }

    /// Creates an account and its first session
    ///
    /// # Returns
    ///
    /// The new session token
    ///
    /// # Errors
    ///
    /// - `Internal` if hashing or any store step fails (nothing is persisted)
    /// - `DeadlineExceeded` if the deadline expires first
    pub async fn create_account(
        &self,
        req: CreateAccount,
        deadline: Option<Duration>,
    ) -> AccountResult<SessionToken> {
        self.within(deadline, "CreateAccount", self.create_account_inner(req))
            .await
    }

    async fn create_account_inner(&self, req: CreateAccount) -> AccountResult<SessionToken> {
        info!("Create account request");

        let password_hash = hash_blocking(req.password).await?;

        let mut tx = self.store.begin().await?;
        let account_id = tx
            .insert_account(NewAccount {
                name: req.name,
                email: req.email,
                phone: req.phone,
                password_hash,
            })
            .await?;
        let token = tx.create_session(account_id).await?;
        tx.commit().await?;

        info!(account_id = %account_id, "Created account with new session");
        Ok(token)
    }

    /// Authenticates a caller by session token or by password
    ///
    /// A token is validated as-is. A password login issues an additional
    /// session and returns its token; existing sessions stay valid.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` for unknown tokens, unknown or deleted accounts,
    ///   and wrong passwords alike
    /// - `Internal` on store or hashing failures
    pub async fn authenticate(
        &self,
        credentials: Credentials,
        deadline: Option<Duration>,
    ) -> AccountResult<Authenticated> {
        self.within(deadline, "Authenticate", self.authenticate_inner(credentials))
            .await
    }

    async fn authenticate_inner(&self, credentials: Credentials) -> AccountResult<Authenticated> {
        let mut tx = self.store.begin().await?;

        match credentials {
            Credentials::Session(token) => {
                debug!("Authenticate request by session");

                let account_id = match tx.resolve_session(token).await {
                    Ok(id) => id,
                    Err(StoreError::SessionNotFound) => return Err(AccountError::Unauthenticated),
                    Err(e) => return Err(e.into()),
                };

                let account = match tx.find_account(account_id).await {
                    Ok(account) => account,
                    Err(StoreError::NotFound(id)) => {
                        error!(account_id = %id, "Session points at a missing account");
                        return Err(AccountError::Internal(format!(
                            "Session points at missing account {}",
                            id
                        )));
                    }
                    Err(e) => return Err(e.into()),
                };

                if account.is_deleted {
                    warn!(account_id = %account_id, "Live session found for deleted account");
                    return Err(AccountError::Unauthenticated);
                }

                Ok(Authenticated {
                    account_id,
                    session_token: None,
                })
            }
            Credentials::Password {
                account_id,
                password,
            } => {
                debug!(account_id = %account_id, "Authenticate request by password");

                // Locked so a concurrent delete cannot slip in before the
                // new session is written
                let account = match tx.find_account_for_update(account_id).await {
                    Ok(account) if !account.is_deleted => account,
                    Ok(_) | Err(StoreError::NotFound(_)) => {
                        return Err(AccountError::Unauthenticated)
                    }
                    Err(e) => return Err(e.into()),
                };

                if !verify_blocking(password, account.password_hash).await? {
                    self.audit.record(AuditEvent::PasswordMismatch {
                        account_id,
                        operation: "Authenticate",
                    });
                    return Err(AccountError::Unauthenticated);
                }

                let token = tx.create_session(account_id).await?;
                tx.commit().await?;

                info!(account_id = %account_id, "Issued session on password login");
                Ok(Authenticated {
                    account_id,
                    session_token: Some(token),
                })
            }
        }
    }

    /// Deletes the account behind `token` after re-checking its password
    ///
    /// On success every session of the account is removed and the account
    /// is scrubbed, in one transaction.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` for an unknown token, a token whose account is
    ///   already deleted, or a wrong password (nothing changes)
    /// - `Internal` if the session points at a missing account or a store
    ///   step fails (nothing changes)
    pub async fn delete_account(
        &self,
        token: SessionToken,
        password: String,
        deadline: Option<Duration>,
    ) -> AccountResult<()> {
        self.within(deadline, "DeleteAccount", self.delete_account_inner(token, password))
            .await
    }

    async fn delete_account_inner(&self, token: SessionToken, password: String) -> AccountResult<()> {
        info!("Delete account request");

        let mut tx = self.store.begin().await?;

        let account_id = match tx.resolve_session(token).await {
            Ok(id) => id,
            Err(StoreError::SessionNotFound) => {
                info!("No such session");
                self.audit.record(AuditEvent::UnknownSession {
                    operation: "DeleteAccount",
                });
                return Err(AccountError::PermissionDenied(NO_SUCH_SESSION));
            }
            Err(e) => return Err(e.into()),
        };
        debug!(account_id = %account_id, "Found account for session");

        let account = match tx.find_account_for_update(account_id).await {
            Ok(account) => account,
            Err(StoreError::NotFound(id)) => {
                error!(account_id = %id, "Session points at a missing account");
                return Err(AccountError::Internal(format!(
                    "Session points at missing account {}",
                    id
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if account.is_deleted {
            // Only reachable if a session outlived its account's deletion
            warn!(account_id = %account_id, "Live session found for deleted account");
            self.audit.record(AuditEvent::UnknownSession {
                operation: "DeleteAccount",
            });
            return Err(AccountError::PermissionDenied(NO_SUCH_SESSION));
        }

        if !verify_blocking(password, account.password_hash).await? {
            info!(account_id = %account_id, "Password didn't match, not deleting");
            self.audit.record(AuditEvent::PasswordMismatch {
                account_id,
                operation: "DeleteAccount",
            });
            return Err(AccountError::PermissionDenied(PASSWORD_MISMATCH));
        }

        let sessions_invalidated = tx.invalidate_sessions(account_id).await?;
        tx.scrub_and_mark_deleted(account_id).await?;
        tx.commit().await?;

        self.audit.record(AuditEvent::AccountDeleted {
            account_id,
            sessions_invalidated,
        });
        Ok(())
    }

    /// Runs `fut` under the effective deadline
    async fn within<T, F>(&self, deadline: Option<Duration>, operation: &str, fut: F) -> AccountResult<T>
    where
        F: Future<Output = AccountResult<T>>,
    {
        let limit = deadline.map_or(self.default_deadline, |d| d.min(self.default_deadline));

        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, deadline_ms = limit.as_millis() as u64, "Deadline exceeded");
                Err(AccountError::DeadlineExceeded)
            }
        }
    }
}

/// Hashes on the blocking pool
async fn hash_blocking(password: String) -> AccountResult<String> {
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AccountError::Internal(format!("Hashing task failed: {}", e)))??;

    Ok(hash)
}

/// Verifies on the blocking pool
async fn verify_blocking(password: String, hash: String) -> AccountResult<bool> {
    let matched = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| AccountError::Internal(format!("Verification task failed: {}", e)))??;

    Ok(matched)
}
