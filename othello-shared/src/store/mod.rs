/// Storage capabilities for accounts and sessions
///
/// The account service never talks to a database directly. It receives an
/// `Arc<dyn Store>` at construction and runs each operation inside one
/// [`StoreTransaction`], which implements both [`AccountStore`] and
/// [`SessionStore`]. Committing makes every write durable at once; dropping
/// the transaction discards them.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: sqlx over a `PgPool`, with row locks on the
///   session and account rows a delete touches
/// - [`memory::MemoryStore`]: in-process store with serialized
///   transactions and fault injection, used by tests
///
/// # Example
///
/// ```
/// use othello_shared::models::account::NewAccount;
/// use othello_shared::store::{memory::MemoryStore, AccountStore, SessionStore, Store};
///
/// # async fn example() -> Result<(), othello_shared::store::StoreError> {
/// let store = MemoryStore::new();
///
/// let mut tx = store.begin().await?;
/// let id = tx
///     .insert_account(NewAccount {
///         name: "David".to_string(),
///         email: "david@weekly.org".to_string(),
///         phone: "415-336-2617".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     })
///     .await?;
/// let token = tx.create_session(id).await?;
/// tx.commit().await?;
///
/// let mut tx = store.begin().await?;
/// assert_eq!(tx.resolve_session(token).await?, id);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use crate::models::{
    account::{Account, AccountId, NewAccount},
    session::SessionToken,
};
use async_trait::async_trait;

/// Errors raised by store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No account with the requested id
    #[error("Account {0} not found")]
    NotFound(AccountId),

    /// Token is absent or was invalidated
    #[error("Session not found")]
    SessionNotFound,

    /// Uniqueness or foreign key conflict
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Store cannot be reached (pool exhausted, connection lost)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => match db_err.constraint() {
                Some(constraint) => StoreError::ConstraintViolation(constraint.to_string()),
                None => StoreError::Database(db_err.to_string()),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Persisted account records
#[async_trait]
pub trait AccountStore: Send {
    /// Creates a new account row and returns its store-assigned id
    async fn insert_account(&mut self, data: NewAccount) -> StoreResult<AccountId>;

    /// Loads an account, deleted or not
    async fn find_account(&mut self, id: AccountId) -> StoreResult<Account>;

    /// Loads an account and holds it against concurrent writers until the
    /// transaction ends
    ///
    /// Callers that verify the password and then write (issue a session,
    /// scrub) read through this, so a concurrent delete either finishes
    /// first and is observed, or waits for this transaction.
    async fn find_account_for_update(&mut self, id: AccountId) -> StoreResult<Account>;

    /// Overwrites PII with the scrub sentinel and marks the account deleted
    ///
    /// Re-scrubbing a deleted account succeeds without changing it.
    async fn scrub_and_mark_deleted(&mut self, id: AccountId) -> StoreResult<()>;
}

/// Persisted session tokens
#[async_trait]
pub trait SessionStore: Send {
    /// Issues and persists a fresh token for `account_id`
    async fn create_session(&mut self, account_id: AccountId) -> StoreResult<SessionToken>;

    /// Returns the account owning `token`, or `SessionNotFound`
    async fn resolve_session(&mut self, token: SessionToken) -> StoreResult<AccountId>;

    /// Removes every session of `account_id`, returning how many were removed
    async fn invalidate_sessions(&mut self, account_id: AccountId) -> StoreResult<u64>;
}

/// One all-or-nothing unit of work over both stores
#[async_trait]
pub trait StoreTransaction: AccountStore + SessionStore {
    /// Makes every write in this transaction durable
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Shared entry point to the store, injected into the service
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a new transaction
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    /// Checks that the store is reachable
    async fn ping(&self) -> StoreResult<()>;
}
