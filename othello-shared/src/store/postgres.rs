/// PostgreSQL store
///
/// Every [`StoreTransaction`] wraps one `sqlx::Transaction`. Dropping it
/// without calling `commit` rolls back, which is also what happens when a
/// request deadline cancels the surrounding future.
///
/// Session resolution and the locked account lookup take `FOR UPDATE` row
/// locks. Two deletes racing on the same account, or a password login
/// racing a delete, are serialized by the database rather than interleaved.

use super::{AccountStore, SessionStore, Store, StoreError, StoreResult, StoreTransaction};
use crate::db::pool::health_check;
use crate::models::{
    account::{Account, AccountId, NewAccount},
    session::{Session, SessionToken},
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }
}

/// Open PostgreSQL transaction
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AccountStore for PgTransaction {
    async fn insert_account(&mut self, data: NewAccount) -> StoreResult<AccountId> {
        let id = Account::insert(&mut self.tx, data).await?;
        debug!(account_id = %id, "Inserted account");
        Ok(id)
    }

    async fn find_account(&mut self, id: AccountId) -> StoreResult<Account> {
        Account::find_by_id(&mut self.tx, id)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_account_for_update(&mut self, id: AccountId) -> StoreResult<Account> {
        Account::find_by_id_for_update(&mut self.tx, id)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn scrub_and_mark_deleted(&mut self, id: AccountId) -> StoreResult<()> {
        match Account::scrub_and_mark_deleted(&mut self.tx, id).await? {
            Some(true) => {
                debug!(account_id = %id, "Scrubbed account");
                Ok(())
            }
            Some(false) => {
                debug!(account_id = %id, "Account already deleted, scrub skipped");
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }
}

#[async_trait]
impl SessionStore for PgTransaction {
    async fn create_session(&mut self, account_id: AccountId) -> StoreResult<SessionToken> {
        let token = SessionToken::generate();
        Session::insert(&mut self.tx, token, account_id).await?;
        Ok(token)
    }

    async fn resolve_session(&mut self, token: SessionToken) -> StoreResult<AccountId> {
        Session::resolve_for_update(&mut self.tx, token)
            .await?
            .ok_or(StoreError::SessionNotFound)
    }

    async fn invalidate_sessions(&mut self, account_id: AccountId) -> StoreResult<u64> {
        let removed = Session::delete_by_account(&mut self.tx, account_id).await?;
        debug!(account_id = %account_id, removed, "Invalidated sessions");
        Ok(removed)
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
