/// In-process store
///
/// Holds accounts and sessions behind a single async mutex. A transaction
/// owns the lock for its whole lifetime and works on a private copy of the
/// state; `commit` swaps the copy in, dropping the transaction throws it
/// away. Transactions are therefore fully serialized.
///
/// [`MemoryStore::fail_next`] arms a one-shot failure at a chosen step so
/// tests can observe rollback behavior.

use super::{AccountStore, SessionStore, Store, StoreError, StoreResult, StoreTransaction};
use crate::models::{
    account::{Account, AccountId, NewAccount},
    session::SessionToken,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Steps at which a failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    InsertAccount,
    CreateSession,
    InvalidateSessions,
    ScrubAccount,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: BTreeMap<AccountId, Account>,
    sessions: HashMap<SessionToken, AccountId>,
    last_id: i64,
}

/// Store kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<StdMutex<HashSet<FaultPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next operation at `point` fail with `StoreError::Unavailable`
    pub fn fail_next(&self, point: FaultPoint) {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(point);
    }

    /// Committed copy of an account
    pub async fn account(&self, id: AccountId) -> Option<Account> {
        self.state.lock().await.accounts.get(&id).cloned()
    }

    /// Number of committed accounts, deleted ones included
    pub async fn account_count(&self) -> usize {
        self.state.lock().await.accounts.len()
    }

    /// Number of committed live sessions for `account_id`
    pub async fn session_count(&self, account_id: AccountId) -> usize {
        self.state
            .lock()
            .await
            .sessions
            .values()
            .filter(|owner| **owner == account_id)
            .count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();

        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Open in-memory transaction
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<StdMutex<HashSet<FaultPoint>>>,
}

impl MemoryTransaction {
    fn check_fault(&self, point: FaultPoint) -> StoreResult<()> {
        let tripped = self
            .faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&point);

        if tripped {
            Err(StoreError::Unavailable(format!("injected failure at {:?}", point)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AccountStore for MemoryTransaction {
    async fn insert_account(&mut self, data: NewAccount) -> StoreResult<AccountId> {
        self.check_fault(FaultPoint::InsertAccount)?;

        self.working.last_id += 1;
        let id = AccountId(self.working.last_id);
        self.working
            .accounts
            .insert(id, Account::from_new(id, data, Utc::now()));
        Ok(id)
    }

    async fn find_account(&mut self, id: AccountId) -> StoreResult<Account> {
        self.working
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    // Transactions are already serialized on the store mutex
    async fn find_account_for_update(&mut self, id: AccountId) -> StoreResult<Account> {
        self.find_account(id).await
    }

    async fn scrub_and_mark_deleted(&mut self, id: AccountId) -> StoreResult<()> {
        self.check_fault(FaultPoint::ScrubAccount)?;

        let account = self
            .working
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        account.scrub(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryTransaction {
    async fn create_session(&mut self, account_id: AccountId) -> StoreResult<SessionToken> {
        self.check_fault(FaultPoint::CreateSession)?;

        if !self.working.accounts.contains_key(&account_id) {
            return Err(StoreError::ConstraintViolation(
                "sessions_account_id_fkey".to_string(),
            ));
        }

        let token = SessionToken::generate();
        if self.working.sessions.insert(token, account_id).is_some() {
            return Err(StoreError::ConstraintViolation("sessions_pkey".to_string()));
        }
        Ok(token)
    }

    async fn resolve_session(&mut self, token: SessionToken) -> StoreResult<AccountId> {
        self.working
            .sessions
            .get(&token)
            .copied()
            .ok_or(StoreError::SessionNotFound)
    }

    async fn invalidate_sessions(&mut self, account_id: AccountId) -> StoreResult<u64> {
        self.check_fault(FaultPoint::InvalidateSessions)?;

        let before = self.working.sessions.len();
        self.working.sessions.retain(|_, owner| *owner != account_id);
        Ok((before - self.working.sessions.len()) as u64)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.check_fault(FaultPoint::Commit)?;

        let MemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(name: &str) -> NewAccount {
        NewAccount {
            name: name.to_string(),
            email: format!("{}@example.com", name),
            phone: "555-0100".to_string(),
            password_hash: "$argon2id$...".to_string(),
        }
    }

    #[tokio::test]
    async fn test_committed_writes_are_visible() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_account(new_account("alice")).await.unwrap();
        let token = tx.create_session(id).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.resolve_session(token).await.unwrap(), id);
        assert_eq!(tx.find_account(id).await.unwrap().name, "alice");
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = MemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_account(new_account("bob")).await.unwrap();
        }

        assert_eq!(store.account_count().await, 0);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = MemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_account(new_account("rolled-back")).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        let first = tx.insert_account(new_account("first")).await.unwrap();
        let second = tx.insert_account(new_account("second")).await.unwrap();
        tx.commit().await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_session_not_found() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let result = tx.resolve_session(SessionToken(9999999)).await;
        assert!(matches!(result, Err(StoreError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_missing_account_not_found() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        assert!(matches!(
            tx.find_account_for_update(AccountId(1)).await,
            Err(StoreError::NotFound(AccountId(1)))
        ));
        assert!(matches!(
            tx.scrub_and_mark_deleted(AccountId(1)).await,
            Err(StoreError::NotFound(AccountId(1)))
        ));
    }

    #[tokio::test]
    async fn test_invalidate_removes_only_owned_sessions() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let alice = tx.insert_account(new_account("alice")).await.unwrap();
        let bob = tx.insert_account(new_account("bob")).await.unwrap();
        tx.create_session(alice).await.unwrap();
        tx.create_session(alice).await.unwrap();
        let bob_token = tx.create_session(bob).await.unwrap();

        assert_eq!(tx.invalidate_sessions(alice).await.unwrap(), 2);
        assert_eq!(tx.invalidate_sessions(alice).await.unwrap(), 0);
        tx.commit().await.unwrap();

        assert_eq!(store.session_count(alice).await, 0);
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.resolve_session(bob_token).await.unwrap(), bob);
    }

    #[tokio::test]
    async fn test_scrub_is_idempotent() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_account(new_account("carol")).await.unwrap();
        tx.scrub_and_mark_deleted(id).await.unwrap();
        tx.commit().await.unwrap();
        let first = store.account(id).await.unwrap().deleted_at;

        let mut tx = store.begin().await.unwrap();
        tx.scrub_and_mark_deleted(id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.account(id).await.unwrap().deleted_at, first);
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let store = MemoryStore::new();
        store.fail_next(FaultPoint::InsertAccount);

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.insert_account(new_account("dave")).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(tx.insert_account(new_account("dave")).await.is_ok());
    }

    #[tokio::test]
    async fn test_session_requires_existing_account() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        assert!(matches!(
            tx.create_session(AccountId(42)).await,
            Err(StoreError::ConstraintViolation(_))
        ));
    }
}
