/// Account model and database operations
///
/// Accounts are never physically removed. Deleting an account overwrites
/// every PII column and the password hash with [`SCRUBBED`] and flags the row,
/// keeping the id reserved for the audit trail.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     phone VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     deleted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// All queries take a `&mut PgConnection` so they compose inside a
/// transaction opened by [`crate::store::postgres::PgStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use std::fmt;

/// Value written over every scrubbed column
pub const SCRUBBED: &str = "X";

/// Store-assigned account identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account record
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    pub id: AccountId,

    pub name: String,

    pub email: String,

    pub phone: String,

    /// Argon2id PHC string, or [`SCRUBBED`] once deleted
    pub password_hash: String,

    /// Terminal flag; a deleted account never authenticates again
    pub is_deleted: bool,

    /// Set exactly once, by the first scrub
    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Builds the in-memory form of a freshly inserted row
    pub fn from_new(id: AccountId, data: NewAccount, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: data.name,
            email: data.email,
            phone: data.phone,
            password_hash: data.password_hash,
            is_deleted: false,
            deleted_at: None,
            created_at,
        }
    }

    /// Applies the soft-delete scrub in place
    ///
    /// Returns `false` without touching anything when the account is
    /// already deleted, so `deleted_at` keeps its first value.
    pub fn scrub(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_deleted {
            return false;
        }

        self.name = SCRUBBED.to_string();
        self.email = SCRUBBED.to_string();
        self.phone = SCRUBBED.to_string();
        self.password_hash = SCRUBBED.to_string();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        true
    }
}

/// Input for creating a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

impl Account {
    /// Inserts a new account and returns its store-assigned id
    pub async fn insert(conn: &mut PgConnection, data: NewAccount) -> Result<AccountId, sqlx::Error> {
        let id = sqlx::query_scalar::<_, AccountId>(
            r#"
            INSERT INTO accounts (name, email, phone, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.password_hash)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    /// Finds an account by id, deleted or not
    pub async fn find_by_id(conn: &mut PgConnection, id: AccountId) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, phone, password_hash, is_deleted, deleted_at, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(account)
    }

    /// Finds an account by id, locking the row until the transaction ends
    ///
    /// A concurrent delete cannot scrub the row between the caller's
    /// password check and its own write. If a delete committed first, the
    /// row comes back already marked deleted.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: AccountId,
    ) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, phone, password_hash, is_deleted, deleted_at, created_at
            FROM accounts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(account)
    }

    /// Scrubs PII and marks the account deleted
    ///
    /// # Returns
    ///
    /// - `Some(true)` if the account was active and is now deleted
    /// - `Some(false)` if it was already deleted (nothing changed)
    /// - `None` if no such account exists
    pub async fn scrub_and_mark_deleted(
        conn: &mut PgConnection,
        id: AccountId,
    ) -> Result<Option<bool>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = $2, email = $2, phone = $2, password_hash = $2,
                is_deleted = TRUE, deleted_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(SCRUBBED)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(Some(true));
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(exists.then_some(false))
    }
}
