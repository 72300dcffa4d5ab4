/// Session model and database operations
///
/// A session maps an opaque token to the account that owns it. Tokens are
/// issued on signup and on credential login, and every session for an
/// account is removed when that account is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     token BIGINT PRIMARY KEY,
///     account_id BIGINT NOT NULL REFERENCES accounts(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Token generation
///
/// Tokens span the full signed 64-bit space and are drawn from the OS
/// CSPRNG on every call. There is no seeded or shared generator. Tokens
/// are not deduplicated; a collision fails the primary key and the
/// surrounding transaction.

use crate::models::account::AccountId;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use std::fmt;

/// Opaque session credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct SessionToken(pub i64);

impl SessionToken {
    /// Draws a fresh token from the OS RNG
    pub fn generate() -> Self {
        SessionToken(OsRng.next_u64() as i64)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Session {
    pub token: SessionToken,
    pub account_id: AccountId,
}

impl Session {
    /// Persists a new session for `account_id` with the given token
    pub async fn insert(
        conn: &mut PgConnection,
        token: SessionToken,
        account_id: AccountId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO sessions (token, account_id) VALUES ($1, $2)")
            .bind(token)
            .bind(account_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Looks up the owning account, locking the session row
    pub async fn resolve_for_update(
        conn: &mut PgConnection,
        token: SessionToken,
    ) -> Result<Option<AccountId>, sqlx::Error> {
        let account_id = sqlx::query_scalar::<_, AccountId>(
            "SELECT account_id FROM sessions WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(account_id)
    }

    /// Deletes every session belonging to `account_id`
    ///
    /// # Returns
    ///
    /// Number of sessions removed (zero is not an error)
    pub async fn delete_by_account(conn: &mut PgConnection, account_id: AccountId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE account_id = $1")
            .bind(account_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_tokens_are_distinct() {
        let tokens: HashSet<SessionToken> = (0..1000).map(|_| SessionToken::generate()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_token_serializes_as_number() {
        let json = serde_json::to_string(&SessionToken(9999999)).unwrap();
        assert_eq!(json, "9999999");

        let parsed: SessionToken = serde_json::from_str("12345").unwrap();
        assert_eq!(parsed, SessionToken(12345));
    }
}
