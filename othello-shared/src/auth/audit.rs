/// Security audit hook
///
/// The account service reports denied and destructive operations to an
/// [`AuditSink`]. The default sink writes structured `tracing` events on the
/// `othello::audit` target, so deployments can route them to a separate
/// log stream with an `EnvFilter` directive.
///
/// Attempted plaintext passwords are never part of an event.

use crate::models::account::AccountId;

/// Something worth recording in the security log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// A privileged call presented a token that resolves to no live session
    UnknownSession {
        /// RPC that received the token
        operation: &'static str,
    },

    /// A supplied password did not match the stored hash
    PasswordMismatch {
        account_id: AccountId,
        operation: &'static str,
    },

    /// An account was scrubbed and its sessions removed
    AccountDeleted {
        account_id: AccountId,
        sessions_invalidated: u64,
    },
}

/// Receiver for audit events
///
/// Implementations must not block; the service calls `record` inline.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Audit sink that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match event {
            AuditEvent::UnknownSession { operation } => {
                tracing::warn!(target: "othello::audit", operation, "Rejected unknown session");
            }
            AuditEvent::PasswordMismatch {
                account_id,
                operation,
            } => {
                tracing::warn!(
                    target: "othello::audit",
                    account_id = %account_id,
                    operation,
                    "Password did not match"
                );
            }
            AuditEvent::AccountDeleted {
                account_id,
                sessions_invalidated,
            } => {
                tracing::info!(
                    target: "othello::audit",
                    account_id = %account_id,
                    sessions_invalidated,
                    "Account scrubbed and marked deleted"
                );
            }
        }
    }
}
