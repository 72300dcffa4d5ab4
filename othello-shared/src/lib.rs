//! # Othello Shared Library
//!
//! Account and session lifecycle for the Othello game server: credential
//! hashing, session issuance, session-bound authorization and soft-delete.
//! The RPC dispatcher in `othello-api` is a thin layer over [`service`].
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing and the security audit hook
//! - `db`: Connection pool, migrations, server-start ledger
//! - `error`: Account service error taxonomy
//! - `models`: Account and session records with their SQL
//! - `service`: CreateAccount, Authenticate and DeleteAccount
//! - `store`: Transactional storage traits with PostgreSQL and in-memory backends

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

/// Current version of the Othello shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
