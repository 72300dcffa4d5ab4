//! # Othello API Server Library
//!
//! RPC dispatcher for the Othello account service. Each RPC is a
//! `POST /rpc/<Method>` with a JSON body; handlers decode the request,
//! apply the caller deadline and delegate to
//! [`othello_shared::service::AccountService`].
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Request extractors (caller deadline)
//! - `routes`: RPC and health handlers
//! - `rpc`: Declared methods and their capability

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod rpc;
