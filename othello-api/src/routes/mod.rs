/// API route handlers
///
/// - `health`: Health check endpoint
/// - `accounts`: CreateAccount, Authenticate/Login, DeleteAccount
/// - `games`: Declared-but-unimplemented and unknown RPC methods

pub mod accounts;
pub mod games;
pub mod health;
