/// Database models for the account service
///
/// # Models
///
/// - `account`: Account records with soft-delete scrubbing
/// - `session`: Session tokens mapping to their owning account
///
/// Each model carries its own SQL. Storage traits and transaction handling
/// live in [`crate::store`].

pub mod account;
pub mod session;
