/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Embedded schema migrations and the server-start ledger
///
/// Per-table queries are in [`crate::models`]; transactional access goes
/// through [`crate::store::postgres::PgStore`].

pub mod migrations;
pub mod pool;
