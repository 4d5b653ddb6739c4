//! Infrastructure Database Layer
//!
//! PostgreSQL adapter for the dues ledger. The crate follows the
//! repository pattern: `PgLedgerStore` implements the domain's
//! `LedgerStore` port, and the per-member write serialization required by
//! the allocation engine is enforced at the storage level with a
//! `SELECT ... FOR UPDATE` row lock inside one transaction per commit.
//!
//! Queries use the runtime query API, so the crate builds without a live
//! database; the schema lives in `migrations/0001_init.sql` and expresses
//! the ledger's conservation invariants as check constraints.

pub mod error;
pub mod pool;
pub mod store;

pub use error::DatabaseError;
pub use pool::{create_pool, DatabaseConfig, DatabasePool};
pub use store::PgLedgerStore;
