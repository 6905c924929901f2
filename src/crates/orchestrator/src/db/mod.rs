//! Database module for orchestrator
//!
//! Owns the shared Postgres pool (`connection`) and the generic error type
//! (`error`) handed to the checkpoint saver, credit ledger, and sandbox
//! controller. Table-specific access lives in those crates, not here.

pub mod connection;
pub mod error;

pub use connection::{DatabaseConnection, DatabasePool, PoolStatistics};
pub use error::{DatabaseError, DbResult};
