//! tenauth database: SurrealDB connection management, schema
//! migrations, and the credential store implementations.
//!
//! - [`repository`]: SurrealDB-backed tenant, user and session stores
//! - [`memory`]: in-memory stores with the same guarantees, for tests
//!   and single-process setups

mod connection;
mod error;
pub mod memory;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbCredentials, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
