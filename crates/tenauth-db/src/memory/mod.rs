//! In-memory repository implementations.
//!
//! Each store keeps its records behind a `tokio::sync::RwLock` and
//! performs every check-then-write under the write guard, giving the
//! same uniqueness and compare-and-swap guarantees as the SurrealDB
//! repositories. Clones share state.

mod session;
mod tenant;
mod user;

pub use session::MemorySessionRepository;
pub use tenant::MemoryTenantRepository;
pub use user::MemoryUserRepository;
