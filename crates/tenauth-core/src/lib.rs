//! tenauth core: domain model, store traits and error types.

pub mod error;
pub mod models;
pub mod repository;
