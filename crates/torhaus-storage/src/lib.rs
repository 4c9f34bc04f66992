//! Storage abstraction for torhaus.
//!
//! Backend crates (e.g., torhaus-store-sqlite, torhaus-store-postgres)
//! implement the [`Store`] trait so the domain crates never depend on a
//! specific database engine or schema details.

use thiserror::Error;

mod store;
pub mod types;

pub use store::Store;
pub use types::*;

#[cfg(feature = "test-support")]
pub use store::MockStore;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    /// Transient connection-level failure; safe for the caller to retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("backend error: {0}")]
    Backend(String),
}
