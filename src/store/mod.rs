//! Credential store: the only place user records live.
//!
//! Handlers and flows talk to `dyn UserStore`; PostgreSQL backs it in
//! production and [`MemoryUserStore`] in tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod repo;
mod repo_types;

pub use memory::MemoryUserStore;
pub use repo::PgUserStore;
pub use repo_types::{NewUser, Role, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `email` must already be normalized (trimmed, lowercase).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Inserts atomically; an existing email yields [`StoreError::DuplicateEmail`].
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// Removes every user and returns how many were deleted.
    async fn delete_all(&self) -> Result<u64, StoreError>;
}
