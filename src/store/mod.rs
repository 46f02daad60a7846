//! Persistence seams for users and tasks.
//!
//! The stores are plain storage: they know nothing about who is calling.
//! Ownership checks happen in [`crate::services::tasks`].
//!
//! Two implementations are provided: [`postgres`] for production and [`memory`]
//! for development without a database and for tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewTask, NewUser, Task, TaskChanges, TaskFilter, User, UserChanges};

pub use memory::{MemoryTaskStore, MemoryUserStore};
pub use postgres::{PgTaskStore, PgUserStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another user already holds this (case-insensitive) email.
    #[error("email already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Persisted user records. Emails passed in are expected to be normalized already.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Applies `changes` and returns the updated record, or `None` if `id` is unknown.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError>;
}

/// Persisted task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks matching `filter`, newest-created first.
    async fn find(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    async fn create(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn update(&self, id: Uuid, changes: TaskChanges) -> Result<Option<Task>, StoreError>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
