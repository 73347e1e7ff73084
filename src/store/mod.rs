//! Row-store boundary shared by the API server and the purge job.

use async_trait::async_trait;
use thiserror::Error;

use crate::purge::Window;

#[cfg(test)]
pub mod memory;
pub mod pg;
pub mod repo_types;
pub mod rest;

pub use pg::PgStore;
pub use repo_types::{NewUser, Skill, UserRow, UserSkillLink, UserStamp};
pub use rest::RestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("row already exists: {0}")]
    Conflict(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("timestamp encoding failed: {0}")]
    Encode(#[from] time::error::Format),
}

/// Operations over `users`, `skills` and `user_skill`.
///
/// Every method is a single round trip; callers own ordering.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<UserRow>, StoreError>;
    async fn insert_user(&self, user: &NewUser) -> Result<(), StoreError>;

    async fn list_skills(&self) -> Result<Vec<Skill>, StoreError>;
    async fn skills_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, StoreError>;

    async fn skill_ids_for_user(&self, user_id: &str) -> Result<Vec<i64>, StoreError>;
    async fn insert_user_skills(&self, links: &[UserSkillLink]) -> Result<(), StoreError>;

    /// Users whose `created_at` lies in `[window.start, window.end)`.
    async fn users_created_in(&self, window: &Window) -> Result<Vec<UserStamp>, StoreError>;
    /// Deletes `user_skill` rows owned by any of `user_ids`; returns rows affected.
    async fn delete_user_skills_for(&self, user_ids: &[String]) -> Result<u64, StoreError>;
    /// Deletes `users` rows by id; returns rows affected.
    async fn delete_users(&self, ids: &[String]) -> Result<u64, StoreError>;
}
