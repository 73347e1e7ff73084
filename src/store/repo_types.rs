use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: String,                   // registrant-chosen identifier
    pub name: String,                 // display name
    pub description: Option<String>,  // free text, may contain HTML
    pub github_id: Option<String>,
    pub qiita_id: Option<String>,
    pub x_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,   // assigned by the store
}

/// Insert payload for `users`; `created_at` is left to the store.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub github_id: Option<String>,
    pub qiita_id: Option<String>,
    pub x_id: Option<String>,
}

/// Catalogue entry in `skills`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

/// Association row in `user_skill`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSkillLink {
    pub user_id: String,
    pub skill_id: i64,
}

/// The two columns the purge job selects.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStamp {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize, FromRow)]
pub(crate) struct SkillIdRow {
    pub skill_id: i64,
}
