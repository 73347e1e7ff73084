use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::repo_types::SkillIdRow;
use super::{CardStore, NewUser, Skill, StoreError, UserRow, UserSkillLink, UserStamp};
use crate::purge::Window;

/// Direct Postgres access for the API server.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

fn conflict_or(e: sqlx::Error, what: &str) -> StoreError {
    let unique = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique {
        StoreError::Conflict(what.to_string())
    } else {
        StoreError::Database(e)
    }
}

#[async_trait]
impl CardStore for PgStore {
    async fn find_user(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, description, github_id, qiita_id, x_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, description, github_id, qiita_id, x_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.description)
        .bind(&user.github_id)
        .bind(&user.qiita_id)
        .bind(&user.x_id)
        .execute(&self.db)
        .await
        .map_err(|e| conflict_or(e, &user.id))?;
        Ok(())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, StoreError> {
        let rows = sqlx::query_as::<_, Skill>("SELECT id, name FROM skills ORDER BY id ASC")
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn skills_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, name
              FROM skills
             WHERE id = ANY($1)
             ORDER BY id ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn skill_ids_for_user(&self, user_id: &str) -> Result<Vec<i64>, StoreError> {
        let rows = sqlx::query_as::<_, SkillIdRow>(
            "SELECT skill_id FROM user_skill WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|r| r.skill_id).collect())
    }

    async fn insert_user_skills(&self, links: &[UserSkillLink]) -> Result<(), StoreError> {
        if links.is_empty() {
            return Ok(());
        }
        let user_ids: Vec<String> = links.iter().map(|l| l.user_id.clone()).collect();
        let skill_ids: Vec<i64> = links.iter().map(|l| l.skill_id).collect();
        sqlx::query(
            r#"
            INSERT INTO user_skill (user_id, skill_id)
            SELECT * FROM UNNEST($1::text[], $2::bigint[])
            "#,
        )
        .bind(&user_ids)
        .bind(&skill_ids)
        .execute(&self.db)
        .await
        .map_err(|e| conflict_or(e, "user_skill"))?;
        Ok(())
    }

    async fn users_created_in(&self, window: &Window) -> Result<Vec<UserStamp>, StoreError> {
        let rows = sqlx::query_as::<_, UserStamp>(
            r#"
            SELECT id, created_at
              FROM users
             WHERE created_at >= $1 AND created_at < $2
             ORDER BY created_at ASC
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete_user_skills_for(&self, user_ids: &[String]) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM user_skill WHERE user_id = ANY($1)")
            .bind(user_ids)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }

    async fn delete_users(&self, ids: &[String]) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
