//! PostgREST client for the managed backend (`{endpoint}/rest/v1/{table}`).
//!
//! Filters use PostgREST operator syntax (`eq.`, `gte.`, `lt.`, `in.(..)`).
//! Deletes ask for `Prefer: count=exact` and read the affected-row count from
//! the `Content-Range` header.

use async_trait::async_trait;
use reqwest::{header::CONTENT_RANGE, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use super::repo_types::SkillIdRow;
use super::{CardStore, NewUser, Skill, StoreError, UserRow, UserSkillLink, UserStamp};
use crate::purge::Window;

const USER_COLUMNS: &str = "id,name,description,github_id,qiita_id,x_id,created_at";

#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", endpoint.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Vec<T>, StoreError> {
        let resp = check(req.send().await?).await?;
        let rows = resp.json::<Vec<T>>().await?;
        Ok(rows)
    }

    async fn delete_where(&self, table: &str, column: &str, filter: String) -> Result<u64, StoreError> {
        let req = self
            .request(Method::DELETE, table)
            .query(&[(column, filter)])
            .header("Prefer", "count=exact");
        let resp = check(req.send().await?).await?;
        let count = affected_rows(&resp)?;
        debug!(table, count, "rest delete");
        Ok(count)
    }

    async fn insert<T: serde::Serialize + ?Sized>(&self, table: &str, rows: &T) -> Result<(), StoreError> {
        let req = self
            .request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(rows);
        check(req.send().await?).await?;
        Ok(())
    }
}

async fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    if status == StatusCode::CONFLICT {
        return Err(StoreError::Conflict(message));
    }
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

/// `Content-Range: 0-4/5` or `*/5` → 5.
fn affected_rows(resp: &Response) -> Result<u64, StoreError> {
    let header = resp
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| StoreError::Decode("missing Content-Range header".into()))?;
    parse_total(header)
}

fn parse_total(content_range: &str) -> Result<u64, StoreError> {
    content_range
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| StoreError::Decode(format!("bad Content-Range: {content_range}")))
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

fn in_text(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

fn in_ints(values: &[i64]) -> String {
    let joined: Vec<String> = values.iter().map(i64::to_string).collect();
    format!("in.({})", joined.join(","))
}

#[async_trait]
impl CardStore for RestStore {
    async fn find_user(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        let req = self
            .request(Method::GET, "users")
            .query(&[("select", USER_COLUMNS.to_string()), ("id", eq(id))]);
        let mut rows = self.fetch::<UserRow>(req).await?;
        Ok(rows.pop())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        self.insert("users", std::slice::from_ref(user)).await
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, StoreError> {
        let req = self
            .request(Method::GET, "skills")
            .query(&[("select", "id,name"), ("order", "id.asc")]);
        self.fetch(req).await
    }

    async fn skills_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let req = self.request(Method::GET, "skills").query(&[
            ("select", "id,name".to_string()),
            ("id", in_ints(ids)),
            ("order", "id.asc".to_string()),
        ]);
        self.fetch(req).await
    }

    async fn skill_ids_for_user(&self, user_id: &str) -> Result<Vec<i64>, StoreError> {
        let req = self
            .request(Method::GET, "user_skill")
            .query(&[("select", "skill_id".to_string()), ("user_id", eq(user_id))]);
        let rows = self.fetch::<SkillIdRow>(req).await?;
        Ok(rows.into_iter().map(|r| r.skill_id).collect())
    }

    async fn insert_user_skills(&self, links: &[UserSkillLink]) -> Result<(), StoreError> {
        if links.is_empty() {
            return Ok(());
        }
        self.insert("user_skill", links).await
    }

    async fn users_created_in(&self, window: &Window) -> Result<Vec<UserStamp>, StoreError> {
        let start = window.start.format(&Rfc3339)?;
        let end = window.end.format(&Rfc3339)?;
        let req = self.request(Method::GET, "users").query(&[
            ("select", "id,created_at".to_string()),
            ("created_at", format!("gte.{start}")),
            ("created_at", format!("lt.{end}")),
            ("order", "created_at.asc".to_string()),
        ]);
        self.fetch(req).await
    }

    async fn delete_user_skills_for(&self, user_ids: &[String]) -> Result<u64, StoreError> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        self.delete_where("user_skill", "user_id", in_text(user_ids)).await
    }

    async fn delete_users(&self, ids: &[String]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.delete_where("users", "id", in_text(ids)).await
    }
}
