//! In-process `CardStore` for tests. Records every call and can fail a chosen
//! operation on demand.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::{macros::datetime, OffsetDateTime};

use super::{CardStore, NewUser, Skill, StoreError, UserRow, UserSkillLink, UserStamp};
use crate::purge::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    FindUser,
    InsertUser,
    ListSkills,
    SkillsByIds,
    SkillIdsForUser,
    InsertUserSkills,
    UsersCreatedIn,
    DeleteUserSkills,
    DeleteUsers,
}

impl StoreOp {
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            StoreOp::InsertUser
                | StoreOp::InsertUserSkills
                | StoreOp::DeleteUserSkills
                | StoreOp::DeleteUsers
        )
    }
}

struct Inner {
    users: Vec<UserRow>,
    skills: Vec<Skill>,
    links: Vec<UserSkillLink>,
    calls: Vec<StoreOp>,
    fail_on: Option<StoreOp>,
    clock: OffsetDateTime,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                users: Vec::new(),
                skills: Vec::new(),
                links: Vec::new(),
                calls: Vec::new(),
                fail_on: None,
                clock: datetime!(2024-03-14 03:00 UTC),
            }),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store poisoned")
    }

    fn enter(&self, op: StoreOp) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(op);
        if inner.fail_on == Some(op) {
            return Err(StoreError::Api {
                status: 503,
                message: format!("injected failure on {op:?}"),
            });
        }
        Ok(inner)
    }

    pub fn with_skills(self, names: &[&str]) -> Self {
        {
            let mut inner = self.lock();
            for name in names {
                let id = inner.skills.len() as i64 + 1;
                inner.skills.push(Skill {
                    id,
                    name: name.to_string(),
                });
            }
        }
        self
    }

    /// Timestamp assigned to rows inserted through the trait.
    pub fn set_clock(&self, now: OffsetDateTime) {
        self.lock().clock = now;
    }

    pub fn fail_on(&self, op: StoreOp) {
        self.lock().fail_on = Some(op);
    }

    pub fn recover(&self) {
        self.lock().fail_on = None;
    }

    pub fn seed_user(&self, id: &str, created_at: OffsetDateTime, skill_ids: &[i64]) {
        let mut inner = self.lock();
        inner.users.push(UserRow {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: None,
            github_id: None,
            qiita_id: None,
            x_id: None,
            created_at,
        });
        for &skill_id in skill_ids {
            inner.links.push(UserSkillLink {
                user_id: id.to_string(),
                skill_id,
            });
        }
    }

    pub fn calls(&self) -> Vec<StoreOp> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.lock().users.iter().map(|u| u.id.clone()).collect()
    }

    pub fn links(&self) -> Vec<UserSkillLink> {
        self.lock().links.clone()
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn find_user(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        let inner = self.enter(StoreOp::FindUser)?;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        let mut inner = self.enter(StoreOp::InsertUser)?;
        if inner.users.iter().any(|u| u.id == user.id) {
            return Err(StoreError::Conflict(user.id.clone()));
        }
        let created_at = inner.clock;
        inner.users.push(UserRow {
            id: user.id.clone(),
            name: user.name.clone(),
            description: user.description.clone(),
            github_id: user.github_id.clone(),
            qiita_id: user.qiita_id.clone(),
            x_id: user.x_id.clone(),
            created_at,
        });
        Ok(())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, StoreError> {
        let inner = self.enter(StoreOp::ListSkills)?;
        Ok(inner.skills.clone())
    }

    async fn skills_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, StoreError> {
        let inner = self.enter(StoreOp::SkillsByIds)?;
        Ok(inner
            .skills
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn skill_ids_for_user(&self, user_id: &str) -> Result<Vec<i64>, StoreError> {
        let inner = self.enter(StoreOp::SkillIdsForUser)?;
        Ok(inner
            .links
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.skill_id)
            .collect())
    }

    async fn insert_user_skills(&self, links: &[UserSkillLink]) -> Result<(), StoreError> {
        let mut inner = self.enter(StoreOp::InsertUserSkills)?;
        inner.links.extend_from_slice(links);
        Ok(())
    }

    async fn users_created_in(&self, window: &Window) -> Result<Vec<UserStamp>, StoreError> {
        let inner = self.enter(StoreOp::UsersCreatedIn)?;
        let mut rows: Vec<UserStamp> = inner
            .users
            .iter()
            .filter(|u| window.contains(u.created_at))
            .map(|u| UserStamp {
                id: u.id.clone(),
                created_at: u.created_at,
            })
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn delete_user_skills_for(&self, user_ids: &[String]) -> Result<u64, StoreError> {
        let mut inner = self.enter(StoreOp::DeleteUserSkills)?;
        let before = inner.links.len();
        inner.links.retain(|l| !user_ids.contains(&l.user_id));
        Ok((before - inner.links.len()) as u64)
    }

    async fn delete_users(&self, ids: &[String]) -> Result<u64, StoreError> {
        let mut inner = self.enter(StoreOp::DeleteUsers)?;
        let before = inner.users.len();
        inner.users.retain(|u| !ids.contains(&u.id));
        Ok((before - inner.users.len()) as u64)
    }
}
