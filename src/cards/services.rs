use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use super::dto::{Card, RegisterCardRequest};
use crate::errors::AppError;
use crate::store::{CardStore, NewUser, StoreError, UserSkillLink};

const ID_MIN_LEN: usize = 3;
const ID_MAX_LEN: usize = 32;

pub(crate) fn is_valid_card_id(id: &str) -> bool {
    lazy_static! {
        static ref CARD_ID_RE: Regex = Regex::new(r"^[A-Za-z]+$").unwrap();
    }
    (ID_MIN_LEN..=ID_MAX_LEN).contains(&id.len()) && CARD_ID_RE.is_match(id)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Checks the registration form and returns the insert payload plus the
/// de-duplicated skill ids.
pub(crate) fn validate(req: RegisterCardRequest) -> Result<(NewUser, Vec<i64>), AppError> {
    if !is_valid_card_id(&req.id) {
        return Err(AppError::Validation(format!(
            "id must be {ID_MIN_LEN}-{ID_MAX_LEN} ASCII letters"
        )));
    }
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    let mut skill_ids = req.skill_ids;
    skill_ids.sort_unstable();
    skill_ids.dedup();
    if skill_ids.is_empty() {
        return Err(AppError::Validation("select at least one skill".into()));
    }

    let user = NewUser {
        id: req.id,
        name: name.to_string(),
        description: req.description.filter(|d| !d.trim().is_empty()),
        github_id: non_blank(req.github_id),
        qiita_id: non_blank(req.qiita_id),
        x_id: non_blank(req.x_id),
    };
    Ok((user, skill_ids))
}

/// Existence check, then the user row, then its skill links.
pub async fn register_card(store: &dyn CardStore, req: RegisterCardRequest) -> Result<Card, AppError> {
    let (user, skill_ids) = validate(req)?;

    if store.find_user(&user.id).await?.is_some() {
        warn!(id = %user.id, "card id already taken");
        return Err(AppError::Conflict(format!("id {} is already in use", user.id)));
    }

    let skills = store.skills_by_ids(&skill_ids).await?;
    if skills.len() != skill_ids.len() {
        let unknown: Vec<String> = skill_ids
            .iter()
            .filter(|id| !skills.iter().any(|s| s.id == **id))
            .map(i64::to_string)
            .collect();
        warn!(unknown = %unknown.join(","), "unknown skill ids");
        return Err(AppError::Validation(format!(
            "unknown skill id(s): {}",
            unknown.join(", ")
        )));
    }

    match store.insert_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            warn!(id = %user.id, "card id taken concurrently");
            return Err(AppError::Conflict(format!("id {} is already in use", user.id)));
        }
        Err(e) => return Err(e.into()),
    }

    let links: Vec<UserSkillLink> = skill_ids
        .iter()
        .map(|&skill_id| UserSkillLink {
            user_id: user.id.clone(),
            skill_id,
        })
        .collect();
    store.insert_user_skills(&links).await?;

    info!(id = %user.id, skills = links.len(), "card registered");
    Ok(Card::from_profile(user, skills))
}

/// Loads a user together with the skills it links to.
pub async fn fetch_card(store: &dyn CardStore, id: &str) -> Result<Option<Card>, StoreError> {
    let Some(row) = store.find_user(id).await? else {
        debug!(id, "card not found");
        return Ok(None);
    };
    let skill_ids = store.skill_ids_for_user(id).await?;
    let skills = store.skills_by_ids(&skill_ids).await?;
    Ok(Some(Card::from_row(row, skills)))
}
