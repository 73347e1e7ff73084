use serde::{Deserialize, Serialize};

use crate::store::{NewUser, Skill, UserRow};

/// Request body for card registration.
#[derive(Debug, Deserialize)]
pub struct RegisterCardRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub github_id: Option<String>,
    #[serde(default)]
    pub qiita_id: Option<String>,
    #[serde(default)]
    pub x_id: Option<String>,
    #[serde(default)]
    pub skill_ids: Vec<i64>,
}

/// Public card as served to the detail page.
///
/// `description` is stored HTML and is returned verbatim; the renderer must
/// sanitize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub description: String,
    pub skills: Vec<Skill>,
    pub github_url: Option<String>,
    pub qiita_url: Option<String>,
    pub x_url: Option<String>,
}

impl Card {
    pub fn from_profile(profile: NewUser, skills: Vec<Skill>) -> Self {
        Self {
            github_url: profile_link("https://github.com/", profile.github_id.as_deref()),
            qiita_url: profile_link("https://qiita.com/", profile.qiita_id.as_deref()),
            x_url: profile_link("https://x.com/", profile.x_id.as_deref()),
            id: profile.id,
            name: profile.name,
            description: profile.description.unwrap_or_default(),
            skills,
        }
    }

    pub fn from_row(row: UserRow, skills: Vec<Skill>) -> Self {
        let profile = NewUser {
            id: row.id,
            name: row.name,
            description: row.description,
            github_id: row.github_id,
            qiita_id: row.qiita_id,
            x_id: row.x_id,
        };
        Self::from_profile(profile, skills)
    }
}

fn profile_link(base: &str, handle: Option<&str>) -> Option<String> {
    handle
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| format!("{base}{h}"))
}

#[derive(Debug, Serialize)]
pub struct SkillList {
    pub skills: Vec<Skill>,
}
