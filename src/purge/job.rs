use time::OffsetDateTime;
use tracing::{error, info, warn};

use super::window::{yesterday_window, JST};
use super::PurgeError;
use crate::store::CardStore;

/// Identifiers echoed to the log before eliding the rest.
const PREVIEW_IDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// The window matched no users; nothing was deleted.
    NothingToDo,
    /// Dry run: users matched, store left untouched.
    DryRun { matched: Vec<String> },
    Purged(PurgeReport),
}

/// Counts from a run that deleted rows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub users_matched: usize,
    pub user_skills_deleted: u64,
    pub users_deleted: u64,
}

/// Deletes users created yesterday (JST) together with their skill links.
///
/// `user_skill` rows are always removed before their `users` rows. Every
/// failure ends the run; the next scheduled run recomputes the window.
pub async fn run_purge(
    store: &dyn CardStore,
    now: OffsetDateTime,
    dry_run: bool,
) -> Result<PurgeOutcome, PurgeError> {
    let window = yesterday_window(now);
    let labels = window.describe(JST)?;
    info!(dry_run, "deleting records created between (UTC): {labels}");
    info!(
        start = %labels.start_local,
        end = %labels.end_local,
        "window in JST"
    );

    let users = store.users_created_in(&window).await.map_err(|e| {
        error!(error = %e, "users select failed");
        PurgeError::Select(e)
    })?;
    let ids: Vec<String> = users.into_iter().map(|u| u.id).collect();

    info!(matched = ids.len(), "matched users");
    if ids.is_empty() {
        info!("no users to delete");
        return Ok(PurgeOutcome::NothingToDo);
    }
    info!("first few: {}", preview(&ids));

    if dry_run {
        warn!(matched = ids.len(), "dry run: matched but skipping deletion");
        return Ok(PurgeOutcome::DryRun { matched: ids });
    }

    let user_skills_deleted = store.delete_user_skills_for(&ids).await.map_err(|e| {
        error!(error = %e, "user_skill delete failed");
        PurgeError::DependentDelete(e)
    })?;
    info!(count = user_skills_deleted, "deleted user_skill rows");

    let users_deleted = store.delete_users(&ids).await.map_err(|e| {
        error!(error = %e, "users delete failed");
        PurgeError::PrimaryDelete(e)
    })?;
    info!(count = users_deleted, "deleted users rows");

    let report = PurgeReport {
        users_matched: ids.len(),
        user_skills_deleted,
        users_deleted,
    };
    info!(
        outcome = "success",
        users = report.users_deleted,
        user_skills = report.user_skills_deleted,
        "cleanup completed"
    );
    Ok(PurgeOutcome::Purged(report))
}

fn preview(ids: &[String]) -> String {
    let shown = ids[..ids.len().min(PREVIEW_IDS)].join(", ");
    if ids.len() > PREVIEW_IDS {
        format!("{shown} ...")
    } else {
        shown
    }
}
