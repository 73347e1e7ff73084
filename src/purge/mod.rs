//! Nightly cleanup of demo users registered the previous JST day.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

mod job;
mod window;

pub use job::{run_purge, PurgeOutcome, PurgeReport};
pub use window::{yesterday_window, yesterday_window_at, Window, WindowLabels, JST};

#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("store client setup failed: {0}")]
    Client(#[source] StoreError),

    #[error("users select failed: {0}")]
    Select(#[source] StoreError),

    #[error("user_skill delete failed: {0}")]
    DependentDelete(#[source] StoreError),

    #[error("users delete failed: {0}")]
    PrimaryDelete(#[source] StoreError),

    #[error("window formatting failed: {0}")]
    Format(#[from] time::error::Format),
}

impl PurgeError {
    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PurgeError::Configuration(_) => 2,
            _ => 1,
        }
    }
}
