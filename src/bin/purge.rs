//! Nightly job: delete users (and their skill links) registered yesterday, JST.
//!
//! Env: `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY` (required), `DRY_RUN=1`.

use std::process::ExitCode;

use meishi::{
    config::PurgeConfig,
    purge::{run_purge, PurgeError},
    store::RestStore,
    telemetry,
};
use time::OffsetDateTime;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::init_tracing("meishi=info");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(outcome = "fatal", error = %e, "purge aborted");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), PurgeError> {
    let config = PurgeConfig::from_env()?;
    let store = RestStore::new(&config.supabase_url, &config.service_role_key)
        .map_err(PurgeError::Client)?;
    run_purge(&store, OffsetDateTime::now_utc(), config.dry_run).await?;
    Ok(())
}
