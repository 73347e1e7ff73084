use meishi::{app, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing("meishi=debug,axum=info,tower_http=info");

    let app_state = AppState::init().await?;
    let addr = app_state.config.bind_addr();

    app::serve(app::build_app(app_state), &addr).await
}
