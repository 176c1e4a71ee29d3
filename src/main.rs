mod ai;
mod app;
mod config;
mod entries;
mod errors;
mod images;
mod profile;
mod session;
mod state;
mod stats;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "fitai=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init()?;
    tracing::info!(
        model = %app_state.config.gemini.model,
        timeout_secs = app_state.config.gemini.timeout_secs,
        "gemini client ready"
    );

    app::serve(app::build_app(app_state)).await
}
