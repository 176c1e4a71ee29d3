use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{DashboardResponse, StatsResponse};
use super::services::{macro_split, progress, remaining_calories};
use crate::{errors::rejection, state::AppState};

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/dashboard", get(get_dashboard))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let session = state.session.lock().await;
    let target = session.profile().map_err(rejection)?.calorie_target;
    let stats = session.stats();
    Ok(Json(StatsResponse {
        stats,
        calorie_target: target,
        remaining_calories: remaining_calories(target, &stats),
        progress: progress(target, &stats),
    }))
}

#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, (StatusCode, String)> {
    let (profile, stats, entries) = {
        let session = state.session.lock().await;
        let profile = session.profile().map_err(rejection)?.clone();
        (profile, session.stats(), session.combined_log())
    };

    // advisory; falls back to a fixed line on any failure
    let insight = state.analyst.get_daily_insight(&stats, profile.goal).await;

    let target = profile.calorie_target;
    Ok(Json(DashboardResponse {
        name: profile.name,
        goal: profile.goal,
        summary: StatsResponse {
            stats,
            calorie_target: target,
            remaining_calories: remaining_calories(target, &stats).round(),
            progress: progress(target, &stats),
        },
        macros: macro_split(&stats),
        insight,
        entries,
    }))
}
