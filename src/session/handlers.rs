use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::services::SessionSnapshot;
use crate::{errors::rejection, state::AppState};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/view/food", post(start_food_log))
        .route("/view/exercise", post(start_exercise_log))
        .route("/view/back", post(back))
}

#[instrument(skip(state))]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

#[instrument(skip(state))]
pub async fn start_food_log(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    session.start_food_log().map_err(rejection)?;
    Ok(Json(session.snapshot()))
}

#[instrument(skip(state))]
pub async fn start_exercise_log(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    session.start_exercise_log().map_err(rejection)?;
    Ok(Json(session.snapshot()))
}

#[instrument(skip(state))]
pub async fn back(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    session.back().map_err(rejection)?;
    Ok(Json(session.snapshot()))
}
