use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{OnboardingRequest, Profile, ValidationResponse};
use crate::{
    errors::{rejection, SessionError},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/onboarding", post(onboard))
        .route("/profile", get(get_profile))
}

#[instrument(skip(state, payload))]
pub async fn onboard(
    State(state): State<AppState>,
    Json(payload): Json<OnboardingRequest>,
) -> Result<(StatusCode, Json<Profile>), (StatusCode, Json<ValidationResponse>)> {
    let mut session = state.session.lock().await;
    match session.complete_onboarding(payload) {
        Ok(profile) => {
            info!(target_kcal = profile.calorie_target, "profile created");
            Ok((StatusCode::CREATED, Json(profile)))
        }
        Err(SessionError::Validation(v)) => {
            warn!(error = %v, "onboarding validation failed");
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationResponse {
                    message: "Please fill in every field with a positive value".into(),
                    fields: v.fields,
                }),
            ))
        }
        Err(e) => Err((
            e.status(),
            Json(ValidationResponse {
                message: e.to_string(),
                fields: Vec::new(),
            }),
        )),
    }
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let session = state.session.lock().await;
    let profile = session.profile().map_err(rejection)?;
    Ok(Json(profile.clone()))
}
