use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::dto::{
    CreateExerciseRequest, CreateFoodBase64, ExerciseEntry, ExerciseExamples, FoodEntry, LogEntry,
};
use crate::{
    errors::rejection,
    images::services::{build_upload, decode_base64_upload, UploadError, UploadItem},
    state::AppState,
};

pub const EXERCISE_EXAMPLES: &[&str] = &[
    "Ran 5km in 25 mins",
    "30 mins yoga",
    "High intensity interval training 20m",
];

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024; // 20MB

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/entries", get(list_entries))
        .route("/food/:id/image", get(get_food_image))
        .route("/exercise/examples", get(exercise_examples))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/food", post(log_food_multipart)) // multipart: image
        .route("/food/base64", post(log_food_base64))
        .route("/exercise", post(log_exercise))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_entries(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.session.lock().await.combined_log())
}

#[instrument(skip(state))]
pub async fn get_food_image(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let session = state.session.lock().await;
    let Some(image) = session.store().image(id) else {
        return (StatusCode::NOT_FOUND, "Photo not found").into_response();
    };
    (
        [(header::CONTENT_TYPE, image.content_type.clone())],
        image.body.clone(),
    )
        .into_response()
}

pub async fn exercise_examples() -> Json<ExerciseExamples> {
    Json(ExerciseExamples {
        examples: EXERCISE_EXAMPLES,
    })
}

/// POST /food (multipart). Field `image` (also `file`, `files`, `files[]`);
/// the first one found is analyzed.
#[instrument(skip(state, mp))]
pub async fn log_food_multipart(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<FoodEntry>), (StatusCode, String)> {
    let mut upload = None;
    loop {
        let field = match mp.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "multipart read failed");
                return Err((StatusCode::BAD_REQUEST, e.body_text()));
            }
        };
        if !matches!(field.name(), Some("image" | "file" | "files" | "files[]")) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
        upload = Some(build_upload(data, content_type.as_deref()).map_err(bad_upload)?);
        break;
    }
    let upload = upload.ok_or_else(|| bad_upload(UploadError::Missing))?;
    submit_food(&state, upload).await
}

/// POST /food/base64 { image_b64: "...", content_type?: "image/jpeg" }
#[instrument(skip(state, body))]
pub async fn log_food_base64(
    State(state): State<AppState>,
    Json(body): Json<CreateFoodBase64>,
) -> Result<(StatusCode, Json<FoodEntry>), (StatusCode, String)> {
    let upload =
        decode_base64_upload(&body.image_b64, body.content_type.as_deref()).map_err(bad_upload)?;
    submit_food(&state, upload).await
}

#[instrument(skip(state, body))]
pub async fn log_exercise(
    State(state): State<AppState>,
    Json(body): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseEntry>), (StatusCode, String)> {
    let description = body.description.trim().to_string();
    if description.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "description is required".into()));
    }

    let weight_kg = state
        .session
        .lock()
        .await
        .begin_exercise_submission(description.clone())
        .map_err(rejection)?;

    let task_state = state.clone();
    let outcome = tokio::spawn(async move {
        let result = task_state
            .analyst
            .analyze_exercise_text(&description, weight_kg)
            .await;
        task_state
            .session
            .lock()
            .await
            .finish_exercise_submission(result)
    })
    .await
    .map_err(task_failed)?;

    let entry = outcome.map_err(|e| {
        error!(error = %e, "exercise not logged");
        (StatusCode::BAD_GATEWAY, e.user_message().to_string())
    })?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// The session lock is released while the model works; the flow's
// `submitting` status keeps a second submission out. Analysis and completion
// run on their own task so a dropped request still settles the flow.
async fn submit_food(
    state: &AppState,
    upload: UploadItem,
) -> Result<(StatusCode, Json<FoodEntry>), (StatusCode, String)> {
    state
        .session
        .lock()
        .await
        .begin_food_submission(upload.clone())
        .map_err(rejection)?;

    let task_state = state.clone();
    let outcome = tokio::spawn(async move {
        let result = task_state
            .analyst
            .analyze_food_image(upload.body.clone(), &upload.content_type)
            .await;
        task_state
            .session
            .lock()
            .await
            .finish_food_submission(upload, result)
    })
    .await
    .map_err(task_failed)?;

    let entry = outcome.map_err(|e| {
        error!(error = %e, "food not logged");
        (StatusCode::BAD_GATEWAY, e.user_message().to_string())
    })?;
    Ok((StatusCode::CREATED, Json(entry)))
}

fn task_failed(e: tokio::task::JoinError) -> (StatusCode, String) {
    error!(error = %e, "analysis task failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "analysis task failed".to_string(),
    )
}

fn bad_upload(e: UploadError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}
