use std::fmt;

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// One rejected onboarding field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Malformed or incomplete onboarding input. Carries every offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid onboarding input: {}", field_list(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

#[cfg(test)]
impl ValidationError {
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

fn field_list(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.field)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Food,
    Exercise,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Food => f.write_str("food"),
            AnalysisKind::Exercise => f.write_str("exercise"),
        }
    }
}

/// The single error kind the AI layer exposes for a structured analysis.
/// The transport or parse cause is logged where it happens and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to analyze {kind}")]
pub struct AnalysisError {
    pub kind: AnalysisKind,
}

impl AnalysisError {
    pub fn food() -> Self {
        Self {
            kind: AnalysisKind::Food,
        }
    }

    pub fn exercise() -> Self {
        Self {
            kind: AnalysisKind::Exercise,
        }
    }

    /// Retryable message shown in the active logger.
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            AnalysisKind::Food => {
                "Could not analyze food. Please try again or ensure the photo is clear."
            }
            AnalysisKind::Exercise => {
                "Could not log exercise. Try being more specific (e.g., 'Ran 5km in 30 mins')."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("profile already completed for this session")]
    AlreadyOnboarded,
    #[error("a completed profile is required")]
    ProfileRequired,
    #[error("cannot {action} from the {from} view")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
    #[error("an analysis is already in progress")]
    SubmissionInFlight,
}

impl SessionError {
    pub fn status(&self) -> StatusCode {
        match self {
            SessionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::AlreadyOnboarded
            | SessionError::ProfileRequired
            | SessionError::InvalidTransition { .. }
            | SessionError::SubmissionInFlight => StatusCode::CONFLICT,
        }
    }
}

pub(crate) fn rejection(e: SessionError) -> (StatusCode, String) {
    (e.status(), e.to_string())
}
