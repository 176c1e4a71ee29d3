use serde::{Deserialize, Serialize};

use crate::errors::FieldError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    #[default]
    Maintain,
    Gain,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Lose => "lose",
            Goal::Maintain => "maintain",
            Goal::Gain => "gain",
        }
    }
}

/// Static user attributes, fixed for the session once onboarding completes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Profile {
    pub name: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: u32,
    pub goal: Goal,
    pub calorie_target: i64,
}

/// Onboarding form as submitted. Every field is optional on the wire so a
/// partial form reports all missing fields at once instead of failing on the first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingRequest {
    pub name: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age_years: Option<f64>,
    #[serde(default)]
    pub goal: Goal,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub message: String,
    pub fields: Vec<FieldError>,
}
