use tracing::{debug, warn};

use super::dto::{Goal, OnboardingRequest, Profile};
use crate::errors::{FieldError, ValidationError};

const ACTIVITY_FACTOR: f64 = 1.375;
const GOAL_ADJUSTMENT_KCAL: f64 = 500.0;

/// Mifflin-St Jeor BMR with a lightly-active multiplier, shifted for the goal.
pub fn calorie_target(weight_kg: f64, height_cm: f64, age_years: u32, goal: Goal) -> i64 {
    let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years) + 5.0;
    let tdee = bmr * ACTIVITY_FACTOR;
    let target = match goal {
        Goal::Lose => tdee - GOAL_ADJUSTMENT_KCAL,
        Goal::Maintain => tdee,
        Goal::Gain => tdee + GOAL_ADJUSTMENT_KCAL,
    };
    target.round() as i64
}

/// Validates the onboarding form and derives the profile. No partial profile
/// is ever returned.
pub fn complete_onboarding(form: OnboardingRequest) -> Result<Profile, ValidationError> {
    let mut fields = Vec::new();

    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned);
    if name.is_none() {
        fields.push(FieldError {
            field: "name",
            message: "Name is required".into(),
        });
    }

    let weight_kg = positive(form.weight_kg, "weight_kg", "Weight", &mut fields);
    let height_cm = positive(form.height_cm, "height_cm", "Height", &mut fields);
    let age_years = match positive(form.age_years, "age_years", "Age", &mut fields) {
        Some(age) if age.fract() != 0.0 || age > f64::from(u32::MAX) => {
            fields.push(FieldError {
                field: "age_years",
                message: "Age must be a whole number".into(),
            });
            None
        }
        Some(age) => Some(age as u32),
        None => None,
    };

    match (name, weight_kg, height_cm, age_years) {
        (Some(name), Some(weight_kg), Some(height_cm), Some(age_years)) if fields.is_empty() => {
            let calorie_target = calorie_target(weight_kg, height_cm, age_years, form.goal);
            debug!(goal = form.goal.as_str(), calorie_target, "profile derived");
            Ok(Profile {
                name,
                weight_kg,
                height_cm,
                age_years,
                goal: form.goal,
                calorie_target,
            })
        }
        _ => {
            warn!(count = fields.len(), "onboarding rejected");
            Err(ValidationError { fields })
        }
    }
}

fn positive(
    value: Option<f64>,
    field: &'static str,
    label: &str,
    fields: &mut Vec<FieldError>,
) -> Option<f64> {
    match value {
        None => {
            fields.push(FieldError {
                field,
                message: format!("{label} is required"),
            });
            None
        }
        Some(v) if !v.is_finite() || v <= 0.0 => {
            fields.push(FieldError {
                field,
                message: format!("{label} must be a positive number"),
            });
            None
        }
        Some(v) => Some(v),
    }
}
