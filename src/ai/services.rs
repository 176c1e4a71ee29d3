use std::sync::Arc;

use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use super::client::GenerativeClient;
use super::dto::{ExerciseAnalysis, FoodAnalysis, GenerateRequest, Part};
use crate::errors::AnalysisError;
use crate::profile::dto::Goal;
use crate::stats::dto::DailyStats;

pub const INSIGHT_FALLBACK: &str = "Stay consistent and healthy!";

const FOOD_INSTRUCTION: &str = "Analyze this image. Identify the main food item and estimate its \
nutritional content (calories, protein, carbs, fat). Be realistic.";

#[derive(Debug, Deserialize)]
struct FoodReply {
    name: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseReply {
    activity: String,
    duration_minutes: f64,
    calories_burned: f64,
}

fn food_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING", "description": "Short descriptive name of the food" },
            "calories": { "type": "NUMBER", "description": "Estimated calories" },
            "protein": { "type": "NUMBER", "description": "Estimated protein in grams" },
            "carbs": { "type": "NUMBER", "description": "Estimated carbohydrates in grams" },
            "fat": { "type": "NUMBER", "description": "Estimated fat in grams" }
        },
        "required": ["name", "calories", "protein", "carbs", "fat"]
    })
}

fn exercise_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "activity": { "type": "STRING", "description": "Standardized name of the activity" },
            "durationMinutes": { "type": "NUMBER", "description": "Duration in minutes" },
            "caloriesBurned": {
                "type": "NUMBER",
                "description": "Estimated calories burned based on weight and duration"
            }
        },
        "required": ["activity", "durationMinutes", "caloriesBurned"]
    })
}

/// Removes a Markdown code fence (optionally tagged `json`) wrapped around
/// the whole reply.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    lazy_static! {
        static ref FENCE_RE: Regex = Regex::new(r"(?s)^```(?:[jJ][sS][oO][nN])?\s*(.*?)\s*```$").unwrap();
    }
    let trimmed = text.trim();
    FENCE_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str())
}

fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fence(text))
}

fn non_negative(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite() && *v >= 0.0)
}

/// Typed nutrition operations over a generative model.
#[derive(Clone)]
pub struct NutritionAnalyst {
    client: Arc<dyn GenerativeClient>,
}

impl NutritionAnalyst {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn analyze_food_image(
        &self,
        image: Bytes,
        mime_type: &str,
    ) -> Result<FoodAnalysis, AnalysisError> {
        let request = GenerateRequest::structured(
            vec![
                Part::InlineImage {
                    mime_type: mime_type.to_string(),
                    data: image,
                },
                Part::Text(FOOD_INSTRUCTION.to_string()),
            ],
            food_schema(),
        );

        let text = self.client.generate(request).await.map_err(|e| {
            error!(error = %e, "food analysis request failed");
            AnalysisError::food()
        })?;

        let reply: FoodReply = parse_reply(&text).map_err(|e| {
            error!(error = %e, reply = %text, "food analysis reply unparsable");
            AnalysisError::food()
        })?;

        let name = reply.name.trim();
        if name.is_empty() || !non_negative(&[reply.calories, reply.protein, reply.carbs, reply.fat])
        {
            warn!(reply = %text, "food analysis reply out of range");
            return Err(AnalysisError::food());
        }

        debug!(food = name, calories = reply.calories, "food analyzed");
        Ok(FoodAnalysis {
            name: name.to_string(),
            calories: reply.calories,
            protein_g: reply.protein,
            carbs_g: reply.carbs,
            fat_g: reply.fat,
        })
    }

    #[instrument(skip(self, description))]
    pub async fn analyze_exercise_text(
        &self,
        description: &str,
        user_weight_kg: f64,
    ) -> Result<ExerciseAnalysis, AnalysisError> {
        let prompt = format!(
            "User weight: {user_weight_kg}kg. User input: \"{description}\". \
             Extract the activity, duration, and estimate calories burned."
        );
        let request = GenerateRequest::structured(vec![Part::Text(prompt)], exercise_schema());

        let text = self.client.generate(request).await.map_err(|e| {
            error!(error = %e, "exercise analysis request failed");
            AnalysisError::exercise()
        })?;

        let reply: ExerciseReply = parse_reply(&text).map_err(|e| {
            error!(error = %e, reply = %text, "exercise analysis reply unparsable");
            AnalysisError::exercise()
        })?;

        let activity = reply.activity.trim();
        if activity.is_empty() || !non_negative(&[reply.duration_minutes, reply.calories_burned]) {
            warn!(reply = %text, "exercise analysis reply out of range");
            return Err(AnalysisError::exercise());
        }

        debug!(activity, calories_burned = reply.calories_burned, "exercise analyzed");
        Ok(ExerciseAnalysis {
            activity: activity.to_string(),
            duration_minutes: reply.duration_minutes,
            calories_burned: reply.calories_burned,
        })
    }

    /// Advisory one-liner for the dashboard. Never fails.
    #[instrument(skip(self, stats))]
    pub async fn get_daily_insight(&self, stats: &DailyStats, goal: Goal) -> String {
        let prompt = format!(
            "Data: Consumed {}kcal, Burned {}kcal. Macros: P:{}g, C:{}g, F:{}g. User Goal: {}. \
             Give a 1-sentence motivational insight or tip based on today's performance. \
             Keep it friendly and concise.",
            stats.calories_consumed,
            stats.calories_burned,
            stats.protein_g,
            stats.carbs_g,
            stats.fat_g,
            goal.as_str(),
        );

        match self.client.generate(GenerateRequest::text(prompt)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("empty insight reply; using fallback");
                INSIGHT_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(error = %e, "insight request failed; using fallback");
                INSIGHT_FALLBACK.to_string()
            }
        }
    }
}
