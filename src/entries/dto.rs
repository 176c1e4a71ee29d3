use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FoodEntry {
    pub id: Uuid,
    pub timestamp: i64, // epoch millis
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExerciseEntry {
    pub id: Uuid,
    pub timestamp: i64, // epoch millis
    pub activity: String,
    pub duration_minutes: f64,
    pub calories_burned: f64,
}

/// A logged record, discriminated by `kind` on the wire.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogEntry {
    Food(FoodEntry),
    Exercise(ExerciseEntry),
}

impl LogEntry {
    pub fn timestamp(&self) -> i64 {
        match self {
            LogEntry::Food(e) => e.timestamp,
            LogEntry::Exercise(e) => e.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFoodBase64 {
    pub image_b64: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExerciseRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ExerciseExamples {
    pub examples: &'static [&'static str],
}
