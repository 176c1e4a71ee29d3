use bytes::Bytes;
use serde::Serialize;

/// One piece of prompt content sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineImage { mime_type: String, data: Bytes },
}

/// Provider-neutral generation request. `response_schema` asks the model for
/// JSON output shaped like the given schema; `None` means free text.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub parts: Vec<Part>,
    pub response_schema: Option<serde_json::Value>,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(prompt.into())],
            response_schema: None,
        }
    }

    pub fn structured(parts: Vec<Part>, schema: serde_json::Value) -> Self {
        Self {
            parts,
            response_schema: Some(schema),
        }
    }

    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineImage { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FoodAnalysis {
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExerciseAnalysis {
    pub activity: String,
    pub duration_minutes: f64,
    pub calories_burned: f64,
}
