use serde::Serialize;

use crate::entries::dto::LogEntry;
use crate::profile::dto::Goal;

/// Totals derived from the entry store. Never stored on its own.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct DailyStats {
    pub calories_consumed: f64,
    pub calories_burned: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MacroSlice {
    pub name: &'static str,
    pub grams: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MacroSplit {
    pub has_macro_data: bool,
    pub slices: Vec<MacroSlice>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: DailyStats,
    pub calorie_target: i64,
    pub remaining_calories: f64,
    pub progress: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub name: String,
    pub goal: Goal,
    #[serde(flatten)]
    pub summary: StatsResponse,
    pub macros: MacroSplit,
    pub insight: String,
    pub entries: Vec<LogEntry>,
}
