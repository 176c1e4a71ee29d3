use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::dto::{ExerciseAnalysis, FoodAnalysis};
use crate::entries::dto::{ExerciseEntry, FoodEntry, LogEntry};
use crate::entries::repo::{EntryStore, StoredImage};
use crate::errors::{AnalysisError, SessionError};
use crate::images::services::{image_ref, UploadItem};
use crate::profile::dto::{OnboardingRequest, Profile};
use crate::profile::services::complete_onboarding;
use crate::stats::dto::DailyStats;
use crate::stats::services::compute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    Onboarding,
    Dashboard,
    FoodLog,
    ExerciseLog,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Onboarding => "onboarding",
            View::Dashboard => "dashboard",
            View::FoodLog => "food log",
            View::ExerciseLog => "exercise log",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    Idle,
    Submitting,
}

/// One logger screen: its last input, its last error, and whether an
/// analysis is in flight.
#[derive(Debug, Clone)]
pub struct LoggerFlow<I> {
    pub status: FlowStatus,
    pub input: Option<I>,
    pub error: Option<String>,
}

impl<I> Default for LoggerFlow<I> {
    fn default() -> Self {
        Self {
            status: FlowStatus::Idle,
            input: None,
            error: None,
        }
    }
}

impl<I: Clone> LoggerFlow<I> {
    fn begin(&mut self, input: I) -> Result<(), SessionError> {
        if self.status == FlowStatus::Submitting {
            return Err(SessionError::SubmissionInFlight);
        }
        self.status = FlowStatus::Submitting;
        self.input = Some(input);
        self.error = None;
        Ok(())
    }

    fn fail(&mut self, error: &AnalysisError) {
        self.status = FlowStatus::Idle;
        self.error = Some(error.user_message().to_string());
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub status: FlowStatus,
    pub error: Option<String>,
    pub has_input: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub view: View,
    pub profile: Option<Profile>,
    pub food_log: FlowSnapshot,
    pub exercise_log: FlowSnapshot,
}

/// Top-level state for the single user session. Every mutation goes through
/// a method here; stats are republished as the last step of each append.
#[derive(Debug)]
pub struct Session {
    view: View,
    profile: Option<Profile>,
    store: EntryStore,
    stats: DailyStats,
    food_flow: LoggerFlow<UploadItem>,
    exercise_flow: LoggerFlow<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

impl Session {
    pub fn new() -> Self {
        Self {
            view: View::Onboarding,
            profile: None,
            store: EntryStore::default(),
            stats: DailyStats::default(),
            food_flow: LoggerFlow::default(),
            exercise_flow: LoggerFlow::default(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn profile(&self) -> Result<&Profile, SessionError> {
        self.profile.as_ref().ok_or(SessionError::ProfileRequired)
    }

    pub fn stats(&self) -> DailyStats {
        self.stats
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view(),
            profile: self.profile.clone(),
            food_log: FlowSnapshot {
                status: self.food_flow.status,
                error: self.food_flow.error.clone(),
                has_input: self.food_flow.input.is_some(),
                draft: None,
            },
            exercise_log: FlowSnapshot {
                status: self.exercise_flow.status,
                error: self.exercise_flow.error.clone(),
                has_input: self.exercise_flow.input.is_some(),
                draft: self.exercise_flow.input.clone(),
            },
        }
    }

    fn transition(&mut self, expected: &[View], action: &'static str, to: View) -> Result<(), SessionError> {
        if !expected.contains(&self.view) {
            warn!(from = self.view.as_str(), action, "rejected view transition");
            return Err(SessionError::InvalidTransition {
                from: self.view.as_str(),
                action,
            });
        }
        if to != View::Onboarding {
            self.profile()?;
        }
        debug!(from = self.view.as_str(), to = to.as_str(), "view transition");
        self.view = to;
        Ok(())
    }

    // --- onboarding ---

    pub fn complete_onboarding(&mut self, form: OnboardingRequest) -> Result<Profile, SessionError> {
        if self.profile.is_some() {
            return Err(SessionError::AlreadyOnboarded);
        }
        if self.view != View::Onboarding {
            return Err(SessionError::InvalidTransition {
                from: self.view.as_str(),
                action: "complete onboarding",
            });
        }
        let profile = complete_onboarding(form)?;
        info!(calorie_target = profile.calorie_target, goal = profile.goal.as_str(), "onboarding complete");
        self.profile = Some(profile.clone());
        self.view = View::Dashboard;
        Ok(profile)
    }

    // --- navigation ---

    pub fn start_food_log(&mut self) -> Result<(), SessionError> {
        self.transition(&[View::Dashboard], "start food log", View::FoodLog)
    }

    pub fn start_exercise_log(&mut self) -> Result<(), SessionError> {
        self.transition(&[View::Dashboard], "start exercise log", View::ExerciseLog)
    }

    /// Leaves a logger without logging. Not allowed while its analysis is
    /// pending; the screen's input is discarded.
    pub fn back(&mut self) -> Result<(), SessionError> {
        let busy = match self.view {
            View::FoodLog => self.food_flow.status == FlowStatus::Submitting,
            View::ExerciseLog => self.exercise_flow.status == FlowStatus::Submitting,
            View::Onboarding | View::Dashboard => false,
        };
        if busy {
            return Err(SessionError::SubmissionInFlight);
        }
        self.transition(&[View::FoodLog, View::ExerciseLog], "go back", View::Dashboard)?;
        self.food_flow.reset();
        self.exercise_flow.reset();
        Ok(())
    }

    // --- appends ---

    pub fn add_food(&mut self, entry: FoodEntry, photo: StoredImage) {
        self.store.add_food_with_image(entry, photo);
        self.recompute();
    }

    pub fn add_exercise(&mut self, entry: ExerciseEntry) {
        self.store.add_exercise(entry);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.stats = compute(self.store.food(), self.store.exercise());
        debug!(entries = self.store.len(), consumed = self.stats.calories_consumed, burned = self.stats.calories_burned, "stats recomputed");
    }

    pub fn combined_log(&self) -> Vec<LogEntry> {
        self.store.list_combined_sorted()
    }

    // --- food logging flow ---

    /// Moves the food logger to `submitting`. The caller runs the analysis
    /// without holding the session and reports back via `finish_food_submission`
    /// with the same upload.
    pub fn begin_food_submission(&mut self, upload: UploadItem) -> Result<(), SessionError> {
        self.require_view(View::FoodLog, "log food")?;
        self.food_flow.begin(upload)
    }

    pub fn finish_food_submission(
        &mut self,
        upload: UploadItem,
        result: Result<FoodAnalysis, AnalysisError>,
    ) -> Result<FoodEntry, AnalysisError> {
        let analysis = match result {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "food submission failed");
                self.food_flow.fail(&e);
                return Err(e);
            }
        };

        let id = Uuid::new_v4();
        let entry = FoodEntry {
            id,
            timestamp: now_millis(),
            name: analysis.name,
            calories: analysis.calories,
            protein_g: analysis.protein_g,
            carbs_g: analysis.carbs_g,
            fat_g: analysis.fat_g,
            image_ref: Some(image_ref(id)),
        };

        self.add_food(
            entry.clone(),
            StoredImage {
                body: upload.body,
                content_type: upload.content_type,
            },
        );
        info!(id = %entry.id, calories = entry.calories, "food logged");

        self.food_flow.reset();
        self.view = View::Dashboard;
        Ok(entry)
    }

    // --- exercise logging flow ---

    /// Returns the user's weight for the analysis prompt.
    pub fn begin_exercise_submission(&mut self, description: String) -> Result<f64, SessionError> {
        self.require_view(View::ExerciseLog, "log exercise")?;
        let weight_kg = self.profile()?.weight_kg;
        self.exercise_flow.begin(description)?;
        Ok(weight_kg)
    }

    pub fn finish_exercise_submission(
        &mut self,
        result: Result<ExerciseAnalysis, AnalysisError>,
    ) -> Result<ExerciseEntry, AnalysisError> {
        let analysis = match result {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "exercise submission failed");
                self.exercise_flow.fail(&e);
                return Err(e);
            }
        };

        let entry = ExerciseEntry {
            id: Uuid::new_v4(),
            timestamp: now_millis(),
            activity: analysis.activity,
            duration_minutes: analysis.duration_minutes,
            calories_burned: analysis.calories_burned,
        };
        self.add_exercise(entry.clone());
        info!(id = %entry.id, calories_burned = entry.calories_burned, "exercise logged");

        self.exercise_flow.reset();
        self.view = View::Dashboard;
        Ok(entry)
    }

    fn require_view(&self, view: View, action: &'static str) -> Result<(), SessionError> {
        self.profile()?;
        if self.view != view {
            return Err(SessionError::InvalidTransition {
                from: self.view.as_str(),
                action,
            });
        }
        Ok(())
    }
}
