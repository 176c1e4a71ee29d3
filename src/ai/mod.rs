//! Nutrition and exercise analysis backed by a generative model.
//!
//! `client` is the transport seam (Gemini in production, a scripted client in
//! tests); `services` turns free-form replies into typed results and folds
//! every failure into a single `AnalysisError` per operation.

pub mod client;
pub mod dto;
pub mod services;

pub use client::{GeminiClient, GenerativeClient};
pub use services::NutritionAnalyst;
