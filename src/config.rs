use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.into()),
            timeout_secs: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        Ok(Self { gemini })
    }
}
