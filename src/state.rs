use crate::ai::{GeminiClient, GenerativeClient, NutritionAnalyst};
use crate::config::AppConfig;
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub analyst: NutritionAnalyst,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let client = Arc::new(GeminiClient::new(&config.gemini)?) as Arc<dyn GenerativeClient>;
        Ok(Self::from_parts(config, client))
    }

    pub fn from_parts(config: Arc<AppConfig>, client: Arc<dyn GenerativeClient>) -> Self {
        Self {
            config,
            analyst: NutritionAnalyst::new(client),
            session: Arc::new(Mutex::new(Session::new())),
        }
    }

    #[cfg(test)]
    pub fn fake(client: Arc<dyn GenerativeClient>) -> Self {
        let config = Arc::new(AppConfig {
            gemini: crate::config::GeminiConfig {
                api_key: "test".into(),
                model: crate::config::DEFAULT_GEMINI_MODEL.into(),
                base_url: "http://fake.local".into(),
                timeout_secs: 1,
            },
        });
        Self::from_parts(config, client)
    }
}
