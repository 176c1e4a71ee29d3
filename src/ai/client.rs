use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::dto::{GenerateRequest, Part};
use crate::config::GeminiConfig;

/// Text-generation backend. Returns the model's raw reply text.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> anyhow::Result<String>;
}

// --- Gemini wire types ---

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    mime_type: String,
    data: String, // base64
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

/// Google Gemini `generateContent` over HTTPS. One attempt per call; the
/// only time bound is the transport timeout from config.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

fn to_wire(request: GenerateRequest) -> GeminiRequest {
    let parts = request
        .parts
        .into_iter()
        .map(|p| match p {
            Part::Text(text) => GeminiPart::Text { text },
            Part::InlineImage { mime_type, data } => GeminiPart::InlineData {
                inline_data: InlineData {
                    mime_type,
                    data: BASE64.encode(&data),
                },
            },
        })
        .collect();

    GeminiRequest {
        contents: vec![GeminiContent { parts }],
        generation_config: request.response_schema.map(|schema| GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        }),
    }
}

fn extract_text(body: &str) -> anyhow::Result<String> {
    let response: GeminiResponse =
        serde_json::from_str(body).context("parse Gemini response")?;
    if let Some(e) = response.error {
        anyhow::bail!("Gemini API error: {}", e.message);
    }
    let text: String = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| match p {
                    GeminiPart::Text { text } => Some(text),
                    GeminiPart::InlineData { .. } => None,
                })
                .collect()
        })
        .unwrap_or_default();
    anyhow::ensure!(!text.trim().is_empty(), "no content in Gemini response");
    Ok(text)
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    #[instrument(skip(self, request), fields(model = %self.model, structured = request.response_schema.is_some()))]
    async fn generate(&self, request: GenerateRequest) -> anyhow::Result<String> {
        debug!(prompt_chars = request.prompt_text().len(), "sending generateContent request");
        let body = to_wire(request);

        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        let text = response.text().await.context("read Gemini response")?;
        if !status.is_success() {
            error!(%status, "Gemini API error");
            let message = serde_json::from_str::<GeminiResponse>(&text)
                .ok()
                .and_then(|r| r.error)
                .map_or(text, |e| e.message);
            anyhow::bail!("Gemini returned {}: {}", status, message);
        }

        extract_text(&text)
    }
}
