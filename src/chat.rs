use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::{config::AppConfig, dto::chat::ChatTurn, error::AppError};

/// Turns of prior conversation forwarded to the model per call.
pub const HISTORY_WINDOW: usize = 10;

pub const SYSTEM_PROMPT: &str = "You are the GarageMap assistant. You help vehicle owners describe \
     breakdowns, pick a suitable service type (car, bike, truck, emergency, towing or inspection), \
     and find nearby workshops on the platform. Give short practical answers about vehicle \
     trouble and how to use GarageMap. For anything requiring hands-on diagnosis, recommend \
     booking a service request with a workshop instead of guessing.";

/// Keep only the most recent turns.
pub fn window(history: &[ChatTurn]) -> &[ChatTurn] {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    &history[start..]
}

/// A stateless text-completion capability.
///
/// The production implementation proxies a hosted model; tests inject a fake
/// so conversation handling is exercised without a network dependency.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, AppError>;
}

/// Google Gemini `generateContent` client.
pub struct GeminiChat {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiChat {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.chat_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::Upstream("chat model is not configured".into()));
        }

        let mut contents: Vec<serde_json::Value> = history
            .iter()
            .map(|turn| {
                let role = if turn.role == "assistant" { "model" } else { "user" };
                json!({ "role": role, "parts": [{ "text": turn.content }] })
            })
            .collect();
        contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));

        let body = json!({
            "system_instruction": { "parts": [{ "text": system_prompt }] },
            "contents": contents,
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    AppError::Upstream("chat model timed out".into())
                } else {
                    AppError::Upstream("chat model unreachable".into())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "chat model returned {status}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|_| AppError::Upstream("chat model returned malformed output".into()))?;

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::Upstream("chat model returned an empty completion".into()))
    }
}
