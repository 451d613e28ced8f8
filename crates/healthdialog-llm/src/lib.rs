//! Chat-completions client for OpenAI-compatible endpoints (OpenAI, Azure,
//! Ollama and llama.cpp servers all speak the same `/chat/completions` shape).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use healthdialog_core::config::GenerationConfig;
use healthdialog_core::error::{Error, Result};
use healthdialog_core::traits::Generator;
use healthdialog_core::types::Prompt;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiGenerator {
    /// - `base_url`: API root including the version, e.g. `https://api.openai.com/v1`
    /// - `timeout`: whole-request deadline applied by the HTTP client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.0,
        })
    }

    /// `None` when generation is disabled, or enabled without an API key (the
    /// pipeline then answers directly from the FAQ).
    pub fn from_config(config: &GenerationConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let Some(api_key) = config.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            tracing::warn!("generation.enabled is set but no API key is configured; answering directly from the FAQ");
            return Ok(None);
        };
        let generator = Self::new(&config.base_url, &config.model, api_key, Duration::from_secs(config.timeout_secs))?
            .with_temperature(config.temperature);
        Ok(Some(generator))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self { self.temperature = temperature; self }

    pub fn model(&self) -> &str { &self.model }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str { &self.model }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
        };
        debug!(url = %url, "requesting chat completion");
        let start = std::time::Instant::now();

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("upstream returned {status}: {text}")));
        }
        let parsed: ChatResponse = resp.json().await.map_err(|e| Error::Synthesis(format!("malformed response: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Synthesis("response contained no message content".into()))?;

        debug!(ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX), chars = content.len(), "chat completion received");
        Ok(content)
    }
}
