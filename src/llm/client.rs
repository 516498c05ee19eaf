use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::prompts::{generation_prompt, repair_prompt};
use super::{GenerationRequest, GeneratorError, RepairRequest, TestGenerator};
use crate::config::{GenerationConfig, Provider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Chat model client for OpenAI-compatible and Anthropic endpoints.
///
/// The provider is fixed by the configuration it is constructed with.
#[derive(Debug, Clone)]
pub struct ChatModelClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl ChatModelClient {
    pub fn new(config: GenerationConfig) -> Result<Self, GeneratorError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        info!(provider = ?config.provider, model = %config.model, "Model client configured");
        Ok(Self { http, config })
    }

    async fn complete(&self, prompt: String) -> Result<String, GeneratorError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GeneratorError::MissingApiKey)?;
        let base = self.config.base_url().trim_end_matches('/');

        let request = match self.config.provider {
            Provider::OpenAi => self
                .http
                .post(format!("{base}/v1/chat/completions"))
                .bearer_auth(api_key)
                .json(&json!({
                    "model": self.config.model,
                    "messages": [{ "role": "user", "content": prompt }],
                })),
            Provider::Anthropic => self
                .http
                .post(format!("{base}/v1/messages"))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": self.config.model,
                    "max_tokens": self.config.max_tokens,
                    "messages": [{ "role": "user", "content": prompt }],
                })),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        let text = extract_text(self.config.provider, &body).ok_or(GeneratorError::EmptyResponse)?;
        debug!(chars = text.len(), "Model completion received");
        Ok(text)
    }
}

fn extract_text(provider: Provider, body: &Value) -> Option<String> {
    let text = match provider {
        Provider::OpenAi => body.pointer("/choices/0/message/content")?.as_str()?.to_string(),
        Provider::Anthropic => body
            .get("content")?
            .as_array()?
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
    };
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl TestGenerator for ChatModelClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GeneratorError> {
        let prompt = generation_prompt(&request)?;
        self.complete(prompt).await
    }

    async fn repair(&self, request: RepairRequest<'_>) -> Result<String, GeneratorError> {
        let prompt = repair_prompt(&request)?;
        self.complete(prompt).await
    }
}
