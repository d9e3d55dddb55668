//! Cohere chat completions (`POST /v1/chat`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::Generator;
use clonechat_core::{CloneChatConfig, Error, Result};

/// Single-turn generation against the Cohere chat API.
pub struct CohereGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    text: String,
}

impl CohereGenerator {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn from_config(client: Client, config: &CloneChatConfig) -> Self {
        Self::new(
            client,
            config.provider_base_url.clone(),
            config.api_key.clone(),
            config.chat_model.clone(),
        )
    }
}

#[async_trait]
impl Generator for CohereGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            message: prompt,
        };

        debug!("Generating with {} ({} prompt bytes)", self.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::generation(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!("API error {}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("Malformed response: {}", e)))?;
        Ok(parsed.text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
