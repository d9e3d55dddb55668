//! Cohere embeddings (`POST /v1/embed`).

use async_trait::async_trait;
use ndarray::Array1;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedder::{Embedder, InputType};
use clonechat_core::{CloneChatConfig, Error, Result};

/// Largest number of texts the embed endpoint accepts per call.
pub const MAX_BATCH: usize = 96;

/// Embedding client for the Cohere API.
pub struct CohereEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: &'static str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl CohereEmbedder {
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
            config.embed_model.clone(),
        )
    }

    async fn embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Array1<f32>>> {
        let url = format!("{}/v1/embed", self.base_url);
        let body = EmbedRequest {
            model: &self.model,
            texts,
            input_type: input_type.as_str(),
        };

        debug!(
            "Embedding {} text(s) with {} ({})",
            texts.len(),
            self.model,
            input_type.as_str()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!("API error {}: {}", status, body)));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Malformed response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(Array1::from_vec).collect())
    }
}

#[async_trait]
impl Embedder for CohereEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Array1<f32>> {
        let mut vectors = self.embed(&[text.to_string()], InputType::SearchQuery).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::embedding("Empty embedding response"))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Array1<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            out.extend(self.embed(batch, InputType::SearchDocument).await?);
        }
        Ok(out)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
