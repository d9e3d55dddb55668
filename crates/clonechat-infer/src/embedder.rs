//! Embedding trait.

use std::time::Duration;

use async_trait::async_trait;
use ndarray::Array1;

use clonechat_core::{Error, Result};

/// What the text will be used for. Asymmetric models embed queries and
/// stored documents differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    SearchQuery,
    SearchDocument,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::SearchQuery => "search_query",
            InputType::SearchDocument => "search_document",
        }
    }
}

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Array1<f32>>;

    /// Embed passages for storage. Output order matches input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Array1<f32>>>;

    /// Model identifier recorded alongside stored vectors.
    fn model(&self) -> &str;
}

/// HTTP client shared by all provider calls, bounded by `timeout` per request.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))
}
