//! Collaborator seams of the gateway.

use async_trait::async_trait;

use clonechat_core::Result;

/// Question → ordered passages.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<Vec<String>>;
}

/// Rendered prompt → completion text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, reported by `/health`.
    fn model(&self) -> &str;
}
