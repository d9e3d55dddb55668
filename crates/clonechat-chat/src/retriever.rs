//! Retrieval over the local passage index.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::traits::Retriever;
use clonechat_core::Result;
use clonechat_infer::Embedder;
use clonechat_store::IndexSnapshot;

/// Embeds the question and takes the `top_k` nearest passages from a
/// snapshot loaded at startup.
pub struct IndexRetriever {
    embedder: Arc<dyn Embedder>,
    snapshot: Arc<IndexSnapshot>,
    top_k: usize,
}

impl IndexRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, snapshot: Arc<IndexSnapshot>, top_k: usize) -> Self {
        Self {
            embedder,
            snapshot,
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<String>> {
        let query = self.embedder.embed_query(question).await?;
        let hits = self.snapshot.search(&query, self.top_k)?;
        debug!(
            "Retrieved {} passage(s) from '{}'",
            hits.len(),
            self.snapshot.collection().name
        );
        Ok(hits.into_iter().map(|h| h.text).collect())
    }
}
