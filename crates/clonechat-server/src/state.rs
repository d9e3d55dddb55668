//! Shared application state.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use clonechat_chat::{ChatGateway, CohereGenerator, IndexRetriever, PromptTemplate};
use clonechat_core::{CloneChatConfig, Result};
use clonechat_infer::{http_client, CohereEmbedder, Embedder};
use clonechat_store::VectorIndex;

/// What `/health` reports about the loaded index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub collection: String,
    pub passages: usize,
    pub embedding_model: String,
}

/// Shared application state accessible from all route handlers.
///
/// Built once before the listener starts and never mutated.
pub struct AppState {
    pub config: CloneChatConfig,
    pub gateway: ChatGateway,
    pub index: IndexSummary,
}

impl AppState {
    pub fn new(config: CloneChatConfig, gateway: ChatGateway, index: IndexSummary) -> Self {
        Self {
            config,
            gateway,
            index,
        }
    }

    /// Wire the production collaborators: the on-disk index snapshot, the
    /// Cohere clients and the persona template.
    pub fn open(config: CloneChatConfig) -> Result<Self> {
        let template = match &config.prompt_file {
            Some(path) => {
                info!("Using prompt template from {}", path.display());
                PromptTemplate::from_file(path)?
            }
            None => PromptTemplate::builtin()?,
        };

        let index = VectorIndex::open_read_only(&config.index_dir)?;
        let snapshot = Arc::new(index.load_snapshot(&config.collection)?);
        let collection = snapshot.collection().clone();
        if collection.embedding_model != config.embed_model {
            warn!(
                "Collection '{}' was built with {} but queries use {}",
                collection.name, collection.embedding_model, config.embed_model
            );
        }
        info!(
            "Loaded {} passage(s) from '{}' ({}d)",
            snapshot.len(),
            collection.name,
            collection.dimension
        );

        let client = http_client(config.upstream_timeout)?;
        let embedder: Arc<dyn Embedder> =
            Arc::new(CohereEmbedder::from_config(client.clone(), &config));
        let retriever = IndexRetriever::new(embedder, snapshot.clone(), config.top_k);
        let generator = CohereGenerator::from_config(client, &config);

        let gateway = ChatGateway::new(
            Arc::new(retriever),
            Arc::new(generator),
            template,
            config.upstream_timeout,
        );

        let summary = IndexSummary {
            collection: collection.name,
            passages: snapshot.len(),
            embedding_model: collection.embedding_model,
        };
        Ok(Self::new(config, gateway, summary))
    }
}
