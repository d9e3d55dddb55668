//! Clone Chat Infer — text embeddings from a hosted provider.
//!
//! Provides the `Embedder` trait used by both retrieval (query embeddings)
//! and index building (document embeddings), and `CohereEmbedder`, the
//! production implementation.

pub mod cohere;
pub mod embedder;

pub use cohere::CohereEmbedder;
pub use embedder::{http_client, Embedder, InputType};
