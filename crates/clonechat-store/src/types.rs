//! Data types for collections, passages and search results.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A named set of passages embedded with one model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    pub name: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub created_at: i64,
}

/// A source document row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub collection: String,
    pub source: String,
    pub content_hash: String,
    pub created_at: i64,
}

/// A passage to be written along with its embedding.
#[derive(Debug, Clone)]
pub struct NewPassage {
    pub text: String,
    pub char_start: Option<i64>,
    pub char_end: Option<i64>,
    pub embedding: Array1<f32>,
}

/// A passage returned by similarity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub passage_id: i64,
    pub doc_id: i64,
    pub source: String,
    pub text: String,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// Per-collection counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub documents: i64,
    pub passages: i64,
}

/// Index-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub db_path: String,
    pub db_size_mb: f64,
    pub collections: Vec<CollectionStats>,
}
