//! Immutable in-memory view of one collection.
//!
//! Built once at startup and shared across requests without locking.

use ndarray::{Array1, Array2};

use crate::types::{Collection, SearchHit};
use clonechat_core::{Error, Result};

/// One passage with its (dequantized) embedding, as read from the index.
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub passage_id: i64,
    pub doc_id: i64,
    pub source: String,
    pub text: String,
    pub embedding: Array1<f32>,
}

#[derive(Debug, Clone)]
struct Entry {
    passage_id: i64,
    doc_id: i64,
    source: String,
    text: String,
}

/// Row-normalized embedding matrix plus passage texts for a collection.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    collection: Collection,
    /// Shape (N, dim). Rows are unit length, or zero for degenerate vectors.
    matrix: Array2<f32>,
    entries: Vec<Entry>,
}

impl IndexSnapshot {
    /// Build a snapshot; rows keep their given order, which breaks score ties.
    pub fn from_rows(collection: Collection, rows: Vec<SnapshotRow>) -> Result<Self> {
        let dim = collection.dimension;
        let mut matrix = Array2::zeros((rows.len(), dim));
        let mut entries = Vec::with_capacity(rows.len());

        for (i, row) in rows.into_iter().enumerate() {
            if row.embedding.len() != dim {
                return Err(Error::Storage(format!(
                    "Passage {} has dimension {} but collection '{}' expects {}",
                    row.passage_id,
                    row.embedding.len(),
                    collection.name,
                    dim
                )));
            }
            let norm = row.embedding.dot(&row.embedding).sqrt();
            if norm > 1e-9 {
                matrix.row_mut(i).assign(&(&row.embedding / norm));
            }
            entries.push(Entry {
                passage_id: row.passage_id,
                doc_id: row.doc_id,
                source: row.source,
                text: row.text,
            });
        }

        Ok(Self {
            collection,
            matrix,
            entries,
        })
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cosine similarity search. Highest score first.
    pub fn search(&self, query: &Array1<f32>, top_k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.collection.dimension {
            return Err(Error::Storage(format!(
                "Query embedding has dimension {} but collection '{}' expects {}",
                query.len(),
                self.collection.name,
                self.collection.dimension
            )));
        }
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let q_norm = query.dot(query).sqrt();
        if q_norm < 1e-9 {
            return Ok(Vec::new());
        }
        let q = query / q_norm;

        // (N, dim) @ (dim,) → (N,)
        let similarities = self.matrix.dot(&q);

        let mut ranked: Vec<(usize, f32)> = similarities.iter().copied().enumerate().collect();
        // Stable: equal scores stay in insertion order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);

        Ok(ranked
            .into_iter()
            .map(|(i, score)| {
                let entry = &self.entries[i];
                SearchHit {
                    passage_id: entry.passage_id,
                    doc_id: entry.doc_id,
                    source: entry.source.clone(),
                    text: entry.text.clone(),
                    score,
                }
            })
            .collect())
    }
}
