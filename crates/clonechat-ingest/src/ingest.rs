//! Index building: file → text → chunks → embeddings → collection.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::chunking::RecursiveChunker;
use crate::file;
use clonechat_core::{Error, Result};
use clonechat_infer::Embedder;
use clonechat_store::{NewPassage, VectorIndex};

/// Outcome of an ingest run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct IngestReport {
    pub files_seen: usize,
    pub documents_added: usize,
    pub passages_added: usize,
    pub duplicates_skipped: usize,
    pub empty_skipped: usize,
}

/// Result of ingesting a single text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Added { doc_id: i64, passages: usize },
    Duplicate,
    Empty,
}

/// Writes documents into one collection of the index.
pub struct Ingester<'a> {
    index: &'a VectorIndex,
    embedder: &'a dyn Embedder,
    collection: String,
    chunker: RecursiveChunker,
}

impl<'a> Ingester<'a> {
    pub fn new(index: &'a VectorIndex, embedder: &'a dyn Embedder, collection: &str) -> Self {
        Self {
            index,
            embedder,
            collection: collection.to_string(),
            chunker: RecursiveChunker::default(),
        }
    }

    pub fn with_chunker(mut self, chunker: RecursiveChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Ingest every supported file under `dir`.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        if !dir.is_dir() {
            return Err(Error::Config(format!("{} is not a directory", dir.display())));
        }

        let mut report = IngestReport::default();
        for path in file::collect_files(dir)? {
            report.files_seen += 1;
            let source = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            let text = match file::extract_text(&path)? {
                Some(t) => t,
                None => {
                    report.empty_skipped += 1;
                    continue;
                }
            };

            match self.ingest_text(&source, &text).await? {
                IngestOutcome::Added { passages, .. } => {
                    report.documents_added += 1;
                    report.passages_added += passages;
                }
                IngestOutcome::Duplicate => report.duplicates_skipped += 1,
                IngestOutcome::Empty => report.empty_skipped += 1,
            }
        }

        info!(
            "Ingested {} of {} files into '{}' ({} passages, {} duplicates)",
            report.documents_added,
            report.files_seen,
            self.collection,
            report.passages_added,
            report.duplicates_skipped
        );
        Ok(report)
    }

    /// Chunk, embed and store one text.
    pub async fn ingest_text(&self, source: &str, text: &str) -> Result<IngestOutcome> {
        let hash = content_hash(text);
        if self.index.find_document_by_hash(&self.collection, &hash)?.is_some() {
            debug!("Duplicate content, skipping: {}", source);
            return Ok(IngestOutcome::Duplicate);
        }

        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            warn!("No text in {}, skipping", source);
            return Ok(IngestOutcome::Empty);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings for {}, got {}",
                chunks.len(),
                source,
                embeddings.len()
            )));
        }

        let dimension = embeddings[0].len();
        self.index
            .ensure_collection(&self.collection, self.embedder.model(), dimension)?;

        let passages: Vec<NewPassage> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| NewPassage {
                text: chunk.text,
                char_start: Some(chunk.start_char as i64),
                char_end: Some(chunk.end_char as i64),
                embedding,
            })
            .collect();

        let count = passages.len();
        let doc_id = self
            .index
            .add_document(&self.collection, source, &hash, &passages)?;
        debug!("Stored {} as document {} ({} passages)", source, doc_id, count);
        Ok(IngestOutcome::Added { doc_id, passages: count })
    }
}

/// Compute SHA-256 content hash.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
