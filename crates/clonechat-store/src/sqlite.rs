//! SQLite passage index.
//!
//! One file, `index.db`, holds every collection. Embeddings are stored
//! quantized; search never touches SQLite and runs against an
//! [`IndexSnapshot`] loaded once per process.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::embedding::{dequantize_uint8, quantize_uint8};
use crate::schema::SCHEMA_SQL;
use crate::snapshot::{IndexSnapshot, SnapshotRow};
use crate::types::*;
use clonechat_core::{Error, Result};

/// File name of the index inside the index directory.
pub const INDEX_FILE: &str = "index.db";

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The on-disk passage index.
pub struct VectorIndex {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    read_only: bool,
}

impl VectorIndex {
    /// Open or create the index for writing.
    ///
    /// `index_dir` is a directory (e.g. `chroma_db/`); the file is `index_dir/index.db`.
    pub fn open(index_dir: impl AsRef<Path>) -> Result<Self> {
        let index_dir = index_dir.as_ref();
        std::fs::create_dir_all(index_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = index_dir.join(INDEX_FILE);

        let conn = Connection::open(&db_path).map_err(db_err)?;
        // Rollback journal (not WAL) so the finished file can be served from a read-only mount.
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        info!("VectorIndex opened for writing at {}", db_path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            read_only: false,
        })
    }

    /// Open an existing index without write access.
    pub fn open_read_only(index_dir: impl AsRef<Path>) -> Result<Self> {
        let db_path = index_dir.as_ref().join(INDEX_FILE);
        if !db_path.is_file() {
            return Err(Error::Storage(format!(
                "No index found at {} (build one with `clonechat index <dir>`)",
                db_path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(db_err)?;

        debug!("VectorIndex opened read-only at {}", db_path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            read_only: true,
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::Storage(format!(
                "Index at {} is open read-only",
                self.db_path.display()
            )));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Collections
    // ---------------------------------------------------------------

    /// Look up a collection by name.
    pub fn get_collection(&self, name: &str) -> Result<Option<Collection>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT name, embedding_model, dimension, created_at FROM collections WHERE name = ?1",
            )
            .map_err(db_err)?
            .query_row(params![name], Self::row_to_collection)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Create the collection, or verify an existing one matches the model and dimension.
    pub fn ensure_collection(
        &self,
        name: &str,
        embedding_model: &str,
        dimension: usize,
    ) -> Result<Collection> {
        if let Some(existing) = self.get_collection(name)? {
            if existing.dimension != dimension || existing.embedding_model != embedding_model {
                return Err(Error::Storage(format!(
                    "Collection '{}' was built with {} (dim={}), not {} (dim={})",
                    name, existing.embedding_model, existing.dimension, embedding_model, dimension
                )));
            }
            return Ok(existing);
        }

        self.ensure_writable()?;
        let collection = Collection {
            name: name.to_string(),
            embedding_model: embedding_model.to_string(),
            dimension,
            created_at: now_millis(),
        };
        self.conn
            .lock()
            .execute(
                "INSERT INTO collections (name, embedding_model, dimension, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    collection.name,
                    collection.embedding_model,
                    collection.dimension as i64,
                    collection.created_at
                ],
            )
            .map_err(db_err)?;
        info!("Created collection '{}' ({}, dim={})", name, embedding_model, dimension);
        Ok(collection)
    }

    // ---------------------------------------------------------------
    // Documents and passages
    // ---------------------------------------------------------------

    /// Find a document in a collection by content hash.
    pub fn find_document_by_hash(
        &self,
        collection: &str,
        content_hash: &str,
    ) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT id, collection, source, content_hash, created_at FROM documents \
                 WHERE collection = ?1 AND content_hash = ?2",
            )
            .map_err(db_err)?
            .query_row(params![collection, content_hash], |row| {
                Ok(Document {
                    id: row.get(0)?,
                    collection: row.get(1)?,
                    source: row.get(2)?,
                    content_hash: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Insert a document and all its passages in one transaction.
    /// Returns the new document ID.
    pub fn add_document(
        &self,
        collection: &str,
        source: &str,
        content_hash: &str,
        passages: &[NewPassage],
    ) -> Result<i64> {
        self.ensure_writable()?;
        let dimension = self
            .get_collection(collection)?
            .ok_or_else(|| Error::Storage(format!("Collection '{}' does not exist", collection)))?
            .dimension;

        if let Some(bad) = passages.iter().find(|p| p.embedding.len() != dimension) {
            return Err(Error::Storage(format!(
                "Embedding has dimension {} but collection '{}' expects {}",
                bad.embedding.len(),
                collection,
                dimension
            )));
        }

        let now = now_millis();
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        tx.execute(
            "INSERT INTO documents (collection, source, content_hash, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![collection, source, content_hash, now],
        )
        .map_err(db_err)?;
        let doc_id = tx.last_insert_rowid();

        for (i, passage) in passages.iter().enumerate() {
            tx.execute(
                "INSERT INTO passages (doc_id, passage_index, text, char_start, char_end) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![doc_id, i as i64, passage.text, passage.char_start, passage.char_end],
            )
            .map_err(db_err)?;
            let passage_id = tx.last_insert_rowid();

            let q = quantize_uint8(passage.embedding.view());
            tx.execute(
                "INSERT INTO passage_embeddings (passage_id, embedding, scale, offset_val) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![passage_id, q.bytes, q.scale as f64, q.offset as f64],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;
        debug!("Stored document {} ({}) with {} passages", doc_id, source, passages.len());
        Ok(doc_id)
    }

    /// Number of passages in a collection.
    pub fn count_passages(&self, collection: &str) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn
            .prepare_cached(
                "SELECT COUNT(*) FROM passages p JOIN documents d ON d.id = p.doc_id \
                 WHERE d.collection = ?1",
            )
            .map_err(db_err)?
            .query_row(params![collection], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count)
    }

    // ---------------------------------------------------------------
    // Snapshot
    // ---------------------------------------------------------------

    /// Load every embedded passage of a collection into an immutable snapshot.
    pub fn load_snapshot(&self, collection: &str) -> Result<IndexSnapshot> {
        let meta = self.get_collection(collection)?.ok_or_else(|| {
            Error::Storage(format!(
                "Collection '{}' not found in {}",
                collection,
                self.db_path.display()
            ))
        })?;

        let mut rows = Vec::new();
        {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(
                    "SELECT p.id, p.doc_id, d.source, p.text, e.embedding, e.scale, e.offset_val \
                     FROM passages p \
                     JOIN documents d ON d.id = p.doc_id \
                     JOIN passage_embeddings e ON e.passage_id = p.id \
                     WHERE d.collection = ?1 \
                     ORDER BY p.id",
                )
                .map_err(db_err)?;

            let mapped = stmt
                .query_map(params![collection], |row| {
                    let blob: Vec<u8> = row.get(4)?;
                    let scale: f64 = row.get(5)?;
                    let offset: f64 = row.get(6)?;
                    Ok(SnapshotRow {
                        passage_id: row.get(0)?,
                        doc_id: row.get(1)?,
                        source: row.get(2)?,
                        text: row.get(3)?,
                        embedding: dequantize_uint8(&blob, scale as f32, offset as f32),
                    })
                })
                .map_err(db_err)?;

            for row in mapped {
                rows.push(row.map_err(db_err)?);
            }
        }

        let snapshot = IndexSnapshot::from_rows(meta, rows)?;
        info!(
            "Loaded collection '{}': {} passages, dim={}",
            collection,
            snapshot.len(),
            snapshot.collection().dimension
        );
        Ok(snapshot)
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    pub fn stats(&self) -> Result<IndexStats> {
        let collections = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(
                    "SELECT c.name, c.embedding_model, c.dimension, \
                        (SELECT COUNT(*) FROM documents d WHERE d.collection = c.name), \
                        (SELECT COUNT(*) FROM passages p JOIN documents d ON d.id = p.doc_id \
                         WHERE d.collection = c.name) \
                     FROM collections c ORDER BY c.name",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| {
                    let dimension: i64 = row.get(2)?;
                    Ok(CollectionStats {
                        name: row.get(0)?,
                        embedding_model: row.get(1)?,
                        dimension: dimension as usize,
                        documents: row.get(3)?,
                        passages: row.get(4)?,
                    })
                })
                .map_err(db_err)?;
            let collected: Vec<CollectionStats> = rows
                .collect::<std::result::Result<_, _>>()
                .map_err(db_err)?;
            collected
        };

        let db_size_mb = std::fs::metadata(&self.db_path)
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);

        Ok(IndexStats {
            db_path: self.db_path.display().to_string(),
            db_size_mb: (db_size_mb * 100.0).round() / 100.0,
            collections,
        })
    }

    fn row_to_collection(row: &rusqlite::Row<'_>) -> rusqlite::Result<Collection> {
        let dimension: i64 = row.get(2)?;
        Ok(Collection {
            name: row.get(0)?,
            embedding_model: row.get(1)?,
            dimension: dimension as usize,
            created_at: row.get(3)?,
        })
    }
}
