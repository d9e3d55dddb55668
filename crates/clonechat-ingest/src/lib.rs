//! Clone Chat Ingest — turns a directory of notes into an indexed collection.

pub mod chunking;
pub mod file;
pub mod ingest;

pub use chunking::{RecursiveChunker, TextChunk};
pub use ingest::{content_hash, IngestOutcome, IngestReport, Ingester};
