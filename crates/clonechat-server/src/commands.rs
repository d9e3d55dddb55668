//! Operator commands: index building and statistics.

use std::path::Path;

use clonechat_core::{CloneChatConfig, Result};
use clonechat_infer::{http_client, CohereEmbedder};
use clonechat_ingest::{IngestReport, Ingester};
use clonechat_store::{IndexStats, VectorIndex};

/// Add every supported file under `source` to the configured collection.
pub async fn index(config: &CloneChatConfig, source: &Path) -> Result<IngestReport> {
    let index = VectorIndex::open(&config.index_dir)?;
    let client = http_client(config.upstream_timeout)?;
    let embedder = CohereEmbedder::from_config(client, config);
    Ingester::new(&index, &embedder, &config.collection)
        .ingest_dir(source)
        .await
}

/// Read-only statistics of an existing index.
pub fn stats(config: &CloneChatConfig) -> Result<IndexStats> {
    VectorIndex::open_read_only(&config.index_dir)?.stats()
}

pub fn print_index_report(report: &IngestReport) {
    println!("=== Clone Chat Index Report ===");
    println!();
    println!("Files seen:         {}", report.files_seen);
    println!("Documents added:    {}", report.documents_added);
    println!("Passages added:     {}", report.passages_added);
    println!("Duplicates skipped: {}", report.duplicates_skipped);
    println!("Empty skipped:      {}", report.empty_skipped);
}

pub fn print_stats(stats: &IndexStats) {
    println!("=== Clone Chat Index ===");
    println!();
    println!("Database:           {}", stats.db_path);
    println!("Size:               {:.2} MB", stats.db_size_mb);

    if stats.collections.is_empty() {
        println!();
        println!("No collections.");
        return;
    }

    for c in &stats.collections {
        println!();
        println!("Collection:         {}", c.name);
        println!("  Model:            {} ({}d)", c.embedding_model, c.dimension);
        println!("  Documents:        {}", c.documents);
        println!("  Passages:         {}", c.passages);
    }
}
