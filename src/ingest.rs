//! Ingestion pipeline orchestration.
//!
//! Coordinates the one-shot batch flow: corpus discovery → text extraction →
//! provenance → chunking → embedding → index writes. A dry run stops after
//! chunking and reports counts without touching the network or the database.

use anyhow::Result;

use crate::config::Config;
use crate::corpus;
use crate::db;
use crate::embedding::EmbeddingClient;
use crate::index;
use crate::migrate;

pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    let chunks = corpus::load_corpus(config)?;

    if dry_run {
        println!("ingest (dry-run)");
        println!("  chunks that would be written: {}", chunks.len());
        return Ok(());
    }

    if chunks.is_empty() {
        println!("No chunks to ingest.");
        return Ok(());
    }

    // API key is required from here on; fail before touching the index.
    let embedder = EmbeddingClient::new(&config.embedding)?;

    let pool = db::connect(config).await?;
    migrate::run_migrations(&pool).await?;

    // Re-ingest replaces the collection wholesale.
    index::clear_collection(&pool, &config.db.collection).await?;

    println!(
        "Ingesting {} chunks in batches of {}...",
        chunks.len(),
        config.embedding.batch_size
    );

    let report = index::write_chunks(&embedder, &pool, &config.embedding, &chunks).await?;

    println!("ingest");
    println!("  batches: {}", report.batches);
    println!("  chunks written: {}", report.written_chunks);
    if report.skipped_batches > 0 {
        println!(
            "  batches skipped: {} ({} chunks)",
            report.skipped_batches, report.skipped_chunks
        );
    }
    println!(
        "  indexed total: {}",
        index::count_chunks(&pool, &config.db.collection).await?
    );
    println!("ok");

    pool.close().await;
    Ok(())
}
