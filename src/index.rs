//! Vector index writer.
//!
//! Partitions chunks into fixed-size batches and writes each batch —
//! embedding call plus a single transaction of chunk and vector rows. A
//! failed batch is retried exactly once after a fixed delay; if the retry
//! also fails the batch is skipped with a warning and the run continues.
//! Ingestion is therefore partial-failure-tolerant but not transactional:
//! a skipped batch is simply absent from the index.
//!
//! A static pause between batches paces the embedding API. It is a fixed
//! delay, not backpressure.

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::embedding::{self, Embedder};
use crate::models::DocumentChunk;

/// Outcome of a full index write.
#[derive(Debug, Default, Clone)]
pub struct WriteReport {
    pub batches: usize,
    pub written_chunks: u64,
    pub skipped_batches: usize,
    pub skipped_chunks: u64,
}

/// Remove a collection's rows so a re-ingest starts clean.
pub async fn clear_collection(pool: &SqlitePool, collection: &str) -> Result<()> {
    sqlx::query("DELETE FROM chunk_vectors WHERE collection = ?")
        .bind(collection)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM chunks WHERE collection = ?")
        .bind(collection)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_chunks(pool: &SqlitePool, collection: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE collection = ?")
        .bind(collection)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Write all chunks in batches of `config.batch_size`, pausing
/// `config.batch_pause_secs` between batches and retrying each failed batch
/// exactly once after `config.retry_delay_secs`.
pub async fn write_chunks<E: Embedder>(
    embedder: &E,
    pool: &SqlitePool,
    config: &EmbeddingConfig,
    chunks: &[DocumentChunk],
) -> Result<WriteReport> {
    let mut report = WriteReport::default();
    let total_batches = chunks.len().div_ceil(config.batch_size);

    for (batch_no, batch) in chunks.chunks(config.batch_size).enumerate() {
        report.batches += 1;

        match write_batch(embedder, pool, batch).await {
            Ok(()) => {
                report.written_chunks += batch.len() as u64;
            }
            Err(e) => {
                eprintln!(
                    "Warning: batch {}/{} failed: {}",
                    batch_no + 1,
                    total_batches,
                    e
                );
                tokio::time::sleep(Duration::from_secs(config.retry_delay_secs)).await;

                match write_batch(embedder, pool, batch).await {
                    Ok(()) => {
                        report.written_chunks += batch.len() as u64;
                    }
                    Err(e) => {
                        eprintln!(
                            "Warning: skipping batch {}/{} after retry: {}",
                            batch_no + 1,
                            total_batches,
                            e
                        );
                        report.skipped_batches += 1;
                        report.skipped_chunks += batch.len() as u64;
                    }
                }
            }
        }

        if batch_no + 1 < total_batches {
            tokio::time::sleep(Duration::from_secs(config.batch_pause_secs)).await;
        }
    }

    Ok(report)
}

/// Embed one batch and store its chunk and vector rows in one transaction.
async fn write_batch<E: Embedder>(
    embedder: &E,
    pool: &SqlitePool,
    batch: &[DocumentChunk],
) -> Result<()> {
    let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed(&texts).await?;

    if vectors.len() != batch.len() {
        bail!(
            "embedding count mismatch: sent {} texts, got {} vectors",
            batch.len(),
            vectors.len()
        );
    }

    let mut tx = pool.begin().await?;

    for (chunk, vector) in batch.iter().zip(vectors.iter()) {
        sqlx::query(
            r#"
            INSERT INTO chunks (id, collection, source_path, file_name, scheme_name, document_name, document_date, chunk_index, text, hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&chunk.id)
        .bind(&chunk.collection)
        .bind(&chunk.source_path)
        .bind(&chunk.file_name)
        .bind(&chunk.scheme_name)
        .bind(&chunk.document_name)
        .bind(&chunk.document_date)
        .bind(chunk.chunk_index)
        .bind(&chunk.text)
        .bind(&chunk.hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO chunk_vectors (chunk_id, collection, embedding) VALUES (?, ?, ?)",
        )
        .bind(&chunk.id)
        .bind(&chunk.collection)
        .bind(embedding::vec_to_blob(vector))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db;
    use crate::migrate;
    use crate::models::FileMetadata;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Test embedder: texts containing "fail-always" error on every call,
    /// texts containing "fail-once" error only on their first call.
    struct ScriptedEmbedder {
        seen_failures: Mutex<Vec<String>>,
    }

    impl ScriptedEmbedder {
        fn new() -> Self {
            Self {
                seen_failures: Mutex::new(Vec::new()),
            }
        }
    }

    impl Embedder for ScriptedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            for text in texts {
                if text.contains("fail-always") {
                    return Err(anyhow!("scripted permanent failure"));
                }
                if text.contains("fail-once") {
                    let mut seen = self.seen_failures.lock().unwrap();
                    if !seen.contains(text) {
                        seen.push(text.clone());
                        return Err(anyhow!("scripted transient failure"));
                    }
                }
            }
            Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
        }
    }

    fn chunk_with_text(text: &str, index: i64) -> DocumentChunk {
        let meta = FileMetadata {
            file_name: "HDFC_Liquid_KIM.pdf".to_string(),
            scheme_name: "HDFC Liquid Fund".to_string(),
            document_name: "KIM".to_string(),
            date_of_the_document: "Unknown".to_string(),
        };
        let mut chunks =
            crate::chunk::build_chunks(&meta, "raw/x.pdf", "test_collection", text, 4096, 0);
        let mut c = chunks.remove(0);
        c.chunk_index = index;
        c
    }

    async fn test_pool(tmp: &TempDir) -> SqlitePool {
        let mut config = Config::default();
        config.db.path = tmp.path().join("index.db");
        let pool = db::connect(&config).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        pool
    }

    fn fast_embedding_config() -> EmbeddingConfig {
        EmbeddingConfig {
            batch_size: 1,
            batch_pause_secs: 0,
            retry_delay_secs: 0,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn all_batches_written_on_success() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let chunks = vec![
            chunk_with_text("alpha", 0),
            chunk_with_text("beta", 1),
            chunk_with_text("gamma", 2),
        ];

        let report = write_chunks(
            &ScriptedEmbedder::new(),
            &pool,
            &fast_embedding_config(),
            &chunks,
        )
        .await
        .unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(report.written_chunks, 3);
        assert_eq!(report.skipped_batches, 0);
        assert_eq!(count_chunks(&pool, "test_collection").await.unwrap(), 3);
        pool.close().await;
    }

    #[tokio::test]
    async fn transient_failure_recovers_on_retry() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let chunks = vec![chunk_with_text("fail-once payload", 0)];

        let report = write_chunks(
            &ScriptedEmbedder::new(),
            &pool,
            &fast_embedding_config(),
            &chunks,
        )
        .await
        .unwrap();

        assert_eq!(report.written_chunks, 1);
        assert_eq!(report.skipped_batches, 0);
        assert_eq!(count_chunks(&pool, "test_collection").await.unwrap(), 1);
        pool.close().await;
    }

    #[tokio::test]
    async fn twice_failed_batch_is_skipped_but_later_batches_land() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;
        let chunks = vec![
            chunk_with_text("alpha", 0),
            chunk_with_text("fail-always payload", 1),
            chunk_with_text("gamma", 2),
        ];

        let report = write_chunks(
            &ScriptedEmbedder::new(),
            &pool,
            &fast_embedding_config(),
            &chunks,
        )
        .await
        .unwrap();

        assert_eq!(report.written_chunks, 2);
        assert_eq!(report.skipped_batches, 1);
        assert_eq!(report.skipped_chunks, 1);
        assert_eq!(count_chunks(&pool, "test_collection").await.unwrap(), 2);

        // The failed batch's chunk is absent; the others are present.
        let texts: Vec<String> =
            sqlx::query_scalar("SELECT text FROM chunks WHERE collection = ? ORDER BY chunk_index")
                .bind("test_collection")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert!(texts.iter().any(|t| t.contains("alpha")));
        assert!(texts.iter().any(|t| t.contains("gamma")));
        assert!(!texts.iter().any(|t| t.contains("fail-always")));
        pool.close().await;
    }

    #[tokio::test]
    async fn clear_collection_only_touches_its_rows() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;

        let mut ours = chunk_with_text("ours", 0);
        ours.collection = "test_collection".to_string();
        let mut theirs = chunk_with_text("theirs", 0);
        theirs.collection = "other_collection".to_string();
        theirs.id = uuid::Uuid::new_v4().to_string();

        let embedder = ScriptedEmbedder::new();
        write_chunks(&embedder, &pool, &fast_embedding_config(), &[ours])
            .await
            .unwrap();
        write_chunks(&embedder, &pool, &fast_embedding_config(), &[theirs])
            .await
            .unwrap();

        clear_collection(&pool, "test_collection").await.unwrap();
        assert_eq!(count_chunks(&pool, "test_collection").await.unwrap(), 0);
        assert_eq!(count_chunks(&pool, "other_collection").await.unwrap(), 1);
        pool.close().await;
    }
}
