//! Semantic retrieval over the vector index.
//!
//! Retrieval is two-stage: cosine similarity against the stored vectors
//! yields `fetch_k` candidates, then maximal marginal relevance (MMR)
//! re-ranks them down to `top_k`, trading similarity to the query against
//! diversity among the selected chunks:
//!
//! ```text
//! MMR = λ × sim(query, chunk) − (1 − λ) × max sim(chunk, selected)
//! ```
//!
//! λ = 1.0 is pure relevance, λ = 0.0 pure diversity.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::embedding::{self, EmbeddingClient};
use crate::models::RetrievedChunk;

/// A scored candidate that still carries its vector for the MMR pass.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub file_name: String,
    pub scheme_name: String,
    pub document_name: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub score: f32,
}

/// Embed the question and return the `top_k` MMR-selected chunks.
pub async fn retrieve(
    pool: &SqlitePool,
    config: &Config,
    client: &EmbeddingClient,
    question: &str,
) -> Result<Vec<RetrievedChunk>> {
    let query_vec = client.embed_query(question).await?;

    let candidates = fetch_candidates(
        pool,
        &config.db.collection,
        &query_vec,
        config.retrieval.fetch_k,
    )
    .await?;

    Ok(mmr_rerank(
        &query_vec,
        candidates,
        config.retrieval.top_k,
        config.retrieval.mmr_lambda,
    ))
}

/// Fetch the `fetch_k` nearest chunks by cosine similarity. Vectors are
/// scanned in full and scored in process — the corpus is a fixed set of
/// disclosure documents, small enough that a linear pass is fine.
pub async fn fetch_candidates(
    pool: &SqlitePool,
    collection: &str,
    query_vec: &[f32],
    fetch_k: usize,
) -> Result<Vec<Candidate>> {
    let rows = sqlx::query(
        r#"
        SELECT c.file_name, c.scheme_name, c.document_name, c.text, cv.embedding
        FROM chunk_vectors cv
        JOIN chunks c ON c.id = cv.chunk_id
        WHERE cv.collection = ?
        "#,
    )
    .bind(collection)
    .fetch_all(pool)
    .await?;

    let mut candidates: Vec<Candidate> = rows
        .iter()
        .map(|row| {
            let blob: Vec<u8> = row.get("embedding");
            let vector = embedding::blob_to_vec(&blob);
            let score = embedding::cosine_similarity(query_vec, &vector);
            Candidate {
                file_name: row.get("file_name"),
                scheme_name: row.get("scheme_name"),
                document_name: row.get("document_name"),
                text: row.get("text"),
                vector,
                score,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(fetch_k);

    Ok(candidates)
}

/// Re-rank candidates with maximal marginal relevance, selecting `top_k`.
pub fn mmr_rerank(
    query_vec: &[f32],
    candidates: Vec<Candidate>,
    top_k: usize,
    lambda: f32,
) -> Vec<RetrievedChunk> {
    if candidates.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let k = top_k.min(candidates.len());
    let mut selected: Vec<Candidate> = Vec::with_capacity(k);
    let mut remaining = candidates;

    for _ in 0..k {
        if remaining.is_empty() {
            break;
        }

        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, candidate) in remaining.iter().enumerate() {
            let relevance = embedding::cosine_similarity(query_vec, &candidate.vector);

            let max_similarity = selected
                .iter()
                .map(|s| embedding::cosine_similarity(&candidate.vector, &s.vector))
                .fold(f32::NEG_INFINITY, f32::max);
            let max_similarity = if selected.is_empty() {
                0.0
            } else {
                max_similarity
            };

            let mmr = lambda * relevance - (1.0 - lambda) * max_similarity;
            if mmr > best_score {
                best_score = mmr;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    selected
        .into_iter()
        .map(|c| RetrievedChunk {
            file_name: c.file_name,
            scheme_name: c.scheme_name,
            document_name: c.document_name,
            text: c.text,
            score: c.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, score: f32, vector: Vec<f32>) -> Candidate {
        Candidate {
            file_name: format!("{name}.pdf"),
            scheme_name: "HDFC Liquid Fund".to_string(),
            document_name: "KIM".to_string(),
            text: name.to_string(),
            vector,
            score,
        }
    }

    #[test]
    fn empty_candidates_yield_nothing() {
        let out = mmr_rerank(&[1.0, 0.0], Vec::new(), 5, 0.5);
        assert!(out.is_empty());
    }

    #[test]
    fn top_k_zero_yields_nothing() {
        let cands = vec![candidate("a", 0.9, vec![1.0, 0.0])];
        assert!(mmr_rerank(&[1.0, 0.0], cands, 0, 0.5).is_empty());
    }

    #[test]
    fn returns_at_most_top_k() {
        let cands = vec![
            candidate("a", 0.9, vec![0.9, 0.1]),
            candidate("b", 0.8, vec![0.8, 0.2]),
            candidate("c", 0.7, vec![0.7, 0.3]),
            candidate("d", 0.6, vec![0.6, 0.4]),
        ];
        let out = mmr_rerank(&[1.0, 0.0], cands, 3, 0.5);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn k_larger_than_candidates_returns_all() {
        let cands = vec![candidate("a", 0.9, vec![0.9, 0.1])];
        let out = mmr_rerank(&[1.0, 0.0], cands, 10, 0.5);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn pure_relevance_preserves_similarity_order() {
        let cands = vec![
            candidate("best", 0.9, vec![0.99, 0.01, 0.0]),
            candidate("mid", 0.8, vec![0.8, 0.2, 0.0]),
            candidate("worst", 0.5, vec![0.3, 0.7, 0.0]),
        ];
        let out = mmr_rerank(&[1.0, 0.0, 0.0], cands, 3, 1.0);
        assert_eq!(out[0].text, "best");
        assert_eq!(out[1].text, "mid");
        assert_eq!(out[2].text, "worst");
    }

    #[test]
    fn balanced_lambda_promotes_diversity() {
        // Two near-duplicates and one orthogonal chunk: with λ = 0.5 the
        // second pick should be the diverse one, not the duplicate.
        let cands = vec![
            candidate("near1", 0.95, vec![0.99, 0.01, 0.0]),
            candidate("near2", 0.94, vec![0.98, 0.02, 0.0]),
            candidate("other", 0.70, vec![0.0, 0.0, 1.0]),
        ];
        let out = mmr_rerank(&[1.0, 0.0, 0.0], cands, 2, 0.5);
        assert_eq!(out[0].text, "near1");
        assert_eq!(out[1].text, "other");
    }

    #[test]
    fn identical_vectors_still_fill_k() {
        let cands = vec![
            candidate("a", 0.9, vec![1.0, 0.0]),
            candidate("b", 0.8, vec![1.0, 0.0]),
            candidate("c", 0.7, vec![1.0, 0.0]),
        ];
        let out = mmr_rerank(&[1.0, 0.0], cands, 3, 0.5);
        assert_eq!(out.len(), 3);
    }
}
