use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Logical collection the chunks belong to. One index file can hold
    /// several corpora side by side.
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            collection: default_collection(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./index/fundchat.db")
}
fn default_collection() -> String {
    "hdfc_mutual_fund".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Root directory scanned recursively for `*.pdf` files.
    #[serde(default = "default_corpus_root")]
    pub root: PathBuf,
    /// Optional JSON manifest supplying filename→URL entries not present in
    /// the built-in citation tables.
    #[serde(default = "default_manifest_path")]
    pub manifest: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: default_corpus_root(),
            manifest: default_manifest_path(),
        }
    }
}

fn default_corpus_root() -> PathBuf {
    PathBuf::from("./raw")
}
fn default_manifest_path() -> PathBuf {
    PathBuf::from("./raw/corpus_manifest.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1024
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the LLM after MMR re-ranking.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Number of nearest-neighbour candidates fetched before re-ranking.
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,
    /// MMR balance: 1.0 = pure relevance, 0.0 = pure diversity.
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            fetch_k: default_fetch_k(),
            mmr_lambda: default_mmr_lambda(),
        }
    }
}

fn default_top_k() -> usize {
    10
}
fn default_fetch_k() -> usize {
    30
}
fn default_mmr_lambda() -> f32 {
    0.5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Static pause between successive batch writes (pacing, not backpressure).
    #[serde(default = "default_batch_pause_secs")]
    pub batch_pause_secs: u64,
    /// Delay before the single retry of a failed batch.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            batch_pause_secs: default_batch_pause_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_batch_size() -> usize {
    50
}
fn default_batch_pause_secs() -> u64 {
    2
}
fn default_retry_delay_secs() -> u64 {
    10
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Plain-text system prompt file; a built-in prompt is used when absent.
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt: PathBuf,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt_path(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("./system_prompt.md")
}
fn default_llm_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

/// Loads the config file if it exists, otherwise falls back to built-in
/// defaults so the tool works out of the box against `./raw` and `./index`.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }

    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.retrieval.fetch_k < config.retrieval.top_k {
        anyhow::bail!("retrieval.fetch_k must be >= retrieval.top_k");
    }

    if !(0.0..=1.0).contains(&config.retrieval.mmr_lambda) {
        anyhow::bail!("retrieval.mmr_lambda must be in [0.0, 1.0]");
    }

    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }

    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
        assert_eq!(config.db.collection, "hdfc_mutual_fund");
        assert_eq!(config.chunking.chunk_size, 1024);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.retrieval.fetch_k, 30);
    }

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "/tmp/test.db"

            [corpus]
            root = "/tmp/raw"
            "#,
        )
        .unwrap();
        assert_eq!(config.db.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!((config.retrieval.mmr_lambda - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn fetch_k_must_cover_top_k() {
        let mut config = Config::default();
        config.retrieval.fetch_k = 5;
        config.retrieval.top_k = 10;
        assert!(validate(&config).is_err());
    }
}
