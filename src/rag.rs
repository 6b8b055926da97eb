//! The query service: retrieval → context formatting → LLM call.
//!
//! [`RagService::new`] performs all fatal-to-service initialization up
//! front — API key, index presence, citation tables, system prompt — so a
//! constructed service can always attempt to answer. [`RagService::query`]
//! never returns an error: any failure in the pipeline is converted into an
//! error-shaped answer string, which is what the HTTP and CLI layers show
//! the user.

use anyhow::Result;
use sqlx::SqlitePool;
use std::io::Write;

use crate::config::Config;
use crate::db;
use crate::embedding::EmbeddingClient;
use crate::llm::ChatClient;
use crate::models::RetrievedChunk;
use crate::resolver::UrlTables;
use crate::search;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer the user's question based on the context.";

pub struct RagService {
    config: Config,
    pool: SqlitePool,
    embedder: EmbeddingClient,
    chat: ChatClient,
    tables: UrlTables,
    system_prompt: String,
}

impl RagService {
    /// Initialize the service. Fails when `OPENAI_API_KEY` is absent or the
    /// index database does not exist yet.
    pub async fn new(config: &Config) -> Result<Self> {
        let embedder = EmbeddingClient::new(&config.embedding)?;
        let chat = ChatClient::new(&config.llm)?;
        let pool = db::connect_existing(config).await?;

        let tables = UrlTables::builtin().with_manifest(&config.corpus.manifest);
        let system_prompt = load_system_prompt(config);

        Ok(Self {
            config: config.clone(),
            pool,
            embedder,
            chat,
            tables,
            system_prompt,
        })
    }

    /// Answer a question. On any failure the answer is an error-shaped
    /// string — callers never see a structured error from this path.
    pub async fn query(&self, question: &str) -> String {
        match self.answer(question).await {
            Ok(answer) => answer,
            Err(e) => format!("Error generating response: {}", e),
        }
    }

    async fn answer(&self, question: &str) -> Result<String> {
        let retrieved =
            search::retrieve(&self.pool, &self.config, &self.embedder, question).await?;

        let context = format_context(&self.tables, &retrieved);
        let user = format!("Context:\n{}\n\nQuestion: {}", context, question);

        self.chat.complete(&self.system_prompt, &user).await
    }
}

/// Format retrieved chunks for the prompt, each closed with its resolved
/// citation link. The chunk text already carries its provenance header.
pub fn format_context(tables: &UrlTables, chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            let url = tables.resolve(&chunk.file_name, &chunk.scheme_name, &chunk.document_name);
            format!(
                "--- Document Source ---\n{}\nSource Link: {}",
                chunk.text, url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn load_system_prompt(config: &Config) -> String {
    match std::fs::read_to_string(&config.llm.system_prompt) {
        Ok(text) => text,
        Err(_) => {
            eprintln!(
                "Warning: {} not found. Using default prompt.",
                config.llm.system_prompt.display()
            );
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    }
}

/// CLI entry point: answer a single question, or run the interactive loop
/// when none was given.
pub async fn run_query(config: &Config, question: Option<String>) -> Result<()> {
    let service = RagService::new(config).await?;

    match question {
        Some(question) => {
            println!("Query: {}", question);
            println!("{}", "-".repeat(30));
            println!("{}", service.query(&question).await);
        }
        None => {
            println!("Starting interactive mode. Type 'exit' to quit.");
            loop {
                print!("\nEnter query: ");
                std::io::stdout().flush()?;

                let mut line = String::new();
                if std::io::stdin().read_line(&mut line)? == 0 {
                    break;
                }

                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
                    break;
                }

                println!("\n{}", service.query(question).await);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(file: &str, scheme: &str, doc: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            file_name: file.to_string(),
            scheme_name: scheme.to_string(),
            document_name: doc.to_string(),
            text: text.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn context_blocks_carry_source_links() {
        let tables = UrlTables::builtin();
        let chunks = vec![
            chunk(
                "HDFC_Liquid_KIM_21_Nov_2025.pdf",
                "HDFC Liquid Fund",
                "Liquid KIM",
                "File: HDFC_Liquid_KIM_21_Nov_2025.pdf\nContent: Exit load is nil.",
            ),
            chunk(
                "unknown.pdf",
                "Unknown",
                "Unknown",
                "File: unknown.pdf\nContent: Something.",
            ),
        ];

        let context = format_context(&tables, &chunks);

        let blocks: Vec<&str> = context.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("--- Document Source ---\n"));
        assert!(blocks[0].contains("Exit load is nil."));
        assert!(blocks[0].contains(
            "Source Link: https://files.hdfcfund.com/s3fs-public/KIM/2025-11/KIM%20-%20HDFC%20Liquid%20Fund"
        ));
        // Even the unknown chunk gets a citation.
        assert!(blocks[1].contains("Source Link: https://www.hdfcfund.com/explore/mutual-funds"));
    }

    #[test]
    fn empty_retrieval_formats_to_empty_context() {
        let tables = UrlTables::builtin();
        assert_eq!(format_context(&tables, &[]), "");
    }
}
