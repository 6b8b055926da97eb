//! # fundchat CLI
//!
//! The `fundchat` binary drives the whole system: index initialization,
//! corpus ingestion, one-shot or interactive querying, and the chat API
//! server.
//!
//! ## Usage
//!
//! ```bash
//! fundchat --config ./config/fundchat.toml <command>
//! ```
//!
//! All settings have working defaults (`./raw` corpus, `./index` database),
//! so the config flag is only needed to override them.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fundchat init` | Create the SQLite index and schema |
//! | `fundchat ingest` | Chunk and embed every PDF under the corpus root |
//! | `fundchat query [QUESTION]` | Answer one question, or start a REPL |
//! | `fundchat serve` | Start the chat HTTP API |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fundchat::{config, db, ingest, migrate, rag, server};

/// fundchat — a retrieval-augmented chatbot over mutual-fund disclosure
/// PDFs with cited source links.
#[derive(Parser)]
#[command(
    name = "fundchat",
    about = "fundchat — a RAG chatbot over mutual-fund disclosure PDFs with cited source links",
    version,
    long_about = "fundchat ingests a corpus of mutual-fund disclosure PDFs, embeds them into a \
    local SQLite vector index, and answers questions through a CLI or HTTP API, citing a public \
    source link for every retrieved document."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Built-in defaults are used when the file does not exist.
    #[arg(long, global = true, default_value = "./config/fundchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the index database schema.
    ///
    /// Creates the SQLite file and the chunk/vector tables. Idempotent —
    /// running it multiple times is safe.
    Init,

    /// Ingest the PDF corpus.
    ///
    /// Discovers PDFs under the corpus root, extracts and chunks their text,
    /// embeds the chunks in batches, and writes them to the index. Requires
    /// `OPENAI_API_KEY` unless `--dry-run` is given.
    Ingest {
        /// Count files and chunks without embedding or writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask a question, or start an interactive loop.
    ///
    /// With a question argument, prints the answer and exits. Without one,
    /// reads queries from stdin until `exit` or `quit`.
    Query {
        /// The question to answer.
        question: Option<String>,
    },

    /// Start the chat HTTP API.
    ///
    /// Serves `POST /chat` and `GET /health` on the configured bind address.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up OPENAI_API_KEY and friends from a local .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Query { question } => {
            rag::run_query(&cfg, question).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
