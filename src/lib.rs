//! # fundchat
//!
//! A retrieval-augmented chatbot over mutual-fund disclosure PDFs with cited
//! source links.
//!
//! fundchat ingests a fixed corpus of disclosure documents (SIDs, KIMs,
//! factsheets, leaflets), chunks and embeds them into a local SQLite vector
//! index, and answers natural-language questions by retrieving relevant
//! chunks, resolving a public citation URL for each, and handing the
//! assembled context to a hosted LLM.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────┐
//! │ PDF corpus│──▶│   Pipeline    │──▶│  SQLite   │
//! │ ./raw/**  │   │ Chunk+Embed  │   │  vectors  │
//! └───────────┘   └──────────────┘   └────┬─────┘
//!                                         │
//!                     ┌───────────────────┤
//!                     ▼                   ▼
//!                ┌──────────┐       ┌──────────┐
//!                │   CLI    │       │   HTTP   │
//!                │ (query)  │       │  (/chat) │
//!                └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fundchat init                  # create the index database
//! fundchat ingest                # embed the PDF corpus under ./raw
//! fundchat query "What is the exit load for HDFC Top 100?"
//! fundchat query                 # interactive loop
//! fundchat serve                 # start the chat API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`metadata`] | Filename → provenance extraction |
//! | [`corpus`] | PDF discovery and loading |
//! | [`chunk`] | Overlapping text chunking |
//! | [`embedding`] | OpenAI embeddings client and vector utilities |
//! | [`index`] | Batch index writer with single-retry semantics |
//! | [`search`] | Cosine retrieval with MMR re-ranking |
//! | [`resolver`] | Citation URL fallback chain |
//! | [`llm`] | OpenAI chat-completions client |
//! | [`rag`] | Query service tying retrieval, citations, and the LLM |
//! | [`server`] | Chat HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod chunk;
pub mod config;
pub mod corpus;
pub mod db;
pub mod embedding;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod metadata;
pub mod migrate;
pub mod models;
pub mod rag;
pub mod resolver;
pub mod search;
pub mod server;
