//! Core data models used throughout fundchat.
//!
//! These types represent the provenance records and chunks that flow through
//! the ingestion and retrieval pipeline.

/// Provenance derived from a corpus file's path and name.
///
/// `document_name` and `date_of_the_document` default to `"Unknown"` when the
/// filename matches no supported pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub file_name: String,
    pub scheme_name: String,
    pub document_name: String,
    pub date_of_the_document: String,
}

/// A chunk of document text with attached provenance, the unit stored in and
/// retrieved from the vector index. Immutable once ingested.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub id: String,
    pub collection: String,
    pub source_path: String,
    pub file_name: String,
    pub scheme_name: String,
    pub document_name: String,
    pub document_date: String,
    pub chunk_index: i64,
    /// Header-prefixed text (`File: …\nScheme: …\n…\nContent: …`).
    pub text: String,
    pub hash: String,
}

/// A chunk returned from retrieval, carrying what the context formatter and
/// citation resolver need.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub file_name: String,
    pub scheme_name: String,
    pub document_name: String,
    pub text: String,
    pub score: f32,
}
