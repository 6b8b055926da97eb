//! Overlapping text chunker with prioritized split boundaries.
//!
//! Splits document text into chunks of a target character size with a fixed
//! overlap. Boundaries are chosen from a prioritized separator list —
//! paragraph (`\n\n`), line (`\n`), space, and finally a hard character
//! split — so chunks keep as much local structure as the text allows.
//!
//! Each chunk is prefixed with a human-readable provenance header and
//! receives a UUID plus a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{DocumentChunk, FileMetadata};

/// Split boundaries in priority order; the empty separator means a hard
/// character split.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Split text into pieces of at most `chunk_size` characters, overlapping by
/// roughly `chunk_overlap`, preferring the earliest separator in
/// [`SEPARATORS`] that produces workable pieces.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut out = Vec::new();
    split_with(text, chunk_size, chunk_overlap, &SEPARATORS, &mut out);
    out.retain(|piece| !piece.trim().is_empty());
    out
}

fn split_with(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
    out: &mut Vec<String>,
) {
    if text.is_empty() {
        return;
    }

    if text.len() <= chunk_size {
        out.push(text.to_string());
        return;
    }

    let (sep, rest) = match separators.split_first() {
        Some((first, rest)) => (*first, rest),
        None => ("", &[][..]),
    };

    if sep.is_empty() {
        hard_split(text, chunk_size, chunk_overlap, out);
        return;
    }

    if !text.contains(sep) {
        split_with(text, chunk_size, chunk_overlap, rest, out);
        return;
    }

    let pieces: Vec<&str> = text.split(sep).collect();
    merge_pieces(&pieces, sep, chunk_size, chunk_overlap, rest, out);
}

/// Accumulate pieces into windows of at most `chunk_size`, carrying a tail of
/// pieces within the overlap budget into the next window. Oversized pieces
/// recurse with the remaining separators.
fn merge_pieces(
    pieces: &[&str],
    sep: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    rest: &[&str],
    out: &mut Vec<String>,
) {
    let mut window: Vec<&str> = Vec::new();
    let mut window_len = 0usize;

    for &piece in pieces {
        if piece.len() > chunk_size {
            if !window.is_empty() {
                out.push(window.join(sep));
                window.clear();
                window_len = 0;
            }
            split_with(piece, chunk_size, chunk_overlap, rest, out);
            continue;
        }

        let sep_cost = if window.is_empty() { 0 } else { sep.len() };
        if window_len + sep_cost + piece.len() > chunk_size && !window.is_empty() {
            out.push(window.join(sep));

            let mut tail: Vec<&str> = Vec::new();
            let mut tail_len = 0usize;
            for &kept in window.iter().rev() {
                let extra = kept.len() + if tail.is_empty() { 0 } else { sep.len() };
                if tail_len + extra > chunk_overlap {
                    break;
                }
                tail.push(kept);
                tail_len += extra;
            }
            tail.reverse();

            // The carried tail plus the incoming piece must still fit.
            while !tail.is_empty() && tail_len + sep.len() + piece.len() > chunk_size {
                tail.remove(0);
                tail_len = joined_len(&tail, sep);
            }

            window = tail;
            window_len = tail_len;
        }

        let sep_cost = if window.is_empty() { 0 } else { sep.len() };
        window.push(piece);
        window_len += sep_cost + piece.len();
    }

    if !window.is_empty() {
        out.push(window.join(sep));
    }
}

fn joined_len(pieces: &[&str], sep: &str) -> usize {
    if pieces.is_empty() {
        return 0;
    }
    pieces.iter().map(|p| p.len()).sum::<usize>() + sep.len() * (pieces.len() - 1)
}

/// Last-resort split at fixed character offsets, stepping by
/// `chunk_size - chunk_overlap` so consecutive chunks share a tail.
fn hard_split(text: &str, chunk_size: usize, chunk_overlap: usize, out: &mut Vec<String>) {
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0usize;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
}

/// Build the retrievable chunks for one source file: split the text, prefix
/// every piece with the provenance header, and stamp ids and hashes.
pub fn build_chunks(
    meta: &FileMetadata,
    source_path: &str,
    collection: &str,
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<DocumentChunk> {
    split_text(text, chunk_size, chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(index, piece)| {
            let enriched = format!(
                "File: {}\nScheme: {}\nDocument: {}\nDate: {}\nContent: {}",
                meta.file_name,
                meta.scheme_name,
                meta.document_name,
                meta.date_of_the_document,
                piece
            );
            make_chunk(meta, source_path, collection, index as i64, enriched)
        })
        .collect()
}

fn make_chunk(
    meta: &FileMetadata,
    source_path: &str,
    collection: &str,
    index: i64,
    text: String,
) -> DocumentChunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    DocumentChunk {
        id: Uuid::new_v4().to_string(),
        collection: collection.to_string(),
        source_path: source_path.to_string(),
        file_name: meta.file_name.clone(),
        scheme_name: meta.scheme_name.clone(),
        document_name: meta.document_name.clone(),
        document_date: meta.date_of_the_document.clone(),
        chunk_index: index,
        text,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_meta() -> FileMetadata {
        FileMetadata {
            file_name: "HDFC_Liquid_KIM_21_Nov_2025.pdf".to_string(),
            scheme_name: "HDFC Liquid Fund".to_string(),
            document_name: "Liquid KIM".to_string(),
            date_of_the_document: "21 Nov 2025".to_string(),
        }
    }

    #[test]
    fn small_text_single_piece() {
        let pieces = split_text("Hello, world!", 1024, 100);
        assert_eq!(pieces, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_text("", 1024, 100).is_empty());
        assert!(split_text("   \n\n  ", 1024, 100).is_empty());
    }

    #[test]
    fn splits_on_paragraphs_first() {
        let text = "First paragraph about exit loads.\n\nSecond paragraph about NAV.\n\nThird paragraph about expense ratios.";
        let pieces = split_text(text, 70, 0);
        assert!(pieces.len() > 1);
        // Paragraph boundaries respected: no piece starts or ends mid-word.
        for piece in &pieces {
            assert!(piece.len() <= 70, "piece too long: {}", piece.len());
        }
        assert!(pieces[0].contains("First paragraph"));
    }

    #[test]
    fn consecutive_pieces_overlap() {
        let text = (0..40)
            .map(|i| format!("sentence number {}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let pieces = split_text(&text, 120, 40);
        assert!(pieces.len() > 1);
        for pair in pieces.windows(2) {
            let prev_tail: String = pair[0].chars().rev().take(20).collect::<String>();
            let tail: String = prev_tail.chars().rev().collect();
            assert!(
                pair[1].contains(tail.trim()),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn long_unbroken_text_hard_splits() {
        let text = "x".repeat(5000);
        let pieces = split_text(&text, 1024, 100);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.len() <= 1024);
        }
    }

    #[test]
    fn hard_split_is_char_safe() {
        // Multibyte characters must not be cut mid-codepoint.
        let text = "₹".repeat(2000);
        let pieces = split_text(&text, 100, 10);
        assert!(!pieces.is_empty());
        for piece in &pieces {
            assert!(piece.chars().all(|c| c == '₹'));
        }
    }

    #[test]
    fn pieces_respect_target_size() {
        let text = "word ".repeat(2000);
        for piece in split_text(&text, 256, 32) {
            assert!(piece.len() <= 256, "piece exceeds target: {}", piece.len());
        }
    }

    #[test]
    fn chunks_carry_provenance_header() {
        let meta = test_meta();
        let chunks = build_chunks(&meta, "raw/HDFC_Liquid_Fund/x.pdf", "hdfc_mutual_fund", "Exit load is nil.", 1024, 100);
        assert_eq!(chunks.len(), 1);
        let text = &chunks[0].text;
        assert!(text.starts_with("File: HDFC_Liquid_KIM_21_Nov_2025.pdf\n"));
        assert!(text.contains("Scheme: HDFC Liquid Fund\n"));
        assert!(text.contains("Document: Liquid KIM\n"));
        assert!(text.contains("Date: 21 Nov 2025\n"));
        assert!(text.ends_with("Content: Exit load is nil."));
    }

    #[test]
    fn chunk_indices_contiguous() {
        let meta = test_meta();
        let body = "paragraph\n\n".repeat(200);
        let chunks = build_chunks(&meta, "raw/x.pdf", "hdfc_mutual_fund", &body, 64, 8);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
        }
    }

    #[test]
    fn identical_text_same_hash_distinct_ids() {
        let meta = test_meta();
        let a = build_chunks(&meta, "raw/x.pdf", "c", "same words", 1024, 100);
        let b = build_chunks(&meta, "raw/x.pdf", "c", "same words", 1024, 100);
        assert_eq!(a[0].hash, b[0].hash);
        assert_ne!(a[0].id, b[0].id);
    }
}
