//! Filename-to-provenance extraction.
//!
//! Disclosure PDFs in the corpus follow a handful of naming shapes
//! (`<scheme>_<doc>_<21_Nov_2025>.pdf`, `<scheme>_<doc>_<Jan_2026>.pdf`,
//! `<scheme>_<doc>.pdf`). The extractor runs an ordered list of pattern rules
//! over the stem and takes the first success; the scheme name always comes
//! from the immediate parent directory.
//!
//! The leading regex groups are non-greedy, so filenames with several
//! underscores before the date can split the scheme/doc boundary differently
//! than a human would. That is an accepted heuristic of the naming scheme,
//! not something the extractor tries to outguess.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::models::FileMetadata;

const MONTHS: &str = "(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec\
|January|February|March|April|June|July|August|September|October|November|December)";

/// How a dated pattern's capture groups assemble into a date string.
#[derive(Debug, Clone, Copy)]
enum DateStyle {
    /// Groups: scheme, doc, day, month, year → "day month year".
    DayMonthYear,
    /// Groups: scheme, doc, month, year → "month year".
    MonthYear,
}

struct DatedPattern {
    pattern: Regex,
    style: DateStyle,
}

/// Dated filename rules, most specific first. Evaluated in order; the first
/// match wins.
static DATED_PATTERNS: Lazy<Vec<DatedPattern>> = Lazy::new(|| {
    vec![
        DatedPattern {
            pattern: Regex::new(&format!(
                r"(?i)^(.*?)_(.*?)_(\d{{1,2}})_({MONTHS})_(\d{{4}})$"
            ))
            .expect("day-month-year filename pattern"),
            style: DateStyle::DayMonthYear,
        },
        DatedPattern {
            pattern: Regex::new(&format!(r"(?i)^(.*?)_(.*?)_({MONTHS})_(\d{{4}})$"))
                .expect("month-year filename pattern"),
            style: DateStyle::MonthYear,
        },
    ]
});

/// Document-type vocabulary for undated filenames, scanned in order.
const DOC_TYPE_TOKENS: [&str; 9] = [
    "KIM",
    "SID",
    "Factsheet",
    "Fund_Facts",
    "Leaflet",
    "Presentation",
    "ProductPage",
    "SCHEME_SUMMARY_DOCUMENT",
    "Fact_Sheet",
];

/// Derives provenance from a corpus file path.
///
/// The scheme name is the immediate parent directory with underscores
/// replaced by spaces. `document_name` and `date_of_the_document` stay
/// `"Unknown"` unless a rule matches.
pub fn extract_metadata(path: &Path) -> FileMetadata {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let scheme_name = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().replace('_', " "))
        .unwrap_or_default();

    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut meta = FileMetadata {
        file_name,
        scheme_name,
        document_name: "Unknown".to_string(),
        date_of_the_document: "Unknown".to_string(),
    };

    for rule in DATED_PATTERNS.iter() {
        if let Some(caps) = rule.pattern.captures(&stem) {
            match rule.style {
                DateStyle::DayMonthYear => {
                    meta.document_name = caps[2].replace('_', " ");
                    meta.date_of_the_document =
                        format!("{} {} {}", &caps[3], &caps[4], &caps[5]);
                }
                DateStyle::MonthYear => {
                    meta.document_name = caps[2].replace('_', " ");
                    meta.date_of_the_document = format!("{} {}", &caps[3], &caps[4]);
                }
            }
            return meta;
        }
    }

    // Undated: look for a known document-type token anywhere in the stem.
    let stem_lower = stem.to_lowercase();
    for token in DOC_TYPE_TOKENS {
        if stem_lower.contains(&token.to_lowercase()) {
            meta.document_name = token.replace('_', " ");
            return meta;
        }
    }

    // Nothing recognized: the whole stem is the best label we have.
    meta.document_name = stem.replace('_', " ");
    meta
}
