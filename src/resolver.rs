//! Citation URL resolution.
//!
//! Every retrieved chunk is cited with a public URL. Resolution walks an
//! ordered fallback chain, most specific tier first:
//!
//! 1. exact filename in the hand-maintained file→URL table (plus any
//!    manifest entries),
//! 2. scheme name → fund slug, or slug inferred from filename substrings,
//!    building the fund's explore page,
//! 3. document-type category page (Factsheet / SID / KIM),
//! 4. the generic fund catalog.
//!
//! The chain always terminates at the catalog page, so resolution never
//! fails and never returns an empty string.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const EXPLORE_BASE: &str = "https://www.hdfcfund.com/explore/mutual-funds";
const FACTSHEETS_URL: &str = "https://www.hdfcfund.com/investor-services/factsheets";
const SID_URL: &str = "https://www.hdfcfund.com/investor-services/fund-documents/sid";
const KIM_URL: &str = "https://www.hdfcfund.com/investor-services/fund-documents/kim";

/// Filename substrings that identify a fund when the scheme name alone does
/// not. Checked in order against the lowercased filename.
const SLUG_HINTS: [(&[&str], &str); 5] = [
    (&["largecap", "top 100"], "hdfc-large-cap-fund"),
    (&["flexicap", "multi-cap"], "hdfc-flexi-cap-fund"),
    (&["elss", "tax_saver"], "hdfc-elss-tax-saver"),
    (&["balancedadvantage", "prudence"], "hdfc-balanced-advantage-fund"),
    (&["liquid"], "hdfc-liquid-fund"),
];

/// Immutable URL lookup tables consulted by [`UrlTables::resolve`].
///
/// Built once at service start from the hand-maintained entries, optionally
/// merged with a JSON manifest, then shared read-only.
#[derive(Debug, Clone)]
pub struct UrlTables {
    /// Exact filename → deep link to the published PDF.
    file_urls: HashMap<String, String>,
    /// Scheme name → fund slug.
    scheme_slugs: HashMap<String, String>,
}

/// Manifest shape: `{"documents": [{"name": …, "url": …}, …]}`.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    documents: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: Option<String>,
    url: Option<String>,
}

impl UrlTables {
    /// The hand-maintained tables: direct links for every published corpus
    /// PDF, and the scheme-name→slug map for the five covered funds.
    pub fn builtin() -> Self {
        let file_urls: HashMap<String, String> = [
            // HDFC Large Cap Fund
            ("HDFC_LargeCapFund_SID_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/SID/2025-11/SID%20-%20HDFC%20Large%20Cap%20Fund%20dated%20November%2021%2C%202025_0.pdf"),
            ("HDFC_LargeCapFund_KIM_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/KIM/2025-11/KIM%20-%20HDFC%20Large%20Cap%20Fund%20dated%20November%2021%2C%202025_0.pdf"),
            ("HDFC_LargeCapFund_Leaflet_Jan_2026.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2026-02/HDFC%20Large%20Cap%20Fund%20Leaflet%20%28Jan%202026%29.pdf"),
            ("HDFC_LargeCapFund_Presentation_September_2025.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2025-10/HDFC%20Large%20Cap%20Fund%20Presentation%20%28September%202025%29.pdf"),
            ("HDFC_LargeCapFund_Fund_Facts_January_2026.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2026-02/Fund%20Facts%20-%20HDFC%20Large%20Cap%20Fund_January%2026.pdf"),
            // HDFC Flexi Cap Fund
            ("HDFC_FlexiCap_SID_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/SID/2025-11/SID%20-%20HDFC%20Flexi%20Cap%20Fund%20dated%20November%2021%2C%202025_0.pdf"),
            ("HDFC_FlexiCap_KIM_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/KIM/2025-11/KIM%20-%20HDFC%20Flexi%20Cap%20Fund%20dated%20November%2021%2C%202025_1.pdf"),
            ("HDFC_FlexiCap_Fund_Facts_Jan_2026.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2026-02/Fund%20Facts%20-%20HDFC%20Flexi%20Cap%20Fund_January%2026.pdf"),
            ("HDFC_FlexiCap_Presentation_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2025-12/HDFC%20Flexi%20Cap%20Fund%20Presentation%20%28November%202025%29.pdf"),
            ("HDFC_FlexiCap_Leaflet_Dec_2025.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2025-12/HDFC%20Flexi%20Cap%20Fund%20Leaflet%20%28December%202025%29.pdf"),
            // HDFC Balanced Advantage Fund
            ("HDFC_BalancedAdvantage_SID_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/SID/2025-11/SID%20-%20HDFC%20Balanced%20Advantage%20Fund%20dated%20November%2021%2C%202025_0.pdf"),
            ("HDFC_BalancedAdvantage_KIM_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/KIM/2025-11/KIM%20-%20HDFC%20Balanced%20Advantage%20Fund%20dated%20November%2021%2C%202025_0.pdf"),
            ("HDFC_BalancedAdvantage_Fund_Facts_Jan_2026.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2026-02/Fund%20Facts%20-%20HDFC%20Balanced%20Advantage%20Fund_January%2026.pdf"),
            ("HDFC_BalancedAdvantage_Presentation_Jan_2026.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2026-02/Presentation%20-%20HDFC%20Balanced%20Advantage%20Fund%20%28Jan%202026%29.pdf"),
            ("HDFC_BalancedAdvantage_Leaflet_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2025-11/Leaflet%20-%20HDFC%20Balanced%20Advantage%20Fund%20%28November%202025%29.pdf"),
            // HDFC ELSS Tax Saver
            ("HDFC_ELSS_Tax_Saver_SID_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/SID/2025-11/SID%20-%20HDFC%20ELSS%20Tax%20Saver%20dated%20November%2021%2C%202025.pdf"),
            ("HDFC_ELSS_Tax_Saver_KIM_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/KIM/2025-11/KIM%20-%20HDFC%20ELSS%20Tax%20Saver%20dated%20November%2021%2C%202025_0.pdf"),
            ("HDFC_ELSS_Tax_Saver_Presentation_Oct_2025.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2025-10/HDFC%20ELSS%20Tax%20saver%20Presentation%20%28October%202025%29.pdf"),
            ("HDFC_ELSS_Tax_Saver_Leaflet_Jan_2024.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2025-01/HDFC%20ELSS%20%20Tax%20saver%20Leaflet%20-%20January%202024%20%281%29.pdf"),
            ("HDFC_ELSS_Tax_Saver_Fund_Facts_Jan_2026.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2026-02/Fund%20Facts%20-%20HDFC%20TaxSaver%20Fund_January%2026.pdf"),
            // HDFC Liquid Fund
            ("HDFC_Liquid_SID_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/SID/2025-11/SID%20-%20HDFC%20Liquid%20Fund%20dated%20November%2021%2C%202025.pdf"),
            ("HDFC_Liquid_KIM_21_Nov_2025.pdf", "https://files.hdfcfund.com/s3fs-public/KIM/2025-11/KIM%20-%20HDFC%20Liquid%20Fund%20dated%20November%2021%2C%202025.pdf"),
            ("HDFC_Liquid_Fund_Facts_Dec_2025.pdf", "https://files.hdfcfund.com/s3fs-public/Others/2025-12/Fund%20Facts%20-%20HDFC%20Liquid%20Fund%20-%20December%202025%20%5Ba%5D.pdf"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let scheme_slugs: HashMap<String, String> = [
            ("HDFC Large Cap Fund", "hdfc-large-cap-fund"),
            ("HDFC Flexi Cap Fund", "hdfc-flexi-cap-fund"),
            ("HDFC ELSS Tax Saver", "hdfc-elss-tax-saver"),
            ("HDFC Balanced Advantage Fund", "hdfc-balanced-advantage-fund"),
            ("HDFC Liquid Fund", "hdfc-liquid-fund"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            file_urls,
            scheme_slugs,
        }
    }

    /// Merge manifest entries for filenames not already mapped. A missing or
    /// unreadable manifest is a warning, never an error.
    pub fn with_manifest(mut self, path: &Path) -> Self {
        if !path.exists() {
            return self;
        }

        let manifest: Manifest = match std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from))
        {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Warning: failed to load manifest {}: {}", path.display(), e);
                return self;
            }
        };

        for entry in manifest.documents {
            if let (Some(name), Some(url)) = (entry.name, entry.url) {
                if !url.is_empty() {
                    self.file_urls.entry(name).or_insert(url);
                }
            }
        }

        self
    }

    /// Resolve a chunk's citation URL through the fallback chain. Always
    /// returns a non-empty URL.
    pub fn resolve(&self, file_name: &str, scheme_name: &str, document_name: &str) -> String {
        // Tier 1: direct link for this exact file.
        if let Some(url) = self.file_urls.get(file_name) {
            return url.clone();
        }

        // Tier 2: fund slug from the scheme name, else inferred from the
        // filename.
        let slug = self
            .scheme_slugs
            .get(scheme_name)
            .cloned()
            .or_else(|| infer_slug(file_name));

        if let Some(slug) = slug {
            return format!("{EXPLORE_BASE}/{slug}/direct");
        }

        // Tier 3: document-category page.
        if document_name.contains("Factsheet") {
            return FACTSHEETS_URL.to_string();
        }
        if document_name.contains("SID") {
            return SID_URL.to_string();
        }
        if document_name.contains("KIM") {
            return KIM_URL.to_string();
        }

        // Tier 4: the catalog page.
        EXPLORE_BASE.to_string()
    }
}

/// Infer a fund slug from the lowercased filename, first matching hint wins.
fn infer_slug(file_name: &str) -> Option<String> {
    let lower = file_name.to_lowercase();
    for (needles, slug) in SLUG_HINTS {
        if needles.iter().any(|needle| lower.contains(needle)) {
            return Some(slug.to_string());
        }
    }
    None
}
