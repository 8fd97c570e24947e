//! Keyword/synonym resolution of free text to catalog entries.
//!
//! Deliberately not a statistical model: a scored longest-match-wins keyword
//! scanner keeps mapping deterministic and testable against the published
//! accuracy table. Quantity extraction is the collector's job; this stage
//! only decides *which* services the text is talking about.

use serde::Serialize;

use crate::catalog::{CatalogRow, CatalogSnapshot};

/// Byte range into the normalized input text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn overlaps(&self, other: &TextSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServiceMatch {
    pub catalog_row: CatalogRow,
    pub service_name: String,
    pub matched_keyword: String,
    pub match_score: f64,
    pub span: TextSpan,
}

/// Mapping output. An empty list is a valid "nothing to price" outcome, not
/// an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MappingResult {
    pub services: Vec<ServiceMatch>,
}

pub trait MappingEngine: Send + Sync {
    fn map_user_input(&self, text: &str, snapshot: &CatalogSnapshot) -> MappingResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordMappingEngine;

impl MappingEngine for KeywordMappingEngine {
    fn map_user_input(&self, text: &str, snapshot: &CatalogSnapshot) -> MappingResult {
        let normalized = normalize(text);

        // Per entry, keep only its longest matching keyword so "mulch" does
        // not double-count a span "triple ground mulch" already covers.
        let mut candidates = Vec::new();
        for entry in snapshot.entries() {
            let mut best: Option<(&str, TextSpan)> = None;
            for keyword in &entry.keywords {
                if let Some(span) = find_phrase(&normalized, keyword) {
                    let longer = best
                        .map(|(current, _)| keyword.len() > current.len())
                        .unwrap_or(true);
                    if longer {
                        best = Some((keyword, span));
                    }
                }
            }
            if let Some((keyword, span)) = best {
                candidates.push(ServiceMatch {
                    catalog_row: entry.catalog_row.clone(),
                    service_name: entry.service_name.clone(),
                    matched_keyword: keyword.to_string(),
                    match_score: keyword_score(keyword),
                    span,
                });
            }
        }

        // Across entries, a longer keyword wins an overlapping span. Exact
        // ties survive as candidates for the collector to disambiguate with
        // quantity/unit cues.
        candidates.sort_by(|a, b| {
            b.matched_keyword
                .len()
                .cmp(&a.matched_keyword.len())
                .then(a.span.start.cmp(&b.span.start))
                .then(a.catalog_row.0.cmp(&b.catalog_row.0))
        });

        let mut accepted: Vec<ServiceMatch> = Vec::new();
        for candidate in candidates {
            match accepted.iter().find(|existing| existing.span.overlaps(&candidate.span)) {
                None => accepted.push(candidate),
                Some(existing)
                    if existing.matched_keyword.len() == candidate.matched_keyword.len() =>
                {
                    accepted.push(candidate)
                }
                Some(_) => {}
            }
        }

        accepted.sort_by(|a, b| a.span.start.cmp(&b.span.start));
        MappingResult { services: accepted }
    }
}

/// Lowercase, punctuation stripped to spaces. The output is the coordinate
/// system every span in this pipeline refers to, so the collector calls this
/// with the identical input text.
pub(crate) fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_alphanumeric() {
            normalized.push(character.to_ascii_lowercase());
        } else if character == '.' {
            // Kept so "3.5 feet" survives tokenization.
            normalized.push('.');
        } else {
            normalized.push(' ');
        }
    }
    normalized
}

/// Leftmost whole-word occurrence of `phrase` in `haystack`.
fn find_phrase(haystack: &str, phrase: &str) -> Option<TextSpan> {
    if phrase.is_empty() {
        return None;
    }
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(phrase) {
        let start = from + offset;
        let end = start + phrase.len();
        let boundary_before =
            start == 0 || !haystack.as_bytes()[start - 1].is_ascii_alphanumeric();
        let boundary_after =
            end == haystack.len() || !haystack.as_bytes()[end].is_ascii_alphanumeric();
        if boundary_before && boundary_after {
            return Some(TextSpan { start, end });
        }
        from = start + 1;
    }
    None
}

/// Longer phrases score higher; diagnostics only, never a pricing input.
fn keyword_score(keyword: &str) -> f64 {
    (keyword.len() as f64 / 20.0).clamp(0.4, 1.0)
}

#[cfg(test)]
mod tests {
    use crate::fixtures;

    use super::{normalize, KeywordMappingEngine, MappingEngine};

    #[test]
    fn longest_keyword_wins_within_an_entry() {
        let snapshot = fixtures::demo_snapshot();
        let result = KeywordMappingEngine
            .map_user_input("45 sq ft triple ground mulch and 3 feet metal edging", &snapshot);

        assert_eq!(result.services.len(), 2);
        assert_eq!(result.services[0].matched_keyword, "triple ground mulch");
        assert_eq!(result.services[0].catalog_row.0, fixtures::MULCH_ROW);
        assert_eq!(result.services[1].matched_keyword, "metal edging");
        assert_eq!(result.services[1].catalog_row.0, fixtures::EDGING_ROW);
    }

    #[test]
    fn irrigation_setup_and_zones_map_to_distinct_entries() {
        let snapshot = fixtures::demo_snapshot();
        let result = KeywordMappingEngine.map_user_input("irrigation setup with 2 turf zones", &snapshot);

        let rows: Vec<&str> =
            result.services.iter().map(|service| service.catalog_row.0.as_str()).collect();
        assert_eq!(rows, vec![fixtures::IRRIGATION_SETUP_ROW, fixtures::IRRIGATION_ZONE_ROW]);
    }

    #[test]
    fn unmatched_text_yields_empty_result_not_error() {
        let snapshot = fixtures::demo_snapshot();
        let result = KeywordMappingEngine.map_user_input("hello, can you call me back?", &snapshot);
        assert!(result.services.is_empty());
    }

    #[test]
    fn word_boundaries_prevent_substring_matches() {
        let snapshot = fixtures::demo_snapshot();
        // "zoned" must not match the "zone" keyword.
        let result = KeywordMappingEngine.map_user_input("the lot is zoned residential", &snapshot);
        assert!(result.services.is_empty());
    }

    #[test]
    fn equal_length_overlaps_surface_both_candidates() {
        use crate::catalog::{CatalogRow, CatalogSnapshot, PricingModel, ServiceRates};
        use crate::config::CompanySettings;
        use crate::units::Unit;
        use rust_decimal::Decimal;

        let entry = |row: &str, name: &str, unit: Unit| crate::catalog::ServiceCatalogEntry {
            service_name: name.to_string(),
            catalog_row: CatalogRow(row.to_string()),
            unit,
            pricing_model: PricingModel::PerUnit,
            keywords: vec!["edging".to_string()],
            rates: ServiceRates {
                base_labor_hours_per_unit: 0.05,
                hourly_labor_rate: None,
                base_material_cost_per_unit: Decimal::new(2_00, 2),
                waste_factor: 0.10,
            },
            variable_categories: Default::default(),
        };
        let snapshot = CatalogSnapshot::new(
            1,
            CompanySettings::default(),
            vec![
                entry("metal_edging", "Metal Edging", Unit::LinearFeet),
                entry("stone_edging", "Stone Edging", Unit::LinearFeet),
            ],
        )
        .expect("valid");

        let result = KeywordMappingEngine.map_user_input("need 12 feet of edging", &snapshot);
        assert_eq!(result.services.len(), 2, "ambiguous keyword surfaces both candidates");
        assert_eq!(result.services[0].span, result.services[1].span);
    }

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(normalize("Mulch, please!"), "mulch  please ");
        assert_eq!(normalize("3.5 FEET"), "3.5 feet");
    }
}
