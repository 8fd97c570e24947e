//! Complexity-variable extraction for services whose formula needs more than
//! quantity: site access, tear-out, material grade, crew size, obstacle
//! removal.
//!
//! Extraction is cue-phrase driven and falls back to the catalog default for
//! every category without a cue. Which categories were inferred from text
//! versus defaulted is tracked separately: both land in `values`, but the
//! split feeds confidence accounting and breakdown text. A low confidence
//! signals heavy reliance on defaults, not an error.

pub mod paver_patio;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::catalog::{ServiceCatalogEntry, VariableKind};
use crate::mapping::normalize;

/// A resolved value for one variable category.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    Number(f64),
    Selection(String),
    Toggle(bool),
}

/// Per-service complexity inputs. Every category the entry declares appears
/// in `values` and in exactly one of `inferred` / `defaulted`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResolvedVariables {
    pub values: BTreeMap<String, VariableValue>,
    pub inferred: BTreeSet<String>,
    pub defaulted: BTreeSet<String>,
}

impl ResolvedVariables {
    pub fn get(&self, category: &str) -> Option<&VariableValue> {
        self.values.get(category)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariableExtraction {
    /// Primary quantity echoed back for downstream formula use.
    pub quantity: f64,
    pub values: ResolvedVariables,
    pub extracted_variables: Vec<String>,
    pub defaults_used: Vec<String>,
    /// Coverage ratio: inferred categories / total categories. 1.0 when the
    /// entry declares no categories at all.
    pub confidence: f64,
}

pub trait VariableMapper: Send + Sync {
    fn extract_variables(
        &self,
        text: &str,
        quantity: f64,
        entry: &ServiceCatalogEntry,
    ) -> VariableExtraction;
}

/// What a matched cue resolves a category to.
#[derive(Clone, Debug, PartialEq)]
pub enum CueOutcome {
    Select(String),
    Toggle(bool),
    Number(f64),
}

/// One cue phrase for one category. Phrases are matched against normalized
/// text; longer phrases win within a category.
#[derive(Clone, Debug, PartialEq)]
pub struct CueRule {
    pub category: String,
    pub phrase: String,
    pub outcome: CueOutcome,
}

/// A numeric pattern like "3 person crew": a number within `max_distance`
/// tokens of any anchor word resolves a `Number` category.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberAnchor {
    pub category: String,
    pub anchors: Vec<String>,
    pub max_distance: usize,
}

/// Generic cue-table mapper. Domain mappers (see [`paver_patio`]) are
/// configured instances of this type; the machinery never hardcodes a
/// service.
#[derive(Clone, Debug, Default)]
pub struct CueVariableMapper {
    rules: Vec<CueRule>,
    number_anchors: Vec<NumberAnchor>,
}

impl CueVariableMapper {
    pub fn new(rules: Vec<CueRule>, number_anchors: Vec<NumberAnchor>) -> Self {
        Self { rules, number_anchors }
    }

    fn infer(&self, normalized: &str, category: &str, entry: &ServiceCatalogEntry) -> Option<VariableValue> {
        let spec = entry.variable_categories.get(category)?;

        // Longest matching cue phrase for this category wins.
        let mut best: Option<&CueRule> = None;
        for rule in self.rules.iter().filter(|rule| rule.category == category) {
            if contains_phrase(normalized, &rule.phrase)
                && best.map(|current| rule.phrase.len() > current.phrase.len()).unwrap_or(true)
            {
                best = Some(rule);
            }
        }
        if let Some(rule) = best {
            let value = match (&rule.outcome, &spec.kind) {
                (CueOutcome::Select(key), VariableKind::Select { .. }) => {
                    // A cue pointing at an option the catalog no longer
                    // carries is stale config; fall back to the default.
                    spec.has_option(key).then(|| VariableValue::Selection(key.clone()))
                }
                (CueOutcome::Toggle(state), VariableKind::Toggle { .. }) => {
                    Some(VariableValue::Toggle(*state))
                }
                (CueOutcome::Number(value), VariableKind::Number { validation, .. }) => {
                    let clamped = validation.map(|range| range.clamp(*value)).unwrap_or(*value);
                    Some(VariableValue::Number(clamped))
                }
                _ => None,
            };
            if value.is_some() {
                return value;
            }
        }

        // Numeric anchors only apply to Number categories.
        if let VariableKind::Number { validation, .. } = &spec.kind {
            for anchor in self.number_anchors.iter().filter(|anchor| anchor.category == category) {
                if let Some(value) = number_near_anchor(normalized, anchor) {
                    let clamped = validation.map(|range| range.clamp(value)).unwrap_or(value);
                    return Some(VariableValue::Number(clamped));
                }
            }
        }

        None
    }
}

impl VariableMapper for CueVariableMapper {
    fn extract_variables(
        &self,
        text: &str,
        quantity: f64,
        entry: &ServiceCatalogEntry,
    ) -> VariableExtraction {
        let normalized = normalize(text);
        let mut resolved = ResolvedVariables::default();

        for (category, spec) in &entry.variable_categories {
            match self.infer(&normalized, category, entry) {
                Some(value) => {
                    resolved.values.insert(category.clone(), value);
                    resolved.inferred.insert(category.clone());
                }
                None => {
                    let default = match &spec.kind {
                        VariableKind::Number { default, .. } => VariableValue::Number(*default),
                        VariableKind::Select { default, .. } => {
                            VariableValue::Selection(default.clone())
                        }
                        VariableKind::Toggle { default, .. } => VariableValue::Toggle(*default),
                    };
                    resolved.values.insert(category.clone(), default);
                    resolved.defaulted.insert(category.clone());
                }
            }
        }

        let total = entry.variable_categories.len();
        let confidence = if total == 0 {
            1.0
        } else {
            resolved.inferred.len() as f64 / total as f64
        };

        VariableExtraction {
            quantity,
            extracted_variables: resolved.inferred.iter().cloned().collect(),
            defaults_used: resolved.defaulted.iter().cloned().collect(),
            values: resolved,
            confidence,
        }
    }
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    let mut from = 0;
    while let Some(offset) = normalized[from..].find(phrase) {
        let start = from + offset;
        let end = start + phrase.len();
        let boundary_before =
            start == 0 || !normalized.as_bytes()[start - 1].is_ascii_alphanumeric();
        let boundary_after =
            end == normalized.len() || !normalized.as_bytes()[end].is_ascii_alphanumeric();
        if boundary_before && boundary_after {
            return true;
        }
        from = start + 1;
    }
    false
}

fn number_near_anchor(normalized: &str, anchor: &NumberAnchor) -> Option<f64> {
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    for (index, token) in tokens.iter().enumerate() {
        let Ok(value) = token.trim_matches('.').parse::<f64>() else {
            continue;
        };
        if !value.is_finite() || value <= 0.0 {
            continue;
        }
        let window_end = (index + anchor.max_distance + 1).min(tokens.len());
        let nearby = tokens[index + 1..window_end]
            .iter()
            .any(|candidate| anchor.anchors.iter().any(|word| word == candidate));
        if nearby {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::fixtures;

    use super::{CueVariableMapper, VariableMapper, VariableValue};

    fn paver_entry() -> crate::catalog::ServiceCatalogEntry {
        fixtures::demo_entries()
            .into_iter()
            .find(|entry| entry.catalog_row.0 == fixtures::PAVER_PATIO_ROW)
            .expect("paver patio entry")
    }

    #[test]
    fn no_cues_means_everything_defaulted() {
        let mapper = super::paver_patio::paver_patio_mapper();
        let extraction = mapper.extract_variables("120 sq ft paver patio", 120.0, &paver_entry());

        assert!(extraction.extracted_variables.is_empty());
        assert_eq!(extraction.defaults_used.len(), 5);
        assert_eq!(extraction.confidence, 0.0);
        assert_eq!(extraction.quantity, 120.0);
        assert_eq!(
            extraction.values.get("site_access"),
            Some(&VariableValue::Selection("easy".to_string()))
        );
    }

    #[test]
    fn entry_without_categories_scores_full_confidence() {
        let mulch = fixtures::demo_entries()
            .into_iter()
            .find(|entry| entry.catalog_row.0 == fixtures::MULCH_ROW)
            .expect("mulch entry");
        let mapper = CueVariableMapper::default();
        let extraction = mapper.extract_variables("45 sq ft mulch", 45.0, &mulch);

        assert_eq!(extraction.confidence, 1.0);
        assert!(extraction.values.values.is_empty());
    }

    #[test]
    fn every_category_lands_in_exactly_one_set() {
        let mapper = super::paver_patio::paver_patio_mapper();
        let extraction = mapper.extract_variables(
            "200 sq ft paver patio, tight access, removing concrete",
            200.0,
            &paver_entry(),
        );

        let entry = paver_entry();
        for category in entry.variable_categories.keys() {
            let inferred = extraction.values.inferred.contains(category);
            let defaulted = extraction.values.defaulted.contains(category);
            assert!(inferred ^ defaulted, "category {category} must be in exactly one set");
            assert!(extraction.values.values.contains_key(category));
        }
    }
}
