//! Canonical measurement units and the synonym table used during extraction.
//!
//! Every catalog entry declares exactly one canonical unit. User text is free
//! to say "sq ft", "square feet", or "sqft"; the collector normalizes those
//! through [`match_unit`] before comparing against the catalog.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Sqft,
    LinearFeet,
    CubicYards,
    Each,
}

impl Unit {
    /// Short label used in customer-facing messages and breakdown lines.
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Sqft => "sqft",
            Unit::LinearFeet => "linear feet",
            Unit::CubicYards => "cubic yards",
            Unit::Each => "each",
        }
    }

    /// Phrase used when asking the customer for a missing quantity.
    pub fn question_phrase(&self) -> &'static str {
        match self {
            Unit::Sqft => "square feet",
            Unit::LinearFeet => "linear feet",
            Unit::CubicYards => "cubic yards",
            Unit::Each => "units",
        }
    }
}

/// Longest-first synonym table. Multi-word synonyms must come before their
/// single-word prefixes so that "square feet" wins over a bare "feet".
const UNIT_SYNONYMS: &[(&[&str], Unit)] = &[
    (&["square", "feet"], Unit::Sqft),
    (&["square", "foot"], Unit::Sqft),
    (&["sq", "ft"], Unit::Sqft),
    (&["sq", "feet"], Unit::Sqft),
    (&["sq", "foot"], Unit::Sqft),
    (&["linear", "feet"], Unit::LinearFeet),
    (&["linear", "ft"], Unit::LinearFeet),
    (&["linear", "foot"], Unit::LinearFeet),
    (&["cubic", "yards"], Unit::CubicYards),
    (&["cubic", "yard"], Unit::CubicYards),
    (&["sqft"], Unit::Sqft),
    (&["feet"], Unit::LinearFeet),
    (&["foot"], Unit::LinearFeet),
    (&["ft"], Unit::LinearFeet),
    (&["yards"], Unit::CubicYards),
    (&["yard"], Unit::CubicYards),
    (&["yd"], Unit::CubicYards),
    (&["each"], Unit::Each),
    (&["units"], Unit::Each),
    (&["unit"], Unit::Each),
    (&["zones"], Unit::Each),
    (&["zone"], Unit::Each),
    (&["jobs"], Unit::Each),
    (&["job"], Unit::Each),
];

/// Match a unit synonym at the start of `tokens`. Returns the canonical unit
/// and the number of tokens consumed. The table is ordered longest-first, so
/// the most specific synonym wins.
pub fn match_unit(tokens: &[&str]) -> Option<(Unit, usize)> {
    for (synonym, unit) in UNIT_SYNONYMS {
        if synonym.len() <= tokens.len()
            && synonym.iter().zip(tokens).all(|(expected, actual)| expected == actual)
        {
            return Some((*unit, synonym.len()));
        }
    }
    None
}

/// Render a quantity the way a person would write it: "45", not "45.0".
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Whether a unit found in text satisfies a catalog entry's canonical unit.
/// The conversion table is deliberately small; identity plus nothing else
/// today, extended as new services are onboarded.
pub fn convertible(found: Unit, canonical: Unit) -> bool {
    found == canonical
}

#[cfg(test)]
mod tests {
    use super::{convertible, match_unit, Unit};

    #[test]
    fn multi_word_synonyms_win_over_prefixes() {
        let tokens = ["square", "feet", "of", "mulch"];
        assert_eq!(match_unit(&tokens), Some((Unit::Sqft, 2)));
    }

    #[test]
    fn bare_feet_normalizes_to_linear_feet() {
        let tokens = ["feet", "metal", "edging"];
        assert_eq!(match_unit(&tokens), Some((Unit::LinearFeet, 1)));
    }

    #[test]
    fn zones_count_as_each() {
        let tokens = ["zones"];
        assert_eq!(match_unit(&tokens), Some((Unit::Each, 1)));
    }

    #[test]
    fn unknown_tokens_do_not_match() {
        assert_eq!(match_unit(&["mulch"]), None);
        assert_eq!(match_unit(&[]), None);
    }

    #[test]
    fn conversion_is_identity_only() {
        assert!(convertible(Unit::Sqft, Unit::Sqft));
        assert!(!convertible(Unit::LinearFeet, Unit::Sqft));
    }
}
