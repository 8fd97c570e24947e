//! Cue table for paver patio jobs.
//!
//! Categories match the demo catalog's paver patio entry: site access,
//! excavation (tear-out), material grade, crew size, obstacle removal.

use super::{CueOutcome, CueRule, CueVariableMapper, NumberAnchor};

/// Mapper configured with the paver-patio cue vocabulary. Also serves as the
/// pipeline's default mapper: cues for categories an entry does not declare
/// simply never fire.
pub fn paver_patio_mapper() -> CueVariableMapper {
    let select = |category: &str, phrase: &str, key: &str| CueRule {
        category: category.to_string(),
        phrase: phrase.to_string(),
        outcome: CueOutcome::Select(key.to_string()),
    };
    let toggle = |category: &str, phrase: &str, state: bool| CueRule {
        category: category.to_string(),
        phrase: phrase.to_string(),
        outcome: CueOutcome::Toggle(state),
    };

    let rules = vec![
        // Site access
        select("site_access", "tight access", "tight"),
        select("site_access", "very tight", "tight"),
        select("site_access", "difficult access", "difficult"),
        select("site_access", "hard to access", "difficult"),
        select("site_access", "hard to reach", "difficult"),
        select("site_access", "steep slope", "difficult"),
        select("site_access", "through the gate", "moderate"),
        select("site_access", "backyard", "moderate"),
        select("site_access", "easy access", "easy"),
        // Tear-out
        select("excavation", "removing concrete", "concrete"),
        select("excavation", "remove concrete", "concrete"),
        select("excavation", "concrete removal", "concrete"),
        select("excavation", "existing concrete", "concrete"),
        select("excavation", "old concrete", "concrete"),
        select("excavation", "removing asphalt", "asphalt"),
        select("excavation", "remove asphalt", "asphalt"),
        select("excavation", "old asphalt", "asphalt"),
        select("excavation", "remove sod", "sod"),
        select("excavation", "removing sod", "sod"),
        select("excavation", "existing lawn", "sod"),
        select("excavation", "existing grass", "sod"),
        select("excavation", "no tear out", "none"),
        // Material grade
        select("material_grade", "premium pavers", "premium"),
        select("material_grade", "high end", "premium"),
        select("material_grade", "premium", "premium"),
        select("material_grade", "economy pavers", "economy"),
        select("material_grade", "budget", "economy"),
        select("material_grade", "cheapest", "economy"),
        select("material_grade", "standard pavers", "standard"),
        // Obstacle removal
        toggle("obstacle_removal", "stump", true),
        toggle("obstacle_removal", "boulder", true),
        toggle("obstacle_removal", "large rock", true),
        toggle("obstacle_removal", "obstacle", true),
    ];

    let number_anchors = vec![NumberAnchor {
        category: "crew_size".to_string(),
        anchors: vec!["person".to_string(), "man".to_string(), "crew".to_string()],
        max_distance: 2,
    }];

    CueVariableMapper::new(rules, number_anchors)
}

#[cfg(test)]
mod tests {
    use crate::fixtures;
    use crate::variables::{VariableMapper, VariableValue};

    use super::paver_patio_mapper;

    fn entry() -> crate::catalog::ServiceCatalogEntry {
        fixtures::demo_entries()
            .into_iter()
            .find(|entry| entry.catalog_row.0 == fixtures::PAVER_PATIO_ROW)
            .expect("paver patio entry")
    }

    #[test]
    fn reads_access_tearout_and_grade_from_text() {
        let mapper = paver_patio_mapper();
        let extraction = mapper.extract_variables(
            "300 sq ft paver patio with premium pavers, tight access, removing concrete",
            300.0,
            &entry(),
        );

        assert_eq!(
            extraction.values.get("site_access"),
            Some(&VariableValue::Selection("tight".to_string()))
        );
        assert_eq!(
            extraction.values.get("excavation"),
            Some(&VariableValue::Selection("concrete".to_string()))
        );
        assert_eq!(
            extraction.values.get("material_grade"),
            Some(&VariableValue::Selection("premium".to_string()))
        );
        assert_eq!(extraction.extracted_variables.len(), 3);
        assert_eq!(extraction.confidence, 3.0 / 5.0);
    }

    #[test]
    fn crew_size_reads_n_person_crew() {
        let mapper = paver_patio_mapper();
        let extraction =
            mapper.extract_variables("paver patio, 3 person crew", 100.0, &entry());

        assert_eq!(extraction.values.get("crew_size"), Some(&VariableValue::Number(3.0)));
        assert!(extraction.values.inferred.contains("crew_size"));
    }

    #[test]
    fn crew_size_clamps_to_validation_range() {
        let mapper = paver_patio_mapper();
        let extraction =
            mapper.extract_variables("paver patio with a 12 man crew", 100.0, &entry());

        // Validation caps crew size at 5.
        assert_eq!(extraction.values.get("crew_size"), Some(&VariableValue::Number(5.0)));
    }

    #[test]
    fn stump_cue_toggles_obstacle_removal() {
        let mapper = paver_patio_mapper();
        let extraction =
            mapper.extract_variables("patio where the old stump is", 80.0, &entry());

        assert_eq!(extraction.values.get("obstacle_removal"), Some(&VariableValue::Toggle(true)));
    }

    #[test]
    fn longer_cue_phrases_win_within_a_category() {
        let mapper = paver_patio_mapper();
        // "premium pavers" and "premium" both present; the longer phrase and
        // the shorter resolve to the same key, so either way: premium.
        let extraction =
            mapper.extract_variables("premium pavers please", 50.0, &entry());
        assert_eq!(
            extraction.values.get("material_grade"),
            Some(&VariableValue::Selection("premium".to_string()))
        );
    }
}
