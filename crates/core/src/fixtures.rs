//! Deterministic demo catalog used by the CLI, the smoke suite, and tests.
//!
//! The numbers here are the published regression baseline: the scenario
//! assertions in `tests/pipeline_scenarios.rs` and the CLI smoke command both
//! price against this catalog, so changes to these rates are a contract
//! change, not a tweak.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::catalog::{
    CatalogRow, CatalogSnapshot, NumberValidation, PricingModel, ServiceCatalogEntry, ServiceRates,
    VariableEffect, VariableKind, VariableOption, VariableSpec,
};
use crate::config::CompanySettings;
use crate::units::Unit;

pub const MULCH_ROW: &str = "mulch_triple_ground";
pub const EDGING_ROW: &str = "metal_edging";
pub const IRRIGATION_SETUP_ROW: &str = "irrigation_setup";
pub const IRRIGATION_ZONE_ROW: &str = "irrigation_zone";
pub const PAVER_PATIO_ROW: &str = "paver_patio";

/// Validated snapshot over the demo catalog with default company settings.
pub fn demo_snapshot() -> CatalogSnapshot {
    CatalogSnapshot::new(1, CompanySettings::default(), demo_entries())
        .expect("demo catalog is valid by construction")
}

pub fn demo_entries() -> Vec<ServiceCatalogEntry> {
    vec![mulch(), metal_edging(), irrigation_setup(), irrigation_zone(), paver_patio()]
}

fn mulch() -> ServiceCatalogEntry {
    ServiceCatalogEntry {
        service_name: "Triple Ground Mulch (SQFT)".to_string(),
        catalog_row: CatalogRow(MULCH_ROW.to_string()),
        unit: Unit::Sqft,
        pricing_model: PricingModel::PerUnit,
        keywords: vec![
            "triple ground mulch".to_string(),
            "triple ground".to_string(),
            "mulch".to_string(),
            "mulching".to_string(),
        ],
        rates: ServiceRates {
            base_labor_hours_per_unit: 0.010,
            hourly_labor_rate: None,
            base_material_cost_per_unit: Decimal::new(50, 2),
            waste_factor: 0.10,
        },
        variable_categories: BTreeMap::new(),
    }
}

fn metal_edging() -> ServiceCatalogEntry {
    ServiceCatalogEntry {
        service_name: "Metal Edging".to_string(),
        catalog_row: CatalogRow(EDGING_ROW.to_string()),
        unit: Unit::LinearFeet,
        pricing_model: PricingModel::PerUnit,
        keywords: vec![
            "metal edging".to_string(),
            "steel edging".to_string(),
            "edging".to_string(),
        ],
        rates: ServiceRates {
            base_labor_hours_per_unit: 0.050,
            hourly_labor_rate: None,
            base_material_cost_per_unit: Decimal::new(2_00, 2),
            waste_factor: 0.10,
        },
        variable_categories: BTreeMap::new(),
    }
}

fn irrigation_setup() -> ServiceCatalogEntry {
    ServiceCatalogEntry {
        service_name: "Irrigation Setup Cost".to_string(),
        catalog_row: CatalogRow(IRRIGATION_SETUP_ROW.to_string()),
        unit: Unit::Each,
        pricing_model: PricingModel::FlatPerJob,
        keywords: vec![
            "irrigation setup".to_string(),
            "irrigation set up".to_string(),
            "irrigation set up cost".to_string(),
            "sprinkler setup".to_string(),
            "sprinkler system".to_string(),
        ],
        rates: ServiceRates {
            // Flat per-job: read as hours and dollars per job, not per unit.
            base_labor_hours_per_unit: 6.0,
            hourly_labor_rate: None,
            base_material_cost_per_unit: Decimal::new(200_00, 2),
            waste_factor: 0.10,
        },
        variable_categories: BTreeMap::new(),
    }
}

fn irrigation_zone() -> ServiceCatalogEntry {
    ServiceCatalogEntry {
        service_name: "Irrigation Zones".to_string(),
        catalog_row: CatalogRow(IRRIGATION_ZONE_ROW.to_string()),
        unit: Unit::Each,
        pricing_model: PricingModel::PerUnit,
        keywords: vec![
            "irrigation zones".to_string(),
            "irrigation zone".to_string(),
            "turf zones".to_string(),
            "turf zone".to_string(),
            "zones".to_string(),
            "zone".to_string(),
        ],
        rates: ServiceRates {
            base_labor_hours_per_unit: 2.0,
            hourly_labor_rate: None,
            base_material_cost_per_unit: Decimal::new(150_00, 2),
            waste_factor: 0.10,
        },
        variable_categories: BTreeMap::new(),
    }
}

fn paver_patio() -> ServiceCatalogEntry {
    let mut variable_categories = BTreeMap::new();

    variable_categories.insert(
        "site_access".to_string(),
        VariableSpec {
            label: "Site Access".to_string(),
            description: Some("How hard it is to get crew and material to the work area".to_string()),
            effect: VariableEffect::LaborMultiplier,
            per_unit: false,
            kind: VariableKind::Select {
                default: "easy".to_string(),
                options: select_options(&[
                    ("easy", "Easy access", 1.0),
                    ("moderate", "Moderate access", 1.15),
                    ("difficult", "Difficult access", 1.40),
                    ("tight", "Tight access", 1.60),
                ]),
            },
        },
    );

    variable_categories.insert(
        "excavation".to_string(),
        VariableSpec {
            label: "Tear-Out".to_string(),
            description: Some("What has to come out before the base goes in".to_string()),
            effect: VariableEffect::LaborHoursAdd,
            per_unit: true,
            kind: VariableKind::Select {
                default: "none".to_string(),
                options: select_options(&[
                    ("none", "Nothing to remove", 0.0),
                    ("sod", "Sod removal", 0.02),
                    ("concrete", "Concrete removal", 0.05),
                    ("asphalt", "Asphalt removal", 0.06),
                ]),
            },
        },
    );

    variable_categories.insert(
        "material_grade".to_string(),
        VariableSpec {
            label: "Paver Grade".to_string(),
            description: None,
            effect: VariableEffect::MaterialGrade,
            per_unit: false,
            kind: VariableKind::Select {
                default: "standard".to_string(),
                options: select_options(&[
                    ("economy", "Economy pavers", 4.0),
                    ("standard", "Standard pavers", 5.0),
                    ("premium", "Premium pavers", 7.5),
                ]),
            },
        },
    );

    variable_categories.insert(
        "crew_size".to_string(),
        VariableSpec {
            label: "Crew Size".to_string(),
            description: None,
            effect: VariableEffect::CrewSize,
            per_unit: false,
            kind: VariableKind::Number {
                default: 2.0,
                validation: Some(NumberValidation { min: 1.0, max: 5.0, step: Some(1.0) }),
            },
        },
    );

    variable_categories.insert(
        "obstacle_removal".to_string(),
        VariableSpec {
            label: "Obstacle Removal".to_string(),
            description: Some("Stumps, boulders, and similar one-off removals".to_string()),
            effect: VariableEffect::ObstacleCost,
            per_unit: false,
            kind: VariableKind::Toggle { default: false, on_value: 150.0 },
        },
    );

    ServiceCatalogEntry {
        service_name: "Paver Patio".to_string(),
        catalog_row: CatalogRow(PAVER_PATIO_ROW.to_string()),
        unit: Unit::Sqft,
        pricing_model: PricingModel::PerUnit,
        keywords: vec![
            "paver patio".to_string(),
            "paver patios".to_string(),
            "pavers".to_string(),
            "patio".to_string(),
        ],
        rates: ServiceRates {
            base_labor_hours_per_unit: 0.10,
            hourly_labor_rate: None,
            base_material_cost_per_unit: Decimal::new(5_00, 2),
            waste_factor: 0.10,
        },
        variable_categories,
    }
}

fn select_options(options: &[(&str, &str, f64)]) -> BTreeMap<String, VariableOption> {
    options
        .iter()
        .map(|(key, label, value)| {
            (key.to_string(), VariableOption { label: label.to_string(), value: *value })
        })
        .collect()
}
