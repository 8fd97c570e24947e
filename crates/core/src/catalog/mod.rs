//! Service catalog model.
//!
//! A catalog entry is one priceable service: its keywords for text matching,
//! its canonical unit, its base labor/material rates, and the variable
//! categories that feed the two-tier pricing formula. Entries are built from
//! configuration (see [`crate::config`]) and are read-only to the pipeline.

pub mod store;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::units::Unit;

pub use store::{CatalogSnapshot, CatalogStore};

/// Stable identifier for one priceable service, independent of display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogRow(pub String);

impl std::fmt::Display for CatalogRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How quantity participates in the formula. Most services scale per unit;
/// some (irrigation setup) are a flat per-job charge where quantity is
/// structurally 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    PerUnit,
    FlatPerJob,
}

/// Base rates consumed by the two-tier formula. For `FlatPerJob` entries the
/// per-unit fields are read as per-job amounts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceRates {
    pub base_labor_hours_per_unit: f64,
    /// Overrides the company-wide hourly rate when set.
    pub hourly_labor_rate: Option<Decimal>,
    pub base_material_cost_per_unit: Decimal,
    /// Fraction of base material cost added as waste, e.g. 0.10.
    pub waste_factor: f64,
}

/// Numeric validation range for `Number` variables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumberValidation {
    pub min: f64,
    pub max: f64,
    pub step: Option<f64>,
}

impl NumberValidation {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// One enumerated choice for a `Select` variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableOption {
    pub label: String,
    pub value: f64,
}

/// The shape of a variable's value space, tagged by kind. Each kind carries
/// its own default so every category can always be resolved without text
/// evidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariableKind {
    Number { default: f64, validation: Option<NumberValidation> },
    Select { default: String, options: BTreeMap<String, VariableOption> },
    Toggle { default: bool, on_value: f64 },
}

/// How pricing applies a resolved variable. Keeping the application rule on
/// the variable definition (rather than branching per service) lets new
/// services ship as pure configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableEffect {
    /// Multiplies adjusted labor hours.
    LaborMultiplier,
    /// Adds labor hours (scaled by quantity when `per_unit`).
    LaborHoursAdd,
    /// Divides elapsed days; total man-hours stay constant.
    CrewSize,
    /// Replaces the per-unit material cost.
    MaterialGrade,
    /// Flat equipment add-on (scaled by quantity when `per_unit`).
    EquipmentCost,
    /// Flat obstacle-removal add-on (scaled by quantity when `per_unit`).
    ObstacleCost,
    /// Recorded and reported but does not change the formula.
    Informational,
}

/// A configurable pricing input attached to a catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub label: String,
    pub description: Option<String>,
    pub effect: VariableEffect,
    /// When true, cost/hour add-ons scale with the extracted quantity.
    pub per_unit: bool,
    pub kind: VariableKind,
}

impl VariableSpec {
    /// Whether `key` is a valid selection for this spec.
    pub fn has_option(&self, key: &str) -> bool {
        match &self.kind {
            VariableKind::Select { options, .. } => options.contains_key(key),
            _ => false,
        }
    }
}

/// One priceable service definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    pub service_name: String,
    pub catalog_row: CatalogRow,
    pub unit: Unit,
    pub pricing_model: PricingModel,
    /// Lowercase keyword phrases, including morphological variants.
    pub keywords: Vec<String>,
    pub rates: ServiceRates,
    pub variable_categories: BTreeMap<String, VariableSpec>,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CatalogValidationError {
    #[error("service `{0}` has no keywords")]
    EmptyKeywords(CatalogRow),
    #[error("service `{row}`: variable `{category}` default `{default}` is not a valid option")]
    InvalidSelectDefault { row: CatalogRow, category: String, default: String },
    #[error("service `{row}`: variable `{category}` has an empty validation range")]
    EmptyValidationRange { row: CatalogRow, category: String },
    #[error("service `{row}`: negative rate `{field}`")]
    NegativeRate { row: CatalogRow, field: &'static str },
    #[error("duplicate catalog row `{0}`")]
    DuplicateRow(CatalogRow),
}

impl ServiceCatalogEntry {
    /// Validate the invariants a well-formed entry must hold. Called once at
    /// snapshot publish time so the pipeline can trust every entry it reads.
    pub fn validate(&self) -> Result<(), CatalogValidationError> {
        if self.keywords.iter().all(|keyword| keyword.trim().is_empty()) {
            return Err(CatalogValidationError::EmptyKeywords(self.catalog_row.clone()));
        }
        if self.rates.base_labor_hours_per_unit < 0.0 {
            return Err(CatalogValidationError::NegativeRate {
                row: self.catalog_row.clone(),
                field: "base_labor_hours_per_unit",
            });
        }
        if self.rates.base_material_cost_per_unit < Decimal::ZERO {
            return Err(CatalogValidationError::NegativeRate {
                row: self.catalog_row.clone(),
                field: "base_material_cost_per_unit",
            });
        }
        if self.rates.waste_factor < 0.0 {
            return Err(CatalogValidationError::NegativeRate {
                row: self.catalog_row.clone(),
                field: "waste_factor",
            });
        }

        for (category, spec) in &self.variable_categories {
            match &spec.kind {
                VariableKind::Select { default, options } => {
                    if !options.contains_key(default) {
                        return Err(CatalogValidationError::InvalidSelectDefault {
                            row: self.catalog_row.clone(),
                            category: category.clone(),
                            default: default.clone(),
                        });
                    }
                }
                VariableKind::Number { default, validation } => {
                    if let Some(validation) = validation {
                        if validation.min > validation.max {
                            return Err(CatalogValidationError::EmptyValidationRange {
                                row: self.catalog_row.clone(),
                                category: category.clone(),
                            });
                        }
                        if *default < validation.min || *default > validation.max {
                            return Err(CatalogValidationError::EmptyValidationRange {
                                row: self.catalog_row.clone(),
                                category: category.clone(),
                            });
                        }
                    }
                }
                VariableKind::Toggle { .. } => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use crate::units::Unit;

    use super::{
        CatalogRow, CatalogValidationError, PricingModel, ServiceCatalogEntry, ServiceRates,
        VariableKind, VariableOption, VariableSpec,
    };

    fn entry() -> ServiceCatalogEntry {
        ServiceCatalogEntry {
            service_name: "Test Service".to_string(),
            catalog_row: CatalogRow("test_service".to_string()),
            unit: Unit::Sqft,
            pricing_model: PricingModel::PerUnit,
            keywords: vec!["test".to_string()],
            rates: ServiceRates {
                base_labor_hours_per_unit: 0.05,
                hourly_labor_rate: None,
                base_material_cost_per_unit: Decimal::new(150, 2),
                waste_factor: 0.10,
            },
            variable_categories: BTreeMap::new(),
        }
    }

    #[test]
    fn well_formed_entry_validates() {
        assert!(entry().validate().is_ok());
    }

    #[test]
    fn rejects_entry_without_keywords() {
        let mut invalid = entry();
        invalid.keywords = vec![" ".to_string()];
        assert!(matches!(invalid.validate(), Err(CatalogValidationError::EmptyKeywords(_))));
    }

    #[test]
    fn rejects_select_default_outside_options() {
        let mut invalid = entry();
        let mut options = BTreeMap::new();
        options.insert(
            "easy".to_string(),
            VariableOption { label: "Easy".to_string(), value: 1.0 },
        );
        invalid.variable_categories.insert(
            "site_access".to_string(),
            VariableSpec {
                label: "Site Access".to_string(),
                description: None,
                effect: super::VariableEffect::LaborMultiplier,
                per_unit: false,
                kind: VariableKind::Select { default: "difficult".to_string(), options },
            },
        );
        assert!(matches!(
            invalid.validate(),
            Err(CatalogValidationError::InvalidSelectDefault { .. })
        ));
    }

    #[test]
    fn rejects_number_default_outside_validation_range() {
        let mut invalid = entry();
        invalid.variable_categories.insert(
            "crew_size".to_string(),
            VariableSpec {
                label: "Crew Size".to_string(),
                description: None,
                effect: super::VariableEffect::CrewSize,
                per_unit: false,
                kind: VariableKind::Number {
                    default: 9.0,
                    validation: Some(super::NumberValidation { min: 1.0, max: 5.0, step: None }),
                },
            },
        );
        assert!(matches!(
            invalid.validate(),
            Err(CatalogValidationError::EmptyValidationRange { .. })
        ));
    }
}
