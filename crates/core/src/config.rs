//! Company settings and the TOML catalog configuration boundary.
//!
//! The pipeline consumes an already-resolved, per-company catalog. This
//! module defines the raw file schema, validates it, and compiles it into
//! [`ServiceCatalogEntry`] values. Unknown categories and unknown keys are
//! retained or ignored, never fatal: the schema is forward-compatible so an
//! admin panel can add fields before this code learns about them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{
    CatalogRow, CatalogValidationError, NumberValidation, PricingModel, ServiceCatalogEntry,
    ServiceRates, VariableEffect, VariableKind, VariableOption, VariableSpec,
};
use crate::units::Unit;

/// Per-company pricing settings. Validated on load; the profit margin is
/// additionally clamped at calculation time so a bad saved value can never
/// produce an out-of-policy quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanySettings {
    /// Fallback hourly labor rate when an entry does not set its own.
    pub hourly_labor_rate: Decimal,
    pub workday_hours: f64,
    pub profit_margin: f64,
    pub profit_margin_min: f64,
    pub profit_margin_max: f64,
    /// Aggregate confidence required before pricing proceeds.
    pub ready_confidence_threshold: f64,
    /// Minimum per-service extraction confidence.
    pub service_confidence_threshold: f64,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            hourly_labor_rate: Decimal::new(50_00, 2),
            workday_hours: 8.0,
            profit_margin: 0.10,
            profit_margin_min: 0.05,
            profit_margin_max: 0.50,
            ready_confidence_threshold: 0.8,
            service_confidence_threshold: 0.5,
        }
    }
}

impl CompanySettings {
    pub fn validate(&self) -> Result<(), CatalogConfigError> {
        if self.hourly_labor_rate <= Decimal::ZERO {
            return Err(CatalogConfigError::Validation(
                "hourly_labor_rate must be positive".to_string(),
            ));
        }
        if !(self.workday_hours > 0.0) {
            return Err(CatalogConfigError::Validation(
                "workday_hours must be positive".to_string(),
            ));
        }
        if self.profit_margin_min > self.profit_margin_max {
            return Err(CatalogConfigError::Validation(
                "profit margin bounds are inverted".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.ready_confidence_threshold)
            || !(0.0..=1.0).contains(&self.service_confidence_threshold)
        {
            return Err(CatalogConfigError::Validation(
                "confidence thresholds must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Profit margin clamped to the configured policy bounds.
    pub fn effective_profit_margin(&self) -> f64 {
        self.profit_margin.clamp(self.profit_margin_min, self.profit_margin_max)
    }
}

#[derive(Debug, Error)]
pub enum CatalogConfigError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("could not parse catalog document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("service `{row}`: unknown unit `{unit}`")]
    UnknownUnit { row: String, unit: String },
    #[error("service `{row}`: unknown pricing model `{model}`")]
    UnknownPricingModel { row: String, model: String },
    #[error("service `{row}`: unknown variable effect `{effect}` for `{category}`")]
    UnknownEffect { row: String, category: String, effect: String },
    #[error("service `{row}`: rate `{field}` is not a finite number")]
    InvalidRate { row: String, field: &'static str },
    #[error(transparent)]
    Catalog(#[from] CatalogValidationError),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

/// Raw file schema. Leaf values use plain floats; money is converted to
/// `Decimal` during compilation so arithmetic downstream stays exact.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub company: CompanySettingsFile,
    #[serde(default, rename = "service")]
    pub services: Vec<ServiceFile>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompanySettingsFile {
    pub hourly_labor_rate: Option<f64>,
    pub workday_hours: Option<f64>,
    pub profit_margin: Option<f64>,
    pub profit_margin_min: Option<f64>,
    pub profit_margin_max: Option<f64>,
    pub ready_confidence_threshold: Option<f64>,
    pub service_confidence_threshold: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceFile {
    pub name: String,
    pub row: String,
    pub unit: String,
    #[serde(default = "default_pricing_model")]
    pub pricing_model: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub rates: RatesFile,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableFile>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

fn default_pricing_model() -> String {
    "per_unit".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RatesFile {
    pub base_labor_hours_per_unit: f64,
    pub hourly_labor_rate: Option<f64>,
    pub base_material_cost_per_unit: f64,
    #[serde(default)]
    pub waste_factor: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
pub struct VariableFile {
    pub label: String,
    pub description: Option<String>,
    pub effect: String,
    #[serde(default)]
    pub per_unit: bool,
    pub kind: VariableKindFile,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariableKindFile {
    Number { default: f64, validation: Option<NumberValidation> },
    Select { default: String, options: BTreeMap<String, VariableOption> },
    Toggle { default: bool, #[serde(default)] on_value: f64 },
}

impl CatalogFile {
    pub fn load(path: &Path) -> Result<Self, CatalogConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| CatalogConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    pub fn parse(document: &str) -> Result<Self, CatalogConfigError> {
        Ok(toml::from_str(document)?)
    }

    /// Compile the raw schema into validated settings plus catalog entries.
    pub fn into_parts(
        self,
    ) -> Result<(CompanySettings, Vec<ServiceCatalogEntry>), CatalogConfigError> {
        let settings = self.company.into_settings()?;
        settings.validate()?;

        let mut entries = Vec::with_capacity(self.services.len());
        for service in self.services {
            entries.push(service.into_entry()?);
        }
        for entry in &entries {
            entry.validate()?;
        }
        Ok((settings, entries))
    }
}

impl CompanySettingsFile {
    fn into_settings(self) -> Result<CompanySettings, CatalogConfigError> {
        let defaults = CompanySettings::default();
        let hourly_labor_rate = match self.hourly_labor_rate {
            Some(value) => money("company", "hourly_labor_rate", value)?,
            None => defaults.hourly_labor_rate,
        };
        Ok(CompanySettings {
            hourly_labor_rate,
            workday_hours: self.workday_hours.unwrap_or(defaults.workday_hours),
            profit_margin: self.profit_margin.unwrap_or(defaults.profit_margin),
            profit_margin_min: self.profit_margin_min.unwrap_or(defaults.profit_margin_min),
            profit_margin_max: self.profit_margin_max.unwrap_or(defaults.profit_margin_max),
            ready_confidence_threshold: self
                .ready_confidence_threshold
                .unwrap_or(defaults.ready_confidence_threshold),
            service_confidence_threshold: self
                .service_confidence_threshold
                .unwrap_or(defaults.service_confidence_threshold),
        })
    }
}

impl ServiceFile {
    fn into_entry(self) -> Result<ServiceCatalogEntry, CatalogConfigError> {
        let unit = parse_unit(&self.unit).ok_or_else(|| CatalogConfigError::UnknownUnit {
            row: self.row.clone(),
            unit: self.unit.clone(),
        })?;
        let pricing_model = match self.pricing_model.as_str() {
            "per_unit" => PricingModel::PerUnit,
            "flat_per_job" => PricingModel::FlatPerJob,
            other => {
                return Err(CatalogConfigError::UnknownPricingModel {
                    row: self.row.clone(),
                    model: other.to_string(),
                })
            }
        };

        let mut variable_categories = BTreeMap::new();
        for (category, variable) in self.variables {
            let effect = parse_effect(&variable.effect).ok_or_else(|| {
                CatalogConfigError::UnknownEffect {
                    row: self.row.clone(),
                    category: category.clone(),
                    effect: variable.effect.clone(),
                }
            })?;
            let kind = match variable.kind {
                VariableKindFile::Number { default, validation } => {
                    VariableKind::Number { default, validation }
                }
                VariableKindFile::Select { default, options } => {
                    VariableKind::Select { default, options }
                }
                VariableKindFile::Toggle { default, on_value } => {
                    VariableKind::Toggle { default, on_value }
                }
            };
            variable_categories.insert(
                category,
                VariableSpec {
                    label: variable.label,
                    description: variable.description,
                    effect,
                    per_unit: variable.per_unit,
                    kind,
                },
            );
        }

        let keywords = self
            .keywords
            .into_iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();

        Ok(ServiceCatalogEntry {
            service_name: self.name,
            catalog_row: CatalogRow(self.row.clone()),
            unit,
            pricing_model,
            keywords,
            rates: ServiceRates {
                base_labor_hours_per_unit: self.rates.base_labor_hours_per_unit,
                hourly_labor_rate: self
                    .rates
                    .hourly_labor_rate
                    .map(|value| money(&self.row, "hourly_labor_rate", value))
                    .transpose()?,
                base_material_cost_per_unit: money(
                    &self.row,
                    "base_material_cost_per_unit",
                    self.rates.base_material_cost_per_unit,
                )?,
                waste_factor: self.rates.waste_factor,
            },
            variable_categories,
        })
    }
}

fn parse_unit(raw: &str) -> Option<Unit> {
    match raw {
        "sqft" => Some(Unit::Sqft),
        "linear_feet" => Some(Unit::LinearFeet),
        "cubic_yards" => Some(Unit::CubicYards),
        "each" => Some(Unit::Each),
        _ => None,
    }
}

fn parse_effect(raw: &str) -> Option<VariableEffect> {
    match raw {
        "labor_multiplier" => Some(VariableEffect::LaborMultiplier),
        "labor_hours_add" => Some(VariableEffect::LaborHoursAdd),
        "crew_size" => Some(VariableEffect::CrewSize),
        "material_grade" => Some(VariableEffect::MaterialGrade),
        "equipment_cost" => Some(VariableEffect::EquipmentCost),
        "obstacle_cost" => Some(VariableEffect::ObstacleCost),
        "informational" => Some(VariableEffect::Informational),
        _ => None,
    }
}

fn money(row: &str, field: &'static str, value: f64) -> Result<Decimal, CatalogConfigError> {
    if !value.is_finite() {
        return Err(CatalogConfigError::InvalidRate { row: row.to_string(), field });
    }
    Decimal::from_f64_retain(value)
        .map(|amount| amount.round_dp(2))
        .ok_or(CatalogConfigError::InvalidRate { row: row.to_string(), field })
}
