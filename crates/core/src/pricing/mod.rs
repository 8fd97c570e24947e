//! Two-tier pricing: Tier 1 turns quantity plus resolved variables into
//! labor hours; Tier 2 turns hours plus materials, equipment, and obstacles
//! into a priced total with the company profit margin applied.
//!
//! All formula behavior is driven by the catalog's variable specs — adding a
//! service or a new complexity variable is configuration, not a new branch
//! here. Money is `Decimal` end to end; hours stay `f64`.

pub mod irrigation;

use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::{
    CatalogRow, CatalogSnapshot, PricingModel, ServiceCatalogEntry, VariableEffect, VariableKind,
    VariableSpec,
};
use crate::collection::ExtractedServiceRequest;
use crate::config::CompanySettings;
use crate::errors::PricingError;
use crate::units::{format_quantity, Unit};
use crate::variables::{ResolvedVariables, VariableValue};

/// One service ready to price: what was extracted plus its resolved
/// complexity variables.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricedServiceInput {
    pub request: ExtractedServiceRequest,
    pub variables: ResolvedVariables,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tier1Result {
    pub base_hours: f64,
    pub adjusted_hours: f64,
    pub total_man_hours: f64,
    pub crew_size: f64,
    pub total_days: u32,
    /// Human-readable trail of each applied step, for explanation text.
    pub breakdown: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tier2Result {
    pub labor_cost: Decimal,
    pub material_cost_base: Decimal,
    pub material_waste_cost: Decimal,
    pub total_material_cost: Decimal,
    pub equipment_cost: Decimal,
    pub obstacle_cost: Decimal,
    pub subtotal: Decimal,
    pub profit: Decimal,
    pub total: Decimal,
    pub price_per_unit: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServicePricing {
    pub service_name: String,
    pub catalog_row: CatalogRow,
    pub quantity: f64,
    pub unit: Unit,
    pub tier1: Tier1Result,
    pub tier2: Tier2Result,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricingTotals {
    pub total_cost: Decimal,
    pub total_labor_hours: f64,
    pub total_days: u32,
}

/// Aggregate pricing across all requested services. Produced only on full
/// success; any per-service failure fails the whole request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricingResult {
    pub services: Vec<ServicePricing>,
    pub totals: PricingTotals,
    pub calculation_time_ms: u64,
}

pub trait PricingEngine: Send + Sync {
    fn calculate_pricing(
        &self,
        inputs: &[PricedServiceInput],
        snapshot: &CatalogSnapshot,
    ) -> Result<PricingResult, PricingError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TwoTierPricingEngine;

impl PricingEngine for TwoTierPricingEngine {
    fn calculate_pricing(
        &self,
        inputs: &[PricedServiceInput],
        snapshot: &CatalogSnapshot,
    ) -> Result<PricingResult, PricingError> {
        let started = Instant::now();
        let settings = &snapshot.settings;

        let mut services = Vec::with_capacity(inputs.len());
        let mut total_cost = Decimal::ZERO;
        let mut total_labor_hours = 0.0;
        let mut total_days = 0u32;

        for input in inputs {
            let entry = snapshot
                .find(&input.request.catalog_row)
                .ok_or_else(|| PricingError::UnknownService(input.request.catalog_row.0.clone()))?;

            let quantity = input.request.quantity;
            if !quantity.is_finite() || quantity <= 0.0 {
                return Err(PricingError::InvalidQuantity {
                    service: entry.service_name.clone(),
                    quantity,
                });
            }

            let tier1 = tier1(entry, quantity, &input.variables, settings)?;
            let tier2 = tier2(entry, quantity, &input.variables, &tier1, settings)?;

            total_cost += tier2.total;
            total_labor_hours += tier1.total_man_hours;
            total_days += tier1.total_days;

            services.push(ServicePricing {
                service_name: entry.service_name.clone(),
                catalog_row: entry.catalog_row.clone(),
                quantity,
                unit: entry.unit,
                tier1,
                tier2,
            });
        }

        // A quote claiming zero labor is a calculation failure, not a free
        // job.
        if !(total_labor_hours > 0.0) {
            return Err(PricingError::ZeroLaborHours);
        }

        Ok(PricingResult {
            services,
            totals: PricingTotals { total_cost, total_labor_hours, total_days },
            calculation_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Tier 1: labor hours. Base hours from the catalog rate, then each resolved
/// variable applies per its configured effect, with a breakdown line per
/// step.
fn tier1(
    entry: &ServiceCatalogEntry,
    quantity: f64,
    variables: &ResolvedVariables,
    settings: &CompanySettings,
) -> Result<Tier1Result, PricingError> {
    let rate = entry.rates.base_labor_hours_per_unit;
    let base_hours = match entry.pricing_model {
        PricingModel::PerUnit => quantity * rate,
        PricingModel::FlatPerJob => rate,
    };

    let mut breakdown = Vec::new();
    breakdown.push(match entry.pricing_model {
        PricingModel::PerUnit => format!(
            "base labor: {} {} x {rate} hr = {base_hours:.2} hr",
            format_quantity(quantity),
            entry.unit.label(),
        ),
        PricingModel::FlatPerJob => format!("base labor: {base_hours:.2} hr flat per job"),
    });

    let mut adjusted_hours = base_hours;
    let mut crew_size = 1.0;

    for (category, spec) in &entry.variable_categories {
        let Some(applied) = resolve_numeric(entry, category, spec, variables)? else {
            continue;
        };
        match spec.effect {
            VariableEffect::LaborMultiplier => {
                adjusted_hours *= applied.value;
                breakdown.push(format!(
                    "{} ({}): hours x{}",
                    spec.label, applied.source, applied.value
                ));
            }
            VariableEffect::LaborHoursAdd => {
                let added =
                    if spec.per_unit { applied.value * quantity } else { applied.value };
                if added != 0.0 {
                    adjusted_hours += added;
                    breakdown.push(format!(
                        "{} ({}): +{added:.2} hr",
                        spec.label, applied.source
                    ));
                }
            }
            VariableEffect::CrewSize => {
                crew_size = applied.value.max(1.0);
                breakdown.push(format!(
                    "{}: {} (elapsed days divided, man-hours unchanged)",
                    spec.label,
                    format_quantity(crew_size)
                ));
            }
            // Cost-side effects are applied in tier 2.
            VariableEffect::MaterialGrade
            | VariableEffect::EquipmentCost
            | VariableEffect::ObstacleCost
            | VariableEffect::Informational => {}
        }
    }

    if !adjusted_hours.is_finite() || adjusted_hours < 0.0 {
        return Err(PricingError::NonFiniteValue { service: entry.service_name.clone() });
    }

    let total_man_hours = adjusted_hours;
    let elapsed_capacity = settings.workday_hours * crew_size;
    let total_days = if total_man_hours > 0.0 && elapsed_capacity > 0.0 {
        (total_man_hours / elapsed_capacity).ceil() as u32
    } else {
        0
    };
    breakdown.push(format!(
        "total: {total_man_hours:.2} man-hours over {total_days} day(s)"
    ));

    Ok(Tier1Result { base_hours, adjusted_hours, total_man_hours, crew_size, total_days, breakdown })
}

/// Tier 2: costs. Labor from man-hours, material base plus waste, flat (or
/// per-unit) equipment/obstacle add-ons, then profit on the subtotal.
fn tier2(
    entry: &ServiceCatalogEntry,
    quantity: f64,
    variables: &ResolvedVariables,
    tier1: &Tier1Result,
    settings: &CompanySettings,
) -> Result<Tier2Result, PricingError> {
    let service = entry.service_name.as_str();
    let quantity_dec = dec(quantity, service)?;

    let hourly_rate = entry.rates.hourly_labor_rate.unwrap_or(settings.hourly_labor_rate);
    let labor_cost = (dec(tier1.total_man_hours, service)? * hourly_rate).round_dp(2);

    // Material grade variables override the catalog's per-unit cost.
    let mut material_per_unit = entry.rates.base_material_cost_per_unit;
    let mut equipment_cost = Decimal::ZERO;
    let mut obstacle_cost = Decimal::ZERO;

    for (category, spec) in &entry.variable_categories {
        let Some(applied) = resolve_numeric(entry, category, spec, variables)? else {
            continue;
        };
        let amount = dec(applied.value, service)?;
        match spec.effect {
            VariableEffect::MaterialGrade => material_per_unit = amount.round_dp(2),
            VariableEffect::EquipmentCost => {
                equipment_cost += scaled(amount, spec, quantity_dec).round_dp(2);
            }
            VariableEffect::ObstacleCost => {
                obstacle_cost += scaled(amount, spec, quantity_dec).round_dp(2);
            }
            VariableEffect::LaborMultiplier
            | VariableEffect::LaborHoursAdd
            | VariableEffect::CrewSize
            | VariableEffect::Informational => {}
        }
    }

    let material_cost_base = match entry.pricing_model {
        PricingModel::PerUnit => (quantity_dec * material_per_unit).round_dp(2),
        PricingModel::FlatPerJob => material_per_unit,
    };
    let material_waste_cost =
        (material_cost_base * dec(entry.rates.waste_factor, service)?).round_dp(2);
    let total_material_cost = material_cost_base + material_waste_cost;

    let subtotal = labor_cost + total_material_cost + equipment_cost + obstacle_cost;
    let profit = (subtotal * dec(settings.effective_profit_margin(), service)?).round_dp(2);
    let total = subtotal + profit;
    let price_per_unit = (total / quantity_dec).round_dp(2);

    for amount in
        [labor_cost, material_cost_base, equipment_cost, obstacle_cost, profit, total]
    {
        if amount < Decimal::ZERO {
            return Err(PricingError::NegativeCost { service: service.to_string() });
        }
    }

    Ok(Tier2Result {
        labor_cost,
        material_cost_base,
        material_waste_cost,
        total_material_cost,
        equipment_cost,
        obstacle_cost,
        subtotal,
        profit,
        total,
        price_per_unit,
    })
}

struct AppliedVariable {
    value: f64,
    /// Option key, toggle label, or the literal number — for breakdown text.
    source: String,
}

/// Resolve a category's numeric contribution, falling back to the catalog
/// default when the extraction stage did not supply a value. `None` means
/// "no effect" (e.g. a toggle that is off).
fn resolve_numeric(
    entry: &ServiceCatalogEntry,
    category: &str,
    spec: &VariableSpec,
    variables: &ResolvedVariables,
) -> Result<Option<AppliedVariable>, PricingError> {
    let fallback;
    let value = match variables.get(category) {
        Some(value) => value,
        None => {
            fallback = match &spec.kind {
                VariableKind::Number { default, .. } => VariableValue::Number(*default),
                VariableKind::Select { default, .. } => VariableValue::Selection(default.clone()),
                VariableKind::Toggle { default, .. } => VariableValue::Toggle(*default),
            };
            &fallback
        }
    };

    match (value, &spec.kind) {
        (VariableValue::Number(number), _) => {
            Ok(Some(AppliedVariable { value: *number, source: format_quantity(*number) }))
        }
        (VariableValue::Selection(key), VariableKind::Select { options, .. }) => {
            let option = options.get(key).ok_or_else(|| PricingError::MissingVariableDefault {
                service: entry.service_name.clone(),
                category: category.to_string(),
            })?;
            Ok(Some(AppliedVariable { value: option.value, source: key.clone() }))
        }
        (VariableValue::Toggle(state), VariableKind::Toggle { on_value, .. }) => {
            Ok(state.then(|| AppliedVariable { value: *on_value, source: "yes".to_string() }))
        }
        // A value whose shape disagrees with the variable's kind is a
        // configuration inconsistency, same failure class as a missing
        // default.
        _ => Err(PricingError::MissingVariableDefault {
            service: entry.service_name.clone(),
            category: category.to_string(),
        }),
    }
}

fn scaled(amount: Decimal, spec: &VariableSpec, quantity: Decimal) -> Decimal {
    if spec.per_unit {
        amount * quantity
    } else {
        amount
    }
}

fn dec(value: f64, service: &str) -> Result<Decimal, PricingError> {
    if !value.is_finite() {
        return Err(PricingError::NonFiniteValue { service: service.to_string() });
    }
    Decimal::from_f64_retain(value)
        .ok_or_else(|| PricingError::NonFiniteValue { service: service.to_string() })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::catalog::CatalogRow;
    use crate::collection::ExtractedServiceRequest;
    use crate::errors::PricingError;
    use crate::fixtures;
    use crate::units::Unit;
    use crate::variables::{ResolvedVariables, VariableValue};

    use super::{PricedServiceInput, PricingEngine, TwoTierPricingEngine};

    fn input(row: &str, name: &str, quantity: f64, unit: Unit) -> PricedServiceInput {
        PricedServiceInput {
            request: ExtractedServiceRequest {
                service_name: name.to_string(),
                catalog_row: CatalogRow(row.to_string()),
                quantity,
                unit,
                source_span: String::new(),
                extraction_confidence: 1.0,
            },
            variables: ResolvedVariables::default(),
        }
    }

    #[test]
    fn mulch_hundred_sqft_prices_within_contract_band() {
        let snapshot = fixtures::demo_snapshot();
        let result = TwoTierPricingEngine
            .calculate_pricing(
                &[input(fixtures::MULCH_ROW, "Triple Ground Mulch (SQFT)", 100.0, Unit::Sqft)],
                &snapshot,
            )
            .expect("prices");

        let service = &result.services[0];
        assert_eq!(service.tier1.total_man_hours, 1.0);
        assert_eq!(service.tier1.total_days, 1);
        assert_eq!(service.tier2.labor_cost, Decimal::new(50_00, 2));
        assert_eq!(service.tier2.material_cost_base, Decimal::new(50_00, 2));
        assert_eq!(service.tier2.material_waste_cost, Decimal::new(5_00, 2));
        assert_eq!(service.tier2.subtotal, Decimal::new(105_00, 2));
        assert_eq!(service.tier2.profit, Decimal::new(10_50, 2));
        assert_eq!(service.tier2.total, Decimal::new(115_50, 2));
        assert_eq!(result.totals.total_cost, Decimal::new(115_50, 2));
    }

    #[test]
    fn tier2_identities_hold() {
        let snapshot = fixtures::demo_snapshot();
        let result = TwoTierPricingEngine
            .calculate_pricing(
                &[
                    input(fixtures::MULCH_ROW, "Triple Ground Mulch (SQFT)", 45.0, Unit::Sqft),
                    input(fixtures::EDGING_ROW, "Metal Edging", 3.0, Unit::LinearFeet),
                ],
                &snapshot,
            )
            .expect("prices");

        let mut summed = Decimal::ZERO;
        for service in &result.services {
            let tier2 = &service.tier2;
            assert_eq!(
                tier2.total_material_cost,
                tier2.material_cost_base + tier2.material_waste_cost
            );
            assert_eq!(
                tier2.subtotal,
                tier2.labor_cost
                    + tier2.total_material_cost
                    + tier2.equipment_cost
                    + tier2.obstacle_cost
            );
            assert_eq!(tier2.total, tier2.subtotal + tier2.profit);
            summed += tier2.total;
        }
        assert_eq!(result.totals.total_cost, summed);
        assert!(result.totals.total_labor_hours > 0.0);
    }

    #[test]
    fn paver_variables_drive_hours_and_costs() {
        let snapshot = fixtures::demo_snapshot();
        let mut patio = input(fixtures::PAVER_PATIO_ROW, "Paver Patio", 100.0, Unit::Sqft);
        patio.variables.values.insert(
            "site_access".to_string(),
            VariableValue::Selection("tight".to_string()),
        );
        patio.variables.values.insert(
            "excavation".to_string(),
            VariableValue::Selection("concrete".to_string()),
        );
        patio.variables.values.insert(
            "material_grade".to_string(),
            VariableValue::Selection("premium".to_string()),
        );
        patio.variables.values.insert("crew_size".to_string(), VariableValue::Number(4.0));
        patio
            .variables
            .values
            .insert("obstacle_removal".to_string(), VariableValue::Toggle(true));

        let result =
            TwoTierPricingEngine.calculate_pricing(&[patio], &snapshot).expect("prices");
        let service = &result.services[0];

        // 100 sqft x 0.10 hr = 10 base; +5 hr concrete tear-out; x1.60 tight.
        assert_eq!(service.tier1.base_hours, 10.0);
        assert!((service.tier1.total_man_hours - 24.0).abs() < 1e-9);
        assert_eq!(service.tier1.crew_size, 4.0);
        // 24 man-hours / (8 hr x 4 crew) = 0.75 elapsed days -> 1 day.
        assert_eq!(service.tier1.total_days, 1);
        // Premium grade: 100 x $7.50.
        assert_eq!(service.tier2.material_cost_base, Decimal::new(750_00, 2));
        assert_eq!(service.tier2.obstacle_cost, Decimal::new(150_00, 2));
        assert!(service.tier1.breakdown.len() >= 4);
    }

    #[test]
    fn unknown_catalog_row_fails_whole_request() {
        let snapshot = fixtures::demo_snapshot();
        let result = TwoTierPricingEngine.calculate_pricing(
            &[
                input(fixtures::MULCH_ROW, "Triple Ground Mulch (SQFT)", 45.0, Unit::Sqft),
                input("ghost_service", "Ghost", 1.0, Unit::Each),
            ],
            &snapshot,
        );
        assert!(matches!(result, Err(PricingError::UnknownService(row)) if row == "ghost_service"));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let snapshot = fixtures::demo_snapshot();
        for quantity in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let result = TwoTierPricingEngine.calculate_pricing(
                &[input(fixtures::MULCH_ROW, "Triple Ground Mulch (SQFT)", quantity, Unit::Sqft)],
                &snapshot,
            );
            assert!(matches!(result, Err(PricingError::InvalidQuantity { .. })));
        }
    }

    #[test]
    fn stale_selection_key_is_a_config_failure() {
        let snapshot = fixtures::demo_snapshot();
        let mut patio = input(fixtures::PAVER_PATIO_ROW, "Paver Patio", 100.0, Unit::Sqft);
        patio.variables.values.insert(
            "material_grade".to_string(),
            VariableValue::Selection("imported_marble".to_string()),
        );
        let result = TwoTierPricingEngine.calculate_pricing(&[patio], &snapshot);
        assert!(matches!(result, Err(PricingError::MissingVariableDefault { category, .. }) if category == "material_grade"));
    }

    #[test]
    fn empty_input_fails_on_zero_hours() {
        let snapshot = fixtures::demo_snapshot();
        let result = TwoTierPricingEngine.calculate_pricing(&[], &snapshot);
        assert!(matches!(result, Err(PricingError::ZeroLaborHours)));
    }
}
