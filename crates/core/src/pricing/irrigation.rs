//! Irrigation-specific pricing entry point.
//!
//! Irrigation quotes are the same two-tier formula with two input coercions
//! applied first: the flat setup charge always prices at quantity 1 no
//! matter what was extracted, and zone counts are whole numbers (half a zone
//! is not a thing a crew can install).

use crate::catalog::{CatalogSnapshot, PricingModel};
use crate::errors::PricingError;
use crate::pricing::{PricedServiceInput, PricingEngine, PricingResult, TwoTierPricingEngine};
use crate::units::Unit;

impl TwoTierPricingEngine {
    pub fn calculate_irrigation_pricing(
        &self,
        inputs: &[PricedServiceInput],
        snapshot: &CatalogSnapshot,
    ) -> Result<PricingResult, PricingError> {
        let mut coerced = inputs.to_vec();
        for input in &mut coerced {
            let entry = snapshot
                .find(&input.request.catalog_row)
                .ok_or_else(|| PricingError::UnknownService(input.request.catalog_row.0.clone()))?;
            match entry.pricing_model {
                PricingModel::FlatPerJob => input.request.quantity = 1.0,
                PricingModel::PerUnit if entry.unit == Unit::Each => {
                    input.request.quantity = input.request.quantity.round().max(1.0);
                }
                PricingModel::PerUnit => {}
            }
        }
        self.calculate_pricing(&coerced, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::catalog::CatalogRow;
    use crate::collection::ExtractedServiceRequest;
    use crate::fixtures;
    use crate::pricing::{PricedServiceInput, TwoTierPricingEngine};
    use crate::units::Unit;
    use crate::variables::ResolvedVariables;

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
    fn setup_plus_two_zones_prices_exactly() {
        let snapshot = fixtures::demo_snapshot();
        let result = TwoTierPricingEngine
            .calculate_irrigation_pricing(
                &[
                    input(
                        fixtures::IRRIGATION_SETUP_ROW,
                        "Irrigation Setup Cost",
                        1.0,
                        Unit::Each,
                    ),
                    input(fixtures::IRRIGATION_ZONE_ROW, "Irrigation Zones", 2.0, Unit::Each),
                ],
                &snapshot,
            )
            .expect("prices");

        // Setup: 6 hr -> $300 labor, $200 + $20 waste material, 10% margin.
        assert_eq!(result.services[0].tier2.total, Decimal::new(572_00, 2));
        // Zones: 2 x 2 hr -> $200 labor, $300 + $30 waste, 10% margin.
        assert_eq!(result.services[1].tier2.total, Decimal::new(583_00, 2));
        assert_eq!(result.totals.total_cost, Decimal::new(1155_00, 2));
    }

    #[test]
    fn setup_quantity_is_forced_to_one() {
        let snapshot = fixtures::demo_snapshot();
        let result = TwoTierPricingEngine
            .calculate_irrigation_pricing(
                &[input(
                    fixtures::IRRIGATION_SETUP_ROW,
                    "Irrigation Setup Cost",
                    4.0,
                    Unit::Each,
                )],
                &snapshot,
            )
            .expect("prices");

        assert_eq!(result.services[0].quantity, 1.0);
        assert_eq!(result.services[0].tier2.total, Decimal::new(572_00, 2));
    }

    #[test]
    fn fractional_zone_counts_round_to_whole_zones() {
        let snapshot = fixtures::demo_snapshot();
        let result = TwoTierPricingEngine
            .calculate_irrigation_pricing(
                &[input(fixtures::IRRIGATION_ZONE_ROW, "Irrigation Zones", 2.4, Unit::Each)],
                &snapshot,
            )
            .expect("prices");

        assert_eq!(result.services[0].quantity, 2.0);
    }
}
