//! End-to-end quote pipeline: map text to services, collect quantities,
//! resolve complexity variables, price, and compose the customer reply.
//!
//! Each stage sits behind a trait so tests can substitute a single stage.
//! The pipeline itself holds no state: every run takes the catalog snapshot
//! it should price against, so a catalog publish mid-run cannot mix
//! generations inside one quote.

use serde::Serialize;
use uuid::Uuid;

use crate::catalog::CatalogSnapshot;
use crate::collection::{CollectionResult, CollectionStatus, ParameterCollector, QuantityCollector};
use crate::errors::PricingError;
use crate::mapping::{KeywordMappingEngine, MappingEngine};
use crate::personality::{
    CustomerContext, RequestIntent, ResponseFormatter, SalesPersonalityService, SalesResponse,
};
use crate::pricing::{PricedServiceInput, PricingEngine, PricingResult, TwoTierPricingEngine};
use crate::variables::paver_patio::paver_patio_mapper;
use crate::variables::{CueVariableMapper, VariableMapper};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuoteOutcome {
    Priced {
        collection: CollectionResult,
        pricing: PricingResult,
        response: SalesResponse,
    },
    NeedsClarification {
        collection: CollectionResult,
    },
    NoServicesDetected,
}

pub struct QuotePipeline<M, C, V, P, F> {
    mapping: M,
    collector: C,
    variables: V,
    pricing: P,
    formatter: F,
}

pub type DefaultQuotePipeline = QuotePipeline<
    KeywordMappingEngine,
    QuantityCollector,
    CueVariableMapper,
    TwoTierPricingEngine,
    SalesPersonalityService,
>;

impl Default for DefaultQuotePipeline {
    fn default() -> Self {
        QuotePipeline::new(
            KeywordMappingEngine,
            QuantityCollector,
            paver_patio_mapper(),
            TwoTierPricingEngine,
            SalesPersonalityService,
        )
    }
}

impl<M, C, V, P, F> QuotePipeline<M, C, V, P, F>
where
    M: MappingEngine,
    C: ParameterCollector,
    V: VariableMapper,
    P: PricingEngine,
    F: ResponseFormatter,
{
    pub fn new(mapping: M, collector: C, variables: V, pricing: P, formatter: F) -> Self {
        Self { mapping, collector, variables, pricing, formatter }
    }

    pub fn run(
        &self,
        text: &str,
        context: &CustomerContext,
        intent: RequestIntent,
        snapshot: &CatalogSnapshot,
    ) -> Result<QuoteOutcome, PricingError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "quote_pipeline",
            %request_id,
            catalog_generation = snapshot.generation,
        );
        let _guard = span.enter();

        let mapping = self.mapping.map_user_input(text, snapshot);
        if mapping.services.is_empty() {
            tracing::debug!("no services detected");
            return Ok(QuoteOutcome::NoServicesDetected);
        }
        tracing::debug!(matched = mapping.services.len(), "services mapped");

        let collection = self.collector.collect(text, &mapping, snapshot);
        match collection.status {
            CollectionStatus::ReadyForPricing => {}
            CollectionStatus::Collecting => {
                return Ok(QuoteOutcome::NoServicesDetected);
            }
            CollectionStatus::NeedsClarification => {
                tracing::debug!(
                    confidence = collection.confidence,
                    questions = collection.clarifying_questions.len(),
                    "clarification required",
                );
                return Ok(QuoteOutcome::NeedsClarification { collection });
            }
        }

        let mut inputs = Vec::with_capacity(collection.services.len());
        for request in &collection.services {
            let entry = snapshot
                .find(&request.catalog_row)
                .ok_or_else(|| PricingError::UnknownService(request.catalog_row.0.clone()))?;
            let extraction = self.variables.extract_variables(text, request.quantity, entry);
            tracing::debug!(
                service = %entry.catalog_row,
                inferred = extraction.extracted_variables.len(),
                defaulted = extraction.defaults_used.len(),
                "variables resolved",
            );
            inputs.push(PricedServiceInput {
                request: request.clone(),
                variables: extraction.values,
            });
        }

        let pricing = self.pricing.calculate_pricing(&inputs, snapshot).map_err(|error| {
            // Failures are logged with the input text so they can be replayed.
            tracing::error!(%error, input = text, "pricing failed");
            error
        })?;
        tracing::info!(
            total = %pricing.totals.total_cost,
            services = pricing.services.len(),
            calculation_time_ms = pricing.calculation_time_ms,
            "quote priced",
        );

        let response = self.formatter.format_response(&pricing, context, intent);
        Ok(QuoteOutcome::Priced { collection, pricing, response })
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures;
    use crate::personality::{CustomerContext, RequestIntent};

    use super::{DefaultQuotePipeline, QuoteOutcome};

    fn run(text: &str) -> QuoteOutcome {
        DefaultQuotePipeline::default()
            .run(
                text,
                &CustomerContext::default(),
                RequestIntent::PriceRequest,
                &fixtures::demo_snapshot(),
            )
            .expect("pipeline run")
    }

    #[test]
    fn mulch_and_edging_request_prices_end_to_end() {
        let outcome = run("I need 45 square feet of triple ground mulch and 3 feet of metal edging");
        let QuoteOutcome::Priced { collection, pricing, response } = outcome else {
            panic!("expected a priced quote");
        };
        assert_eq!(collection.services.len(), 2);
        assert_eq!(pricing.services.len(), 2);
        assert!(response.message.contains("total"));
    }

    #[test]
    fn missing_quantity_asks_instead_of_guessing() {
        let outcome = run("can you do triple ground mulch for me");
        let QuoteOutcome::NeedsClarification { collection } = outcome else {
            panic!("expected clarification");
        };
        assert!(!collection.clarifying_questions.is_empty());
    }

    #[test]
    fn unrelated_text_detects_nothing() {
        assert_eq!(run("hello, what are your business hours?"), QuoteOutcome::NoServicesDetected);
    }
}
