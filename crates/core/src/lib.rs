pub mod catalog;
pub mod collection;
pub mod config;
pub mod errors;
pub mod fixtures;
pub mod mapping;
pub mod personality;
pub mod pipeline;
pub mod pricing;
pub mod units;
pub mod variables;

pub use catalog::{
    CatalogRow, CatalogSnapshot, CatalogStore, CatalogValidationError, PricingModel,
    ServiceCatalogEntry, ServiceRates, VariableEffect, VariableKind, VariableSpec,
};
pub use collection::{
    CollectionResult, CollectionStatus, ExtractedServiceRequest, ParameterCollector,
    QuantityCollector,
};
pub use config::{CatalogConfigError, CompanySettings};
pub use errors::PricingError;
pub use mapping::{KeywordMappingEngine, MappingEngine, MappingResult, ServiceMatch};
pub use personality::{
    CustomerContext, RequestIntent, ResponseFormatter, SalesPersonalityService, SalesResponse,
    Tone, UrgencyLevel,
};
pub use pipeline::{DefaultQuotePipeline, QuoteOutcome, QuotePipeline};
pub use pricing::{
    PricedServiceInput, PricingEngine, PricingResult, PricingTotals, ServicePricing, Tier1Result,
    Tier2Result, TwoTierPricingEngine,
};
pub use units::Unit;
pub use variables::{
    CueVariableMapper, ResolvedVariables, VariableExtraction, VariableMapper, VariableValue,
};
