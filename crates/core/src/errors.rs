use thiserror::Error;

/// Calculation-stage failures. These are never shown raw to the customer;
/// callers log them with full context and send [`PricingError::user_message`]
/// instead. The whole multi-service request fails together, since a quote
/// with only some services priced is worse than an explicit failure the
/// customer can retry.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("unknown catalog row `{0}`")]
    UnknownService(String),
    #[error("variable `{category}` on service `{service}` has no value and no default")]
    MissingVariableDefault { service: String, category: String },
    #[error("invalid quantity {quantity} for service `{service}`")]
    InvalidQuantity { service: String, quantity: f64 },
    #[error("pricing produced zero total labor hours")]
    ZeroLaborHours,
    #[error("pricing produced a negative cost for `{service}`")]
    NegativeCost { service: String },
    #[error("non-finite value produced while pricing `{service}`")]
    NonFiniteValue { service: String },
}

impl PricingError {
    /// Apologetic, retry-inviting message safe to show the customer.
    pub fn user_message(&self) -> &'static str {
        "Sorry about that — I wasn't able to put a price together just now. \
         Give me another try in a moment, or rephrase what you need."
    }
}
