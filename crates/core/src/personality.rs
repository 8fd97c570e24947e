//! Customer-facing response composition.
//!
//! The numbers are fixed by the pricing stage; this module only decides how
//! to say them. Tone is selected from customer context, the message is built
//! from tone-specific fragments, and the final text is clamped into the
//! delivery channel's length window.

use serde::Serialize;

use crate::pricing::PricingResult;
use crate::units::format_quantity;

/// Delivery-channel bounds. Shorter reads as a blow-off, longer gets
/// truncated by the transport.
pub const MIN_MESSAGE_CHARS: usize = 100;
pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Casual,
    Professional,
    Premium,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Flexible,
    #[default]
    Standard,
    Emergency,
}

/// What the customer is doing in this message: asking for a price, or
/// circling back on a quote they already have.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestIntent {
    #[default]
    PriceRequest,
    FollowUp,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CustomerContext {
    pub first_name: Option<String>,
    /// A stated role ("facilities manager") signals a business buyer.
    pub job_title: Option<String>,
    pub is_return_customer: bool,
    pub urgency_level: UrgencyLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SalesResponse {
    pub message: String,
    pub tone: Tone,
}

pub trait ResponseFormatter: Send + Sync {
    fn format_response(
        &self,
        pricing: &PricingResult,
        context: &CustomerContext,
        intent: RequestIntent,
    ) -> SalesResponse;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SalesPersonalityService;

impl SalesPersonalityService {
    /// Emergency outranks everything; a return customer or a stated job
    /// title outranks casual.
    pub fn select_tone(&self, context: &CustomerContext) -> Tone {
        if context.urgency_level == UrgencyLevel::Emergency {
            Tone::Premium
        } else if context.is_return_customer || context.job_title.is_some() {
            Tone::Professional
        } else {
            Tone::Casual
        }
    }
}

impl ResponseFormatter for SalesPersonalityService {
    fn format_response(
        &self,
        pricing: &PricingResult,
        context: &CustomerContext,
        intent: RequestIntent,
    ) -> SalesResponse {
        let tone = self.select_tone(context);
        let mut message = String::new();

        message.push_str(&greeting(tone, context.first_name.as_deref()));
        message.push_str("\n\n");

        for service in &pricing.services {
            message.push_str(&format!(
                "- {}: {} {}, ${}\n",
                service.service_name,
                format_quantity(service.quantity),
                service.unit.label(),
                service.tier2.total,
            ));
        }

        message.push_str(&format!(
            "\nYour total comes to ${}. We'd plan on about {} day(s) on site.\n",
            pricing.totals.total_cost, pricing.totals.total_days,
        ));

        if tone == Tone::Premium {
            message.push_str("We can prioritize this and get a crew out right away.\n");
        }
        if intent == RequestIntent::FollowUp {
            message.push_str(match tone {
                Tone::Casual => "Want me to get you on the schedule?\n",
                Tone::Professional | Tone::Premium => {
                    "When you're ready, we can get your project on the schedule.\n"
                }
            });
        }

        message.push_str(closing(tone));

        SalesResponse { message: clamp_length(message), tone }
    }
}

fn greeting(tone: Tone, first_name: Option<&str>) -> String {
    match (tone, first_name) {
        (Tone::Casual, Some(name)) => format!("Hey {name}! Here's what that would run you:"),
        (Tone::Casual, None) => "Hey there! Here's what that would run you:".to_string(),
        (Tone::Professional, Some(name)) => {
            format!("Hello {name}, here is the quote you requested:")
        }
        (Tone::Professional, None) => "Hello, here is the quote you requested:".to_string(),
        (Tone::Premium, Some(name)) => {
            format!("Hi {name}, we've put this together for you right away:")
        }
        (Tone::Premium, None) => "Hi, we've put this together for you right away:".to_string(),
    }
}

fn closing(tone: Tone) -> &'static str {
    match tone {
        Tone::Casual => "Happy to tweak anything, just let me know.",
        Tone::Professional => {
            "If any details of the scope change, let me know and I'll update the quote."
        }
        Tone::Premium => "Reply any time and we'll make the arrangements immediately.",
    }
}

/// Pad short messages with neutral follow-up lines and cut long ones back at
/// a sentence boundary. The fragments above keep normal quotes well inside
/// the window; this is the backstop.
fn clamp_length(mut message: String) -> String {
    const FILLERS: [&str; 2] = [
        " If anything about the scope changes, just let me know and I'll re-run the numbers.",
        " No obligation either way.",
    ];
    let mut fillers = FILLERS.iter();
    while message.chars().count() < MIN_MESSAGE_CHARS {
        match fillers.next() {
            Some(filler) => message.push_str(filler),
            None => break,
        }
    }

    // Both bounds count chars, not bytes; the window byte offset has to come
    // from char_indices or a multibyte service name could split a character.
    if let Some((window_end, _)) = message.char_indices().nth(MAX_MESSAGE_CHARS) {
        let cut = message[..window_end]
            .rfind('.')
            .map(|index| index + 1)
            .unwrap_or(window_end);
        message.truncate(cut);
    }
    message
}

#[cfg(test)]
mod tests {
    use crate::catalog::CatalogRow;
    use crate::collection::ExtractedServiceRequest;
    use crate::fixtures;
    use crate::pricing::{PricedServiceInput, PricingEngine, PricingResult, TwoTierPricingEngine};
    use crate::units::Unit;
    use crate::variables::ResolvedVariables;

    use super::{
        CustomerContext, RequestIntent, ResponseFormatter, SalesPersonalityService, Tone,
        UrgencyLevel, MAX_MESSAGE_CHARS, MIN_MESSAGE_CHARS,
    };

    fn demo_pricing() -> PricingResult {
        let snapshot = fixtures::demo_snapshot();
        let inputs = [
            PricedServiceInput {
                request: ExtractedServiceRequest {
                    service_name: "Triple Ground Mulch (SQFT)".to_string(),
                    catalog_row: CatalogRow(fixtures::MULCH_ROW.to_string()),
                    quantity: 45.0,
                    unit: Unit::Sqft,
                    source_span: String::new(),
                    extraction_confidence: 1.0,
                },
                variables: ResolvedVariables::default(),
            },
            PricedServiceInput {
                request: ExtractedServiceRequest {
                    service_name: "Metal Edging".to_string(),
                    catalog_row: CatalogRow(fixtures::EDGING_ROW.to_string()),
                    quantity: 3.0,
                    unit: Unit::LinearFeet,
                    source_span: String::new(),
                    extraction_confidence: 1.0,
                },
                variables: ResolvedVariables::default(),
            },
        ];
        TwoTierPricingEngine.calculate_pricing(&inputs, &snapshot).expect("prices")
    }

    #[test]
    fn fresh_customer_gets_casual_tone() {
        let service = SalesPersonalityService;
        assert_eq!(service.select_tone(&CustomerContext::default()), Tone::Casual);
    }

    #[test]
    fn return_customer_or_job_title_gets_professional() {
        let service = SalesPersonalityService;
        let returning =
            CustomerContext { is_return_customer: true, ..CustomerContext::default() };
        assert_eq!(service.select_tone(&returning), Tone::Professional);

        let titled = CustomerContext {
            job_title: Some("facilities manager".to_string()),
            ..CustomerContext::default()
        };
        assert_eq!(service.select_tone(&titled), Tone::Professional);
    }

    #[test]
    fn emergency_outranks_return_customer() {
        let service = SalesPersonalityService;
        let context = CustomerContext {
            is_return_customer: true,
            urgency_level: UrgencyLevel::Emergency,
            ..CustomerContext::default()
        };
        assert_eq!(service.select_tone(&context), Tone::Premium);
    }

    #[test]
    fn message_names_every_service_with_quantity_and_total() {
        let response = SalesPersonalityService.format_response(
            &demo_pricing(),
            &CustomerContext::default(),
            RequestIntent::PriceRequest,
        );

        assert!(response.message.contains("Triple Ground Mulch (SQFT)"));
        assert!(response.message.contains("Metal Edging"));
        assert!(response.message.contains("45 sqft"));
        assert!(response.message.contains("3 linear feet"));
        assert!(response.message.contains("total"));
        assert!(response.message.contains('$'));
    }

    #[test]
    fn message_length_stays_inside_the_window() {
        let pricing = demo_pricing();
        for context in [
            CustomerContext::default(),
            CustomerContext { first_name: Some("Sam".to_string()), ..CustomerContext::default() },
            CustomerContext {
                urgency_level: UrgencyLevel::Emergency,
                ..CustomerContext::default()
            },
        ] {
            let response = SalesPersonalityService.format_response(
                &pricing,
                &context,
                RequestIntent::PriceRequest,
            );
            let length = response.message.chars().count();
            assert!(
                (MIN_MESSAGE_CHARS..=MAX_MESSAGE_CHARS).contains(&length),
                "length {length} out of window"
            );
        }
    }

    #[test]
    fn long_multibyte_messages_truncate_at_a_char_boundary() {
        let snapshot = fixtures::demo_snapshot();
        let inputs: Vec<PricedServiceInput> = (0..80)
            .map(|_| PricedServiceInput {
                request: ExtractedServiceRequest {
                    service_name: "Mantillo écológico para jardinería".to_string(),
                    catalog_row: CatalogRow(fixtures::MULCH_ROW.to_string()),
                    quantity: 45.0,
                    unit: Unit::Sqft,
                    source_span: String::new(),
                    extraction_confidence: 1.0,
                },
                variables: ResolvedVariables::default(),
            })
            .collect();
        let pricing = TwoTierPricingEngine.calculate_pricing(&inputs, &snapshot).expect("prices");

        let response = SalesPersonalityService.format_response(
            &pricing,
            &CustomerContext::default(),
            RequestIntent::PriceRequest,
        );

        assert!(response.message.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(response.message.ends_with('.'));
    }

    #[test]
    fn follow_up_offers_scheduling() {
        let response = SalesPersonalityService.format_response(
            &demo_pricing(),
            &CustomerContext::default(),
            RequestIntent::FollowUp,
        );
        assert!(response.message.to_lowercase().contains("schedule"));
    }
}
