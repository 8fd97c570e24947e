use std::path::PathBuf;

use clap::{Args, ValueEnum};
use fieldquote_core::{
    CustomerContext, DefaultQuotePipeline, QuoteOutcome, RequestIntent, UrgencyLevel,
};

use crate::commands::{load_snapshot, CommandResult};

#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Customer message to price, e.g. "45 square feet of mulch".
    pub text: String,
    /// Catalog TOML file; the built-in demo catalog when omitted.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Customer first name for the reply greeting")]
    pub name: Option<String>,
    #[arg(long, help = "Customer job title, switches to a professional tone")]
    pub job_title: Option<String>,
    #[arg(long, help = "Treat the customer as a return customer")]
    pub return_customer: bool,
    #[arg(long, value_enum, default_value = "standard")]
    pub urgency: UrgencyArg,
    #[arg(long, help = "Compose a follow-up reply that offers scheduling")]
    pub follow_up: bool,
    #[arg(long, help = "Emit the full pipeline outcome as JSON")]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum UrgencyArg {
    Flexible,
    Standard,
    Emergency,
}

impl From<UrgencyArg> for UrgencyLevel {
    fn from(arg: UrgencyArg) -> Self {
        match arg {
            UrgencyArg::Flexible => UrgencyLevel::Flexible,
            UrgencyArg::Standard => UrgencyLevel::Standard,
            UrgencyArg::Emergency => UrgencyLevel::Emergency,
        }
    }
}

pub fn run(args: &QuoteArgs) -> CommandResult {
    let snapshot = match load_snapshot(args.catalog.as_deref()) {
        Ok(snapshot) => snapshot,
        Err(error) => return CommandResult::failure("quote", "catalog", format!("{error:#}"), 4),
    };

    let context = CustomerContext {
        first_name: args.name.clone(),
        job_title: args.job_title.clone(),
        is_return_customer: args.return_customer,
        urgency_level: args.urgency.into(),
    };
    let intent =
        if args.follow_up { RequestIntent::FollowUp } else { RequestIntent::PriceRequest };

    let outcome =
        match DefaultQuotePipeline::default().run(&args.text, &context, intent, &snapshot) {
            Ok(outcome) => outcome,
            Err(error) => {
                return CommandResult::failure("quote", "pricing", error.to_string(), 5);
            }
        };

    if args.json {
        return match serde_json::to_string_pretty(&outcome) {
            Ok(json) => CommandResult { exit_code: 0, output: json },
            Err(error) => {
                CommandResult::failure("quote", "serialization", error.to_string(), 5)
            }
        };
    }

    let output = match outcome {
        QuoteOutcome::Priced { pricing, response, .. } => {
            let mut text = response.message;
            text.push_str(&format!(
                "\n\n[{} service(s), ${}, calculated in {}ms]",
                pricing.services.len(),
                pricing.totals.total_cost,
                pricing.calculation_time_ms,
            ));
            text
        }
        QuoteOutcome::NeedsClarification { collection } => {
            let mut text = String::from("Almost there, a couple of details first:\n");
            for question in &collection.clarifying_questions {
                text.push_str(&format!("- {question}\n"));
            }
            text
        }
        QuoteOutcome::NoServicesDetected => {
            "No services recognized in that message. Try naming the work, e.g. \"mulch\" or \
             \"paver patio\"."
                .to_string()
        }
    };
    CommandResult { exit_code: 0, output }
}
