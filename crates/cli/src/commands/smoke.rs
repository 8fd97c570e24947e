use std::time::Instant;

use fieldquote_core::fixtures;
use fieldquote_core::personality::{MAX_MESSAGE_CHARS, MIN_MESSAGE_CHARS};
use fieldquote_core::{CustomerContext, DefaultQuotePipeline, QuoteOutcome, RequestIntent};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

/// Offline end-to-end validation: demo catalog builds, the regression
/// scenarios price inside their bands, and replies fit the message window.
pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let catalog_started = Instant::now();
    let snapshot = fixtures::demo_snapshot();
    checks.push(SmokeCheck {
        name: "catalog_validation",
        status: SmokeStatus::Pass,
        elapsed_ms: catalog_started.elapsed().as_millis() as u64,
        message: format!("demo catalog valid with {} service(s)", snapshot.entries().len()),
    });

    let pipeline = DefaultQuotePipeline::default();
    let scenarios: &[(&'static str, &str, i64, i64)] = &[
        (
            "mulch_edging_scenario",
            "I need 45 square feet of triple ground mulch and 3 feet of metal edging",
            50,
            200,
        ),
        (
            "irrigation_scenario",
            "Customer wants an irrigation setup with 2 turf zones",
            800,
            1500,
        ),
        ("return_mulch_scenario", "How much for 100 sq ft of triple ground mulch?", 80, 150),
    ];

    let mut failed_scenario = false;
    for &(name, text, low, high) in scenarios {
        let check_started = Instant::now();
        let outcome = pipeline.run(
            text,
            &CustomerContext::default(),
            RequestIntent::PriceRequest,
            &snapshot,
        );
        let elapsed_ms = check_started.elapsed().as_millis() as u64;
        let check = match outcome {
            Ok(QuoteOutcome::Priced { pricing, response, .. }) => {
                let total = pricing.totals.total_cost;
                let in_band = total >= Decimal::from(low) && total <= Decimal::from(high);
                let length = response.message.chars().count();
                let in_window = (MIN_MESSAGE_CHARS..=MAX_MESSAGE_CHARS).contains(&length);
                if in_band && in_window {
                    SmokeCheck {
                        name,
                        status: SmokeStatus::Pass,
                        elapsed_ms,
                        message: format!("priced at ${total} within ${low}..=${high}"),
                    }
                } else {
                    SmokeCheck {
                        name,
                        status: SmokeStatus::Fail,
                        elapsed_ms,
                        message: format!(
                            "total ${total} (band ${low}..=${high}), reply {length} chars",
                        ),
                    }
                }
            }
            Ok(other) => SmokeCheck {
                name,
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: format!("expected a priced quote, got {other:?}"),
            },
            Err(error) => SmokeCheck {
                name,
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            },
        };
        failed_scenario |= check.status == SmokeStatus::Fail;
        checks.push(check);
    }

    if failed_scenario {
        checks.push(skipped("clarification_path"));
    } else {
        let check_started = Instant::now();
        let outcome = pipeline.run(
            "can you do triple ground mulch for me",
            &CustomerContext::default(),
            RequestIntent::PriceRequest,
            &snapshot,
        );
        let elapsed_ms = check_started.elapsed().as_millis() as u64;
        checks.push(match outcome {
            Ok(QuoteOutcome::NeedsClarification { collection })
                if !collection.clarifying_questions.is_empty() =>
            {
                SmokeCheck {
                    name: "clarification_path",
                    status: SmokeStatus::Pass,
                    elapsed_ms,
                    message: format!(
                        "asked {} question(s) instead of guessing",
                        collection.clarifying_questions.len()
                    ),
                }
            }
            Ok(other) => SmokeCheck {
                name: "clarification_path",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: format!("expected clarifying questions, got {other:?}"),
            },
            Err(error) => SmokeCheck {
                name: "clarification_path",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            },
        });
    }

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
