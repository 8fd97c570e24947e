//! Parameter collection: quantity + unit extraction for mapped services.
//!
//! Single-pass and pure: one invocation inspects one message against one
//! catalog snapshot and lands on `ReadyForPricing` or `NeedsClarification`.
//! The caller re-invokes with follow-up text after clarification; no state
//! is held across calls.

use serde::Serialize;

use crate::catalog::{CatalogRow, CatalogSnapshot, PricingModel};
use crate::mapping::{normalize, MappingResult, ServiceMatch, TextSpan};
use crate::units::{convertible, format_quantity, match_unit, Unit};

/// One service found in user text with a usable quantity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtractedServiceRequest {
    pub service_name: String,
    pub catalog_row: CatalogRow,
    pub quantity: f64,
    pub unit: Unit,
    /// Text evidence: the slice of normalized input this extraction rests on.
    pub source_span: String,
    pub extraction_confidence: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// Nothing recognized yet; the caller should prompt generically.
    Collecting,
    NeedsClarification,
    ReadyForPricing,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectionResult {
    pub services: Vec<ExtractedServiceRequest>,
    pub status: CollectionStatus,
    /// Aggregate confidence: mean over matched services, where a service
    /// without a usable quantity contributes zero.
    pub confidence: f64,
    pub clarifying_questions: Vec<String>,
}

pub trait ParameterCollector: Send + Sync {
    fn collect(
        &self,
        text: &str,
        mapping: &MappingResult,
        snapshot: &CatalogSnapshot,
    ) -> CollectionResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QuantityCollector;

/// Numbers further than this many tokens from a match span are not claimed.
const MAX_TOKEN_DISTANCE: usize = 4;

/// Confidence tiers. Explicit quantity and unit is certain; an inferable
/// unit or a structurally implied quantity is weaker but still priceable.
const CONF_EXPLICIT: f64 = 1.0;
const CONF_INFERRED_UNIT: f64 = 0.75;
const CONF_FLAT_PER_JOB: f64 = 0.9;
const CONF_WRONG_UNIT: f64 = 0.4;
const CONF_AMBIGUOUS_TIE: f64 = 0.45;

impl ParameterCollector for QuantityCollector {
    fn collect(
        &self,
        text: &str,
        mapping: &MappingResult,
        snapshot: &CatalogSnapshot,
    ) -> CollectionResult {
        if mapping.services.is_empty() {
            return CollectionResult {
                services: Vec::new(),
                status: CollectionStatus::Collecting,
                confidence: 0.0,
                clarifying_questions: Vec::new(),
            };
        }

        let normalized = normalize(text);
        let tokens = tokenize(&normalized);
        let numbers = numeric_tokens(&tokens);

        let mut questions = Vec::new();
        let mut confidences = Vec::new();
        let resolved = resolve_ties(mapping, &tokens, &numbers, snapshot, &mut questions, &mut confidences);

        let assignments = assign_numbers(&resolved, &tokens, &numbers);

        let mut services = Vec::new();
        for (index, matched) in resolved.iter().enumerate() {
            let entry = match snapshot.find(&matched.catalog_row) {
                Some(entry) => entry,
                // Mapping and collection run against the same snapshot, so a
                // missing row here is a configuration inconsistency; treat it
                // as unextractable and let pricing surface the real error.
                None => {
                    confidences.push(0.0);
                    continue;
                }
            };

            match assignments[index] {
                Some(number_index) => {
                    let quantity = numbers[number_index].value;
                    let number_token = &tokens[numbers[number_index].token_index];
                    let extraction = classify_unit(
                        &tokens,
                        numbers[number_index].token_index,
                        matched,
                        entry.unit,
                    );
                    match extraction {
                        UnitEvidence::Explicit(unit) => {
                            services.push(request(matched, quantity, unit, &normalized, number_token, CONF_EXPLICIT));
                            confidences.push(CONF_EXPLICIT);
                        }
                        UnitEvidence::CountedNoun => {
                            services.push(request(matched, quantity, Unit::Each, &normalized, number_token, CONF_EXPLICIT));
                            confidences.push(CONF_EXPLICIT);
                        }
                        UnitEvidence::Inferred => {
                            services.push(request(matched, quantity, entry.unit, &normalized, number_token, CONF_INFERRED_UNIT));
                            confidences.push(CONF_INFERRED_UNIT);
                        }
                        UnitEvidence::Mismatch(found) => {
                            confidences.push(CONF_WRONG_UNIT);
                            questions.push(format!(
                                "{} is priced per {} — I saw \"{} {}\". About how many {} is it?",
                                matched.service_name,
                                entry.unit.question_phrase(),
                                number_token.text,
                                found.label(),
                                entry.unit.question_phrase(),
                            ));
                        }
                    }
                }
                None => {
                    if entry.pricing_model == PricingModel::FlatPerJob {
                        // Quantity is structural for flat per-job services.
                        services.push(request(
                            matched,
                            1.0,
                            entry.unit,
                            &normalized,
                            &Token { text: String::new(), start: matched.span.start },
                            CONF_FLAT_PER_JOB,
                        ));
                        confidences.push(CONF_FLAT_PER_JOB);
                    } else {
                        confidences.push(0.0);
                        questions.push(format!(
                            "How many {} of {} should I price?",
                            entry.unit.question_phrase(),
                            matched.service_name,
                        ));
                    }
                }
            }
        }

        let confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };

        let all_services_confident = services
            .iter()
            .all(|service| service.extraction_confidence >= snapshot.settings.service_confidence_threshold);
        let ready = questions.is_empty()
            && !services.is_empty()
            && all_services_confident
            && confidence >= snapshot.settings.ready_confidence_threshold;

        if !ready && questions.is_empty() {
            // Recognized but not confident enough to price: ask the customer
            // to confirm what was inferred rather than silently quoting it.
            for service in &services {
                if service.extraction_confidence < snapshot.settings.ready_confidence_threshold {
                    questions.push(format!(
                        "Just to confirm — {} {} of {}?",
                        format_quantity(service.quantity),
                        service.unit.question_phrase(),
                        service.service_name,
                    ));
                }
            }
        }

        let status = if ready {
            CollectionStatus::ReadyForPricing
        } else {
            CollectionStatus::NeedsClarification
        };

        CollectionResult { services, status, confidence, clarifying_questions: questions }
    }
}

fn request(
    matched: &ServiceMatch,
    quantity: f64,
    unit: Unit,
    normalized: &str,
    number_token: &Token,
    confidence: f64,
) -> ExtractedServiceRequest {
    let start = matched.span.start.min(number_token.start);
    let end = matched.span.end.max(number_token.start + number_token.text.len());
    ExtractedServiceRequest {
        service_name: matched.service_name.clone(),
        catalog_row: matched.catalog_row.clone(),
        quantity,
        unit,
        source_span: normalized[start..end].trim().to_string(),
        extraction_confidence: confidence,
    }
}

#[derive(Clone, Debug)]
struct Token {
    text: String,
    start: usize,
}

#[derive(Clone, Copy, Debug)]
struct NumericToken {
    token_index: usize,
    value: f64,
}

fn tokenize(normalized: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start = None;
    for (offset, character) in normalized.char_indices() {
        if character == ' ' {
            if let Some(start) = current_start.take() {
                tokens.push(Token { text: normalized[start..offset].to_string(), start });
            }
        } else if current_start.is_none() {
            current_start = Some(offset);
        }
    }
    if let Some(start) = current_start {
        tokens.push(Token { text: normalized[start..].to_string(), start });
    }
    tokens
}

fn numeric_tokens(tokens: &[Token]) -> Vec<NumericToken> {
    tokens
        .iter()
        .enumerate()
        .filter_map(|(token_index, token)| {
            let trimmed = token.text.trim_matches('.');
            let value: f64 = trimmed.parse().ok()?;
            (value.is_finite() && value > 0.0).then_some(NumericToken { token_index, value })
        })
        .collect()
}

/// Token index range `[first, last]` the span covers.
fn token_range(tokens: &[Token], span: &TextSpan) -> (usize, usize) {
    let mut first = usize::MAX;
    let mut last = 0;
    for (index, token) in tokens.iter().enumerate() {
        let token_end = token.start + token.text.len();
        if token.start < span.end && span.start < token_end {
            first = first.min(index);
            last = last.max(index);
        }
    }
    if first == usize::MAX {
        (0, 0)
    } else {
        (first, last)
    }
}

/// Resolve equal-length overlapping matches (shared keyword across entries).
/// A nearby explicit unit can pick the winner; otherwise the ambiguity turns
/// into a clarifying question and a depressed confidence contribution.
fn resolve_ties(
    mapping: &MappingResult,
    tokens: &[Token],
    numbers: &[NumericToken],
    snapshot: &CatalogSnapshot,
    questions: &mut Vec<String>,
    confidences: &mut Vec<f64>,
) -> Vec<ServiceMatch> {
    let mut resolved: Vec<ServiceMatch> = Vec::new();
    let mut consumed = vec![false; mapping.services.len()];

    for (index, matched) in mapping.services.iter().enumerate() {
        if consumed[index] {
            continue;
        }
        let mut group = vec![matched];
        for (other_index, other) in mapping.services.iter().enumerate().skip(index + 1) {
            if !consumed[other_index] && other.span == matched.span {
                consumed[other_index] = true;
                group.push(other);
            }
        }

        if group.len() == 1 {
            resolved.push(matched.clone());
            continue;
        }

        let explicit_unit = nearest_explicit_unit(tokens, numbers, &matched.span);
        let by_unit: Vec<&&ServiceMatch> = group
            .iter()
            .filter(|candidate| {
                explicit_unit
                    .map(|unit| {
                        snapshot
                            .find(&candidate.catalog_row)
                            .map(|entry| convertible(unit, entry.unit))
                            .unwrap_or(false)
                    })
                    .unwrap_or(false)
            })
            .collect();

        if by_unit.len() == 1 {
            resolved.push((**by_unit[0]).clone());
        } else {
            let names: Vec<&str> =
                group.iter().map(|candidate| candidate.service_name.as_str()).collect();
            questions.push(format!(
                "\"{}\" could mean {} — which one did you have in mind?",
                matched.matched_keyword,
                names.join(" or "),
            ));
            confidences.push(CONF_AMBIGUOUS_TIE);
        }
    }

    resolved
}

fn nearest_explicit_unit(
    tokens: &[Token],
    numbers: &[NumericToken],
    span: &TextSpan,
) -> Option<Unit> {
    let range = token_range(tokens, span);
    numbers
        .iter()
        .filter_map(|number| {
            let (_, distance) = pair_rank(tokens, number.token_index, range)?;
            let unit = explicit_unit_after(tokens, number.token_index)?;
            Some((distance, unit))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, unit)| unit)
}

/// Unit synonym written right after a numeric token, if any. Looks at the
/// same three-token window `classify_unit` uses.
fn explicit_unit_after(tokens: &[Token], number_token_index: usize) -> Option<Unit> {
    let following: Vec<&str> = tokens
        .iter()
        .skip(number_token_index + 1)
        .take(3)
        .map(|token| token.text.as_str())
        .collect();
    match_unit(&following).map(|(unit, _)| unit)
}

/// Rank a (number, match) pairing. Lower ranks bind tighter: a number whose
/// path to the keyword is nothing but unit words ("45 sq ft mulch") beats a
/// trailing number, and token distance breaks remaining ties.
fn pair_rank(
    tokens: &[Token],
    number_index: usize,
    range: (usize, usize),
) -> Option<(u8, usize)> {
    let (first, last) = range;
    if number_index >= first && number_index <= last {
        return None;
    }
    if number_index < first {
        let distance = first - number_index - 1;
        if distance > MAX_TOKEN_DISTANCE {
            return None;
        }
        let between: Vec<&str> =
            tokens[number_index + 1..first].iter().map(|token| token.text.as_str()).collect();
        let priority = if only_units_or_filler(&between) { 0 } else { 1 };
        Some((priority, distance))
    } else {
        let distance = number_index - last - 1;
        (distance <= MAX_TOKEN_DISTANCE).then_some((2, distance))
    }
}

fn only_units_or_filler(tokens: &[&str]) -> bool {
    let mut index = 0;
    while index < tokens.len() {
        if tokens[index] == "of" || tokens[index] == "x" {
            index += 1;
            continue;
        }
        match match_unit(&tokens[index..]) {
            Some((_, consumed)) => index += consumed,
            None => return false,
        }
    }
    true
}

/// Globally assign numeric tokens to matches, tightest pairing first, each
/// number claimed at most once. Returns, per match, the claimed index into
/// `numbers`.
fn assign_numbers(
    matches: &[ServiceMatch],
    tokens: &[Token],
    numbers: &[NumericToken],
) -> Vec<Option<usize>> {
    let mut pairs = Vec::new();
    for (match_index, matched) in matches.iter().enumerate() {
        let range = token_range(tokens, &matched.span);
        for (number_index, number) in numbers.iter().enumerate() {
            if let Some((priority, distance)) = pair_rank(tokens, number.token_index, range) {
                pairs.push((priority, distance, match_index, number_index));
            }
        }
    }
    pairs.sort();

    let mut assigned: Vec<Option<usize>> = vec![None; matches.len()];
    let mut claimed = vec![false; numbers.len()];
    for (_, _, match_index, number_index) in pairs {
        if assigned[match_index].is_none() && !claimed[number_index] {
            assigned[match_index] = Some(number_index);
            claimed[number_index] = true;
        }
    }
    assigned
}

enum UnitEvidence {
    /// A unit synonym follows the number and converts to the catalog unit.
    Explicit(Unit),
    /// No unit token, but the matched keyword itself is the counted noun
    /// ("2 turf zones") for an each-unit service.
    CountedNoun,
    /// No unit token; fall back to the catalog's canonical unit.
    Inferred,
    /// A unit was written but does not convert to the catalog unit.
    Mismatch(Unit),
}

fn classify_unit(
    tokens: &[Token],
    number_token_index: usize,
    matched: &ServiceMatch,
    canonical: Unit,
) -> UnitEvidence {
    if let Some(found) = explicit_unit_after(tokens, number_token_index) {
        return if convertible(found, canonical) {
            UnitEvidence::Explicit(found)
        } else {
            UnitEvidence::Mismatch(found)
        };
    }

    let range_start = token_range_start(tokens, &matched.span);
    let precedes_closely = number_token_index < range_start
        && range_start - number_token_index - 1 <= 2;
    if canonical == Unit::Each && precedes_closely {
        UnitEvidence::CountedNoun
    } else {
        UnitEvidence::Inferred
    }
}

fn token_range_start(tokens: &[Token], span: &TextSpan) -> usize {
    token_range(tokens, span).0
}
