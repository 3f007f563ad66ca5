//! Market comparison for a seller's proposed price.
//!
//! `match -> convert -> reference -> classify`. Failures never escape as
//! errors to callers of the engine; [`MarketPriceReport::from_error`] turns
//! them into a report with `found = false` and guidance text.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::pricing::families::infer_family;
use crate::pricing::keywords::Keywords;
use crate::pricing::matcher::{CatalogMatcher, SearchStage};
use crate::pricing::reference::{
    classify, compute_reference, deviation_pct, MatchCandidate, PriceClassification,
    ReferenceMethod,
};
use crate::pricing::units::{normalize_unit, CanonicalUnit};
use crate::store::CatalogStore;

/// Candidates echoed back in a report.
pub const REPORT_CANDIDATE_LIMIT: usize = 5;
pub const DEFAULT_UNIT: &str = "unidad";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPriceRequest {
    pub name: String,
    pub proposed_price: Decimal,
    pub unit: String,
}

impl MarketPriceRequest {
    pub fn new(name: impl Into<String>, proposed_price: Decimal) -> Self {
        Self { name: name.into(), proposed_price, unit: DEFAULT_UNIT.to_owned() }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPriceReport {
    pub found: bool,
    /// `ok`, or the error class that stopped the comparison.
    pub outcome: String,
    pub query: String,
    pub keywords: Vec<String>,
    pub search_stage: Option<SearchStage>,
    pub proposed_price: Decimal,
    pub reference_price: Option<Decimal>,
    pub deviation_pct: Option<Decimal>,
    pub classification: PriceClassification,
    pub method: Option<ReferenceMethod>,
    pub requested_unit: CanonicalUnit,
    /// Unit the reference and candidates are expressed in.
    pub unit: CanonicalUnit,
    pub unit_mismatch_corrected: bool,
    pub suggested_unit: Option<CanonicalUnit>,
    pub converted_count: usize,
    pub omitted_count: usize,
    pub candidates: Vec<MatchCandidate>,
    pub advice: String,
}

impl MarketPriceReport {
    pub fn from_error(request: &MarketPriceRequest, error: &EngineError) -> Self {
        let requested_unit = normalize_unit(&request.unit);
        let suggested_unit =
            infer_family(&request.name).map(|family| family.suggested_unit.clone());

        let mut advice = error.advice();
        if let Some(unit) = suggested_unit.as_ref().filter(|unit| **unit != requested_unit) {
            advice.push_str(&format!(" Este tipo de producto suele venderse por {unit}."));
        }

        Self {
            found: false,
            outcome: error.error_class().to_owned(),
            query: request.name.clone(),
            keywords: Keywords::extract(&request.name).to_vec(),
            search_stage: None,
            proposed_price: request.proposed_price,
            reference_price: None,
            deviation_pct: None,
            classification: classify(request.proposed_price, None),
            method: None,
            unit: requested_unit.clone(),
            requested_unit,
            unit_mismatch_corrected: false,
            suggested_unit,
            converted_count: 0,
            omitted_count: 0,
            candidates: Vec::new(),
            advice,
        }
    }
}

pub async fn market_report<S>(
    store: &S,
    request: &MarketPriceRequest,
    candidate_limit: u32,
) -> Result<MarketPriceReport, EngineError>
where
    S: CatalogStore + ?Sized,
{
    let matcher = CatalogMatcher::new(store, candidate_limit);
    let found = matcher.find_candidates(&request.name, None).await?;
    let computed = compute_reference(&found.candidates, &request.unit, &request.name)?;

    let requested_unit = normalize_unit(&request.unit);
    let reference = computed.reference.value;
    let deviation = deviation_pct(request.proposed_price, reference)
        .ok_or(EngineError::Overflow { operation: "price deviation" })?;
    let classification = classify(request.proposed_price, Some(reference));

    let mut advice = String::new();
    if computed.unit_mismatch_corrected {
        advice.push_str(&format!(
            "\"{}\" no se vende por {requested_unit}; la comparación se hizo por {}. ",
            request.name.trim(),
            computed.unit
        ));
    }
    advice.push_str(classification.advice());
    advice.push_str(&format!(
        " Precio de referencia ({}): {:.2} por {}, a partir de {} productos similares.",
        computed.reference.method.as_str(),
        reference,
        computed.unit,
        computed.candidates.len()
    ));

    let converted_count = computed.candidates.len();
    let candidates = computed
        .candidates
        .into_iter()
        .take(REPORT_CANDIDATE_LIMIT)
        .map(|candidate| MatchCandidate {
            converted_price: candidate.converted_price.round_dp(4),
            ..candidate
        })
        .collect();

    Ok(MarketPriceReport {
        found: true,
        outcome: "ok".to_owned(),
        query: request.name.clone(),
        keywords: found.keywords,
        search_stage: Some(found.stage),
        proposed_price: request.proposed_price,
        reference_price: Some(reference.round_dp(2)),
        deviation_pct: Some(deviation.round_dp(2)),
        classification,
        method: Some(computed.reference.method),
        requested_unit,
        suggested_unit: computed.unit_mismatch_corrected.then(|| computed.unit.clone()),
        unit: computed.unit,
        unit_mismatch_corrected: computed.unit_mismatch_corrected,
        converted_count,
        omitted_count: computed.omitted,
        candidates,
        advice,
    })
}
