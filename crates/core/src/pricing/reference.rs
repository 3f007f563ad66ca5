//! Reference price over converted catalog candidates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::EngineError;
use crate::pricing::conversion::convert_price;
use crate::pricing::families::infer_family;
use crate::pricing::matcher::ScoredListing;
use crate::pricing::units::{normalize_unit, CanonicalUnit};

/// Sample size from which the median replaces the mean.
pub const MEDIAN_MIN_SAMPLES: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceMethod {
    Mediana,
    Promedio,
}

impl ReferenceMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mediana => "mediana",
            Self::Promedio => "promedio",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePrice {
    pub value: Decimal,
    pub method: ReferenceMethod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceClassification {
    SinPrecio,
    SinReferencia,
    MuyBajo,
    Bajo,
    LigeramenteBajo,
    Adecuado,
    LigeramenteAlto,
    Alto,
    MuyAlto,
}

impl PriceClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SinPrecio => "sin_precio",
            Self::SinReferencia => "sin_referencia",
            Self::MuyBajo => "muy_bajo",
            Self::Bajo => "bajo",
            Self::LigeramenteBajo => "ligeramente_bajo",
            Self::Adecuado => "adecuado",
            Self::LigeramenteAlto => "ligeramente_alto",
            Self::Alto => "alto",
            Self::MuyAlto => "muy_alto",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            Self::SinPrecio => "Ingresa un precio mayor que cero para compararlo con el mercado.",
            Self::SinReferencia => "No hay un precio de referencia con el cual comparar.",
            Self::MuyBajo => {
                "Tu precio está muy por debajo del mercado; podrías subirlo sin perder competitividad."
            }
            Self::Bajo => "Tu precio está por debajo del mercado; tienes margen para subirlo.",
            Self::LigeramenteBajo => "Tu precio es un poco más bajo que el mercado y es competitivo.",
            Self::Adecuado => "Tu precio está alineado con el mercado.",
            Self::LigeramenteAlto => {
                "Tu precio es un poco más alto que el mercado, pero sigue siendo razonable."
            }
            Self::Alto => "Tu precio está por encima del mercado; considera ajustarlo.",
            Self::MuyAlto => {
                "Tu precio está muy por encima del mercado y probablemente afecte tus ventas."
            }
        }
    }
}

/// Median of three or more prices (lower middle on even counts), else mean.
///
/// `None` for no prices, or when the mean's sum leaves the decimal range.
pub fn reference_price(prices: &[Decimal]) -> Option<ReferencePrice> {
    if prices.is_empty() {
        return None;
    }

    if prices.len() >= MEDIAN_MIN_SAMPLES {
        let mut sorted = prices.to_vec();
        sorted.sort();
        return Some(ReferencePrice {
            value: sorted[(sorted.len() - 1) / 2],
            method: ReferenceMethod::Mediana,
        });
    }

    let total = prices.iter().try_fold(Decimal::ZERO, |sum, price| sum.checked_add(*price))?;
    Some(ReferencePrice {
        value: total.checked_div(Decimal::from(prices.len()))?,
        method: ReferenceMethod::Promedio,
    })
}

/// Percent deviation of `proposed` from `reference`.
///
/// `None` without a positive reference or when the ratio overflows.
pub fn deviation_pct(proposed: Decimal, reference: Decimal) -> Option<Decimal> {
    if reference <= Decimal::ZERO {
        return None;
    }
    proposed
        .checked_sub(reference)?
        .checked_div(reference)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

pub fn classify(proposed: Decimal, reference: Option<Decimal>) -> PriceClassification {
    if proposed <= Decimal::ZERO {
        return PriceClassification::SinPrecio;
    }
    let Some(percent) = reference.and_then(|reference| deviation_pct(proposed, reference)) else {
        return PriceClassification::SinReferencia;
    };

    let band = |limit: i64| Decimal::from(limit);
    if percent <= band(-30) {
        PriceClassification::MuyBajo
    } else if percent <= band(-15) {
        PriceClassification::Bajo
    } else if percent <= band(-5) {
        PriceClassification::LigeramenteBajo
    } else if percent <= band(5) {
        PriceClassification::Adecuado
    } else if percent <= band(15) {
        PriceClassification::LigeramenteAlto
    } else if percent <= band(30) {
        PriceClassification::Alto
    } else {
        PriceClassification::MuyAlto
    }
}

/// A catalog candidate priced in the comparison unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub product_id: ProductId,
    pub name: String,
    pub original_price: Decimal,
    pub original_unit: CanonicalUnit,
    pub converted_price: Decimal,
    pub converted_unit: CanonicalUnit,
    pub conversion_applied: bool,
    pub stock: i64,
    pub seller_name: Option<String>,
    pub relevance: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceComputation {
    pub unit: CanonicalUnit,
    pub reference: ReferencePrice,
    pub candidates: Vec<MatchCandidate>,
    pub omitted: usize,
    pub unit_mismatch_corrected: bool,
}

/// Converts `matches` into `unit_label` and computes the reference.
///
/// When nothing converts and the unit does not suit the product's family
/// (eggs per kg), the whole computation reruns in the family's unit.
pub fn compute_reference(
    matches: &[ScoredListing],
    unit_label: &str,
    product_name: &str,
) -> Result<ReferenceComputation, EngineError> {
    let requested = normalize_unit(unit_label);
    let mut unit = requested.clone();
    let mut candidates = convert_candidates(matches, &unit, product_name);
    let mut unit_mismatch_corrected = false;

    let family = infer_family(product_name);
    if candidates.is_empty() {
        if let Some(family) = family.filter(|family| !family.accepts(&requested)) {
            unit = family.suggested_unit.clone();
            candidates = convert_candidates(matches, &unit, product_name);
            unit_mismatch_corrected = true;
        }
    }

    let prices: Vec<Decimal> =
        candidates.iter().map(|candidate| candidate.converted_price).collect();
    let Some(reference) = reference_price(&prices) else {
        if !prices.is_empty() {
            return Err(EngineError::Overflow { operation: "reference price" });
        }
        let hint = match family {
            Some(family) if !family.accepts(&requested) => format!(
                "Los productos similares no tienen precios comparables por {requested}; prueba con {}.",
                family.suggested_unit
            ),
            _ => format!(
                "Ninguno de los {} productos similares tiene un precio comparable por {requested}.",
                matches.len()
            ),
        };
        return Err(EngineError::InsufficientData { hint });
    };

    let omitted = matches.len() - candidates.len();
    Ok(ReferenceComputation { unit, reference, candidates, omitted, unit_mismatch_corrected })
}

fn convert_candidates(
    matches: &[ScoredListing],
    unit: &CanonicalUnit,
    product_name: &str,
) -> Vec<MatchCandidate> {
    matches
        .iter()
        .filter(|scored| scored.listing.product.price > Decimal::ZERO)
        .filter_map(|scored| {
            let product = &scored.listing.product;
            let converted =
                convert_price(product.price, &product.unit, unit.as_str(), product_name).ok()?;
            (converted.price > Decimal::ZERO).then(|| MatchCandidate {
                product_id: product.id,
                name: product.name.clone(),
                original_price: product.price,
                original_unit: normalize_unit(&product.unit),
                converted_price: converted.price,
                converted_unit: converted.unit,
                conversion_applied: converted.applied,
                stock: product.stock,
                seller_name: scored.listing.seller_name.clone(),
                relevance: scored.relevance,
            })
        })
        .collect()
}
