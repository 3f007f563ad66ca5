use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::EngineError;
use crate::pricing::demand::{estimate_demand_at, DemandLevel};
use crate::store::MarketplaceStore;

/// Observations needed before a trend is estimated.
pub const TREND_MIN_OBSERVATIONS: usize = 5;
pub const MIN_PRICE_FACTOR: Decimal = Decimal::from_parts(85, 0, 0, false, 2);
pub const MAX_PRICE_FACTOR: Decimal = Decimal::from_parts(120, 0, 0, false, 2);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    pub product_id: ProductId,
    pub recommended_price: Decimal,
    pub base_price: Decimal,
    pub trend_pct: Decimal,
    pub demand_level: DemandLevel,
    /// Order-line prices behind the base price; zero means the listed price was used.
    pub observations: usize,
}

/// Relative change from the oldest to the newest observation.
///
/// `observations` is most recent first, so the trend is
/// `(first - last) / last`. Fewer than [`TREND_MIN_OBSERVATIONS`] means no
/// trend; `None` only when the ratio overflows.
pub fn price_trend(observations: &[Decimal]) -> Option<Decimal> {
    match (observations.first(), observations.last()) {
        (Some(first), Some(last))
            if observations.len() >= TREND_MIN_OBSERVATIONS && *last > Decimal::ZERO =>
        {
            first.checked_sub(*last)?.checked_div(*last)
        }
        _ => Some(Decimal::ZERO),
    }
}

/// `base * (1 + trend + adjustment)` held within `[0.85, 1.20] * base`.
pub fn clamp_recommendation(
    base: Decimal,
    trend: Decimal,
    adjustment: Decimal,
) -> Option<Decimal> {
    let factor = Decimal::ONE.checked_add(trend)?.checked_add(adjustment)?;
    let floor = base.checked_mul(MIN_PRICE_FACTOR)?;
    let ceiling = base.checked_mul(MAX_PRICE_FACTOR)?;
    // base is positive, so an overflowing product lies past one of the bounds
    let raw = match base.checked_mul(factor) {
        Some(raw) => raw,
        None if factor.is_sign_negative() => floor,
        None => ceiling,
    };
    Some(raw.clamp(floor, ceiling))
}

pub async fn suggest_price_at<S>(
    store: &S,
    product_id: ProductId,
    history_limit: u32,
    now: DateTime<Utc>,
) -> Result<PriceSuggestion, EngineError>
where
    S: MarketplaceStore + ?Sized,
{
    let observations: Vec<Decimal> = store
        .recent_unit_prices(product_id, history_limit)
        .await?
        .into_iter()
        .filter(|price| *price > Decimal::ZERO)
        .collect();

    let (base, trend) = if observations.is_empty() {
        let product = store.find_product(product_id).await?.ok_or_else(|| {
            EngineError::NotFound { subject: format!("el producto {product_id}") }
        })?;
        (product.price, Decimal::ZERO)
    } else {
        let overflow = || EngineError::Overflow { operation: "price suggestion" };
        let total = observations
            .iter()
            .try_fold(Decimal::ZERO, |sum, price| sum.checked_add(*price))
            .ok_or_else(overflow)?;
        let base = total.checked_div(Decimal::from(observations.len())).ok_or_else(overflow)?;
        (base, price_trend(&observations).ok_or_else(overflow)?)
    };

    if base <= Decimal::ZERO {
        return Err(EngineError::InsufficientData {
            hint: format!("El producto {product_id} no tiene ventas ni un precio publicado válido."),
        });
    }

    let demand = estimate_demand_at(store, product_id, now).await?;
    let overflow = EngineError::Overflow { operation: "price suggestion" };
    let recommended = clamp_recommendation(base, trend, demand.level.price_adjustment())
        .ok_or(overflow.clone())?;
    let trend_pct = trend.checked_mul(Decimal::ONE_HUNDRED).ok_or(overflow)?;

    Ok(PriceSuggestion {
        product_id,
        recommended_price: recommended.round_dp(2),
        base_price: base.round_dp(2),
        trend_pct: trend_pct.round_dp(2),
        demand_level: demand.level,
        observations: observations.len(),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{clamp_recommendation, price_trend};

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    #[test]
    fn clamp_caps_runaway_trends() {
        let recommended = clamp_recommendation(Decimal::from(100), dec("0.5"), dec("0.08"));
        assert_eq!(recommended, Some(Decimal::from(120)));
    }

    #[test]
    fn clamp_floors_falling_prices() {
        let recommended = clamp_recommendation(Decimal::from(100), dec("-0.4"), dec("-0.05"));
        assert_eq!(recommended, Some(Decimal::from(85)));
    }

    #[test]
    fn moderate_adjustments_pass_through() {
        let recommended = clamp_recommendation(Decimal::from(100), dec("0.02"), dec("0.03"));
        assert_eq!(recommended, Some(Decimal::from(105)));
    }

    #[test]
    fn trend_needs_five_observations() {
        let four = [dec("12"), dec("11"), dec("10"), dec("10")];
        assert_eq!(price_trend(&four), Some(Decimal::ZERO));

        let five = [dec("12"), dec("11"), dec("10"), dec("10"), dec("10")];
        assert_eq!(price_trend(&five), Some(dec("0.2")));
    }

    #[test]
    fn trend_uses_most_recent_first() {
        let falling = [dec("8"), dec("9"), dec("9"), dec("10"), dec("10")];
        assert_eq!(price_trend(&falling), Some(dec("-0.2")));
    }

    #[test]
    fn extreme_values_stay_in_range() {
        let spike = [Decimal::MAX, dec("10"), dec("10"), dec("10"), dec("0.0001")];
        assert_eq!(price_trend(&spike), None);

        let huge_trend = dec("1000000000000000000000");
        let capped = clamp_recommendation(dec("1000000000"), huge_trend, dec("0.08"));
        assert_eq!(capped, Some(dec("1200000000")));

        assert_eq!(clamp_recommendation(Decimal::MAX, Decimal::ZERO, dec("0.08")), None);
    }
}
