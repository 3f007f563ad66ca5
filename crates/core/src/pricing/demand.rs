//! Recency-weighted demand estimate.
//!
//! The three windows overlap: a sale from yesterday counts in the 7, 14 and
//! 30 day sums alike. Historical estimates were produced this way and stay
//! comparable only if the overlap is kept.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::store::{OrderHistoryStore, StoreError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemandWindow {
    pub days: i64,
    pub weight: Decimal,
}

pub const DEMAND_WINDOWS: [DemandWindow; 3] = [
    DemandWindow { days: 7, weight: Decimal::ONE },
    DemandWindow { days: 14, weight: Decimal::from_parts(7, 0, 0, false, 1) },
    DemandWindow { days: 30, weight: Decimal::from_parts(4, 0, 0, false, 1) },
];

pub const HIGH_DEMAND_THRESHOLD: i64 = 50;
pub const MEDIUM_DEMAND_THRESHOLD: i64 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DemandLevel {
    Alta,
    Media,
    Baja,
}

impl DemandLevel {
    pub fn classify(weighted_total: i64) -> Self {
        if weighted_total >= HIGH_DEMAND_THRESHOLD {
            Self::Alta
        } else if weighted_total >= MEDIUM_DEMAND_THRESHOLD {
            Self::Media
        } else {
            Self::Baja
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alta => "ALTA",
            Self::Media => "MEDIA",
            Self::Baja => "BAJA",
        }
    }

    /// Fraction added to the base price by the suggester.
    pub fn price_adjustment(self) -> Decimal {
        match self {
            Self::Alta => Decimal::new(8, 2),
            Self::Media => Decimal::new(3, 2),
            Self::Baja => Decimal::new(-5, 2),
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            Self::Alta => "Se recomienda aumentar el stock para evitar quiebres.",
            Self::Media => "La demanda es estable. Mantén tu stock actual.",
            Self::Baja => "Considera una promoción para rotar este producto.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSample {
    pub days: i64,
    pub weight: Decimal,
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandEstimate {
    pub product_id: ProductId,
    pub weighted_total: i64,
    pub level: DemandLevel,
    pub advice: String,
    pub windows: Vec<WindowSample>,
}

/// Sum of window quantities times their weights, truncated toward zero.
pub fn weighted_total(samples: &[WindowSample]) -> i64 {
    let total: Decimal =
        samples.iter().map(|sample| Decimal::from(sample.quantity) * sample.weight).sum();
    total.trunc().to_i64().unwrap_or(i64::MAX)
}

pub async fn estimate_demand_at<S>(
    store: &S,
    product_id: ProductId,
    now: DateTime<Utc>,
) -> Result<DemandEstimate, StoreError>
where
    S: OrderHistoryStore + ?Sized,
{
    let mut windows = Vec::with_capacity(DEMAND_WINDOWS.len());
    for window in DEMAND_WINDOWS {
        let since = now - Duration::days(window.days);
        let quantity = store.quantity_sold_since(product_id, since).await?;
        windows.push(WindowSample { days: window.days, weight: window.weight, quantity });
    }

    let weighted_total = weighted_total(&windows);
    let level = DemandLevel::classify(weighted_total);
    Ok(DemandEstimate {
        product_id,
        weighted_total,
        level,
        advice: level.advice().to_owned(),
        windows,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{estimate_demand_at, weighted_total, DemandLevel, WindowSample, DEMAND_WINDOWS};
    use crate::domain::order::{ConsumerId, PurchaseSummary};
    use crate::domain::product::ProductId;
    use crate::store::{OrderHistoryStore, StoreError};

    struct SalesLog {
        sales: Vec<(DateTime<Utc>, i64)>,
    }

    #[async_trait]
    impl OrderHistoryStore for SalesLog {
        async fn quantity_sold_since(
            &self,
            _product_id: ProductId,
            since: DateTime<Utc>,
        ) -> Result<i64, StoreError> {
            Ok(self.sales.iter().filter(|(at, _)| *at >= since).map(|(_, qty)| qty).sum())
        }

        async fn recent_unit_prices(
            &self,
            _product_id: ProductId,
            _limit: u32,
        ) -> Result<Vec<Decimal>, StoreError> {
            Ok(Vec::new())
        }

        async fn consumer_purchases(
            &self,
            _consumer_id: ConsumerId,
            _limit: u32,
        ) -> Result<Vec<PurchaseSummary>, StoreError> {
            Ok(Vec::new())
        }

        async fn popular_products(&self, _limit: u32) -> Result<Vec<PurchaseSummary>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn window_weights_decay() {
        let weights: Vec<String> =
            DEMAND_WINDOWS.iter().map(|window| window.weight.to_string()).collect();
        assert_eq!(weights, vec!["1", "0.7", "0.4"]);
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(DemandLevel::classify(50), DemandLevel::Alta);
        assert_eq!(DemandLevel::classify(49), DemandLevel::Media);
        assert_eq!(DemandLevel::classify(20), DemandLevel::Media);
        assert_eq!(DemandLevel::classify(19), DemandLevel::Baja);
        assert_eq!(DemandLevel::classify(0), DemandLevel::Baja);
    }

    #[test]
    fn weighted_total_truncates() {
        let samples = [
            WindowSample { days: 7, weight: Decimal::ONE, quantity: 1 },
            WindowSample { days: 14, weight: Decimal::new(7, 1), quantity: 1 },
            WindowSample { days: 30, weight: Decimal::new(4, 1), quantity: 1 },
        ];
        assert_eq!(weighted_total(&samples), 2);
    }

    #[tokio::test]
    async fn recent_sale_counts_in_every_window() {
        let log = SalesLog { sales: vec![(now() - Duration::days(2), 10)] };
        let estimate = estimate_demand_at(&log, ProductId(1), now()).await.expect("estimate");

        assert_eq!(estimate.weighted_total, 21);
        let quantities: Vec<i64> = estimate.windows.iter().map(|w| w.quantity).collect();
        assert_eq!(quantities, vec![10, 10, 10]);
        assert_eq!(estimate.level, DemandLevel::Media);
    }

    #[tokio::test]
    async fn older_sales_only_reach_the_wide_windows() {
        let log = SalesLog {
            sales: vec![(now() - Duration::days(10), 20), (now() - Duration::days(20), 50)],
        };
        let estimate = estimate_demand_at(&log, ProductId(1), now()).await.expect("estimate");

        // 0 * 1.0 + 20 * 0.7 + 70 * 0.4
        assert_eq!(estimate.weighted_total, 42);
        assert_eq!(estimate.level, DemandLevel::Media);
        assert_eq!(estimate.advice, DemandLevel::Media.advice());
    }

    #[tokio::test]
    async fn no_sales_is_low_demand() {
        let log = SalesLog { sales: Vec::new() };
        let estimate = estimate_demand_at(&log, ProductId(7), now()).await.expect("estimate");

        assert_eq!(estimate.weighted_total, 0);
        assert_eq!(estimate.level, DemandLevel::Baja);
        assert_eq!(serde_json::to_value(estimate.level).expect("json"), "BAJA");
    }
}
