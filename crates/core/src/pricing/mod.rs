//! Pricing and demand heuristics over the marketplace store.
//!
//! [`PricingEngine`] is the entry point used by the CLI and any other caller.
//! It is stateless apart from its configuration; every operation reads a fresh
//! snapshot through the store.

pub mod conversion;
pub mod demand;
pub mod families;
pub mod keywords;
pub mod market;
pub mod matcher;
pub mod recommender;
pub mod reference;
pub mod suggestion;
pub mod units;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::config::PricingConfig;
use crate::domain::order::ConsumerId;
use crate::domain::product::ProductId;
use crate::errors::EngineError;
use crate::store::MarketplaceStore;

use self::conversion::ConvertedPrice;
use self::demand::DemandEstimate;
use self::market::{MarketPriceReport, MarketPriceRequest};
use self::recommender::ProductRecommendations;
use self::suggestion::PriceSuggestion;

pub struct PricingEngine<S> {
    store: S,
    config: PricingConfig,
}

impl<S> PricingEngine<S>
where
    S: MarketplaceStore,
{
    pub fn new(store: S, config: PricingConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub async fn estimate_demand(
        &self,
        product_id: ProductId,
    ) -> Result<DemandEstimate, EngineError> {
        self.estimate_demand_at(product_id, Utc::now()).await
    }

    pub async fn estimate_demand_at(
        &self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<DemandEstimate, EngineError> {
        info!(event_name = "pricing.demand.start", product_id = product_id.0, "estimating demand");

        let result = self.known_product_demand(product_id, now).await;

        match &result {
            Ok(estimate) => info!(
                event_name = "pricing.demand.completed",
                product_id = product_id.0,
                weighted_total = estimate.weighted_total,
                level = estimate.level.as_str(),
                "demand estimated"
            ),
            Err(error) => log_failure("pricing.demand.failed", error),
        }
        result
    }

    async fn known_product_demand(
        &self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<DemandEstimate, EngineError> {
        if self.store.find_product(product_id).await?.is_none() {
            return Err(EngineError::NotFound { subject: format!("el producto {product_id}") });
        }
        Ok(demand::estimate_demand_at(&self.store, product_id, now).await?)
    }

    pub async fn suggest_price(
        &self,
        product_id: ProductId,
    ) -> Result<PriceSuggestion, EngineError> {
        self.suggest_price_at(product_id, Utc::now()).await
    }

    pub async fn suggest_price_at(
        &self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<PriceSuggestion, EngineError> {
        info!(event_name = "pricing.suggest.start", product_id = product_id.0, "suggesting price");

        let result = suggestion::suggest_price_at(
            &self.store,
            product_id,
            self.config.price_history_limit,
            now,
        )
        .await;

        match &result {
            Ok(suggestion) => info!(
                event_name = "pricing.suggest.completed",
                product_id = product_id.0,
                observations = suggestion.observations,
                base_price = %suggestion.base_price,
                recommended_price = %suggestion.recommended_price,
                demand_level = suggestion.demand_level.as_str(),
                "price suggested"
            ),
            Err(error) => log_failure("pricing.suggest.failed", error),
        }
        result
    }

    /// Always yields a report; failures come back with `found = false`.
    pub async fn recommend_market_price(&self, request: &MarketPriceRequest) -> MarketPriceReport {
        info!(
            event_name = "pricing.market.start",
            query = %request.name,
            unit = %request.unit,
            proposed_price = %request.proposed_price,
            "comparing against market"
        );

        match market::market_report(&self.store, request, self.config.candidate_limit).await {
            Ok(report) => {
                info!(
                    event_name = "pricing.market.completed",
                    query = %request.name,
                    classification = report.classification.as_str(),
                    converted = report.converted_count,
                    omitted = report.omitted_count,
                    unit_mismatch_corrected = report.unit_mismatch_corrected,
                    "market comparison finished"
                );
                report
            }
            Err(error) => {
                log_failure("pricing.market.failed", &error);
                MarketPriceReport::from_error(request, &error)
            }
        }
    }

    pub async fn recommend_products(
        &self,
        consumer_id: ConsumerId,
    ) -> Result<ProductRecommendations, EngineError> {
        info!(
            event_name = "pricing.recommend.start",
            consumer_id = consumer_id.0,
            "building recommendations"
        );

        let limit = self.config.recommendation_limit;
        let result = recommender::recommend_products(&self.store, consumer_id, limit)
            .await
            .map_err(EngineError::from);

        match &result {
            Ok(recommendations) => info!(
                event_name = "pricing.recommend.completed",
                consumer_id = consumer_id.0,
                kind = ?recommendations.kind,
                items = recommendations.items.len(),
                "recommendations built"
            ),
            Err(error) => log_failure("pricing.recommend.failed", error),
        }
        result
    }
}

/// Price per `from_unit` expressed per `to_unit`, or why it cannot be.
pub fn convert_unit_price(
    price: Decimal,
    from_unit: &str,
    to_unit: &str,
    product_name: &str,
) -> Result<ConvertedPrice, EngineError> {
    if price <= Decimal::ZERO {
        return Err(EngineError::InsufficientData {
            hint: "El precio a convertir debe ser mayor que cero.".to_owned(),
        });
    }
    let converted = conversion::convert_price(price, from_unit, to_unit, product_name)?;
    debug!(
        event_name = "pricing.convert.completed",
        from_unit,
        to_unit = %converted.unit,
        applied = converted.applied,
        "price converted"
    );
    Ok(converted)
}

fn log_failure(event_name: &'static str, error: &EngineError) {
    match error {
        EngineError::UpstreamFailure(source) => warn!(
            event_name,
            error_class = error.error_class(),
            error = %source,
            "store access failed"
        ),
        EngineError::Overflow { operation } => error!(
            event_name,
            error_class = error.error_class(),
            operation,
            "decimal arithmetic overflowed"
        ),
        _ => info!(
            event_name,
            error_class = error.error_class(),
            error = %error,
            "operation finished without a result"
        ),
    }
}
