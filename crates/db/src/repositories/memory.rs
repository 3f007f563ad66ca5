use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use mercado_core::domain::order::{ConsumerId, OrderId, OrderLine, PurchaseSummary};
use mercado_core::domain::product::{CatalogListing, Product, ProductId};
use mercado_core::pricing::keywords::name_matches_any;
use mercado_core::store::{CatalogStore, OrderHistoryStore, StoreError};

/// Marketplace held in memory, for tests and embedding.
#[derive(Default)]
pub struct InMemoryMarketplaceStore {
    listings: RwLock<BTreeMap<ProductId, CatalogListing>>,
    orders: RwLock<HashMap<OrderId, ConsumerId>>,
    lines: RwLock<Vec<OrderLine>>,
}

impl InMemoryMarketplaceStore {
    pub async fn insert_listing(&self, listing: CatalogListing) {
        let mut listings = self.listings.write().await;
        listings.insert(listing.product.id, listing);
    }

    pub async fn record_line(&self, consumer_id: ConsumerId, line: OrderLine) {
        self.orders.write().await.insert(line.order_id, consumer_id);
        self.lines.write().await.push(line);
    }

    async fn summaries<F>(&self, belongs: F) -> Vec<PurchaseSummary>
    where
        F: Fn(&OrderLine) -> bool,
    {
        let listings = self.listings.read().await;
        let lines = self.lines.read().await;

        let mut by_product: BTreeMap<ProductId, PurchaseSummary> = BTreeMap::new();
        for line in lines.iter().filter(|&line| belongs(line)) {
            let Some(listing) = listings.get(&line.product_id) else {
                continue;
            };
            if !recommendable(&listing.product) {
                continue;
            }
            let summary = by_product.entry(line.product_id).or_insert_with(|| PurchaseSummary {
                product_id: line.product_id,
                name: listing.product.name.clone(),
                purchase_count: 0,
                last_purchased_at: None,
            });
            summary.purchase_count += 1;
            summary.last_purchased_at = latest(summary.last_purchased_at, line.placed_at);
        }
        by_product.into_values().collect()
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryMarketplaceStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let listings = self.listings.read().await;
        Ok(listings.get(&id).map(|listing| listing.product.clone()))
    }

    async fn search_listings(
        &self,
        keywords: &[String],
        limit: u32,
    ) -> Result<Vec<CatalogListing>, StoreError> {
        let listings = self.listings.read().await;
        Ok(listings
            .values()
            .filter(|listing| listing.product.state.is_listed())
            .filter(|listing| name_matches_any(&listing.product.name, keywords))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl OrderHistoryStore for InMemoryMarketplaceStore {
    async fn quantity_sold_since(
        &self,
        product_id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let lines = self.lines.read().await;
        Ok(lines
            .iter()
            .filter(|line| line.product_id == product_id && line.placed_at >= since)
            .map(|line| line.quantity)
            .sum())
    }

    async fn recent_unit_prices(
        &self,
        product_id: ProductId,
        limit: u32,
    ) -> Result<Vec<Decimal>, StoreError> {
        let lines = self.lines.read().await;
        let mut matching = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.product_id == product_id)
            .collect::<Vec<_>>();
        matching.sort_by(|(left_seq, left), (right_seq, right)| {
            right.placed_at.cmp(&left.placed_at).then(right_seq.cmp(left_seq))
        });
        Ok(matching.into_iter().take(limit as usize).map(|(_, line)| line.unit_price).collect())
    }

    async fn consumer_purchases(
        &self,
        consumer_id: ConsumerId,
        limit: u32,
    ) -> Result<Vec<PurchaseSummary>, StoreError> {
        let orders = self.orders.read().await.clone();
        let mut summaries =
            self.summaries(|line| orders.get(&line.order_id) == Some(&consumer_id)).await;
        summaries.sort_by(|left, right| {
            right
                .last_purchased_at
                .cmp(&left.last_purchased_at)
                .then(right.purchase_count.cmp(&left.purchase_count))
                .then(left.product_id.cmp(&right.product_id))
        });
        summaries.truncate(limit as usize);
        Ok(summaries)
    }

    async fn popular_products(&self, limit: u32) -> Result<Vec<PurchaseSummary>, StoreError> {
        let mut summaries = self.summaries(|_| true).await;
        summaries.sort_by(|left, right| {
            right
                .purchase_count
                .cmp(&left.purchase_count)
                .then(left.product_id.cmp(&right.product_id))
        });
        summaries.truncate(limit as usize);
        Ok(summaries)
    }
}

fn recommendable(product: &Product) -> bool {
    product.state.is_listed() && product.stock > 0
}

fn latest(current: Option<DateTime<Utc>>, candidate: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(current.map_or(candidate, |value| value.max(candidate)))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use mercado_core::domain::order::{ConsumerId, OrderId, OrderLine};
    use mercado_core::domain::product::{CatalogListing, Product, ProductId, ProductState, SellerId};
    use mercado_core::pricing::PricingEngine;
    use mercado_core::store::{CatalogStore, OrderHistoryStore};
    use mercado_core::{config::PricingConfig, DemandLevel, MarketPriceRequest};

    use super::InMemoryMarketplaceStore;

    fn listing(id: i64, name: &str, price: Decimal, unit: &str, stock: i64) -> CatalogListing {
        CatalogListing {
            product: Product {
                id: ProductId(id),
                name: name.to_string(),
                price,
                unit: unit.to_string(),
                stock,
                state: ProductState::Active,
                seller_id: SellerId(1),
            },
            seller_name: Some("Granja".to_string()),
        }
    }

    fn line(order: i64, product: i64, quantity: i64, days_ago: i64) -> OrderLine {
        OrderLine {
            order_id: OrderId(order),
            product_id: ProductId(product),
            quantity,
            unit_price: Decimal::new(25, 2),
            placed_at: Utc::now() - Duration::days(days_ago),
        }
    }

    async fn store() -> InMemoryMarketplaceStore {
        let store = InMemoryMarketplaceStore::default();
        for entry in [
            listing(1, "Huevos de campo", Decimal::new(25, 2), "unidad", 100),
            listing(2, "Huevos criollos", Decimal::new(300, 2), "docena", 5),
            listing(3, "Pan de yuca", Decimal::new(50, 2), "unidad", 0),
        ] {
            store.insert_listing(entry).await;
        }
        store.record_line(ConsumerId(1), line(1, 1, 12, 2)).await;
        store.record_line(ConsumerId(1), line(1, 3, 2, 2)).await;
        store.record_line(ConsumerId(2), line(2, 1, 30, 20)).await;
        store.record_line(ConsumerId(2), line(2, 2, 1, 20)).await;
        store
    }

    #[tokio::test]
    async fn search_and_history_follow_the_store_contract() {
        let store = store().await;

        let found = store.search_listings(&["huevos".to_string()], 1).await.expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product.id, ProductId(1));

        let week = store.quantity_sold_since(ProductId(1), Utc::now() - Duration::days(7)).await;
        assert_eq!(week.expect("week"), 12);

        let purchases = store.consumer_purchases(ConsumerId(1), 8).await.expect("purchases");
        assert_eq!(purchases.len(), 1, "out-of-stock products are not recommended");

        let popular = store.popular_products(8).await.expect("popular");
        assert_eq!(popular[0].product_id, ProductId(1));
        assert_eq!(popular[0].purchase_count, 2);
    }

    #[tokio::test]
    async fn accented_names_match_plain_and_accented_queries() {
        let store = InMemoryMarketplaceStore::default();
        for entry in [
            listing(10, "Limón sutil", Decimal::new(120, 2), "kg", 40),
            listing(11, "Limón meyer", Decimal::new(140, 2), "kg", 15),
            listing(12, "Azúcar morena", Decimal::new(90, 2), "kg", 30),
        ] {
            store.insert_listing(entry).await;
        }
        let engine = PricingEngine::new(store, PricingConfig::default());

        for query in ["limón", "limon"] {
            let request = MarketPriceRequest::new(query, Decimal::new(13, 1)).with_unit("kg");
            let report = engine.recommend_market_price(&request).await;
            assert!(report.found, "{query}");
            assert_eq!(report.converted_count, 2, "{query}");
        }

        let sugar = engine
            .recommend_market_price(
                &MarketPriceRequest::new("azúcar", Decimal::new(90, 2)).with_unit("kg"),
            )
            .await;
        assert!(sugar.found);
        assert_eq!(sugar.reference_price, Some(Decimal::new(90, 2)));
    }

    #[tokio::test]
    async fn engine_runs_end_to_end_over_memory_store() {
        let engine = PricingEngine::new(store().await, PricingConfig::default());

        let demand = engine.estimate_demand(ProductId(1)).await.expect("demand");
        // 12 + 12 * 0.7 + 42 * 0.4 = 37.2
        assert_eq!(demand.weighted_total, 37);
        assert_eq!(demand.level, DemandLevel::Media);

        let report = engine
            .recommend_market_price(
                &MarketPriceRequest::new("huevos", Decimal::new(3, 0)).with_unit("docena"),
            )
            .await;
        assert!(report.found);
        assert_eq!(report.converted_count, 2);
        assert_eq!(report.reference_price, Some(Decimal::new(300, 2)));
    }
}
