use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use mercado_core::domain::order::{ConsumerId, PurchaseSummary};
use mercado_core::domain::product::{CatalogListing, Product, ProductId, ProductState, SellerId};
use mercado_core::pricing::keywords::name_matches_any;
use mercado_core::store::{CatalogStore, OrderHistoryStore, StoreError};

use super::RepositoryError;
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "p.id, p.name, CAST(p.price AS TEXT) AS price_text, p.unit, \
                               p.stock, p.state, p.seller_id";

/// Legacy rows carry the Spanish spellings.
const LISTED: &str = "UPPER(TRIM(p.state)) IN ('ACTIVE', 'AVAILABLE', 'ACTIVO', 'DISPONIBLE')";

/// Read-only view of the marketplace tables. Every call checks a connection
/// out of the pool for its own queries.
pub struct SqlMarketplaceStore {
    pool: DbPool,
}

impl SqlMarketplaceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn db_error(error: sqlx::Error) -> StoreError {
        RepositoryError::from(error).into()
    }
}

#[async_trait]
impl CatalogStore for SqlMarketplaceStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::db_error)?;

        Ok(row.map(|value| product_from_row(&value)).transpose()?)
    }

    async fn search_listings(
        &self,
        keywords: &[String],
        limit: u32,
    ) -> Result<Vec<CatalogListing>, StoreError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite's LOWER only folds ASCII, so names are matched in Rust.
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, s.display_name AS seller_name
            FROM products p
            LEFT JOIN sellers s ON s.id = p.seller_id
            WHERE {LISTED}
            ORDER BY p.id
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        let listings = rows.iter().map(listing_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(listings
            .into_iter()
            .filter(|listing| name_matches_any(&listing.product.name, keywords))
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl OrderHistoryStore for SqlMarketplaceStore {
    async fn quantity_sold_since(
        &self,
        product_id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let quantity: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(ol.quantity), 0)
            FROM order_lines ol
            JOIN orders o ON o.id = ol.order_id
            WHERE ol.product_id = ?1 AND o.placed_at >= ?2
            "#,
        )
        .bind(product_id.0)
        .bind(since.to_rfc3339_opts(SecondsFormat::Secs, true))
        .fetch_one(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Ok(quantity)
    }

    async fn recent_unit_prices(
        &self,
        product_id: ProductId,
        limit: u32,
    ) -> Result<Vec<Decimal>, StoreError> {
        let prices: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT CAST(ol.unit_price AS TEXT)
            FROM order_lines ol
            JOIN orders o ON o.id = ol.order_id
            WHERE ol.product_id = ?1
            ORDER BY o.placed_at DESC, ol.id DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Ok(prices
            .iter()
            .map(|text| decimal_from_text("unit_price", text))
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn consumer_purchases(
        &self,
        consumer_id: ConsumerId,
        limit: u32,
    ) -> Result<Vec<PurchaseSummary>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT p.id AS product_id, p.name,
                   COUNT(ol.id) AS purchase_count,
                   MAX(o.placed_at) AS last_purchased_at
            FROM order_lines ol
            JOIN orders o ON o.id = ol.order_id
            JOIN products p ON p.id = ol.product_id
            WHERE o.consumer_id = ?1 AND p.stock > 0 AND {LISTED}
            GROUP BY p.id, p.name
            ORDER BY last_purchased_at DESC, purchase_count DESC, p.id
            LIMIT ?2
            "#
        ))
        .bind(consumer_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Ok(rows.iter().map(summary_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn popular_products(&self, limit: u32) -> Result<Vec<PurchaseSummary>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT p.id AS product_id, p.name,
                   COUNT(ol.id) AS purchase_count,
                   MAX(o.placed_at) AS last_purchased_at
            FROM order_lines ol
            JOIN orders o ON o.id = ol.order_id
            JOIN products p ON p.id = ol.product_id
            WHERE p.stock > 0 AND {LISTED}
            GROUP BY p.id, p.name
            ORDER BY purchase_count DESC, p.id
            LIMIT ?1
            "#
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Ok(rows.iter().map(summary_from_row).collect::<Result<Vec<_>, _>>()?)
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let price_text: String = column(row, "price_text")?;
    let state: String = column(row, "state")?;

    Ok(Product {
        id: ProductId(column(row, "id")?),
        name: column(row, "name")?,
        price: decimal_from_text("price", &price_text)?,
        unit: column(row, "unit")?,
        stock: column(row, "stock")?,
        state: ProductState::parse(&state),
        seller_id: SellerId(column(row, "seller_id")?),
    })
}

fn listing_from_row(row: &SqliteRow) -> Result<CatalogListing, RepositoryError> {
    Ok(CatalogListing { product: product_from_row(row)?, seller_name: column(row, "seller_name")? })
}

fn summary_from_row(row: &SqliteRow) -> Result<PurchaseSummary, RepositoryError> {
    let last_purchased_at: Option<String> = column(row, "last_purchased_at")?;

    Ok(PurchaseSummary {
        product_id: ProductId(column(row, "product_id")?),
        name: column(row, "name")?,
        purchase_count: column(row, "purchase_count")?,
        last_purchased_at: last_purchased_at
            .as_deref()
            .map(|value| timestamp_from_text("placed_at", value))
            .transpose()?,
    })
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|error| RepositoryError::Decode(format!("{name}: {error}")))
}

fn decimal_from_text(column: &str, value: &str) -> Result<Decimal, RepositoryError> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)).map_err(|error| {
        RepositoryError::Decode(format!("{column} `{value}` is not a decimal: {error}"))
    })
}

fn timestamp_from_text(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{column} `{value}`: {error}")))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use mercado_core::domain::order::ConsumerId;
    use mercado_core::domain::product::{ProductId, ProductState};
    use mercado_core::store::{CatalogStore, OrderHistoryStore};

    use super::{decimal_from_text, SqlMarketplaceStore};
    use crate::connect_with_settings;
    use crate::fixtures::DemoDataset;

    async fn demo_store() -> SqlMarketplaceStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        DemoDataset::load(&pool).await.expect("demo data");
        SqlMarketplaceStore::new(pool)
    }

    fn keywords(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[tokio::test]
    async fn find_product_decodes_prices_and_legacy_states() {
        let store = demo_store().await;

        let eggs = store.find_product(ProductId(3)).await.expect("query").expect("product");
        assert_eq!(eggs.name, "Huevos orgánicos");
        assert_eq!(eggs.price, Decimal::new(16, 1));
        assert_eq!(eggs.unit, "media docena");
        assert_eq!(eggs.state, ProductState::Available);

        let dozen = store.find_product(ProductId(2)).await.expect("query").expect("product");
        assert_eq!(dozen.price, Decimal::new(3, 0));

        assert!(store.find_product(ProductId(404)).await.expect("query").is_none());
    }

    #[tokio::test]
    async fn search_matches_any_keyword_among_listed_products() {
        let store = demo_store().await;

        let listings = store.search_listings(&keywords(&["huevos"]), 20).await.expect("search");
        let ids = listings.iter().map(|listing| listing.product.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(listings[1].seller_name.as_deref(), Some("Doña Rosa"));

        let either =
            store.search_listings(&keywords(&["leche", "arroz"]), 3).await.expect("search");
        let ids = either.iter().map(|listing| listing.product.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn search_ignores_accents_in_catalog_names() {
        let store = demo_store().await;

        let plain = store.search_listings(&keywords(&["organicos"]), 20).await.expect("search");
        let ids = plain.iter().map(|listing| listing.product.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![3]);

        let accented =
            store.search_listings(&keywords(&["orgánicos"]), 20).await.expect("search");
        assert_eq!(accented.len(), 1);

        let tomato = store.search_listings(&keywords(&["rinon"]), 20).await.expect("search");
        assert!(tomato.is_empty(), "paused products stay hidden");
    }

    #[tokio::test]
    async fn search_limit_applies_after_name_matching() {
        let store = demo_store().await;

        let listings =
            store.search_listings(&keywords(&["ARROZ", "queso"]), 2).await.expect("search");
        let ids = listings.iter().map(|listing| listing.product.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![6, 7]);
    }

    #[tokio::test]
    async fn search_skips_paused_products_and_empty_keyword_sets() {
        let store = demo_store().await;

        let paused = store.search_listings(&keywords(&["tomate"]), 20).await.expect("search");
        assert!(paused.is_empty());
        assert!(store.search_listings(&[], 20).await.expect("search").is_empty());
    }

    #[tokio::test]
    async fn quantity_sold_since_respects_window_start() {
        let store = demo_store().await;
        let now = Utc::now();

        let week = store.quantity_sold_since(ProductId(1), now - Duration::days(7)).await;
        let fortnight = store.quantity_sold_since(ProductId(1), now - Duration::days(14)).await;
        let month = store.quantity_sold_since(ProductId(1), now - Duration::days(30)).await;

        assert_eq!(week.expect("week"), 18);
        assert_eq!(fortnight.expect("fortnight"), 28);
        assert_eq!(month.expect("month"), 52);
        assert_eq!(
            store.quantity_sold_since(ProductId(7), now - Duration::days(30)).await.expect("none"),
            0
        );
    }

    #[tokio::test]
    async fn recent_unit_prices_are_most_recent_first() {
        let store = demo_store().await;

        let prices = store.recent_unit_prices(ProductId(1), 3).await.expect("prices");
        assert_eq!(prices, vec![Decimal::new(25, 2), Decimal::new(24, 2), Decimal::new(22, 2)]);
    }

    #[tokio::test]
    async fn consumer_purchases_order_by_recency_then_frequency() {
        let store = demo_store().await;

        let purchases = store.consumer_purchases(ConsumerId(1), 8).await.expect("purchases");
        let ids = purchases.iter().map(|summary| summary.product_id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 4, 8]);
        assert_eq!(purchases[0].purchase_count, 2);
        assert!(purchases[0].last_purchased_at.is_some());

        // Pan de yuca is out of stock.
        let second = store.consumer_purchases(ConsumerId(2), 8).await.expect("purchases");
        assert!(second.iter().all(|summary| summary.product_id != ProductId(9)));

        assert!(store.consumer_purchases(ConsumerId(99), 8).await.expect("none").is_empty());
    }

    #[tokio::test]
    async fn popular_products_rank_by_order_lines() {
        let store = demo_store().await;

        let popular = store.popular_products(3).await.expect("popular");
        let ids = popular.iter().map(|summary| summary.product_id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 4, 6]);
        assert_eq!(popular[0].purchase_count, 5);
    }

    #[test]
    fn decimal_decoding_accepts_sqlite_real_renderings() {
        assert_eq!(decimal_from_text("price", "1.1").expect("plain"), Decimal::new(11, 1));
        assert_eq!(decimal_from_text("price", "1.5e-05").expect("scientific"), Decimal::new(15, 6));
        assert!(decimal_from_text("price", "abc").is_err());
    }
}
