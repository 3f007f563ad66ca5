//! Read-only contracts for the relational store the engine queries.
//!
//! Implementations live in `mercado-db`. The engine never writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::order::{ConsumerId, PurchaseSummary};
use crate::domain::product::{CatalogListing, Product, ProductId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Listed products whose name contains any of `keywords`, in catalog
    /// order, at most `limit` rows. Both sides compare in
    /// [`normalize_text`](crate::pricing::keywords::normalize_text) form, so
    /// case and accents never decide a match.
    async fn search_listings(
        &self,
        keywords: &[String],
        limit: u32,
    ) -> Result<Vec<CatalogListing>, StoreError>;
}

#[async_trait]
pub trait OrderHistoryStore: Send + Sync {
    /// Sum of order-line quantities for orders placed at or after `since`.
    async fn quantity_sold_since(
        &self,
        product_id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    /// Unit prices of the latest order lines, most recent first.
    async fn recent_unit_prices(
        &self,
        product_id: ProductId,
        limit: u32,
    ) -> Result<Vec<Decimal>, StoreError>;

    /// Listed, in-stock products the consumer bought, by latest purchase then frequency.
    async fn consumer_purchases(
        &self,
        consumer_id: ConsumerId,
        limit: u32,
    ) -> Result<Vec<PurchaseSummary>, StoreError>;

    /// Listed, in-stock products by number of order lines.
    async fn popular_products(&self, limit: u32) -> Result<Vec<PurchaseSummary>, StoreError>;
}

/// Everything the pricing engine reads.
pub trait MarketplaceStore: CatalogStore + OrderHistoryStore {}

impl<T: CatalogStore + OrderHistoryStore> MarketplaceStore for T {}
