use serde::Serialize;
use tracing::info;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Tables the engine reads. Installed by `seed` and by tests; there is no
/// migration history behind it.
pub const SCHEMA_SQL: &str = include_str!("../../../config/fixtures/marketplace_schema.sql");

/// Children first, so deletes never trip foreign keys.
const SEEDED_TABLES: [&str; 4] = ["order_lines", "orders", "products", "sellers"];

pub async fn install_schema(pool: &DbPool) -> Result<(), RepositoryError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Deterministic demo catalog and order history.
///
/// Order timestamps are computed by SQLite at load time, so demand windows
/// observe the same distribution whenever the dataset is loaded:
/// - "Huevos de campo" sells in every window (weighted demand `ALTA`)
/// - "Tomate riñón" is paused and never matches a catalog search
/// - "Pan de yuca" is out of stock and never recommended
pub struct DemoDataset;

impl DemoDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_marketplace.sql");

    /// Install the schema if needed and replace every row with the demo data,
    /// in one transaction.
    pub async fn load(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
        install_schema(pool).await?;

        let mut tx = pool.begin().await?;
        for table in SEEDED_TABLES {
            sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
        }
        sqlx::raw_sql(Self::SQL).execute(&mut *tx).await?;
        tx.commit().await?;

        let summary = SeedSummary {
            sellers: count_rows(pool, "sellers").await?,
            products: count_rows(pool, "products").await?,
            orders: count_rows(pool, "orders").await?,
            order_lines: count_rows(pool, "order_lines").await?,
        };
        info!(
            event_name = "db.fixtures.demo_loaded",
            products = summary.products,
            order_lines = summary.order_lines,
            "demo marketplace loaded"
        );
        Ok(summary)
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for table in SEEDED_TABLES {
            sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub sellers: i64,
    pub products: i64,
    pub orders: i64,
    pub order_lines: i64,
}

async fn count_rows(pool: &DbPool, table: &str) -> Result<i64, RepositoryError> {
    let count: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {table}")).fetch_one(pool).await?;
    Ok(count)
}
