use serde::{Deserialize, Serialize};

use crate::domain::order::{ConsumerId, PurchaseSummary};
use crate::domain::product::ProductId;
use crate::store::{OrderHistoryStore, StoreError};

pub const PERSONAL_REASON: &str = "Basado en tus compras recientes";
pub const POPULAR_REASON: &str = "Producto popular entre los usuarios";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Personalizado,
    Global,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    pub product_id: ProductId,
    pub name: String,
    pub score: i64,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecommendations {
    pub consumer_id: ConsumerId,
    pub kind: RecommendationKind,
    pub items: Vec<RecommendedProduct>,
}

/// The consumer's own purchases, or the catalog's best sellers when there are none.
pub async fn recommend_products<S>(
    store: &S,
    consumer_id: ConsumerId,
    limit: u32,
) -> Result<ProductRecommendations, StoreError>
where
    S: OrderHistoryStore + ?Sized,
{
    let personal = store.consumer_purchases(consumer_id, limit).await?;
    if !personal.is_empty() {
        return Ok(ProductRecommendations {
            consumer_id,
            kind: RecommendationKind::Personalizado,
            items: to_items(personal, PERSONAL_REASON),
        });
    }

    let popular = store.popular_products(limit).await?;
    Ok(ProductRecommendations {
        consumer_id,
        kind: RecommendationKind::Global,
        items: to_items(popular, POPULAR_REASON),
    })
}

fn to_items(summaries: Vec<PurchaseSummary>, reason: &str) -> Vec<RecommendedProduct> {
    summaries
        .into_iter()
        .map(|summary| RecommendedProduct {
            product_id: summary.product_id,
            name: summary.name,
            score: summary.purchase_count,
            reason: reason.to_owned(),
        })
        .collect()
}
