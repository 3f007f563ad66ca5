use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerId(pub i64);

/// Lifecycle state of a listing. Legacy rows use the Spanish spellings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductState {
    Active,
    Available,
    Other(String),
}

impl ProductState {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" | "ACTIVO" => Self::Active,
            "AVAILABLE" | "DISPONIBLE" => Self::Available,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Available => "AVAILABLE",
            Self::Other(value) => value,
        }
    }

    pub fn is_listed(&self) -> bool {
        matches!(self, Self::Active | Self::Available)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub unit: String,
    pub stock: i64,
    pub state: ProductState,
    pub seller_id: SellerId,
}

/// A catalog row joined with the seller's display metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogListing {
    pub product: Product,
    pub seller_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::ProductState;

    #[test]
    fn product_state_accepts_legacy_spanish_labels() {
        assert_eq!(ProductState::parse("activo"), ProductState::Active);
        assert_eq!(ProductState::parse(" Disponible "), ProductState::Available);
        assert_eq!(ProductState::parse("AVAILABLE"), ProductState::Available);
        assert!(!ProductState::parse("PAUSADO").is_listed());
        assert_eq!(ProductState::parse("pausado").as_str(), "PAUSADO");
    }
}
