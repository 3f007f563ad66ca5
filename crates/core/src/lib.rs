pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod store;

pub use domain::order::{ConsumerId, OrderId, OrderLine, PurchaseSummary};
pub use domain::product::{CatalogListing, Product, ProductId, ProductState, SellerId};
pub use errors::EngineError;
pub use pricing::conversion::{ConvertedPrice, NotConvertible};
pub use pricing::demand::{DemandEstimate, DemandLevel};
pub use pricing::market::{MarketPriceReport, MarketPriceRequest};
pub use pricing::recommender::{ProductRecommendations, RecommendationKind};
pub use pricing::reference::{PriceClassification, ReferenceMethod};
pub use pricing::suggestion::PriceSuggestion;
pub use pricing::units::{normalize_unit, CanonicalUnit, UnitClass};
pub use pricing::PricingEngine;
pub use store::{CatalogStore, MarketplaceStore, OrderHistoryStore, StoreError};
