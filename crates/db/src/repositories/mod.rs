use thiserror::Error;

use mercado_core::store::StoreError;

pub mod marketplace;
pub mod memory;

pub use marketplace::SqlMarketplaceStore;
pub use memory::InMemoryMarketplaceStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => StoreError::Database(source.to_string()),
            RepositoryError::Decode(message) => StoreError::Decode(message),
        }
    }
}
