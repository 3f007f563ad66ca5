pub mod connection;
pub mod fixtures;
pub mod repositories;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{install_schema, DemoDataset, SeedSummary};
pub use repositories::{InMemoryMarketplaceStore, RepositoryError, SqlMarketplaceStore};
