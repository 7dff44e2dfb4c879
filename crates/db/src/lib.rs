pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, ping, DbPool};
pub use fixtures::{DemoCatalog, SeedVerification};
pub use repositories::{
    BreakdownRepository, CatalogRepository, CustomerPricingRepository, RepositoryError,
    SqlBreakdownRepository, SqlCatalogRepository, SqlCustomerPricingRepository,
};
