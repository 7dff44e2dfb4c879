use async_trait::async_trait;
use thiserror::Error;

use towdesk_core::domain::catalog::{
    BasePriceList, LocationSurchargeRule, ServiceCatalogItem, TenantId, TimeSurchargeRule,
};
use towdesk_core::domain::customer::{CustomerId, CustomerPricing, PriceItem};
use towdesk_core::domain::job::JobId;
use towdesk_core::pricing::breakdown::PriceBreakdown;

pub mod breakdown;
pub mod catalog;
pub mod customer_pricing;
pub mod memory;

pub use breakdown::SqlBreakdownRepository;
pub use catalog::SqlCatalogRepository;
pub use customer_pricing::SqlCustomerPricingRepository;
pub use memory::{
    InMemoryBreakdownRepository, InMemoryCatalogRepository, InMemoryCustomerPricingRepository,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Tenant rate catalogs, read-only for the duration of a form session.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn base_price_list(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<BasePriceList>, RepositoryError>;

    async fn time_surcharge_rules(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<TimeSurchargeRule>, RepositoryError>;

    async fn location_surcharge_rules(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<LocationSurchargeRule>, RepositoryError>;

    async fn service_catalog(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<ServiceCatalogItem>, RepositoryError>;

    async fn price_items(&self, tenant: &TenantId) -> Result<Vec<PriceItem>, RepositoryError>;
}

#[async_trait]
pub trait CustomerPricingRepository: Send + Sync {
    async fn find_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<CustomerPricing>, RepositoryError>;
}

/// Persisted breakdowns are mutated in place while a job is still editable;
/// the terminal-state freeze is enforced by the job layer before calling in.
#[async_trait]
pub trait BreakdownRepository: Send + Sync {
    async fn save(
        &self,
        tenant: &TenantId,
        job_id: &JobId,
        breakdown: &PriceBreakdown,
    ) -> Result<(), RepositoryError>;

    async fn find_for_job(
        &self,
        job_id: &JobId,
    ) -> Result<Option<PriceBreakdown>, RepositoryError>;
}
