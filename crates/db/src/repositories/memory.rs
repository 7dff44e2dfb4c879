use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use towdesk_core::domain::catalog::{
    BasePriceList, LocationSurchargeRule, ServiceCatalogItem, TenantId, TimeSurchargeRule,
};
use towdesk_core::domain::customer::{CustomerId, CustomerPricing, PriceItem};
use towdesk_core::domain::job::JobId;
use towdesk_core::pricing::breakdown::PriceBreakdown;

use super::{
    BreakdownRepository, CatalogRepository, CustomerPricingRepository, RepositoryError,
};

/// In-memory doubles for form-session tests that do not need sqlite.

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    price_lists: RwLock<HashMap<String, BasePriceList>>,
    time_rules: RwLock<HashMap<String, Vec<TimeSurchargeRule>>>,
    location_rules: RwLock<HashMap<String, Vec<LocationSurchargeRule>>>,
    service_items: RwLock<HashMap<String, Vec<ServiceCatalogItem>>>,
    price_items: RwLock<HashMap<String, Vec<PriceItem>>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_price_list(&self, list: BasePriceList) {
        self.price_lists
            .write()
            .expect("price list lock")
            .insert(list.tenant_id.0.clone(), list);
    }

    pub fn put_time_rules(&self, tenant: &TenantId, rules: Vec<TimeSurchargeRule>) {
        self.time_rules.write().expect("time rule lock").insert(tenant.0.clone(), rules);
    }

    pub fn put_location_rules(&self, tenant: &TenantId, rules: Vec<LocationSurchargeRule>) {
        self.location_rules.write().expect("location rule lock").insert(tenant.0.clone(), rules);
    }

    pub fn put_service_items(&self, tenant: &TenantId, items: Vec<ServiceCatalogItem>) {
        self.service_items.write().expect("service item lock").insert(tenant.0.clone(), items);
    }

    pub fn put_price_items(&self, tenant: &TenantId, items: Vec<PriceItem>) {
        self.price_items.write().expect("price item lock").insert(tenant.0.clone(), items);
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn base_price_list(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<BasePriceList>, RepositoryError> {
        Ok(self.price_lists.read().expect("price list lock").get(&tenant.0).cloned())
    }

    async fn time_surcharge_rules(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<TimeSurchargeRule>, RepositoryError> {
        Ok(self
            .time_rules
            .read()
            .expect("time rule lock")
            .get(&tenant.0)
            .cloned()
            .unwrap_or_default())
    }

    async fn location_surcharge_rules(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<LocationSurchargeRule>, RepositoryError> {
        Ok(self
            .location_rules
            .read()
            .expect("location rule lock")
            .get(&tenant.0)
            .cloned()
            .unwrap_or_default())
    }

    async fn service_catalog(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<ServiceCatalogItem>, RepositoryError> {
        Ok(self
            .service_items
            .read()
            .expect("service item lock")
            .get(&tenant.0)
            .cloned()
            .unwrap_or_default())
    }

    async fn price_items(&self, tenant: &TenantId) -> Result<Vec<PriceItem>, RepositoryError> {
        Ok(self
            .price_items
            .read()
            .expect("price item lock")
            .get(&tenant.0)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerPricingRepository {
    pricing: RwLock<HashMap<CustomerId, CustomerPricing>>,
}

impl InMemoryCustomerPricingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, pricing: CustomerPricing) {
        self.pricing.write().expect("pricing lock").insert(pricing.customer_id.clone(), pricing);
    }
}

#[async_trait]
impl CustomerPricingRepository for InMemoryCustomerPricingRepository {
    async fn find_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<CustomerPricing>, RepositoryError> {
        Ok(self.pricing.read().expect("pricing lock").get(customer).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryBreakdownRepository {
    breakdowns: RwLock<HashMap<JobId, PriceBreakdown>>,
}

impl InMemoryBreakdownRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BreakdownRepository for InMemoryBreakdownRepository {
    async fn save(
        &self,
        _tenant: &TenantId,
        job_id: &JobId,
        breakdown: &PriceBreakdown,
    ) -> Result<(), RepositoryError> {
        self.breakdowns
            .write()
            .expect("breakdown lock")
            .insert(job_id.clone(), breakdown.clone());
        Ok(())
    }

    async fn find_for_job(
        &self,
        job_id: &JobId,
    ) -> Result<Option<PriceBreakdown>, RepositoryError> {
        Ok(self.breakdowns.read().expect("breakdown lock").get(job_id).cloned())
    }
}
