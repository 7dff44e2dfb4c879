use sqlx::Executor;

use crate::repositories::RepositoryError;
use crate::DbPool;

/// Deterministic demo catalog for local runs and smoke checks.
pub struct DemoCatalog;

#[derive(Clone, Debug)]
pub struct SeedVerification {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

const EXPECTED_COUNTS: &[(&str, &str, i64)] = &[
    ("base-price-list", "SELECT COUNT(*) FROM base_price_list WHERE tenant_id = 'demo'", 1),
    ("base-prices", "SELECT COUNT(*) FROM base_price WHERE tenant_id = 'demo'", 4),
    ("time-rules", "SELECT COUNT(*) FROM time_surcharge_rule WHERE tenant_id = 'demo'", 3),
    ("location-rules", "SELECT COUNT(*) FROM location_surcharge_rule WHERE tenant_id = 'demo'", 2),
    ("service-items", "SELECT COUNT(*) FROM service_catalog_item WHERE tenant_id = 'demo'", 3),
    ("price-items", "SELECT COUNT(*) FROM price_item WHERE tenant_id = 'demo'", 2),
    ("customer-pricing", "SELECT COUNT(*) FROM customer_pricing WHERE tenant_id = 'demo'", 1),
];

impl DemoCatalog {
    pub const SQL: &'static str = include_str!("../../../config/fixtures/demo_catalog.sql");

    pub const TENANT: &'static str = "demo";

    pub async fn load(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::raw_sql(Self::SQL)).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn verify(pool: &DbPool) -> Result<SeedVerification, RepositoryError> {
        let mut checks = Vec::with_capacity(EXPECTED_COUNTS.len());

        for (name, query, expected) in EXPECTED_COUNTS {
            let count: i64 = sqlx::query_scalar(query).fetch_one(pool).await?;
            checks.push((*name, count == *expected));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(SeedVerification { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use towdesk_core::domain::catalog::TenantId;

    use super::DemoCatalog;
    use crate::repositories::{CatalogRepository, SqlCatalogRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn demo_catalog_loads_verifies_and_prices() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");

        DemoCatalog::load(&pool).await.expect("load fixtures");
        let verification = DemoCatalog::verify(&pool).await.expect("verify fixtures");
        assert!(
            verification.all_present,
            "missing demo fixtures: {:?}",
            verification
                .checks
                .iter()
                .filter(|(_, passed)| !passed)
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
        );

        let repo = SqlCatalogRepository::new(pool.clone());
        let list = repo
            .base_price_list(&TenantId(DemoCatalog::TENANT.to_string()))
            .await
            .expect("query")
            .expect("list present");
        assert_eq!(list.minimum_price, Decimal::new(250, 0));
        assert_eq!(list.base_prices.len(), 4);

        pool.close().await;
    }

    #[tokio::test]
    async fn loading_twice_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");

        DemoCatalog::load(&pool).await.expect("first load");
        DemoCatalog::load(&pool).await.expect("second load");

        let verification = DemoCatalog::verify(&pool).await.expect("verify");
        assert!(verification.all_present);

        pool.close().await;
    }
}
