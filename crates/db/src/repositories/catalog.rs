use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveTime, Weekday};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use towdesk_core::domain::catalog::{
    ActiveWindow, BasePriceList, DepotLocation, LocationSurchargeRule, ServiceCatalogItem,
    ServiceItemId, ServicePriceType, SurchargeRuleId, TenantId, TimeSurchargeRule, VehicleClass,
};
use towdesk_core::domain::customer::{PriceItem, PriceItemId};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn base_price_list(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<BasePriceList>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT price_per_km, minimum_price, depot_address, depot_latitude, depot_longitude
            FROM base_price_list
            WHERE tenant_id = ?
            "#,
        )
        .bind(&tenant.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let price_per_km = parse_decimal("price_per_km", &row.try_get::<String, _>("price_per_km")?)?;
        let minimum_price =
            parse_decimal("minimum_price", &row.try_get::<String, _>("minimum_price")?)?;
        let depot = decode_depot(&row)?;

        let mut base_prices = BTreeMap::new();
        let price_rows =
            sqlx::query("SELECT vehicle_class, amount FROM base_price WHERE tenant_id = ?")
                .bind(&tenant.0)
                .fetch_all(&self.pool)
                .await?;
        for price_row in price_rows {
            let class_raw: String = price_row.try_get("vehicle_class")?;
            let class = VehicleClass::from_str(&class_raw)
                .map_err(RepositoryError::Decode)?;
            let amount = parse_decimal("amount", &price_row.try_get::<String, _>("amount")?)?;
            base_prices.insert(class, amount);
        }

        Ok(Some(BasePriceList {
            tenant_id: tenant.clone(),
            base_prices,
            price_per_km,
            minimum_price,
            depot,
        }))
    }

    async fn time_surcharge_rules(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<TimeSurchargeRule>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, label, days, start_time, end_time, on_holidays, percent
            FROM time_surcharge_rule
            WHERE tenant_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(&tenant.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TimeSurchargeRule {
                    id: SurchargeRuleId(row.try_get("id")?),
                    label: row.try_get("label")?,
                    window: ActiveWindow {
                        days: parse_days(&row.try_get::<String, _>("days")?)?,
                        start: parse_time("start_time", &row.try_get::<String, _>("start_time")?)?,
                        end: parse_time("end_time", &row.try_get::<String, _>("end_time")?)?,
                        on_holidays: row.try_get::<i64, _>("on_holidays")? != 0,
                    },
                    percent: parse_decimal("percent", &row.try_get::<String, _>("percent")?)?,
                })
            })
            .collect()
    }

    async fn location_surcharge_rules(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<LocationSurchargeRule>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, label, percent FROM location_surcharge_rule WHERE tenant_id = ? ORDER BY id ASC",
        )
        .bind(&tenant.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(LocationSurchargeRule {
                    id: SurchargeRuleId(row.try_get("id")?),
                    label: row.try_get("label")?,
                    percent: parse_decimal("percent", &row.try_get::<String, _>("percent")?)?,
                })
            })
            .collect()
    }

    async fn service_catalog(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<ServiceCatalogItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, label, price_type, unit_price FROM service_catalog_item WHERE tenant_id = ? ORDER BY id ASC",
        )
        .bind(&tenant.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ServiceCatalogItem {
                    id: ServiceItemId(row.try_get("id")?),
                    label: row.try_get("label")?,
                    price_type: parse_price_type(&row.try_get::<String, _>("price_type")?)?,
                    unit_price: parse_decimal(
                        "unit_price",
                        &row.try_get::<String, _>("unit_price")?,
                    )?,
                })
            })
            .collect()
    }

    async fn price_items(&self, tenant: &TenantId) -> Result<Vec<PriceItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, label, price FROM price_item WHERE tenant_id = ? ORDER BY id ASC",
        )
        .bind(&tenant.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(PriceItem {
                    id: PriceItemId(row.try_get("id")?),
                    label: row.try_get("label")?,
                    price: parse_decimal("price", &row.try_get::<String, _>("price")?)?,
                })
            })
            .collect()
    }
}

fn decode_depot(row: &SqliteRow) -> Result<Option<DepotLocation>, RepositoryError> {
    let address: Option<String> = row.try_get("depot_address")?;
    let Some(address) = address else {
        return Ok(None);
    };

    let latitude: Option<f64> = row.try_get("depot_latitude")?;
    let longitude: Option<f64> = row.try_get("depot_longitude")?;
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => {
            Ok(Some(DepotLocation { address, latitude, longitude }))
        }
        _ => Err(RepositoryError::Decode(
            "base_price_list depot address is missing coordinates".to_string(),
        )),
    }
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|error| RepositoryError::Decode(format!("invalid decimal for {field}: {error}")))
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, RepositoryError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|error| RepositoryError::Decode(format!("invalid time for {field}: {error}")))
}

fn parse_days(value: &str) -> Result<Vec<Weekday>, RepositoryError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.to_ascii_lowercase().as_str() {
            "mon" => Ok(Weekday::Mon),
            "tue" => Ok(Weekday::Tue),
            "wed" => Ok(Weekday::Wed),
            "thu" => Ok(Weekday::Thu),
            "fri" => Ok(Weekday::Fri),
            "sat" => Ok(Weekday::Sat),
            "sun" => Ok(Weekday::Sun),
            other => Err(RepositoryError::Decode(format!("invalid weekday token `{other}`"))),
        })
        .collect()
}

fn parse_price_type(value: &str) -> Result<ServicePriceType, RepositoryError> {
    match value {
        "flat" => Ok(ServicePriceType::Flat),
        "per_unit" => Ok(ServicePriceType::PerUnit),
        "manual" => Ok(ServicePriceType::Manual),
        other => Err(RepositoryError::Decode(format!("invalid service price type `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use towdesk_core::domain::catalog::{ServicePriceType, TenantId, VehicleClass};

    use super::SqlCatalogRepository;
    use crate::repositories::CatalogRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    async fn seed_tenant(pool: &DbPool, tenant: &str) {
        sqlx::query(
            "INSERT INTO base_price_list (tenant_id, price_per_km, minimum_price, depot_address, depot_latitude, depot_longitude)
             VALUES (?, '12', '250', 'Depot St 1, Haifa', 32.794, 34.9896)",
        )
        .bind(tenant)
        .execute(pool)
        .await
        .expect("insert price list");

        for (class, amount) in [("private", "180"), ("heavy", "540")] {
            sqlx::query("INSERT INTO base_price (tenant_id, vehicle_class, amount) VALUES (?, ?, ?)")
                .bind(tenant)
                .bind(class)
                .bind(amount)
                .execute(pool)
                .await
                .expect("insert base price");
        }

        sqlx::query(
            "INSERT INTO time_surcharge_rule (id, tenant_id, label, days, start_time, end_time, on_holidays, percent)
             VALUES ('night', ?, 'Night', 'mon,tue,wed,thu,fri', '22:00', '06:00', 1, '20')",
        )
        .bind(tenant)
        .execute(pool)
        .await
        .expect("insert time rule");

        sqlx::query(
            "INSERT INTO service_catalog_item (id, tenant_id, label, price_type, unit_price)
             VALUES ('winch', ?, 'Winch', 'per_unit', '50')",
        )
        .bind(tenant)
        .execute(pool)
        .await
        .expect("insert service item");
    }

    #[tokio::test]
    async fn loads_the_tenant_price_list_with_depot() {
        let pool = setup_pool().await;
        seed_tenant(&pool, "hagrar-north").await;

        let repo = SqlCatalogRepository::new(pool.clone());
        let list = repo
            .base_price_list(&TenantId("hagrar-north".to_string()))
            .await
            .expect("query")
            .expect("list present");

        assert_eq!(list.price_per_km, Decimal::new(12, 0));
        assert_eq!(list.minimum_price, Decimal::new(250, 0));
        assert_eq!(list.base_price_for(VehicleClass::Private), Some(Decimal::new(180, 0)));
        assert_eq!(list.base_price_for(VehicleClass::Machinery), None);
        assert!(list.depot.is_some());

        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_tenant_has_no_price_list() {
        let pool = setup_pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());

        let list = repo.base_price_list(&TenantId("nobody".to_string())).await.expect("query");
        assert!(list.is_none());

        pool.close().await;
    }

    #[tokio::test]
    async fn decodes_time_rule_windows() {
        let pool = setup_pool().await;
        seed_tenant(&pool, "hagrar-north").await;

        let repo = SqlCatalogRepository::new(pool.clone());
        let rules = repo
            .time_surcharge_rules(&TenantId("hagrar-north".to_string()))
            .await
            .expect("query");

        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.percent, Decimal::new(20, 0));
        assert_eq!(rule.window.days.len(), 5);
        assert!(rule.window.on_holidays);
        assert!(rule.window.start > rule.window.end, "night window wraps midnight");

        pool.close().await;
    }

    #[tokio::test]
    async fn decodes_service_catalog_price_types() {
        let pool = setup_pool().await;
        seed_tenant(&pool, "hagrar-north").await;

        let repo = SqlCatalogRepository::new(pool.clone());
        let items =
            repo.service_catalog(&TenantId("hagrar-north".to_string())).await.expect("query");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price_type, ServicePriceType::PerUnit);
        assert_eq!(items[0].unit_price, Decimal::new(50, 0));

        pool.close().await;
    }
}
