use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use towdesk_core::domain::customer::{CustomerId, CustomerPricing, PriceItem, PriceItemId};

use super::catalog::parse_decimal;
use super::{CustomerPricingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerPricingRepository {
    pool: DbPool,
}

impl SqlCustomerPricingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerPricingRepository for SqlCustomerPricingRepository {
    async fn find_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<CustomerPricing>, RepositoryError> {
        let row = sqlx::query(
            "SELECT customer_id, discount_percent FROM customer_pricing WHERE customer_id = ?",
        )
        .bind(customer.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let customer_id_raw: String = row.try_get("customer_id")?;
        let customer_id = Uuid::parse_str(&customer_id_raw).map_err(|error| {
            RepositoryError::Decode(format!("invalid customer id `{customer_id_raw}`: {error}"))
        })?;
        let discount_percent =
            parse_decimal("discount_percent", &row.try_get::<String, _>("discount_percent")?)?;

        let item_rows = sqlx::query(
            "SELECT id, label, price FROM customer_price_item WHERE customer_id = ? ORDER BY id ASC",
        )
        .bind(customer.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        let fixed_price_items = item_rows
            .into_iter()
            .map(|item_row| {
                Ok(PriceItem {
                    id: PriceItemId(item_row.try_get("id")?),
                    label: item_row.try_get("label")?,
                    price: parse_decimal("price", &item_row.try_get::<String, _>("price")?)?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Some(CustomerPricing {
            customer_id: CustomerId(customer_id),
            discount_percent,
            fixed_price_items,
        }))
    }
}
