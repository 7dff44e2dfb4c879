use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use towdesk_core::domain::catalog::TenantId;
use towdesk_core::domain::job::JobId;
use towdesk_core::pricing::breakdown::{PriceBreakdown, PriceModeKind};

use super::{BreakdownRepository, RepositoryError};
use crate::DbPool;

/// Stores the full breakdown as a JSON payload, with mode and total
/// denormalized for listing queries. Saving again for the same job replaces
/// the payload in place.
pub struct SqlBreakdownRepository {
    pool: DbPool,
}

impl SqlBreakdownRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BreakdownRepository for SqlBreakdownRepository {
    async fn save(
        &self,
        tenant: &TenantId,
        job_id: &JobId,
        breakdown: &PriceBreakdown,
    ) -> Result<(), RepositoryError> {
        let payload_json = serde_json::to_string(breakdown).map_err(|error| {
            RepositoryError::Decode(format!("failed to encode breakdown payload: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO job_breakdown (job_id, tenant_id, mode, total, payload_json, priced_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (job_id) DO UPDATE SET
                mode = excluded.mode,
                total = excluded.total,
                payload_json = excluded.payload_json,
                priced_at = excluded.priced_at
            "#,
        )
        .bind(&job_id.0)
        .bind(&tenant.0)
        .bind(mode_key(breakdown.mode))
        .bind(breakdown.total.to_string())
        .bind(payload_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_for_job(
        &self,
        job_id: &JobId,
    ) -> Result<Option<PriceBreakdown>, RepositoryError> {
        let row = sqlx::query("SELECT payload_json FROM job_breakdown WHERE job_id = ?")
            .bind(&job_id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload_json: String = row.try_get("payload_json")?;
        let breakdown = serde_json::from_str(&payload_json).map_err(|error| {
            RepositoryError::Decode(format!("failed to decode breakdown payload: {error}"))
        })?;

        Ok(Some(breakdown))
    }
}

fn mode_key(mode: PriceModeKind) -> &'static str {
    match mode {
        PriceModeKind::Recommended => "recommended",
        PriceModeKind::Fixed => "fixed",
        PriceModeKind::Customer => "customer",
        PriceModeKind::Custom => "custom",
    }
}
