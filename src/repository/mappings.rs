//! Manual product mapping preferences repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::MappingStore;
use crate::error::AppResult;

#[derive(Clone)]
pub struct MappingsRepository {
    pool: Pool<Postgres>,
}

impl MappingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MappingStore for MappingsRepository {
    async fn find_mapping(&self, tenant_id: i32, product_code: &str) -> AppResult<Option<i32>> {
        let variant_id: Option<i32> = sqlx::query_scalar(
            "SELECT variant_id FROM product_mappings WHERE tenant_id = $1 AND product_code = $2",
        )
        .bind(tenant_id)
        .bind(product_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(variant_id)
    }

    async fn save_mapping(&self, tenant_id: i32, product_code: &str, variant_id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO product_mappings (tenant_id, product_code, variant_id, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (tenant_id, product_code)
            DO UPDATE SET variant_id = EXCLUDED.variant_id, updated_at = NOW()
            "#,
        )
        .bind(tenant_id)
        .bind(product_code)
        .bind(variant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
