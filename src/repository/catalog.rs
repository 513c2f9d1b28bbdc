//! Product catalog repository

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};

use super::CatalogStore;
use crate::{
    error::AppResult,
    models::product::{Category, ProductBase, ProductVariant, Subcategory},
};

const VARIANT_SELECT: &str = r#"
    SELECT v.id, v.tenant_id, v.sku, v.technical_name, v.commercial_name,
           v.internal_code, v.unit, v.active,
           b.id AS base_id, b.technical_name AS base_technical_name,
           b.commercial_name AS base_commercial_name, b.ncm AS base_ncm,
           s.id AS subcategory_id, s.name AS subcategory_name,
           c.id AS category_id, c.name AS category_name
    FROM product_variants v
    JOIN product_bases b ON b.id = v.base_id
    JOIN product_subcategories s ON s.id = b.subcategory_id
    JOIN product_categories c ON c.id = s.category_id
"#;

/// Flat row of a variant joined with its hierarchy
#[derive(Debug, FromRow)]
struct VariantRow {
    id: i32,
    tenant_id: i32,
    sku: Option<String>,
    technical_name: String,
    commercial_name: Option<String>,
    internal_code: Option<String>,
    unit: String,
    active: bool,
    base_id: i32,
    base_technical_name: String,
    base_commercial_name: Option<String>,
    base_ncm: Option<String>,
    subcategory_id: i32,
    subcategory_name: String,
    category_id: i32,
    category_name: String,
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            sku: row.sku,
            technical_name: row.technical_name,
            commercial_name: row.commercial_name,
            internal_code: row.internal_code,
            unit: row.unit,
            active: row.active,
            base: ProductBase {
                id: row.base_id,
                technical_name: row.base_technical_name,
                commercial_name: row.base_commercial_name,
                ncm: row.base_ncm,
                subcategory: Subcategory {
                    id: row.subcategory_id,
                    name: row.subcategory_name,
                    category: Category {
                        id: row.category_id,
                        name: row.category_name,
                    },
                },
            },
        }
    }
}

#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    async fn list_active_variants(&self, tenant_id: i32) -> AppResult<Vec<ProductVariant>> {
        let query = format!("{} WHERE v.tenant_id = $1 AND v.active = true ORDER BY v.id", VARIANT_SELECT);
        let rows = sqlx::query_as::<_, VariantRow>(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ProductVariant::from).collect())
    }

    async fn get_variant(&self, tenant_id: i32, id: i32) -> AppResult<Option<ProductVariant>> {
        let query = format!("{} WHERE v.tenant_id = $1 AND v.id = $2", VARIANT_SELECT);
        let row = sqlx::query_as::<_, VariantRow>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ProductVariant::from))
    }
}
