//! Customers repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::CustomerStore;
use crate::{
    error::{AppError, AppResult},
    models::{Customer, NewCustomer},
};

#[derive(Clone)]
pub struct CustomersRepository {
    pool: Pool<Postgres>,
}

impl CustomersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for CustomersRepository {
    async fn find_by_tax_id(&self, tenant_id: i32, tax_id: &str) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 AND tax_id = $2 ORDER BY id LIMIT 1",
        )
        .bind(tenant_id)
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn get_by_id(&self, tenant_id: i32, id: i32) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn search_by_name(&self, tenant_id: i32, terms: &[String]) -> AppResult<Vec<Customer>> {
        if terms.is_empty() {
            return Ok(vec![]);
        }
        let patterns: Vec<String> = terms.iter().map(|t| format!("%{}%", t)).collect();

        let rows = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 AND name ILIKE ANY($2) ORDER BY id",
        )
        .bind(tenant_id)
        .bind(&patterns)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn search_by_tax_id_root(&self, tenant_id: i32, root: &str) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 AND tax_id LIKE $2 ORDER BY id",
        )
        .bind(tenant_id)
        .bind(format!("{}%", root))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn latest(&self, tenant_id: i32) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn insert(&self, customer: &NewCustomer) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                tenant_id, name, tax_id, tax_id_kind, address, phone,
                quality_email, code, country, is_national
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(customer.tenant_id)
        .bind(&customer.name)
        .bind(&customer.tax_id)
        .bind(customer.tax_id_kind)
        .bind(&customer.address)
        .bind(&customer.phone)
        .bind(&customer.quality_email)
        .bind(&customer.code)
        .bind(&customer.country)
        .bind(customer.is_national)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Customer with this tax ID"))
    }
}
