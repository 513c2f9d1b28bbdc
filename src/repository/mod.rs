//! Repository layer for database operations
//!
//! Every store is tenant-scoped: each method takes the tenant id explicitly.
//! Services depend on the traits so they can run against Postgres or a test
//! double.

pub mod catalog;
pub mod certificates;
pub mod customers;
pub mod mappings;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Customer, IssuedCertificate, NewCustomer, NewIssuedCertificate, ProductVariant},
};

/// Customer lookups needed by client resolution and auto-creation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Exact match on the cleaned (digits only) tax ID
    async fn find_by_tax_id(&self, tenant_id: i32, tax_id: &str) -> AppResult<Option<Customer>>;

    async fn get_by_id(&self, tenant_id: i32, id: i32) -> AppResult<Option<Customer>>;

    /// Customers whose name contains any of the terms (case-insensitive)
    async fn search_by_name(&self, tenant_id: i32, terms: &[String]) -> AppResult<Vec<Customer>>;

    /// Customers whose tax ID starts with the given root
    async fn search_by_tax_id_root(&self, tenant_id: i32, root: &str) -> AppResult<Vec<Customer>>;

    /// Most recently created customer
    async fn latest(&self, tenant_id: i32) -> AppResult<Option<Customer>>;

    async fn insert(&self, customer: &NewCustomer) -> AppResult<Customer>;
}

/// Product catalog reads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Active variants joined with base product, subcategory and category
    async fn list_active_variants(&self, tenant_id: i32) -> AppResult<Vec<ProductVariant>>;

    async fn get_variant(&self, tenant_id: i32, id: i32) -> AppResult<Option<ProductVariant>>;
}

/// Saved invoice product code -> variant choices
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn find_mapping(&self, tenant_id: i32, product_code: &str) -> AppResult<Option<i32>>;

    async fn save_mapping(&self, tenant_id: i32, product_code: &str, variant_id: i32) -> AppResult<()>;
}

/// Issued certificate writes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn create(&self, certificate: &NewIssuedCertificate) -> AppResult<IssuedCertificate>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub customers: Arc<customers::CustomersRepository>,
    pub catalog: Arc<catalog::CatalogRepository>,
    pub certificates: Arc<certificates::CertificatesRepository>,
    pub mappings: Arc<mappings::MappingsRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            customers: Arc::new(customers::CustomersRepository::new(pool.clone())),
            catalog: Arc::new(catalog::CatalogRepository::new(pool.clone())),
            certificates: Arc::new(certificates::CertificatesRepository::new(pool.clone())),
            mappings: Arc::new(mappings::MappingsRepository::new(pool.clone())),
            pool,
        }
    }
}
