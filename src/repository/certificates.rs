//! Issued certificates repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::CertificateStore;
use crate::{
    error::{AppError, AppResult},
    models::{IssuedCertificate, NewIssuedCertificate},
};

#[derive(Clone)]
pub struct CertificatesRepository {
    pool: Pool<Postgres>,
}

impl CertificatesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CertificateStore for CertificatesRepository {
    async fn create(&self, certificate: &NewIssuedCertificate) -> AppResult<IssuedCertificate> {
        sqlx::query_as::<_, IssuedCertificate>(
            r#"
            INSERT INTO issued_certificates (
                tenant_id, variant_id, customer_id, quantity, unit, lot_number,
                manufacturing_date, expiration_date, invoice_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(certificate.tenant_id)
        .bind(certificate.variant_id)
        .bind(certificate.customer_id)
        .bind(certificate.quantity)
        .bind(&certificate.unit)
        .bind(&certificate.lot_number)
        .bind(certificate.manufacturing_date)
        .bind(certificate.expiration_date)
        .bind(&certificate.invoice_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Certificate"))
    }
}
