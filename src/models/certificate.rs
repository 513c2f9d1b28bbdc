//! Issued certificate model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Customer-facing certificate written at commit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IssuedCertificate {
    pub id: i32,
    pub tenant_id: i32,
    pub variant_id: i32,
    pub customer_id: i32,
    pub quantity: Decimal,
    pub unit: String,
    pub lot_number: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Certificate creation input
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssuedCertificate {
    pub tenant_id: i32,
    pub variant_id: i32,
    pub customer_id: i32,
    pub quantity: Decimal,
    pub unit: String,
    pub lot_number: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub invoice_number: Option<String>,
}
