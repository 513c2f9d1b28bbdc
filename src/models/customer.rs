//! Customer model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

/// Country assigned to customers created from domestic invoices
pub const HOME_COUNTRY: &str = "Brasil";

/// Kind of national tax ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaxIdKind {
    /// Organization (CNPJ)
    Cnpj,
    /// Individual (CPF)
    Cpf,
}

impl TaxIdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxIdKind::Cnpj => "cnpj",
            TaxIdKind::Cpf => "cpf",
        }
    }
}

impl std::fmt::Display for TaxIdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaxIdKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cnpj" => Ok(TaxIdKind::Cnpj),
            "cpf" => Ok(TaxIdKind::Cpf),
            _ => Err(format!("Invalid tax id kind: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for TaxIdKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for TaxIdKind {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for TaxIdKind {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Customer record (tenant-owned)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    /// Cleaned tax ID (digits only)
    pub tax_id: Option<String>,
    pub tax_id_kind: Option<TaxIdKind>,
    /// Formatted single-line address
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Quality contact email
    pub quality_email: Option<String>,
    /// Internal reference code (e.g. CLI0042)
    pub code: Option<String>,
    pub country: Option<String>,
    pub is_national: bool,
    pub created_at: DateTime<Utc>,
}

/// Data proposed for a customer that does not exist yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuggestedCustomer {
    pub name: String,
    pub tax_id: Option<String>,
    pub tax_id_kind: Option<TaxIdKind>,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_national: bool,
    pub country: String,
}

/// Existing customer that resembles the invoice buyer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerCandidate {
    pub customer: Customer,
    pub similarity: f64,
    pub reasons: Vec<String>,
}

/// Create customer request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCustomer {
    /// Taken from the request tenant over HTTP
    #[serde(default)]
    #[validate(range(min = 1, message = "Tenant ID must be a positive number"))]
    pub tenant_id: i32,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub tax_id: Option<String>,
    pub tax_id_kind: Option<TaxIdKind>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[serde(default = "default_true")]
    pub is_national: bool,
    /// Internal reference code; generated when absent
    pub code: Option<String>,
}

fn default_true() -> bool {
    true
}

impl CreateCustomer {
    /// Build a creation payload from the data suggested during resolution
    pub fn from_suggestion(tenant_id: i32, suggestion: &SuggestedCustomer) -> Self {
        Self {
            tenant_id,
            name: suggestion.name.clone(),
            tax_id: suggestion.tax_id.clone(),
            tax_id_kind: suggestion.tax_id_kind,
            address: Some(suggestion.address.clone()).filter(|a| !a.is_empty()),
            phone: suggestion.phone.clone(),
            email: suggestion.email.clone().filter(|e| !e.trim().is_empty()),
            country: suggestion.country.clone(),
            is_national: suggestion.is_national,
            code: None,
        }
    }
}

/// Row ready for insertion, after validation and code assignment
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub tenant_id: i32,
    pub name: String,
    pub tax_id: Option<String>,
    pub tax_id_kind: Option<TaxIdKind>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub quality_email: Option<String>,
    pub code: String,
    pub country: String,
    pub is_national: bool,
}

/// Created customer summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreatedCustomer {
    pub id: i32,
    pub name: String,
}
