//! Parsed NFe invoice data, as produced by the upstream XML parser.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Postal address of an invoice party
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

impl Address {
    /// Comma-joined non-empty components in street, number, complement,
    /// district, city, state, postal code order.
    pub fn formatted(&self) -> String {
        [
            &self.street,
            &self.number,
            &self.complement,
            &self.district,
            &self.city,
            &self.state,
            &self.postal_code,
        ]
        .iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Buyer ("destinatário") block of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceBuyerIdentity {
    /// Legal name ("razão social")
    pub name: String,
    /// Organization tax ID, any formatting
    pub cnpj: Option<String>,
    /// Individual tax ID, any formatting
    pub cpf: Option<String>,
    #[serde(default)]
    pub address: Address,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// One product line of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceLineItem {
    /// Supplier product code
    pub code: String,
    pub description: String,
    pub quantity: Decimal,
    /// Unit of measure as written on the invoice
    pub unit: String,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    /// Tariff classification (NCM)
    pub ncm: Option<String>,
    pub note: Option<String>,
}

/// Structured invoice handed over by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParsedInvoice {
    /// Invoice number, kept on every issued certificate
    pub number: Option<String>,
    pub buyer: InvoiceBuyerIdentity,
    pub items: Vec<InvoiceLineItem>,
}
