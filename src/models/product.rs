//! Product catalog and matching models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::invoice::InvoiceLineItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Subcategory {
    pub id: i32,
    pub name: String,
    pub category: Category,
}

/// Chemical/technical definition a variant specializes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductBase {
    pub id: i32,
    pub technical_name: String,
    pub commercial_name: Option<String>,
    /// Tariff classification (NCM)
    pub ncm: Option<String>,
    pub subcategory: Subcategory,
}

/// Sellable, SKU-level product with its catalog hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductVariant {
    pub id: i32,
    pub tenant_id: i32,
    pub sku: Option<String>,
    pub technical_name: String,
    pub commercial_name: Option<String>,
    pub internal_code: Option<String>,
    /// Default unit of measure
    pub unit: String,
    pub active: bool,
    pub base: ProductBase,
}

/// A scored catalog candidate for one invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductMatch {
    pub variant: ProductVariant,
    /// Score in [0, 1]
    pub similarity: f64,
    pub reasons: Vec<String>,
}

/// Catalog entry proposed when no candidate is good enough
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreationSuggestion {
    pub create_new: bool,
    pub suggested_category: Option<String>,
    pub suggested_name: Option<String>,
}

/// Matching outcome for one invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductMatchResult {
    pub item: InvoiceLineItem,
    pub matches: Vec<ProductMatch>,
    pub has_exact_match: bool,
    pub best_match: Option<ProductMatch>,
    pub suggestions: CreationSuggestion,
}

impl ProductMatchResult {
    /// Score of the best candidate, if any
    pub fn best_score(&self) -> Option<f64> {
        self.best_match.as_ref().map(|m| m.similarity)
    }
}

/// Match-quality buckets for a batch of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MatchingStats {
    pub total_items: usize,
    pub exact_matches: usize,
    pub good_matches: usize,
    pub no_matches: usize,
    pub needs_review: usize,
}

/// Saved manual mapping request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SaveProductMapping {
    /// Supplier product code as written on invoices
    pub product_code: String,
    pub variant_id: i32,
}
