//! Invoice line to catalog variant matching
//!
//! Every active variant of the tenant is scored with a weighted sum of code,
//! name, unit and tariff agreement. The weights below are the points a
//! candidate can earn; the final score is earned / possible.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::{
        product::CreationSuggestion, InvoiceLineItem, MatchingStats, ProductMatch,
        ProductMatchResult, ProductVariant,
    },
    repository::{CatalogStore, MappingStore},
    similarity::{normalize_code, normalize_unit, text_similarity},
};

const WEIGHT_SKU: f64 = 40.0;
const WEIGHT_INTERNAL_CODE: f64 = 35.0;
const WEIGHT_TECHNICAL_NAME: f64 = 30.0;
const WEIGHT_COMMERCIAL_NAME: f64 = 20.0;
const WEIGHT_BASE_NAME: f64 = 15.0;
const WEIGHT_UNIT: f64 = 10.0;
const WEIGHT_NCM: f64 = 5.0;

/// Top score at or above which a line is auto-accepted
const EXACT_MATCH_THRESHOLD: f64 = 0.9;
/// Best score above which a line counts as a good match
const GOOD_MATCH_THRESHOLD: f64 = 0.7;
/// Below this best score a new catalog entry is suggested
const SUGGEST_CREATION_BELOW: f64 = 0.5;
/// Candidates at or below this score are dropped
const MIN_CANDIDATE_SCORE: f64 = 0.1;
const MAX_MATCHES: usize = 10;

const MANUAL_MAPPING_REASON: &str = "Mapeamento manual salvo";
const DEFAULT_CATEGORY: &str = "Outros Produtos Químicos";

/// Keyword table for proposing a category; first hit wins
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Ácidos", &["acido", "ácido", "acid"]),
    ("Bases", &["hidroxido", "hidróxido", "soda", "base", "amonia", "amônia"]),
    (
        "Sais",
        &["cloreto", "sulfato", "nitrato", "carbonato", "fosfato", "bicarbonato", "sal "],
    ),
    (
        "Solventes",
        &["solvente", "alcool", "álcool", "etanol", "metanol", "acetona", "tolueno", "xileno", "thinner"],
    ),
    ("Óxidos", &["oxido", "óxido", "peroxido", "peróxido"]),
    ("Gases", &["gas", "gás", "oxigenio", "oxigênio", "nitrogenio", "nitrogênio", "argonio", "argônio"]),
];

static QUANTITY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(?:[.,]\d+)?\s*(?:kgs?|g|gr|grs|mg|l|lt|lts|ml|ton|t|un|und|pcs?)\b")
        .expect("valid quantity pattern")
});
static PERCENT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?\s*%").expect("valid percentage pattern"));

#[derive(Clone)]
pub struct ProductMatcher {
    catalog: Arc<dyn CatalogStore>,
    mappings: Arc<dyn MappingStore>,
}

impl ProductMatcher {
    pub fn new(catalog: Arc<dyn CatalogStore>, mappings: Arc<dyn MappingStore>) -> Self {
        Self { catalog, mappings }
    }

    /// Rank the tenant's active variants for one invoice line.
    pub async fn find_matches(&self, item: &InvoiceLineItem, tenant_id: i32) -> AppResult<ProductMatchResult> {
        self.find_matches_with_store(item, tenant_id)
            .await
            .map_err(|e| AppError::lookup(format!("Product matching failed for '{}'", item.code), e))
    }

    async fn find_matches_with_store(&self, item: &InvoiceLineItem, tenant_id: i32) -> AppResult<ProductMatchResult> {
        if let Some(variant) = self.saved_mapping(item, tenant_id).await? {
            tracing::debug!(
                "Product matching: '{}' uses saved mapping to variant {}",
                item.code,
                variant.id
            );
            let mapped = ProductMatch {
                variant,
                similarity: 1.0,
                reasons: vec![MANUAL_MAPPING_REASON.to_string()],
            };
            return Ok(ProductMatchResult {
                item: item.clone(),
                matches: vec![mapped.clone()],
                has_exact_match: true,
                best_match: Some(mapped),
                suggestions: CreationSuggestion::default(),
            });
        }

        let variants = self.catalog.list_active_variants(tenant_id).await?;
        let mut matches: Vec<ProductMatch> = variants
            .into_iter()
            .filter_map(|variant| {
                let similarity = score_variant(item, &variant);
                (similarity > MIN_CANDIDATE_SCORE).then(|| ProductMatch {
                    reasons: match_reasons(item, &variant, similarity),
                    variant,
                    similarity,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(MAX_MATCHES);

        let best_match = matches.first().cloned();
        let best_score = best_match.as_ref().map(|m| m.similarity).unwrap_or(0.0);
        let suggestions = if best_score < SUGGEST_CREATION_BELOW {
            CreationSuggestion {
                create_new: true,
                suggested_category: Some(suggest_category(&item.description).to_string()),
                suggested_name: Some(clean_product_name(&item.description)),
            }
        } else {
            CreationSuggestion::default()
        };

        tracing::debug!(
            "Product matching: '{}' -> {} candidate(s), best {:.3}",
            item.code,
            matches.len(),
            best_score
        );

        Ok(ProductMatchResult {
            item: item.clone(),
            has_exact_match: best_score >= EXACT_MATCH_THRESHOLD,
            matches,
            best_match,
            suggestions,
        })
    }

    /// Saved mapping target, if the mapping exists and the variant still does
    async fn saved_mapping(&self, item: &InvoiceLineItem, tenant_id: i32) -> AppResult<Option<ProductVariant>> {
        let code = normalize_code(&item.code);
        if code.is_empty() {
            return Ok(None);
        }
        match self.mappings.find_mapping(tenant_id, &code).await? {
            Some(variant_id) => self.catalog.get_variant(tenant_id, variant_id).await,
            None => Ok(None),
        }
    }

    /// Match every line independently. A line whose lookup fails gets an
    /// empty result flagged for catalog creation instead of failing the batch.
    pub async fn bulk_match(&self, items: &[InvoiceLineItem], tenant_id: i32) -> Vec<ProductMatchResult> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            match self.find_matches(item, tenant_id).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!("Product matching: line '{}' failed: {}", item.code, e);
                    results.push(ProductMatchResult {
                        item: item.clone(),
                        matches: vec![],
                        has_exact_match: false,
                        best_match: None,
                        suggestions: CreationSuggestion {
                            create_new: true,
                            suggested_category: None,
                            suggested_name: Some(item.description.clone()),
                        },
                    });
                }
            }
        }
        results
    }

    /// Remember the reviewer's variant choice for a supplier product code
    pub async fn save_mapping_preference(&self, tenant_id: i32, product_code: &str, variant_id: i32) -> AppResult<()> {
        let code = normalize_code(product_code);
        if code.is_empty() {
            return Err(AppError::Validation("product_code: Product code is required".to_string()));
        }
        if self.catalog.get_variant(tenant_id, variant_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Product variant {} not found", variant_id)));
        }
        self.mappings.save_mapping(tenant_id, &code, variant_id).await?;
        tracing::info!(
            "Saved product mapping '{}' -> variant {} for tenant {}",
            code,
            variant_id,
            tenant_id
        );
        Ok(())
    }
}

/// Weighted agreement between an invoice line and a variant, in [0, 1].
///
/// The code weight always counts toward the ceiling; an internal-code hit
/// earns partial credit against it. The commercial-name weight only counts
/// when the variant has a commercial name.
pub fn score_variant(item: &InvoiceLineItem, variant: &ProductVariant) -> f64 {
    let mut earned = 0.0;
    let mut possible = WEIGHT_SKU;

    let code = normalize_code(&item.code);
    if !code.is_empty() {
        if codes_equal(&code, variant.sku.as_deref()) {
            earned += WEIGHT_SKU;
        } else if codes_equal(&code, variant.internal_code.as_deref()) {
            earned += WEIGHT_INTERNAL_CODE;
        }
    }

    possible += WEIGHT_TECHNICAL_NAME;
    earned += text_similarity(&item.description, &variant.technical_name) * WEIGHT_TECHNICAL_NAME;

    if let Some(ref commercial) = variant.commercial_name {
        possible += WEIGHT_COMMERCIAL_NAME;
        earned += text_similarity(&item.description, commercial) * WEIGHT_COMMERCIAL_NAME;
    }

    possible += WEIGHT_BASE_NAME;
    earned += text_similarity(&item.description, &variant.base.technical_name) * WEIGHT_BASE_NAME;

    possible += WEIGHT_UNIT;
    if normalize_unit(&item.unit) == normalize_unit(&variant.unit) {
        earned += WEIGHT_UNIT;
    }

    possible += WEIGHT_NCM;
    if ncm_equal(item.ncm.as_deref(), variant.base.ncm.as_deref()) {
        earned += WEIGHT_NCM;
    }

    earned / possible
}

/// Human-readable reasons, independent of the numeric score
pub fn match_reasons(item: &InvoiceLineItem, variant: &ProductVariant, score: f64) -> Vec<String> {
    let mut reasons = Vec::new();

    let code = normalize_code(&item.code);
    if !code.is_empty() {
        if codes_equal(&code, variant.sku.as_deref()) {
            reasons.push("Código idêntico (SKU)".to_string());
        } else if codes_equal(&code, variant.internal_code.as_deref()) {
            reasons.push("Código idêntico (código interno)".to_string());
        }
    }

    let technical = text_similarity(&item.description, &variant.technical_name);
    if technical > 0.8 {
        reasons.push("Nome técnico muito similar".to_string());
    } else if technical > 0.6 {
        reasons.push("Nome técnico similar".to_string());
    }

    if let Some(ref commercial) = variant.commercial_name {
        let similarity = text_similarity(&item.description, commercial);
        if similarity > 0.8 {
            reasons.push("Nome comercial muito similar".to_string());
        } else if similarity > 0.6 {
            reasons.push("Nome comercial similar".to_string());
        }
    }

    if normalize_unit(&item.unit) == normalize_unit(&variant.unit) {
        reasons.push("Unidade de medida idêntica".to_string());
    }

    if ncm_equal(item.ncm.as_deref(), variant.base.ncm.as_deref()) {
        reasons.push("NCM idêntico".to_string());
    }

    let percent = (score * 100.0).round() as i64;
    if score > 0.9 {
        reasons.push(format!("Similaridade geral alta ({}%)", percent));
    } else if score > 0.7 {
        reasons.push(format!("Similaridade geral boa ({}%)", percent));
    } else if score > 0.5 {
        reasons.push(format!("Similaridade geral moderada ({}%)", percent));
    }

    reasons
}

fn codes_equal(normalized: &str, candidate: Option<&str>) -> bool {
    candidate.map(normalize_code).as_deref() == Some(normalized)
}

fn ncm_equal(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(str::trim), b.map(str::trim)) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}

/// Category proposed for a product missing from the catalog
pub fn suggest_category(description: &str) -> &'static str {
    let text = format!("{} ", description.to_lowercase());
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Description without package quantities ("5 kg") or purities ("98%")
pub fn clean_product_name(description: &str) -> String {
    let without_quantities = QUANTITY_TOKEN.replace_all(description, " ");
    let without_percentages = PERCENT_TOKEN.replace_all(&without_quantities, " ");
    without_percentages.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Bucket each result exactly once: exact, good, none, or needs review
pub fn matching_stats(results: &[ProductMatchResult]) -> MatchingStats {
    let mut stats = MatchingStats {
        total_items: results.len(),
        ..Default::default()
    };

    for result in results {
        if result.has_exact_match {
            stats.exact_matches += 1;
        } else if result.best_score().map(|s| s > GOOD_MATCH_THRESHOLD).unwrap_or(false) {
            stats.good_matches += 1;
        } else if result.matches.is_empty() {
            stats.no_matches += 1;
        } else {
            stats.needs_review += 1;
        }
    }

    stats
}
