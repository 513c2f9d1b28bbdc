//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{clients, health, imports, mappings};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Certifica API",
        version = "1.0.0",
        description = "Quality certificate issuing from NFe invoice imports"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Imports
        imports::stage_import,
        imports::get_import,
        imports::record_decision,
        imports::commit_import,
        // Clients
        clients::create_client,
        // Mappings
        mappings::save_mapping,
    ),
    components(
        schemas(
            // Invoice
            crate::models::invoice::Address,
            crate::models::invoice::InvoiceBuyerIdentity,
            crate::models::invoice::InvoiceLineItem,
            crate::models::invoice::ParsedInvoice,
            // Customers
            crate::models::customer::TaxIdKind,
            crate::models::customer::Customer,
            crate::models::customer::SuggestedCustomer,
            crate::models::customer::CustomerCandidate,
            crate::models::customer::CreateCustomer,
            crate::models::customer::CreatedCustomer,
            // Products
            crate::models::product::Category,
            crate::models::product::Subcategory,
            crate::models::product::ProductBase,
            crate::models::product::ProductVariant,
            crate::models::product::ProductMatch,
            crate::models::product::CreationSuggestion,
            crate::models::product::ProductMatchResult,
            crate::models::product::MatchingStats,
            crate::models::product::SaveProductMapping,
            // Imports
            crate::models::import::ClientResolution,
            crate::models::import::ImportStatus,
            crate::models::import::CustomerDecision,
            crate::models::import::LineDecision,
            crate::models::import::DecisionMap,
            crate::models::import::StagedImport,
            crate::models::import::LineCommitError,
            crate::models::import::CommitReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "imports", description = "NFe import reconciliation"),
        (name = "clients", description = "Customer management"),
        (name = "mappings", description = "Saved product code mappings")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
