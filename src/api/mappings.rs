//! Saved product mapping endpoint

use axum::{extract::State, http::StatusCode, Json};

use crate::{error::AppResult, models::product::SaveProductMapping};

use super::TenantContext;

/// Always use a variant for a supplier product code
#[utoipa::path(
    post,
    path = "/product-mappings",
    tag = "mappings",
    params(
        ("X-Tenant-Id" = i32, Header, description = "Tenant ID")
    ),
    request_body = SaveProductMapping,
    responses(
        (status = 204, description = "Mapping saved"),
        (status = 400, description = "Empty product code"),
        (status = 404, description = "Variant not found")
    )
)]
pub async fn save_mapping(
    State(state): State<crate::AppState>,
    TenantContext(tenant_id): TenantContext,
    Json(request): Json<SaveProductMapping>,
) -> AppResult<StatusCode> {
    state
        .services
        .products
        .save_mapping_preference(tenant_id, &request.product_code, request.variant_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
