//! Customer creation endpoint

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{CreateCustomer, CreatedCustomer},
};

use super::TenantContext;

/// Create a customer, generating its code when none is given
#[utoipa::path(
    post,
    path = "/clients",
    tag = "clients",
    params(
        ("X-Tenant-Id" = i32, Header, description = "Tenant ID")
    ),
    request_body = CreateCustomer,
    responses(
        (status = 201, description = "Customer created", body = CreatedCustomer),
        (status = 400, description = "Invalid customer data"),
        (status = 409, description = "Tax ID already registered")
    )
)]
pub async fn create_client(
    State(state): State<crate::AppState>,
    TenantContext(tenant_id): TenantContext,
    Json(mut request): Json<CreateCustomer>,
) -> AppResult<(StatusCode, Json<CreatedCustomer>)> {
    request.tenant_id = tenant_id;
    let created = state.services.clients.auto_create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
