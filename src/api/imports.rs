//! NFe import endpoints: stage, review, decide and commit

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CommitReport, DecisionMap, ParsedInvoice, StagedImport},
};

use super::TenantContext;

/// Reconcile a parsed invoice and stage it for review
#[utoipa::path(
    post,
    path = "/imports",
    tag = "imports",
    params(
        ("X-Tenant-Id" = i32, Header, description = "Tenant ID")
    ),
    request_body = ParsedInvoice,
    responses(
        (status = 201, description = "Import staged for review", body = StagedImport),
        (status = 400, description = "Invoice without items or bad tenant"),
        (status = 500, description = "Customer lookup failed")
    )
)]
pub async fn stage_import(
    State(state): State<crate::AppState>,
    TenantContext(tenant_id): TenantContext,
    Json(invoice): Json<ParsedInvoice>,
) -> AppResult<(StatusCode, Json<StagedImport>)> {
    let staged = state.services.imports.stage(tenant_id, invoice).await?;
    Ok((StatusCode::CREATED, Json(staged)))
}

/// Get a staged import with its resolution results
#[utoipa::path(
    get,
    path = "/imports/{id}",
    tag = "imports",
    params(
        ("id" = Uuid, Path, description = "Import ID"),
        ("X-Tenant-Id" = i32, Header, description = "Tenant ID")
    ),
    responses(
        (status = 200, description = "Staged import", body = StagedImport),
        (status = 404, description = "Import not found or expired")
    )
)]
pub async fn get_import(
    State(state): State<crate::AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StagedImport>> {
    let staged = state.services.imports.get(tenant_id, id).await?;
    Ok(Json(staged))
}

/// Record the reviewer's customer and product choices
#[utoipa::path(
    put,
    path = "/imports/{id}/decision",
    tag = "imports",
    params(
        ("id" = Uuid, Path, description = "Import ID"),
        ("X-Tenant-Id" = i32, Header, description = "Tenant ID")
    ),
    request_body = DecisionMap,
    responses(
        (status = 200, description = "Decision recorded", body = StagedImport),
        (status = 400, description = "Unknown or repeated line"),
        (status = 404, description = "Import not found or expired"),
        (status = 409, description = "Import is not awaiting review")
    )
)]
pub async fn record_decision(
    State(state): State<crate::AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(id): Path<Uuid>,
    Json(decision): Json<DecisionMap>,
) -> AppResult<Json<StagedImport>> {
    let staged = state.services.imports.record_decision(tenant_id, id, decision).await?;
    Ok(Json(staged))
}

/// Issue the certificates of a reviewed import
#[utoipa::path(
    post,
    path = "/imports/{id}/commit",
    tag = "imports",
    params(
        ("id" = Uuid, Path, description = "Import ID"),
        ("X-Tenant-Id" = i32, Header, description = "Tenant ID")
    ),
    responses(
        (status = 200, description = "Commit report, including per-line failures", body = CommitReport),
        (status = 404, description = "Import or customer not found"),
        (status = 409, description = "Customer already exists or import not reviewed"),
        (status = 422, description = "Customer or some lines undecided")
    )
)]
pub async fn commit_import(
    State(state): State<crate::AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CommitReport>> {
    let report = state.services.imports.commit(tenant_id, id).await?;
    Ok(Json(report))
}
