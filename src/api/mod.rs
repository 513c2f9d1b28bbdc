//! API handlers for Certifica REST endpoints

pub mod clients;
pub mod health;
pub mod imports;
pub mod mappings;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use crate::{error::AppError, AppState};

/// Header carrying the tenant every request is scoped to
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Extractor for the tenant of the request
pub struct TenantContext(pub i32);

#[async_trait]
impl FromRequestParts<AppState> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Tenant("Missing X-Tenant-Id header".to_string()))?;

        parse_tenant(value).map(TenantContext)
    }
}

fn parse_tenant(value: &str) -> Result<i32, AppError> {
    match value.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::Tenant(format!("Invalid tenant id '{}'", value))),
    }
}
