//! Error types for Certifica server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    BadTenant = 2,
    DbFailure = 3,
    NoSuchCustomer = 4,
    NoSuchData = 5,
    Duplicate = 6,
    BadValue = 7,
    LookupFailure = 8,
    IncompleteDecision = 9,
    InvalidImportState = 10,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Tenant error: {0}")]
    Tenant(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// A store failed while resolving a client or matching products.
    #[error("{context}: {source}")]
    Lookup {
        context: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Incomplete decision: {0}")]
    IncompleteDecision(String),

    #[error("Invalid import state: {0}")]
    InvalidState(String),
}

impl AppError {
    /// Wrap a store failure with the operation that was running
    pub fn lookup(context: impl Into<String>, source: AppError) -> Self {
        AppError::Lookup {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Map a sqlx error, turning unique violations into conflicts
    pub fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::Conflict(format!("{} already exists", what));
            }
        }
        AppError::Database(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect();
        fields.sort();
        AppError::Validation(fields.join("; "))
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Tenant(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadTenant, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Lookup { .. } => {
                tracing::error!("Lookup error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::LookupFailure, self.to_string())
            }
            AppError::IncompleteDecision(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::IncompleteDecision,
                msg.clone(),
            ),
            AppError::InvalidState(msg) => (
                StatusCode::CONFLICT,
                ErrorCode::InvalidImportState,
                msg.clone(),
            ),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
