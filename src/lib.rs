//! Certifica Server
//!
//! Quality certificate issuing backend. Imports NFe invoices, reconciles the
//! buyer and every product line against the tenant's records, and issues
//! one certificate per line once a reviewer confirms the choices.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod similarity;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: sqlx::PgPool,
    pub services: Arc<services::Services>,
}
