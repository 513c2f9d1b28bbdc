//! In-process registry of staged imports awaiting review

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{DecisionMap, StagedImport},
};

#[derive(Clone)]
pub struct ImportSessions {
    imports: Arc<Mutex<HashMap<Uuid, StagedImport>>>,
    ttl: Duration,
}

impl ImportSessions {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            imports: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Store a staged import, dropping sessions past their time to live
    pub async fn insert(&self, staged: StagedImport) {
        let mut imports = self.imports.lock().await;
        let cutoff = Utc::now() - self.ttl;
        let before = imports.len();
        imports.retain(|_, s| s.created_at >= cutoff);
        let expired = before - imports.len();
        if expired > 0 {
            tracing::info!("Discarded {} expired import session(s)", expired);
        }
        imports.insert(staged.id, staged);
    }

    pub async fn get(&self, tenant_id: i32, id: Uuid) -> AppResult<StagedImport> {
        let imports = self.imports.lock().await;
        imports
            .get(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Import {} not found", id)))
    }

    pub async fn record_decision(&self, tenant_id: i32, id: Uuid, decision: DecisionMap) -> AppResult<StagedImport> {
        let mut imports = self.imports.lock().await;
        let staged = imports
            .get_mut(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("Import {} not found", id)))?;
        staged.record_decision(decision)?;
        Ok(staged.clone())
    }

    /// Remove an import so exactly one caller can commit it
    pub async fn take(&self, tenant_id: i32, id: Uuid) -> AppResult<StagedImport> {
        let mut imports = self.imports.lock().await;
        match imports.get(&id) {
            Some(staged) if staged.tenant_id == tenant_id => {}
            _ => return Err(AppError::NotFound(format!("Import {} not found", id))),
        }
        imports
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Import {} not found", id)))
    }

    /// Put back an import whose commit was rejected before any write
    pub async fn restore(&self, staged: StagedImport) {
        self.imports.lock().await.insert(staged.id, staged);
    }

    pub async fn len(&self) -> usize {
        self.imports.lock().await.len()
    }
}
