//! Staged NFe import models: resolution results, the human decision map and
//! the commit report.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    customer::{CreateCustomer, CreatedCustomer, Customer, CustomerCandidate, SuggestedCustomer},
    invoice::InvoiceBuyerIdentity,
    product::{MatchingStats, ProductMatchResult},
};
use crate::error::{AppError, AppResult};

/// Outcome of resolving the invoice buyer against the customer store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClientResolution {
    /// Exact tax ID match
    Found { customer: Customer },
    /// Customers that look like the buyer; a human must choose
    Conflict {
        candidates: Vec<CustomerCandidate>,
        suggested: SuggestedCustomer,
    },
    /// Nothing resembles the buyer
    Create { suggested: SuggestedCustomer },
}

impl ClientResolution {
    pub fn suggested(&self) -> Option<&SuggestedCustomer> {
        match self {
            ClientResolution::Found { .. } => None,
            ClientResolution::Conflict { suggested, .. } | ClientResolution::Create { suggested } => {
                Some(suggested)
            }
        }
    }

    /// Whether the customer id was offered to the reviewer
    pub fn offers_customer(&self, customer_id: i32) -> bool {
        match self {
            ClientResolution::Found { customer } => customer.id == customer_id,
            ClientResolution::Conflict { candidates, .. } => {
                candidates.iter().any(|c| c.customer.id == customer_id)
            }
            ClientResolution::Create { .. } => false,
        }
    }
}

/// Import lifecycle: uploaded -> reviewed -> committing -> committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Uploaded,
    /// Awaiting the reviewer's decision
    Reviewed,
    Committing,
    Committed,
}

impl ImportStatus {
    pub fn can_transition_to(self, next: ImportStatus) -> bool {
        matches!(
            (self, next),
            (ImportStatus::Uploaded, ImportStatus::Reviewed)
                | (ImportStatus::Reviewed, ImportStatus::Committing)
                | (ImportStatus::Committing, ImportStatus::Committed)
                // customer creation failed before any certificate was written
                | (ImportStatus::Committing, ImportStatus::Reviewed)
        )
    }
}

/// Which customer the certificates are issued to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomerDecision {
    Existing { customer_id: i32 },
    /// Create a customer; without a payload the resolution's suggestion is used
    New { customer: Option<CreateCustomer> },
}

/// Reviewer's choice for one invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineDecision {
    /// Zero-based index of the invoice line
    pub line: usize,
    pub variant_id: i32,
    /// Defaults to the invoice quantity
    pub quantity: Option<Decimal>,
    pub lot_number: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    /// Save the code -> variant mapping for future imports
    #[serde(default)]
    pub remember_mapping: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DecisionMap {
    pub customer: Option<CustomerDecision>,
    #[serde(default)]
    pub lines: Vec<LineDecision>,
}

impl DecisionMap {
    pub fn line(&self, index: usize) -> Option<&LineDecision> {
        self.lines.iter().find(|d| d.line == index)
    }
}

/// Reconciled invoice held for human review. Lives only for one import
/// session and is consumed by commit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StagedImport {
    pub id: Uuid,
    pub tenant_id: i32,
    pub invoice_number: Option<String>,
    pub buyer: InvoiceBuyerIdentity,
    pub client: ClientResolution,
    pub products: Vec<ProductMatchResult>,
    pub stats: MatchingStats,
    pub decision: Option<DecisionMap>,
    pub status: ImportStatus,
    pub created_at: DateTime<Utc>,
}

impl StagedImport {
    pub fn new(
        tenant_id: i32,
        invoice_number: Option<String>,
        buyer: InvoiceBuyerIdentity,
        client: ClientResolution,
        products: Vec<ProductMatchResult>,
        stats: MatchingStats,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            invoice_number,
            buyer,
            client,
            products,
            stats,
            decision: None,
            status: ImportStatus::Uploaded,
            created_at: Utc::now(),
        }
    }

    pub fn transition(&mut self, next: ImportStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidState(format!(
                "Import {} cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Replace the decision map. Line indexes must exist and appear once.
    pub fn record_decision(&mut self, decision: DecisionMap) -> AppResult<()> {
        if self.status != ImportStatus::Reviewed {
            return Err(AppError::InvalidState(format!(
                "Import {} is {:?}, decisions can only be recorded while awaiting review",
                self.id, self.status
            )));
        }

        let mut seen = HashSet::new();
        for line in &decision.lines {
            if line.line >= self.products.len() {
                return Err(AppError::BadRequest(format!(
                    "Line {} does not exist (invoice has {} lines)",
                    line.line,
                    self.products.len()
                )));
            }
            if !seen.insert(line.line) {
                return Err(AppError::BadRequest(format!(
                    "Line {} has more than one decision",
                    line.line
                )));
            }
        }

        self.decision = Some(decision);
        Ok(())
    }

    /// Invoice lines still lacking a variant decision
    pub fn undecided_lines(&self) -> Vec<usize> {
        (0..self.products.len())
            .filter(|index| {
                self.decision
                    .as_ref()
                    .and_then(|d| d.line(*index))
                    .is_none()
            })
            .collect()
    }

    /// Enter `committing`. Rejected unless the customer and every line
    /// have been decided.
    pub fn begin_commit(&mut self) -> AppResult<()> {
        if self.status != ImportStatus::Reviewed {
            return Err(AppError::InvalidState(format!(
                "Import {} is {:?}, only reviewed imports can be committed",
                self.id, self.status
            )));
        }

        let has_customer = self
            .decision
            .as_ref()
            .map(|d| d.customer.is_some())
            .unwrap_or(false);
        if !has_customer {
            return Err(AppError::IncompleteDecision(
                "No customer decision recorded".to_string(),
            ));
        }

        let missing = self.undecided_lines();
        if !missing.is_empty() {
            let lines: Vec<String> = missing.iter().map(|l| l.to_string()).collect();
            return Err(AppError::IncompleteDecision(format!(
                "No product decision for line(s) {}",
                lines.join(", ")
            )));
        }

        self.transition(ImportStatus::Committing)
    }
}

/// Failure to issue the certificate of one invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineCommitError {
    pub line: usize,
    pub product_code: String,
    pub description: String,
    pub message: String,
}

/// Result of committing a staged import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommitReport {
    pub import_id: Uuid,
    pub customer_id: i32,
    /// Set when the customer was created by this commit
    pub created_customer: Option<CreatedCustomer>,
    pub succeeded: usize,
    pub certificate_ids: Vec<i32>,
    pub errors: Vec<LineCommitError>,
}
