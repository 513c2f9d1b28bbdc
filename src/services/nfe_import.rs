//! NFe import reconciliation: resolve the buyer, match every line, hold the
//! result for review, then issue certificates line by line.

use std::sync::Arc;

use uuid::Uuid;

use super::{
    client_resolver::ClientResolver,
    import_sessions::ImportSessions,
    product_matcher::{matching_stats, ProductMatcher},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        ClientResolution, CommitReport, CreateCustomer, CreatedCustomer, CustomerDecision,
        DecisionMap, ImportStatus, LineCommitError, NewIssuedCertificate, ParsedInvoice,
        StagedImport,
    },
    repository::{CatalogStore, CertificateStore, CustomerStore},
};

#[derive(Clone)]
pub struct NfeImportService {
    clients: ClientResolver,
    products: ProductMatcher,
    customers: Arc<dyn CustomerStore>,
    catalog: Arc<dyn CatalogStore>,
    certificates: Arc<dyn CertificateStore>,
    sessions: ImportSessions,
}

impl NfeImportService {
    pub fn new(
        clients: ClientResolver,
        products: ProductMatcher,
        customers: Arc<dyn CustomerStore>,
        catalog: Arc<dyn CatalogStore>,
        certificates: Arc<dyn CertificateStore>,
        sessions: ImportSessions,
    ) -> Self {
        Self {
            clients,
            products,
            customers,
            catalog,
            certificates,
            sessions,
        }
    }

    /// Reconcile an invoice and keep it for review
    pub async fn stage(&self, tenant_id: i32, invoice: ParsedInvoice) -> AppResult<StagedImport> {
        let staged = self.reconcile(tenant_id, invoice).await?;
        self.sessions.insert(staged.clone()).await;
        Ok(staged)
    }

    pub async fn get(&self, tenant_id: i32, id: Uuid) -> AppResult<StagedImport> {
        self.sessions.get(tenant_id, id).await
    }

    pub async fn record_decision(&self, tenant_id: i32, id: Uuid, decision: DecisionMap) -> AppResult<StagedImport> {
        self.sessions.record_decision(tenant_id, id, decision).await
    }

    /// Commit a reviewed import. An import rejected before any write stays
    /// available for another attempt; otherwise it is consumed.
    pub async fn commit(&self, tenant_id: i32, id: Uuid) -> AppResult<CommitReport> {
        let mut staged = self.sessions.take(tenant_id, id).await?;
        match self.commit_staged(&mut staged).await {
            Ok(report) => Ok(report),
            Err(e) => {
                if staged.status == ImportStatus::Reviewed {
                    self.sessions.restore(staged).await;
                }
                Err(e)
            }
        }
    }

    /// Number of staged imports awaiting commit
    pub async fn open_sessions(&self) -> usize {
        self.sessions.len().await
    }

    /// Resolve the buyer once and match all lines once.
    ///
    /// Client resolution failures abort staging; individual line failures
    /// only degrade that line's result.
    pub async fn reconcile(&self, tenant_id: i32, invoice: ParsedInvoice) -> AppResult<StagedImport> {
        if tenant_id <= 0 {
            return Err(AppError::Tenant(format!("Invalid tenant id {}", tenant_id)));
        }
        if invoice.items.is_empty() {
            return Err(AppError::BadRequest("Invoice has no line items".to_string()));
        }

        let client = self.clients.resolve(&invoice.buyer, tenant_id).await?;
        let products = self.products.bulk_match(&invoice.items, tenant_id).await;
        let stats = matching_stats(&products);

        let mut staged = StagedImport::new(
            tenant_id,
            invoice.number,
            invoice.buyer,
            client,
            products,
            stats,
        );
        staged.transition(ImportStatus::Reviewed)?;

        tracing::info!(
            "Staged import {} for tenant {}: {} line(s), {} exact, {} good, {} without match, {} to review",
            staged.id,
            tenant_id,
            stats.total_items,
            stats.exact_matches,
            stats.good_matches,
            stats.no_matches,
            stats.needs_review
        );
        Ok(staged)
    }

    /// Issue one certificate per line against the recorded decisions.
    ///
    /// The decision map is checked before anything is written. Once writing
    /// starts, each line stands alone: failures are reported and the
    /// remaining lines are still processed.
    pub async fn commit_staged(&self, staged: &mut StagedImport) -> AppResult<CommitReport> {
        staged.begin_commit()?;

        let decision = staged.decision.clone().unwrap_or_default();
        let (customer_id, created_customer) = match self.settle_customer(staged, decision.customer.as_ref()).await {
            Ok(settled) => settled,
            Err(e) => {
                tracing::warn!("Import {}: customer decision failed: {}", staged.id, e);
                staged.transition(ImportStatus::Reviewed)?;
                return Err(e);
            }
        };

        let mut report = CommitReport {
            import_id: staged.id,
            customer_id,
            created_customer,
            succeeded: 0,
            certificate_ids: Vec::new(),
            errors: Vec::new(),
        };

        for (index, result) in staged.products.iter().enumerate() {
            let item = &result.item;
            let Some(line) = decision.line(index) else {
                report.errors.push(LineCommitError {
                    line: index,
                    product_code: item.code.clone(),
                    description: item.description.clone(),
                    message: "No product decision for this line".to_string(),
                });
                continue;
            };

            if let Err(e) = self.ensure_variant(staged.tenant_id, line.variant_id).await {
                tracing::warn!("Import {}: line {} ('{}') rejected: {}", staged.id, index, item.code, e);
                report.errors.push(LineCommitError {
                    line: index,
                    product_code: item.code.clone(),
                    description: item.description.clone(),
                    message: e.to_string(),
                });
                continue;
            }

            let certificate = NewIssuedCertificate {
                tenant_id: staged.tenant_id,
                variant_id: line.variant_id,
                customer_id,
                quantity: line.quantity.unwrap_or(item.quantity),
                unit: item.unit.clone(),
                lot_number: line.lot_number.clone(),
                manufacturing_date: line.manufacturing_date,
                expiration_date: line.expiration_date,
                invoice_number: staged.invoice_number.clone(),
            };

            match self.certificates.create(&certificate).await {
                Ok(issued) => {
                    report.succeeded += 1;
                    report.certificate_ids.push(issued.id);

                    if line.remember_mapping {
                        if let Err(e) = self
                            .products
                            .save_mapping_preference(staged.tenant_id, &item.code, line.variant_id)
                            .await
                        {
                            tracing::warn!(
                                "Import {}: could not save mapping for '{}': {}",
                                staged.id,
                                item.code,
                                e
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Import {}: certificate for line {} ('{}') failed: {}",
                        staged.id,
                        index,
                        item.code,
                        e
                    );
                    report.errors.push(LineCommitError {
                        line: index,
                        product_code: item.code.clone(),
                        description: item.description.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        staged.transition(ImportStatus::Committed)?;
        tracing::info!(
            "Committed import {}: {} certificate(s) issued, {} error(s)",
            staged.id,
            report.succeeded,
            report.errors.len()
        );
        Ok(report)
    }

    /// The chosen variant must belong to the import's tenant
    async fn ensure_variant(&self, tenant_id: i32, variant_id: i32) -> AppResult<()> {
        match self.catalog.get_variant(tenant_id, variant_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Product variant {} not found", variant_id))),
        }
    }

    /// Customer id for the certificates, creating the customer when asked
    async fn settle_customer(
        &self,
        staged: &StagedImport,
        decision: Option<&CustomerDecision>,
    ) -> AppResult<(i32, Option<CreatedCustomer>)> {
        match decision {
            Some(CustomerDecision::Existing { customer_id }) => {
                let known = staged.client.offers_customer(*customer_id)
                    || self
                        .customers
                        .get_by_id(staged.tenant_id, *customer_id)
                        .await?
                        .is_some();
                if !known {
                    return Err(AppError::NotFound(format!("Customer {} not found", customer_id)));
                }
                Ok((*customer_id, None))
            }
            Some(CustomerDecision::New { customer }) => {
                let mut payload = match (customer, &staged.client) {
                    (Some(payload), _) => payload.clone(),
                    (None, ClientResolution::Found { customer }) => {
                        return Err(AppError::BadRequest(format!(
                            "Buyer already exists as customer {}; choose it instead of creating one",
                            customer.id
                        )));
                    }
                    (None, resolution) => match resolution.suggested() {
                        Some(suggested) => CreateCustomer::from_suggestion(staged.tenant_id, suggested),
                        None => {
                            return Err(AppError::BadRequest(
                                "No customer data to create".to_string(),
                            ))
                        }
                    },
                };
                payload.tenant_id = staged.tenant_id;
                let created = self.clients.auto_create(payload).await?;
                Ok((created.id, Some(created)))
            }
            None => Err(AppError::IncompleteDecision(
                "No customer decision recorded".to_string(),
            )),
        }
    }
}
