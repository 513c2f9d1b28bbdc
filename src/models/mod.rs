//! Data models for Certifica

pub mod certificate;
pub mod customer;
pub mod import;
pub mod invoice;
pub mod product;

// Re-export commonly used types
pub use certificate::{IssuedCertificate, NewIssuedCertificate};
pub use customer::{CreateCustomer, CreatedCustomer, Customer, CustomerCandidate, NewCustomer, SuggestedCustomer, TaxIdKind};
pub use import::{ClientResolution, CommitReport, CustomerDecision, DecisionMap, ImportStatus, LineCommitError, LineDecision, StagedImport};
pub use invoice::{Address, InvoiceBuyerIdentity, InvoiceLineItem, ParsedInvoice};
pub use product::{MatchingStats, ProductMatch, ProductMatchResult, ProductVariant};
