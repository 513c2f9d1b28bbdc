//! Business logic services

pub mod client_resolver;
pub mod import_sessions;
pub mod nfe_import;
pub mod product_matcher;

use crate::{config::ImportsConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub clients: client_resolver::ClientResolver,
    pub products: product_matcher::ProductMatcher,
    pub imports: nfe_import::NfeImportService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, imports_config: ImportsConfig) -> Self {
        let clients = client_resolver::ClientResolver::new(repository.customers.clone());
        let products =
            product_matcher::ProductMatcher::new(repository.catalog.clone(), repository.mappings.clone());
        let imports = nfe_import::NfeImportService::new(
            clients.clone(),
            products.clone(),
            repository.customers.clone(),
            repository.catalog.clone(),
            repository.certificates.clone(),
            import_sessions::ImportSessions::new(imports_config.session_ttl_minutes),
        );

        Self {
            clients,
            products,
            imports,
        }
    }
}
