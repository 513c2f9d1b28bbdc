//! Invoice buyer resolution against the tenant's customers

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        customer::HOME_COUNTRY, ClientResolution, CreateCustomer, CreatedCustomer,
        CustomerCandidate, InvoiceBuyerIdentity, NewCustomer, SuggestedCustomer, TaxIdKind,
    },
    repository::CustomerStore,
    similarity::{digits_only, extract_search_terms, text_similarity},
};

/// Name similarity a customer must exceed to be offered as a conflict
const NAME_SIMILARITY_THRESHOLD: f64 = 0.6;
/// Fixed similarity of customers sharing the CNPJ registration root
const TAX_ROOT_SIMILARITY: f64 = 0.8;
/// Digits of a CNPJ identifying the company (before branch and check digits)
const CNPJ_ROOT_LEN: usize = 8;
const MAX_CANDIDATES: usize = 5;
const DEFAULT_CUSTOMER_CODE: &str = "CLI0001";

static CUSTOMER_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]*)(\d+)$").expect("valid customer code pattern"));

#[derive(Clone)]
pub struct ClientResolver {
    customers: Arc<dyn CustomerStore>,
}

impl ClientResolver {
    pub fn new(customers: Arc<dyn CustomerStore>) -> Self {
        Self { customers }
    }

    /// Decide whether the buyer is a known customer, a probable one, or new.
    ///
    /// Store failures are reported as resolution failures; they never turn
    /// into a `Create` outcome.
    pub async fn resolve(&self, buyer: &InvoiceBuyerIdentity, tenant_id: i32) -> AppResult<ClientResolution> {
        self.resolve_with_store(buyer, tenant_id)
            .await
            .map_err(|e| AppError::lookup("Client resolution failed", e))
    }

    async fn resolve_with_store(&self, buyer: &InvoiceBuyerIdentity, tenant_id: i32) -> AppResult<ClientResolution> {
        let cnpj = clean_tax_id(buyer.cnpj.as_deref());
        let cpf = clean_tax_id(buyer.cpf.as_deref());

        let exact_key = cnpj.as_ref().or(cpf.as_ref());
        if let Some(tax_id) = exact_key {
            if let Some(customer) = self.customers.find_by_tax_id(tenant_id, tax_id).await? {
                tracing::info!(
                    "Client resolution: buyer matched customer id={} by tax ID",
                    customer.id
                );
                return Ok(ClientResolution::Found { customer });
            }
        }

        let candidates = self.find_conflicts(buyer, cnpj.as_deref(), tenant_id).await?;
        let suggested = suggested_customer(buyer);

        if candidates.is_empty() {
            tracing::info!("Client resolution: no similar customer for '{}'", buyer.name);
            return Ok(ClientResolution::Create { suggested });
        }

        tracing::info!(
            "Client resolution: {} possible customer(s) for '{}'",
            candidates.len(),
            buyer.name
        );
        Ok(ClientResolution::Conflict { candidates, suggested })
    }

    async fn find_conflicts(
        &self,
        buyer: &InvoiceBuyerIdentity,
        cnpj: Option<&str>,
        tenant_id: i32,
    ) -> AppResult<Vec<CustomerCandidate>> {
        let mut found: Vec<CustomerCandidate> = Vec::new();

        let terms = extract_search_terms(&buyer.name);
        if !terms.is_empty() {
            for customer in self.customers.search_by_name(tenant_id, &terms).await? {
                let similarity = text_similarity(&buyer.name, &customer.name);
                if similarity > NAME_SIMILARITY_THRESHOLD {
                    tracing::debug!(
                        "Client resolution: '{}' ~ '{}' ({:.3})",
                        buyer.name,
                        customer.name,
                        similarity
                    );
                    found.push(CustomerCandidate {
                        reasons: vec![format!(
                            "Nome similar ({}% de similaridade)",
                            (similarity * 100.0).round() as i64
                        )],
                        customer,
                        similarity,
                    });
                }
            }
        }

        if let Some(cnpj) = cnpj.filter(|c| c.len() >= CNPJ_ROOT_LEN) {
            let root = &cnpj[..CNPJ_ROOT_LEN];
            for customer in self.customers.search_by_tax_id_root(tenant_id, root).await? {
                let stored = customer.tax_id.as_deref().map(digits_only);
                if stored.as_deref() == Some(cnpj) {
                    continue;
                }
                found.push(CustomerCandidate {
                    customer,
                    similarity: TAX_ROOT_SIMILARITY,
                    reasons: vec![
                        "CNPJ com base similar (possível divergência de formatação)".to_string(),
                    ],
                });
            }
        }

        // first occurrence wins
        let mut unique: IndexMap<i32, CustomerCandidate> = IndexMap::new();
        for candidate in found {
            unique.entry(candidate.customer.id).or_insert(candidate);
        }

        let mut candidates: Vec<CustomerCandidate> = unique.into_values().collect();
        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(MAX_CANDIDATES);
        Ok(candidates)
    }

    /// Validate and insert a new customer, generating its reference code
    /// when none is given.
    pub async fn auto_create(&self, mut data: CreateCustomer) -> AppResult<CreatedCustomer> {
        data.name = data.name.trim().to_string();
        data.country = data.country.trim().to_string();
        data.validate()?;

        let code = match data.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => code.to_string(),
            None => {
                let latest = self.customers.latest(data.tenant_id).await?;
                next_customer_code(latest.as_ref().and_then(|c| c.code.as_deref()))
            }
        };

        let tax_id = clean_tax_id(data.tax_id.as_deref());
        let tax_id_kind = match (&tax_id, data.tax_id_kind) {
            (None, _) => None,
            (Some(_), Some(kind)) => Some(kind),
            (Some(t), None) if t.len() == 14 => Some(TaxIdKind::Cnpj),
            (Some(_), None) => Some(TaxIdKind::Cpf),
        };

        let new_customer = NewCustomer {
            tenant_id: data.tenant_id,
            name: data.name,
            tax_id,
            tax_id_kind,
            address: data.address.filter(|a| !a.trim().is_empty()),
            phone: data.phone,
            quality_email: data.email,
            code,
            country: data.country,
            is_national: data.is_national,
        };

        let customer = self.customers.insert(&new_customer).await?;
        tracing::info!(
            "Created customer id={} code={} for tenant {}",
            customer.id,
            new_customer.code,
            customer.tenant_id
        );

        Ok(CreatedCustomer {
            id: customer.id,
            name: customer.name,
        })
    }
}

fn clean_tax_id(value: Option<&str>) -> Option<String> {
    value.map(digits_only).filter(|d| !d.is_empty())
}

/// Data for creating the buyer as a new customer
pub fn suggested_customer(buyer: &InvoiceBuyerIdentity) -> SuggestedCustomer {
    let (tax_id, tax_id_kind) = match (clean_tax_id(buyer.cnpj.as_deref()), clean_tax_id(buyer.cpf.as_deref())) {
        (Some(cnpj), _) => (Some(cnpj), Some(TaxIdKind::Cnpj)),
        (None, Some(cpf)) => (Some(cpf), Some(TaxIdKind::Cpf)),
        (None, None) => (None, None),
    };

    SuggestedCustomer {
        name: buyer.name.clone(),
        tax_id,
        tax_id_kind,
        address: buyer.address.formatted(),
        phone: buyer.phone.clone(),
        email: buyer.email.clone(),
        is_national: true,
        country: HOME_COUNTRY.to_string(),
    }
}

/// Increment a `PREFIX + zero-padded number` code ("CLI0041" -> "CLI0042").
pub fn next_customer_code(previous: Option<&str>) -> String {
    let Some(captures) = previous.and_then(|code| CUSTOMER_CODE.captures(code.trim())) else {
        return DEFAULT_CUSTOMER_CODE.to_string();
    };

    let prefix = &captures[1];
    let digits = &captures[2];
    match digits.parse::<u64>() {
        Ok(number) => format!("{}{:0width$}", prefix, number + 1, width = digits.len()),
        Err(_) => DEFAULT_CUSTOMER_CODE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Address;
    use crate::repository::MockCustomerStore;
    use crate::test_utils::{buyer, customer, MemoryStore};

    const TENANT: i32 = 7;

    fn resolver(store: Arc<MemoryStore>) -> ClientResolver {
        ClientResolver::new(store)
    }

    #[tokio::test]
    async fn test_exact_cnpj_match_ignores_name() {
        let store = Arc::new(MemoryStore::new());
        store.add_customer(customer(TENANT, 1, "Nome Antigo Qualquer", Some("12345678000199"), None));

        let result = resolver(store)
            .resolve(&buyer("Outra Razão Social Ltda", Some("12.345.678/0001-99")), TENANT)
            .await
            .unwrap();

        match result {
            ClientResolution::Found { customer } => assert_eq!(customer.id, 1),
            other => panic!("expected found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cpf_lookup_when_no_cnpj() {
        let store = Arc::new(MemoryStore::new());
        store.add_customer(customer(TENANT, 3, "Maria Souza", Some("12345678909"), None));
        let mut person = buyer("Maria Souza", None);
        person.cpf = Some("123.456.789-09".to_string());

        let result = resolver(store).resolve(&person, TENANT).await.unwrap();
        assert!(matches!(result, ClientResolution::Found { ref customer } if customer.id == 3));
    }

    #[tokio::test]
    async fn test_similar_name_is_conflict() {
        let store = Arc::new(MemoryStore::new());
        store.add_customer(customer(
            TENANT,
            4,
            "Industria Quimica do Brasil S.A.",
            Some("98765432000110"),
            None,
        ));

        let result = resolver(store)
            .resolve(&buyer("Industria Quimica Brasil Ltda", Some("11222333000144")), TENANT)
            .await
            .unwrap();

        match result {
            ClientResolution::Conflict { candidates, suggested } => {
                assert_eq!(candidates.len(), 1);
                assert_eq!(candidates[0].customer.id, 4);
                assert!(candidates[0].similarity > 0.6);
                assert!(candidates[0].reasons[0].starts_with("Nome similar ("));
                assert_eq!(suggested.tax_id.as_deref(), Some("11222333000144"));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cnpj_root_conflict_and_dedup() {
        let store = Arc::new(MemoryStore::new());
        // same registration root, different branch; also a similar name
        store.add_customer(customer(TENANT, 5, "Solventes Paulista Ltda", Some("12345678000280"), None));
        // same root, unrelated name
        store.add_customer(customer(TENANT, 6, "Filial Norte", Some("12345678000300"), None));
        // another tenant is never visible
        store.add_customer(customer(TENANT + 1, 9, "Solventes Paulista Ltda", Some("12345678000499"), None));

        let result = resolver(store)
            .resolve(&buyer("Solventes Paulista Ltda", Some("12.345.678/0001-99")), TENANT)
            .await
            .unwrap();

        let ClientResolution::Conflict { candidates, .. } = result else {
            panic!("expected conflict");
        };
        let ids: Vec<i32> = candidates.iter().map(|c| c.customer.id).collect();
        assert_eq!(ids, vec![5, 6]);
        assert_eq!(candidates[0].similarity, 1.0);
        assert_eq!(candidates[0].reasons, vec!["Nome similar (100% de similaridade)"]);
        assert_eq!(candidates[1].similarity, 0.8);
        assert_eq!(
            candidates[1].reasons,
            vec!["CNPJ com base similar (possível divergência de formatação)"]
        );
    }

    #[tokio::test]
    async fn test_candidates_capped_at_five() {
        let store = Arc::new(MemoryStore::new());
        for id in 1..=8 {
            store.add_customer(customer(TENANT, id, &format!("Acme Quimica {}", id), None, None));
        }
        let result = resolver(store)
            .resolve(&buyer("Acme Quimica 1", None), TENANT)
            .await
            .unwrap();
        let ClientResolution::Conflict { candidates, .. } = result else {
            panic!("expected conflict");
        };
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].customer.id, 1);
        assert!(candidates.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[tokio::test]
    async fn test_unknown_buyer_is_create() {
        let store = Arc::new(MemoryStore::new());
        store.add_customer(customer(TENANT, 1, "Distribuidora Alfa", Some("55666777000188"), None));

        let mut new_buyer = buyer("Laboratório Beta Eireli", Some("44.333.222/0001-11"));
        new_buyer.address = Address {
            street: Some("Av. Brasil".to_string()),
            number: Some("1000".to_string()),
            complement: None,
            district: Some("Centro".to_string()),
            city: Some("Sumaré".to_string()),
            state: Some("SP".to_string()),
            postal_code: Some("13170-000".to_string()),
        };

        let result = resolver(store).resolve(&new_buyer, TENANT).await.unwrap();
        let ClientResolution::Create { suggested } = result else {
            panic!("expected create");
        };
        assert_eq!(suggested.country, HOME_COUNTRY);
        assert!(suggested.is_national);
        assert_eq!(suggested.tax_id.as_deref(), Some("44333222000111"));
        assert_eq!(suggested.tax_id_kind, Some(TaxIdKind::Cnpj));
        assert_eq!(suggested.address, "Av. Brasil, 1000, Centro, Sumaré, SP, 13170-000");
        assert_eq!(suggested.email.as_deref(), Some("qualidade@cliente.com.br"));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_create() {
        let mut store = MockCustomerStore::new();
        store
            .expect_find_by_tax_id()
            .returning(|_, _| Err(AppError::Internal("connection refused".to_string())));

        let err = ClientResolver::new(Arc::new(store))
            .resolve(&buyer("Qualquer", Some("12345678000199")), TENANT)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Lookup { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_next_customer_code() {
        assert_eq!(next_customer_code(None), "CLI0001");
        assert_eq!(next_customer_code(Some("CLI0041")), "CLI0042");
        assert_eq!(next_customer_code(Some("QX099")), "QX100");
        assert_eq!(next_customer_code(Some("C9")), "C10");
        assert_eq!(next_customer_code(Some("sem-padrao")), "CLI0001");
        assert_eq!(next_customer_code(Some("")), "CLI0001");
    }

    fn create_payload(name: &str, email: Option<&str>) -> CreateCustomer {
        CreateCustomer {
            tenant_id: TENANT,
            name: name.to_string(),
            tax_id: Some("44.333.222/0001-11".to_string()),
            tax_id_kind: None,
            address: None,
            phone: None,
            email: email.map(str::to_string),
            country: HOME_COUNTRY.to_string(),
            is_national: true,
            code: None,
        }
    }

    #[tokio::test]
    async fn test_auto_create_generates_next_code() {
        let store = Arc::new(MemoryStore::new());
        store.add_customer(customer(TENANT, 1, "Primeiro", None, Some("CLI0007")));
        store.add_customer(customer(TENANT, 2, "Segundo", None, Some("CLI0012")));

        let created = resolver(store.clone())
            .auto_create(create_payload("  Laboratório Beta  ", Some("lab@beta.com.br")))
            .await
            .unwrap();

        assert_eq!(created.name, "Laboratório Beta");
        let customers = store.customers.lock().unwrap();
        let inserted = customers.iter().find(|c| c.id == created.id).unwrap();
        assert_eq!(inserted.code.as_deref(), Some("CLI0013"));
        assert_eq!(inserted.tax_id.as_deref(), Some("44333222000111"));
        assert_eq!(inserted.tax_id_kind, Some(TaxIdKind::Cnpj));
    }

    #[tokio::test]
    async fn test_auto_create_rejects_invalid_payload_without_insert() {
        let store = Arc::new(MemoryStore::new());
        let mut payload = create_payload("   ", Some("not-an-email"));
        payload.country = String::new();

        let err = resolver(store.clone()).auto_create(payload).await.unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("name"));
                assert!(msg.contains("email"));
                assert!(msg.contains("country"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let mut no_tenant = create_payload("Laboratório Beta", None);
        no_tenant.tenant_id = 0;
        let err = resolver(store.clone()).auto_create(no_tenant).await.unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert_eq!(msg, "tenant_id: Tenant ID must be a positive number");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(store.customer_count(), 0);
    }

    #[tokio::test]
    async fn test_auto_create_duplicate_tax_id_is_conflict() {
        let store = Arc::new(MemoryStore::new());
        store.add_customer(customer(TENANT, 1, "Beta", Some("44333222000111"), Some("CLI0001")));

        let err = resolver(store)
            .auto_create(create_payload("Beta", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
