//! In-memory stores and fixtures for service tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        product::{Category, ProductBase, Subcategory},
        Customer, InvoiceBuyerIdentity, InvoiceLineItem, IssuedCertificate, NewCustomer,
        NewIssuedCertificate, ProductVariant, TaxIdKind,
    },
    repository::{CatalogStore, CertificateStore, CustomerStore, MappingStore},
};

/// Tenant-aware in-memory implementation of every store, with switches to
/// make individual lookups fail.
#[derive(Default)]
pub struct MemoryStore {
    pub customers: Mutex<Vec<Customer>>,
    pub variants: Mutex<Vec<ProductVariant>>,
    pub mappings: Mutex<HashMap<(i32, String), i32>>,
    pub certificates: Mutex<Vec<IssuedCertificate>>,
    /// Product codes whose mapping lookup errors
    pub failing_mapping_codes: Mutex<HashSet<String>>,
    /// Variant ids whose certificate creation errors
    pub failing_certificate_variants: Mutex<HashSet<i32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, customer: Customer) {
        self.customers.lock().unwrap().push(customer);
    }

    pub fn add_variant(&self, variant: ProductVariant) {
        self.variants.lock().unwrap().push(variant);
    }

    pub fn fail_mapping_lookup(&self, code: &str) {
        self.failing_mapping_codes.lock().unwrap().insert(code.to_string());
    }

    pub fn fail_certificate_for(&self, variant_id: i32) {
        self.failing_certificate_variants.lock().unwrap().insert(variant_id);
    }

    pub fn certificate_count(&self) -> usize {
        self.certificates.lock().unwrap().len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.lock().unwrap().len()
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find_by_tax_id(&self, tenant_id: i32, tax_id: &str) -> AppResult<Option<Customer>> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.tax_id.as_deref() == Some(tax_id))
            .cloned())
    }

    async fn get_by_id(&self, tenant_id: i32, id: i32) -> AppResult<Option<Customer>> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.id == id)
            .cloned())
    }

    async fn search_by_name(&self, tenant_id: i32, terms: &[String]) -> AppResult<Vec<Customer>> {
        let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .filter(|c| {
                let name = c.name.to_lowercase();
                terms.iter().any(|t| name.contains(t.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn search_by_tax_id_root(&self, tenant_id: i32, root: &str) -> AppResult<Vec<Customer>> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .filter(|c| c.tax_id.as_deref().map(|t| t.starts_with(root)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn latest(&self, tenant_id: i32) -> AppResult<Option<Customer>> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .max_by_key(|c| (c.created_at, c.id))
            .cloned())
    }

    async fn insert(&self, customer: &NewCustomer) -> AppResult<Customer> {
        let mut customers = self.customers.lock().unwrap();
        if let Some(ref tax_id) = customer.tax_id {
            let taken = customers
                .iter()
                .any(|c| c.tenant_id == customer.tenant_id && c.tax_id.as_ref() == Some(tax_id));
            if taken {
                return Err(AppError::Conflict("Customer with this tax ID already exists".to_string()));
            }
        }
        let id = customers.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = Customer {
            id,
            tenant_id: customer.tenant_id,
            name: customer.name.clone(),
            tax_id: customer.tax_id.clone(),
            tax_id_kind: customer.tax_id_kind,
            address: customer.address.clone(),
            phone: customer.phone.clone(),
            quality_email: customer.quality_email.clone(),
            code: Some(customer.code.clone()),
            country: Some(customer.country.clone()),
            is_national: customer.is_national,
            created_at: Utc::now(),
        };
        customers.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_active_variants(&self, tenant_id: i32) -> AppResult<Vec<ProductVariant>> {
        Ok(self
            .variants
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.tenant_id == tenant_id && v.active)
            .cloned()
            .collect())
    }

    async fn get_variant(&self, tenant_id: i32, id: i32) -> AppResult<Option<ProductVariant>> {
        Ok(self
            .variants
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.tenant_id == tenant_id && v.id == id)
            .cloned())
    }
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn find_mapping(&self, tenant_id: i32, product_code: &str) -> AppResult<Option<i32>> {
        if self.failing_mapping_codes.lock().unwrap().contains(product_code) {
            return Err(AppError::Internal(format!("mapping lookup failed for {}", product_code)));
        }
        Ok(self
            .mappings
            .lock()
            .unwrap()
            .get(&(tenant_id, product_code.to_string()))
            .copied())
    }

    async fn save_mapping(&self, tenant_id: i32, product_code: &str, variant_id: i32) -> AppResult<()> {
        self.mappings
            .lock()
            .unwrap()
            .insert((tenant_id, product_code.to_string()), variant_id);
        Ok(())
    }
}

#[async_trait]
impl CertificateStore for MemoryStore {
    async fn create(&self, certificate: &NewIssuedCertificate) -> AppResult<IssuedCertificate> {
        if self
            .failing_certificate_variants
            .lock()
            .unwrap()
            .contains(&certificate.variant_id)
        {
            return Err(AppError::Internal(format!(
                "no entry certificate lot available for variant {}",
                certificate.variant_id
            )));
        }
        let mut certificates = self.certificates.lock().unwrap();
        let issued = IssuedCertificate {
            id: certificates.len() as i32 + 1,
            tenant_id: certificate.tenant_id,
            variant_id: certificate.variant_id,
            customer_id: certificate.customer_id,
            quantity: certificate.quantity,
            unit: certificate.unit.clone(),
            lot_number: certificate.lot_number.clone(),
            manufacturing_date: certificate.manufacturing_date,
            expiration_date: certificate.expiration_date,
            invoice_number: certificate.invoice_number.clone(),
            created_at: Utc::now(),
        };
        certificates.push(issued.clone());
        Ok(issued)
    }
}

/// Customer fixture; ids double as creation order
pub fn customer(tenant_id: i32, id: i32, name: &str, tax_id: Option<&str>, code: Option<&str>) -> Customer {
    Customer {
        id,
        tenant_id,
        name: name.to_string(),
        tax_id: tax_id.map(str::to_string),
        tax_id_kind: tax_id.map(|t| if t.len() == 14 { TaxIdKind::Cnpj } else { TaxIdKind::Cpf }),
        address: None,
        phone: None,
        quality_email: None,
        code: code.map(str::to_string),
        country: Some("Brasil".to_string()),
        is_national: true,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(id as i64),
    }
}

/// Variant fixture in the "Químicos / Ácidos" hierarchy
pub fn variant(tenant_id: i32, id: i32, technical_name: &str, sku: Option<&str>, unit: &str) -> ProductVariant {
    ProductVariant {
        id,
        tenant_id,
        sku: sku.map(str::to_string),
        technical_name: technical_name.to_string(),
        commercial_name: None,
        internal_code: None,
        unit: unit.to_string(),
        active: true,
        base: ProductBase {
            id: id * 100,
            technical_name: technical_name.to_string(),
            commercial_name: None,
            ncm: None,
            subcategory: Subcategory {
                id: 1,
                name: "Inorgânicos".to_string(),
                category: Category {
                    id: 1,
                    name: "Químicos".to_string(),
                },
            },
        },
    }
}

pub fn line_item(code: &str, description: &str, unit: &str) -> InvoiceLineItem {
    InvoiceLineItem {
        code: code.to_string(),
        description: description.to_string(),
        quantity: Decimal::new(25, 0),
        unit: unit.to_string(),
        unit_price: Decimal::new(1250, 2),
        total_price: Decimal::new(31250, 2),
        ncm: None,
        note: None,
    }
}

pub fn buyer(name: &str, cnpj: Option<&str>) -> InvoiceBuyerIdentity {
    InvoiceBuyerIdentity {
        name: name.to_string(),
        cnpj: cnpj.map(str::to_string),
        cpf: None,
        address: Default::default(),
        phone: Some("(19) 3255-0000".to_string()),
        email: Some("qualidade@cliente.com.br".to_string()),
    }
}
