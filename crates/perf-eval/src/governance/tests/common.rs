use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::governance::domain::{
    CategoryId, Criteria, CriteriaCategory, CriteriaId, NewCategory, RoleCriteriaDescription,
    RoleId,
};
use crate::governance::repository::{CategoryRepository, CriteriaRepository, RepositoryError};
use crate::governance::weights::{default_tolerance, AppliedWeight};
use crate::governance::CategoryService;
use crate::memory::InMemoryCatalog;

pub(super) fn pct(raw: &str) -> Decimal {
    raw.parse().expect("valid decimal literal")
}

pub(super) fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn category(id: u64, weight: &str, is_active: bool) -> CriteriaCategory {
    CriteriaCategory {
        id: CategoryId(id),
        name: format!("Category {id}"),
        description: None,
        weight: pct(weight),
        is_active,
        created_date: created(),
        updated_date: None,
    }
}

pub(super) fn build_service() -> (CategoryService<InMemoryCatalog>, Arc<InMemoryCatalog>) {
    let catalog = Arc::new(InMemoryCatalog::default());
    let service = CategoryService::new(catalog.clone(), default_tolerance());
    (service, catalog)
}

/// Service seeded with one active category per weight, named "Category A", "Category B", ...
pub(super) fn seeded_service(
    weights: &[&str],
) -> (
    CategoryService<InMemoryCatalog>,
    Arc<InMemoryCatalog>,
    Vec<CriteriaCategory>,
) {
    let (service, catalog) = build_service();
    let categories = weights
        .iter()
        .enumerate()
        .map(|(index, weight)| {
            let letter = char::from(b'A' + index as u8);
            service
                .create_category(NewCategory {
                    name: format!("Category {letter}"),
                    description: None,
                    weight: pct(weight),
                })
                .expect("category created")
        })
        .collect();
    (service, catalog, categories)
}

pub(super) fn weight_of(catalog: &InMemoryCatalog, id: CategoryId) -> Decimal {
    CategoryRepository::fetch(catalog, id)
        .expect("fetch succeeds")
        .expect("category present")
        .weight
}

/// Catalog whose transactional weight write always fails.
#[derive(Default)]
pub(super) struct FailingWeightsCatalog {
    pub(super) inner: InMemoryCatalog,
}

impl CategoryRepository for FailingWeightsCatalog {
    fn insert(&self, category: CriteriaCategory) -> Result<CriteriaCategory, RepositoryError> {
        self.inner.insert(category)
    }

    fn update(&self, category: CriteriaCategory) -> Result<(), RepositoryError> {
        self.inner.update(category)
    }

    fn fetch(&self, id: CategoryId) -> Result<Option<CriteriaCategory>, RepositoryError> {
        CategoryRepository::fetch(&self.inner, id)
    }

    fn list(&self) -> Result<Vec<CriteriaCategory>, RepositoryError> {
        self.inner.list()
    }

    fn update_weights(
        &self,
        _weights: &[AppliedWeight],
        _updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl CriteriaRepository for FailingWeightsCatalog {
    fn insert_criteria(&self, criteria: Criteria) -> Result<Criteria, RepositoryError> {
        self.inner.insert_criteria(criteria)
    }

    fn update_criteria(&self, criteria: Criteria) -> Result<(), RepositoryError> {
        self.inner.update_criteria(criteria)
    }

    fn fetch_criteria(&self, id: CriteriaId) -> Result<Option<Criteria>, RepositoryError> {
        self.inner.fetch_criteria(id)
    }

    fn list_criteria(&self) -> Result<Vec<Criteria>, RepositoryError> {
        self.inner.list_criteria()
    }

    fn upsert_role_description(
        &self,
        description: RoleCriteriaDescription,
    ) -> Result<RoleCriteriaDescription, RepositoryError> {
        self.inner.upsert_role_description(description)
    }

    fn role_description(
        &self,
        criteria_id: CriteriaId,
        role_id: RoleId,
    ) -> Result<Option<RoleCriteriaDescription>, RepositoryError> {
        self.inner.role_description(criteria_id, role_id)
    }
}

type CatalogEdit = Box<dyn FnOnce(&InMemoryCatalog) + Send>;

/// Catalog that applies one competing edit right after the first `list()` snapshot is taken,
/// as if another writer landed between reading and writing.
pub(super) struct InterleavedCatalog {
    pub(super) inner: InMemoryCatalog,
    edit: Mutex<Option<CatalogEdit>>,
}

impl InterleavedCatalog {
    pub(super) fn new(
        inner: InMemoryCatalog,
        edit: impl FnOnce(&InMemoryCatalog) + Send + 'static,
    ) -> Self {
        Self {
            inner,
            edit: Mutex::new(Some(Box::new(edit))),
        }
    }
}

impl CategoryRepository for InterleavedCatalog {
    fn insert(&self, category: CriteriaCategory) -> Result<CriteriaCategory, RepositoryError> {
        self.inner.insert(category)
    }

    fn update(&self, category: CriteriaCategory) -> Result<(), RepositoryError> {
        self.inner.update(category)
    }

    fn fetch(&self, id: CategoryId) -> Result<Option<CriteriaCategory>, RepositoryError> {
        CategoryRepository::fetch(&self.inner, id)
    }

    fn list(&self) -> Result<Vec<CriteriaCategory>, RepositoryError> {
        let snapshot = self.inner.list()?;
        let edit = self.edit.lock().expect("edit slot").take();
        if let Some(edit) = edit {
            edit(&self.inner);
        }
        Ok(snapshot)
    }

    fn update_weights(
        &self,
        weights: &[AppliedWeight],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.inner.update_weights(weights, updated_at)
    }
}

impl CriteriaRepository for InterleavedCatalog {
    fn insert_criteria(&self, criteria: Criteria) -> Result<Criteria, RepositoryError> {
        self.inner.insert_criteria(criteria)
    }

    fn update_criteria(&self, criteria: Criteria) -> Result<(), RepositoryError> {
        self.inner.update_criteria(criteria)
    }

    fn fetch_criteria(&self, id: CriteriaId) -> Result<Option<Criteria>, RepositoryError> {
        self.inner.fetch_criteria(id)
    }

    fn list_criteria(&self) -> Result<Vec<Criteria>, RepositoryError> {
        self.inner.list_criteria()
    }

    fn upsert_role_description(
        &self,
        description: RoleCriteriaDescription,
    ) -> Result<RoleCriteriaDescription, RepositoryError> {
        self.inner.upsert_role_description(description)
    }

    fn role_description(
        &self,
        criteria_id: CriteriaId,
        role_id: RoleId,
    ) -> Result<Option<RoleCriteriaDescription>, RepositoryError> {
        self.inner.role_description(criteria_id, role_id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
