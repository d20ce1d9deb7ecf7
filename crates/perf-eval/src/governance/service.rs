use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::blueprint::CategoryBlueprint;
use super::domain::{
    CategoryId, CategoryUpdate, Criteria, CriteriaCategory, CriteriaDescription, CriteriaId,
    CriteriaWeighting, NewCategory, NewCriteria, NewRoleDescription, RoleCriteriaDescription,
    RoleDescriptionId, RoleId,
};
use super::repository::{CategoryRepository, CriteriaRepository, RepositoryError};
use super::weights::{
    check_weight_range, plan_rebalance, validate_weights, AppliedWeight, ProposedWeight,
    WeightError, WeightValidation,
};

static CATEGORY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CRITERIA_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ROLE_DESCRIPTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_category_id() -> CategoryId {
    CategoryId(CATEGORY_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_criteria_id() -> CriteriaId {
    CriteriaId(CRITERIA_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_role_description_id() -> RoleDescriptionId {
    RoleDescriptionId(ROLE_DESCRIPTION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Administrative operations over the category catalog, including weight governance.
pub struct CategoryService<C> {
    catalog: Arc<C>,
    tolerance: Decimal,
}

impl<C> CategoryService<C>
where
    C: CategoryRepository + CriteriaRepository + 'static,
{
    pub fn new(catalog: Arc<C>, tolerance: Decimal) -> Self {
        Self { catalog, tolerance }
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    pub fn list_categories(&self) -> Result<Vec<CriteriaCategory>, CategoryServiceError> {
        Ok(self.catalog.list()?)
    }

    pub fn list_active_categories(&self) -> Result<Vec<CriteriaCategory>, CategoryServiceError> {
        Ok(self.catalog.list_active_categories()?)
    }

    pub fn get_category(&self, id: CategoryId) -> Result<CriteriaCategory, CategoryServiceError> {
        self.catalog
            .fetch(id)?
            .ok_or(CategoryServiceError::CategoryNotFound(id))
    }

    pub fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CriteriaCategory, CategoryServiceError> {
        let name = normalized_name(&category.name)?;
        let weight = check_weight_range(category.weight)?;
        self.ensure_unique_name(&name, None)?;

        let record = CriteriaCategory {
            id: next_category_id(),
            name,
            description: category.description,
            weight,
            is_active: true,
            created_date: Utc::now(),
            updated_date: None,
        };

        let stored = self.catalog.insert(record)?;
        info!(category_id = %stored.id, weight = %stored.weight, "criteria category created");
        Ok(stored)
    }

    /// Apply a partial update. Changing a single weight may break the 100% total; callers
    /// use [`Self::validate_weights`] or [`Self::rebalance_weights`] to restore it.
    pub fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<CriteriaCategory, CategoryServiceError> {
        let mut category = self.get_category(id)?;

        if let Some(name) = update.name {
            let name = normalized_name(&name)?;
            self.ensure_unique_name(&name, Some(id))?;
            category.name = name;
        }
        if let Some(description) = update.description {
            category.description = Some(description);
        }
        if let Some(weight) = update.weight {
            category.weight = check_weight_range(weight)?;
        }
        category.updated_date = Some(Utc::now());

        self.catalog.update(category.clone())?;
        self.log_weight_health();
        Ok(category)
    }

    /// Soft (de)activation; categories are never deleted.
    pub fn set_category_active(
        &self,
        id: CategoryId,
        is_active: bool,
    ) -> Result<CriteriaCategory, CategoryServiceError> {
        let mut category = self.get_category(id)?;
        category.is_active = is_active;
        category.updated_date = Some(Utc::now());
        self.catalog.update(category.clone())?;
        info!(category_id = %id, is_active, "criteria category activation changed");
        self.log_weight_health();
        Ok(category)
    }

    pub fn validate_weights(&self) -> Result<WeightValidation, CategoryServiceError> {
        let categories = self.catalog.list_active_categories()?;
        Ok(validate_weights(&categories, self.tolerance))
    }

    pub fn require_valid_weights(&self) -> Result<WeightValidation, CategoryServiceError> {
        let validation = self.validate_weights()?;
        if !validation.is_valid {
            return Err(WeightError::WeightSumInvalid {
                total: validation.total_weight,
            }
            .into());
        }
        Ok(validation)
    }

    /// Pin the proposed weights, spread the remainder proportionally, and persist the whole
    /// plan in a single repository transaction.
    ///
    /// Fails with [`RepositoryError::StaleVersion`] when the catalog changed between reading
    /// the categories and writing the plan.
    pub fn rebalance_weights(
        &self,
        proposals: &[ProposedWeight],
    ) -> Result<Vec<AppliedWeight>, CategoryServiceError> {
        let categories = self.catalog.list()?;
        let plan = plan_rebalance(&categories, proposals)?;

        self.catalog.update_weights(&plan, Utc::now())?;

        for line in &plan {
            info!(
                category_id = %line.category_id,
                previous = %line.previous_weight,
                weight = %line.weight,
                fixed = line.fixed,
                "category weight rebalanced"
            );
        }
        Ok(plan)
    }

    pub fn create_criteria(&self, criteria: NewCriteria) -> Result<Criteria, CategoryServiceError> {
        let name = normalized_name(&criteria.name)?;
        self.get_category(criteria.category_id)?;

        let record = Criteria {
            id: next_criteria_id(),
            category_id: criteria.category_id,
            name,
            base_description: criteria.base_description,
            is_active: true,
            created_date: Utc::now(),
        };
        Ok(self.catalog.insert_criteria(record)?)
    }

    pub fn get_criteria(&self, id: CriteriaId) -> Result<Criteria, CategoryServiceError> {
        self.catalog
            .fetch_criteria(id)?
            .ok_or(CategoryServiceError::CriteriaNotFound(id))
    }

    pub fn list_criteria_for_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Criteria>, CategoryServiceError> {
        self.get_category(category_id)?;
        Ok(self.catalog.list_criteria_for_category(category_id)?)
    }

    pub fn set_criteria_active(
        &self,
        id: CriteriaId,
        is_active: bool,
    ) -> Result<Criteria, CategoryServiceError> {
        let mut criteria = self.get_criteria(id)?;
        criteria.is_active = is_active;
        self.catalog.update_criteria(criteria.clone())?;
        Ok(criteria)
    }

    pub fn set_role_description(
        &self,
        criteria_id: CriteriaId,
        description: NewRoleDescription,
    ) -> Result<RoleCriteriaDescription, CategoryServiceError> {
        self.get_criteria(criteria_id)?;
        let id = self
            .catalog
            .role_description(criteria_id, description.role_id)?
            .map(|existing| existing.id)
            .unwrap_or_else(next_role_description_id);

        Ok(self
            .catalog
            .upsert_role_description(RoleCriteriaDescription {
                id,
                criteria_id,
                role_id: description.role_id,
                description: description.description,
                example: description.example,
            })?)
    }

    /// Resolve the text an evaluator sees for a criterion, preferring the role override.
    pub fn describe_criteria(
        &self,
        criteria_id: CriteriaId,
        role_id: Option<RoleId>,
    ) -> Result<CriteriaDescription, CategoryServiceError> {
        let criteria = self.get_criteria(criteria_id)?;
        let role_override = match role_id {
            Some(role_id) => self.catalog.role_description(criteria_id, role_id)?,
            None => None,
        };

        Ok(match role_override {
            Some(role_text) => CriteriaDescription {
                criteria_id,
                name: criteria.name,
                description: role_text.description,
                example: role_text.example,
                role_override: true,
            },
            None => CriteriaDescription {
                criteria_id,
                name: criteria.name,
                description: criteria.base_description,
                example: None,
                role_override: false,
            },
        })
    }

    pub fn criteria_weighting(
        &self,
    ) -> Result<HashMap<CriteriaId, CriteriaWeighting>, CategoryServiceError> {
        Ok(criteria_weighting(self.catalog.as_ref())?)
    }

    /// Create every category and criterion in `blueprint`, returning the new categories.
    pub fn install_blueprint(
        &self,
        blueprint: &CategoryBlueprint,
    ) -> Result<Vec<CriteriaCategory>, CategoryServiceError> {
        let mut installed = Vec::with_capacity(blueprint.categories().len());
        for template in blueprint.categories() {
            let category = self.create_category(template.new_category())?;
            for (name, description) in &template.criteria {
                self.create_criteria(NewCriteria {
                    category_id: category.id,
                    name: name.to_string(),
                    base_description: description.to_string(),
                })?;
            }
            installed.push(category);
        }
        Ok(installed)
    }

    fn ensure_unique_name(
        &self,
        name: &str,
        except: Option<CategoryId>,
    ) -> Result<(), CategoryServiceError> {
        let taken = self.catalog.list()?.into_iter().any(|category| {
            Some(category.id) != except && category.name.eq_ignore_ascii_case(name)
        });
        if taken {
            return Err(CategoryServiceError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn log_weight_health(&self) {
        match self.validate_weights() {
            Ok(validation) if !validation.is_valid => warn!(
                total = %validation.total_weight,
                active = validation.active_categories,
                "active category weights no longer total 100%"
            ),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "unable to check category weights"),
        }
    }
}

/// Map every criterion of an active category to its category and weight.
///
/// Inactive criteria stay in the map so scores recorded before deactivation keep counting.
pub fn criteria_weighting<C>(
    catalog: &C,
) -> Result<HashMap<CriteriaId, CriteriaWeighting>, RepositoryError>
where
    C: CategoryRepository + CriteriaRepository + ?Sized,
{
    let mut weighting = HashMap::new();
    for category in catalog.list_active_categories()? {
        for criteria in catalog.list_criteria_for_category(category.id)? {
            weighting.insert(
                criteria.id,
                CriteriaWeighting {
                    category_id: category.id,
                    category_weight: category.weight,
                },
            );
        }
    }
    Ok(weighting)
}

fn normalized_name(raw: &str) -> Result<String, CategoryServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CategoryServiceError::BlankName);
    }
    Ok(name.to_string())
}

/// Error raised by the category service.
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    #[error(transparent)]
    Weights(#[from] WeightError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),
    #[error("criteria {0} not found")]
    CriteriaNotFound(CriteriaId),
    #[error("a category named '{0}' already exists")]
    DuplicateName(String),
    #[error("name must not be blank")]
    BlankName,
}
