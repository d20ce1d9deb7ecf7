use chrono::{DateTime, Utc};

use super::domain::{
    CategoryId, Criteria, CriteriaCategory, CriteriaId, RoleCriteriaDescription, RoleId,
};
use super::weights::AppliedWeight;

/// Storage abstraction for criteria categories.
pub trait CategoryRepository: Send + Sync {
    fn insert(&self, category: CriteriaCategory) -> Result<CriteriaCategory, RepositoryError>;
    fn update(&self, category: CriteriaCategory) -> Result<(), RepositoryError>;
    fn fetch(&self, id: CategoryId) -> Result<Option<CriteriaCategory>, RepositoryError>;
    /// Every category, active or not, ordered by id.
    fn list(&self) -> Result<Vec<CriteriaCategory>, RepositoryError>;

    fn list_active_categories(&self) -> Result<Vec<CriteriaCategory>, RepositoryError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|category| category.is_active)
            .collect())
    }

    /// Write a whole rebalance plan as one unit of work.
    ///
    /// Either every listed category takes its new weight or none does; a missing id must
    /// fail with [`RepositoryError::NotFound`] before anything is written. The plan must cover
    /// exactly the active categories, each still at its `previous_weight`, otherwise the write
    /// fails with [`RepositoryError::StaleVersion`].
    fn update_weights(
        &self,
        weights: &[AppliedWeight],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// Storage abstraction for criteria and their per-role descriptions.
pub trait CriteriaRepository: Send + Sync {
    fn insert_criteria(&self, criteria: Criteria) -> Result<Criteria, RepositoryError>;
    fn update_criteria(&self, criteria: Criteria) -> Result<(), RepositoryError>;
    fn fetch_criteria(&self, id: CriteriaId) -> Result<Option<Criteria>, RepositoryError>;
    fn list_criteria(&self) -> Result<Vec<Criteria>, RepositoryError>;

    fn list_criteria_for_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Criteria>, RepositoryError> {
        Ok(self
            .list_criteria()?
            .into_iter()
            .filter(|criteria| criteria.category_id == category_id)
            .collect())
    }

    /// Insert or replace the description keyed by `(criteria_id, role_id)`.
    fn upsert_role_description(
        &self,
        description: RoleCriteriaDescription,
    ) -> Result<RoleCriteriaDescription, RepositoryError>;
    fn role_description(
        &self,
        criteria_id: CriteriaId,
        role_id: RoleId,
    ) -> Result<Option<RoleCriteriaDescription>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently")]
    StaleVersion,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
