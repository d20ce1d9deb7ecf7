//! Criteria category catalog and the weight governance that keeps active category weights at
//! exactly 100%.

mod blueprint;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod weights;

#[cfg(test)]
mod tests;

pub use blueprint::{CategoryBlueprint, CategoryTemplate};
pub use domain::{
    CategoryId, CategoryUpdate, Criteria, CriteriaCategory, CriteriaDescription, CriteriaId,
    CriteriaWeighting, NewCategory, NewCriteria, NewRoleDescription, RoleCriteriaDescription,
    RoleDescriptionId, RoleId,
};
pub use repository::{CategoryRepository, CriteriaRepository, RepositoryError};
pub use router::category_router;
pub use service::{criteria_weighting, CategoryService, CategoryServiceError};
pub use weights::{
    plan_rebalance, validate_weights, AppliedWeight, ProposedWeight, WeightError,
    WeightValidation,
};
