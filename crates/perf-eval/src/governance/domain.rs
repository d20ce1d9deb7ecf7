use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

numeric_id!(
    /// Identifier of a weighted criteria category.
    CategoryId
);
numeric_id!(
    /// Identifier of a single scorable criterion.
    CriteriaId
);
numeric_id!(
    /// Identifier of an organisational role used for description overrides.
    RoleId
);
numeric_id!(RoleDescriptionId);

/// Weighted grouping of related criteria. `weight` is a percentage in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub weight: Decimal,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

/// A single competency scored inside an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub id: CriteriaId,
    pub category_id: CategoryId,
    pub name: String,
    pub base_description: String,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
}

/// Per-role override text for a criterion. Never consulted by the scoring math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCriteriaDescription {
    pub id: RoleDescriptionId,
    pub criteria_id: CriteriaId,
    pub role_id: RoleId,
    pub description: String,
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub weight: Decimal,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub weight: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCriteria {
    pub category_id: CategoryId,
    pub name: String,
    pub base_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoleDescription {
    pub role_id: RoleId,
    pub description: String,
    pub example: Option<String>,
}

/// Text shown to an evaluator for a criterion, resolved for an optional role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriteriaDescription {
    pub criteria_id: CriteriaId,
    pub name: String,
    pub description: String,
    pub example: Option<String>,
    pub role_override: bool,
}

/// Category membership and weight of a criterion, as consumed by score aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CriteriaWeighting {
    pub category_id: CategoryId,
    pub category_weight: Decimal,
}
