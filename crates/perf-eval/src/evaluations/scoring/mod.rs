mod config;
mod policy;
mod rules;

pub use config::{ScoringConfig, WeightPolicy};
pub use rules::compute_total_score;

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::EvaluationScore;
use crate::governance::domain::{CategoryId, CriteriaId, CriteriaWeighting};
use crate::governance::weights::{validate_weights, WeightError, WeightValidation};
use crate::governance::CriteriaCategory;

/// Raw score input for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub criteria_id: CriteriaId,
    pub score: u8,
}

impl From<&EvaluationScore> for ScoreEntry {
    fn from(row: &EvaluationScore) -> Self {
        Self {
            criteria_id: row.criteria_id,
            score: row.score,
        }
    }
}

/// Contribution of one scored category to the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryContribution {
    pub category_id: CategoryId,
    pub weight: Decimal,
    pub scored_criteria: u32,
    pub mean: Decimal,
    pub normalized: Decimal,
    pub contribution: Decimal,
}

/// Soft signal: the category had no scored criteria and was left out of the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCriteriaScore {
    pub category_id: CategoryId,
    pub weight: Decimal,
}

/// Aggregation output with the per-category audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total_score: Decimal,
    pub categories: Vec<CategoryContribution>,
    pub missing: Vec<MissingCriteriaScore>,
    pub unmapped_criteria: Vec<CriteriaId>,
}

/// Stateless scorer that applies the configured scale and weight policy.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(
        &self,
        scores: &[EvaluationScore],
        weighting: &HashMap<CriteriaId, CriteriaWeighting>,
    ) -> ScoreBreakdown {
        let entries: Vec<ScoreEntry> = scores.iter().map(ScoreEntry::from).collect();
        compute_total_score(&entries, weighting, &self.config)
    }

    pub fn validate(&self, active: &[CriteriaCategory]) -> WeightValidation {
        validate_weights(active, self.config.weight_tolerance)
    }

    /// Check the weight precondition for creating or scoring an evaluation.
    pub fn admit(&self, active: &[CriteriaCategory]) -> Result<WeightValidation, WeightError> {
        let validation = self.validate(active);
        policy::admit_scoring(&validation, self.config.weight_policy)?;
        Ok(validation)
    }
}
