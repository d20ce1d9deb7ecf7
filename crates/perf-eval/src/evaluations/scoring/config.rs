use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::governance::weights::default_tolerance;

/// What happens when active category weights do not total 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Refuse to create or score evaluations.
    Enforce,
    /// Log a warning and continue.
    Warn,
}

/// Scoring scale and weight governance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub min_score: u8,
    pub max_score: u8,
    /// Multiplier mapping a raw category mean onto the 0-100 scale.
    pub scale_factor: Decimal,
    pub weight_tolerance: Decimal,
    pub weight_policy: WeightPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 1,
            max_score: 5,
            scale_factor: Decimal::from(20),
            weight_tolerance: default_tolerance(),
            weight_policy: WeightPolicy::Enforce,
        }
    }
}

impl ScoringConfig {
    pub fn accepts(&self, score: u8) -> bool {
        (self.min_score..=self.max_score).contains(&score)
    }
}
