//! Pure weight arithmetic: the 100% check over active categories and the proportional
//! rebalance plan. Nothing here touches storage.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::domain::{CategoryId, CriteriaCategory};

/// Total every active weight set must reach.
pub const FULL_WEIGHT: Decimal = Decimal::ONE_HUNDRED;

/// Default tolerance used when comparing a weight total against [`FULL_WEIGHT`].
pub fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Round to the two decimal places weights are stored with.
pub fn round_weight(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Result of checking the active category weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightValidation {
    pub is_valid: bool,
    pub total_weight: Decimal,
    pub active_categories: usize,
    pub tolerance: Decimal,
}

/// Caller supplied target weight for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedWeight {
    pub category_id: CategoryId,
    pub proposed_weight: Decimal,
}

/// One line of a rebalance plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedWeight {
    pub category_id: CategoryId,
    pub previous_weight: Decimal,
    pub weight: Decimal,
    /// `true` when the weight came straight from a proposal.
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeightError {
    #[error("active category weights total {total}%, expected 100%")]
    WeightSumInvalid { total: Decimal },
    #[error("proposed weights total {total}%, which exceeds 100%")]
    WeightExceedsTotal { total: Decimal },
    #[error("weight {weight} must be between 0 and 100")]
    WeightOutOfRange { weight: Decimal },
    #[error("category {0} does not exist")]
    UnknownCategory(CategoryId),
    #[error("category {0} is inactive and cannot carry weight")]
    InactiveCategory(CategoryId),
    #[error("category {0} appears more than once in the proposal")]
    DuplicateProposal(CategoryId),
    #[error("at least one proposed weight is required")]
    EmptyProposal,
}

/// Sum the weights of the active categories and compare against 100 within `tolerance`.
///
/// Inactive categories are ignored. An empty active set totals zero and is therefore invalid.
pub fn validate_weights(categories: &[CriteriaCategory], tolerance: Decimal) -> WeightValidation {
    let active: Vec<&CriteriaCategory> = categories.iter().filter(|c| c.is_active).collect();
    let total_weight: Decimal = active.iter().map(|category| category.weight).sum();
    let is_valid = !active.is_empty() && (total_weight - FULL_WEIGHT).abs() <= tolerance;

    WeightValidation {
        is_valid,
        total_weight,
        active_categories: active.len(),
        tolerance,
    }
}

pub(crate) fn check_weight_range(weight: Decimal) -> Result<Decimal, WeightError> {
    let weight = round_weight(weight);
    if weight < Decimal::ZERO || weight > FULL_WEIGHT {
        return Err(WeightError::WeightOutOfRange { weight });
    }
    Ok(weight)
}

/// Build the weights that result from pinning the proposed categories and spreading the
/// remainder across every other active category in proportion to its current weight.
///
/// The returned plan covers every active category in input order and always sums to exactly
/// 100.00. Unfixed shares are truncated to two places and the leftover 0.01 steps go to the
/// largest fractional remainders (larger current weight, then lowest id, on ties), so no share
/// ever drops below zero.
pub fn plan_rebalance(
    categories: &[CriteriaCategory],
    proposals: &[ProposedWeight],
) -> Result<Vec<AppliedWeight>, WeightError> {
    if proposals.is_empty() {
        return Err(WeightError::EmptyProposal);
    }

    let mut fixed: BTreeMap<CategoryId, Decimal> = BTreeMap::new();
    for proposal in proposals {
        let category = categories
            .iter()
            .find(|category| category.id == proposal.category_id)
            .ok_or(WeightError::UnknownCategory(proposal.category_id))?;
        if !category.is_active {
            return Err(WeightError::InactiveCategory(category.id));
        }

        let weight = check_weight_range(proposal.proposed_weight)?;
        if fixed.insert(category.id, weight).is_some() {
            return Err(WeightError::DuplicateProposal(category.id));
        }
    }

    let fixed_total: Decimal = fixed.values().sum();
    if fixed_total > FULL_WEIGHT {
        return Err(WeightError::WeightExceedsTotal { total: fixed_total });
    }

    let unfixed: Vec<&CriteriaCategory> = categories
        .iter()
        .filter(|category| category.is_active && !fixed.contains_key(&category.id))
        .collect();
    if unfixed.is_empty() && fixed_total != FULL_WEIGHT {
        return Err(WeightError::WeightSumInvalid { total: fixed_total });
    }

    let remainder = FULL_WEIGHT - fixed_total;
    let unfixed_total: Decimal = unfixed.iter().map(|category| category.weight).sum();
    let even_share = if unfixed.is_empty() {
        Decimal::ZERO
    } else {
        remainder / Decimal::from(unfixed.len())
    };

    // (plan index, fractional remainder, previous weight) for the largest-remainder pass
    let mut remainders: Vec<(usize, Decimal, Decimal)> = Vec::with_capacity(unfixed.len());
    let mut plan: Vec<AppliedWeight> = Vec::new();
    for category in categories.iter().filter(|category| category.is_active) {
        let (weight, is_fixed) = match fixed.get(&category.id) {
            Some(weight) => (*weight, true),
            None => {
                let share = if unfixed_total.is_zero() {
                    even_share
                } else {
                    // multiply first so an already balanced set divides back exactly
                    category.weight * remainder / unfixed_total
                };
                let floor = share.round_dp_with_strategy(2, RoundingStrategy::ToZero);
                remainders.push((plan.len(), share - floor, category.weight));
                (floor, false)
            }
        };
        plan.push(AppliedWeight {
            category_id: category.id,
            previous_weight: category.weight,
            weight,
            fixed: is_fixed,
        });
    }

    remainders.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| plan[a.0].category_id.cmp(&plan[b.0].category_id))
    });
    let step = Decimal::new(1, 2);
    let mut leftover = FULL_WEIGHT - plan.iter().map(|line| line.weight).sum::<Decimal>();
    for (index, _, _) in remainders.iter().cycle() {
        if leftover < step {
            break;
        }
        plan[*index].weight += step;
        leftover -= step;
    }

    Ok(plan)
}
