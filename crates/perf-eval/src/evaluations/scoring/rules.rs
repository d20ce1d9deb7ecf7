use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use super::config::ScoringConfig;
use super::{CategoryContribution, MissingCriteriaScore, ScoreBreakdown, ScoreEntry};
use crate::governance::domain::{CategoryId, CriteriaId, CriteriaWeighting};
use crate::governance::weights::{round_weight, FULL_WEIGHT};

struct CategoryTally {
    weight: Decimal,
    sum: Decimal,
    count: u32,
}

/// Weighted total over category means.
///
/// Each category contributes `mean * scale_factor * weight / 100`, where the mean only covers
/// criteria that were actually scored. Categories without any scored criterion are left out of
/// the sum without redistributing their weight, and reported as [`MissingCriteriaScore`].
/// Scores for criteria absent from `weighting` are ignored and listed in `unmapped_criteria`.
pub fn compute_total_score(
    scores: &[ScoreEntry],
    weighting: &HashMap<CriteriaId, CriteriaWeighting>,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let mut tallies: BTreeMap<CategoryId, CategoryTally> = BTreeMap::new();
    for mapping in weighting.values() {
        tallies
            .entry(mapping.category_id)
            .or_insert_with(|| CategoryTally {
                weight: mapping.category_weight,
                sum: Decimal::ZERO,
                count: 0,
            });
    }

    let mut unmapped_criteria = Vec::new();
    for entry in scores {
        match weighting
            .get(&entry.criteria_id)
            .and_then(|mapping| tallies.get_mut(&mapping.category_id))
        {
            Some(tally) => {
                tally.sum += Decimal::from(entry.score);
                tally.count += 1;
            }
            None => unmapped_criteria.push(entry.criteria_id),
        }
    }

    let mut total = Decimal::ZERO;
    let mut categories = Vec::new();
    let mut missing = Vec::new();
    for (category_id, tally) in tallies {
        if tally.count == 0 {
            missing.push(MissingCriteriaScore {
                category_id,
                weight: tally.weight,
            });
            continue;
        }

        let mean = tally.sum / Decimal::from(tally.count);
        let normalized = mean * config.scale_factor;
        let contribution = normalized * tally.weight / FULL_WEIGHT;
        total += contribution;

        categories.push(CategoryContribution {
            category_id,
            weight: tally.weight,
            scored_criteria: tally.count,
            mean: round_weight(mean),
            normalized: round_weight(normalized),
            contribution: round_weight(contribution),
        });
    }

    unmapped_criteria.sort();
    ScoreBreakdown {
        total_score: round_weight(total),
        categories,
        missing,
        unmapped_criteria,
    }
}
