use tracing::warn;

use super::config::WeightPolicy;
use crate::governance::weights::{WeightError, WeightValidation};

/// Gate evaluation work on the active weight total according to `policy`.
pub(crate) fn admit_scoring(
    validation: &WeightValidation,
    policy: WeightPolicy,
) -> Result<(), WeightError> {
    if validation.is_valid {
        return Ok(());
    }

    match policy {
        WeightPolicy::Enforce => Err(WeightError::WeightSumInvalid {
            total: validation.total_weight,
        }),
        WeightPolicy::Warn => {
            warn!(
                total = %validation.total_weight,
                active = validation.active_categories,
                "scoring with category weights that do not total 100%"
            );
            Ok(())
        }
    }
}
