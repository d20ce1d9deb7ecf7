use crate::infra::{build_services, parse_weight_override, Services};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use perf_eval::error::AppError;
use perf_eval::evaluations::{
    EmployeeId, Evaluation, NewEvaluation, ScoreBreakdown, ScoringConfig, WeightPolicy,
};
use perf_eval::governance::{
    plan_rebalance, validate_weights, AppliedWeight, CategoryId, CriteriaCategory,
    ProposedWeight, WeightValidation,
};
use rust_decimal::Decimal;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Period label for the demo evaluation. Defaults to the current year.
    #[arg(long)]
    pub(crate) period: Option<String>,
    /// Scores applied round-robin to the catalog criteria.
    #[arg(long, value_delimiter = ',', default_value = "4,5,3")]
    pub(crate) scores: Vec<u8>,
    /// Stop after recording scores instead of submitting and completing.
    #[arg(long)]
    pub(crate) keep_draft: bool,
    /// Warn instead of failing when category weights do not total 100%.
    #[arg(long)]
    pub(crate) warn_on_invalid_weights: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct WeightsValidateArgs {
    /// Override a category weight, as NAME=PERCENT. Repeatable.
    #[arg(long = "set", value_parser = parse_weight_override)]
    pub(crate) overrides: Vec<(String, Decimal)>,
    /// Pin the overridden weights and spread the remainder over the other categories.
    #[arg(long)]
    pub(crate) rebalance: bool,
    /// Accepted distance from 100%.
    #[arg(long)]
    pub(crate) tolerance: Option<Decimal>,
}

pub(crate) fn run_weights_validate(args: WeightsValidateArgs) -> Result<(), AppError> {
    let WeightsValidateArgs {
        overrides,
        rebalance,
        tolerance,
    } = args;

    let tolerance = tolerance.unwrap_or(ScoringConfig::default().weight_tolerance);
    let services = build_services(&ScoringConfig::default())?;
    let categories = services.categories.list_categories()?;
    let outcome = check_weights(&categories, &overrides, rebalance, tolerance)?;

    println!("Criteria category weights");
    for line in &outcome.plan {
        let name = category_name(&categories, line.category_id);
        let marker = if line.fixed { " (pinned)" } else { "" };
        println!(
            "- {name}: {previous}% -> {weight}%{marker}",
            previous = line.previous_weight,
            weight = line.weight,
        );
    }
    render_validation(&outcome.validation);
    Ok(())
}

pub(crate) struct WeightCheck {
    pub(crate) plan: Vec<AppliedWeight>,
    pub(crate) validation: WeightValidation,
}

/// Apply `overrides` to `categories` (as-is or through a rebalance) and validate the result.
pub(crate) fn check_weights(
    categories: &[CriteriaCategory],
    overrides: &[(String, Decimal)],
    rebalance: bool,
    tolerance: Decimal,
) -> Result<WeightCheck, AppError> {
    let proposals = overrides
        .iter()
        .map(|(name, weight)| {
            categories
                .iter()
                .find(|category| category.name.eq_ignore_ascii_case(name))
                .map(|category| ProposedWeight {
                    category_id: category.id,
                    proposed_weight: *weight,
                })
                .ok_or_else(|| AppError::Usage(format!("unknown category '{name}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let plan = if rebalance {
        plan_rebalance(categories, &proposals).map_err(|err| AppError::Usage(err.to_string()))?
    } else {
        categories
            .iter()
            .filter(|category| category.is_active)
            .map(|category| {
                let pinned = proposals
                    .iter()
                    .find(|proposal| proposal.category_id == category.id);
                AppliedWeight {
                    category_id: category.id,
                    previous_weight: category.weight,
                    weight: pinned.map_or(category.weight, |p| p.proposed_weight),
                    fixed: pinned.is_some(),
                }
            })
            .collect()
    };

    let adjusted: Vec<CriteriaCategory> = categories
        .iter()
        .cloned()
        .map(|mut category| {
            if let Some(line) = plan.iter().find(|line| line.category_id == category.id) {
                category.weight = line.weight;
            }
            category
        })
        .collect();

    Ok(WeightCheck {
        validation: validate_weights(&adjusted, tolerance),
        plan,
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        period,
        scores,
        keep_draft,
        warn_on_invalid_weights,
    } = args;

    let config = ScoringConfig {
        weight_policy: if warn_on_invalid_weights {
            WeightPolicy::Warn
        } else {
            WeightPolicy::Enforce
        },
        ..ScoringConfig::default()
    };
    let services = build_services(&config)?;
    let today = Local::now().date_naive();
    let period = period.unwrap_or_else(|| today.year().to_string());

    println!("Performance evaluation demo");
    render_validation(&services.categories.validate_weights()?);

    let (evaluation, breakdown) =
        run_scripted_evaluation(&services, &period, today, &scores, keep_draft)?;
    render_evaluation(&services, &evaluation, &breakdown)?;

    let notices = services.notifier.events();
    if !notices.is_empty() {
        println!("\nNotices");
        for notice in notices {
            println!("- {} (evaluation {})", notice.template, notice.evaluation_id);
        }
    }
    Ok(())
}

pub(crate) fn run_scripted_evaluation(
    services: &Services,
    period: &str,
    today: NaiveDate,
    scores: &[u8],
    keep_draft: bool,
) -> Result<(Evaluation, ScoreBreakdown), AppError> {
    if scores.is_empty() {
        return Err(AppError::Usage("at least one score is required".to_string()));
    }

    let start_date = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let evaluation = services.evaluations.create_evaluation(NewEvaluation {
        evaluator_id: EmployeeId(1),
        employee_id: EmployeeId(2),
        period: period.to_string(),
        start_date,
        end_date: today.max(start_date),
    })?;

    let mut criteria = Vec::new();
    for category in services.categories.list_active_categories()? {
        criteria.extend(services.categories.list_criteria_for_category(category.id)?);
    }
    for (criteria, score) in criteria.iter().zip(scores.iter().cycle()) {
        services
            .evaluations
            .record_score(evaluation.id, criteria.id, *score)?;
    }

    let evaluation = if keep_draft {
        services.evaluations.get(evaluation.id)?
    } else {
        services.evaluations.submit(evaluation.id)?;
        services
            .evaluations
            .complete(evaluation.id, Some("Generated by the CLI demo".to_string()))?
    };
    let breakdown = services.evaluations.score_breakdown(evaluation.id)?;
    Ok((evaluation, breakdown))
}

fn render_validation(validation: &WeightValidation) {
    let verdict = if validation.is_valid { "valid" } else { "INVALID" };
    println!(
        "Active weights total {}% across {} categories ({verdict}, tolerance {})",
        validation.total_weight, validation.active_categories, validation.tolerance
    );
}

fn render_evaluation(
    services: &Services,
    evaluation: &Evaluation,
    breakdown: &ScoreBreakdown,
) -> Result<(), AppError> {
    let categories = services.categories.list_categories()?;
    println!(
        "\nEvaluation {} for employee {} ({}) is {}",
        evaluation.id, evaluation.employee_id, evaluation.period, evaluation.status
    );
    for contribution in &breakdown.categories {
        println!(
            "- {}: mean {} -> {} x {}% = {}",
            category_name(&categories, contribution.category_id),
            contribution.mean,
            contribution.normalized,
            contribution.weight,
            contribution.contribution,
        );
    }
    for missing in &breakdown.missing {
        println!(
            "- {}: no scores recorded ({}% left out)",
            category_name(&categories, missing.category_id),
            missing.weight
        );
    }
    println!("Total score: {}", evaluation.total_score);
    Ok(())
}

fn category_name(categories: &[CriteriaCategory], id: CategoryId) -> String {
    categories
        .iter()
        .find(|category| category.id == id)
        .map(|category| category.name.clone())
        .unwrap_or_else(|| format!("category {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use perf_eval::evaluations::EvaluationStatus;

    fn standard_categories() -> Vec<CriteriaCategory> {
        build_services(&ScoringConfig::default())
            .expect("services build")
            .categories
            .list_categories()
            .expect("categories")
    }

    #[test]
    fn plain_override_breaks_the_total() {
        let categories = standard_categories();
        let overrides = vec![("technical skills".to_string(), Decimal::from(50))];

        let outcome =
            check_weights(&categories, &overrides, false, Decimal::new(1, 2)).expect("checks");

        assert!(!outcome.validation.is_valid);
        assert_eq!(outcome.validation.total_weight, Decimal::from(110));
    }

    #[test]
    fn rebalanced_override_keeps_the_total() {
        let categories = standard_categories();
        let overrides = vec![("Technical Skills".to_string(), Decimal::from(50))];

        let outcome =
            check_weights(&categories, &overrides, true, Decimal::new(1, 2)).expect("checks");

        assert!(outcome.validation.is_valid);
        assert!(outcome.plan.iter().any(|line| line.fixed));
    }

    #[test]
    fn unknown_category_is_a_usage_error() {
        let categories = standard_categories();
        let overrides = vec![("Leadership".to_string(), Decimal::from(10))];

        let result = check_weights(&categories, &overrides, true, Decimal::new(1, 2));

        assert!(matches!(result, Err(AppError::Usage(_))));
    }

    #[test]
    fn scripted_evaluation_completes() {
        let services = build_services(&ScoringConfig::default()).expect("services build");
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");

        let (evaluation, breakdown) =
            run_scripted_evaluation(&services, "2025", today, &[5], false).expect("demo runs");

        assert_eq!(evaluation.status, EvaluationStatus::Completed);
        assert_eq!(evaluation.total_score, Decimal::ONE_HUNDRED);
        assert!(breakdown.missing.is_empty());
        assert_eq!(services.notifier.events().len(), 2);
    }

    #[test]
    fn scripted_evaluation_can_stay_in_draft() {
        let services = build_services(&ScoringConfig::default()).expect("services build");
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");

        let (evaluation, _) =
            run_scripted_evaluation(&services, "2025", today, &[3], true).expect("demo runs");

        assert_eq!(evaluation.status, EvaluationStatus::Draft);
        assert_eq!(evaluation.total_score, Decimal::from(60));
        assert!(services.notifier.events().is_empty());
    }
}
