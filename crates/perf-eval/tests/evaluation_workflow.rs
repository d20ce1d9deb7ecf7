use std::sync::Arc;

use chrono::NaiveDate;
use perf_eval::evaluations::{
    EmployeeId, EvaluationService, EvaluationServiceError, EvaluationStatus, NewEvaluation,
    ScoringConfig,
};
use perf_eval::governance::{
    CategoryBlueprint, CategoryService, CriteriaId, ProposedWeight, WeightError,
};
use perf_eval::memory::{InMemoryCatalog, InMemoryEvaluationStore, InMemoryNotifier};
use rust_decimal::Decimal;

type Evaluations = EvaluationService<InMemoryCatalog, InMemoryEvaluationStore, InMemoryNotifier>;

fn setup() -> (
    CategoryService<InMemoryCatalog>,
    Evaluations,
    Arc<InMemoryNotifier>,
) {
    let catalog = Arc::new(InMemoryCatalog::default());
    let config = ScoringConfig::default();
    let categories = CategoryService::new(catalog.clone(), config.weight_tolerance);
    categories
        .install_blueprint(&CategoryBlueprint::standard())
        .expect("blueprint installs");

    let notifier = Arc::new(InMemoryNotifier::default());
    let evaluations = EvaluationService::new(
        catalog,
        Arc::new(InMemoryEvaluationStore::default()),
        notifier.clone(),
        config,
    );
    (categories, evaluations, notifier)
}

fn request() -> NewEvaluation {
    NewEvaluation {
        evaluator_id: EmployeeId(1),
        employee_id: EmployeeId(2),
        period: "2025 annual".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid start"),
        end_date: NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid end"),
    }
}

fn all_criteria(categories: &CategoryService<InMemoryCatalog>) -> Vec<CriteriaId> {
    categories
        .list_active_categories()
        .expect("categories")
        .into_iter()
        .flat_map(|category| {
            categories
                .list_criteria_for_category(category.id)
                .expect("criteria")
        })
        .map(|criteria| criteria.id)
        .collect()
}

#[test]
fn perfect_scores_complete_at_one_hundred() {
    let (categories, evaluations, notifier) = setup();
    let evaluation = evaluations
        .create_evaluation(request())
        .expect("evaluation created");

    for criteria_id in all_criteria(&categories) {
        evaluations
            .record_score(evaluation.id, criteria_id, 5)
            .expect("score recorded");
    }
    evaluations.submit(evaluation.id).expect("submitted");
    let completed = evaluations
        .complete(evaluation.id, Some("Outstanding year".to_string()))
        .expect("completed");

    assert_eq!(completed.status, EvaluationStatus::Completed);
    assert_eq!(completed.total_score, Decimal::ONE_HUNDRED);
    assert_eq!(notifier.events().len(), 2);
}

#[test]
fn rebalanced_weights_flow_into_new_totals() {
    let (categories, evaluations, _notifier) = setup();
    let technical = categories
        .list_active_categories()
        .expect("categories")
        .into_iter()
        .find(|category| category.name == "Technical Skills")
        .expect("technical category");

    let plan = categories
        .rebalance_weights(&[ProposedWeight {
            category_id: technical.id,
            proposed_weight: Decimal::from(70),
        }])
        .expect("rebalance applied");
    let total: Decimal = plan.iter().map(|line| line.weight).sum();
    assert_eq!(total, Decimal::ONE_HUNDRED);
    assert!(categories.validate_weights().expect("validation").is_valid);

    let evaluation = evaluations
        .create_evaluation(request())
        .expect("evaluation created");
    let technical_criteria = categories
        .list_criteria_for_category(technical.id)
        .expect("criteria");
    let mut recorded = None;
    for criteria in technical_criteria {
        recorded = Some(
            evaluations
                .record_score(evaluation.id, criteria.id, 5)
                .expect("score recorded"),
        );
    }

    let recorded = recorded.expect("technical criteria scored");
    assert_eq!(recorded.evaluation.total_score, Decimal::from(70));
    assert_eq!(recorded.breakdown.missing.len(), 2);
}

#[test]
fn broken_weights_block_new_evaluations() {
    let (categories, evaluations, _notifier) = setup();
    let first = categories
        .list_active_categories()
        .expect("categories")
        .remove(0);
    categories
        .set_category_active(first.id, false)
        .expect("category deactivated");

    let err = evaluations
        .create_evaluation(request())
        .expect_err("weights no longer total 100");
    assert!(matches!(
        err,
        EvaluationServiceError::Weights(WeightError::WeightSumInvalid { .. })
    ));
}
