use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::evaluations::domain::{
    Comment, CommentId, EmployeeId, Evaluation, EvaluationId, EvaluationScore, EvaluationStatus,
    NewEvaluation, ScoreId,
};
use crate::evaluations::repository::{
    EvaluationNotice, EvaluationRepository, NotificationPublisher, NotifyError,
};
use crate::governance::repository::RepositoryError;
use crate::evaluations::scoring::ScoringConfig;
use crate::evaluations::service::EvaluationService;
use crate::governance::domain::{
    CategoryId, CriteriaCategory, CriteriaId, CriteriaWeighting, NewCategory, NewCriteria,
};
use crate::governance::weights::default_tolerance;
use crate::governance::CategoryService;
use crate::memory::{InMemoryCatalog, InMemoryEvaluationStore, InMemoryNotifier};

pub(super) type MemoryService =
    EvaluationService<InMemoryCatalog, InMemoryEvaluationStore, InMemoryNotifier>;

pub(super) fn dec(raw: &str) -> Decimal {
    raw.parse().expect("valid decimal literal")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn new_evaluation() -> NewEvaluation {
    NewEvaluation {
        evaluator_id: EmployeeId(10),
        employee_id: EmployeeId(20),
        period: "2025-H1".to_string(),
        start_date: date(2025, 1, 1),
        end_date: date(2025, 6, 30),
    }
}

/// Catalog with "Technical" (60%, two criteria) and "Communication" (40%, one criterion).
pub(super) struct Fixture {
    pub(super) service: MemoryService,
    pub(super) categories: CategoryService<InMemoryCatalog>,
    pub(super) store: Arc<InMemoryEvaluationStore>,
    pub(super) notifier: Arc<InMemoryNotifier>,
    pub(super) technical: CriteriaCategory,
    pub(super) communication: CriteriaCategory,
    pub(super) code_quality: CriteriaId,
    pub(super) problem_solving: CriteriaId,
    pub(super) clarity: CriteriaId,
}

pub(super) fn fixture() -> Fixture {
    fixture_with(ScoringConfig::default())
}

pub(super) fn fixture_with(config: ScoringConfig) -> Fixture {
    let catalog = Arc::new(InMemoryCatalog::default());
    let categories = CategoryService::new(catalog.clone(), default_tolerance());

    let technical = categories
        .create_category(NewCategory {
            name: "Technical".to_string(),
            description: None,
            weight: dec("60"),
        })
        .expect("technical category");
    let communication = categories
        .create_category(NewCategory {
            name: "Communication".to_string(),
            description: None,
            weight: dec("40"),
        })
        .expect("communication category");

    let criteria = |category_id: CategoryId, name: &str| {
        categories
            .create_criteria(NewCriteria {
                category_id,
                name: name.to_string(),
                base_description: format!("{name} description"),
            })
            .expect("criteria created")
            .id
    };
    let code_quality = criteria(technical.id, "Code Quality");
    let problem_solving = criteria(technical.id, "Problem Solving");
    let clarity = criteria(communication.id, "Clarity");

    let store = Arc::new(InMemoryEvaluationStore::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let service = EvaluationService::new(catalog, store.clone(), notifier.clone(), config);

    Fixture {
        service,
        categories,
        store,
        notifier,
        technical,
        communication,
        code_quality,
        problem_solving,
        clarity,
    }
}

pub(super) fn weighting(
    entries: &[(u64, u64, &str)],
) -> HashMap<CriteriaId, CriteriaWeighting> {
    entries
        .iter()
        .map(|(criteria, category, weight)| {
            (
                CriteriaId(*criteria),
                CriteriaWeighting {
                    category_id: CategoryId(*category),
                    category_weight: dec(weight),
                },
            )
        })
        .collect()
}

/// Publisher whose transport is always down.
pub(super) struct OfflineNotifier;

impl NotificationPublisher for OfflineNotifier {
    fn publish(&self, _notice: EvaluationNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

/// Store that counts comment writes landing on an evaluation that is already completed.
#[derive(Default)]
pub(super) struct CommentAuditStore {
    inner: InMemoryEvaluationStore,
    evaluations: Mutex<Vec<EvaluationId>>,
    pub(super) writes_after_completion: AtomicUsize,
}

impl CommentAuditStore {
    fn audit(&self, score_id: ScoreId) -> Result<(), RepositoryError> {
        let ids = self.evaluations.lock().expect("audit ids").clone();
        for id in ids {
            let owns = self.inner.list_scores(id)?.iter().any(|row| row.id == score_id);
            let completed = EvaluationRepository::fetch(&self.inner, id)?
                .is_some_and(|evaluation| evaluation.status == EvaluationStatus::Completed);
            if owns && completed {
                self.writes_after_completion.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

impl EvaluationRepository for CommentAuditStore {
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        self.evaluations.lock().expect("audit ids").push(evaluation.id);
        self.inner.insert(evaluation)
    }

    fn fetch(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        EvaluationRepository::fetch(&self.inner, id)
    }

    fn update(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        EvaluationRepository::update(&self.inner, evaluation)
    }

    fn list_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        self.inner.list_for_employee(employee_id)
    }

    fn list_scores(&self, id: EvaluationId) -> Result<Vec<EvaluationScore>, RepositoryError> {
        self.inner.list_scores(id)
    }

    fn save_score(
        &self,
        evaluation: Evaluation,
        score: EvaluationScore,
    ) -> Result<(Evaluation, EvaluationScore), RepositoryError> {
        self.inner.save_score(evaluation, score)
    }

    fn delete_score(
        &self,
        evaluation: Evaluation,
        score_id: ScoreId,
    ) -> Result<Evaluation, RepositoryError> {
        self.inner.delete_score(evaluation, score_id)
    }

    fn insert_comment(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        self.audit(comment.score_id)?;
        self.inner.insert_comment(comment)
    }

    fn update_comment(&self, comment: Comment) -> Result<(), RepositoryError> {
        self.audit(comment.score_id)?;
        self.inner.update_comment(comment)
    }

    fn fetch_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        self.inner.fetch_comment(id)
    }

    fn comments_for_score(&self, score_id: ScoreId) -> Result<Vec<Comment>, RepositoryError> {
        self.inner.comments_for_score(score_id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
