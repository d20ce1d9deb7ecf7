use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::domain::{
    Comment, CommentId, EmployeeId, Evaluation, EvaluationDetail, EvaluationId, EvaluationScore,
    EvaluationStatus, NewEvaluation, ScoreId,
};
use super::repository::{EvaluationNotice, EvaluationRepository, NotificationPublisher};
use super::scoring::{ScoreBreakdown, ScoringConfig, ScoringEngine};
use crate::governance::domain::CriteriaId;
use crate::governance::repository::{CategoryRepository, CriteriaRepository, RepositoryError};
use crate::governance::service::criteria_weighting;
use crate::governance::weights::{WeightError, WeightValidation};

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static SCORE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static COMMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_id() -> EvaluationId {
    EvaluationId(EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_score_id() -> ScoreId {
    ScoreId(SCORE_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_comment_id() -> CommentId {
    CommentId(COMMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// One mutex per evaluation so concurrent writes to the same evaluation run in sequence.
///
/// Slots nobody holds are dropped whenever a new one is handed out, so the map only tracks
/// evaluations with a write in flight.
#[derive(Default)]
struct EvaluationLocks {
    slots: Mutex<HashMap<EvaluationId, Arc<Mutex<()>>>>,
}

impl EvaluationLocks {
    fn slot(&self, id: EvaluationId) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|key, slot| *key == id || Arc::strong_count(slot) > 1);
        slots.entry(id).or_default().clone()
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Result of a score write: the updated evaluation, the stored row, and the fresh breakdown.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScoreRecorded {
    pub evaluation: Evaluation,
    pub score: EvaluationScore,
    pub breakdown: ScoreBreakdown,
}

/// Service composing the category catalog, evaluation storage, and scoring engine.
pub struct EvaluationService<C, E, N> {
    catalog: Arc<C>,
    store: Arc<E>,
    notices: Arc<N>,
    engine: Arc<ScoringEngine>,
    locks: EvaluationLocks,
}

impl<C, E, N> EvaluationService<C, E, N>
where
    C: CategoryRepository + CriteriaRepository + 'static,
    E: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(catalog: Arc<C>, store: Arc<E>, notices: Arc<N>, config: ScoringConfig) -> Self {
        Self {
            catalog,
            store,
            notices,
            engine: Arc::new(ScoringEngine::new(config)),
            locks: EvaluationLocks::default(),
        }
    }

    pub fn scoring_config(&self) -> &ScoringConfig {
        self.engine.config()
    }

    /// Check active weights against the configured policy.
    pub fn weight_precondition(&self) -> Result<WeightValidation, EvaluationServiceError> {
        let active = self.catalog.list_active_categories()?;
        Ok(self.engine.admit(&active)?)
    }

    /// Open a new draft evaluation for an employee and period.
    pub fn create_evaluation(
        &self,
        request: NewEvaluation,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let period = request.period.trim().to_string();
        if period.is_empty() {
            return Err(EvaluationServiceError::BlankPeriod);
        }
        if request.end_date < request.start_date {
            return Err(EvaluationServiceError::InvalidPeriod {
                start: request.start_date,
                end: request.end_date,
            });
        }
        if request.evaluator_id == request.employee_id {
            return Err(EvaluationServiceError::SelfEvaluation(request.employee_id));
        }
        self.weight_precondition()?;

        let evaluation = Evaluation {
            id: next_evaluation_id(),
            evaluator_id: request.evaluator_id,
            employee_id: request.employee_id,
            period,
            start_date: request.start_date,
            end_date: request.end_date,
            status: EvaluationStatus::Draft,
            total_score: Decimal::ZERO,
            general_comments: None,
            created_date: Utc::now(),
            updated_date: None,
            completed_date: None,
            version: 0,
        };

        let stored = self.store.insert(evaluation)?;
        info!(
            evaluation_id = %stored.id,
            employee_id = %stored.employee_id,
            period = %stored.period,
            "evaluation created"
        );
        Ok(stored)
    }

    pub fn get(&self, id: EvaluationId) -> Result<Evaluation, EvaluationServiceError> {
        self.store
            .fetch(id)?
            .ok_or(EvaluationServiceError::EvaluationNotFound(id))
    }

    pub fn detail(&self, id: EvaluationId) -> Result<EvaluationDetail, EvaluationServiceError> {
        let evaluation = self.get(id)?;
        let scores = self.store.list_scores(id)?;
        Ok(EvaluationDetail { evaluation, scores })
    }

    pub fn list_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<Evaluation>, EvaluationServiceError> {
        Ok(self.store.list_for_employee(employee_id)?)
    }

    /// Aggregate the current score rows against the current catalog weights.
    ///
    /// For completed evaluations the stored `total_score` stays authoritative; this view is
    /// informational.
    pub fn score_breakdown(
        &self,
        id: EvaluationId,
    ) -> Result<ScoreBreakdown, EvaluationServiceError> {
        self.get(id)?;
        let scores = self.store.list_scores(id)?;
        self.breakdown(&scores)
    }

    /// Insert or replace the score for one criterion and recompute the evaluation total.
    pub fn record_score(
        &self,
        id: EvaluationId,
        criteria_id: CriteriaId,
        score: u8,
    ) -> Result<ScoreRecorded, EvaluationServiceError> {
        let slot = self.locks.slot(id);
        let _serialized = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let mut evaluation = self.unlocked(id)?;
        let config = self.engine.config();
        if !config.accepts(score) {
            return Err(EvaluationServiceError::ScoreOutOfRange {
                score,
                min: config.min_score,
                max: config.max_score,
            });
        }

        let criteria = self
            .catalog
            .fetch_criteria(criteria_id)?
            .ok_or(EvaluationServiceError::CriteriaNotFound(criteria_id))?;
        if !criteria.is_active {
            return Err(EvaluationServiceError::CriteriaInactive(criteria_id));
        }
        self.weight_precondition()?;

        let now = Utc::now();
        let mut scores = self.store.list_scores(id)?;
        let row = match scores.iter_mut().find(|row| row.criteria_id == criteria_id) {
            Some(existing) => {
                existing.score = score;
                existing.updated_date = Some(now);
                existing.clone()
            }
            None => {
                let row = EvaluationScore {
                    id: next_score_id(),
                    evaluation_id: id,
                    criteria_id,
                    score,
                    created_date: now,
                    updated_date: None,
                };
                scores.push(row.clone());
                row
            }
        };

        let breakdown = self.breakdown(&scores)?;
        evaluation.total_score = breakdown.total_score;
        evaluation.updated_date = Some(now);

        let (evaluation, row) = self.store.save_score(evaluation, row)?;
        debug!(
            evaluation_id = %id,
            criteria_id = %criteria_id,
            score,
            total = %evaluation.total_score,
            "score recorded"
        );

        Ok(ScoreRecorded {
            evaluation,
            score: row,
            breakdown,
        })
    }

    /// Delete the score for one criterion and recompute the evaluation total.
    pub fn remove_score(
        &self,
        id: EvaluationId,
        criteria_id: CriteriaId,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let slot = self.locks.slot(id);
        let _serialized = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let mut evaluation = self.unlocked(id)?;
        let mut scores = self.store.list_scores(id)?;
        let position = scores
            .iter()
            .position(|row| row.criteria_id == criteria_id)
            .ok_or(EvaluationServiceError::ScoreNotFound)?;
        let removed = scores.remove(position);

        evaluation.total_score = self.breakdown(&scores)?.total_score;
        evaluation.updated_date = Some(Utc::now());

        Ok(self.store.delete_score(evaluation, removed.id)?)
    }

    /// Attach a comment to the score recorded for `criteria_id`.
    pub fn add_comment(
        &self,
        id: EvaluationId,
        criteria_id: CriteriaId,
        description: &str,
    ) -> Result<Comment, EvaluationServiceError> {
        let slot = self.locks.slot(id);
        let _serialized = slot.lock().unwrap_or_else(PoisonError::into_inner);

        self.unlocked(id)?;
        let description = description.trim();
        if description.is_empty() {
            return Err(EvaluationServiceError::BlankComment);
        }
        let score = self
            .store
            .list_scores(id)?
            .into_iter()
            .find(|row| row.criteria_id == criteria_id)
            .ok_or(EvaluationServiceError::ScoreNotFound)?;

        Ok(self.store.insert_comment(Comment {
            id: next_comment_id(),
            score_id: score.id,
            description: description.to_string(),
            is_active: true,
            created_date: Utc::now(),
        })?)
    }

    pub fn deactivate_comment(
        &self,
        id: EvaluationId,
        comment_id: CommentId,
    ) -> Result<Comment, EvaluationServiceError> {
        let slot = self.locks.slot(id);
        let _serialized = slot.lock().unwrap_or_else(PoisonError::into_inner);

        self.unlocked(id)?;
        let mut comment = self
            .store
            .fetch_comment(comment_id)?
            .ok_or(EvaluationServiceError::CommentNotFound(comment_id))?;
        let owned = self
            .store
            .list_scores(id)?
            .iter()
            .any(|row| row.id == comment.score_id);
        if !owned {
            return Err(EvaluationServiceError::CommentNotFound(comment_id));
        }

        comment.is_active = false;
        self.store.update_comment(comment.clone())?;
        Ok(comment)
    }

    pub fn comments_for_score(
        &self,
        score_id: ScoreId,
    ) -> Result<Vec<Comment>, EvaluationServiceError> {
        Ok(self.store.comments_for_score(score_id)?)
    }

    /// `Draft -> Submitted`: recompute the total and notify the next reviewer.
    pub fn submit(&self, id: EvaluationId) -> Result<Evaluation, EvaluationServiceError> {
        let evaluation = self.transition(id, EvaluationStatus::Submitted, |_| {})?;
        self.notify("evaluation_submitted", &evaluation);
        Ok(evaluation)
    }

    /// `Submitted -> Completed`: freeze the total and stamp the completion date.
    pub fn complete(
        &self,
        id: EvaluationId,
        general_comments: Option<String>,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let evaluation = self.transition(id, EvaluationStatus::Completed, |evaluation| {
            evaluation.completed_date = evaluation.updated_date;
            if let Some(comments) = general_comments {
                evaluation.general_comments = Some(comments);
            }
        })?;
        info!(
            evaluation_id = %evaluation.id,
            total = %evaluation.total_score,
            "evaluation completed"
        );
        self.notify("evaluation_completed", &evaluation);
        Ok(evaluation)
    }

    fn transition<F>(
        &self,
        id: EvaluationId,
        next: EvaluationStatus,
        finish: F,
    ) -> Result<Evaluation, EvaluationServiceError>
    where
        F: FnOnce(&mut Evaluation),
    {
        let slot = self.locks.slot(id);
        let _serialized = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let mut evaluation = self.get(id)?;
        if !evaluation.status.can_transition_to(next) {
            return Err(EvaluationServiceError::InvalidTransition {
                from: evaluation.status,
                to: next,
            });
        }

        let scores = self.store.list_scores(id)?;
        evaluation.total_score = self.breakdown(&scores)?.total_score;
        evaluation.status = next;
        evaluation.updated_date = Some(Utc::now());
        finish(&mut evaluation);

        Ok(self.store.update(evaluation)?)
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.tracked()
    }

    fn unlocked(&self, id: EvaluationId) -> Result<Evaluation, EvaluationServiceError> {
        let evaluation = self.get(id)?;
        if evaluation.status.is_locked() {
            return Err(EvaluationServiceError::EvaluationLocked(id));
        }
        Ok(evaluation)
    }

    fn breakdown(
        &self,
        scores: &[EvaluationScore],
    ) -> Result<ScoreBreakdown, EvaluationServiceError> {
        let weighting = criteria_weighting(self.catalog.as_ref())?;
        let breakdown = self.engine.score(scores, &weighting);
        for missing in &breakdown.missing {
            debug!(
                category_id = %missing.category_id,
                "category has no scored criteria; excluded from total"
            );
        }
        Ok(breakdown)
    }

    // delivery failures are logged; the state change has already been persisted
    fn notify(&self, template: &str, evaluation: &Evaluation) {
        let mut details = BTreeMap::new();
        details.insert("status".to_string(), evaluation.status.label().to_string());
        details.insert("employee_id".to_string(), evaluation.employee_id.to_string());
        details.insert(
            "evaluator_id".to_string(),
            evaluation.evaluator_id.to_string(),
        );
        details.insert(
            "total_score".to_string(),
            evaluation.total_score.to_string(),
        );

        let notice = EvaluationNotice {
            template: template.to_string(),
            evaluation_id: evaluation.id,
            details,
        };
        if let Err(err) = self.notices.publish(notice) {
            warn!(evaluation_id = %evaluation.id, error = %err, template, "notice not delivered");
        }
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error(transparent)]
    Weights(#[from] WeightError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("evaluation {0} not found")]
    EvaluationNotFound(EvaluationId),
    #[error("evaluation {0} is completed and can no longer be modified")]
    EvaluationLocked(EvaluationId),
    #[error("score {score} is outside the allowed range {min}..={max}")]
    ScoreOutOfRange { score: u8, min: u8, max: u8 },
    #[error("criteria {0} not found")]
    CriteriaNotFound(CriteriaId),
    #[error("criteria {0} is inactive")]
    CriteriaInactive(CriteriaId),
    #[error("score not found for this evaluation")]
    ScoreNotFound,
    #[error("comment {0} not found")]
    CommentNotFound(CommentId),
    #[error("cannot move evaluation from {from} to {to}")]
    InvalidTransition {
        from: EvaluationStatus,
        to: EvaluationStatus,
    },
    #[error("evaluation period ends ({end}) before it starts ({start})")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
    #[error("employee {0} cannot evaluate themselves")]
    SelfEvaluation(EmployeeId),
    #[error("period must not be blank")]
    BlankPeriod,
    #[error("comment must not be blank")]
    BlankComment,
}
