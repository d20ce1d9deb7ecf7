use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Comment, CommentId, EmployeeId, Evaluation, EvaluationId, EvaluationScore, ScoreId,
};
use crate::governance::repository::RepositoryError;

/// Storage abstraction for evaluations, their score rows, and comments.
///
/// Every method that takes an [`Evaluation`] is version-checked: the stored version must equal
/// `evaluation.version`, otherwise [`RepositoryError::StaleVersion`] is returned and nothing is
/// written. Successful writes return the evaluation with its bumped version.
pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError>;
    fn fetch(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError>;
    fn update(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError>;
    fn list_for_employee(&self, employee_id: EmployeeId)
        -> Result<Vec<Evaluation>, RepositoryError>;

    fn list_scores(&self, id: EvaluationId) -> Result<Vec<EvaluationScore>, RepositoryError>;
    /// Upsert a score row and persist the recomputed evaluation in one write.
    fn save_score(
        &self,
        evaluation: Evaluation,
        score: EvaluationScore,
    ) -> Result<(Evaluation, EvaluationScore), RepositoryError>;
    /// Remove a score row (and its comments) and persist the recomputed evaluation.
    fn delete_score(
        &self,
        evaluation: Evaluation,
        score_id: ScoreId,
    ) -> Result<Evaluation, RepositoryError>;

    fn insert_comment(&self, comment: Comment) -> Result<Comment, RepositoryError>;
    fn update_comment(&self, comment: Comment) -> Result<(), RepositoryError>;
    fn fetch_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError>;
    fn comments_for_score(&self, score_id: ScoreId) -> Result<Vec<Comment>, RepositoryError>;
}

/// Outbound hook for workflow notices (HR review queues, e-mail adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: EvaluationNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationNotice {
    pub template: String,
    pub evaluation_id: EvaluationId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
