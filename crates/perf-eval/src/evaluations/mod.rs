//! Evaluation records, score capture, and weighted total aggregation.

pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Comment, CommentId, EmployeeId, Evaluation, EvaluationDetail, EvaluationId, EvaluationScore,
    EvaluationStatus, NewEvaluation, ScoreId,
};
pub use repository::{EvaluationNotice, EvaluationRepository, NotificationPublisher, NotifyError};
pub use router::evaluation_router;
pub use scoring::{
    compute_total_score, CategoryContribution, MissingCriteriaScore, ScoreBreakdown, ScoreEntry,
    ScoringConfig, ScoringEngine, WeightPolicy,
};
pub use service::{EvaluationService, EvaluationServiceError, ScoreRecorded};
