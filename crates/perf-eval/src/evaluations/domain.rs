use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::governance::domain::CriteriaId;

numeric_id!(EvaluationId);
numeric_id!(ScoreId);
numeric_id!(CommentId);
// evaluators and employees share the user id space
numeric_id!(EmployeeId);

/// Lifecycle of an evaluation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Draft,
    Submitted,
    Completed,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Draft => "draft",
            EvaluationStatus::Submitted => "submitted",
            EvaluationStatus::Completed => "completed",
        }
    }

    pub const fn can_transition_to(self, next: EvaluationStatus) -> bool {
        matches!(
            (self, next),
            (EvaluationStatus::Draft, EvaluationStatus::Submitted)
                | (EvaluationStatus::Submitted, EvaluationStatus::Completed)
        )
    }

    /// Completed evaluations are frozen: no score, comment, or total changes.
    pub const fn is_locked(self) -> bool {
        matches!(self, EvaluationStatus::Completed)
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One evaluator / employee / period record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub evaluator_id: EmployeeId,
    pub employee_id: EmployeeId,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: EvaluationStatus,
    pub total_score: Decimal,
    pub general_comments: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped by the repository on every write.
    pub version: u64,
}

/// Raw score for one criterion in one evaluation. Unique on `(criteria_id, evaluation_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub id: ScoreId,
    pub evaluation_id: EvaluationId,
    pub criteria_id: CriteriaId,
    pub score: u8,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

/// Free text attached to a score row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub score_id: ScoreId,
    pub description: String,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvaluation {
    pub evaluator_id: EmployeeId,
    pub employee_id: EmployeeId,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Evaluation together with its score rows, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationDetail {
    pub evaluation: Evaluation,
    pub scores: Vec<EvaluationScore>,
}
