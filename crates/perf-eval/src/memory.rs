//! Mutex-backed repository implementations used by the demo server and the test suites.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::evaluations::domain::{
    Comment, CommentId, EmployeeId, Evaluation, EvaluationId, EvaluationScore, ScoreId,
};
use crate::evaluations::repository::{
    EvaluationNotice, EvaluationRepository, NotificationPublisher, NotifyError,
};
use crate::governance::domain::{
    CategoryId, Criteria, CriteriaCategory, CriteriaId, RoleCriteriaDescription, RoleId,
};
use crate::governance::repository::{CategoryRepository, CriteriaRepository, RepositoryError};
use crate::governance::weights::AppliedWeight;

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} mutex poisoned")))
}

#[derive(Debug, Default)]
struct CatalogState {
    categories: BTreeMap<CategoryId, CriteriaCategory>,
    criteria: BTreeMap<CriteriaId, Criteria>,
    role_descriptions: HashMap<(CriteriaId, RoleId), RoleCriteriaDescription>,
}

/// Category and criteria storage held behind a single lock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl CategoryRepository for InMemoryCatalog {
    fn insert(&self, category: CriteriaCategory) -> Result<CriteriaCategory, RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "catalog")?;
        if guard.categories.contains_key(&category.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.categories.insert(category.id, category.clone());
        Ok(category)
    }

    fn update(&self, category: CriteriaCategory) -> Result<(), RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "catalog")?;
        match guard.categories.get_mut(&category.id) {
            Some(slot) => {
                *slot = category;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: CategoryId) -> Result<Option<CriteriaCategory>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "catalog")?;
        Ok(guard.categories.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<CriteriaCategory>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "catalog")?;
        Ok(guard.categories.values().cloned().collect())
    }

    fn update_weights(
        &self,
        weights: &[AppliedWeight],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "catalog")?;
        for line in weights {
            match guard.categories.get(&line.category_id) {
                None => return Err(RepositoryError::NotFound),
                Some(current) if !current.is_active || current.weight != line.previous_weight => {
                    return Err(RepositoryError::StaleVersion)
                }
                Some(_) => {}
            }
        }
        let active = guard.categories.values().filter(|c| c.is_active).count();
        if active != weights.len() {
            return Err(RepositoryError::StaleVersion);
        }

        for line in weights {
            if let Some(category) = guard.categories.get_mut(&line.category_id) {
                category.weight = line.weight;
                category.updated_date = Some(updated_at);
            }
        }
        Ok(())
    }
}

impl CriteriaRepository for InMemoryCatalog {
    fn insert_criteria(&self, criteria: Criteria) -> Result<Criteria, RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "catalog")?;
        if guard.criteria.contains_key(&criteria.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.criteria.insert(criteria.id, criteria.clone());
        Ok(criteria)
    }

    fn update_criteria(&self, criteria: Criteria) -> Result<(), RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "catalog")?;
        match guard.criteria.get_mut(&criteria.id) {
            Some(slot) => {
                *slot = criteria;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_criteria(&self, id: CriteriaId) -> Result<Option<Criteria>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "catalog")?;
        Ok(guard.criteria.get(&id).cloned())
    }

    fn list_criteria(&self) -> Result<Vec<Criteria>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "catalog")?;
        Ok(guard.criteria.values().cloned().collect())
    }

    fn upsert_role_description(
        &self,
        description: RoleCriteriaDescription,
    ) -> Result<RoleCriteriaDescription, RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "catalog")?;
        guard.role_descriptions.insert(
            (description.criteria_id, description.role_id),
            description.clone(),
        );
        Ok(description)
    }

    fn role_description(
        &self,
        criteria_id: CriteriaId,
        role_id: RoleId,
    ) -> Result<Option<RoleCriteriaDescription>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "catalog")?;
        Ok(guard.role_descriptions.get(&(criteria_id, role_id)).cloned())
    }
}

#[derive(Debug, Default)]
struct EvaluationState {
    evaluations: BTreeMap<EvaluationId, Evaluation>,
    scores: BTreeMap<ScoreId, EvaluationScore>,
    comments: BTreeMap<CommentId, Comment>,
}

impl EvaluationState {
    fn check_version(&self, evaluation: &Evaluation) -> Result<(), RepositoryError> {
        match self.evaluations.get(&evaluation.id) {
            Some(stored) if stored.version == evaluation.version => Ok(()),
            Some(_) => Err(RepositoryError::StaleVersion),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn store_next_version(&mut self, mut evaluation: Evaluation) -> Evaluation {
        evaluation.version += 1;
        self.evaluations.insert(evaluation.id, evaluation.clone());
        evaluation
    }
}

/// Evaluations, score rows, and comments behind a single lock so score writes and total
/// updates land together.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEvaluationStore {
    state: Arc<Mutex<EvaluationState>>,
}

impl EvaluationRepository for InMemoryEvaluationStore {
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "evaluation")?;
        if guard.evaluations.contains_key(&evaluation.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.evaluations.insert(evaluation.id, evaluation.clone());
        Ok(evaluation)
    }

    fn fetch(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "evaluation")?;
        Ok(guard.evaluations.get(&id).cloned())
    }

    fn update(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "evaluation")?;
        guard.check_version(&evaluation)?;
        Ok(guard.store_next_version(evaluation))
    }

    fn list_for_employee(&self, employee_id: EmployeeId) -> Result<Vec<Evaluation>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "evaluation")?;
        Ok(guard
            .evaluations
            .values()
            .filter(|evaluation| evaluation.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn list_scores(&self, id: EvaluationId) -> Result<Vec<EvaluationScore>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "evaluation")?;
        Ok(guard
            .scores
            .values()
            .filter(|score| score.evaluation_id == id)
            .cloned()
            .collect())
    }

    fn save_score(
        &self,
        evaluation: Evaluation,
        score: EvaluationScore,
    ) -> Result<(Evaluation, EvaluationScore), RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "evaluation")?;
        guard.check_version(&evaluation)?;

        let duplicate = guard.scores.values().any(|existing| {
            existing.id != score.id
                && existing.evaluation_id == score.evaluation_id
                && existing.criteria_id == score.criteria_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        guard.scores.insert(score.id, score.clone());
        let evaluation = guard.store_next_version(evaluation);
        Ok((evaluation, score))
    }

    fn delete_score(
        &self,
        evaluation: Evaluation,
        score_id: ScoreId,
    ) -> Result<Evaluation, RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "evaluation")?;
        guard.check_version(&evaluation)?;
        if guard.scores.remove(&score_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        guard.comments.retain(|_, comment| comment.score_id != score_id);
        Ok(guard.store_next_version(evaluation))
    }

    fn insert_comment(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "evaluation")?;
        if guard.comments.contains_key(&comment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    fn update_comment(&self, comment: Comment) -> Result<(), RepositoryError> {
        let mut guard = lock(self.state.as_ref(), "evaluation")?;
        match guard.comments.get_mut(&comment.id) {
            Some(slot) => {
                *slot = comment;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "evaluation")?;
        Ok(guard.comments.get(&id).cloned())
    }

    fn comments_for_score(&self, score_id: ScoreId) -> Result<Vec<Comment>, RepositoryError> {
        let guard = lock(self.state.as_ref(), "evaluation")?;
        Ok(guard
            .comments
            .values()
            .filter(|comment| comment.score_id == score_id)
            .cloned()
            .collect())
    }
}

/// Records every notice so callers can inspect what would have been sent.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotifier {
    events: Arc<Mutex<Vec<EvaluationNotice>>>,
}

impl InMemoryNotifier {
    pub fn events(&self) -> Vec<EvaluationNotice> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl NotificationPublisher for InMemoryNotifier {
    fn publish(&self, notice: EvaluationNotice) -> Result<(), NotifyError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotifyError::Transport("notifier mutex poisoned".to_string()))?;
        guard.push(notice);
        Ok(())
    }
}
