use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::catalog::QuestionCatalog;
use super::domain::{
    Answer, EvaluationId, EvaluationRecord, EvaluationSubmission, Question, QuestionId,
    ScoredAnswer, UserId,
};
use super::repository::{EvaluationRepository, RepositoryError};
use super::scorer::EvaluationScorer;

/// Service composing the question catalog, scorer, and history repository.
pub struct EvaluationService<R> {
    catalog: Arc<QuestionCatalog>,
    scorer: Arc<EvaluationScorer>,
    repository: Arc<R>,
}

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_id() -> EvaluationId {
    EvaluationId::from_sequence(EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

impl<R> EvaluationService<R>
where
    R: EvaluationRepository + 'static,
{
    pub fn new(catalog: QuestionCatalog, scorer: EvaluationScorer, repository: Arc<R>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            scorer: Arc::new(scorer),
            repository,
        }
    }

    pub fn questions(&self) -> &[Question] {
        self.catalog.questions()
    }

    /// Validate, score and persist a submission.
    ///
    /// Answer values outside 1-5 are rejected here; the scorer assumes a
    /// validated scale but tolerates question ids missing from the catalog.
    pub async fn submit(
        &self,
        user_id: UserId,
        submission: EvaluationSubmission,
    ) -> Result<EvaluationRecord, EvaluationServiceError> {
        let EvaluationSubmission { answers, notes } = submission;

        if let Some(answer) = answers.iter().find(|answer| !answer.is_within_scale()) {
            return Err(EvaluationServiceError::InvalidAnswer {
                question_id: answer.question_id,
                value: answer.value,
            });
        }

        let scored = self.scorer.score(self.catalog.questions(), &answers).await;

        let record = EvaluationRecord {
            id: next_evaluation_id(),
            user_id,
            submitted_at: Utc::now(),
            answers: self.scored_answers(&answers),
            result: scored.result,
            source: scored.source,
            notes: notes.filter(|text| !text.trim().is_empty()),
        };

        let stored = self.repository.insert(record)?;
        info!(
            user_id = user_id.0,
            evaluation_id = %stored.id.0,
            state = %stored.result.state,
            score = stored.result.score,
            source = ?stored.source,
            "evaluation recorded"
        );
        Ok(stored)
    }

    /// Evaluation history for a user, newest first.
    pub fn history(
        &self,
        user_id: UserId,
    ) -> Result<Vec<EvaluationRecord>, EvaluationServiceError> {
        let mut records = self.repository.for_user(user_id)?;
        records.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.sequence().cmp(&a.id.sequence()))
                .then_with(|| b.id.0.cmp(&a.id.0))
        });
        Ok(records)
    }

    /// Fetch one evaluation; records owned by another user read as missing.
    pub fn get(
        &self,
        user_id: UserId,
        evaluation_id: &EvaluationId,
    ) -> Result<EvaluationRecord, EvaluationServiceError> {
        let record = self
            .repository
            .fetch(evaluation_id)?
            .filter(|record| record.user_id == user_id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn scored_answers(&self, answers: &[Answer]) -> Vec<ScoredAnswer> {
        answers
            .iter()
            .map(|answer| {
                let weight = self
                    .catalog
                    .get(answer.question_id)
                    .map(|question| question.weight)
                    .unwrap_or(1);
                ScoredAnswer {
                    question_id: answer.question_id,
                    value: answer.value,
                    weighted_score: u32::from(answer.value).saturating_mul(weight),
                }
            })
            .collect()
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error("answer to question {question_id} must be between 1 and 5, got {value}")]
    InvalidAnswer { question_id: QuestionId, value: u8 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
