use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{EvaluationId, EvaluationRecord, ScoringSource, SemaphoreState, UserId};

impl EvaluationRecord {
    pub fn summary_view(&self) -> EvaluationSummaryView {
        EvaluationSummaryView {
            id: self.id.clone(),
            submitted_at: self.submitted_at,
            state: self.result.state,
            score: self.result.score,
            source: self.source,
        }
    }
}

/// Storage abstraction so the service can be exercised in isolation.
///
/// Records are append-only; there is no update operation.
pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError>;
    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError>;
    fn for_user(&self, user_id: UserId) -> Result<Vec<EvaluationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Compact history entry for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationSummaryView {
    pub id: EvaluationId,
    pub submitted_at: DateTime<Utc>,
    pub state: SemaphoreState,
    pub score: u8,
    pub source: ScoringSource,
}
