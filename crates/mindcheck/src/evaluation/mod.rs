//! Periodic psychological evaluations: questionnaire catalog, semaphore
//! scoring, and the append-only history kept per user.

pub mod catalog;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scorer;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::QuestionCatalog;
pub use domain::{
    Answer, EvaluationId, EvaluationRecord, EvaluationResult, EvaluationSubmission, Question,
    QuestionId, ScoredAnswer, ScoringSource, SemaphoreState, UserId,
};
pub use repository::{EvaluationRepository, EvaluationSummaryView, RepositoryError};
pub use router::evaluation_router;
pub use scorer::{
    fallback_evaluation, fallback_signals, EvaluationScorer, FallbackSignals, ReplyDefect,
    ScoredEvaluation,
};
pub use service::{EvaluationService, EvaluationServiceError};
