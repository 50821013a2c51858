//! Evaluation scorer: model-backed analysis with a deterministic fallback.
//!
//! [`EvaluationScorer::score`] never fails. Transport errors, timeouts and
//! malformed replies are logged and answered by the weighted-sum heuristic in
//! [`fallback`].

pub mod fallback;
pub mod parse;
pub(crate) mod prompt;

pub use fallback::FallbackSignals;
pub use parse::{parse_reply, ReplyDefect};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{Answer, EvaluationResult, Question, ScoringSource};
use crate::completion::{CompletionError, CompletionProvider};

/// Scorer output together with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredEvaluation {
    pub result: EvaluationResult,
    pub source: ScoringSource,
}

#[derive(Debug, thiserror::Error)]
enum AnalysisFailure {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Reply(#[from] ReplyDefect),
}

/// Stateless classifier over a completion provider.
pub struct EvaluationScorer {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl EvaluationScorer {
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    /// Classify an answer set. Always returns a complete result.
    pub async fn classify(&self, questions: &[Question], answers: &[Answer]) -> EvaluationResult {
        self.score(questions, answers).await.result
    }

    pub async fn score(&self, questions: &[Question], answers: &[Answer]) -> ScoredEvaluation {
        let items = prompt::join_answers(questions, answers);

        match self.request_analysis(&items).await {
            Ok(result) => {
                debug!(
                    provider = self.provider.name(),
                    state = %result.state,
                    score = result.score,
                    "model analysis accepted"
                );
                ScoredEvaluation {
                    result,
                    source: ScoringSource::Model,
                }
            }
            Err(reason) => {
                warn!(
                    provider = self.provider.name(),
                    %reason,
                    "model analysis unavailable, using fallback scoring"
                );
                ScoredEvaluation {
                    result: fallback::evaluate(&items),
                    source: ScoringSource::Fallback,
                }
            }
        }
    }

    async fn request_analysis(
        &self,
        items: &[prompt::WeightedAnswer<'_>],
    ) -> Result<EvaluationResult, AnalysisFailure> {
        let request = prompt::evaluation_request(items);
        let reply = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| CompletionError::Timeout(self.timeout))??;
        Ok(parse_reply(&reply)?)
    }
}

/// Deterministic path only, with no provider involved.
pub fn fallback_evaluation(questions: &[Question], answers: &[Answer]) -> EvaluationResult {
    fallback::evaluate(&prompt::join_answers(questions, answers))
}

/// Weighted sum and high-severity ratio for an answer set.
pub fn fallback_signals(questions: &[Question], answers: &[Answer]) -> FallbackSignals {
    FallbackSignals::collect(&prompt::join_answers(questions, answers))
}
