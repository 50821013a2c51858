use metrics_exporter_prometheus::PrometheusHandle;
use mindcheck::assistant::SupportAssistant;
use mindcheck::completion::build_provider;
use mindcheck::config::{AppConfig, CompletionConfig};
use mindcheck::error::AppError;
use mindcheck::evaluation::{
    Answer, EvaluationId, EvaluationRecord, EvaluationRepository, EvaluationScorer,
    EvaluationService, QuestionCatalog, QuestionId, RepositoryError, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationRepository {
    records: Arc<Mutex<HashMap<EvaluationId, EvaluationRecord>>>,
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    fn for_user(&self, user_id: UserId) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))?;
        Ok(guard
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }
}

pub(crate) type InMemoryEvaluationService = EvaluationService<InMemoryEvaluationRepository>;

/// Services sharing one completion provider.
pub(crate) struct Components {
    pub(crate) evaluations: Arc<InMemoryEvaluationService>,
    pub(crate) assistant: Arc<SupportAssistant>,
}

pub(crate) fn build_components(config: &CompletionConfig) -> Result<Components, AppError> {
    let provider = build_provider(config)?;
    let scorer = EvaluationScorer::new(provider.clone(), config.timeout);
    let evaluations = Arc::new(EvaluationService::new(
        QuestionCatalog::standard(),
        scorer,
        Arc::new(InMemoryEvaluationRepository::default()),
    ));
    let assistant = Arc::new(SupportAssistant::new(provider, config.timeout));

    Ok(Components {
        evaluations,
        assistant,
    })
}

/// Completion settings for one-shot commands; `offline` skips the environment.
pub(crate) fn completion_config(offline: bool) -> Result<CompletionConfig, AppError> {
    if offline {
        Ok(CompletionConfig::disabled())
    } else {
        Ok(AppConfig::load()?.completion)
    }
}

/// Parse a `QUESTION_ID=VALUE` pair from the command line.
pub(crate) fn parse_answer(raw: &str) -> Result<Answer, String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION_ID=VALUE, got '{raw}'"))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid question id '{}' ({err})", id.trim()))?;
    let value = value
        .trim()
        .parse::<u8>()
        .map_err(|err| format!("invalid answer value '{}' ({err})", value.trim()))?;

    let answer = Answer {
        question_id: QuestionId(id),
        value,
    };
    if !answer.is_within_scale() {
        return Err(format!(
            "answer to question {id} must be between {} and {}, got {value}",
            Answer::MIN_VALUE,
            Answer::MAX_VALUE
        ));
    }
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answer_accepts_pairs_with_whitespace() {
        let answer = parse_answer(" 7 = 4 ").expect("valid pair");
        assert_eq!(answer.question_id, QuestionId(7));
        assert_eq!(answer.value, 4);
    }

    #[test]
    fn parse_answer_rejects_malformed_and_out_of_scale_input() {
        assert!(parse_answer("7").unwrap_err().contains("QUESTION_ID=VALUE"));
        assert!(parse_answer("x=3").unwrap_err().contains("question id"));
        assert!(parse_answer("3=6").unwrap_err().contains("between 1 and 5"));
    }

    #[tokio::test]
    async fn offline_components_score_with_fallback() {
        let components = build_components(&CompletionConfig::disabled()).expect("components");

        let record = components
            .evaluations
            .submit(
                UserId(1),
                mindcheck::evaluation::EvaluationSubmission {
                    answers: vec![parse_answer("7=5").expect("valid")],
                    notes: None,
                },
            )
            .await
            .expect("submitted");

        assert_eq!(
            record.source,
            mindcheck::evaluation::ScoringSource::Fallback
        );
        assert_eq!(components.assistant.provider_name(), "disabled");
    }
}
