use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::completion::{CompletionError, CompletionProvider, CompletionRequest};
use crate::evaluation::catalog::QuestionCatalog;
use crate::evaluation::domain::{
    Answer, EvaluationId, EvaluationRecord, EvaluationSubmission, Question, QuestionId,
    ScoringSource, UserId,
};
use crate::evaluation::repository::{EvaluationRepository, RepositoryError};
use crate::evaluation::scorer::EvaluationScorer;
use crate::evaluation::{evaluation_router, fallback_evaluation, EvaluationService};

pub(super) const MODEL_REPLY: &str = r#"{
    "state": "yellow",
    "score": 48,
    "observations": "Moderate stress with disrupted sleep.",
    "recommendations": [
        "Keep a regular bedtime",
        "Schedule short breaks during study sessions",
        "Talk with someone you trust this week"
    ]
}"#;

/// Provider answering every request with the same text.
pub(super) struct StaticProvider {
    reply: String,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub(super) fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub(super) struct FailingProvider;

#[async_trait]
impl CompletionProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        Err(CompletionError::Status {
            status: 500,
            body: "model crashed".to_string(),
        })
    }
}

/// Provider that outlives any reasonable scorer timeout.
pub(super) struct SlowProvider;

#[async_trait]
impl CompletionProvider for SlowProvider {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(MODEL_REPLY.to_string())
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<Vec<EvaluationRecord>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl EvaluationRepository for MemoryRepository {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn for_user(&self, user_id: UserId) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableRepository;

impl EvaluationRepository for UnavailableRepository {
    fn insert(&self, _record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_user(&self, _user_id: UserId) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn question(id: u32, weight: u32) -> Question {
    Question {
        id: QuestionId(id),
        text: format!("Question {id}"),
        weight,
    }
}

pub(super) fn answers(pairs: &[(u32, u8)]) -> Vec<Answer> {
    pairs
        .iter()
        .map(|&(id, value)| Answer {
            question_id: QuestionId(id),
            value,
        })
        .collect()
}

pub(super) fn submission(pairs: &[(u32, u8)]) -> EvaluationSubmission {
    EvaluationSubmission {
        answers: answers(pairs),
        notes: None,
    }
}

/// Answers 1-5 to the first five standard questions.
pub(super) fn mixed_submission() -> EvaluationSubmission {
    submission(&[(1, 2), (2, 3), (3, 1), (4, 4), (5, 2)])
}

/// Stored record built directly, bypassing the id sequence and clock.
pub(super) fn stored_record(
    id: &str,
    user_id: u32,
    submitted_at: DateTime<Utc>,
) -> EvaluationRecord {
    let catalog = QuestionCatalog::standard();
    EvaluationRecord {
        id: EvaluationId(id.to_string()),
        user_id: UserId(user_id),
        submitted_at,
        answers: Vec::new(),
        result: fallback_evaluation(catalog.questions(), &[]),
        source: ScoringSource::Fallback,
        notes: None,
    }
}

pub(super) fn scorer(provider: impl CompletionProvider + 'static) -> EvaluationScorer {
    EvaluationScorer::new(Arc::new(provider), Duration::from_millis(200))
}

pub(super) fn offline_scorer() -> EvaluationScorer {
    scorer(FailingProvider)
}

pub(super) fn build_service() -> (
    EvaluationService<MemoryRepository>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let service = EvaluationService::new(
        QuestionCatalog::standard(),
        offline_scorer(),
        repository.clone(),
    );
    (service, repository)
}

pub(super) fn evaluation_router_with_service(
    service: EvaluationService<MemoryRepository>,
) -> axum::Router {
    evaluation_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
