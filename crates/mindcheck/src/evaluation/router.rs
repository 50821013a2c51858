use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{EvaluationId, EvaluationSubmission, UserId};
use super::repository::{EvaluationRepository, EvaluationSummaryView, RepositoryError};
use super::service::{EvaluationService, EvaluationServiceError};

/// Router builder exposing the questionnaire and per-user evaluation history.
pub fn evaluation_router<R>(service: Arc<EvaluationService<R>>) -> Router
where
    R: EvaluationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/evaluations/questions",
            get(questions_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/evaluations",
            get(history_handler::<R>).post(submit_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/evaluations/:evaluation_id",
            get(detail_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn questions_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    (StatusCode::OK, Json(service.questions().to_vec())).into_response()
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(user_id): Path<u32>,
    Json(submission): Json<EvaluationSubmission>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.submit(UserId(user_id), submission).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error @ EvaluationServiceError::InvalidAnswer { .. }) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn history_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(user_id): Path<u32>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.history(UserId(user_id)) {
        Ok(records) => {
            let views: Vec<EvaluationSummaryView> =
                records.iter().map(|record| record.summary_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn detail_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path((user_id, evaluation_id)): Path<(u32, String)>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let id = EvaluationId(evaluation_id);
    match service.get(UserId(user_id), &id) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(EvaluationServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "evaluation not found",
                "evaluation_id": id.0,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

fn internal_error(error: EvaluationServiceError) -> Response {
    tracing::error!(%error, "evaluation request failed");
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
