//! Conversational support assistant backed by the same completion provider.
//!
//! Replies stay on emotional well-being topics. Provider failures produce a
//! fixed apology instead of an error.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::completion::{CompletionError, CompletionProvider, CompletionRequest};

const SYSTEM_PROMPT: &str = "You are a therapeutic assistant specialised in mental health and \
emotional well-being. Offer empathetic, professional conversational support focused only on \
mental health, emotions and personal well-being.\n\
IMPORTANT:\n\
- Only discuss mental health, emotions, personal well-being and personal growth\n\
- If the user asks about other topics (programming, homework, technology, etc.), gently steer back to emotional topics\n\
- Keep a warm, empathetic and professional tone\n\
- If you notice signs of crisis or thoughts of self-harm, recommend seeking professional help immediately\n\
- Avoid giving specific clinical diagnoses\n\
- Be conservative and empathetic in your replies";

pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't process your message right now. Please try again in a moment.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply: String,
    pub timestamp: DateTime<Utc>,
    /// True when the provider failed and the canned reply was returned.
    pub fallback: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("message must not be empty")]
    EmptyMessage,
}

pub struct SupportAssistant {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl SupportAssistant {
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn reply(
        &self,
        message: AssistantMessage,
    ) -> Result<AssistantReply, AssistantError> {
        let text = message.message.trim();
        if text.is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        let prompt = match message.context.as_deref().map(str::trim) {
            Some(context) if !context.is_empty() => {
                format!("Context: {context}\n\nQuestion: {text}")
            }
            _ => text.to_string(),
        };

        let request = CompletionRequest::text(SYSTEM_PROMPT, prompt);
        let outcome = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .unwrap_or(Err(CompletionError::Timeout(self.timeout)));

        let (reply, fallback) = match outcome {
            Ok(reply) => (reply.trim().to_string(), false),
            Err(error) => {
                warn!(provider = self.provider.name(), %error, "assistant reply unavailable");
                (FALLBACK_REPLY.to_string(), true)
            }
        };

        Ok(AssistantReply {
            reply,
            timestamp: Utc::now(),
            fallback,
        })
    }

    pub async fn health(&self) -> Result<(), CompletionError> {
        self.provider.health().await
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

pub fn assistant_router(assistant: Arc<SupportAssistant>) -> Router {
    Router::new()
        .route("/api/v1/assistant/chat", post(chat_handler))
        .route("/api/v1/assistant/health", get(health_handler))
        .with_state(assistant)
}

pub(crate) async fn chat_handler(
    State(assistant): State<Arc<SupportAssistant>>,
    Json(message): Json<AssistantMessage>,
) -> Response {
    match assistant.reply(message).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn health_handler(State(assistant): State<Arc<SupportAssistant>>) -> Response {
    let provider = assistant.provider_name();
    match assistant.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "provider": provider })),
        )
            .into_response(),
        Err(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unavailable",
                "provider": provider,
                "error": error.to_string(),
            })),
        )
            .into_response(),
    }
}
