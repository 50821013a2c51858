//! Text-completion providers.
//!
//! The scorer and the support assistant only see [`CompletionProvider`]; which
//! backend answers is decided once from [`CompletionConfig`] at startup.

mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::{CompletionConfig, CompletionProviderKind};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Shape the provider should steer the model toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    Text,
    Json,
}

/// One system + user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub format: ReplyFormat,
}

impl CompletionRequest {
    pub fn text(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            format: ReplyFormat::Text,
        }
    }

    pub fn json(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            format: ReplyFormat::Json,
        }
    }

    pub(crate) fn messages(&self) -> Vec<ChatMessage<'_>> {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &self.system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &self.user_prompt,
        });
        messages
    }
}

/// Chat message in the wire shape shared by Ollama and OpenAI.
#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Opaque text-completion capability. Replies are untrusted free-form text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;

    /// Cheap reachability probe used by readiness endpoints.
    async fn health(&self) -> Result<(), CompletionError> {
        Ok(())
    }
}

/// Provider failure. Callers degrade instead of surfacing these to users.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("completion service returned an empty reply")]
    EmptyReply,
    #[error("model '{0}' is not available on the completion service")]
    ModelUnavailable(String),
    #[error("completion provider requires an API key")]
    MissingCredentials,
    #[error("completion provider is disabled")]
    Disabled,
}

/// Stand-in used when no model is configured; every call fails fast.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

#[async_trait]
impl CompletionProvider for DisabledProvider {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        Err(CompletionError::Disabled)
    }

    async fn health(&self) -> Result<(), CompletionError> {
        Err(CompletionError::Disabled)
    }
}

/// Construct the configured provider.
pub fn build_provider(
    config: &CompletionConfig,
) -> Result<Arc<dyn CompletionProvider>, CompletionError> {
    let provider: Arc<dyn CompletionProvider> = match config.provider {
        CompletionProviderKind::Ollama => Arc::new(OllamaProvider::new(config)?),
        CompletionProviderKind::OpenAi => Arc::new(OpenAiProvider::new(config)?),
        CompletionProviderKind::Disabled => Arc::new(DisabledProvider),
    };
    Ok(provider)
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, CompletionError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Turn a non-2xx response into [`CompletionError::Status`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, CompletionError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(CompletionError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_skip_empty_system_prompt() {
        let request = CompletionRequest::text("", "hello");
        let messages = request.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");

        let request = CompletionRequest::json("be terse", "hello");
        let roles: Vec<_> = request.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user"]);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:11434/", "/api/chat"),
            "http://localhost:11434/api/chat"
        );
    }

    #[test]
    fn build_provider_honours_kind() {
        let provider = build_provider(&CompletionConfig::disabled()).expect("disabled builds");
        assert_eq!(provider.name(), "disabled");

        let provider = build_provider(&CompletionConfig::default()).expect("ollama builds");
        assert_eq!(provider.name(), "ollama");

        let openai = CompletionConfig {
            provider: CompletionProviderKind::OpenAi,
            ..CompletionConfig::default()
        };
        assert!(matches!(
            build_provider(&openai),
            Err(CompletionError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn disabled_provider_always_fails() {
        let provider = DisabledProvider;
        let result = provider
            .complete(CompletionRequest::text("system", "user"))
            .await;
        assert!(matches!(result, Err(CompletionError::Disabled)));
        assert!(provider.health().await.is_err());
    }
}
