use super::{
    endpoint, ensure_success, http_client, ChatMessage, CompletionError, CompletionProvider,
    CompletionRequest, ReplyFormat,
};
use crate::config::CompletionConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Local model server speaking the Ollama chat API.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: SamplingOptions,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaProvider {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        Ok(Self {
            client: http_client(config.timeout)?,
            base_url: config.ollama_url.clone(),
            model: config.ollama_model.clone(),
            temperature: config.temperature,
        })
    }

    /// Model family without the tag, e.g. `qwen2.5` for `qwen2.5:0.5b`.
    fn model_family(&self) -> &str {
        self.model.split(':').next().unwrap_or(&self.model)
    }

    fn is_listed(&self, tags: &TagsResponse) -> bool {
        let family = self.model_family().trim();
        !family.is_empty() && tags.models.iter().any(|tag| tag.name.contains(family))
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        debug!(model = %self.model, "requesting ollama chat completion");

        let body = ChatRequest {
            model: &self.model,
            messages: request.messages(),
            stream: false,
            format: match request.format {
                ReplyFormat::Json => Some("json"),
                ReplyFormat::Text => None,
            },
            options: SamplingOptions {
                temperature: self.temperature,
                top_p: 0.9,
                top_k: 40,
            },
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "/api/chat"))
            .json(&body)
            .send()
            .await?;
        let reply: ChatResponse = ensure_success(response).await?.json().await?;

        reply
            .message
            .map(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyReply)
    }

    async fn health(&self) -> Result<(), CompletionError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "/api/tags"))
            .send()
            .await?;
        let tags: TagsResponse = ensure_success(response).await?.json().await?;

        if self.is_listed(&tags) {
            Ok(())
        } else {
            Err(CompletionError::ModelUnavailable(self.model.clone()))
        }
    }
}
