use super::{
    endpoint, ensure_success, http_client, ChatMessage, CompletionError, CompletionProvider,
    CompletionRequest, ReplyFormat,
};
use crate::config::CompletionConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hosted chat-completions API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(CompletionError::MissingCredentials)?;

        Ok(Self {
            client: http_client(config.timeout)?,
            base_url: config.openai_url.clone(),
            model: config.openai_model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        debug!(model = %self.model, "requesting openai chat completion");

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: request.messages(),
            temperature: self.temperature,
            response_format: match request.format {
                ReplyFormat::Json => Some(ResponseFormat {
                    kind: "json_object",
                }),
                ReplyFormat::Text => None,
            },
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "/v1/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let reply: ChatCompletionResponse = ensure_success(response).await?.json().await?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyReply)
    }

    async fn health(&self) -> Result<(), CompletionError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "/v1/models"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }
}
