use super::{classify_error_response, first_choice, to_messages, ChatCompletionResponse, ChatMessage, ChatRequest};
use crate::{errors::PromptError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    stream: bool,
}

/// A provider for any OpenAI-compatible chat completions endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiCompatibleProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Creates a new `OpenAiCompatibleProvider`.
    ///
    /// `api_url` is the full chat completions URL, e.g.
    /// `http://localhost:1234/v1/chat/completions`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiCompatibleProvider {
    #[instrument(skip_all, fields(model = ?self.model))]
    async fn generate(&self, request: &ChatRequest) -> Result<String, PromptError> {
        let request_body = OpenAiRequest {
            messages: to_messages(request),
            model: self.model.as_deref(),
            temperature: request.temperature,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        debug!("--> Sending chat completion request to {}", self.api_url);
        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error_response(status, &error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;
        first_choice(completion)
    }
}
