use super::{classify_error_response, first_choice, to_messages, ChatCompletionResponse, ChatMessage, ChatRequest};
use crate::{errors::PromptError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct AzureChatRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// A provider for an Azure OpenAI chat deployment.
///
/// Requests go to `{api_base}/openai/deployments/{deployment}/chat/completions`
/// with the `api-version` query parameter and the `api-key` header.
#[derive(Clone, Debug)]
pub struct AzureOpenAiProvider {
    client: ReqwestClient,
    api_base: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

impl AzureOpenAiProvider {
    /// Creates a new `AzureOpenAiProvider`.
    pub fn new(
        api_base: String,
        api_key: String,
        deployment: String,
        api_version: String,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_base,
            api_key,
            deployment,
            api_version,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.api_base.trim_end_matches('/'),
            self.deployment
        )
    }
}

#[async_trait]
impl AiProvider for AzureOpenAiProvider {
    #[instrument(skip_all, fields(deployment = %self.deployment))]
    async fn generate(&self, request: &ChatRequest) -> Result<String, PromptError> {
        let request_body = AzureChatRequest {
            messages: to_messages(request),
            temperature: request.temperature,
        };

        let url = self.completions_url();
        debug!("--> Sending chat completion request to {url}");
        let response = self
            .client
            .post(&url)
            .query(&[("api-version", &self.api_version)])
            .header("api-key", &self.api_key)
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
