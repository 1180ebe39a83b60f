pub mod azure;
pub mod openai;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, fmt::Debug};

pub use azure::AzureOpenAiProvider;
pub use openai::OpenAiCompatibleProvider;

/// A chat completion request: ordered system messages, one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_messages: Vec<String>,
    pub user_message: String,
    pub temperature: f32,
}

/// A trait for interacting with an AI provider.
///
/// Implementations return the completion text, or a `PromptError`. Providers must
/// report an oversized input as `PromptError::ContextLengthExceeded` and throttling
/// as `PromptError::RateLimited`; every other failure is treated generically.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    async fn generate(&self, request: &ChatRequest) -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);

/// Selects one of the two preconfigured model deployments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    #[default]
    Standard,
    Advanced,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Standard => "standard",
            ModelTier::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ModelTier::Standard),
            "advanced" => Ok(ModelTier::Advanced),
            other => Err(format!("unknown model tier '{other}'")),
        }
    }
}

/// The configured providers, keyed by tier.
#[derive(Clone, Debug, Default)]
pub struct ProviderSet {
    providers: HashMap<ModelTier, Box<dyn AiProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tier: ModelTier, provider: Box<dyn AiProvider>) -> Self {
        self.insert(tier, provider);
        self
    }

    pub fn insert(&mut self, tier: ModelTier, provider: Box<dyn AiProvider>) {
        self.providers.insert(tier, provider);
    }

    pub fn get(&self, tier: ModelTier) -> Result<&dyn AiProvider, PromptError> {
        self.providers
            .get(&tier)
            .map(|p| p.as_ref())
            .ok_or_else(|| PromptError::MissingProvider(tier.to_string()))
    }
}

// --- OpenAI-compatible wire format shared by both providers ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

const CONTEXT_LENGTH_CODE: &str = "context_length_exceeded";
const CONTEXT_LENGTH_PREFIX: &str = "This model's maximum context length";

pub(crate) fn to_messages(request: &ChatRequest) -> Vec<ChatMessage> {
    request
        .system_messages
        .iter()
        .map(|content| ChatMessage {
            role: "system".to_string(),
            content: content.clone(),
        })
        .chain(std::iter::once(ChatMessage {
            role: "user".to_string(),
            content: request.user_message.clone(),
        }))
        .collect()
}

pub(crate) fn first_choice(response: ChatCompletionResponse) -> Result<String, PromptError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or(PromptError::EmptyCompletion)
}

/// Maps a non-success provider response onto a typed `PromptError`.
pub fn classify_error_response(status: StatusCode, body: &str) -> PromptError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return PromptError::RateLimited(body.to_string());
    }
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let code = envelope.error.code.as_deref().unwrap_or_default();
        let message = envelope.error.message.unwrap_or_default();
        if code == CONTEXT_LENGTH_CODE || message.starts_with(CONTEXT_LENGTH_PREFIX) {
            return PromptError::ContextLengthExceeded(message);
        }
    }
    PromptError::AiApi(format!("{status}: {body}"))
}
