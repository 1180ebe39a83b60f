use thiserror::Error;

/// Errors raised while talking to a language-model provider.
///
/// The two provider conditions the extraction pipeline treats as data rather than
/// failures (`ContextLengthExceeded` and `RateLimited`) have their own variants so
/// callers can match on them structurally.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("The input exceeded the model's maximum context length: {0}")]
    ContextLengthExceeded(String),
    #[error("The AI provider rate limit was exceeded: {0}")]
    RateLimited(String),
    #[error("No AI provider is configured for model tier '{0}'")]
    MissingProvider(String),
    #[error("AI provider returned an empty completion")]
    EmptyCompletion,
}

/// Failure to locate or parse a JSON object inside free model text.
#[derive(Error, Debug)]
pub enum JsonTextError {
    #[error("No JSON object delimiters found in model response")]
    NoObject,
    #[error("Model response contains malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Model response JSON is not an object")]
    NotAnObject,
}

/// Errors raised while generating or accepting an extraction schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Please enter your prompt.")]
    EmptyInstruction,
    #[error("Schema generation request failed: {0}")]
    Provider(#[from] PromptError),
    #[error("Schema response could not be parsed: {0}")]
    Parse(#[from] JsonTextError),
    #[error("Schema field '{0}' is nested; only flat fields are supported")]
    Nested(String),
    #[error("Schema contains no fields")]
    NoFields,
}

/// Errors raised by a blob store backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Blob '{0}' was not found")]
    NotFound(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Storage service returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse storage listing: {0}")]
    Listing(String),
    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

/// Errors raised while converting a document into plain text.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to parse PDF content: {0}")]
    Pdf(String),
    #[error("Failed to read DOCX archive: {0}")]
    Docx(String),
}

/// Errors that abort an extraction run before any row is produced.
///
/// Per-document failures never surface here; they become fallback rows.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to enumerate documents: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Provider(#[from] PromptError),
}
