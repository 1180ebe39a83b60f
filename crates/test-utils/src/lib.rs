use docsheet::errors::{DocumentError, PromptError, StorageError};
use docsheet::extract::TextExtractor;
use docsheet::providers::ai::{AiProvider, ChatRequest};
use docsheet::providers::storage::BlobStore;
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

// --- Mock AI Provider ---

/// A scripted reply of the mock provider.
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    ContextLengthExceeded,
    RateLimited,
    Failure(String),
}

impl MockReply {
    fn into_result(self) -> Result<String, PromptError> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::ContextLengthExceeded => Err(PromptError::ContextLengthExceeded(
                "This model's maximum context length is 4096 tokens.".to_string(),
            )),
            MockReply::RateLimited => Err(PromptError::RateLimited(
                "Requests to the ChatCompletions_Create Operation have exceeded the rate limit."
                    .to_string(),
            )),
            MockReply::Failure(message) => Err(PromptError::AiApi(message)),
        }
    }
}

#[derive(Default, Debug)]
struct MockState {
    keyed: Vec<(String, VecDeque<MockReply>)>,
    queue: VecDeque<MockReply>,
    calls: Vec<ChatRequest>,
}

/// A mock AI provider with scripted replies and call recording.
///
/// Replies registered with [`MockAiProvider::add_reply`] are matched by a unique
/// substring of the system messages and consumed in order; once only one reply is
/// left for a key it is repeated. Unkeyed replies from
/// [`MockAiProvider::push_reply`] are consumed in call order.
#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-programs a text response for prompts whose system messages contain `key`.
    pub fn add_response(&self, key: &str, response: &str) {
        self.add_reply(key, MockReply::Text(response.to_string()));
    }

    pub fn add_reply(&self, key: &str, reply: MockReply) {
        let mut state = self.state.lock().unwrap();
        match state.keyed.iter_mut().find(|(k, _)| k == key) {
            Some((_, replies)) => replies.push_back(reply),
            None => state.keyed.push((key.to_string(), VecDeque::from([reply]))),
        }
    }

    /// Queues a reply returned by the next call that matches no key.
    pub fn push_reply(&self, reply: MockReply) {
        self.state.lock().unwrap().queue.push_back(reply);
    }

    /// Retrieves the recorded requests for assertion.
    pub fn get_calls(&self) -> Vec<ChatRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(&self, request: &ChatRequest) -> Result<String, PromptError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(request.clone());

        let system = request.system_messages.join("\n");
        if let Some((_, replies)) = state.keyed.iter_mut().find(|(k, _)| system.contains(k.as_str())) {
            let reply = if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            };
            if let Some(reply) = reply {
                return reply.into_result();
            }
        }

        match state.queue.pop_front() {
            Some(reply) => reply.into_result(),
            None => Err(PromptError::AiApi(format!(
                "MockAiProvider: No response programmed for system prompt. Got: '{system}'"
            ))),
        }
    }
}

// --- In-memory Blob Store ---

/// A blob store kept in memory. Listing is sorted by name.
#[derive(Clone, Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, data: impl Into<Vec<u8>>) {
        self.blobs.lock().unwrap().insert(name.to_string(), data.into());
    }

    /// Makes downloads of `name` fail with an API error while keeping it listed.
    pub fn fail_downloads_of(&self, name: &str) {
        self.failing.lock().unwrap().push(name.to_string());
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        "Memory"
    }

    async fn list_blob_names(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn get_blob(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        if self.failing.lock().unwrap().iter().any(|n| n == name) {
            return Err(StorageError::Api {
                status: 500,
                message: format!("simulated download failure for '{name}'"),
            });
        }
        self.get(name).ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn put_blob(&self, name: &str, data: Vec<u8>) -> Result<(), StorageError> {
        self.insert(name, data);
        Ok(())
    }
}

// --- Plain-text extractor ---

/// A text extractor that treats `pdf`, `docx` and `txt` blobs as UTF-8 text.
///
/// Lets pipeline tests store readable content without building real documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8Extractor;

impl TextExtractor for Utf8Extractor {
    fn extract(&self, data: &[u8], file_type: &str) -> Result<String, DocumentError> {
        match file_type {
            "pdf" | "docx" | "txt" => Ok(String::from_utf8_lossy(data).into_owned()),
            _ => Ok(String::new()),
        }
    }
}

// --- Test-Specific Helpers ---
#[cfg(feature = "pdf")]
pub mod helpers {
    use anyhow::Result;
    use printpdf::{
        BuiltinFont, Layer, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Pt, TextItem,
        TextMatrix, TextRenderingMode,
    };

    /// Generates a single-page PDF with the given text content (printpdf v0.8.2).
    pub fn generate_test_pdf(text: &str) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new("Test PDF");
        let mut page = PdfPage::new(Mm(210.0), Mm(297.0), vec![]);
        let layer_id = doc.add_layer(&Layer::new("Layer 1"));

        let font_bytes = BuiltinFont::Helvetica.get_subset_font().bytes;
        let font = ParsedFont::from_bytes(&font_bytes, 0, &mut Vec::new())
            .ok_or_else(|| anyhow::anyhow!("Failed to parse built-in font"))?;
        let font_id = doc.add_font(&font);

        page.ops = vec![
            Op::BeginLayer {
                layer_id: layer_id.clone(),
            },
            Op::SetFontSize {
                size: Pt(12.0),
                font: font_id.clone(),
            },
            Op::StartTextSection,
            Op::SetTextMatrix {
                matrix: TextMatrix::Translate(Mm(10.0).into(), Mm(280.0).into()),
            },
            Op::SetTextRenderingMode {
                mode: TextRenderingMode::Fill,
            },
            Op::WriteText {
                items: vec![TextItem::Text(text.to_string())],
                font: font_id,
            },
            Op::EndTextSection,
            Op::EndLayer { layer_id },
        ];
        doc.pages.push(page);

        let mut warnings = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            eprintln!("PDF generation warnings: {warnings:?}");
        }
        Ok(bytes)
    }
}

#[cfg(feature = "docx")]
pub mod docx {
    use anyhow::Result;
    use std::io::{Cursor, Write};
    use zip::{write::SimpleFileOptions, ZipWriter};

    /// Builds a minimal DOCX archive with one paragraph per entry of `paragraphs`.
    pub fn generate_test_docx(paragraphs: &[&str]) -> Result<Vec<u8>> {
        let body: String = paragraphs
            .iter()
            .map(|p| {
                let escaped = p
                    .replace('&', "&amp;")
                    .replace('<', "&lt;")
                    .replace('>', "&gt;");
                format!(r#"<w:p><w:r><w:t xml:space="preserve">{escaped}</w:t></w:r></w:p>"#)
            })
            .collect();
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)?;
        zip.start_file("word/document.xml", options)?;
        zip.write_all(document.as_bytes())?;
        Ok(zip.finish()?.into_inner())
    }
}
