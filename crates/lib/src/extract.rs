use crate::errors::DocumentError;
use std::fmt::Debug;

/// Converts raw document bytes into plain text.
///
/// `file_type` is the lower-cased file extension (`pdf`, `docx`, ...). Types the
/// extractor does not support yield an empty string rather than an error.
pub trait TextExtractor: Send + Sync + Debug {
    fn extract(&self, data: &[u8], file_type: &str) -> Result<String, DocumentError>;
}
