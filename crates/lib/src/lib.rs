//! # docsheet
//!
//! Extracts a user-described set of fields from folders of documents with a
//! language model, one row per document (or per entity), and compiles the rows
//! into a spreadsheet.
//!
//! The flow is:
//!
//! 1. [`schema::generate_schema`] turns the user's instruction into a flat
//!    [`schema::Schema`] of field names and example values.
//! 2. [`pipeline::ExtractionPipeline`] enumerates the selected folders through a
//!    [`source::DocumentSource`], converts each document to text with a
//!    [`extract::TextExtractor`], and asks the model for one JSON object per target,
//!    retrying once and falling back to sentinel values.
//! 3. The resulting [`types::ResultTable`] is serialized by a spreadsheet writer
//!    and handed to [`sink::publish_result`].

pub mod errors;
pub mod extract;
pub mod json_text;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod schema;
pub mod sink;
pub mod source;
pub mod types;

pub use errors::{
    DocumentError, JsonTextError, PipelineError, PromptError, SchemaError, StorageError,
};
pub use pipeline::{ExtractionPipeline, PipelineSettings, Progress, ProgressReporter, RunConfig, RunReport};
pub use schema::{generate_schema, Schema, SchemaSettings};
pub use source::{DocumentSource, TargetGrouping};
pub use types::{ExtractionTarget, ResultTable, Row, SourceDocument};
