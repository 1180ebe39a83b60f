//! # Result Sink
//!
//! Persists a serialized result spreadsheet under a timestamped name in the
//! `results` folder of the blob store and describes it for direct download.

use crate::{errors::StorageError, providers::storage::BlobStore};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::info;

pub const RESULTS_FOLDER: &str = "results";
pub const DOWNLOAD_MIME_TYPE: &str = "application/octet-stream";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A persisted result file.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedResult {
    /// The full blob name, e.g. `results/results_20240101_120000.xlsx`.
    pub blob_name: String,
    /// The name offered to the user when downloading.
    pub file_name: String,
    pub mime_type: &'static str,
    pub size: usize,
}

/// `results_<YYYYMMDD_HHMMSS>.<extension>`
pub fn result_file_name<Tz: TimeZone>(timestamp: &DateTime<Tz>, extension: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("results_{}.{extension}", timestamp.format(TIMESTAMP_FORMAT))
}

pub fn result_blob_name(file_name: &str) -> String {
    format!("{RESULTS_FOLDER}/{file_name}")
}

/// Uploads the spreadsheet bytes, overwriting any blob with the same name.
pub async fn publish_result<Tz: TimeZone>(
    store: &dyn BlobStore,
    data: Vec<u8>,
    timestamp: &DateTime<Tz>,
    extension: &str,
) -> Result<PublishedResult, StorageError>
where
    Tz::Offset: std::fmt::Display,
{
    let file_name = result_file_name(timestamp, extension);
    let blob_name = result_blob_name(&file_name);
    let size = data.len();
    store.put_blob(&blob_name, data).await?;
    info!(blob = %blob_name, size, store = store.name(), "Published result spreadsheet");
    Ok(PublishedResult {
        blob_name,
        file_name,
        mime_type: DOWNLOAD_MIME_TYPE,
        size,
    })
}
