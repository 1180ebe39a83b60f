use crate::{errors::StorageError, providers::storage::BlobStore};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, Url};
use serde::Deserialize;
use tracing::{debug, info};

// --- List Blobs response structures ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    blobs: BlobList,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct BlobList {
    #[serde(rename = "Blob", default)]
    blobs: Vec<BlobItem>,
}

#[derive(Deserialize, Debug)]
struct BlobItem {
    #[serde(rename = "Name")]
    name: String,
}

// --- Azure Blob Store implementation ---

/// A blob store backed by an Azure Storage container, authorised with a SAS token.
#[derive(Clone, Debug)]
pub struct AzureBlobStore {
    client: ReqwestClient,
    container_url: Url,
    sas_token: Option<String>,
}

impl AzureBlobStore {
    /// Creates a new `AzureBlobStore`.
    ///
    /// `container_url` is e.g. `https://account.blob.core.windows.net/container`;
    /// `sas_token` is the query string of a container SAS, with or without a
    /// leading `?`.
    pub fn new(container_url: String, sas_token: String) -> Result<Self, StorageError> {
        let url = Url::parse(container_url.trim_end_matches('/')).map_err(|e| {
            StorageError::Config(format!("invalid container URL '{container_url}': {e}"))
        })?;
        if url.cannot_be_a_base() {
            return Err(StorageError::Config(format!(
                "container URL '{container_url}' cannot hold blob paths"
            )));
        }
        let sas_token = sas_token.trim_start_matches('?');
        let client = ReqwestClient::builder().build()?;
        Ok(Self {
            client,
            container_url: url,
            sas_token: (!sas_token.is_empty()).then(|| sas_token.to_string()),
        })
    }

    fn container_listing_url(&self) -> Url {
        let mut url = self.container_url.clone();
        url.set_query(self.sas_token.as_deref());
        url
    }

    /// The blob's URL: each `/`-separated segment of `name` is percent-encoded.
    fn blob_url(&self, name: &str) -> Result<Url, StorageError> {
        let mut url = self.container_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Config(format!("cannot build a URL for blob '{name}'")))?
            .pop_if_empty()
            .extend(name.split('/'));
        url.set_query(self.sas_token.as_deref());
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, name: &str) -> Result<Response, StorageError> {
        let response = request.header("x-ms-version", "2021-08-06").send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn name(&self) -> &str {
        "Azure Blob"
    }

    async fn list_blob_names(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut query = vec![
                ("restype", "container".to_string()),
                ("comp", "list".to_string()),
                ("prefix", prefix.to_string()),
            ];
            if let Some(m) = &marker {
                query.push(("marker", m.clone()));
            }
            let request = self.client.get(self.container_listing_url()).query(&query);
            let body = self
                .send(request, self.container_url.as_str())
                .await?
                .text()
                .await?;

            let page: EnumerationResults = quick_xml::de::from_str(&body)
                .map_err(|e| StorageError::Listing(e.to_string()))?;
            names.extend(page.blobs.blobs.into_iter().map(|b| b.name));

            match page.next_marker.filter(|m| !m.is_empty()) {
                Some(next) => marker = Some(next),
                None => break,
            }
        }
        debug!(prefix, count = names.len(), "Listed Azure blobs");
        Ok(names)
    }

    async fn get_blob(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let request = self.client.get(self.blob_url(name)?);
        let bytes = self.send(request, name).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn put_blob(&self, name: &str, data: Vec<u8>) -> Result<(), StorageError> {
        info!(blob = name, size = data.len(), "Uploading blob to Azure");
        let request = self
            .client
            .put(self.blob_url(name)?)
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data);
        self.send(request, name).await?;
        Ok(())
    }
}
