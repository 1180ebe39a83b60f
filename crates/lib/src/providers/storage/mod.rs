pub mod azure;
pub mod local;

use crate::errors::StorageError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

pub use azure::AzureBlobStore;
pub use local::LocalBlobStore;

/// A trait for interacting with a hierarchical blob store.
///
/// Blob names use `/` as the folder separator. Listing returns names in the
/// store's enumeration order.
#[async_trait]
pub trait BlobStore: Send + Sync + DynClone + Debug {
    /// Returns the name of the storage backend (e.g., "Azure Blob", "Local").
    fn name(&self) -> &str;

    /// Lists the names of all blobs starting with `prefix`.
    async fn list_blob_names(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Downloads the full content of a blob.
    async fn get_blob(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Uploads a blob, overwriting any existing blob of the same name.
    async fn put_blob(&self, name: &str, data: Vec<u8>) -> Result<(), StorageError>;
}

dyn_clone::clone_trait_object!(BlobStore);
