//! # Document Source
//!
//! Presents a blob store as folders of documents under a use-case root:
//! `<root>/<folder>/<document path>`. The root may itself contain `/`. Paths
//! are interpreted relative to it, so files lying directly under the root are
//! ignored.

use crate::{
    errors::StorageError,
    providers::storage::BlobStore,
    types::{ExtractionTarget, SourceDocument},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// How the documents of a folder are turned into extraction targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetGrouping {
    /// One row per document.
    #[default]
    PerDocument,
    /// One row per entity sub-folder; every document inside it is a named source.
    PerEntity,
}

#[derive(Clone, Copy, Debug)]
pub struct DocumentSource<'a> {
    store: &'a dyn BlobStore,
    root: &'a str,
}

impl<'a> DocumentSource<'a> {
    pub fn new(store: &'a dyn BlobStore, root: &'a str) -> Self {
        Self {
            store,
            root: root.trim_end_matches('/'),
        }
    }

    fn root_prefix(&self) -> String {
        format!("{}/", self.root)
    }

    fn folder_prefix(&self, folder: &str) -> String {
        format!("{}/{}/", self.root, folder.trim_matches('/'))
    }

    /// Lists the selectable folders directly below the root.
    pub async fn list_folders(&self) -> Result<BTreeSet<String>, StorageError> {
        let root_prefix = self.root_prefix();
        let names = self.store.list_blob_names(&root_prefix).await?;
        let folders: BTreeSet<String> = names
            .iter()
            .filter_map(|name| name.strip_prefix(&root_prefix))
            .filter_map(|relative| relative.split_once('/'))
            .filter(|(folder, rest)| !folder.is_empty() && !rest.is_empty())
            .map(|(folder, _)| folder.to_string())
            .collect();
        debug!(root = self.root, count = folders.len(), "Listed document folders");
        Ok(folders)
    }

    /// Lists the documents of a folder in the store's enumeration order.
    pub async fn list_documents(&self, folder: &str) -> Result<Vec<String>, StorageError> {
        let folder_prefix = self.folder_prefix(folder);
        let names = self.store.list_blob_names(&folder_prefix).await?;
        let mut seen = HashSet::new();
        Ok(names
            .into_iter()
            .filter(|name| {
                name.strip_prefix(&folder_prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.ends_with('/'))
            })
            .filter(|name| seen.insert(name.clone()))
            .collect())
    }

    /// Downloads a document's bytes.
    pub async fn get_content(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.store.get_blob(path).await
    }

    /// Enumerates the extraction targets of one folder.
    pub async fn list_targets(
        &self,
        folder: &str,
        grouping: TargetGrouping,
    ) -> Result<Vec<ExtractionTarget>, StorageError> {
        let documents = self.list_documents(folder).await?;
        Ok(match grouping {
            TargetGrouping::PerDocument => documents.into_iter().map(ExtractionTarget::single).collect(),
            TargetGrouping::PerEntity => group_by_entity(&self.folder_prefix(folder), documents),
        })
    }
}

/// Groups `<folder>/<entity>/<rest>` documents into one target per entity,
/// in order of first appearance. Documents directly in the folder stay single.
fn group_by_entity(folder_prefix: &str, documents: Vec<String>) -> Vec<ExtractionTarget> {
    let mut targets: Vec<ExtractionTarget> = Vec::new();
    for path in documents {
        let relative = path.strip_prefix(folder_prefix).unwrap_or(&path);
        let Some((entity, rest)) = relative.split_once('/') else {
            targets.push(ExtractionTarget::single(path));
            continue;
        };
        let document = SourceDocument::tagged(path.clone(), rest);
        match targets
            .iter_mut()
            .find(|t| t.name == entity && t.documents.iter().all(|d| d.source_tag.is_some()))
        {
            Some(target) => target.documents.push(document),
            None => targets.push(ExtractionTarget {
                name: entity.to_string(),
                documents: vec![document],
            }),
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_entity_keeps_first_appearance_order() {
        let docs = vec![
            "cases/hr/bob/cv.pdf".to_string(),
            "cases/hr/alice/cv.pdf".to_string(),
            "cases/hr/bob/letters/cover.docx".to_string(),
            "cases/hr/summary.pdf".to_string(),
        ];
        let targets = group_by_entity("cases/hr/", docs);
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].name, "bob");
        assert_eq!(
            targets[0].documents,
            vec![
                SourceDocument::tagged("cases/hr/bob/cv.pdf", "cv.pdf"),
                SourceDocument::tagged("cases/hr/bob/letters/cover.docx", "letters/cover.docx"),
            ]
        );
        assert_eq!(targets[1].name, "alice");
        assert_eq!(targets[2], ExtractionTarget::single("cases/hr/summary.pdf"));
    }
}
