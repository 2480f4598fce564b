use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::error::ServiceError;

const DATASET_SUFFIX: &str = ".json";

/// Metadata for an uploaded dataset. The client filename is kept only here;
/// the file on disk is named after `id`.
#[derive(Debug, Clone, Serialize)]
pub struct StoredDataset {
    pub id: String,
    pub original_name: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the upload under a generated key, creating the directory on
    /// first use.
    pub async fn save(
        &self,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<StoredDataset, ServiceError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let id = Uuid::new_v4().to_string();
        let path = self.root.join(format!("{id}{DATASET_SUFFIX}"));
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(%id, original_name, path = %path.display(), "dataset persisted");

        Ok(StoredDataset {
            id,
            original_name: original_name.to_string(),
            path,
            size_bytes: bytes.len(),
        })
    }

    /// Re-reads a persisted dataset and checks it is well-formed JSON. The
    /// parsed document is dropped.
    pub async fn validate(&self, dataset: &StoredDataset) -> Result<(), ServiceError> {
        let raw = tokio::fs::read(&dataset.path).await?;
        serde_json::from_slice::<serde_json::Value>(&raw)
            .map(|_| ())
            .map_err(|e| {
                tracing::debug!(id = %dataset.id, error = %e, "dataset is not valid JSON");
                ServiceError::InvalidDataset(e.to_string())
            })
    }
}

/// Literal, case-sensitive suffix check on the client filename.
pub fn ensure_json_filename(name: &str) -> Result<(), ServiceError> {
    if name.ends_with(DATASET_SUFFIX) {
        Ok(())
    } else {
        Err(ServiceError::UnsupportedFileType)
    }
}
