//! One JSON file per document inside a configuration directory.
//!
//! Saves are atomic-ish: write a temp sibling then rename over the target,
//! so a crash mid-write never leaves a half-written document. The file's
//! modification time doubles as the fingerprint other processes bump when
//! they edit a document directly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use modelmux_core::ports::{
    DocumentStore, Fingerprint, LoadedDocument, StoreDocument, StoreError,
};

#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    dir: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, doc: StoreDocument) -> PathBuf {
        self.dir.join(doc.file_name())
    }

    async fn modified(path: &Path) -> Result<Option<Fingerprint>, StoreError> {
        match fs::metadata(path).await {
            Ok(meta) => {
                let modified = meta
                    .modified()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                Ok(Some(Fingerprint::new(modified)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn load(&self, doc: StoreDocument) -> Result<Option<LoadedDocument>, StoreError> {
        let path = self.path_for(doc);

        let Some(fingerprint) = Self::modified(&path).await? else {
            return Ok(None);
        };

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(LoadedDocument { value, fingerprint })),
            Err(e) => {
                // A corrupt document falls back to defaults rather than
                // wedging the server.
                tracing::warn!(
                    target: "modelmux::store",
                    file = doc.file_name(),
                    error = %e,
                    "ignoring unparseable document"
                );
                Ok(None)
            }
        }
    }

    async fn save(
        &self,
        doc: StoreDocument,
        value: &serde_json::Value,
    ) -> Result<Fingerprint, StoreError> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let path = self.path_for(doc);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Self::modified(&path)
            .await?
            .ok_or_else(|| StoreError::Io(format!("{} vanished after save", path.display())))
    }

    async fn fingerprint(&self, doc: StoreDocument) -> Result<Option<Fingerprint>, StoreError> {
        Self::modified(&self.path_for(doc)).await
    }
}
