//! Filesystem datastore.
//!
//! Artifacts live under `{root}/{YYYY}/{MM}/{DD}/{uuid}`; the path relative
//! to the root is the uid handed back to callers.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use af_core::{Error, Result};

use super::DataStore;

/// Datastore persisting each artifact as one file below a root directory.
#[derive(Debug, Clone)]
pub struct FileDataStore {
    root: PathBuf,
}

impl FileDataStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a uid to its file, rejecting anything that would escape the root.
    pub fn path_for(&self, uid: &str) -> Result<PathBuf> {
        let relative = Path::new(uid);
        let safe = !uid.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::invalid_params(
                "datastore",
                format!("uid '{uid}' is not a relative path inside the store"),
            ));
        }
        Ok(self.root.join(relative))
    }

    fn new_uid() -> String {
        let date = Utc::now().format("%Y/%m/%d");
        format!("{date}/{}", Uuid::new_v4().simple())
    }
}

fn not_found_or_io(err: std::io::Error, uid: &str) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::not_found("artifact", uid)
    } else {
        Error::from(err)
    }
}

#[async_trait]
impl DataStore for FileDataStore {
    async fn retrieve(&self, uid: &str) -> Result<Bytes> {
        let path = self.path_for(uid)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(e, uid))?;
        tracing::debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(Bytes::from(data))
    }

    async fn store(&self, data: Bytes) -> Result<String> {
        let uid = Self::new_uid();
        let path = self.path_for(&uid)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        tracing::info!("Stored {} bytes as {uid}", data.len());
        Ok(uid)
    }

    async fn destroy(&self, uid: &str) -> Result<()> {
        let path = self.path_for(uid)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(e, uid))?;
        tracing::info!("Destroyed {uid}");
        Ok(())
    }
}
