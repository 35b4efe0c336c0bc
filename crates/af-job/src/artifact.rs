//! The immutable payload that flows between job steps.

use std::fmt;
use std::path::Path;

use bytes::Bytes;

/// An opaque chunk of binary data produced by a step.
///
/// Artifacts are never edited in place: every step builds a new one.
/// Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    data: Bytes,
}

impl Artifact {
    /// Wrap a payload.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// The payload as a cheaply clonable buffer.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Write the payload to `path`, creating parent directories as needed.
    pub async fn to_file(&self, path: impl AsRef<Path>) -> af_core::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &self.data).await?;
        tracing::debug!("Wrote {} bytes to {}", self.len(), path.display());
        Ok(())
    }
}

impl AsRef<[u8]> for Artifact {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Bytes> for Artifact {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

impl From<Vec<u8>> for Artifact {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&'static [u8]> for Artifact {
    fn from(data: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(data))
    }
}

// Payloads can be megabytes of image data; only show the size.
impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("len", &self.data.len())
            .finish()
    }
}
