//! Binary storage backends that fetch steps read from.

mod file;
mod memory;

pub use file::FileDataStore;
pub use memory::MemoryDataStore;

use async_trait::async_trait;
use bytes::Bytes;

use af_core::Result;

/// Storage for original artifacts, addressed by an opaque uid.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch the bytes stored under `uid`.
    ///
    /// Fails with [`af_core::Error::NotFound`] when nothing is stored there.
    async fn retrieve(&self, uid: &str) -> Result<Bytes>;

    /// Persist `data` and return the uid it can be retrieved with.
    async fn store(&self, data: Bytes) -> Result<String>;

    /// Remove whatever is stored under `uid`.
    async fn destroy(&self, uid: &str) -> Result<()>;
}
