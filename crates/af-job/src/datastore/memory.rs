use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use uuid::Uuid;

use af_core::{Error, Result};

use super::DataStore;

/// Process-local datastore backed by a map. Used by default and in tests.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry under a caller-chosen uid.
    pub fn insert(&self, uid: impl Into<String>, data: impl Into<Bytes>) {
        self.entries.write().insert(uid.into(), data.into());
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn retrieve(&self, uid: &str) -> Result<Bytes> {
        self.entries
            .read()
            .get(uid)
            .cloned()
            .ok_or_else(|| Error::not_found("artifact", uid))
    }

    async fn store(&self, data: Bytes) -> Result<String> {
        let uid = Uuid::new_v4().simple().to_string();
        tracing::debug!("Stored {} bytes in memory as {uid}", data.len());
        self.entries.write().insert(uid.clone(), data);
        Ok(uid)
    }

    async fn destroy(&self, uid: &str) -> Result<()> {
        self.entries
            .write()
            .remove(uid)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("artifact", uid))
    }
}
