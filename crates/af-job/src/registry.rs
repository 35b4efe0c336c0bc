//! Named collaborator registries: processors, encoders and analysers.
//!
//! A step only carries a name (or format) and opaque parameters; the app's
//! registries resolve that name to an implementation. Lookups are
//! case-insensitive and registering a name twice replaces the earlier entry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use af_core::{Error, Result};

use crate::artifact::Artifact;

/// Transforms an artifact into new bytes (resize, crop, ...).
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, artifact: &Artifact, params: &[Value]) -> Result<Bytes>;
}

/// Re-encodes an artifact into a specific format.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, artifact: &Artifact, params: &[Value]) -> Result<Bytes>;
}

/// Inspects an artifact and reports something about it.
#[async_trait]
pub trait Analyser: Send + Sync {
    async fn analyse(&self, artifact: &Artifact, params: &[Value]) -> Result<Value>;
}

/// Name-indexed collection of collaborators of one kind.
pub struct Registry<T: ?Sized> {
    entries: BTreeMap<String, Arc<T>>,
}

/// Registry resolving processor names.
pub type Processors = Registry<dyn Processor>;
/// Registry resolving encoding formats.
pub type Encoders = Registry<dyn Encoder>;
/// Registry resolving analyser names.
pub type Analysers = Registry<dyn Analyser>;

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register an implementation under `name`.
    pub fn register(&mut self, name: impl AsRef<str>, entry: Arc<T>) -> &mut Self {
        let name = key(name.as_ref());
        if self.entries.insert(name.clone(), entry).is_some() {
            tracing::debug!("Replaced registry entry '{name}'");
        }
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, name: impl AsRef<str>, entry: Arc<T>) -> Self {
        self.register(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.entries.get(&key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&key(name))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// Closure adapters
// ---------------------------------------------------------------------------

struct FnProcessor<F>(F);

#[async_trait]
impl<F> Processor for FnProcessor<F>
where
    F: Fn(&Artifact, &[Value]) -> Result<Bytes> + Send + Sync,
{
    async fn process(&self, artifact: &Artifact, params: &[Value]) -> Result<Bytes> {
        (self.0)(artifact, params)
    }
}

struct FnEncoder<F>(F);

#[async_trait]
impl<F> Encoder for FnEncoder<F>
where
    F: Fn(&Artifact, &[Value]) -> Result<Bytes> + Send + Sync,
{
    async fn encode(&self, artifact: &Artifact, params: &[Value]) -> Result<Bytes> {
        (self.0)(artifact, params)
    }
}

struct FnAnalyser<F>(F);

#[async_trait]
impl<F> Analyser for FnAnalyser<F>
where
    F: Fn(&Artifact, &[Value]) -> Result<Value> + Send + Sync,
{
    async fn analyse(&self, artifact: &Artifact, params: &[Value]) -> Result<Value> {
        (self.0)(artifact, params)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl Registry<dyn Processor> {
    /// Register a synchronous closure as a processor.
    pub fn register_fn<F>(&mut self, name: impl AsRef<str>, f: F) -> &mut Self
    where
        F: Fn(&Artifact, &[Value]) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnProcessor(f)))
    }

    /// Run the processor registered under `name`.
    pub async fn process(&self, artifact: &Artifact, name: &str, params: &[Value]) -> Result<Bytes> {
        let processor = self
            .get(name)
            .ok_or_else(|| Error::UnknownProcessor(name.to_string()))?;
        tracing::trace!("Running processor '{name}' on {} bytes", artifact.len());
        processor.process(artifact, params).await
    }
}

impl Registry<dyn Encoder> {
    /// Register a synchronous closure as an encoder.
    pub fn register_fn<F>(&mut self, format: impl AsRef<str>, f: F) -> &mut Self
    where
        F: Fn(&Artifact, &[Value]) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.register(format, Arc::new(FnEncoder(f)))
    }

    /// Encode with the encoder registered for `format`.
    pub async fn encode(&self, artifact: &Artifact, format: &str, params: &[Value]) -> Result<Bytes> {
        let encoder = self
            .get(format)
            .ok_or_else(|| Error::UnknownEncoder(format.to_string()))?;
        tracing::trace!("Encoding {} bytes as '{format}'", artifact.len());
        encoder.encode(artifact, params).await
    }
}

impl Registry<dyn Analyser> {
    /// Register a synchronous closure as an analyser.
    pub fn register_fn<F>(&mut self, name: impl AsRef<str>, f: F) -> &mut Self
    where
        F: Fn(&Artifact, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnAnalyser(f)))
    }

    /// Run the analyser registered under `name`.
    pub async fn analyse(&self, artifact: &Artifact, name: &str, params: &[Value]) -> Result<Value> {
        let analyser = self
            .get(name)
            .ok_or_else(|| Error::UnknownAnalyser(name.to_string()))?;
        tracing::trace!("Running analyser '{name}' on {} bytes", artifact.len());
        analyser.analyse(artifact, params).await
    }
}
