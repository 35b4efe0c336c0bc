//! The owning context every job delegates real work to.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use af_core::{AppId, Result};

use crate::artifact::Artifact;
use crate::datastore::{DataStore, MemoryDataStore};
use crate::job::Job;
use crate::registry::{Analyser, Analysers, Encoder, Encoders, Processor, Processors};

/// Bundle of the datastore and the processor, encoder and analyser
/// registries.
///
/// An app is immutable once built and shared through `Arc`. Two jobs belong
/// to the same app only if they hold the same `Arc` allocation.
pub struct App {
    id: AppId,
    name: String,
    datastore: Arc<dyn DataStore>,
    processors: Processors,
    encoders: Encoders,
    analysers: Analysers,
}

impl App {
    /// Start building an app called `name`.
    pub fn builder(name: impl Into<String>) -> AppBuilder {
        AppBuilder::new(name)
    }

    pub fn id(&self) -> AppId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datastore(&self) -> &dyn DataStore {
        self.datastore.as_ref()
    }

    pub fn processors(&self) -> &Processors {
        &self.processors
    }

    pub fn encoders(&self) -> &Encoders {
        &self.encoders
    }

    pub fn analysers(&self) -> &Analysers {
        &self.analysers
    }

    /// An empty job owned by this app.
    pub fn new_job(self: &Arc<Self>) -> Job {
        Job::new(Arc::clone(self))
    }

    /// A job whose first step fetches `uid`.
    pub fn fetch(self: &Arc<Self>, uid: impl Into<String>) -> Job {
        self.new_job().fetch(uid)
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("processors", &self.processors)
            .field("encoders", &self.encoders)
            .field("analysers", &self.analysers)
            .finish_non_exhaustive()
    }
}

/// Builder for [`App`]. Defaults to an in-memory datastore and empty
/// registries.
pub struct AppBuilder {
    name: String,
    datastore: Arc<dyn DataStore>,
    processors: Processors,
    encoders: Encoders,
    analysers: Analysers,
}

impl AppBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datastore: Arc::new(MemoryDataStore::new()),
            processors: Processors::new(),
            encoders: Encoders::new(),
            analysers: Analysers::new(),
        }
    }

    /// Builder: use `datastore` for fetch steps.
    pub fn datastore(mut self, datastore: impl DataStore + 'static) -> Self {
        self.datastore = Arc::new(datastore);
        self
    }

    /// Builder: share an existing datastore.
    pub fn shared_datastore(mut self, datastore: Arc<dyn DataStore>) -> Self {
        self.datastore = datastore;
        self
    }

    /// Builder: replace the whole processor registry.
    pub fn processors(mut self, processors: Processors) -> Self {
        self.processors = processors;
        self
    }

    /// Builder: replace the whole encoder registry.
    pub fn encoders(mut self, encoders: Encoders) -> Self {
        self.encoders = encoders;
        self
    }

    /// Builder: replace the whole analyser registry.
    pub fn analysers(mut self, analysers: Analysers) -> Self {
        self.analysers = analysers;
        self
    }

    pub fn processor(mut self, name: &str, processor: Arc<dyn Processor>) -> Self {
        self.processors.register(name, processor);
        self
    }

    pub fn encoder(mut self, format: &str, encoder: Arc<dyn Encoder>) -> Self {
        self.encoders.register(format, encoder);
        self
    }

    pub fn analyser(mut self, name: &str, analyser: Arc<dyn Analyser>) -> Self {
        self.analysers.register(name, analyser);
        self
    }

    pub fn processor_fn<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Artifact, &[Value]) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.processors.register_fn(name, f);
        self
    }

    pub fn encoder_fn<F>(mut self, format: &str, f: F) -> Self
    where
        F: Fn(&Artifact, &[Value]) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.encoders.register_fn(format, f);
        self
    }

    pub fn analyser_fn<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Artifact, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.analysers.register_fn(name, f);
        self
    }

    pub fn build(self) -> Arc<App> {
        let app = App {
            id: AppId::new(),
            name: self.name,
            datastore: self.datastore,
            processors: self.processors,
            encoders: self.encoders,
            analysers: self.analysers,
        };
        tracing::debug!(
            "Built app {app} with {} processors, {} encoders, {} analysers",
            app.processors.len(),
            app.encoders.len(),
            app.analysers.len()
        );
        Arc::new(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let app = App::builder("images").build();
        assert_eq!(app.name(), "images");
        assert!(app.processors().is_empty());
        assert!(app.encoders().is_empty());
        assert!(app.analysers().is_empty());
    }

    #[test]
    fn each_build_gets_a_fresh_id() {
        let a = App::builder("images").build();
        let b = App::builder("images").build();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn display_includes_name_and_id() {
        let app = App::builder("images").build();
        assert_eq!(app.to_string(), format!("images ({})", app.id()));
    }

    #[test]
    fn registers_closures() {
        let app = App::builder("images")
            .processor_fn("noop", |a: &Artifact, _: &[Value]| Ok(a.data().clone()))
            .encoder_fn("raw", |a: &Artifact, _: &[Value]| Ok(a.data().clone()))
            .analyser_fn("size", |a: &Artifact, _: &[Value]| Ok(Value::from(a.len())))
            .build();
        assert!(app.processors().contains("noop"));
        assert!(app.encoders().contains("raw"));
        assert!(app.analysers().contains("size"));
    }

    #[tokio::test]
    async fn fetch_builds_job_without_io() {
        let app = App::builder("images").build();
        let job = app.fetch("abc123");
        assert_eq!(job.num_steps(), 1);
        assert!(job.current_artifact().is_none());
        assert!(Arc::ptr_eq(job.app(), &app));
    }
}
