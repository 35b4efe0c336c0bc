//! Lazy, incrementally applied jobs.
//!
//! A [`Job`] is built by appending steps, which is pure bookkeeping. Work
//! happens in [`Job::apply`], triggered explicitly or by asking for the
//! result via [`Job::data`] / [`Job::artifact`] / [`Job::analyse`].
//!
//! The job keeps a cursor (`next_step`) counting the leading steps already
//! applied. Every step before the cursor contributed to the current
//! artifact and is never run again. A failed step leaves the cursor on
//! itself, so a later `apply` resumes from that step.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use af_core::{Error, JobId, Result};

use crate::app::App;
use crate::artifact::Artifact;
use crate::recipe::Recipe;
use crate::step::Step;

/// Coarse execution state of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Nothing has been applied yet.
    Empty,
    /// Some steps have been applied and more are pending.
    PartiallyApplied,
    /// Every step has been applied.
    FullyApplied,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Empty => f.write_str("empty"),
            JobState::PartiallyApplied => f.write_str("partially applied"),
            JobState::FullyApplied => f.write_str("fully applied"),
        }
    }
}

/// An ordered, lazily applied list of steps owned by an [`App`].
#[derive(Debug)]
pub struct Job {
    id: JobId,
    app: Arc<App>,
    steps: Vec<Step>,
    artifact: Option<Artifact>,
    next_step: usize,
}

impl Job {
    /// An empty job belonging to `app`.
    pub fn new(app: Arc<App>) -> Self {
        Self::with_steps(app, Vec::new())
    }

    /// An unapplied job that will run `recipe`'s steps.
    pub fn from_recipe(app: Arc<App>, recipe: Recipe) -> Self {
        Self::with_steps(app, recipe.into_steps())
    }

    fn with_steps(app: Arc<App>, steps: Vec<Step>) -> Self {
        Self {
            id: JobId::new(),
            app,
            steps,
            artifact: None,
            next_step: 0,
        }
    }

    // -- Building -------------------------------------------------------------

    /// Append a fetch of `uid`.
    pub fn fetch(mut self, uid: impl Into<String>) -> Self {
        self.push_fetch(uid);
        self
    }

    /// Append the processor `name` with `params`.
    pub fn process(mut self, name: impl Into<String>, params: Vec<Value>) -> Self {
        self.push_process(name, params);
        self
    }

    /// Append an encoding to `format` with `params`.
    pub fn encode(mut self, format: impl Into<String>, params: Vec<Value>) -> Self {
        self.push_encode(format, params);
        self
    }

    pub fn push_fetch(&mut self, uid: impl Into<String>) -> &mut Self {
        self.push_step(Step::fetch(uid))
    }

    pub fn push_process(&mut self, name: impl Into<String>, params: Vec<Value>) -> &mut Self {
        self.push_step(Step::process(name, params))
    }

    pub fn push_encode(&mut self, format: impl Into<String>, params: Vec<Value>) -> &mut Self {
        self.push_step(Step::encode(format, params))
    }

    /// Append an already built step. Allowed at any time; steps appended
    /// after an application are run by the next one.
    pub fn push_step(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Concatenate the full step lists of `self` and `other` into a new,
    /// unapplied job.
    ///
    /// Neither operand's progress carries over: the result starts with no
    /// artifact and an empty cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AppMismatch`] if the jobs belong to different apps.
    pub fn combine(&self, other: &Job) -> Result<Job> {
        if !Arc::ptr_eq(&self.app, &other.app) {
            return Err(Error::AppMismatch {
                left: self.app.to_string(),
                right: other.app.to_string(),
            });
        }
        let steps = self.steps.iter().chain(&other.steps).cloned().collect();
        Ok(Job::with_steps(Arc::clone(&self.app), steps))
    }

    // -- Inspection -----------------------------------------------------------

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    /// How many leading steps have been applied.
    pub fn applied_steps(&self) -> usize {
        self.next_step
    }

    /// Steps the next [`apply`](Self::apply) will run.
    pub fn pending_steps(&self) -> &[Step] {
        &self.steps[self.next_step..]
    }

    pub fn already_applied(&self) -> bool {
        self.next_step == self.steps.len()
    }

    pub fn state(&self) -> JobState {
        if self.next_step == 0 && self.artifact.is_none() {
            JobState::Empty
        } else if self.already_applied() {
            JobState::FullyApplied
        } else {
            JobState::PartiallyApplied
        }
    }

    /// The artifact produced so far, without applying anything.
    pub fn current_artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Snapshot of the steps, detached from the app and any progress.
    pub fn recipe(&self) -> Recipe {
        Recipe::new(self.steps.clone())
    }

    // -- Execution ------------------------------------------------------------

    /// Run every pending step in order.
    ///
    /// On error the cursor stays on the failing step and the artifact is the
    /// one produced by the last successful step; the error is returned
    /// exactly as the collaborator reported it.
    pub async fn apply(&mut self) -> Result<()> {
        if self.already_applied() {
            return Ok(());
        }

        let total = self.steps.len();
        tracing::debug!(
            "Applying job {} from step {} of {total}",
            self.id,
            self.next_step + 1
        );

        while let Some(step) = self.steps.get(self.next_step) {
            tracing::debug!("[{}/{total}] {step}", self.next_step + 1);
            match step.apply(self.artifact.as_ref(), &self.app).await {
                Ok(artifact) => {
                    self.artifact = Some(artifact);
                    self.next_step += 1;
                }
                Err(e) => {
                    tracing::warn!("Job {} failed at {step}: {e}", self.id);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Job {} applied {total} steps ({} bytes)",
            self.id,
            self.artifact.as_ref().map_or(0, Artifact::len)
        );
        Ok(())
    }

    /// The resulting artifact, applying pending steps first.
    ///
    /// # Errors
    ///
    /// Any step failure, or [`Error::NoArtifact`] if no step produced one.
    pub async fn artifact(&mut self) -> Result<&Artifact> {
        if !self.already_applied() {
            self.apply().await?;
        }
        self.artifact.as_ref().ok_or(Error::NoArtifact)
    }

    /// The resulting payload, applying pending steps first.
    pub async fn data(&mut self) -> Result<Bytes> {
        Ok(self.artifact().await?.data().clone())
    }

    /// Whether this job holds an artifact or a pending fetch will produce one.
    pub fn has_artifact_source(&self) -> bool {
        self.artifact.is_some() || self.pending_steps().iter().any(Step::is_fetch)
    }

    /// Run the analyser `name` against the resulting artifact.
    ///
    /// The guard is checked before anything is applied: the job must
    /// already hold an artifact or have a pending fetch.
    ///
    /// # Errors
    ///
    /// [`Error::NothingToAnalyse`] when the guard fails, otherwise any step
    /// or analyser failure.
    pub async fn analyse(&mut self, name: &str, params: &[Value]) -> Result<Value> {
        if !self.has_artifact_source() {
            return Err(Error::NothingToAnalyse);
        }
        if !self.already_applied() {
            self.apply().await?;
        }
        let artifact = self.artifact.as_ref().ok_or(Error::NothingToAnalyse)?;
        self.app.analysers().analyse(artifact, name, params).await
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("(no steps)");
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
