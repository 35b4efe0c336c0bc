//! Serializable job recipes.
//!
//! A recipe is the step list of a job without any execution state. It can be
//! stored, sent elsewhere and turned back into an unapplied job with
//! [`Job::from_recipe`](crate::Job::from_recipe).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use af_core::Result;

use crate::step::Step;

/// Ordered steps of a job, detached from any app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe {
    steps: Vec<Step>,
}

impl Recipe {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// SHA-256 hex digest identifying this exact sequence of steps.
    ///
    /// Parameters are hashed in their compact JSON form, so `100` and
    /// `"100"` give different signatures.
    pub fn signature(&self) -> String {
        let mut hasher = Sha256::new();
        for step in &self.steps {
            hasher.update(step.kind().as_bytes());
            hasher.update([0]);
            hasher.update(step.operation().as_bytes());
            for param in step.params() {
                hasher.update([0]);
                hasher.update(param.to_string().as_bytes());
            }
            hasher.update([0xff]);
        }
        hex::encode(hasher.finalize())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<Vec<Step>> for Recipe {
    fn from(steps: Vec<Step>) -> Self {
        Self::new(steps)
    }
}
