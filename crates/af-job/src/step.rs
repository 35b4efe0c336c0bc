//! The three kinds of job step.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use af_core::{Error, Result};

use crate::app::App;
use crate::artifact::Artifact;

/// One immutable unit of work in a [`Job`](crate::Job).
///
/// A step records *what* to do; it never holds the artifact it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    /// Load the original bytes for `uid` from the app's datastore.
    Fetch { uid: String },
    /// Run the named processor against the current artifact.
    Process {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        params: Vec<Value>,
    },
    /// Re-encode the current artifact into `format`.
    Encode {
        format: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        params: Vec<Value>,
    },
}

impl Step {
    pub fn fetch(uid: impl Into<String>) -> Self {
        Step::Fetch { uid: uid.into() }
    }

    pub fn process(name: impl Into<String>, params: Vec<Value>) -> Self {
        Step::Process {
            name: name.into(),
            params,
        }
    }

    pub fn encode(format: impl Into<String>, params: Vec<Value>) -> Self {
        Step::Encode {
            format: format.into(),
            params,
        }
    }

    /// Short lowercase name of the variant ("fetch", "process", "encode").
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Fetch { .. } => "fetch",
            Step::Process { .. } => "process",
            Step::Encode { .. } => "encode",
        }
    }

    /// The operation identifier: storage uid, processor name or format.
    pub fn operation(&self) -> &str {
        match self {
            Step::Fetch { uid } => uid,
            Step::Process { name, .. } => name,
            Step::Encode { format, .. } => format,
        }
    }

    /// Parameters forwarded to the collaborator (always empty for fetch).
    pub fn params(&self) -> &[Value] {
        match self {
            Step::Fetch { .. } => &[],
            Step::Process { params, .. } | Step::Encode { params, .. } => params.as_slice(),
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, Step::Fetch { .. })
    }

    /// Produce the artifact that replaces `current`.
    ///
    /// Collaborator failures are returned as-is.
    pub async fn apply(&self, current: Option<&Artifact>, app: &App) -> Result<Artifact> {
        match self {
            Step::Fetch { uid } => {
                let data = app.datastore().retrieve(uid).await?;
                Ok(Artifact::new(data))
            }
            Step::Process { name, params } => {
                let artifact = current.ok_or(Error::NothingToProcess)?;
                let data = app.processors().process(artifact, name, params).await?;
                Ok(Artifact::new(data))
            }
            Step::Encode { format, params } => {
                let artifact = current.ok_or(Error::NothingToEncode)?;
                let data = app.encoders().encode(artifact, format, params).await?;
                Ok(Artifact::new(data))
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.kind(), self.operation())?;
        for param in self.params() {
            match param {
                Value::String(s) => write!(f, ", {s}")?,
                other => write!(f, ", {other}")?,
            }
        }
        f.write_str(")")
    }
}
