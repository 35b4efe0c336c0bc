//! # af-job
//!
//! Lazy, composable jobs that transform binary artifacts.
//!
//! This crate provides:
//!
//! - **[`Job`]** -- an ordered list of [`Step`]s (fetch, process, encode)
//!   that is only executed when its result is needed. Execution is
//!   incremental: each step runs at most once, and steps appended after an
//!   application are picked up by the next one.
//! - **[`App`]** -- the owning context a job delegates to: a [`DataStore`]
//!   plus [`Processors`], [`Encoders`] and [`Analysers`] registries.
//! - **[`Artifact`]** -- the immutable payload passed from step to step.
//! - **[`Recipe`]** -- a serializable snapshot of a job's steps with a
//!   stable signature.
//! - **Datastores** ([`datastore`]) -- in-memory and filesystem backends.
//!
//! ```ignore
//! let app = App::builder("images").datastore(store).build();
//! let mut job = app
//!     .fetch("abc123")
//!     .process("thumbnail", params![100, 100])
//!     .encode("jpg", params![]);
//! let bytes = job.data().await?;
//! ```

pub mod app;
pub mod artifact;
pub mod datastore;
pub mod job;
pub mod recipe;
pub mod registry;
pub mod step;

// Re-export key types at the crate root.
pub use app::{App, AppBuilder};
pub use artifact::Artifact;
pub use datastore::{DataStore, FileDataStore, MemoryDataStore};
pub use job::{Job, JobState};
pub use recipe::Recipe;
pub use registry::{Analyser, Analysers, Encoder, Encoders, Processor, Processors, Registry};
pub use step::Step;

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build a step parameter list from JSON-compatible literals.
///
/// `params![100, 100]` is `vec![json!(100), json!(100)]`.
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::__serde_json::Value>::new()
    };
    ($($param:expr),+ $(,)?) => {
        ::std::vec![$($crate::__serde_json::json!($param)),+]
    };
}
