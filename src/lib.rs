//! Assetforge - lazy, composable asset processing
//!
//! This library crate exposes the host pieces (config loading, app assembly
//! and the image collaborators) for the binary and integration tests.

pub mod app;
pub mod config;
pub mod imaging;

pub use af_job as job;
