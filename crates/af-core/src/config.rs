//! Application configuration types.
//!
//! The top-level [`Config`] struct carries the datastore and imaging
//! sections. Every section defaults sensibly so a completely empty document
//! is valid; reading the file is left to the host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub datastore: DatastoreConfig,
    pub imaging: ImagingConfig,
}

impl Config {
    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.datastore.backend == DatastoreBackend::Memory {
            warnings.push(
                "datastore.backend is 'memory'; stored artifacts are lost when the process exits"
                    .into(),
            );
        }

        if self.datastore.backend == DatastoreBackend::File
            && self.datastore.root.as_os_str().is_empty()
        {
            warnings.push("datastore.root is empty; the current directory will be used".into());
        }

        if !(1..=100).contains(&self.imaging.jpeg_quality) {
            warnings.push(format!(
                "imaging.jpeg_quality {} is outside 1-100 and will be clamped",
                self.imaging.jpeg_quality
            ));
        }

        if self.imaging.max_dimension == 0 {
            warnings.push("imaging.max_dimension is 0; every resize will be rejected".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Which [`DataStore`] implementation backs the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatastoreBackend {
    /// Process-local map; nothing survives a restart.
    Memory,
    /// Files under [`DatastoreConfig::root`].
    #[default]
    File,
}

impl fmt::Display for DatastoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatastoreBackend::Memory => f.write_str("memory"),
            DatastoreBackend::File => f.write_str("file"),
        }
    }
}

/// Datastore settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatastoreConfig {
    pub backend: DatastoreBackend,
    /// Root directory for the file backend. May start with `~`.
    pub root: PathBuf,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            backend: DatastoreBackend::File,
            root: PathBuf::from("~/.local/share/assetforge/store"),
        }
    }
}

/// Resampling filter used by the resize and thumbnail processors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

/// Image processing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagingConfig {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Largest width or height a processor may produce.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    pub filter: ResizeFilter,
}

fn default_jpeg_quality() -> u8 {
    85
}
fn default_max_dimension() -> u32 {
    8192
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            max_dimension: default_max_dimension(),
            filter: ResizeFilter::default(),
        }
    }
}
