//! Assemble an [`App`] from configuration.

use std::sync::Arc;

use af_job::{App, FileDataStore, MemoryDataStore};
use anyhow::Result;

use crate::config::{self, Config, DatastoreBackend};
use crate::imaging;

/// Build the app the CLI runs jobs against: the configured datastore plus
/// the image processors, encoders and analysers.
pub fn build_app(config: &Config) -> Result<Arc<App>> {
    let builder = App::builder("assetforge")
        .processors(imaging::processors(&config.imaging))
        .encoders(imaging::encoders(&config.imaging))
        .analysers(imaging::analysers());

    let builder = match config.datastore.backend {
        DatastoreBackend::Memory => builder.datastore(MemoryDataStore::new()),
        DatastoreBackend::File => {
            let root = config::datastore_root(&config.datastore)?;
            tracing::debug!("File datastore at {:?}", root);
            builder.datastore(FileDataStore::new(root))
        }
    };

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_imaging_collaborators() {
        let mut config = Config::default();
        config.datastore.backend = DatastoreBackend::Memory;
        let app = build_app(&config).unwrap();
        assert!(app.processors().contains("thumbnail"));
        assert!(app.encoders().contains("jpg"));
        assert!(app.analysers().contains("width"));
    }
}
