//! Shared application state.

use std::path::PathBuf;
use std::time::Duration;

use bhavmaster_core::{BhavProvider, MasterPipeline, NseProvider, OutputStore, StoreError};

use crate::config::AppConfig;

/// State behind every route handler.
///
/// Holds the provider and store for the process lifetime. Pipelines are
/// assembled per request so each run reloads the sector table.
pub struct AppState {
    provider: Box<dyn BhavProvider>,
    sectors_file: PathBuf,
    store: OutputStore,
}

impl AppState {
    /// Build state from configuration, creating the output directory.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let provider = NseProvider::with_options(
            Duration::from_secs(config.provider.timeout_secs),
            &config.provider.user_agent,
        );
        let store = OutputStore::create(&config.data_dir)?;
        Ok(Self {
            provider: Box::new(provider),
            sectors_file: config.sectors_file.clone(),
            store,
        })
    }

    /// Swap in a different provider (offline runs, tests).
    pub fn with_provider(mut self, provider: Box<dyn BhavProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Assemble a pipeline borrowing this state.
    pub fn pipeline(&self) -> MasterPipeline<'_> {
        MasterPipeline::new(self.provider.as_ref(), &self.sectors_file, &self.store)
    }
}
