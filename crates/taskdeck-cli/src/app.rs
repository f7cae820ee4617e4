//! Application state management.

use crate::remote::JsonFileRemote;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use taskdeck_core::{Config, FetchOutcome, StoreOptions, TaskStore};
use tracing::info;

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,

    /// The task store
    pub store: Arc<TaskStore>,

    /// Task file behind the store's remote
    pub data_file: PathBuf,
}

impl App {
    /// Open the task file and load its tasks, for a one-shot command.
    ///
    /// One-shot commands issue a single fetch, so there is no burst to
    /// collapse and the debounce is skipped.
    pub async fn open(config: Config, data_override: Option<PathBuf>) -> anyhow::Result<Self> {
        let options = StoreOptions {
            debounce: Duration::ZERO,
            ..StoreOptions::from(&config)
        };
        Self::open_with(config, data_override, options).await
    }

    /// Open the task file for a long-running command, keeping the configured
    /// sync timings.
    pub async fn open_watching(
        config: Config,
        data_override: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let options = StoreOptions::from(&config);
        Self::open_with(config, data_override, options).await
    }

    async fn open_with(
        config: Config,
        data_override: Option<PathBuf>,
        options: StoreOptions,
    ) -> anyhow::Result<Self> {
        let data_file = match data_override {
            Some(path) => path,
            None => config.data_file()?,
        };

        let remote = Arc::new(JsonFileRemote::new(&data_file));
        let store = Arc::new(TaskStore::with_options(remote, options));

        let app = App {
            config,
            store,
            data_file,
        };

        if let FetchOutcome::Failed = app.store.request_fetch(true).await {
            app.check()?;
        }

        info!(
            data_file = %app.data_file.display(),
            tasks = app.store.tasks().len(),
            "Application initialized"
        );

        Ok(app)
    }

    /// Turn a recorded store error into a command failure.
    pub fn check(&self) -> anyhow::Result<()> {
        match self.store.error() {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }
}
