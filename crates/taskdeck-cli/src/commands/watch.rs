//! Watch command - refresh periodically and report changes.

use crate::app::App;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use taskdeck_core::{ChangeHandlerMessage, ChangeKind, ChannelChangeHandler, Config};
use tracing::{info, warn};

const DEFAULT_INTERVAL_SECS: u64 = 10;

/// How often queued notifications are printed.
const DRAIN_INTERVAL: Duration = Duration::from_millis(200);

/// Run the watch command.
pub async fn run(
    config: Config,
    data: Option<PathBuf>,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    let period = interval
        .map(Duration::from_secs)
        .or_else(|| config.auto_refresh())
        .unwrap_or(Duration::from_secs(DEFAULT_INTERVAL_SECS))
        .max(Duration::from_secs(1));

    let app = App::open_watching(config, data).await?;

    let (handler, receiver) = ChannelChangeHandler::new();
    app.store.subscribe(Arc::new(handler));

    println!(
        "Watching {} ({} tasks), refreshing every {}s.",
        app.data_file.display(),
        app.store.tasks().len(),
        period.as_secs()
    );
    println!("Press Ctrl+C to stop.");
    println!();

    // The first tick fires at once; the initial fetch is still fresh, so it is skipped.
    let refresh = app.store.spawn_auto_refresh(period);
    let mut drain = tokio::time::interval(DRAIN_INTERVAL);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = drain.tick() => {
                for message in receiver.try_iter() {
                    match message {
                        ChangeHandlerMessage::Change(event) if event.kind == ChangeKind::Replaced => {
                            info!(generation = event.generation, "Tasks refreshed");
                            println!(
                                "{}  {} tasks ({} in progress)",
                                chrono::Local::now().format("%H:%M:%S"),
                                app.store.tasks().len(),
                                app.store.running_tasks().len()
                            );
                        }
                        ChangeHandlerMessage::Change(event) => {
                            info!(kind = %event.kind, id = ?event.id, "Change");
                        }
                        ChangeHandlerMessage::Status(status) => {
                            if let Some(error) = status.error {
                                warn!(error = %error, "Refresh failed");
                            }
                        }
                    }
                }
            }
        }
    }

    refresh.abort();
    println!("Watch stopped.");
    Ok(())
}
