//! Status command - show task counts and fetch state.

use crate::app::App;
use std::path::PathBuf;
use taskdeck_core::Config;

/// Run the status command.
pub async fn run(config: Config, data: Option<PathBuf>) -> anyhow::Result<()> {
    let app = App::open(config, data).await?;
    let status = app.store.status();

    println!("Taskdeck Status");
    println!("===============");
    println!();

    println!("Summary:");
    println!("  Total tasks:  {}", app.store.tasks().len());
    println!("  Completed:    {}", app.store.completed_tasks().len());
    println!("  In progress:  {}", app.store.running_tasks().len());

    if let Some(fetched) = status.last_fetched_at {
        println!(
            "  Last fetched: {}",
            fetched.format("%Y-%m-%d %H:%M:%S")
        );
    }
    if let Some(ref error) = status.error {
        println!("  Last error:   {}", error);
    }

    let options = app.store.options();
    println!();
    println!("Sync:");
    println!("  Freshness window: {}ms", options.freshness_window.as_millis());
    println!("  Search threshold: {}", options.search.threshold);

    println!();
    println!("Data file: {}", app.data_file.display());

    Ok(())
}
