//! List command - show the filtered task view.

use crate::app::App;
use crate::commands::describe;
use crate::OutputFormat;
use std::path::PathBuf;
use std::time::Instant;
use taskdeck_core::{Config, FilterState, StatusFilter};

/// Run the list command.
pub async fn run(
    config: Config,
    data: Option<PathBuf>,
    search: Option<String>,
    status: StatusFilter,
    priority: Option<String>,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let app = App::open(config, data).await?;

    app.store.set_filter(FilterState {
        search_query: search.unwrap_or_default(),
        status_filter: status,
        priority_filter: priority.unwrap_or_default(),
    });

    let start = Instant::now();
    let tasks = app.store.filtered_tasks();
    let elapsed = start.elapsed();

    match output {
        OutputFormat::Text => {
            if tasks.is_empty() {
                eprintln!("No tasks.");
                return Ok(());
            }

            for task in &tasks {
                println!("{}", describe(task));
            }

            eprintln!();
            eprintln!(
                "{} of {} tasks in {:.3}ms",
                tasks.len(),
                app.store.tasks().len(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
    }

    Ok(())
}
