//! Add command - create a task.

use crate::app::App;
use crate::commands::describe;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use taskdeck_core::{Config, NewTask};

/// Run the add command.
pub async fn run(
    config: Config,
    data: Option<PathBuf>,
    title: String,
    description: Option<String>,
    priority: Option<i64>,
    due: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    if title.trim().is_empty() {
        anyhow::bail!("Title must not be empty");
    }

    let app = App::open(config, data).await?;

    let draft = NewTask {
        title,
        description,
        priority,
        due_date: due,
    };
    let task = app.store.create(draft).await?;

    println!("Created {}", describe(&task));
    Ok(())
}
