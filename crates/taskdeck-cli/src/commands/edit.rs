//! Edit command - change a task's fields.

use crate::app::App;
use crate::commands::describe;
use std::path::PathBuf;
use taskdeck_core::{Config, TaskId, TaskPatch};

/// Run the edit command.
pub async fn run(
    config: Config,
    data: Option<PathBuf>,
    id: String,
    patch: TaskPatch,
) -> anyhow::Result<()> {
    if patch.is_empty() {
        eprintln!("Nothing to change.");
        return Ok(());
    }

    let app = App::open(config, data).await?;
    let id = TaskId::new(id);

    app.store.update(&id, patch).await?;
    app.check()?;

    if let Some(task) = app.store.get(&id) {
        println!("Updated {}", describe(&task));
    }
    Ok(())
}
