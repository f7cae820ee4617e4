//! Remove command - delete a task.

use crate::app::App;
use std::path::PathBuf;
use taskdeck_core::{Config, TaskId};

/// Run the remove command.
pub async fn run(config: Config, data: Option<PathBuf>, id: String) -> anyhow::Result<()> {
    let app = App::open(config, data).await?;
    let id = TaskId::new(id);

    app.store.remove(&id).await?;
    app.check()?;

    println!("Removed task {}.", id);
    Ok(())
}
