//! Toggle command - flip a task's completion flag.

use crate::app::App;
use crate::commands::describe;
use std::path::PathBuf;
use taskdeck_core::{Config, TaskId};

/// Run the toggle command.
pub async fn run(config: Config, data: Option<PathBuf>, id: String) -> anyhow::Result<()> {
    let app = App::open(config, data).await?;
    let id = TaskId::new(id);

    if app.store.get(&id).is_none() {
        anyhow::bail!("No task with id {}", id);
    }

    app.store.toggle_completed(&id).await;
    app.check()?;

    if let Some(task) = app.store.get(&id) {
        println!("{}", describe(&task));
    }
    Ok(())
}
