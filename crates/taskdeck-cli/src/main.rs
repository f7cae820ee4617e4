//! # Taskdeck CLI
//!
//! Command-line interface for the Taskdeck task list.
//!
//! ## Commands
//!
//! - `taskdeck list` - Show tasks, optionally searched and filtered
//! - `taskdeck add <title>` - Create a task
//! - `taskdeck toggle <id>` - Flip a task between done and in progress
//! - `taskdeck edit <id>` - Change a task's fields
//! - `taskdeck remove <id>` - Delete a task
//! - `taskdeck status` - Show task counts and the last fetch time
//! - `taskdeck watch` - Refresh periodically and report changes
//!
//! ## Example Usage
//!
//! ```bash
//! taskdeck add "Write report" --priority 1
//! taskdeck list --search reprot --status in-progress
//! taskdeck toggle 1
//! ```

mod app;
mod commands;
mod remote;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskdeck_core::{StatusFilter, TaskPatch};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Taskdeck - Task list with fuzzy search
#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Task file to use instead of the configured one
    #[arg(long, global = true, env = "TASKDECK_DATA")]
    data: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tasks
    #[command(alias = "ls")]
    List {
        /// Fuzzy search over titles
        #[arg(short, long)]
        search: Option<String>,

        /// Status filter (all, completed, in-progress)
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// Only show tasks with this priority
        #[arg(short, long)]
        priority: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Create a task
    Add {
        /// Task title
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        priority: Option<i64>,

        /// Due date (RFC 3339)
        #[arg(long)]
        due: Option<DateTime<Utc>>,
    },

    /// Flip a task between done and in progress
    Toggle {
        /// Task id
        id: String,
    },

    /// Change a task's fields
    Edit {
        /// Task id
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        priority: Option<i64>,

        /// Due date (RFC 3339)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<DateTime<Utc>>,

        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Delete a task
    #[command(alias = "rm")]
    Remove {
        /// Task id
        id: String,
    },

    /// Show task counts and the last fetch time
    Status,

    /// Refresh periodically and report changes until Ctrl+C
    Watch {
        /// Refresh interval in seconds (defaults to sync.auto_refresh_secs, or 10)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => taskdeck_core::Config::load_from(path)?,
        None => taskdeck_core::Config::load()?,
    };

    let data = cli.data;

    // Execute command
    match cli.command {
        Commands::List {
            search,
            status,
            priority,
            output,
        } => commands::list::run(config, data, search, status, priority, output).await,
        Commands::Add {
            title,
            description,
            priority,
            due,
        } => commands::add::run(config, data, title, description, priority, due).await,
        Commands::Toggle { id } => commands::toggle::run(config, data, id).await,
        Commands::Edit {
            id,
            title,
            description,
            priority,
            due,
            clear_description,
            clear_due,
        } => {
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                priority,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
            };
            commands::edit::run(config, data, id, patch).await
        }
        Commands::Remove { id } => commands::remove::run(config, data, id).await,
        Commands::Status => commands::status::run(config, data).await,
        Commands::Watch { interval } => commands::watch::run(config, data, interval).await,
    }
}
