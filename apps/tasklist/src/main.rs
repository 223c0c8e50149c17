//! Command-line view of the task list.
//!
//! Every command loads the list, performs its intent, waits for the
//! outcome and prints the list newest first.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tasklist::{ApiConfig, TaskId, TodoApp, TodoEnvironment, TodoState};
use tasklist_core::environment::SystemClock;
use tasklist_runtime::{EffectHandle, ReqwestHttpClient, StoreConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tasklist", version, about = "Manage the tasks of a /todos collection")]
struct Cli {
    /// Base URL of the API (default depends on the build mode)
    #[arg(long, env = "TASKLIST_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the list
    List,
    /// Create a task
    Add {
        /// What needs to be done
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Change the text of a task
    Edit {
        /// Task id
        id: String,
        /// New text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Mark a task done
    Done {
        /// Task id
        id: String,
    },
    /// Mark a task open again
    Undo {
        /// Task id
        id: String,
    },
    /// Delete a task
    Rm {
        /// Task id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tasklist=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut api = ApiConfig::from_env()?;
    if let Some(base_url) = cli.api_url {
        api = api.with_base_url(base_url);
    }
    tracing::info!(base_url = %api.base_url, "Starting tasklist");

    let http = ReqwestHttpClient::new(api.request_timeout)?;
    let config = StoreConfig::default().with_shutdown_timeout(api.shutdown_timeout);
    let app = TodoApp::with_config(
        TodoEnvironment::new(Arc::new(http), Arc::new(SystemClock), api),
        config,
    );

    settle(app.load().await?).await;

    let intent = match cli.command.unwrap_or(Command::List) {
        Command::List => None,
        Command::Add { text } => Some(app.add(&text.join(" ")).await?),
        Command::Edit { id, text } => Some(app.rename(&TaskId::new(id), &text.join(" ")).await?),
        Command::Done { id } => Some(app.set_completed(&TaskId::new(id), true).await?),
        Command::Undo { id } => Some(app.set_completed(&TaskId::new(id), false).await?),
        Command::Rm { id } => Some(app.remove(&TaskId::new(id)).await?),
    };
    if let Some(handle) = intent {
        settle(handle).await;
    }

    print_list(&app.snapshot().await);

    app.shutdown().await?;
    Ok(())
}

/// Wait until the outcome of a request is reduced
async fn settle(mut handle: EffectHandle) {
    handle.wait().await;
}

fn print_list(state: &TodoState) {
    if state.is_empty() {
        println!("No tasks.");
    }
    for task in state.display_order() {
        let mark = if task.completed { "x" } else { " " };
        println!("[{mark}] {:>4}  {}", task.id, task.text);
    }
    println!(
        "\n{} of {} done",
        state.completed_count(),
        state.len()
    );

    if let Some(error) = &state.error {
        eprintln!("error: {error}");
    }
}
