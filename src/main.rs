use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use project_file_fetch::app::events::{Operation, PipelineEvent};
use project_file_fetch::app::state::AppState;
use project_file_fetch::app::tasks;
use project_file_fetch::app::view_model::FetchView;
use project_file_fetch::config::{self, settings};
use project_file_fetch::core::{check_source_folder, ProjectId};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

/// Fetch equipment and serial numbers for a Rentman project and collect the
/// files that belong to them.
#[derive(Parser, Debug)]
#[command(name = "project-file-fetch", version, about)]
struct Cli {
    /// Configuration file to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// `.env` file holding RENTMAN_TOKEN. Defaults to ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the equipment and serial numbers of a project.
    Fetch {
        #[arg(short, long)]
        project: String,
        /// Only show rows containing this text (case-insensitive).
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Fetch a project, then copy the matching files of a folder into
    /// `<folder>/<project>`.
    Copy {
        #[arg(short, long)]
        project: String,
        /// Source folder. Defaults to the last folder used.
        #[arg(short, long)]
        folder: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app_config = settings::load_config(cli.config.as_deref())?;

    let (project_arg, search, folder) = match cli.command {
        Command::Fetch { project, search } => (project, search, None),
        Command::Copy { project, folder } => {
            let folder = folder
                .or_else(|| app_config.last_source_folder.clone())
                .context("No source folder given and none remembered; pass --folder")?;
            (project, None, Some(folder))
        }
    };

    // Configuration and folder problems are reported before any request goes out.
    let project: ProjectId = project_arg.parse()?;
    if let Some(folder) = &folder {
        check_source_folder(folder)?;
    }
    let token = config::load_token(cli.env_file.as_deref())?;
    let client = Arc::new(app_config.client(token));

    let state = Arc::new(Mutex::new(AppState::new(app_config, cli.config)));
    let (tx, mut rx) = mpsc::unbounded_channel();

    tasks::start_fetch(client, project, tx.clone(), state.clone())?;
    let view = match wait_for(&mut rx, Operation::Fetch).await? {
        PipelineEvent::FetchCompleted(view) => view,
        other => bail!("unexpected event while fetching: {:?}", other),
    };

    match folder {
        None => print_tables(&view, search.as_deref().unwrap_or("")),
        Some(folder) => {
            eprintln!("{}", view.summary);
            tasks::start_copy(folder, tx.clone(), state.clone())?;
            match wait_for(&mut rx, Operation::Copy).await? {
                PipelineEvent::CopyCompleted(report) => println!("{}", report.summary()),
                other => bail!("unexpected event while copying: {:?}", other),
            }
        }
    }
    Ok(())
}

/// Relays status lines until `operation` completes or fails.
async fn wait_for(
    rx: &mut UnboundedReceiver<PipelineEvent>,
    operation: Operation,
) -> Result<PipelineEvent> {
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::Status(status) => eprintln!("{}", status),
            PipelineEvent::Failed {
                operation: failed,
                message,
                ..
            } if failed == operation => bail!(message),
            other => return Ok(other),
        }
    }
    bail!("background task stopped without reporting a result")
}

fn print_tables(view: &FetchView, search: &str) {
    println!("== Equipment ==");
    print!("{}", view.equipment.render(&view.equipment.filter(search)));
    println!();
    println!("== Serial Numbers ==");
    print!("{}", view.serial_numbers.render(&view.serial_numbers.filter(search)));
    println!();
    println!("{}", view.summary);
}
