use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use workboard::board::HttpBackend;
use workboard::config::BoardConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "workboard")]
#[command(version, about = "Kanban workflow board client")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the workflow/job API. Overrides config and WORKBOARD_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Explicit config file (defaults to .workboard/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available workflows and their stages
    Workflows,
    /// Render the board of a workflow
    Board {
        workflow_id: i64,
    },
    /// Move a job to another stage, as a drag and drop would
    Move {
        workflow_id: i64,
        job_id: i64,
        stage_id: i64,

        /// Position in the destination column (defaults to the end)
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let mut config = BoardConfig::load(&project_dir, cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    workboard::logging::init_logging(&config.log, cli.verbose)?;

    if let Commands::Config = cli.command {
        return cmd::cmd_config(&project_dir, &config);
    }

    let backend = Arc::new(HttpBackend::from_config(&config)?);
    match &cli.command {
        Commands::Workflows => cmd::cmd_workflows(backend).await?,
        Commands::Board { workflow_id } => cmd::cmd_board(backend, *workflow_id).await?,
        Commands::Move {
            workflow_id,
            job_id,
            stage_id,
            index,
        } => cmd::cmd_move(backend, *workflow_id, *job_id, *stage_id, *index).await?,
        Commands::Config => {}
    }

    Ok(())
}
