//! codeloom - LLM workflow runner
//!
//! - `codeloom agent`: iterative coding agent inside a workspace directory
//! - `codeloom schema`: Mermaid ER diagram to SQL, optionally applied to SQLite

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use codeloom_core::{paths, AppConfig};

mod commands;

/// codeloom - LLM workflow runner
#[derive(Parser)]
#[command(name = "codeloom")]
#[command(about = "Run LLM-driven coding and schema workflows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.codeloom/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the model from the config
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log to stderr instead of ~/.codeloom/logs/codeloom.log
    #[arg(long, global = true)]
    log_stderr: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coding agent on a task
    ///
    /// The agent reads and writes files and runs shell commands inside the
    /// workspace until it calls attempt_completion.
    Agent(AgentArgs),

    /// Generate SQL from a Mermaid ER diagram
    ///
    /// Validates and corrects the diagram, generates CREATE and ALTER
    /// statements, writes them as a script, and optionally applies them.
    Schema(SchemaArgs),
}

#[derive(Args)]
pub struct AgentArgs {
    /// Project directory the agent works in
    #[arg(short, long, default_value = ".")]
    pub workspace: PathBuf,

    /// Task description
    #[arg(short, long, conflicts_with = "task_file", required_unless_present = "task_file")]
    pub task: Option<String>,

    /// Read the task description from a file
    #[arg(long)]
    pub task_file: Option<PathBuf>,

    /// Send tool errors back to the model instead of stopping
    #[arg(long)]
    pub report_tool_errors: bool,

    /// Run the command suggested by attempt_completion
    #[arg(long)]
    pub run_command: bool,

    #[arg(long)]
    pub max_steps: Option<usize>,
}

#[derive(Args)]
pub struct SchemaArgs {
    /// Mermaid ER diagram file
    #[arg(short, long)]
    pub diagram: PathBuf,

    /// Where to write the SQL script
    #[arg(short, long, default_value = "schema.sql")]
    pub out: PathBuf,

    /// Emit a DROP/CREATE/USE DATABASE preamble for this name
    #[arg(long)]
    pub database: Option<String>,

    /// Apply the generated statements to this SQLite database
    #[arg(long)]
    pub apply_sqlite: Option<PathBuf>,

    /// Ask on the terminal for corrected statements instead of the model
    #[arg(long)]
    pub operator: bool,

    /// Generate per-table statements concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Print the result (and apply report) as JSON
    #[arg(long)]
    pub json: bool,
}

fn init_logging(to_stderr: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let log_dir = match paths::ensure_logs_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to create log directory: {}, logging to stderr", e);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            return Ok(());
        }
    };

    let log_file = std::fs::File::create(log_dir.join(codeloom_core::constants::paths::LOG_FILE_NAME))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_stderr)?;

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from_path(path)?;
            config.apply_env_with(|key| std::env::var(key).ok());
            config
        }
        None => AppConfig::load()?,
    };
    if let Some(model) = cli.model {
        config.ai.model = model;
    }

    match cli.command {
        Commands::Agent(args) => commands::run_agent(&config, args).await,
        Commands::Schema(args) => commands::run_schema(&config, args).await,
    }
}
