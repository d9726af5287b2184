use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

mod commands;

use commands::{Command, Overrides};

#[derive(Parser, Debug)]
#[command(name = "nsupload")]
#[command(about = "Sync SuiteScript files with the NetSuite file cabinet through a RESTlet")]
#[command(version)]
struct Cli {
    /// Workspace root; maps to the remote root folder (default: current dir)
    #[arg(long, env = "NSUPLOAD_WORKSPACE", global = true)]
    workspace: Option<PathBuf>,

    /// Path to config file (default: .vscode/settings.json, then the user config)
    #[arg(long, env = "NSUPLOAD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// RESTlet URL, including script and deploy parameters
    #[arg(long, env = "NSUPLOAD_RESTLET", global = true)]
    restlet: Option<String>,

    /// Pre-shared Authorization header; takes precedence over OAuth keys
    #[arg(long, env = "NSUPLOAD_AUTHENTICATION", hide_env_values = true, global = true)]
    authentication: Option<String>,

    /// Remote folder the workspace maps to (default: SuiteScripts)
    #[arg(long, env = "NSUPLOAD_ROOT_DIRECTORY", global = true)]
    root_directory: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "NSUPLOAD_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a file to the file cabinet
    UploadFile { path: PathBuf },
    /// Replace a local file with its file cabinet copy
    DownloadFile { path: PathBuf },
    /// Print the file cabinet copy of a file
    PreviewFile { path: PathBuf },
    /// Delete the file cabinet copy of a file (the local file is kept)
    DeleteFile { path: PathBuf },
    /// Upload every file under a directory
    UploadDir { path: PathBuf },
    /// Download a file cabinet folder into the workspace
    DownloadDir { path: PathBuf },
    /// Show the RESTlet version and whether it is supported
    Version,
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::UploadFile { path } => Command::UploadFile(path),
            Commands::DownloadFile { path } => Command::DownloadFile(path),
            Commands::PreviewFile { path } => Command::PreviewFile(path),
            Commands::DeleteFile { path } => Command::DeleteFile(path),
            Commands::UploadDir { path } => Command::UploadDir(path),
            Commands::DownloadDir { path } => Command::DownloadDir(path),
            Commands::Version => Command::Version,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for previewed content
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("nsupload v{} starting", env!("CARGO_PKG_VERSION"));

    let workspace = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let overrides = Overrides {
        config_path: cli.config,
        restlet: cli.restlet,
        authentication: cli.authentication,
        root_directory: cli.root_directory,
    };

    commands::run(&workspace, overrides, cli.command.into())
        .await
        .map_err(commands::user_error)
}
