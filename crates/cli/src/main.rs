//! Settle CLI - settle command

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod daemon;
mod locks;
mod logging;
mod util;

/// Settle - notify when a synced folder goes quiet
#[derive(Parser)]
#[command(name = "settle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration and state directory
    #[arg(long, global = true, env = "SETTLE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Start {
        /// Run in foreground (for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Add a folder to monitor
    Add(AddArgs),
    /// Stop monitoring a folder
    Remove {
        /// Folder name
        name: String,
    },
    /// Show monitored folders and daemon state
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Send a test notification for a folder
    Test {
        /// Folder name
        name: String,
    },
}

#[derive(Args)]
pub struct AddArgs {
    /// Unique folder name
    pub name: String,

    /// Folder to watch
    pub path: PathBuf,

    /// Message template ({folder} and {path} are substituted)
    #[arg(long, global = true)]
    pub message: Option<String>,

    /// Seconds without activity before notifying
    #[arg(long, global = true)]
    pub inactivity: Option<u64>,

    /// Notification title
    #[arg(long, global = true)]
    pub title: Option<String>,

    /// Gitignore-style pattern to exclude (repeatable)
    #[arg(long = "ignore", global = true)]
    pub ignore: Vec<String>,

    #[command(subcommand)]
    pub backend: BackendArgs,
}

/// Notification service for a folder
#[derive(Subcommand)]
pub enum BackendArgs {
    /// ntfy topic
    Ntfy {
        topic: String,
        /// ntfy server
        #[arg(long, default_value = "https://ntfy.sh")]
        server: String,
    },
    /// Pushover application
    Pushover { api_token: String, user_key: String },
    /// Discord webhook
    Discord { webhook_url: String },
    /// Telegram bot
    Telegram { bot_token: String, chat_id: String },
    /// Gotify server
    Gotify { server: String, token: String },
    /// Matrix room
    Matrix {
        homeserver: String,
        access_token: String,
        room_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = util::config_dir(cli.config_dir)?;

    // The foreground daemon sets up its own file logging
    let daemon_foreground = matches!(cli.command, Commands::Start { foreground: true });
    if !daemon_foreground {
        logging::init_cli();
    }

    match cli.command {
        Commands::Start { foreground } => cmd::start::run(&config_dir, foreground).await,
        Commands::Stop => cmd::stop::run(&config_dir).await,
        Commands::Add(args) => cmd::add::run(&config_dir, args).await,
        Commands::Remove { name } => cmd::remove::run(&config_dir, &name).await,
        Commands::Status { json } => cmd::status::run(&config_dir, json).await,
        Commands::Test { name } => cmd::test::run(&config_dir, &name).await,
    }
}
