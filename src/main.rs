//! taskdesk - command-line client for the team task tracker.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use taskdesk::{config, middleware, ClientContext};

mod commands;

use commands::{TaskCommand, UserCommand};

/// taskdesk - team task tracker client
#[derive(Parser, Debug)]
#[command(name = "taskdesk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the tracker API (overrides API_BASE_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// File holding the stored session (overrides SESSION_FILE)
    #[arg(long)]
    session_file: Option<String>,

    /// Log level (trace, debug, info, warn, error; overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store the session
    Login {
        username: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear the stored session
    Logout,

    /// Show the signed-in user's profile
    Whoami,

    /// Task counts and recent activity
    Dashboard,

    /// Task management
    #[command(subcommand)]
    Tasks(TaskCommand),

    /// Team members
    #[command(subcommand)]
    Users(UserCommand),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = config::Settings::new().context("failed to load configuration")?;
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(session_file) = cli.session_file {
        settings.session_file = session_file;
    }
    if let Some(log_level) = cli.log_level {
        settings.log_level = log_level;
    }
    settings.validate().context("invalid configuration")?;

    middleware::init_logging(&settings.log_level, &settings.log_format)
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))?;

    tracing::debug!("taskdesk v{}", env!("CARGO_PKG_VERSION"));

    let ctx = ClientContext::new(settings).context("failed to build client")?;

    let result = match cli.command {
        Commands::Login { username, password } => commands::login(&ctx, &username, password).await,
        Commands::Logout => commands::logout(&ctx),
        Commands::Whoami => commands::whoami(&ctx),
        Commands::Dashboard => commands::dashboard(&ctx).await,
        Commands::Tasks(cmd) => commands::tasks(&ctx, cmd).await,
        Commands::Users(cmd) => commands::users(&ctx, cmd).await,
    };

    Ok(ExitCode::from(commands::finish(&ctx, result)))
}
