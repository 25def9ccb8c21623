//! Bashpilot CLI: the main entry point.
//!
//! Commands:
//! - `chat`     Interactive chat, optionally resuming a conversation
//! - `ask`      Send a single message
//! - `history`  List or show saved conversations
//! - `usage`    Estimate the cost of a token count
//! - `config`   Show, locate or validate the configuration
//! - `onboard`  Initialize config & directories

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "bashpilot",
    about = "Bashpilot: a terminal assistant that runs shell commands for you",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Describe commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Resume a saved conversation
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Send a single message and print the answer
    Ask {
        message: String,

        /// Continue a saved conversation
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Saved conversations
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Token cost tools
    Usage {
        #[command(subcommand)]
        command: UsageCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Initialize configuration and directories
    Onboard,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List conversations, newest first
    List,
    /// Print one conversation
    Show { id: String },
}

#[derive(Subcommand)]
enum UsageCommands {
    /// Price a token count at the configured (or a model's) rates
    Estimate {
        #[arg(long)]
        input_tokens: u64,
        #[arg(long)]
        output_tokens: u64,
        /// Use the built-in rates of this model
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Check the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { conversation } => commands::agent::chat(conversation, cli.dry_run).await?,
        Commands::Ask {
            message,
            conversation,
        } => commands::agent::ask(message, conversation, cli.dry_run).await?,
        Commands::History { command } => match command {
            HistoryCommands::List => commands::history::list()?,
            HistoryCommands::Show { id } => commands::history::show(&id)?,
        },
        Commands::Usage { command } => match command {
            UsageCommands::Estimate {
                input_tokens,
                output_tokens,
                model,
            } => commands::usage::estimate(input_tokens, output_tokens, model.as_deref())?,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_cmd::show()?,
            ConfigCommands::Path => commands::config_cmd::path()?,
            ConfigCommands::Validate => commands::config_cmd::validate()?,
        },
        Commands::Onboard => commands::onboard::run()?,
    }

    Ok(())
}
