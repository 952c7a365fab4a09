//! # Karma CLI Module
//!
//! This module implements the CLI interface for the karma bot.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new ledger
//! - `status` - Show ledger counts
//! - `say` - Feed one chat line through the bot
//! - `replay` - Feed a chat log through the bot
//! - `top` / `bottom` - Leaderboards
//! - `giver` / `taker` - Most prolific giver and taker
//! - `user` - One user's total
//! - `history` - Most recent transfers
//! - `export` / `import` - Canonical snapshots

mod commands;

use crate::config::{Backend, KarmaConfig};
use clap::{Parser, Subcommand};
use karma_core::{Direction, KarmaError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Karma - chat-driven reputation ledger
///
/// Reads `name++` and `name--` from chat lines and keeps score.
#[derive(Parser, Debug)]
#[command(name = "karma")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the ledger database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty ledger
    Init {
        /// Force initialization even if the ledger exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show ledger status
    Status,

    /// Feed one chat line through the bot and print its replies
    Say {
        /// Author of the line
        #[arg(short, long)]
        from: String,

        /// Treat the line as addressed to the bot
        #[arg(long)]
        directed: bool,

        /// Treat the line as a private message
        #[arg(long)]
        private: bool,

        /// The chat line
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Feed a chat log (`user: text` per line) through the bot
    Replay {
        /// Path to the log file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the highest receivers
    Top {
        /// Number of entries (defaults to the configured limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show the lowest receivers
    Bottom {
        /// Number of entries (defaults to the configured limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show who has given the most positive karma
    Giver,

    /// Show who has given the most negative karma
    Taker,

    /// Show one user's karma
    User {
        /// User name (case-insensitive)
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Show the most recent transfers
    History {
        /// Number of transfers
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Export the ledger
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (canonical, json)
        #[arg(short = 't', long, default_value = "canonical")]
        format: String,
    },

    /// Import a canonical snapshot into the ledger
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Append to a ledger that already has transfers
        #[arg(long)]
        append: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), KarmaError> {
    let config = KarmaConfig::load(cli.config.as_deref())?
        .with_overrides(cli.database.clone(), cli.backend);
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::info!(
            database = %config.storage.database.display(),
            backend = %config.storage.backend,
            "Using ledger"
        );
    }

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&config, host, port).await,
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Say {
            from,
            directed,
            private,
            text,
        }) => cmd_say(&config, json_mode, &from, &text.join(" "), directed, private),
        Some(Commands::Replay { file }) => cmd_replay(&config, json_mode, &file),
        Some(Commands::Top { limit }) => {
            cmd_leaderboard(&config, json_mode, Direction::Top, limit)
        }
        Some(Commands::Bottom { limit }) => {
            cmd_leaderboard(&config, json_mode, Direction::Bottom, limit)
        }
        Some(Commands::Giver) => cmd_giver(&config, json_mode),
        Some(Commands::Taker) => cmd_taker(&config, json_mode),
        Some(Commands::User { name }) => cmd_user(&config, json_mode, &name.join(" ")),
        Some(Commands::History { limit }) => cmd_history(&config, json_mode, limit),
        Some(Commands::Export { output, format }) => cmd_export(&config, &output, &format),
        Some(Commands::Import { input, append }) => cmd_import(&config, &input, append),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
