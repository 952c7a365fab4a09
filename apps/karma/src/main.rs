//! # Karma - chat-driven reputation ledger
//!
//! The main binary for the karma bot.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for feeding chat lines and querying the ledger
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/karma (THE BINARY)                  │
//! │                                                          │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐   │
//! │  │    CLI      │    │  HTTP API   │    │   config    │   │
//! │  │   (clap)    │    │   (axum)    │    │   (toml)    │   │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬──────┘   │
//! │         └──────────────────┼──────────────────┘          │
//! │                            ▼                             │
//! │                   ┌─────────────────┐                    │
//! │                   │    chat::Bot    │                    │
//! │                   └────────┬────────┘                    │
//! │                            ▼                             │
//! │                   ┌─────────────────┐                    │
//! │                   │   karma-core    │                    │
//! │                   │   (THE LOGIC)   │                    │
//! │                   └─────────────────┘                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! karma server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! karma say --from dave "thanks alice++"
//! karma replay -f channel.log
//! karma top
//! karma user alice
//! ```

use clap::Parser;
use karma::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // KARMA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("KARMA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "karma=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗  ██╗ █████╗ ██████╗ ███╗   ███╗ █████╗
  ██║ ██╔╝██╔══██╗██╔══██╗████╗ ████║██╔══██╗
  █████╔╝ ███████║██████╔╝██╔████╔██║███████║
  ██╔═██╗ ██╔══██║██╔══██╗██║╚██╔╝██║██╔══██║
  ██║  ██╗██║  ██║██║  ██║██║ ╚═╝ ██║██║  ██║
  ╚═╝  ╚═╝╚═╝  ╚═╝╚═╝  ╚═╝╚═╝     ╚═╝╚═╝  ╚═╝

  Karma v{}

  name++ • name-- • (some name)++
"#,
        env!("CARGO_PKG_VERSION")
    );
}
