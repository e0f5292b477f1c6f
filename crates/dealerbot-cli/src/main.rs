//! Dealerbot CLI — entry point.
//!
//! # Commands
//!
//! - `dealerbot chat [-m MESSAGE] [-s SESSION]` — talk to the sales agent (single-shot or REPL)
//! - `dealerbot search QUERY` — run an inventory search directly
//! - `dealerbot onboard` — write default config and inventory file
//! - `dealerbot status` — show configuration, inventory, and provider status

mod helpers;
mod onboard;
mod repl;
mod status;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use dealerbot_agent::{ChatService, InventoryStore};
use dealerbot_core::config::{load_config, Config};
use dealerbot_core::utils::expand_home;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🚗 Dealerbot — a car-sales assistant that searches your inventory and consults its colleagues
#[derive(Parser)]
#[command(name = "dealerbot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the sales agent (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Session identifier
        #[arg(short, long, default_value = "cli:default")]
        session: String,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Search the vehicle inventory without involving the agent
    Search {
        /// Text matched case-insensitively against every column
        query: String,
    },

    /// Write default configuration and an empty inventory file
    Onboard,

    /// Show configuration, inventory, and provider status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            session,
            logs,
        } => {
            init_logging(logs);
            run_chat(message, session).await
        }
        Commands::Search { query } => {
            init_logging(false);
            run_search(&query)
        }
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, session_id: String) -> Result<()> {
    let config = load_config(None);
    let service = build_chat_service(&config)?;

    if let Some(warning) = service.inventory_warning() {
        helpers::print_warning(&warning);
    }

    match message {
        Some(msg) => {
            // Single-shot mode
            info!(session = %session_id, "processing single message");
            service.open_session(&session_id);
            let cancel = CancellationToken::new();
            let reply = repl::run_turn(&service, &session_id, &msg, &cancel).await;
            helpers::print_reply(service.agent().context().agent_name(), &reply);
        }
        None => {
            // Interactive REPL mode
            repl::run(&service, &session_id).await?;
        }
    }

    Ok(())
}

/// Build the chat service from the loaded configuration.
pub fn build_chat_service(config: &Config) -> Result<ChatService> {
    ChatService::from_config(config)
        .context("could not set up the agent; run `dealerbot status` to check API keys")
}

// ─────────────────────────────────────────────
// Search command
// ─────────────────────────────────────────────

fn run_search(query: &str) -> Result<()> {
    let config = load_config(None);
    let store = InventoryStore::new(expand_home(&config.inventory.path));

    if let Ok(table) = store.load() {
        if let Some(warning) = table.warning() {
            helpers::print_warning(&warning);
        }
    }
    println!("{}", store.search(query));
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("dealerbot=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
