//! `dealerbot onboard` — initialize configuration and the inventory file.
//!
//! - Creates `~/.dealerbot/config.json` with defaults
//! - Creates the inventory CSV with its header row
//! - Creates the REPL history directory

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use dealerbot_agent::inventory::REQUIRED_COLUMNS;
use dealerbot_core::config::{get_config_path, load_config, save_config};
use dealerbot_core::utils::{expand_home, get_history_path};

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "🚗 Dealerbot — Setup".cyan().bold());
    println!();

    // 1. Config
    let config_path = get_config_path();
    let config = load_config(None);
    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        save_config(&config, Some(&config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    // 2. Inventory
    let inventory_path = expand_home(&config.inventory.path);
    if create_inventory(&inventory_path)? {
        println!(
            "  {} created inventory at {} (add your vehicles there)",
            "✓".green(),
            inventory_path.display()
        );
    } else {
        println!(
            "  {} inventory already exists at {}",
            "✓".green(),
            inventory_path.display()
        );
    }

    // 3. History
    std::fs::create_dir_all(get_history_path())?;

    println!();
    println!(
        "{}",
        "  Setup complete! Add API keys to the config (or a .env file), then run `dealerbot chat`."
            .green()
    );
    println!();

    Ok(())
}

/// Write an inventory file containing only the header row.
///
/// Returns `false` without touching anything if the file already exists.
fn create_inventory(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, format!("{}\n", REQUIRED_COLUMNS.join(",")))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
