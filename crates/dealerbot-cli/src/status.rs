//! `dealerbot status` — show configuration, inventory, and provider status.

use anyhow::Result;
use colored::Colorize;

use dealerbot_agent::InventoryStore;
use dealerbot_core::config::{get_config_path, load_config, provider_env_key, Config};
use dealerbot_core::utils::expand_home;
use dealerbot_providers::registry::{match_provider, PROVIDERS};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🚗 Dealerbot Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    println!("  {:<18} {}", "Inventory:".bold(), inventory_status(&config));

    println!(
        "  {:<18} {} | max iterations: {} | history: {} messages",
        "Agent:".bold(),
        config.agent.name,
        config.agent.max_iterations,
        config.agent.history_window,
    );

    // Personas
    println!();
    println!("  {}", "Personas:".bold());
    for (role, persona) in config.personas.iter() {
        let status = if match_provider(persona, &config.providers).is_some() {
            "✓".green().to_string()
        } else {
            "✗ no usable provider".red().to_string()
        };
        println!(
            "    {:<10} {:<28} {}",
            role,
            format!("{}/{} (temp {})", persona.provider, persona.model, persona.temperature).dimmed(),
            status
        );
    }

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let configured = config
            .providers
            .get_by_name(spec.name)
            .is_some_and(|p| p.is_configured());
        let status = if configured {
            format!("{} (key set)", "✓".green())
        } else if spec.is_local {
            format!("{}", "· local, no key needed".dimmed())
        } else {
            let hint = provider_env_key(spec.name)
                .map(|var| format!("· not configured (set {var})"))
                .unwrap_or_else(|| "· not configured".to_string());
            format!("{}", hint.dimmed())
        };
        println!("    {:<20} {}", spec.display_name, status);
    }

    println!();

    Ok(())
}

fn inventory_status(config: &Config) -> String {
    let path = expand_home(&config.inventory.path);
    let store = InventoryStore::new(&path);
    match store.load() {
        Ok(table) if table.warning().is_some() => {
            format!("{} {}", path.display(), "(not found)".red())
        }
        Ok(table) => format!(
            "{} {} {}",
            path.display(),
            "✓".green(),
            format!("({} vehicles)", table.len()).dimmed()
        ),
        Err(e) => format!("{} {}", path.display(), format!("✗ {e}").red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_status_counts_rows() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        std::fs::write(
            &path,
            "id,make,model,year,price,color\n1,Toyota,Camry,2022,25000,black\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.inventory.path = path.to_string_lossy().into_owned();
        assert!(inventory_status(&config).ends_with("(1 vehicles)"));

        config.inventory.path = dir.path().join("absent.csv").to_string_lossy().into_owned();
        assert!(inventory_status(&config).ends_with("(not found)"));
    }
}
