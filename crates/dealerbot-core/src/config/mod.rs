//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use dealerbot_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Sales model: {}", cfg.personas.sales.model);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_config_path, load_config, provider_env_key, save_config};
pub use schema::{AgentSettings, Config, InventoryConfig, PersonaConfig, ProviderConfig};
