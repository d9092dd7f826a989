pub mod config;
pub mod doctor;

use clap::{Parser, Subcommand};

/// n8n-mcp-gateway — an MCP server fronting an n8n instance.
#[derive(Debug, Parser)]
#[command(name = "n8n-mcp-gateway", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the MCP server (default when no subcommand is given).
    Serve,
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load configuration from the path named by `N8N_MCP_CONFIG` (default
/// `config.toml`), then layer environment-variable overrides on top.
/// A missing file is not an error — it falls back to compiled-in
/// defaults, same as an empty TOML document.
pub fn load_config() -> anyhow::Result<(n8n_mcp_domain::config::Config, String)> {
    let config_path = std::env::var("N8N_MCP_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let raw = if std::path::Path::new(&config_path).exists() {
        std::fs::read_to_string(&config_path).map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?
    } else {
        String::new()
    };

    let mut config = n8n_mcp_domain::config::Config::from_toml_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?;
    config.apply_env_overrides();

    Ok((config, config_path))
}
