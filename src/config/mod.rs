//! Configuration management for PolyHedge
//!
//! Loads from YAML files + environment variables via .env

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::strategy::StrategyConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub persistence: PersistenceConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Probability at or above which profit-taking triggers
    pub take_profit_probability: f64,
    /// Probability at or below which a full exit triggers
    pub stop_loss_probability: f64,
    /// Fraction of the YES position sold when hedging (0, 1]
    pub hedge_sell_percent: f64,
    /// Default entry size in USD when the caller does not supply one
    pub default_entry_usd: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Data directory
    pub data_dir: String,
    /// Position snapshot filename inside the data directory
    pub position_file: String,
    /// Enable the CSV trade journal
    pub journal_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// When false the host must not wire a live execution client; the
    /// agent runs in simulation mode and never submits real orders.
    pub enabled: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Agent defaults
            .set_default("agent.take_profit_probability", 0.85)?
            .set_default("agent.stop_loss_probability", 0.20)?
            .set_default("agent.hedge_sell_percent", 0.50)?
            .set_default("agent.default_entry_usd", 1000.0)?
            // Persistence defaults
            .set_default("persistence.data_dir", "./data")?
            .set_default("persistence.position_file", "position.json")?
            .set_default("persistence.journal_enabled", true)?
            // Execution defaults: decisions only, no real orders
            .set_default("execution.enabled", false)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (POLYHEDGE_*)
            .add_source(Environment::with_prefix("POLYHEDGE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Threshold configuration for the strategy engine
    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            take_profit_threshold: self.agent.take_profit_probability,
            stop_loss_threshold: self.agent.stop_loss_probability,
            hedge_sell_percent: self.agent.hedge_sell_percent,
        }
    }

    /// Full path of the position snapshot file
    pub fn position_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.persistence.data_dir).join(&self.persistence.position_file)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "tp={:.2} sl={:.2} hedge_pct={:.2} data_dir={} execution={}",
            self.agent.take_profit_probability,
            self.agent.stop_loss_probability,
            self.agent.hedge_sell_percent,
            self.persistence.data_dir,
            self.execution.enabled
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
