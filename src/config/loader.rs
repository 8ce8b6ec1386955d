//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/complyflow/config.toml)
//! 3. Project config (.complyflow/config.toml, or the `--config` path)
//! 4. Environment variables (COMPLYFLOW_* prefix, `__` between levels)
//! 5. Legacy deployment variables (AGENT1_URL, AGENT2_URL, PORT, CORS_ORIGINS)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, ReviewError};

/// Project data directory
pub const PROJECT_DIR: &str = ".complyflow";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "COMPLYFLOW_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using the default
    /// project config path.
    pub fn load() -> Result<Config> {
        Self::load_with(None)
    }

    /// Load configuration, reading the project layer from `project_path`
    /// when given.
    pub fn load_with(project_path: Option<&Path>) -> Result<Config> {
        let mut config: Config = Self::figment(project_path)
            .extract()
            .map_err(|e| ReviewError::Config(format!("Configuration error: {}", e)))?;

        Self::apply_legacy_env(&mut config)?;

        config.validate()?;
        Ok(config)
    }

    /// Build the merged provider chain: defaults → global → project → env.
    pub fn figment(project_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = project_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::project_config_path);
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. COMPLYFLOW_UPSTREAM__LAW_FINDER__URL -> upstream.law_finder.url
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Variables the original deployment was configured with.
    fn apply_legacy_env(config: &mut Config) -> Result<()> {
        if let Ok(url) = env::var("AGENT1_URL") {
            config.upstream.law_finder.url = url;
        }
        if let Ok(url) = env::var("AGENT2_URL") {
            config.upstream.risk_evaluator.url = url;
        }
        if let Ok(port) = env::var("PORT") {
            config.server.port = port
                .trim()
                .parse()
                .map_err(|e| ReviewError::Config(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/complyflow/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
            .map(|p| p.join("complyflow"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(PROJECT_DIR)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render a configuration as toml, json or yaml
    pub fn render(config: &Config, format: &str) -> Result<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(config)?),
            "yaml" => Ok(serde_yaml::to_string(config)?),
            _ => toml::to_string_pretty(config).map_err(|e| ReviewError::Config(e.to_string())),
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        fs::create_dir_all(&project_dir)?;

        let config_path = Self::project_config_path();
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        } else {
            info!("Project config exists: {}", config_path.display());
        }

        Ok(project_dir)
    }

    /// Generate default project config content (TOML)
    fn default_project_config() -> String {
        r#"# complyflow Project Configuration
# Environment variables (COMPLYFLOW_SERVER__PORT, AGENT1_URL, ...) override these.

version = "1.0"

[server]
host = "0.0.0.0"
port = 5050
cors_origins = ["http://localhost:5173", "http://127.0.0.1:5173"]

[upstream]
min_year = 2023
use_gemini = false

# Agent 1
[upstream.law_finder]
url = "http://localhost:8000/v1/run"
timeout_secs = 20
probe_timeout_secs = 15

# Agent 2
[upstream.risk_evaluator]
url = "http://localhost:18002/agent3/assess-demo"
timeout_secs = 25
probe_timeout_secs = 20

[storage]
database_path = ".complyflow/runs.db"
"#
        .to_string()
    }
}
