//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/complyflow/config.toml)
//! 3. Project config (.complyflow/config.toml)
//! 4. Environment variables (COMPLYFLOW_*, plus the legacy AGENT1_URL family)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::{ConfigLoader, ENV_PREFIX, PROJECT_DIR};
pub use types::*;
