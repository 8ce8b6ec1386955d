//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ConfigLoader};
use crate::pipeline::ReviewPipeline;
use crate::storage::{Database, SharedDatabase};
use crate::types::{Result, ReviewError};
use crate::upstream::{HttpTransport, SharedTransport, UpstreamClient};

/// Command execution context
///
/// Holds the resolved configuration; databases and pipelines are built on
/// demand since not every command needs them.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Explicit `--config` path, if any
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Load configuration, reading the project layer from `config_path`
    /// when given.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(ReviewError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        Ok(Self {
            config: ConfigLoader::load_with(config_path)?,
            config_path: config_path.map(Path::to_path_buf),
        })
    }

    /// Configured database path
    pub fn database_path(&self) -> &Path {
        &self.config.storage.database_path
    }

    /// Open (creating if needed) and bootstrap the run database
    pub fn open_database(&self) -> Result<SharedDatabase> {
        Database::open_shared(self.database_path())
    }

    /// Open the run database, which must already exist
    pub fn require_database(&self) -> Result<SharedDatabase> {
        if !self.database_path().exists() {
            return Err(ReviewError::NotInitialized);
        }
        let db = Database::open(self.database_path())?;
        Ok(Arc::new(db))
    }

    /// Pipeline over the real HTTP transport
    pub fn pipeline(&self, database: Option<SharedDatabase>) -> Result<ReviewPipeline> {
        let transport: SharedTransport = Arc::new(HttpTransport::new()?);
        let upstream = UpstreamClient::new(transport, &self.config.upstream);

        let pipeline = ReviewPipeline::new(upstream, self.config.upstream.clone());
        Ok(match database {
            Some(db) => pipeline.with_database(db),
            None => pipeline,
        })
    }
}

/// Check if complyflow is initialized in the current directory
pub fn is_initialized() -> bool {
    ConfigLoader::project_config_path().exists()
}
