//! Database Layer with Connection Pooling and Safe Transactions
//!
//! SQLite run history featuring:
//! - Connection pooling via r2d2 so concurrent reviews can persist independently
//! - Panic-safe run transactions with automatic rollback
//! - Version-tracked schema bootstrap
//! - WAL mode for concurrent reads while a run is being written

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use super::runs::RunWriter;
use crate::types::{Result, ResultExt, ReviewError};

/// Shared database handle for async contexts.
pub type SharedDatabase = Arc<Database>;

const SCHEMA: &str = include_str!("schema.sql");

/// Current schema version for migration tracking
const SCHEMA_VERSION: u32 = 1;

/// Migration definitions
struct Migration {
    version: u32,
    description: &'static str,
    up: &'static str,
}

// Every migration must be idempotent: fresh databases get schema.sql first
// and then run the whole list.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Index run history by time and dimension",
    up: "CREATE INDEX IF NOT EXISTS idx_feature_runs_run_time ON feature_runs(run_time);
         CREATE INDEX IF NOT EXISTS idx_run_regions_region ON run_regions(region_id);
         CREATE INDEX IF NOT EXISTS idx_run_regulations_regulation ON run_regulations(regulation_id)",
}];

/// Connection pool configuration
///
/// Pool size is dynamically calculated based on CPU cores.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
    /// Minimum idle connections to keep ready
    pub min_idle: u32,
    /// Timeout for acquiring a connection (seconds)
    pub connection_timeout_secs: u64,
}

impl PoolConfig {
    /// Minimum pool size regardless of CPU count
    const MIN_POOL_SIZE: u32 = 2;
    /// Maximum pool size regardless of CPU count
    const MAX_POOL_SIZE: u32 = 16;

    /// Formula: clamp(cores, MIN, MAX). SQLite serializes writers anyway,
    /// so extra connections only help concurrent history reads.
    pub fn optimal_pool_size() -> u32 {
        let cores = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        cores.clamp(Self::MIN_POOL_SIZE, Self::MAX_POOL_SIZE)
    }

    /// Create config with automatic pool sizing based on CPU cores
    pub fn auto() -> Self {
        let max_size = Self::optimal_pool_size();
        Self {
            max_size,
            min_idle: 1,
            connection_timeout_secs: 10,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::auto()
    }
}

/// Thread-safe database with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open database with connection pooling at the specified path.
    ///
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, PoolConfig::default())
    }

    /// Open database with custom pool configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: PoolConfig) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(std::time::Duration::from_secs(
                config.connection_timeout_secs,
            ))
            .build(manager)
            .map_err(|e| {
                ReviewError::Storage(format!("Failed to create connection pool: {}", e))
            })?;

        Ok(Self { pool })
    }

    /// Open an in-memory database for testing or temporary use.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(1).build(manager).map_err(|e| {
            ReviewError::Storage(format!("Failed to create in-memory pool: {}", e))
        })?;

        Ok(Self { pool })
    }

    /// Open, bootstrap and share in one step.
    pub fn open_shared<P: AsRef<Path>>(path: P) -> Result<SharedDatabase> {
        let db = Self::open(path)?;
        db.initialize()?;
        Ok(Arc::new(db))
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            ReviewError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    /// Initialize database schema and apply pending migrations.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize database schema")?;
        drop(conn);

        self.migrate()
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;

        let current_version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        for migration in MIGRATIONS {
            if migration.version > current_version {
                conn.execute_batch(migration.up).with_context_fn(|| {
                    format!(
                        "Failed to apply migration {}: {}",
                        migration.version, migration.description
                    )
                })?;

                tracing::info!(
                    "Applied migration {}: {}",
                    migration.version,
                    migration.description
                );
            }
        }

        if current_version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to update schema version")?;
        }

        Ok(())
    }

    /// Schema version recorded in the database file.
    pub fn schema_version(&self) -> Result<u32> {
        self.conn()?
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .with_context("Failed to read schema version")
    }

    /// Get a raw connection for read queries.
    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.conn()
    }

    /// Execute a function with a [`RunWriter`] inside a panic-safe transaction.
    ///
    /// Commits when the closure returns `Ok`, rolls back on `Err`. If the
    /// closure panics, the transaction is rolled back and an error is returned
    /// instead of poisoning the connection pool.
    pub fn write_run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&RunWriter<'_>) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let writer = RunWriter::begin(&mut conn)?;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&writer)));

        match result {
            Ok(Ok(value)) => {
                writer.commit()?;
                Ok(value)
            }
            Ok(Err(e)) => {
                if let Err(rollback_err) = writer.rollback() {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
            Err(panic_payload) => {
                // Dropping the writer rolls the transaction back
                drop(writer);
                let panic_msg = panic_payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "Unknown panic".to_string());

                tracing::error!("Transaction panicked: {}", panic_msg);
                Err(ReviewError::Storage(format!(
                    "Transaction panicked: {}",
                    panic_msg
                )))
            }
        }
    }
}
