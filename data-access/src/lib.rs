//! Data Access Layer for the outreach tracker
//!
//! Record stores for the active list, the blacklist, outreach accounts and
//! global settings. Two backends share the repository traits: SQLite through
//! `tokio-rusqlite`, and an in-memory mock store.

pub mod schema;
pub mod repository;
pub mod memory;

pub use repository::*;
pub use memory::*;

use outreach_core::*;
use std::path::Path;
use tokio_rusqlite::Connection;
use std::sync::Arc;
use tracing::info;

/// Database manager for handling SQLite connections
pub struct DatabaseManager {
    connection: Arc<Connection>,
}

impl DatabaseManager {
    /// Create a new database manager with the specified path
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();

        let connection = Connection::open(&path)
            .await
            .map_err(|e| SystemError::Configuration {
                details: format!("Failed to open database: {}", e),
            })?;

        let manager = Self {
            connection: Arc::new(connection),
        };

        manager.initialize_schema().await?;
        info!("Opened database at {:?}", path);

        Ok(manager)
    }

    /// Create an in-memory database (for testing)
    pub async fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()
            .await
            .map_err(|e| SystemError::Configuration {
                details: format!("Failed to create in-memory database: {}", e),
            })?;

        let manager = Self {
            connection: Arc::new(connection),
        };

        manager.initialize_schema().await?;

        Ok(manager)
    }

    /// Initialize database schema and record the applied version
    async fn initialize_schema(&self) -> Result<()> {
        let migration = schema::get_migration(schema::SCHEMA_VERSION).ok_or_else(|| {
            SystemError::Configuration {
                details: format!("No migration for schema version {}", schema::SCHEMA_VERSION),
            }
        })?;
        let applied_at = Utc::now().timestamp();

        self.connection
            .call(move |conn| {
                conn.execute_batch(migration.sql)?;
                conn.execute(
                    "INSERT OR IGNORE INTO schema_migrations (version, applied_at, description) \
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![migration.version, applied_at, migration.description],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| SystemError::Configuration {
                details: format!("Failed to initialize schema: {}", e),
            })?;

        Ok(())
    }

    /// Get the connection for repository operations
    pub fn connection(&self) -> Arc<Connection> {
        Arc::clone(&self.connection)
    }

    pub fn model_repository(&self) -> SqliteModelRepository {
        SqliteModelRepository::new(self.connection())
    }

    pub fn blacklist_repository(&self) -> SqliteBlacklistRepository {
        SqliteBlacklistRepository::new(self.connection())
    }

    pub fn account_repository(&self) -> SqliteAccountRepository {
        SqliteAccountRepository::new(self.connection())
    }

    pub fn settings_repository(&self) -> SqliteSettingsRepository {
        SqliteSettingsRepository::new(self.connection())
    }
}
