//! Integration module for the outreach tracker
//!
//! Wires the record stores, the import pipeline and the relocation service
//! together behind one configuration, and routes user-facing outcomes to a
//! notification sink.

use anyhow::Context;
use data_access::*;
use link_import::{ImportPipeline, ModelStats, PlatformDetector, RelocationService};
use outreach_core::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

pub mod application;
pub mod logger;
pub mod notifications;

pub use application::Application;
pub use logger::{LoggerConfig, LoggerInit, UnifiedLogger};
pub use notifications::{
    classify_error, ErrorSeverity, Notification, NotificationCenter, NotificationSink,
    NotificationStatistics, ToastKind,
};

/// Where records are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local mock tables
    #[default]
    Memory,
    /// SQLite file at `database_path`, or an in-memory database without one
    Sqlite,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database path
    pub database_path: Option<PathBuf>,

    pub storage: StorageBackend,

    /// Simulated latency of the memory backend, in milliseconds
    pub mock_latency_ms: Option<u64>,

    /// Persist the default settings on first start
    pub seed_default_settings: bool,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            storage: StorageBackend::Memory,
            mock_latency_ms: None,
            seed_default_settings: true,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load a JSON configuration file; absent keys take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// SQLite settings for a database file
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(path.into()),
            storage: StorageBackend::Sqlite,
            ..Default::default()
        }
    }
}

/// Application context that holds all initialized components
pub struct AppContext {
    /// Present when the SQLite backend is in use
    pub database: Option<Arc<DatabaseManager>>,

    pub models: Arc<dyn ModelRepository>,
    pub blacklist: Arc<dyn BlacklistRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub settings: Arc<dyn SettingsRepository>,

    pub relocation: RelocationService,

    pub notifications: Arc<dyn NotificationSink>,

    /// Application configuration
    pub config: Arc<RwLock<AppConfig>>,
}

impl AppContext {
    /// Create a new application context with all components initialized
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing application context ({:?} storage)", config.storage);

        let context = match config.storage {
            StorageBackend::Sqlite => {
                let database = match &config.database_path {
                    Some(path) => DatabaseManager::new(path).await?,
                    None => DatabaseManager::in_memory().await?,
                };
                let database = Arc::new(database);
                info!("Database initialized");

                let mut context = Self::from_stores(
                    config,
                    Arc::new(database.model_repository()),
                    Arc::new(database.blacklist_repository()),
                    Arc::new(database.account_repository()),
                    Arc::new(database.settings_repository()),
                );
                context.database = Some(database);
                context
            }
            StorageBackend::Memory => {
                let latency = config.mock_latency_ms.map(Duration::from_millis);
                let (models, blacklist) = match latency {
                    Some(latency) => (
                        InMemoryModelRepository::new().with_latency(latency),
                        InMemoryBlacklistRepository::new().with_latency(latency),
                    ),
                    None => (InMemoryModelRepository::new(), InMemoryBlacklistRepository::new()),
                };
                Self::from_stores(
                    config,
                    Arc::new(models),
                    Arc::new(blacklist),
                    Arc::new(InMemoryAccountRepository::new()),
                    Arc::new(InMemorySettingsRepository::new()),
                )
            }
        };

        if context.config.read().await.seed_default_settings {
            let current = context.settings.get().await?;
            context.settings.update(current).await?;
            info!("Settings seeded");
        }

        info!("Application context initialized successfully");
        Ok(context)
    }

    /// Assemble a context around existing stores
    pub fn from_stores(
        config: AppConfig,
        models: Arc<dyn ModelRepository>,
        blacklist: Arc<dyn BlacklistRepository>,
        accounts: Arc<dyn AccountRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        let relocation = RelocationService::new(Arc::clone(&models), Arc::clone(&blacklist));

        Self {
            database: None,
            models,
            blacklist,
            accounts,
            settings,
            relocation,
            notifications: Arc::new(NotificationCenter::new()),
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Replace the default notification center
    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifications = sink;
        self
    }

    /// Pipeline configured from the currently stored platform list
    pub async fn import_pipeline(&self) -> Result<ImportPipeline> {
        let settings = self.settings.get().await?;
        Ok(ImportPipeline::new(
            Arc::clone(&self.models),
            Arc::clone(&self.blacklist),
            PlatformDetector::from_settings(&settings),
        ))
    }

    pub async fn stats(&self) -> Result<ModelStats> {
        let records = self.models.get_all().await?;
        Ok(ModelStats::compute(&records))
    }

    /// Shutdown all components gracefully
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down application context");
        info!("Application context shutdown complete");
        Ok(())
    }
}
