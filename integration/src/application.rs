//! Main application module
//!
//! Provides the high-level Application API. Every user-facing operation
//! reports its outcome to the notification sink; the returned `Result` is
//! the source of truth.

use crate::{AppConfig, AppContext, LoggerConfig, Notification, UnifiedLogger};
use data_access::{AccountRepository, BlacklistRepository, ModelRepository, SettingsRepository};
use link_import::*;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Output format for list exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Main application
pub struct Application {
    /// Application context
    context: Arc<AppContext>,
}

impl Application {
    /// Create and initialize a new application
    pub async fn new(config: AppConfig) -> Result<Self> {
        // Initialize logging
        UnifiedLogger::init(LoggerConfig::with_level(config.log_level.clone())).map_err(|e| {
            SystemError::Configuration {
                details: e.to_string(),
            }
        })?;

        info!("Starting outreach tracker");

        let context = AppContext::new(config).await?;
        Ok(Self::from_context(context))
    }

    /// Wrap an already assembled context
    pub fn from_context(context: AppContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Shutdown the application
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down application");
        self.context.shutdown().await?;
        info!("Application shutdown complete");
        Ok(())
    }

    /// Get application context
    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    async fn report<T>(
        &self,
        context: &str,
        result: Result<T>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T> {
        let notification = match &result {
            Ok(value) => Notification::success(success(value), context),
            Err(e) => Notification::failure(e, context),
        };
        self.context.notifications.notify(notification).await;
        result
    }

    // ------------------------------------------------------------------
    // Active list
    // ------------------------------------------------------------------

    pub async fn list_models(&self, filter: &ModelFilter) -> Result<Vec<CandidateRecord>> {
        let records = self.context.models.get_all().await?;
        Ok(filter.apply(&records).into_iter().cloned().collect())
    }

    pub async fn filter_facets(&self) -> Result<FilterFacets> {
        let records = self.context.models.get_all().await?;
        Ok(FilterFacets::collect(&records))
    }

    pub async fn add_model(&self, draft: ModelDraft) -> Result<CandidateRecord> {
        let pipeline = self.context.import_pipeline().await?;
        let result = pipeline.add_single(draft).await;
        self.report("add_model", result, |_| "Model added successfully".to_string())
            .await
    }

    pub async fn update_model(&self, id: RecordId, draft: ModelDraft) -> Result<CandidateRecord> {
        let pipeline = self.context.import_pipeline().await?;
        let result = pipeline.update_single(id, draft).await;
        self.report("update_model", result, |_| "Model updated successfully".to_string())
            .await
    }

    pub async fn delete_model(&self, id: RecordId) -> Result<()> {
        let result = self.context.models.delete(id).await;
        self.report("delete_model", result, |_| "Model deleted successfully".to_string())
            .await
    }

    /// Set or clear the following account; the follow date moves with it
    pub async fn assign_follower(
        &self,
        id: RecordId,
        account: Option<String>,
    ) -> Result<CandidateRecord> {
        let patch = ModelPatch::assign_follower(account, Utc::now());
        let result = self.context.models.update(id, patch).await;
        self.report("assign_follower", result, |record| match &record.followed_by {
            Some(account) => format!("Marked as followed by {}", account),
            None => "Follow cleared".to_string(),
        })
        .await
    }

    pub async fn set_dm_sent(&self, id: RecordId, sent: bool) -> Result<CandidateRecord> {
        let patch = ModelPatch::set_dm_sent(sent, Utc::now());
        let result = self.context.models.update(id, patch).await;
        self.report("set_dm_sent", result, |record| {
            if record.dm_sent { "DM marked as sent" } else { "DM status cleared" }.to_string()
        })
        .await
    }

    // ------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------

    pub async fn classify_bulk(&self, text: &str) -> Result<ImportBatch> {
        let pipeline = self.context.import_pipeline().await?;
        let result = pipeline.classify_bulk(text).await;
        self.report("bulk_import", result, ImportBatch::summary_message).await
    }

    /// Read a CSV file and suggest a column mapping for it
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<(CsvDocument, ColumnMapping)> {
        let document = CsvDocument::from_path(path)?;
        let mapping = ColumnMapping::suggest(&document.headers);
        Ok((document, mapping))
    }

    pub async fn classify_csv(
        &self,
        document: &CsvDocument,
        mapping: &ColumnMapping,
    ) -> Result<ImportBatch> {
        let pipeline = self.context.import_pipeline().await?;
        let result = pipeline.classify_csv(document, mapping).await;
        self.report("csv_import", result, ImportBatch::summary_message).await
    }

    pub async fn commit_import(&self, batch: &ImportBatch) -> Result<ImportReport> {
        let pipeline = self.context.import_pipeline().await?;
        let result = pipeline.commit(batch).await;
        self.report("commit_import", result, ImportReport::message).await
    }

    // ------------------------------------------------------------------
    // Blacklist
    // ------------------------------------------------------------------

    pub async fn list_blacklist(&self, search: &str) -> Result<Vec<BlacklistEntry>> {
        let entries = self.context.blacklist.get_all().await?;
        Ok(search_blacklist(&entries, search).into_iter().cloned().collect())
    }

    pub async fn move_to_blacklist(
        &self,
        id: RecordId,
        reason: Option<String>,
    ) -> Result<BlacklistEntry> {
        let result = self.context.relocation.move_to_blacklist(id, reason).await;
        self.report("move_to_blacklist", result, |_| "Model moved to blacklist".to_string())
            .await
    }

    pub async fn restore_to_models(&self, id: RecordId) -> Result<CandidateRecord> {
        let result = self.context.relocation.restore_to_models(id).await;
        self.report("restore_to_models", result, |_| "Moved back to models list".to_string())
            .await
    }

    pub async fn remove_from_blacklist(&self, id: RecordId) -> Result<()> {
        let result = self.context.relocation.remove_from_blacklist(id).await;
        self.report("remove_from_blacklist", result, |_| "Removed from blacklist".to_string())
            .await
    }

    // ------------------------------------------------------------------
    // Accounts and settings
    // ------------------------------------------------------------------

    pub async fn list_accounts(&self) -> Result<Vec<OutreachAccount>> {
        self.context.accounts.get_all().await
    }

    pub async fn add_account(&self, draft: AccountDraft) -> Result<OutreachAccount> {
        let result = self.context.accounts.create(draft).await;
        self.report("add_account", result, |a| format!("Account {} added", a.username))
            .await
    }

    pub async fn update_account(
        &self,
        id: RecordId,
        draft: AccountDraft,
    ) -> Result<OutreachAccount> {
        let result = self.context.accounts.update(id, draft).await;
        self.report("update_account", result, |_| "Account updated successfully".to_string())
            .await
    }

    pub async fn delete_account(&self, id: RecordId) -> Result<()> {
        let result = self.context.accounts.delete(id).await;
        self.report("delete_account", result, |_| "Account deleted".to_string())
            .await
    }

    pub async fn settings(&self) -> Result<Settings> {
        self.context.settings.get().await
    }

    pub async fn update_settings(&self, settings: Settings) -> Result<Settings> {
        let result = self.context.settings.update(settings).await;
        self.report("update_settings", result, |_| "Settings saved successfully".to_string())
            .await
    }

    /// Add a platform; its id becomes one past the largest in use
    pub async fn add_platform(&self, platform: PlatformConfig) -> Result<PlatformConfig> {
        let result = self
            .edit_settings(|settings| Ok(settings.add_platform(platform)))
            .await;
        self.report("add_platform", result, |_| "Platform added successfully!".to_string())
            .await
    }

    pub async fn update_platform(&self, platform: PlatformConfig) -> Result<PlatformConfig> {
        let result = self
            .edit_settings(|settings| {
                let id = platform.id;
                if settings.replace_platform(platform.clone()) {
                    Ok(platform)
                } else {
                    Err(OutreachError::not_found("Platform", id))
                }
            })
            .await;
        self.report("update_platform", result, |_| "Platform updated successfully!".to_string())
            .await
    }

    /// Remove a platform by id; an unknown id leaves the list as it was
    pub async fn delete_platform(&self, id: RecordId) -> Result<()> {
        let result = self
            .edit_settings(|settings| {
                settings.remove_platform(id);
                Ok(())
            })
            .await;
        self.report("delete_platform", result, |_| "Platform deleted successfully!".to_string())
            .await
    }

    /// Read, change and write back the stored settings
    async fn edit_settings<T>(
        &self,
        edit: impl FnOnce(&mut Settings) -> Result<T>,
    ) -> Result<T> {
        let mut settings = self.context.settings.get().await?;
        let value = edit(&mut settings)?;
        self.context.settings.update(settings).await?;
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    /// Get application statistics
    pub async fn stats(&self) -> Result<ModelStats> {
        self.context.stats().await
    }

    /// Export the active list, filtered, in the requested format
    pub async fn export_models(
        &self,
        filter: &ModelFilter,
        format: ExportFormat,
    ) -> Result<String> {
        let records = self.list_models(filter).await?;
        match format {
            ExportFormat::Csv => export_models_csv(&records),
            ExportFormat::Json => export_json(&records, Utc::now()),
        }
    }

    pub async fn export_blacklist(&self) -> Result<String> {
        let entries = self.context.blacklist.get_all().await?;
        export_json(&entries, Utc::now())
    }
}
