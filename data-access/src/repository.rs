//! Repository implementations for data access

use outreach_core::*;
use tokio_rusqlite::Connection;
use std::sync::Arc;
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use tracing::{debug, warn};

/// Repository trait for the active candidate list
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// All records, newest first
    async fn get_all(&self) -> Result<Vec<CandidateRecord>>;
    async fn get_by_id(&self, id: RecordId) -> Result<Option<CandidateRecord>>;
    async fn create(&self, draft: ModelDraft) -> Result<CandidateRecord>;
    async fn update(&self, id: RecordId, patch: ModelPatch) -> Result<CandidateRecord>;
    async fn delete(&self, id: RecordId) -> Result<()>;
    async fn count(&self) -> Result<usize>;
}

/// Repository trait for blacklist entries
#[async_trait]
pub trait BlacklistRepository: Send + Sync {
    /// All entries, newest first
    async fn get_all(&self) -> Result<Vec<BlacklistEntry>>;
    async fn get_by_id(&self, id: RecordId) -> Result<Option<BlacklistEntry>>;
    async fn create(&self, draft: BlacklistDraft) -> Result<BlacklistEntry>;
    async fn update(&self, id: RecordId, patch: BlacklistPatch) -> Result<BlacklistEntry>;
    async fn delete(&self, id: RecordId) -> Result<()>;
    async fn count(&self) -> Result<usize>;
}

/// Repository trait for outreach accounts
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// All accounts, newest first
    async fn get_all(&self) -> Result<Vec<OutreachAccount>>;
    async fn get_by_id(&self, id: RecordId) -> Result<Option<OutreachAccount>>;
    async fn create(&self, draft: AccountDraft) -> Result<OutreachAccount>;
    async fn update(&self, id: RecordId, draft: AccountDraft) -> Result<OutreachAccount>;
    async fn delete(&self, id: RecordId) -> Result<()>;
    async fn count(&self) -> Result<usize>;
}

/// Repository trait for the global settings record
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Stored settings, or the defaults when nothing was saved yet
    async fn get(&self) -> Result<Settings>;
    async fn update(&self, settings: Settings) -> Result<Settings>;
}

fn to_ts(value: DateTime<Utc>) -> i64 {
    value.timestamp()
}

fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

fn storage_error(context: &'static str) -> impl FnOnce(tokio_rusqlite::Error) -> OutreachError {
    move |e| OutreachError::backend(format!("{}: {}", context, e))
}

const MODEL_COLUMNS: &str =
    "id, link, platform, followed_by, follow_date, dm_sent, dm_sent_date, notes, date_added";

const BLACKLIST_COLUMNS: &str = "id, link, platform, reason, original_date_added, date_added";

const ACCOUNT_COLUMNS: &str = "id, name, platform, username, created_date";

/// Helper function to map a row to CandidateRecord
fn row_to_model(row: &Row) -> rusqlite::Result<CandidateRecord> {
    let follow_date: Option<i64> = row.get(4)?;
    let dm_sent_date: Option<i64> = row.get(6)?;
    let date_added: i64 = row.get(8)?;

    Ok(CandidateRecord {
        id: row.get(0)?,
        link: row.get(1)?,
        platform: row.get(2)?,
        followed_by: row.get(3)?,
        follow_date: follow_date.map(from_ts),
        dm_sent: row.get(5)?,
        dm_sent_date: dm_sent_date.map(from_ts),
        notes: row.get(7)?,
        date_added: from_ts(date_added),
    })
}

/// Helper function to map a row to BlacklistEntry
fn row_to_blacklist(row: &Row) -> rusqlite::Result<BlacklistEntry> {
    let original_date_added: Option<i64> = row.get(4)?;
    let date_added: i64 = row.get(5)?;

    Ok(BlacklistEntry {
        id: row.get(0)?,
        link: row.get(1)?,
        platform: row.get(2)?,
        reason: row.get(3)?,
        original_date_added: original_date_added.map(from_ts),
        date_added: from_ts(date_added),
    })
}

/// Helper function to map a row to OutreachAccount
fn row_to_account(row: &Row) -> rusqlite::Result<OutreachAccount> {
    let created_date: i64 = row.get(4)?;

    Ok(OutreachAccount {
        id: row.get(0)?,
        name: row.get(1)?,
        platform: row.get(2)?,
        username: row.get(3)?,
        created_date: from_ts(created_date),
    })
}

fn select_model(conn: &rusqlite::Connection, id: RecordId) -> rusqlite::Result<Option<CandidateRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM models WHERE id = ?1", MODEL_COLUMNS),
        [id],
        row_to_model,
    )
    .optional()
}

fn select_blacklist(conn: &rusqlite::Connection, id: RecordId) -> rusqlite::Result<Option<BlacklistEntry>> {
    conn.query_row(
        &format!("SELECT {} FROM blacklist WHERE id = ?1", BLACKLIST_COLUMNS),
        [id],
        row_to_blacklist,
    )
    .optional()
}

fn select_account(conn: &rusqlite::Connection, id: RecordId) -> rusqlite::Result<Option<OutreachAccount>> {
    conn.query_row(
        &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS),
        [id],
        row_to_account,
    )
    .optional()
}

fn count_rows(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count as usize)
}

// ============================================================================
// SQLite: models
// ============================================================================

/// SQLite implementation of ModelRepository
pub struct SqliteModelRepository {
    connection: Arc<Connection>,
}

impl SqliteModelRepository {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ModelRepository for SqliteModelRepository {
    async fn get_all(&self) -> Result<Vec<CandidateRecord>> {
        self.connection
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM models ORDER BY date_added DESC, id DESC",
                    MODEL_COLUMNS
                ))?;
                let rows = stmt.query_map([], row_to_model)?;
                let mut models = Vec::new();
                for row in rows {
                    models.push(row?);
                }
                Ok(models)
            })
            .await
            .map_err(storage_error("Failed to get all models"))
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<CandidateRecord>> {
        self.connection
            .call(move |conn| Ok(select_model(conn, id)?))
            .await
            .map_err(storage_error("Failed to get model"))
    }

    async fn create(&self, draft: ModelDraft) -> Result<CandidateRecord> {
        let record = draft.into_record(0, Utc::now());

        let created = self
            .connection
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO models
                    (link, platform, followed_by, follow_date, dm_sent, dm_sent_date, notes, date_added)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    rusqlite::params![
                        record.link,
                        record.platform,
                        record.followed_by,
                        record.follow_date.map(to_ts),
                        record.dm_sent,
                        record.dm_sent_date.map(to_ts),
                        record.notes,
                        to_ts(record.date_added),
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(select_model(conn, id)?)
            })
            .await
            .map_err(storage_error("Failed to create model"))?;

        let created = created.ok_or_else(|| OutreachError::backend("Created model vanished"))?;
        debug!("Created model {} ({})", created.id, created.link);
        Ok(created)
    }

    async fn update(&self, id: RecordId, patch: ModelPatch) -> Result<CandidateRecord> {
        let updated = self
            .connection
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(mut record) = select_model(&tx, id)? else {
                    return Ok(None);
                };
                patch.apply_to(&mut record);
                tx.execute(
                    r#"
                    UPDATE models SET link = ?1, platform = ?2, followed_by = ?3, follow_date = ?4,
                        dm_sent = ?5, dm_sent_date = ?6, notes = ?7
                    WHERE id = ?8
                    "#,
                    rusqlite::params![
                        record.link,
                        record.platform,
                        record.followed_by,
                        record.follow_date.map(to_ts),
                        record.dm_sent,
                        record.dm_sent_date.map(to_ts),
                        record.notes,
                        id,
                    ],
                )?;
                let updated = select_model(&tx, id)?;
                tx.commit()?;
                Ok(updated)
            })
            .await
            .map_err(storage_error("Failed to update model"))?;

        updated.ok_or_else(|| OutreachError::not_found("Model", id))
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let deleted = self
            .connection
            .call(move |conn| Ok(conn.execute("DELETE FROM models WHERE id = ?1", [id])?))
            .await
            .map_err(storage_error("Failed to delete model"))?;

        if deleted == 0 {
            return Err(OutreachError::not_found("Model", id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        self.connection
            .call(|conn| Ok(count_rows(conn, "models")?))
            .await
            .map_err(storage_error("Failed to count models"))
    }
}

// ============================================================================
// SQLite: blacklist
// ============================================================================

/// SQLite implementation of BlacklistRepository
pub struct SqliteBlacklistRepository {
    connection: Arc<Connection>,
}

impl SqliteBlacklistRepository {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl BlacklistRepository for SqliteBlacklistRepository {
    async fn get_all(&self) -> Result<Vec<BlacklistEntry>> {
        self.connection
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM blacklist ORDER BY date_added DESC, id DESC",
                    BLACKLIST_COLUMNS
                ))?;
                let rows = stmt.query_map([], row_to_blacklist)?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await
            .map_err(storage_error("Failed to get blacklist"))
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<BlacklistEntry>> {
        self.connection
            .call(move |conn| Ok(select_blacklist(conn, id)?))
            .await
            .map_err(storage_error("Failed to get blacklist entry"))
    }

    async fn create(&self, draft: BlacklistDraft) -> Result<BlacklistEntry> {
        let entry = draft.into_entry(0, Utc::now());

        let created = self
            .connection
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO blacklist (link, platform, reason, original_date_added, date_added)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    rusqlite::params![
                        entry.link,
                        entry.platform,
                        entry.reason,
                        entry.original_date_added.map(to_ts),
                        to_ts(entry.date_added),
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(select_blacklist(conn, id)?)
            })
            .await
            .map_err(storage_error("Failed to create blacklist entry"))?;

        created.ok_or_else(|| OutreachError::backend("Created blacklist entry vanished"))
    }

    async fn update(&self, id: RecordId, patch: BlacklistPatch) -> Result<BlacklistEntry> {
        let updated = self
            .connection
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(mut entry) = select_blacklist(&tx, id)? else {
                    return Ok(None);
                };
                patch.apply_to(&mut entry);
                tx.execute(
                    "UPDATE blacklist SET link = ?1, platform = ?2, reason = ?3 WHERE id = ?4",
                    rusqlite::params![entry.link, entry.platform, entry.reason, id],
                )?;
                tx.commit()?;
                Ok(Some(entry))
            })
            .await
            .map_err(storage_error("Failed to update blacklist entry"))?;

        updated.ok_or_else(|| OutreachError::not_found("Blacklist entry", id))
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let deleted = self
            .connection
            .call(move |conn| Ok(conn.execute("DELETE FROM blacklist WHERE id = ?1", [id])?))
            .await
            .map_err(storage_error("Failed to delete blacklist entry"))?;

        if deleted == 0 {
            return Err(OutreachError::not_found("Blacklist entry", id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        self.connection
            .call(|conn| Ok(count_rows(conn, "blacklist")?))
            .await
            .map_err(storage_error("Failed to count blacklist"))
    }
}

// ============================================================================
// SQLite: accounts
// ============================================================================

/// SQLite implementation of AccountRepository
pub struct SqliteAccountRepository {
    connection: Arc<Connection>,
}

impl SqliteAccountRepository {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn get_all(&self) -> Result<Vec<OutreachAccount>> {
        self.connection
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM accounts ORDER BY created_date DESC, id DESC",
                    ACCOUNT_COLUMNS
                ))?;
                let rows = stmt.query_map([], row_to_account)?;
                let mut accounts = Vec::new();
                for row in rows {
                    accounts.push(row?);
                }
                Ok(accounts)
            })
            .await
            .map_err(storage_error("Failed to get accounts"))
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<OutreachAccount>> {
        self.connection
            .call(move |conn| Ok(select_account(conn, id)?))
            .await
            .map_err(storage_error("Failed to get account"))
    }

    async fn create(&self, draft: AccountDraft) -> Result<OutreachAccount> {
        let account = draft.into_account(0, Utc::now());

        let created = self
            .connection
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO accounts (name, platform, username, created_date) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![
                        account.name,
                        account.platform,
                        account.username,
                        to_ts(account.created_date),
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(select_account(conn, id)?)
            })
            .await
            .map_err(storage_error("Failed to create account"))?;

        created.ok_or_else(|| OutreachError::backend("Created account vanished"))
    }

    async fn update(&self, id: RecordId, draft: AccountDraft) -> Result<OutreachAccount> {
        let updated = self
            .connection
            .call(move |conn| {
                conn.execute(
                    "UPDATE accounts SET name = ?1, platform = ?2, username = ?3 WHERE id = ?4",
                    rusqlite::params![draft.name, draft.platform, draft.username, id],
                )?;
                Ok(select_account(conn, id)?)
            })
            .await
            .map_err(storage_error("Failed to update account"))?;

        updated.ok_or_else(|| OutreachError::not_found("Account", id))
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let deleted = self
            .connection
            .call(move |conn| Ok(conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?))
            .await
            .map_err(storage_error("Failed to delete account"))?;

        if deleted == 0 {
            return Err(OutreachError::not_found("Account", id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        self.connection
            .call(|conn| Ok(count_rows(conn, "accounts")?))
            .await
            .map_err(storage_error("Failed to count accounts"))
    }
}

// ============================================================================
// SQLite: settings
// ============================================================================

/// SQLite implementation of SettingsRepository
pub struct SqliteSettingsRepository {
    connection: Arc<Connection>,
}

impl SqliteSettingsRepository {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn get(&self) -> Result<Settings> {
        let stored: Option<String> = self
            .connection
            .call(|conn| {
                Ok(conn
                    .query_row("SELECT data FROM settings WHERE id = 1", [], |row| row.get(0))
                    .optional()?)
            })
            .await
            .map_err(storage_error("Failed to get settings"))?;

        match stored {
            Some(json) => match serde_json::from_str(&json) {
                Ok(settings) => Ok(settings),
                Err(e) => {
                    warn!("Stored settings are unreadable, using defaults: {}", e);
                    Ok(Settings::default())
                }
            },
            None => Ok(Settings::default()),
        }
    }

    async fn update(&self, settings: Settings) -> Result<Settings> {
        let json = serde_json::to_string(&settings)?;

        self.connection
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO settings (id, data) VALUES (1, ?1) \
                     ON CONFLICT(id) DO UPDATE SET data = excluded.data",
                    [json],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_error("Failed to save settings"))?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatabaseManager;

    #[tokio::test]
    async fn test_model_crud() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let repo = db.model_repository();

        let created = repo
            .create(ModelDraft::new("https://instagram.com/a", "Instagram").with_notes("first"))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.notes, "first");

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let now = Utc::now();
        let updated = repo
            .update(created.id, ModelPatch::assign_follower(Some("scout".into()), now))
            .await
            .unwrap();
        assert_eq!(updated.followed_by.as_deref(), Some("scout"));
        assert_eq!(updated.follow_date.map(|d| d.timestamp()), Some(now.timestamp()));
        assert_eq!(updated.date_added, created.date_added);

        repo.delete(created.id).await.unwrap();
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_model_is_not_found() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let repo = db.model_repository();

        let err = repo.update(99, ModelPatch::default()).await.unwrap_err();
        assert!(matches!(
            err,
            OutreachError::Storage { source: StorageError::RecordNotFound { id: 99, .. } }
        ));
        assert!(repo.delete(99).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_links_are_not_rejected_by_storage() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let repo = db.model_repository();

        repo.create(ModelDraft::new("https://a.com/x", "Other")).await.unwrap();
        repo.create(ModelDraft::new("https://a.com/x", "Other")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_all_newest_first() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let repo = db.model_repository();

        let first = repo.create(ModelDraft::new("https://a.com/1", "Other")).await.unwrap();
        let second = repo.create(ModelDraft::new("https://a.com/2", "Other")).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.iter().map(|m| m.id).collect::<Vec<_>>(), vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_blacklist_preserves_original_date() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let models = db.model_repository();
        let blacklist = db.blacklist_repository();

        let model = models.create(ModelDraft::new("https://a.com/x", "Other")).await.unwrap();
        let entry = blacklist
            .create(BlacklistDraft::from_record(&model, "spam"))
            .await
            .unwrap();

        assert_eq!(entry.original_date_added, Some(model.date_added));
        assert_eq!(entry.reason, "spam");

        let patched = blacklist
            .update(entry.id, BlacklistPatch { reason: Some("fake".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(patched.reason, "fake");
    }

    #[tokio::test]
    async fn test_account_crud() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let repo = db.account_repository();

        let account = repo
            .create(AccountDraft {
                name: "Main".into(),
                platform: "Instagram".into(),
                username: "scout_main".into(),
            })
            .await
            .unwrap();

        let renamed = repo
            .update(
                account.id,
                AccountDraft {
                    name: "Primary".into(),
                    platform: "Instagram".into(),
                    username: "scout_main".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Primary");
        assert_eq!(renamed.created_date, account.created_date);

        repo.delete(account.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_settings_default_then_saved() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let repo = db.settings_repository();

        let settings = repo.get().await.unwrap();
        assert_eq!(settings, Settings::default());

        let mut changed = settings.clone();
        changed.display_name = "Scout".into();
        changed.platforms.truncate(1);
        repo.update(changed.clone()).await.unwrap();

        assert_eq!(repo.get().await.unwrap(), changed);
    }
}
