//! In-memory record stores
//!
//! Stand-ins for the hosted record tables, used for demos and tests. Ids come
//! from a counter that never reuses a value, and new rows are inserted at the
//! front, so `get_all` yields newest first like the SQLite stores do.

use crate::repository::*;
use async_trait::async_trait;
use outreach_core::*;
use std::time::Duration;
use tokio::sync::RwLock;

trait Keyed {
    fn key(&self) -> RecordId;
}

impl Keyed for CandidateRecord {
    fn key(&self) -> RecordId {
        self.id
    }
}

impl Keyed for BlacklistEntry {
    fn key(&self) -> RecordId {
        self.id
    }
}

impl Keyed for OutreachAccount {
    fn key(&self) -> RecordId {
        self.id
    }
}

struct TableState<T> {
    rows: Vec<T>,
    next_id: RecordId,
}

/// Vector-backed table shared by the in-memory repositories
struct MemoryTable<T> {
    entity: &'static str,
    state: RwLock<TableState<T>>,
    latency: Option<Duration>,
}

impl<T: Keyed + Clone + Send + Sync> MemoryTable<T> {
    fn new(entity: &'static str, seed: Vec<T>, latency: Option<Duration>) -> Self {
        let next_id = seed.iter().map(Keyed::key).max().unwrap_or(0) + 1;
        Self {
            entity,
            state: RwLock::new(TableState { rows: seed, next_id }),
            latency,
        }
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn all(&self) -> Vec<T> {
        self.delay().await;
        self.state.read().await.rows.clone()
    }

    async fn find(&self, id: RecordId) -> Option<T> {
        self.delay().await;
        self.state.read().await.rows.iter().find(|r| r.key() == id).cloned()
    }

    async fn insert_with(&self, build: impl FnOnce(RecordId) -> T) -> T {
        self.delay().await;
        let mut state = self.state.write().await;
        let row = build(state.next_id);
        state.next_id += 1;
        state.rows.insert(0, row.clone());
        row
    }

    async fn modify(&self, id: RecordId, change: impl FnOnce(&mut T)) -> Result<T> {
        self.delay().await;
        let mut state = self.state.write().await;
        let row = state
            .rows
            .iter_mut()
            .find(|r| r.key() == id)
            .ok_or_else(|| OutreachError::not_found(self.entity, id))?;
        change(row);
        Ok(row.clone())
    }

    async fn remove(&self, id: RecordId) -> Result<()> {
        self.delay().await;
        let mut state = self.state.write().await;
        let index = state
            .rows
            .iter()
            .position(|r| r.key() == id)
            .ok_or_else(|| OutreachError::not_found(self.entity, id))?;
        state.rows.remove(index);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }
}

/// In-memory implementation of ModelRepository
pub struct InMemoryModelRepository {
    table: MemoryTable<CandidateRecord>,
}

impl InMemoryModelRepository {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Seed the store; records are expected newest first
    pub fn with_records(records: Vec<CandidateRecord>) -> Self {
        Self {
            table: MemoryTable::new("Model", records, None),
        }
    }

    /// Simulate a remote table by sleeping before every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.table.latency = Some(latency);
        self
    }
}

impl Default for InMemoryModelRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelRepository for InMemoryModelRepository {
    async fn get_all(&self) -> Result<Vec<CandidateRecord>> {
        Ok(self.table.all().await)
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<CandidateRecord>> {
        Ok(self.table.find(id).await)
    }

    async fn create(&self, draft: ModelDraft) -> Result<CandidateRecord> {
        let now = Utc::now();
        Ok(self.table.insert_with(|id| draft.into_record(id, now)).await)
    }

    async fn update(&self, id: RecordId, patch: ModelPatch) -> Result<CandidateRecord> {
        self.table.modify(id, |record| patch.apply_to(record)).await
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.table.remove(id).await
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.len().await)
    }
}

/// In-memory implementation of BlacklistRepository
pub struct InMemoryBlacklistRepository {
    table: MemoryTable<BlacklistEntry>,
}

impl InMemoryBlacklistRepository {
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    pub fn with_entries(entries: Vec<BlacklistEntry>) -> Self {
        Self {
            table: MemoryTable::new("Blacklist entry", entries, None),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.table.latency = Some(latency);
        self
    }
}

impl Default for InMemoryBlacklistRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlacklistRepository for InMemoryBlacklistRepository {
    async fn get_all(&self) -> Result<Vec<BlacklistEntry>> {
        Ok(self.table.all().await)
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<BlacklistEntry>> {
        Ok(self.table.find(id).await)
    }

    async fn create(&self, draft: BlacklistDraft) -> Result<BlacklistEntry> {
        let now = Utc::now();
        Ok(self.table.insert_with(|id| draft.into_entry(id, now)).await)
    }

    async fn update(&self, id: RecordId, patch: BlacklistPatch) -> Result<BlacklistEntry> {
        self.table.modify(id, |entry| patch.apply_to(entry)).await
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.table.remove(id).await
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.len().await)
    }
}

/// In-memory implementation of AccountRepository
pub struct InMemoryAccountRepository {
    table: MemoryTable<OutreachAccount>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("Account", Vec::new(), None),
        }
    }
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get_all(&self) -> Result<Vec<OutreachAccount>> {
        Ok(self.table.all().await)
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<OutreachAccount>> {
        Ok(self.table.find(id).await)
    }

    async fn create(&self, draft: AccountDraft) -> Result<OutreachAccount> {
        let now = Utc::now();
        Ok(self.table.insert_with(|id| draft.into_account(id, now)).await)
    }

    async fn update(&self, id: RecordId, draft: AccountDraft) -> Result<OutreachAccount> {
        self.table
            .modify(id, |account| {
                account.name = draft.name;
                account.platform = draft.platform;
                account.username = draft.username;
            })
            .await
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.table.remove(id).await
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.len().await)
    }
}

/// In-memory implementation of SettingsRepository
#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: RwLock<Option<Settings>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn get(&self) -> Result<Settings> {
        Ok(self.settings.read().await.clone().unwrap_or_default())
    }

    async fn update(&self, settings: Settings) -> Result<Settings> {
        *self.settings.write().await = Some(settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let repo = InMemoryModelRepository::new();

        let a = repo.create(ModelDraft::new("https://a.com/1", "Other")).await.unwrap();
        let b = repo.create(ModelDraft::new("https://a.com/2", "Other")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        repo.delete(b.id).await.unwrap();
        let c = repo.create(ModelDraft::new("https://a.com/3", "Other")).await.unwrap();
        assert_eq!(c.id, 3);

        let ids: Vec<_> = repo.get_all().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_seeded_store_continues_after_max() {
        let seed = vec![ModelDraft::new("https://a.com/9", "Other").into_record(9, Utc::now())];
        let repo = InMemoryModelRepository::with_records(seed);
        let next = repo.create(ModelDraft::new("https://a.com/10", "Other")).await.unwrap();
        assert_eq!(next.id, 10);
    }

    #[tokio::test]
    async fn test_update_missing_entry() {
        let repo = InMemoryBlacklistRepository::new();
        let err = repo.update(5, BlacklistPatch::default()).await.unwrap_err();
        assert!(err.to_string().contains("Blacklist entry not found: 5"));
    }

    #[tokio::test]
    async fn test_account_update_keeps_created_date() {
        let repo = InMemoryAccountRepository::new();
        let account = repo
            .create(AccountDraft {
                name: "Main".into(),
                platform: "TikTok".into(),
                username: "scout".into(),
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                account.id,
                AccountDraft {
                    name: "Alt".into(),
                    platform: "TikTok".into(),
                    username: "scout2".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.username, "scout2");
        assert_eq!(updated.created_date, account.created_date);
    }

    #[tokio::test]
    async fn test_settings_defaults() {
        let repo = InMemorySettingsRepository::new();
        assert_eq!(repo.get().await.unwrap().default_platform, "Instagram");
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let repo = InMemoryModelRepository::new().with_latency(Duration::from_millis(300));
        let start = tokio::time::Instant::now();
        repo.get_all().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
