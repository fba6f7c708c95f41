//! Relocation Service
//!
//! Moves records between the active list and the blacklist. A move creates
//! the destination copy first and then deletes the source. When the delete
//! fails the destination copy is deleted again, so a failed move normally
//! leaves the record where it was. Only a failure of that compensating
//! delete leaves the record in both sets, and it is reported as
//! [`RelocationError::Inconsistent`].

use data_access::{BlacklistRepository, ModelRepository};
use outreach_core::*;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct RelocationService {
    models: Arc<dyn ModelRepository>,
    blacklist: Arc<dyn BlacklistRepository>,
}

impl RelocationService {
    pub fn new(models: Arc<dyn ModelRepository>, blacklist: Arc<dyn BlacklistRepository>) -> Self {
        Self { models, blacklist }
    }

    /// Move an active record to the blacklist.
    ///
    /// `reason` defaults to "Moved from models"; the record's creation time
    /// is kept as the entry's `original_date_added`.
    pub async fn move_to_blacklist(
        &self,
        id: RecordId,
        reason: Option<String>,
    ) -> Result<BlacklistEntry> {
        let record = self
            .models
            .get_by_id(id)
            .await?
            .ok_or_else(|| OutreachError::not_found("Model", id))?;

        let reason = non_empty(reason).unwrap_or_else(|| DEFAULT_BLACKLIST_REASON.to_string());
        let entry = self
            .blacklist
            .create(BlacklistDraft::from_record(&record, reason))
            .await?;

        settle(id, entry.id, self.models.delete(id).await, self.blacklist.delete(entry.id)).await?;

        info!("Moved model {} to blacklist as {}", id, entry.id);
        Ok(entry)
    }

    /// Move a blacklist entry back to the active list as a fresh record
    pub async fn restore_to_models(&self, id: RecordId) -> Result<CandidateRecord> {
        let entry = self
            .blacklist
            .get_by_id(id)
            .await?
            .ok_or_else(|| OutreachError::not_found("Blacklist entry", id))?;

        let draft = ModelDraft::new(entry.link.clone(), entry.platform.clone())
            .with_notes(restored_note(&entry));
        let record = self.models.create(draft).await?;

        settle(id, record.id, self.blacklist.delete(id).await, self.models.delete(record.id)).await?;

        info!("Restored blacklist entry {} as model {}", id, record.id);
        Ok(record)
    }

    /// Delete a blacklist entry outright
    pub async fn remove_from_blacklist(&self, id: RecordId) -> Result<()> {
        self.blacklist.delete(id).await?;
        info!("Removed blacklist entry {}", id);
        Ok(())
    }
}

fn restored_note(entry: &BlacklistEntry) -> String {
    if entry.reason.trim().is_empty() {
        "Restored from blacklist".to_string()
    } else {
        format!("Restored from blacklist (was: {})", entry.reason.trim())
    }
}

/// Finish a move once the destination copy exists
async fn settle<F>(
    source_id: RecordId,
    destination_id: RecordId,
    source_delete: Result<()>,
    rollback: F,
) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let reason = match source_delete {
        Ok(()) => return Ok(()),
        Err(e) => e.to_string(),
    };

    warn!(
        "Source {} could not be deleted, rolling back {}: {}",
        source_id, destination_id, reason
    );

    match rollback.await {
        Ok(()) => Err(RelocationError::RolledBack { destination_id, reason }.into()),
        Err(rollback_error) => {
            error!(
                "Rollback of {} failed, record {} now exists in both sets: {}",
                destination_id, source_id, rollback_error
            );
            Err(RelocationError::Inconsistent {
                source_id,
                destination_id,
                reason: format!("{}; rollback failed: {}", reason, rollback_error),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_access::{InMemoryBlacklistRepository, InMemoryModelRepository};

    type Stores = (Arc<InMemoryModelRepository>, Arc<InMemoryBlacklistRepository>);

    fn service_with(models: Vec<CandidateRecord>) -> (RelocationService, Stores) {
        let models = Arc::new(InMemoryModelRepository::with_records(models));
        let blacklist = Arc::new(InMemoryBlacklistRepository::new());
        let service = RelocationService::new(models.clone(), blacklist.clone());
        (service, (models, blacklist))
    }

    #[tokio::test]
    async fn test_move_to_blacklist_and_back() {
        let added = Utc::now() - chrono::Duration::days(3);
        let record = ModelDraft::new("https://fansly.com/a", "Fansly").into_record(1, added);
        let (service, (models, blacklist)) = service_with(vec![record]);

        let entry = service.move_to_blacklist(1, None).await.unwrap();
        assert_eq!(entry.reason, "Moved from models");
        assert_eq!(entry.original_date_added, Some(added));
        assert_eq!(models.count().await.unwrap(), 0);
        assert_eq!(blacklist.count().await.unwrap(), 1);

        let restored = service.restore_to_models(entry.id).await.unwrap();
        assert_eq!(restored.link, "https://fansly.com/a");
        assert_eq!(restored.platform, "Fansly");
        assert!(restored.notes.contains("Moved from models"));
        assert_eq!(blacklist.count().await.unwrap(), 0);
        assert_eq!(models.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_custom_reason() {
        let record = ModelDraft::new("https://fansly.com/a", "Fansly").into_record(1, Utc::now());
        let (service, _) = service_with(vec![record]);
        let entry = service.move_to_blacklist(1, Some("Not a fit".into())).await.unwrap();
        assert_eq!(entry.reason, "Not a fit");
    }

    #[tokio::test]
    async fn test_missing_source_changes_nothing() {
        let (service, (_, blacklist)) = service_with(Vec::new());
        let err = service.move_to_blacklist(42, None).await.unwrap_err();
        assert!(err.to_string().contains("Model not found: 42"));
        assert_eq!(blacklist.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_from_blacklist() {
        let record = ModelDraft::new("https://fansly.com/a", "Fansly").into_record(1, Utc::now());
        let (service, (_, blacklist)) = service_with(vec![record]);
        let entry = service.move_to_blacklist(1, None).await.unwrap();

        service.remove_from_blacklist(entry.id).await.unwrap();
        assert_eq!(blacklist.count().await.unwrap(), 0);
        assert!(service.remove_from_blacklist(entry.id).await.is_err());
    }

    #[tokio::test]
    async fn test_settle_rolls_back() {
        let err = settle(1, 9, Err(OutreachError::backend("offline")), async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OutreachError::Relocation { source: RelocationError::RolledBack { destination_id: 9, .. } }
        ));
    }

    #[tokio::test]
    async fn test_settle_reports_inconsistency() {
        let err = settle(1, 9, Err(OutreachError::backend("offline")), async {
            Err(OutreachError::backend("still offline"))
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            OutreachError::Relocation {
                source: RelocationError::Inconsistent { source_id: 1, destination_id: 9, .. }
            }
        ));
    }
}
