//! Import Pipeline
//!
//! Runs the normalizer, detector and reconciler over the three entry modes
//! (single form, pasted bulk text, mapped CSV) and turns accepted rows into
//! record-creation calls.
//!
//! Classification of a batch reads both record sets once, then works purely
//! on that snapshot. Committing is sequential and not atomic: every valid row
//! gets its own create call and a failed row never stops the rest.

use chrono::TimeZone;
use crate::csv_import::{parse_flag, parse_loose_date, ColumnMapping, CsvDocument};
use crate::normalizer::try_normalize_url;
use crate::platform::PlatformDetector;
use crate::reconciler::{BatchAccumulator, DuplicateReconciler, Snapshot, REASON_NO_LINK};
use data_access::{BlacklistRepository, ModelRepository};
use outreach_core::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// Where a batch came from; CSV batches carry the mapping used to read them
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSource {
    Bulk,
    Csv(ColumnMapping),
}

impl ImportSource {
    pub fn label(&self) -> &'static str {
        match self {
            ImportSource::Bulk => "Bulk",
            ImportSource::Csv(_) => "CSV",
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            ImportSource::Bulk => "URLs",
            ImportSource::Csv(_) => "rows",
        }
    }
}

/// Counts over a classified batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    /// Conflicts with either record set or an earlier row
    pub duplicates: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ImportRowResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, row| {
            summary.total += 1;
            if row.status.is_committable() {
                summary.valid += 1;
            } else if row.status.is_conflict() {
                summary.duplicates += 1;
            } else if row.status.is_failure() {
                summary.errors += 1;
            }
            summary
        })
    }
}

/// A classified batch awaiting confirmation
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub batch_id: Uuid,
    pub source: ImportSource,
    pub results: Vec<ImportRowResult>,
}

impl ImportBatch {
    pub fn committable(&self) -> impl Iterator<Item = &ImportRowResult> {
        self.results.iter().filter(|r| r.status.is_committable())
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_results(&self.results)
    }

    /// e.g. "Processed 4 URLs: 2 valid, 1 duplicates, 1 errors"
    pub fn summary_message(&self) -> String {
        let s = self.summary();
        format!(
            "Processed {} {}: {} valid, {} duplicates, {} errors",
            s.total,
            self.source.unit(),
            s.valid,
            s.duplicates,
            s.errors
        )
    }
}

/// A row whose create call failed during commit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitFailure {
    pub link: String,
    pub row_index: Option<usize>,
    pub error: String,
}

/// Outcome of committing a batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub batch_id: Uuid,
    pub succeeded: usize,
    pub failed: usize,
    pub created: Vec<CandidateRecord>,
    pub failures: Vec<CommitFailure>,
}

impl ImportReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn message(&self) -> String {
        format!("Successfully imported {}, failed {}", self.succeeded, self.failed)
    }
}

/// Per-field problems found by single-entry validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    pub link: Option<ValidationError>,
    pub platform: Option<ValidationError>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.link.is_none() && self.platform.is_none()
    }

    /// The first problem as an error, link before platform
    pub fn first(&self) -> Option<ValidationError> {
        self.link.clone().or_else(|| self.platform.clone())
    }
}

/// Orchestrates classification and commit against the two record stores
pub struct ImportPipeline {
    models: Arc<dyn ModelRepository>,
    blacklist: Arc<dyn BlacklistRepository>,
    detector: PlatformDetector,
}

impl ImportPipeline {
    pub fn new(
        models: Arc<dyn ModelRepository>,
        blacklist: Arc<dyn BlacklistRepository>,
        detector: PlatformDetector,
    ) -> Self {
        Self {
            models,
            blacklist,
            detector,
        }
    }

    pub fn detector(&self) -> &PlatformDetector {
        &self.detector
    }

    /// Fetch both record sets once and index them
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let models = self.models.get_all().await?;
        let blacklist = self.blacklist.get_all().await?;
        debug!(
            "Snapshot taken: {} models, {} blacklist entries",
            models.len(),
            blacklist.len()
        );
        Ok(Snapshot::new(&models, &blacklist))
    }

    // ------------------------------------------------------------------
    // Single entry
    // ------------------------------------------------------------------

    /// Validate a form submission.
    ///
    /// On success the returned draft carries the canonical link and a
    /// resolved platform. `editing` names the record being edited so it
    /// does not conflict with itself. A failed snapshot fetch skips the
    /// duplicate checks rather than blocking the submission.
    pub async fn validate_single(
        &self,
        mut draft: ModelDraft,
        editing: Option<RecordId>,
    ) -> std::result::Result<ModelDraft, FormErrors> {
        let mut errors = FormErrors::default();
        let link = draft.link.trim().to_string();
        let mut detect_on = link.clone();

        if link.is_empty() {
            errors.link = Some(ValidationError::MissingField {
                field: "Link".to_string(),
            });
        } else {
            match try_normalize_url(&link) {
                Ok(cleaned) => {
                    match self.snapshot().await {
                        Ok(snapshot) => {
                            let reconciler = DuplicateReconciler::new(&snapshot, &self.detector);
                            errors.link = reconciler.check_conflicts(&cleaned, editing).err();
                        }
                        Err(e) => warn!("Duplicate check skipped: {}", e),
                    }
                    detect_on = cleaned.clone();
                    draft.link = cleaned;
                }
                Err(_) => errors.link = Some(ValidationError::MalformedLink { link: link.clone() }),
            }
        }

        let platform = draft.platform.trim().to_string();
        draft.platform = if platform.is_empty() {
            self.detector.detect(&detect_on).map(str::to_string).unwrap_or_default()
        } else {
            platform
        };
        if draft.platform.is_empty() {
            errors.platform = Some(ValidationError::MissingField {
                field: "Platform".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(draft)
        } else {
            Err(errors)
        }
    }

    /// Validate and create one record
    pub async fn add_single(&self, draft: ModelDraft) -> Result<CandidateRecord> {
        let draft = self.validate_single(draft, None).await.map_err(reject_form)?;
        let record = self.models.create(draft).await?;
        info!("Added model {} ({})", record.id, record.link);
        Ok(record)
    }

    /// Validate and overwrite an existing record from a full form
    pub async fn update_single(&self, id: RecordId, draft: ModelDraft) -> Result<CandidateRecord> {
        let draft = self.validate_single(draft, Some(id)).await.map_err(reject_form)?;
        let record = self.models.update(id, ModelPatch::from_draft(draft)).await?;
        info!("Updated model {}", record.id);
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------

    /// Classify a pasted block, one candidate per non-blank line
    pub async fn classify_bulk(&self, text: &str) -> Result<ImportBatch> {
        let batch_id = Uuid::new_v4();
        let span = info_span!("import_batch", %batch_id, source = "Bulk");

        async {
            let snapshot = self.snapshot().await?;
            let results = DuplicateReconciler::new(&snapshot, &self.detector).classify_lines(text);

            let batch = ImportBatch {
                batch_id,
                source: ImportSource::Bulk,
                results,
            };
            info!("{}", batch.summary_message());
            Ok(batch)
        }
        .instrument(span)
        .await
    }

    /// Classify the rows of a parsed CSV file under `mapping`.
    ///
    /// The mapping must name exactly one link column. Rows whose link cell is
    /// empty are rejected without a validity check; a non-empty mapped
    /// platform cell takes precedence over detection.
    pub async fn classify_csv(
        &self,
        document: &CsvDocument,
        mapping: &ColumnMapping,
    ) -> Result<ImportBatch> {
        if document.is_empty() {
            return Err(ValidationError::CsvTooShort.into());
        }
        let link_column = mapping.link_column()?;

        let batch_id = Uuid::new_v4();
        let span = info_span!("import_batch", %batch_id, source = "CSV");

        async {
            let snapshot = self.snapshot().await?;
            let reconciler = DuplicateReconciler::new(&snapshot, &self.detector);
            let mut accumulator = BatchAccumulator::new();

            for (index, row) in document.rows.iter().enumerate() {
                let link = row.get(link_column).map(|v| v.trim()).unwrap_or_default();
                let result = if link.is_empty() {
                    ImportRowResult::processing("").reject(ImportStatus::Invalid, REASON_NO_LINK)
                } else {
                    let platform = mapping.value(row, TargetField::Platform);
                    reconciler.classify(link, platform, &accumulator)
                };
                accumulator.push(result.with_row(index + 1, row.clone()));
            }

            let batch = ImportBatch {
                batch_id,
                source: ImportSource::Csv(mapping.clone()),
                results: accumulator.into_results(),
            };
            info!("{}", batch.summary_message());
            Ok(batch)
        }
        .instrument(span)
        .await
    }

    /// Create a record for every valid row, one call at a time.
    ///
    /// Each failure is counted and logged, then the loop moves on. A batch
    /// without valid rows is refused.
    pub async fn commit(&self, batch: &ImportBatch) -> Result<ImportReport> {
        if batch.committable().next().is_none() {
            return Err(ValidationError::NothingToCommit.into());
        }

        let span = info_span!(
            "import_batch",
            batch_id = %batch.batch_id,
            source = batch.source.label()
        );

        async {
            let now = Utc::now();
            let mut report = ImportReport {
                batch_id: batch.batch_id,
                succeeded: 0,
                failed: 0,
                created: Vec::new(),
                failures: Vec::new(),
            };

            for row in batch.committable() {
                let draft = build_draft(row, &batch.source, now);
                match self.models.create(draft).await {
                    Ok(record) => {
                        report.succeeded += 1;
                        report.created.push(record);
                    }
                    Err(e) => {
                        warn!("Failed to import {}: {}", row.cleaned_url, e);
                        report.failed += 1;
                        report.failures.push(CommitFailure {
                            link: row.cleaned_url.clone(),
                            row_index: row.row_index,
                            error: e.to_string(),
                        });
                    }
                }
            }

            info!("{}", report.message());
            Ok(report)
        }
        .instrument(span)
        .await
    }
}

fn reject_form(errors: FormErrors) -> OutreachError {
    match errors.first() {
        Some(error) => error.into(),
        None => OutreachError::backend("form rejected without a reason"),
    }
}

/// Record-creation payload for a valid row.
///
/// CSV cells are coerced: flags accept "true", "1" and "yes", dates keep only
/// the calendar day and unparseable dates are left unset. A follower without a
/// follow date is stamped with `now`. Rows without notes get a provenance
/// note naming the import source and day.
pub fn build_draft(row: &ImportRowResult, source: &ImportSource, now: DateTime<Utc>) -> ModelDraft {
    let mut draft = ModelDraft::new(row.cleaned_url.clone(), row.platform.clone());

    if let (ImportSource::Csv(mapping), Some(data)) = (source, row.data.as_ref()) {
        let text = |field| mapping.value(data, field);
        let date = |field| {
            text(field)
                .and_then(parse_loose_date)
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .map(|midnight| Utc.from_utc_datetime(&midnight))
        };

        draft.notes = text(TargetField::Notes).unwrap_or_default().to_string();
        draft.followed_by = text(TargetField::FollowedBy).map(str::to_string);
        draft.follow_date = date(TargetField::FollowDate);
        draft.dm_sent = text(TargetField::DmSent).is_some_and(parse_flag);
        draft.dm_sent_date = date(TargetField::DmSentDate);

        if draft.followed_by.is_some() && draft.follow_date.is_none() {
            draft.follow_date = Some(now);
        }
    }

    if draft.notes.is_empty() {
        draft.notes = format!("{} imported on {}", source.label(), now.date_naive());
    }

    draft
}
