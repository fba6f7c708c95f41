//! Entity types for the outreach tracker
//!
//! Every persisted shape has an explicit schema here: the stored record, the
//! draft used to create it and (where targeted updates exist) a patch type
//! whose `Option` fields spell out which columns an update touches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Store-assigned integer identifier
pub type RecordId = i64;

/// Platform label used when detection finds no configured platform
pub const DEFAULT_PLATFORM: &str = "Other";

/// Reason recorded when a candidate is moved to the blacklist without one
pub const DEFAULT_BLACKLIST_REASON: &str = "Moved from models";

/// Collapse blank optional text to `None`
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

// ============================================================================
// Candidate records
// ============================================================================

/// A tracked outreach target ("model")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: RecordId,
    /// Canonical link, unique within the active list by convention only
    pub link: String,
    pub platform: String,
    /// Username of the outreach account that followed this target
    #[serde(default)]
    pub followed_by: Option<String>,
    #[serde(default)]
    pub follow_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dm_sent: bool,
    #[serde(default)]
    pub dm_sent_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    pub date_added: DateTime<Utc>,
}

impl CandidateRecord {
    /// Whether an outreach account has followed this target
    pub fn is_followed(&self) -> bool {
        self.followed_by.as_deref().is_some_and(|f| !f.is_empty())
    }
}

/// Creation payload for a candidate record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDraft {
    pub link: String,
    pub platform: String,
    #[serde(default)]
    pub followed_by: Option<String>,
    #[serde(default)]
    pub follow_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dm_sent: bool,
    #[serde(default)]
    pub dm_sent_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

impl ModelDraft {
    pub fn new(link: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            platform: platform.into(),
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Materialise the draft as a stored record
    pub fn into_record(self, id: RecordId, date_added: DateTime<Utc>) -> CandidateRecord {
        CandidateRecord {
            id,
            link: self.link,
            platform: self.platform,
            followed_by: non_empty(self.followed_by),
            follow_date: self.follow_date,
            dm_sent: self.dm_sent,
            dm_sent_date: self.dm_sent_date,
            notes: self.notes,
            date_added,
        }
    }
}

/// Targeted update of a candidate record.
///
/// `None` leaves a field untouched. For clearable fields the inner option
/// carries the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelPatch {
    pub link: Option<String>,
    pub platform: Option<String>,
    pub followed_by: Option<Option<String>>,
    pub follow_date: Option<Option<DateTime<Utc>>>,
    pub dm_sent: Option<bool>,
    pub dm_sent_date: Option<Option<DateTime<Utc>>>,
    pub notes: Option<String>,
}

impl ModelPatch {
    /// Assign (or clear) the following account; the follow date tracks it
    pub fn assign_follower(account: Option<String>, at: DateTime<Utc>) -> Self {
        let account = non_empty(account);
        let follow_date = account.as_ref().map(|_| at);
        Self {
            followed_by: Some(account),
            follow_date: Some(follow_date),
            ..Default::default()
        }
    }

    /// Toggle the DM flag; the DM date is stamped or cleared with it
    pub fn set_dm_sent(sent: bool, at: DateTime<Utc>) -> Self {
        Self {
            dm_sent: Some(sent),
            dm_sent_date: Some(sent.then_some(at)),
            ..Default::default()
        }
    }

    /// Full-form edit: every editable field is overwritten from the draft
    pub fn from_draft(draft: ModelDraft) -> Self {
        Self {
            link: Some(draft.link),
            platform: Some(draft.platform),
            followed_by: Some(non_empty(draft.followed_by)),
            follow_date: Some(draft.follow_date),
            dm_sent: Some(draft.dm_sent),
            dm_sent_date: Some(draft.dm_sent_date),
            notes: Some(draft.notes),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, record: &mut CandidateRecord) {
        if let Some(link) = &self.link {
            record.link = link.clone();
        }
        if let Some(platform) = &self.platform {
            record.platform = platform.clone();
        }
        if let Some(followed_by) = &self.followed_by {
            record.followed_by = non_empty(followed_by.clone());
        }
        if let Some(follow_date) = self.follow_date {
            record.follow_date = follow_date;
        }
        if let Some(dm_sent) = self.dm_sent {
            record.dm_sent = dm_sent;
        }
        if let Some(dm_sent_date) = self.dm_sent_date {
            record.dm_sent_date = dm_sent_date;
        }
        if let Some(notes) = &self.notes {
            record.notes = notes.clone();
        }
    }
}

// ============================================================================
// Blacklist
// ============================================================================

/// A rejected target, mutually exclusive with the active list by convention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub id: RecordId,
    pub link: String,
    pub platform: String,
    #[serde(default)]
    pub reason: String,
    /// Creation time of the record this entry was moved from
    #[serde(default)]
    pub original_date_added: Option<DateTime<Utc>>,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistDraft {
    pub link: String,
    pub platform: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub original_date_added: Option<DateTime<Utc>>,
}

impl BlacklistDraft {
    /// Blacklist copy of an active record, preserving its creation time
    pub fn from_record(record: &CandidateRecord, reason: impl Into<String>) -> Self {
        Self {
            link: record.link.clone(),
            platform: record.platform.clone(),
            reason: reason.into(),
            original_date_added: Some(record.date_added),
        }
    }

    pub fn into_entry(self, id: RecordId, date_added: DateTime<Utc>) -> BlacklistEntry {
        BlacklistEntry {
            id,
            link: self.link,
            platform: self.platform,
            reason: self.reason,
            original_date_added: self.original_date_added,
            date_added,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlacklistPatch {
    pub link: Option<String>,
    pub platform: Option<String>,
    pub reason: Option<String>,
}

impl BlacklistPatch {
    pub fn apply_to(&self, entry: &mut BlacklistEntry) {
        if let Some(link) = &self.link {
            entry.link = link.clone();
        }
        if let Some(platform) = &self.platform {
            entry.platform = platform.clone();
        }
        if let Some(reason) = &self.reason {
            entry.reason = reason.clone();
        }
    }
}

// ============================================================================
// Accounts and settings
// ============================================================================

/// An account used for outreach; only referenced by `followed_by`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachAccount {
    pub id: RecordId,
    pub name: String,
    pub platform: String,
    pub username: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountDraft {
    pub name: String,
    pub platform: String,
    pub username: String,
}

impl AccountDraft {
    pub fn into_account(self, id: RecordId, created_date: DateTime<Utc>) -> OutreachAccount {
        OutreachAccount {
            id,
            name: self.name,
            platform: self.platform,
            username: self.username,
            created_date,
        }
    }
}

/// Platform known to the detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    pub id: RecordId,
    pub name: String,
    /// Registrable domain used for auto-detection, e.g. `instagram.com`
    pub domain: String,
    pub pill_background_color: String,
    pub pill_text_color: String,
}

impl PlatformConfig {
    pub fn new(id: RecordId, name: &str, domain: &str, background: &str, text: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            domain: domain.to_string(),
            pill_background_color: background.to_string(),
            pill_text_color: text.to_string(),
        }
    }
}

/// Global user settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub display_name: String,
    pub email: String,
    pub default_platform: String,
    pub email_notifications: bool,
    pub follow_reminders: bool,
    pub dm_reminders: bool,
    pub platforms: Vec<PlatformConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_name: "Model Scout".to_string(),
            email: "scout@modeloutreach.com".to_string(),
            default_platform: "Instagram".to_string(),
            email_notifications: true,
            follow_reminders: true,
            dm_reminders: false,
            platforms: vec![
                PlatformConfig::new(1, "Instagram", "instagram.com", "#fdf2f8", "#be185d"),
                PlatformConfig::new(2, "OnlyFans", "onlyfans.com", "#dbeafe", "#1d4ed8"),
                PlatformConfig::new(3, "Fansly", "fansly.com", "#f3e8ff", "#7c3aed"),
                PlatformConfig::new(4, "TikTok", "tiktok.com", "#f3e8ff", "#7c3aed"),
                PlatformConfig::new(5, "Twitter", "twitter.com", "#e0f2fe", "#0284c7"),
            ],
        }
    }
}

impl Settings {
    /// One past the largest platform id in use, never below 1
    pub fn next_platform_id(&self) -> RecordId {
        self.platforms.iter().map(|p| p.id).max().unwrap_or(0).max(0) + 1
    }

    /// Append a platform under a fresh id and return the stored copy
    pub fn add_platform(&mut self, mut platform: PlatformConfig) -> PlatformConfig {
        platform.id = self.next_platform_id();
        self.platforms.push(platform.clone());
        platform
    }

    /// Replace the platform with the same id; false if there is none
    pub fn replace_platform(&mut self, platform: PlatformConfig) -> bool {
        match self.platforms.iter_mut().find(|p| p.id == platform.id) {
            Some(slot) => {
                *slot = platform;
                true
            }
            None => false,
        }
    }

    /// Drop the platform with `id`; false if there is none
    pub fn remove_platform(&mut self, id: RecordId) -> bool {
        let before = self.platforms.len();
        self.platforms.retain(|p| p.id != id);
        self.platforms.len() != before
    }
}

// ============================================================================
// Import rows
// ============================================================================

/// One parsed CSV data row keyed by header
pub type CsvRecord = HashMap<String, String>;

/// Classification outcome of one import row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Processing,
    Valid,
    Invalid,
    Duplicate,
    Blacklisted,
    Error,
}

impl ImportStatus {
    /// Only valid rows may be committed
    pub fn is_committable(self) -> bool {
        matches!(self, ImportStatus::Valid)
    }

    /// Conflicts with an existing record or an earlier row
    pub fn is_conflict(self) -> bool {
        matches!(self, ImportStatus::Duplicate | ImportStatus::Blacklisted)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ImportStatus::Invalid | ImportStatus::Error)
    }
}

/// Record field a CSV column can be mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    Link,
    Platform,
    Notes,
    FollowedBy,
    FollowDate,
    DmSent,
    DmSentDate,
}

impl TargetField {
    pub const ALL: [TargetField; 7] = [
        TargetField::Link,
        TargetField::Platform,
        TargetField::Notes,
        TargetField::FollowedBy,
        TargetField::FollowDate,
        TargetField::DmSent,
        TargetField::DmSentDate,
    ];

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            TargetField::Link => "Profile Link",
            TargetField::Platform => "Platform",
            TargetField::Notes => "Notes",
            TargetField::FollowedBy => "Followed By",
            TargetField::FollowDate => "Follow Date",
            TargetField::DmSent => "DM Sent",
            TargetField::DmSentDate => "DM Sent Date",
        }
    }
}

/// Per-row import outcome; ephemeral, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowResult {
    pub original_url: String,
    pub cleaned_url: String,
    pub platform: String,
    pub status: ImportStatus,
    pub error: String,
    /// 1-based data row number for CSV provenance
    #[serde(default)]
    pub row_index: Option<usize>,
    #[serde(default)]
    pub data: Option<CsvRecord>,
}

impl ImportRowResult {
    pub fn processing(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            cleaned_url: String::new(),
            platform: String::new(),
            status: ImportStatus::Processing,
            error: String::new(),
            row_index: None,
            data: None,
        }
    }

    pub fn with_row(mut self, row_index: usize, data: CsvRecord) -> Self {
        self.row_index = Some(row_index);
        self.data = Some(data);
        self
    }

    pub fn reject(mut self, status: ImportStatus, error: impl Into<String>) -> Self {
        self.status = status;
        self.error = error.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CandidateRecord {
        ModelDraft::new("https://instagram.com/a", "Instagram").into_record(1, Utc::now())
    }

    #[test]
    fn test_assign_follower_pairs_date() {
        let now = Utc::now();
        let mut r = record();

        ModelPatch::assign_follower(Some("scout_one".into()), now).apply_to(&mut r);
        assert_eq!(r.followed_by.as_deref(), Some("scout_one"));
        assert_eq!(r.follow_date, Some(now));
        assert!(r.is_followed());

        ModelPatch::assign_follower(Some("  ".into()), now).apply_to(&mut r);
        assert_eq!(r.followed_by, None);
        assert_eq!(r.follow_date, None);
    }

    #[test]
    fn test_dm_toggle() {
        let now = Utc::now();
        let mut r = record();

        ModelPatch::set_dm_sent(true, now).apply_to(&mut r);
        assert!(r.dm_sent);
        assert_eq!(r.dm_sent_date, Some(now));

        ModelPatch::set_dm_sent(false, now).apply_to(&mut r);
        assert!(!r.dm_sent);
        assert!(r.dm_sent_date.is_none());
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut r = record();
        let before = r.clone();
        let patch = ModelPatch::default();
        assert!(patch.is_empty());
        patch.apply_to(&mut r);
        assert_eq!(r, before);
    }

    #[test]
    fn test_blacklist_draft_keeps_original_date() {
        let r = record();
        let draft = BlacklistDraft::from_record(&r, DEFAULT_BLACKLIST_REASON);
        assert_eq!(draft.original_date_added, Some(r.date_added));
        assert_eq!(draft.reason, "Moved from models");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("dateAdded").is_some());
        assert!(json.get("dmSent").is_some());
        assert!(json.get("followedBy").is_some());
    }

    #[test]
    fn test_import_status_classes() {
        assert!(ImportStatus::Valid.is_committable());
        assert!(ImportStatus::Blacklisted.is_conflict());
        assert!(ImportStatus::Duplicate.is_conflict());
        assert!(ImportStatus::Invalid.is_failure());
        assert!(!ImportStatus::Processing.is_committable());
    }

    #[test]
    fn test_default_settings_platforms() {
        let settings = Settings::default();
        assert_eq!(settings.platforms.len(), 5);
        assert_eq!(settings.platforms[0].domain, "instagram.com");
    }

    #[test]
    fn test_platform_ids_follow_max() {
        let mut settings = Settings::default();
        assert!(settings.remove_platform(2));
        assert!(!settings.remove_platform(2));

        let reddit = PlatformConfig::new(0, "Reddit", "reddit.com", "#fff", "#000");
        let added = settings.add_platform(reddit);
        assert_eq!(added.id, 6);

        settings.platforms.clear();
        assert_eq!(settings.next_platform_id(), 1);
    }

    #[test]
    fn test_replace_platform_by_id() {
        let mut settings = Settings::default();
        let mut edited = settings.platforms[4].clone();
        edited.domain = "x.com".to_string();
        assert!(settings.replace_platform(edited));
        assert_eq!(settings.platforms[4].domain, "x.com");

        let missing = PlatformConfig::new(42, "Nope", "nope.com", "#fff", "#000");
        assert!(!settings.replace_platform(missing));
    }
}
