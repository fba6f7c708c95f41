//! Duplicate Reconciler
//!
//! Classifies candidate links against point-in-time snapshots of the active
//! list and the blacklist, and against the rows already seen in the current
//! batch. The checks run in a fixed order and the first hit decides:
//!
//! 1. invalid URL
//! 2. already in the active list
//! 3. already in the blacklist
//! 4. repeated within the batch
//! 5. valid, with a detected (or supplied) platform

use crate::normalizer::{is_valid_url, normalize_url};
use crate::platform::PlatformDetector;
use outreach_core::*;
use std::collections::{HashMap, HashSet};

pub const REASON_INVALID_URL: &str = "Invalid URL format";
pub const REASON_IN_MODELS: &str = "Already exists in models";
pub const REASON_IN_BLACKLIST: &str = "Exists in blacklist";
pub const REASON_IN_BATCH: &str = "Duplicate in current batch";
pub const REASON_NO_LINK: &str = "No link provided";

/// Normalised keys of both record sets, taken once per batch
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    active: HashMap<String, Vec<RecordId>>,
    blacklist: HashMap<String, Vec<RecordId>>,
}

impl Snapshot {
    pub fn new(models: &[CandidateRecord], blacklist: &[BlacklistEntry]) -> Self {
        Self {
            active: index(models.iter().map(|m| (m.link.as_str(), m.id))),
            blacklist: index(blacklist.iter().map(|b| (b.link.as_str(), b.id))),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any active record other than `except` shares the key
    pub fn in_active(&self, key: &str, except: Option<RecordId>) -> bool {
        self.active
            .get(key)
            .is_some_and(|ids| ids.iter().any(|id| Some(*id) != except))
    }

    pub fn in_blacklist(&self, key: &str) -> bool {
        self.blacklist.contains_key(key)
    }

    /// Number of distinct keys in the active list and the blacklist
    pub fn key_counts(&self) -> (usize, usize) {
        (self.active.len(), self.blacklist.len())
    }
}

fn index<'a>(links: impl Iterator<Item = (&'a str, RecordId)>) -> HashMap<String, Vec<RecordId>> {
    let mut keys: HashMap<String, Vec<RecordId>> = HashMap::new();
    for (link, id) in links {
        keys.entry(normalize_url(link)).or_default().push(id);
    }
    keys
}

/// Rows classified so far in the current batch, in input order
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    results: Vec<ImportRowResult>,
    seen: HashSet<String>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ImportRowResult) {
        if !result.cleaned_url.is_empty() {
            self.seen.insert(result.cleaned_url.clone());
        }
        self.results.push(result);
    }

    /// Whether an earlier row produced the same cleaned link.
    ///
    /// Every earlier row counts, including rows that were themselves
    /// rejected as duplicates.
    pub fn contains(&self, cleaned: &str) -> bool {
        self.seen.contains(cleaned)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[ImportRowResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ImportRowResult> {
        self.results
    }
}

/// Classifies candidates against one snapshot with one platform configuration
pub struct DuplicateReconciler<'a> {
    snapshot: &'a Snapshot,
    detector: &'a PlatformDetector,
}

impl<'a> DuplicateReconciler<'a> {
    pub fn new(snapshot: &'a Snapshot, detector: &'a PlatformDetector) -> Self {
        Self { snapshot, detector }
    }

    /// Classify one candidate link.
    ///
    /// `platform_hint` is a caller supplied platform (a mapped CSV column);
    /// when present and non-blank it replaces detection for valid rows.
    pub fn classify(
        &self,
        candidate: &str,
        platform_hint: Option<&str>,
        batch: &BatchAccumulator,
    ) -> ImportRowResult {
        let mut result = ImportRowResult::processing(candidate);

        if !is_valid_url(candidate) {
            return result.reject(ImportStatus::Invalid, REASON_INVALID_URL);
        }

        let cleaned = normalize_url(candidate);
        result.cleaned_url = cleaned.clone();

        if self.snapshot.in_active(&cleaned, None) {
            return result.reject(ImportStatus::Duplicate, REASON_IN_MODELS);
        }
        if self.snapshot.in_blacklist(&cleaned) {
            return result.reject(ImportStatus::Blacklisted, REASON_IN_BLACKLIST);
        }
        if batch.contains(&cleaned) {
            return result.reject(ImportStatus::Duplicate, REASON_IN_BATCH);
        }

        result.platform = match platform_hint.map(str::trim).filter(|p| !p.is_empty()) {
            Some(platform) => platform.to_string(),
            None => self.detector.detect_or_default(&cleaned),
        };
        result.status = ImportStatus::Valid;
        result
    }

    /// Classify every line of a pasted block; blank lines are dropped
    pub fn classify_lines(&self, text: &str) -> Vec<ImportRowResult> {
        let mut batch = BatchAccumulator::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let result = self.classify(line, None, &batch);
            batch.push(result);
        }
        batch.into_results()
    }

    /// Single-entry conflict check; `editing` excludes the record under edit
    pub fn check_conflicts(
        &self,
        cleaned: &str,
        editing: Option<RecordId>,
    ) -> std::result::Result<(), ValidationError> {
        if self.snapshot.in_active(cleaned, editing) {
            return Err(ValidationError::DuplicateLink {
                link: cleaned.to_string(),
            });
        }
        if self.snapshot.in_blacklist(cleaned) {
            return Err(ValidationError::BlacklistedLink {
                link: cleaned.to_string(),
            });
        }
        Ok(())
    }
}
