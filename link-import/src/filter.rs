//! List filtering and free-text search

use chrono::NaiveDate;
use outreach_core::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel accepted from the filter form for "not followed"
pub const NOT_FOLLOWED: &str = "__none__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FollowedByFilter {
    #[default]
    Any,
    NotFollowed,
    Account(String),
}

impl FollowedByFilter {
    /// Read a raw form value: empty means any, `__none__` means not followed
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" => FollowedByFilter::Any,
            NOT_FOLLOWED => FollowedByFilter::NotFollowed,
            account => FollowedByFilter::Account(account.to_string()),
        }
    }

    fn matches(&self, record: &CandidateRecord) -> bool {
        match self {
            FollowedByFilter::Any => true,
            FollowedByFilter::NotFollowed => !record.is_followed(),
            FollowedByFilter::Account(account) => record.followed_by.as_deref() == Some(account.as_str()),
        }
    }
}

/// Inclusive calendar-day range; an open bound is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    fn bound_count(&self) -> usize {
        usize::from(self.from.is_some()) + usize::from(self.to.is_some())
    }

    /// A missing timestamp only passes an open range
    pub fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(day) = at.map(|t| t.date_naive()) else {
            return false;
        };
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

/// Search text plus the advanced filters of the active list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelFilter {
    pub search: String,
    pub platform: Option<String>,
    pub followed_by: FollowedByFilter,
    pub dm_sent: Option<bool>,
    pub date_added: DateRange,
    pub follow_date: DateRange,
    pub dm_sent_date: DateRange,
}

impl ModelFilter {
    pub fn matches(&self, record: &CandidateRecord) -> bool {
        matches_search(
            &self.search,
            [
                record.link.as_str(),
                record.platform.as_str(),
                record.followed_by.as_deref().unwrap_or(""),
                record.notes.as_str(),
            ],
        ) && self.platform.as_ref().map_or(true, |p| &record.platform == p)
            && self.followed_by.matches(record)
            && self.dm_sent.map_or(true, |sent| record.dm_sent == sent)
            && self.date_added.contains(Some(record.date_added))
            && self.follow_date.contains(record.follow_date)
            && self.dm_sent_date.contains(record.dm_sent_date)
    }

    pub fn apply<'a>(&self, records: &'a [CandidateRecord]) -> Vec<&'a CandidateRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// Number of advanced filters set; the search text is not counted and
    /// each date bound counts on its own
    pub fn active_filter_count(&self) -> usize {
        usize::from(self.platform.is_some())
            + usize::from(self.followed_by != FollowedByFilter::Any)
            + usize::from(self.dm_sent.is_some())
            + self.date_added.bound_count()
            + self.follow_date.bound_count()
            + self.dm_sent_date.bound_count()
    }

    /// Reset the advanced filters, keeping the search text
    pub fn clear(&mut self) {
        *self = Self {
            search: std::mem::take(&mut self.search),
            ..Self::default()
        };
    }
}

/// Blacklist search over link, platform and reason
pub fn search_blacklist<'a>(entries: &'a [BlacklistEntry], term: &str) -> Vec<&'a BlacklistEntry> {
    entries
        .iter()
        .filter(|e| matches_search(term, [e.link.as_str(), e.platform.as_str(), e.reason.as_str()]))
        .collect()
}

fn matches_search<const N: usize>(term: &str, fields: [&str; N]) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&term))
}

/// Distinct values offered by the filter form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFacets {
    pub platforms: Vec<String>,
    pub followed_by: Vec<String>,
}

impl FilterFacets {
    pub fn collect(records: &[CandidateRecord]) -> Self {
        let platforms: BTreeSet<&str> = records.iter().map(|r| r.platform.as_str()).collect();
        let followers: BTreeSet<&str> = records.iter().filter_map(|r| r.followed_by.as_deref()).collect();

        Self {
            platforms: platforms.into_iter().map(str::to_string).collect(),
            followed_by: followers.into_iter().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 15, 30, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn records() -> Vec<CandidateRecord> {
        let mut a = ModelDraft::new("https://instagram.com/alpha", "Instagram").into_record(1, at(2024, 1, 10));
        a.followed_by = Some("scout_one".into());
        a.follow_date = Some(at(2024, 1, 12));
        a.notes = "Replied quickly".into();

        let mut b = ModelDraft::new("https://tiktok.com/@beta", "TikTok").into_record(2, at(2024, 2, 1));
        b.dm_sent = true;
        b.dm_sent_date = Some(at(2024, 2, 3));

        let c = ModelDraft::new("https://onlyfans.com/gamma", "OnlyFans").into_record(3, at(2024, 3, 1));
        vec![a, b, c]
    }

    fn ids(found: Vec<&CandidateRecord>) -> Vec<RecordId> {
        found.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let records = records();
        let filter = ModelFilter {
            search: "REPLIED".into(),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records)), vec![1]);

        let filter = ModelFilter {
            search: "scout".into(),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records)), vec![1]);
    }

    #[test]
    fn test_followed_by_sentinel() {
        let records = records();
        let mut filter = ModelFilter::default();

        filter.followed_by = FollowedByFilter::parse(NOT_FOLLOWED);
        assert_eq!(ids(filter.apply(&records)), vec![2, 3]);

        filter.followed_by = FollowedByFilter::parse("scout_one");
        assert_eq!(ids(filter.apply(&records)), vec![1]);

        assert_eq!(FollowedByFilter::parse(""), FollowedByFilter::Any);
    }

    #[test]
    fn test_dm_and_platform() {
        let records = records();
        let filter = ModelFilter {
            dm_sent: Some(false),
            platform: Some("OnlyFans".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records)), vec![3]);
        assert_eq!(filter.active_filter_count(), 2);
    }

    #[test]
    fn test_date_ranges_are_inclusive() {
        let records = records();
        let filter = ModelFilter {
            date_added: DateRange::new(day(2024, 1, 10), day(2024, 2, 1)),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records)), vec![1, 2]);

        let filter = ModelFilter {
            dm_sent_date: DateRange::new(day(2024, 1, 1), None),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&records)), vec![2]);
        assert_eq!(filter.active_filter_count(), 1);
    }

    #[test]
    fn test_clear_keeps_search() {
        let mut filter = ModelFilter {
            search: "alpha".into(),
            dm_sent: Some(true),
            follow_date: DateRange::new(day(2024, 1, 1), day(2024, 12, 31)),
            ..Default::default()
        };
        assert_eq!(filter.active_filter_count(), 3);

        filter.clear();
        assert_eq!(filter.active_filter_count(), 0);
        assert_eq!(filter.search, "alpha");
    }

    #[test]
    fn test_blacklist_search_covers_reason() {
        let entry = BlacklistDraft {
            link: "https://fansly.com/x".into(),
            platform: "Fansly".into(),
            reason: "Asked not to be contacted".into(),
            original_date_added: None,
        }
        .into_entry(1, Utc::now());
        let entries = vec![entry];

        assert_eq!(search_blacklist(&entries, "not to be").len(), 1);
        assert_eq!(search_blacklist(&entries, "").len(), 1);
        assert!(search_blacklist(&entries, "instagram").is_empty());
    }

    #[test]
    fn test_facets_sorted_and_distinct() {
        let facets = FilterFacets::collect(&records());
        assert_eq!(facets.platforms, vec!["Instagram", "OnlyFans", "TikTok"]);
        assert_eq!(facets.followed_by, vec!["scout_one"]);
    }
}
