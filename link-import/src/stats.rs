//! Dashboard counters

use outreach_core::CandidateRecord;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub total_models: usize,
    /// Records with a follow date
    pub total_follows: usize,
    pub total_dms: usize,
    pub platform_breakdown: BTreeMap<String, usize>,
}

impl ModelStats {
    pub fn compute(records: &[CandidateRecord]) -> Self {
        let mut stats = Self {
            total_models: records.len(),
            ..Default::default()
        };

        for record in records {
            if record.follow_date.is_some() {
                stats.total_follows += 1;
            }
            if record.dm_sent {
                stats.total_dms += 1;
            }
            *stats.platform_breakdown.entry(record.platform.clone()).or_default() += 1;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_core::{ModelDraft, Utc};

    #[test]
    fn test_compute() {
        let now = Utc::now();
        let mut a = ModelDraft::new("https://instagram.com/a", "Instagram").into_record(1, now);
        a.follow_date = Some(now);
        let mut b = ModelDraft::new("https://instagram.com/b", "Instagram").into_record(2, now);
        b.dm_sent = true;
        let c = ModelDraft::new("https://tiktok.com/@c", "TikTok").into_record(3, now);

        let stats = ModelStats::compute(&[a, b, c]);
        assert_eq!(stats.total_models, 3);
        assert_eq!(stats.total_follows, 1);
        assert_eq!(stats.total_dms, 1);
        assert_eq!(stats.platform_breakdown["Instagram"], 2);
        assert_eq!(stats.platform_breakdown["TikTok"], 1);
    }

    #[test]
    fn test_empty() {
        assert_eq!(ModelStats::compute(&[]), ModelStats::default());
    }
}
