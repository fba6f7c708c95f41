// Property: the SQLite store and the in-memory store are interchangeable.
// For any interleaving of creates, deletes and DM toggles, both backends hold
// the same records (by id and link), assign unique ids, and report a count
// equal to the number of rows returned by `get_all`.

use chrono::Utc;
use data_access::{DatabaseManager, InMemoryModelRepository, ModelRepository};
use outreach_core::*;
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Create(String),
    /// Delete the n-th currently live record (modulo the live count)
    Delete(usize),
    /// Toggle DM on the n-th currently live record
    Dm(usize, bool),
}

fn arb_link() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("https://instagram.com/alpha".to_string()),
        Just("https://www.tiktok.com/@beta".to_string()),
        Just("https://onlyfans.com/gamma".to_string()),
        "https://[a-z]{3,8}\\.com/[a-z]{1,8}",
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_link().prop_map(Op::Create),
        1 => any::<usize>().prop_map(Op::Delete),
        1 => (any::<usize>(), any::<bool>()).prop_map(|(i, b)| Op::Dm(i, b)),
    ]
}

async fn apply(repo: &dyn ModelRepository, op: &Op) {
    match op {
        Op::Create(link) => {
            repo.create(ModelDraft::new(link.clone(), "Other")).await.unwrap();
        }
        Op::Delete(n) => {
            let all = repo.get_all().await.unwrap();
            if !all.is_empty() {
                let target = &all[n % all.len()];
                repo.delete(target.id).await.unwrap();
            }
        }
        Op::Dm(n, sent) => {
            let all = repo.get_all().await.unwrap();
            if !all.is_empty() {
                let target = &all[n % all.len()];
                repo.update(target.id, ModelPatch::set_dm_sent(*sent, Utc::now()))
                    .await
                    .unwrap();
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_backends_agree(ops in prop::collection::vec(arb_op(), 0..30)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let db = DatabaseManager::in_memory().await.unwrap();
            let sqlite = db.model_repository();
            let memory = InMemoryModelRepository::new();

            for op in &ops {
                apply(&sqlite, op).await;
                apply(&memory, op).await;
            }

            let from_sqlite = sqlite.get_all().await.unwrap();
            let from_memory = memory.get_all().await.unwrap();

            // Same rows in the same (newest first) order
            let key = |r: &CandidateRecord| (r.id, r.link.clone(), r.dm_sent, r.dm_sent_date.is_some());
            assert_eq!(
                from_sqlite.iter().map(key).collect::<Vec<_>>(),
                from_memory.iter().map(key).collect::<Vec<_>>()
            );

            // Unique ids
            let ids: HashSet<_> = from_sqlite.iter().map(|r| r.id).collect();
            assert_eq!(ids.len(), from_sqlite.len());

            // Count agrees with listing
            assert_eq!(sqlite.count().await.unwrap(), from_sqlite.len());
            assert_eq!(memory.count().await.unwrap(), from_memory.len());
        });
    }
}
