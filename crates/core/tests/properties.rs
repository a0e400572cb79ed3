//! Property tests for expansion and highlighting over random call trees.

use std::collections::HashSet;

use calltree_core::model::{CallsiteId, CallsiteRecord, Tree};
use calltree_core::views::{ExpandError, apply_highlight, expand};
use proptest::prelude::*;
use proptest::sample::Index;

const NAMES: &[&str] = &["main", "DoWork", "do_work_inner", "malloc", "Foo::bar", "ÄÖÜ"];

/// Parent-before-child snapshots with sparse ids and consistent totals.
fn snapshot() -> impl Strategy<Value = Vec<CallsiteRecord>> {
    prop::collection::vec(
        (
            any::<bool>(),
            any::<Index>(),
            0u32..50,
            prop::option::weighted(0.9, prop::sample::select(NAMES)),
        ),
        1..40,
    )
    .prop_map(|rows| {
        let mut records: Vec<CallsiteRecord> = Vec::with_capacity(rows.len());
        for (i, (nested, parent, self_size, name)) in rows.into_iter().enumerate() {
            let parent = (i > 0 && nested).then(|| parent.index(i));
            let mut record = CallsiteRecord::root(i as CallsiteId * 3 + 7, "");
            record.name = name.map(Into::into);
            record.self_size = f64::from(self_size);
            if let Some(p) = parent {
                record.parent_id = Some(records[p].id);
                record.depth = records[p].depth + 1;
            }
            records.push(record);
        }
        // Children always follow their parent, so one reverse pass suffices.
        for record in &mut records {
            record.total_size = record.self_size;
        }
        for i in (0..records.len()).rev() {
            if let Some(pid) = records[i].parent_id {
                let total = records[i].total_size;
                if let Some(parent) = records.iter_mut().find(|r| r.id == pid) {
                    parent.total_size += total;
                }
            }
        }
        records
    })
}

fn ancestor_ids(records: &[CallsiteRecord], id: CallsiteId) -> Vec<CallsiteId> {
    let by_id = |id| records.iter().find(|r: &&CallsiteRecord| r.id == id);
    std::iter::successors(by_id(id).and_then(|r| r.parent_id), |&pid| {
        by_id(pid).and_then(|r| r.parent_id)
    })
    .collect()
}

proptest! {
    #[test]
    fn collapse_is_identity(records in snapshot()) {
        prop_assert_eq!(expand(&records, None).unwrap(), records);
    }

    #[test]
    fn expansion_keeps_exactly_path_and_subtree(records in snapshot(), pick in any::<Index>()) {
        let target = records[pick.index(records.len())].id;
        let out = expand(&records, Some(target)).unwrap();

        let ancestors = ancestor_ids(&records, target);
        let subtree: Vec<_> = records
            .iter()
            .filter(|r| r.id == target || ancestor_ids(&records, r.id).contains(&target))
            .collect();

        prop_assert_eq!(out.len(), ancestors.len() + subtree.len());
        for id in &ancestors {
            prop_assert_eq!(out.iter().filter(|r| r.id == *id).count(), 1);
        }
        for record in &subtree {
            prop_assert!(out.contains(record));
        }
        for record in &out {
            prop_assert!(records.contains(record));
        }
        prop_assert!(Tree::build(&out).is_ok());
    }

    #[test]
    fn expansion_is_deterministic(records in snapshot(), pick in any::<Index>()) {
        let target = records[pick.index(records.len())].id;
        prop_assert_eq!(
            expand(&records, Some(target)).unwrap(),
            expand(&records, Some(target)).unwrap()
        );
    }

    #[test]
    fn unknown_id_is_rejected(records in snapshot()) {
        let known: HashSet<_> = records.iter().map(|r| r.id).collect();
        let unknown = (0..).find(|id| !known.contains(id)).unwrap();
        prop_assert_eq!(
            expand(&records, Some(unknown)).unwrap_err(),
            ExpandError::CallsiteNotFound(unknown)
        );
    }

    #[test]
    fn highlight_only_flips_flags(records in snapshot(), query in "[a-zA-Z]{0,4}") {
        let out = apply_highlight(&records, &query);
        prop_assert_eq!(out.len(), records.len());
        for (before, after) in records.iter().zip(&out) {
            prop_assert_eq!(
                &CallsiteRecord { highlighted: false, ..after.clone() },
                before
            );
            let expected = !query.is_empty()
                && before
                    .name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&query.to_lowercase()));
            prop_assert_eq!(after.highlighted, expected);
        }
    }
}
