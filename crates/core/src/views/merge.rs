use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{CallsiteId, CallsiteRecord, MERGED_NAME};

/// Size below which a callsite would be narrower than `min_pixels` on a
/// canvas `width` pixels wide showing `total` in full.
pub fn min_visible_size(total: f64, width: f64, min_pixels: f64) -> f64 {
    if width <= 0.0 || min_pixels <= 0.0 {
        return 0.0;
    }
    total / width * min_pixels
}

/// Fold every non-root callsite with `total_size <= min_size` into one
/// `[merged]` node per parent.
///
/// The merged node takes the id of the first callsite folded into it and the
/// summed sizes of all of them. Children of folded callsites are re-parented
/// onto the merged node, where they are folded again if small, so a run of
/// tiny frames collapses to one merged node per depth. Totals are preserved.
pub fn merge_small_callsites(records: &[CallsiteRecord], min_size: f64) -> Vec<CallsiteRecord> {
    let mut out: Vec<CallsiteRecord> = Vec::with_capacity(records.len());
    // Original id -> position in `out` that now stands for it.
    let mut remap: HashMap<CallsiteId, usize> = HashMap::with_capacity(records.len());
    // Parent position in `out` -> its merged child.
    let mut merged_under: HashMap<usize, usize> = HashMap::new();

    for record in records {
        let parent = record.parent_id.and_then(|p| remap.get(&p).copied());
        let (parent_id, depth) = match parent {
            Some(p) => (Some(out[p].id), out[p].depth + 1),
            None => (record.parent_id, record.depth),
        };

        let small = parent.is_some() && record.total_size <= min_size;
        if let Some(p) = parent.filter(|_| small) {
            if let Some(&slot) = merged_under.get(&p) {
                let bucket = &mut out[slot];
                bucket.self_size += record.self_size;
                bucket.total_size += record.total_size;
                remap.insert(record.id, slot);
                continue;
            }
            let slot = out.len();
            out.push(CallsiteRecord {
                id: record.id,
                parent_id,
                depth,
                name: Some(Arc::from(MERGED_NAME)),
                self_size: record.self_size,
                total_size: record.total_size,
                mapping: None,
                merged: true,
                highlighted: false,
            });
            merged_under.insert(p, slot);
            remap.insert(record.id, slot);
            continue;
        }

        remap.insert(record.id, out.len());
        out.push(CallsiteRecord {
            parent_id,
            depth,
            ..record.clone()
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_and_thin() -> Vec<CallsiteRecord> {
        let main = CallsiteRecord::root(1, "main").with_sizes(0.0, 100.0);
        let big = CallsiteRecord::child_of(&main, 2, "big").with_sizes(90.0, 90.0);
        let t1 = CallsiteRecord::child_of(&main, 3, "t1").with_sizes(2.0, 4.0);
        let t2 = CallsiteRecord::child_of(&main, 4, "t2").with_sizes(6.0, 6.0);
        let t1a = CallsiteRecord::child_of(&t1, 5, "t1a").with_sizes(1.0, 1.0);
        let t1b = CallsiteRecord::child_of(&t1, 6, "t1b").with_sizes(1.0, 1.0);
        vec![main, big, t1, t2, t1a, t1b]
    }

    #[test]
    fn threshold_scales_with_width() {
        assert_eq!(min_visible_size(1000.0, 500.0, 1.0), 2.0);
        assert_eq!(min_visible_size(1000.0, 0.0, 1.0), 0.0);
        assert_eq!(min_visible_size(1000.0, 500.0, 0.0), 0.0);
    }

    #[test]
    fn zero_threshold_keeps_everything() {
        let input = wide_and_thin();
        assert_eq!(merge_small_callsites(&input, 0.0), input);
    }

    #[test]
    fn small_siblings_share_one_bucket() {
        let out = merge_small_callsites(&wide_and_thin(), 10.0);
        let names: Vec<_> = out.iter().map(CallsiteRecord::display_name).collect();
        assert_eq!(names, vec!["main", "big", MERGED_NAME, MERGED_NAME]);

        let bucket = &out[2];
        assert_eq!(bucket.id, 3);
        assert_eq!(bucket.parent_id, Some(1));
        assert!(bucket.merged);
        assert_eq!(bucket.total_size, 10.0);
        assert_eq!(bucket.self_size, 8.0);
    }

    #[test]
    fn children_of_folded_nodes_hang_off_the_bucket() {
        let out = merge_small_callsites(&wide_and_thin(), 10.0);
        let nested = &out[3];
        assert_eq!(nested.parent_id, Some(3));
        assert_eq!(nested.depth, 2);
        assert_eq!(nested.total_size, 2.0);
    }

    #[test]
    fn roots_are_never_merged() {
        let tiny_roots = vec![
            CallsiteRecord::root(1, "a").with_sizes(1.0, 1.0),
            CallsiteRecord::root(2, "b").with_sizes(1.0, 1.0),
        ];
        assert_eq!(merge_small_callsites(&tiny_roots, 5.0), tiny_roots);
    }

    #[test]
    fn root_total_is_preserved() {
        let input = wide_and_thin();
        let out = merge_small_callsites(&input, 10.0);
        let children_total: f64 = out
            .iter()
            .filter(|r| r.parent_id == Some(1))
            .map(|r| r.total_size)
            .sum();
        assert_eq!(children_total, 100.0);
    }
}
