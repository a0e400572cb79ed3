use crate::model::CallsiteRecord;

/// Whether `record` matches a focus query: case-insensitive substring on the
/// name. Nameless records and the empty query never match.
pub fn highlight_matches(record: &CallsiteRecord, query: &str) -> bool {
    matches_lowered(record, &query.to_lowercase())
}

/// Copy `nodes` with `highlighted` recomputed for `query`.
///
/// Structure is untouched: same length, same order, same ids.
pub fn apply_highlight(nodes: &[CallsiteRecord], query: &str) -> Vec<CallsiteRecord> {
    let query = query.to_lowercase();
    nodes
        .iter()
        .map(|node| CallsiteRecord {
            highlighted: matches_lowered(node, &query),
            ..node.clone()
        })
        .collect()
}

fn matches_lowered(record: &CallsiteRecord, lowered_query: &str) -> bool {
    if lowered_query.is_empty() {
        return false;
    }
    record
        .name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(lowered_query))
}
