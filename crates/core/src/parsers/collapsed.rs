use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{CallsiteId, CallsiteRecord};

#[derive(Debug, Error)]
pub enum CollapsedParseError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("no valid stack lines found")]
    Empty,
}

struct TrieNode {
    name: Arc<str>,
    parent: Option<usize>,
    depth: u32,
    self_size: f64,
    total_size: f64,
    children: Vec<usize>,
}

fn heaviest_first(nodes: &mut [usize], trie: &[TrieNode]) {
    nodes.sort_by(|&a, &b| {
        trie[b]
            .total_size
            .total_cmp(&trie[a].total_size)
            .then_with(|| trie[a].name.cmp(&trie[b].name))
    });
}

/// Parse Brendan Gregg's collapsed/folded stack format into callsites.
///
/// Each line is `frame;frame;... count`. Identical call paths are merged into
/// one callsite; the count is added to the total of every frame on the path
/// and to the self size of the last one. Output is ordered by depth with
/// siblings heaviest first, and ids are output positions.
///
/// Used by: `perf script | stackcollapse-perf.pl`, dtrace, FlameGraph tools.
pub fn parse_collapsed(data: &[u8]) -> Result<Vec<CallsiteRecord>, CollapsedParseError> {
    let text = std::str::from_utf8(data)?;
    let mut trie: Vec<TrieNode> = Vec::new();
    let mut lookup: HashMap<(Option<usize>, &str), usize> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Split into stack and count: "a;b;c 42"
        let Some(pos) = line.rfind(' ') else {
            continue;
        };
        let count: f64 = line[pos + 1..].trim().parse().unwrap_or(1.0);
        let stack = line[..pos].trim();

        let mut parent: Option<usize> = None;
        for name in stack.split(';').map(str::trim).filter(|n| !n.is_empty()) {
            let node = match lookup.get(&(parent, name)) {
                Some(&node) => node,
                None => {
                    let node = trie.len();
                    let depth = parent.map_or(0, |p| trie[p].depth + 1);
                    trie.push(TrieNode {
                        name: Arc::from(name),
                        parent,
                        depth,
                        self_size: 0.0,
                        total_size: 0.0,
                        children: Vec::new(),
                    });
                    match parent {
                        Some(p) => trie[p].children.push(node),
                        None => roots.push(node),
                    }
                    lookup.insert((parent, name), node);
                    node
                }
            };
            trie[node].total_size += count;
            parent = Some(node);
        }
        if let Some(leaf) = parent {
            trie[leaf].self_size += count;
        }
    }

    if trie.is_empty() {
        return Err(CollapsedParseError::Empty);
    }

    // Breadth-first, one depth at a time.
    let mut order: Vec<usize> = Vec::with_capacity(trie.len());
    let mut level = roots;
    heaviest_first(&mut level, &trie);
    while !level.is_empty() {
        let mut next = Vec::new();
        for &node in &level {
            let mut children = trie[node].children.clone();
            heaviest_first(&mut children, &trie);
            next.extend(children);
        }
        order.extend(level);
        level = next;
    }

    let mut ids: Vec<CallsiteId> = vec![0; trie.len()];
    for (position, &node) in order.iter().enumerate() {
        ids[node] = position as CallsiteId;
    }

    Ok(order
        .into_iter()
        .map(|node| {
            let n = &trie[node];
            CallsiteRecord {
                id: ids[node],
                parent_id: n.parent.map(|p| ids[p]),
                depth: n.depth,
                name: Some(n.name.clone()),
                self_size: n.self_size,
                total_size: n.total_size,
                mapping: None,
                merged: false,
                highlighted: false,
            }
        })
        .collect())
}
