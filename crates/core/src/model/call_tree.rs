use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tracing::{error, warn};

use super::callsite::{CallsiteId, CallsiteRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A record names a parent that has not appeared earlier in the sequence.
    #[error("callsite {id} appears before its parent {parent}")]
    InvalidOrdering { id: CallsiteId, parent: CallsiteId },
    #[error("callsite id {0} appears more than once")]
    DuplicateId(CallsiteId),
}

/// Handle to a node of a [`Tree`]; the node's position in the input sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

/// Parent→children index over a flat snapshot.
///
/// Records keep their input positions, so a [`NodeRef`] doubles as an index
/// into [`Tree::records`]. Children are listed in input order.
#[derive(Debug, Clone)]
pub struct Tree {
    records: Vec<CallsiteRecord>,
    nodes: Vec<TreeNode>,
    index: HashMap<CallsiteId, NodeRef>,
    roots: Vec<NodeRef>,
    level_order: bool,
}

impl Tree {
    /// Build the tree in one pass over a parent-before-child sequence.
    pub fn build(snapshot: &[CallsiteRecord]) -> Result<Self, TreeError> {
        let mut nodes: Vec<TreeNode> = Vec::with_capacity(snapshot.len());
        let mut index: HashMap<CallsiteId, NodeRef> = HashMap::with_capacity(snapshot.len());
        let mut roots = Vec::new();

        for (pos, record) in snapshot.iter().enumerate() {
            let this = NodeRef(pos);
            let parent = match record.parent_id {
                None => {
                    roots.push(this);
                    None
                }
                Some(parent_id) => {
                    let Some(&parent) = index.get(&parent_id) else {
                        error!(id = record.id, parent = parent_id, "callsite precedes its parent");
                        return Err(TreeError::InvalidOrdering {
                            id: record.id,
                            parent: parent_id,
                        });
                    };
                    let parent_depth = snapshot[parent.0].depth;
                    if record.depth != parent_depth + 1 {
                        warn!(
                            id = record.id,
                            depth = record.depth,
                            parent_depth,
                            "callsite depth does not follow its parent"
                        );
                    }
                    nodes[parent.0].children.push(this);
                    Some(parent)
                }
            };
            if index.insert(record.id, this).is_some() {
                error!(id = record.id, "duplicate callsite id");
                return Err(TreeError::DuplicateId(record.id));
            }
            nodes.push(TreeNode {
                parent,
                children: Vec::new(),
            });
        }

        let mut tree = Self {
            records: snapshot.to_vec(),
            nodes,
            index,
            roots,
            level_order: false,
        };
        tree.level_order = tree.check_level_order();
        Ok(tree)
    }

    /// Whether the input lists every depth in full before the next, with
    /// children in the order of their parents.
    fn check_level_order(&self) -> bool {
        let mut expected = 0;
        let mut queue: VecDeque<NodeRef> = self.roots.iter().copied().collect();
        while let Some(n) = queue.pop_front() {
            if n.0 != expected {
                return false;
            }
            expected += 1;
            queue.extend(self.children(n));
        }
        true
    }

    pub fn roots(&self) -> &[NodeRef] {
        &self.roots
    }

    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        &self.nodes[node.0].children
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes[node.0].parent
    }

    pub fn record(&self, node: NodeRef) -> &CallsiteRecord {
        &self.records[node.0]
    }

    /// Records in their original input order.
    pub fn records(&self) -> &[CallsiteRecord] {
        &self.records
    }

    pub fn get(&self, id: CallsiteId) -> Option<NodeRef> {
        self.index.get(&id).copied()
    }

    /// Ancestors of `node`, nearest first, excluding `node` itself.
    pub fn ancestors(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        std::iter::successors(self.parent(node), |&n| self.parent(n))
    }

    /// `node` and everything below it, in preorder.
    pub fn descendants(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// `node` and everything below it, breadth first with children in input
    /// order.
    pub fn breadth_first(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = vec![node];
        let mut next = 0;
        while let Some(&n) = out.get(next) {
            out.extend(self.children(n));
            next += 1;
        }
        out
    }

    /// True when the records are in breadth-first order. Subtrees then list
    /// in input order under [`breadth_first`](Self::breadth_first).
    pub fn is_level_order(&self) -> bool {
        self.level_order
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_depth(&self) -> u32 {
        self.records.iter().map(|r| r.depth).max().unwrap_or(0)
    }

    /// Sum of the roots' total sizes.
    pub fn total_size(&self) -> f64 {
        self.roots.iter().map(|&r| self.record(r).total_size).sum()
    }
}
