use thiserror::Error;

use crate::model::{CallsiteId, CallsiteRecord, Tree, TreeError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// The expanded id does not exist in this snapshot, usually because it
    /// was picked on an older one. Callers fall back to the full view.
    #[error("callsite {0} not found in snapshot")]
    CallsiteNotFound(CallsiteId),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Zoom a snapshot to one callsite.
///
/// With `None` the snapshot is returned as given. With `Some(id)` the result
/// is the ancestor chain of `id` (root first, sizes untouched) followed by
/// the subtree rooted at `id`. Sibling branches of the ancestors are dropped.
pub fn expand(
    snapshot: &[CallsiteRecord],
    expanded: Option<CallsiteId>,
) -> Result<Vec<CallsiteRecord>, ExpandError> {
    let Some(id) = expanded else {
        return Ok(snapshot.to_vec());
    };
    let tree = Tree::build(snapshot)?;
    expand_tree(&tree, Some(id))
}

/// [`expand`] over an already built tree.
///
/// Costs the size of the returned subtree and the depth of the ancestor
/// chain, independent of the rest of the snapshot. Input that is not in
/// level order adds a sort of the subtree.
pub fn expand_tree(
    tree: &Tree,
    expanded: Option<CallsiteId>,
) -> Result<Vec<CallsiteRecord>, ExpandError> {
    let Some(id) = expanded else {
        return Ok(tree.records().to_vec());
    };
    let node = tree.get(id).ok_or(ExpandError::CallsiteNotFound(id))?;

    let mut ancestors: Vec<_> = tree.ancestors(node).collect();
    ancestors.reverse();

    // Input order is the left-to-right placement upstream chose. Level-order
    // input gets it from a breadth-first walk; anything else is sorted back.
    let subtree = if tree.is_level_order() {
        tree.breadth_first(node)
    } else {
        let mut subtree = tree.descendants(node);
        subtree.sort_unstable();
        subtree
    };

    Ok(ancestors
        .into_iter()
        .chain(subtree)
        .map(|n| tree.record(n).clone())
        .collect())
}
