pub mod call_tree;
pub mod callsite;
pub mod details;

pub use call_tree::{NodeRef, Tree, TreeError};
pub use callsite::{CallsiteId, CallsiteRecord, MERGED_NAME, Snapshot, UNRESOLVED};
pub use details::{FlamegraphDetails, NodeRendering};
