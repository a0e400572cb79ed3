pub mod expand;
pub mod flamegraph;
pub mod highlight;
pub mod merge;

pub use expand::{ExpandError, expand, expand_tree};
pub use flamegraph::FlamegraphLayout;
pub use highlight::{apply_highlight, highlight_matches};
pub use merge::{merge_small_callsites, min_visible_size};
