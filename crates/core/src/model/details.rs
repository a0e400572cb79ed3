use calltree_protocol::ValueUnit;
use serde::{Deserialize, Serialize};

use super::callsite::{CallsiteRecord, Snapshot};

/// One tick of upstream data for the profile panel.
///
/// `flamegraph` is `None` while the query backing the panel is still running;
/// `expanded_callsite` carries an expansion chosen elsewhere (e.g. restored
/// from a permalink).
#[derive(Debug, Clone, Default)]
pub struct FlamegraphDetails {
    /// Profile name, conventionally `p<pid>_t<tid>`.
    pub name: Option<String>,
    pub flamegraph: Option<Snapshot>,
    pub expanded_callsite: Option<CallsiteRecord>,
    pub value_unit: ValueUnit,
}

impl FlamegraphDetails {
    pub fn new(name: impl Into<String>, flamegraph: Snapshot) -> Self {
        Self {
            name: Some(name.into()),
            flamegraph: Some(flamegraph),
            expanded_callsite: None,
            value_unit: ValueUnit::default(),
        }
    }

    pub fn with_unit(mut self, value_unit: ValueUnit) -> Self {
        self.value_unit = value_unit;
        self
    }
}

/// Column labels for the two size metrics of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRendering {
    pub self_size: String,
    pub total_size: String,
}

impl NodeRendering {
    /// `{"Self", "Total"}`, the labelling used for CPU and heap profiles.
    pub fn self_and_total() -> Self {
        Self {
            self_size: "Self".to_string(),
            total_size: "Total".to_string(),
        }
    }
}

impl Default for NodeRendering {
    fn default() -> Self {
        Self::self_and_total()
    }
}
