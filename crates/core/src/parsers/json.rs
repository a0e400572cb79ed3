use thiserror::Error;

use crate::model::CallsiteRecord;

#[derive(Debug, Error)]
pub enum JsonParseError {
    #[error("invalid callsite list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a JSON array of callsite records, e.g. exported from a trace
/// processor query. Ordering is validated later by the tree builder.
pub fn parse_callsite_json(data: &[u8]) -> Result<Vec<CallsiteRecord>, JsonParseError> {
    Ok(serde_json::from_slice(data)?)
}
