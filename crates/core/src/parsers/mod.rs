pub mod collapsed;
pub mod json;

use thiserror::Error;

use crate::model::CallsiteRecord;

pub use collapsed::parse_collapsed;
pub use json::parse_callsite_json;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("collapsed: {0}")]
    Collapsed(#[from] collapsed::CollapsedParseError),
    #[error("json: {0}")]
    Json(#[from] json::JsonParseError),
}

/// Detect the input format and parse it into a callsite snapshot.
///
/// A document whose first non-blank byte is `[` is read as a JSON list of
/// callsite records; everything else as collapsed stacks.
pub fn parse_auto(data: &[u8]) -> Result<Vec<CallsiteRecord>, ParseError> {
    let first = data.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'[') {
        return Ok(parse_callsite_json(data)?);
    }
    Ok(parse_collapsed(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_json() {
        let data = br#"  [{"id": 0, "name": "main", "total_size": 5.0}]"#;
        let records = parse_auto(data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name(), "main");
    }

    #[test]
    fn falls_back_to_collapsed() {
        let records = parse_auto(b"main;foo 3\n").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn malformed_json_is_reported_as_json() {
        let err = parse_auto(b"[{\"id\": }]").unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }
}
