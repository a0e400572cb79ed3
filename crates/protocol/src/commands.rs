use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The flamegraph layout emits a `Vec<RenderCommand>` per paint. Renderers
/// consume the list in order; each command carries everything it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Filled rectangle for one callsite. `frame_id` is the callsite id the
    /// rectangle belongs to, so renderers can map pointer positions back.
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        label: Option<Arc<str>>,
        frame_id: Option<u64>,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: Arc<str>,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Begin a logical group (the flamegraph body, the header).
    BeginGroup {
        id: Arc<str>,
        label: Option<Arc<str>>,
    },

    /// End the current group.
    EndGroup,
}

impl RenderCommand {
    /// The callsite id carried by a `DrawRect`, if any.
    pub fn frame_id(&self) -> Option<u64> {
        match self {
            Self::DrawRect { frame_id, .. } => *frame_id,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_id_only_on_rects() {
        let rect = RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            color: ThemeToken::FlameHot,
            border_color: None,
            label: Some("main".into()),
            frame_id: Some(7),
        };
        assert_eq!(rect.frame_id(), Some(7));
        assert_eq!(RenderCommand::EndGroup.frame_id(), None);
    }

    #[test]
    fn serializes_with_plain_string_labels() {
        let cmd = RenderCommand::BeginGroup {
            id: "flamegraph".into(),
            label: None,
        };
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        assert_eq!(json, r#"{"BeginGroup":{"id":"flamegraph","label":null}}"#);
    }
}
