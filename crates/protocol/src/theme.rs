use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    FlameHot,
    FlameWarm,
    FlameCold,
    FlameNeutral,

    TextPrimary,
    TextSecondary,
    TextMuted,

    SelectionHighlight,
    HoverHighlight,
    SearchHighlight,

    Background,
    Surface,
    Border,

    PanelHeaderBackground,
    PanelHeaderText,
}
