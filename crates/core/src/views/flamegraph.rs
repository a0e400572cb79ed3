use std::collections::HashMap;
use std::sync::Arc;

use calltree_protocol::{Rect, RenderCommand, ThemeToken, ValueUnit};

use crate::model::{CallsiteId, CallsiteRecord, NodeRendering};

/// Rectangles narrower than this are not painted.
const MIN_PAINT_WIDTH: f64 = 0.5;

/// Pixel placement of a visible node sequence, plus hit-testing against it.
///
/// Placement is only valid for the exact sequence it was computed from;
/// recompute whenever the nodes, the width or the expansion change.
#[derive(Debug, Clone, Default)]
pub struct FlamegraphLayout {
    nodes: Vec<CallsiteRecord>,
    rects: Vec<Rect>,
    index: HashMap<CallsiteId, usize>,
    expanded: Option<CallsiteId>,
    node_height: f64,
    height: f64,
}

impl FlamegraphLayout {
    /// Lay `nodes` out left to right in input order.
    ///
    /// Widths are proportional to `total_size`. When `expanded` names a
    /// visible node its total spans the full width and its ancestors are
    /// clamped to the canvas; otherwise the roots share the width.
    pub fn compute(
        nodes: &[CallsiteRecord],
        width: f64,
        header_offset: f64,
        node_height: f64,
        expanded: Option<CallsiteId>,
    ) -> Self {
        let index: HashMap<CallsiteId, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

        let expanded_total = expanded
            .and_then(|id| index.get(&id))
            .map(|&i| nodes[i].total_size)
            .filter(|total| *total > 0.0);
        let basis = expanded_total.unwrap_or_else(|| {
            nodes
                .iter()
                .filter(|n| n.parent_id.is_none_or(|p| !index.contains_key(&p)))
                .map(|n| n.total_size)
                .sum()
        });
        let scale = if basis > 0.0 { width / basis } else { 0.0 };

        let mut rects = Vec::with_capacity(nodes.len());
        // Next free x inside each placed node, keyed by position.
        let mut cursors: Vec<f64> = Vec::with_capacity(nodes.len());
        let mut root_cursor = 0.0;

        for node in nodes {
            let w = (node.total_size * scale).min(width).max(0.0);
            let parent = node.parent_id.and_then(|p| index.get(&p).copied());
            let x = match parent {
                Some(p) if p < cursors.len() => {
                    let x = cursors[p];
                    cursors[p] += w;
                    x
                }
                _ => {
                    let x = root_cursor;
                    root_cursor += w;
                    x
                }
            };
            let y = header_offset + f64::from(node.depth) * node_height;
            rects.push(Rect::new(x, y, w, node_height));
            cursors.push(x);
        }

        let height = nodes
            .iter()
            .map(|n| n.depth)
            .max()
            .map_or(0.0, |d| f64::from(d + 1) * node_height);

        Self {
            nodes: nodes.to_vec(),
            rects,
            index,
            expanded,
            node_height,
            height,
        }
    }

    /// Height of the flamegraph body, excluding any header offset.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn node_height(&self) -> f64 {
        self.node_height
    }

    pub fn nodes(&self) -> &[CallsiteRecord] {
        &self.nodes
    }

    pub fn rect(&self, id: CallsiteId) -> Option<Rect> {
        self.index.get(&id).map(|&i| self.rects[i])
    }

    pub fn node(&self, id: CallsiteId) -> Option<&CallsiteRecord> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// The callsite under `(x, y)`, if any.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<CallsiteId> {
        self.rects
            .iter()
            .position(|r| r.w > 0.0 && r.contains(x, y))
            .map(|i| self.nodes[i].id)
    }

    pub fn render(&self, hovered: Option<CallsiteId>) -> Vec<RenderCommand> {
        let mut commands = Vec::with_capacity(self.nodes.len() + 2);
        commands.push(RenderCommand::BeginGroup {
            id: "flamegraph".into(),
            label: Some("Flamegraph".into()),
        });

        for (node, rect) in self.nodes.iter().zip(&self.rects) {
            if rect.w < MIN_PAINT_WIDTH {
                continue;
            }
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(rect.x, rect.y, rect.w, rect.h - 1.0),
                color: self.color_for(node, hovered),
                border_color: Some(ThemeToken::Border),
                label: Some(Arc::from(node.display_name())),
                frame_id: Some(node.id),
            });
        }

        commands.push(RenderCommand::EndGroup);
        commands
    }

    /// Tooltip lines for a node: name, the two labelled sizes, then mapping.
    pub fn tooltip(
        &self,
        id: CallsiteId,
        rendering: &NodeRendering,
        unit: ValueUnit,
    ) -> Option<Vec<String>> {
        let node = self.node(id)?;
        let mut lines = vec![
            node.display_name().to_string(),
            format!("{}: {}", rendering.self_size, unit.format_value(node.self_size)),
            format!("{}: {}", rendering.total_size, unit.format_value(node.total_size)),
        ];
        if let Some(mapping) = &node.mapping {
            lines.push(format!("Mapping: {mapping}"));
        }
        Some(lines)
    }

    fn color_for(&self, node: &CallsiteRecord, hovered: Option<CallsiteId>) -> ThemeToken {
        if node.highlighted {
            ThemeToken::SearchHighlight
        } else if hovered == Some(node.id) {
            ThemeToken::HoverHighlight
        } else if self.expanded == Some(node.id) {
            ThemeToken::SelectionHighlight
        } else if node.merged {
            ThemeToken::FlameNeutral
        } else {
            match node.depth % 3 {
                0 => ThemeToken::FlameHot,
                1 => ThemeToken::FlameWarm,
                _ => ThemeToken::FlameCold,
            }
        }
    }
}
