use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use calltree_protocol::{Point, RenderCommand, TextAlign, ThemeToken, ValueUnit};
use regex::Regex;
use tracing::{debug, error, warn};

use crate::config::PanelConfig;
use crate::debounce::Debouncer;
use crate::model::{CallsiteId, CallsiteRecord, FlamegraphDetails, Snapshot, Tree};
use crate::views::expand::{ExpandError, expand_tree};
use crate::views::flamegraph::FlamegraphLayout;
use crate::views::highlight::apply_highlight;
use crate::views::merge::{merge_small_callsites, min_visible_size};

/// Heading shown while no profile is selected or after a failed build.
pub const PLACEHOLDER_HEADING: &str = "Function Profile";

const HEADER_FONT_SIZE: f64 = 12.0;

static TITLE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"p([0-9]*)_t([0-9]*)").ok());

/// What the panel currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelView<'a> {
    Placeholder {
        heading: &'static str,
    },
    Flamegraph {
        title: String,
        /// Label of the expanded callsite, `"(none)"` when not expanded.
        selected: String,
        /// Total panel height: flamegraph body plus header.
        height: f64,
        nodes: &'a [CallsiteRecord],
    },
}

/// How often each stage of the pipeline actually ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Expansion (and merging) recomputed.
    pub full_runs: u64,
    /// Highlight pass recomputed.
    pub highlight_runs: u64,
    /// Refresh requests answered by the cached expansion.
    pub cache_hits: u64,
}

/// Single-slot cache of the last expansion, keyed by its inputs.
#[derive(Debug)]
struct CachedExpansion {
    snapshot: Snapshot,
    expanded: Option<CallsiteId>,
    merge_threshold: f64,
    nodes: Vec<CallsiteRecord>,
}

#[derive(Debug)]
struct LoadedTree {
    snapshot: Snapshot,
    tree: Tree,
}

/// State and event dispatch for the flamegraph detail panel.
///
/// Owns the expansion and the focus query. Every pointer, keyboard and data
/// event goes through one of the `on_*` methods, which rerun only the stages
/// whose inputs changed: expansion when the snapshot or the expanded callsite
/// changes, highlighting when the nodes or the query change.
#[derive(Debug)]
pub struct ProfilePanel {
    config: PanelConfig,
    details: Option<FlamegraphDetails>,
    loaded: Option<LoadedTree>,
    error: Option<String>,
    expanded: Option<CallsiteId>,
    focus_query: String,
    debounce: Debouncer,
    cache: Option<CachedExpansion>,
    visible: Vec<CallsiteRecord>,
    layout: FlamegraphLayout,
    width: f64,
    hovered: Option<CallsiteId>,
    stats: PipelineStats,
}

impl ProfilePanel {
    pub fn new(config: PanelConfig) -> Self {
        let debounce = Debouncer::new(config.debounce());
        Self {
            config,
            details: None,
            loaded: None,
            error: None,
            expanded: None,
            focus_query: String::new(),
            debounce,
            cache: None,
            visible: Vec::new(),
            layout: FlamegraphLayout::default(),
            width: 0.0,
            hovered: None,
            stats: PipelineStats::default(),
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Apply one tick of upstream data.
    ///
    /// Re-delivering the same snapshot with the same expansion is a cache
    /// hit. An expansion carried by the tick replaces the current one, on the
    /// same snapshot or on a new one.
    pub fn update(&mut self, details: Option<FlamegraphDetails>) {
        let Some(details) = details else {
            self.details = None;
            self.clear_snapshot();
            return;
        };

        let incoming = details.flamegraph.clone();
        let requested = details.expanded_callsite.as_ref().map(|c| c.id);
        let same = match (&incoming, &self.loaded) {
            (Some(new), Some(loaded)) => new.same(&loaded.snapshot),
            _ => false,
        };
        self.details = Some(details);

        match incoming {
            Some(_) if same => {
                if requested.is_some() && requested != self.expanded {
                    self.on_node_activated(requested);
                } else {
                    self.refresh();
                }
            }
            Some(snapshot) => self.load_snapshot(snapshot, requested),
            None => self.clear_snapshot(),
        }
    }

    /// New data invalidates the expansion; rebuild everything.
    pub fn on_snapshot_replaced(&mut self, snapshot: Snapshot) {
        self.load_snapshot(snapshot, None);
    }

    fn load_snapshot(&mut self, snapshot: Snapshot, expanded: Option<CallsiteId>) {
        self.expanded = None;
        self.hovered = None;
        self.cache = None;
        match Tree::build(&snapshot) {
            Ok(tree) => {
                debug!(
                    callsites = tree.len(),
                    level_order = tree.is_level_order(),
                    "snapshot loaded"
                );
                self.loaded = Some(LoadedTree { snapshot, tree });
                self.error = None;
                self.expanded = expanded;
            }
            Err(e) => {
                error!(error = %e, "rejecting snapshot");
                self.loaded = None;
                self.error = Some(e.to_string());
            }
        }
        self.refresh();
    }

    /// React to the callsite reported under the pointer: expand it, or
    /// return to the overview when nothing was hit.
    pub fn on_node_activated(&mut self, node: Option<CallsiteId>) {
        self.expanded = node;
        self.refresh();
    }

    /// Hit-test a click and expand whatever is under it. Returns whether the
    /// expansion changed.
    pub fn on_click(&mut self, x: f64, y: f64) -> bool {
        let hit = self.layout.hit_test(x, y);
        let changed = hit != self.expanded;
        self.on_node_activated(hit);
        changed
    }

    /// Track the hovered callsite. Returns whether it changed.
    pub fn on_mouse_move(&mut self, x: f64, y: f64) -> bool {
        let hit = self.layout.hit_test(x, y);
        let changed = hit != self.hovered;
        self.hovered = hit;
        changed
    }

    pub fn on_mouse_out(&mut self) {
        self.hovered = None;
    }

    /// Store the query now; highlighting follows once typing pauses.
    pub fn on_focus_query_changed(&mut self, text: impl Into<String>, now: Instant) {
        self.focus_query = text.into();
        let generation = self.debounce.schedule(now);
        debug!(generation, delay = ?self.debounce.delay(), "focus query scheduled");
    }

    /// Run the deferred highlight pass if it is due. Returns whether the
    /// visible nodes changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debounce.fire(now) {
            Some(generation) if self.debounce.is_current(generation) => {
                self.highlight_pass();
                true
            }
            Some(generation) => {
                debug!(generation, "superseded focus query dropped");
                false
            }
            None => false,
        }
    }

    /// Whether a focus-query edit is still waiting for its highlight pass.
    pub fn highlight_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// How long the event loop may sleep before [`tick`](Self::tick) has
    /// work to do.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.debounce.remaining(now)
    }

    /// Drop the expansion, e.g. when navigating away.
    pub fn reset(&mut self) {
        self.on_node_activated(None);
    }

    /// Set the canvas width used for layout and merging.
    pub fn set_width(&mut self, width: f64) {
        if (width - self.width).abs() < f64::EPSILON {
            return;
        }
        self.width = width;
        if self.config.merge_min_pixels > 0.0 {
            self.refresh();
        } else {
            self.relayout();
        }
    }

    pub fn expanded(&self) -> Option<CallsiteId> {
        self.expanded
    }

    pub fn hovered(&self) -> Option<CallsiteId> {
        self.hovered
    }

    pub fn focus_query(&self) -> &str {
        &self.focus_query
    }

    /// The nodes handed to the renderer, highlighting applied.
    pub fn visible_nodes(&self) -> &[CallsiteRecord] {
        &self.visible
    }

    pub fn layout(&self) -> &FlamegraphLayout {
        &self.layout
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn value_unit(&self) -> ValueUnit {
        self.details
            .as_ref()
            .map(|d| d.value_unit)
            .unwrap_or_default()
    }

    /// `"Process: <pid> Thread: <tid>"` for names like `p12_t34`.
    pub fn title(&self) -> String {
        let name = self.details.as_ref().and_then(|d| d.name.as_deref());
        name.and_then(|name| {
            let captures = TITLE_PATTERN.as_ref()?.captures(name)?;
            Some(format!("Process: {} Thread: {}", &captures[1], &captures[2]))
        })
        .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn selected_label(&self) -> String {
        self.expanded
            .and_then(|id| {
                let loaded = self.loaded.as_ref()?;
                let node = loaded.tree.get(id)?;
                loaded.tree.record(node).name.as_deref().map(str::to_string)
            })
            .unwrap_or_else(|| "(none)".to_string())
    }

    pub fn tooltip(&self) -> Option<Vec<String>> {
        let id = self.hovered?;
        self.layout
            .tooltip(id, &self.config.rendering, self.value_unit())
    }

    pub fn view(&self) -> PanelView<'_> {
        if self.details.is_none() || self.error.is_some() {
            return PanelView::Placeholder {
                heading: PLACEHOLDER_HEADING,
            };
        }
        let height = if self.loaded.is_some() {
            self.layout.height() + self.config.header_height
        } else {
            0.0
        };
        PanelView::Flamegraph {
            title: self.title(),
            selected: self.selected_label(),
            height,
            nodes: &self.visible,
        }
    }

    /// Heading plus flamegraph as render commands for a canvas `width` wide.
    pub fn render(&mut self, width: f64) -> Vec<RenderCommand> {
        self.set_width(width);
        let mut commands = vec![RenderCommand::BeginGroup {
            id: "header".into(),
            label: None,
        }];
        match self.view() {
            PanelView::Placeholder { heading } => {
                commands.push(header_text(4.0, heading.to_string(), TextAlign::Left));
                commands.push(RenderCommand::EndGroup);
            }
            PanelView::Flamegraph {
                title, selected, ..
            } => {
                commands.push(header_text(4.0, title, TextAlign::Left));
                commands.push(header_text(
                    width - 4.0,
                    format!("Selected function: {selected}"),
                    TextAlign::Right,
                ));
                commands.push(RenderCommand::EndGroup);
                commands.extend(self.layout.render(self.hovered));
            }
        }
        commands
    }

    fn clear_snapshot(&mut self) {
        self.loaded = None;
        self.error = None;
        self.expanded = None;
        self.hovered = None;
        self.cache = None;
        self.debounce.cancel();
        self.visible.clear();
        self.layout = FlamegraphLayout::default();
    }

    /// Rerun expansion (unless cached) and then highlighting.
    fn refresh(&mut self) {
        let Some(loaded) = &self.loaded else {
            self.cache = None;
            self.visible.clear();
            self.layout = FlamegraphLayout::default();
            return;
        };

        let threshold = self.merge_threshold(&loaded.tree);
        if let Some(cache) = &self.cache
            && cache.snapshot.same(&loaded.snapshot)
            && cache.expanded == self.expanded
            && cache.merge_threshold == threshold
        {
            self.stats.cache_hits += 1;
            debug!(expanded = ?self.expanded, "expansion cache hit");
            return;
        }

        let expanded = match expand_tree(&loaded.tree, self.expanded) {
            Ok(nodes) => nodes,
            Err(ExpandError::CallsiteNotFound(id)) => {
                warn!(id, "expanded callsite not in snapshot, showing full view");
                self.expanded = None;
                loaded.tree.records().to_vec()
            }
            Err(e) => {
                error!(error = %e, "expansion failed");
                self.error = Some(e.to_string());
                self.visible.clear();
                self.layout = FlamegraphLayout::default();
                return;
            }
        };
        let threshold = self.merge_threshold(&loaded.tree);
        let nodes = if threshold > 0.0 {
            merge_small_callsites(&expanded, threshold)
        } else {
            expanded
        };

        self.stats.full_runs += 1;
        debug!(expanded = ?self.expanded, nodes = nodes.len(), threshold, "expansion recomputed");
        self.cache = Some(CachedExpansion {
            snapshot: loaded.snapshot.clone(),
            expanded: self.expanded,
            merge_threshold: threshold,
            nodes,
        });
        self.highlight_pass();
    }

    fn highlight_pass(&mut self) {
        let Some(cache) = &self.cache else {
            return;
        };
        self.visible = apply_highlight(&cache.nodes, &self.focus_query);
        self.stats.highlight_runs += 1;
        // The latest query is applied; queued edits have nothing left to do.
        self.debounce.cancel();
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = FlamegraphLayout::compute(
            &self.visible,
            self.width,
            self.config.header_height,
            self.config.node_height,
            self.expanded,
        );
        if self.hovered.is_some_and(|id| self.layout.node(id).is_none()) {
            self.hovered = None;
        }
    }

    fn merge_threshold(&self, tree: &Tree) -> f64 {
        if self.config.merge_min_pixels <= 0.0 {
            return 0.0;
        }
        let basis = self
            .expanded
            .and_then(|id| tree.get(id))
            .map_or_else(|| tree.total_size(), |n| tree.record(n).total_size);
        min_visible_size(basis, self.width, self.config.merge_min_pixels)
    }
}

impl Default for ProfilePanel {
    fn default() -> Self {
        Self::new(PanelConfig::default())
    }
}

fn header_text(x: f64, text: String, align: TextAlign) -> RenderCommand {
    RenderCommand::DrawText {
        position: Point::new(x, 4.0),
        text: Arc::from(text),
        color: ThemeToken::PanelHeaderText,
        font_size: HEADER_FONT_SIZE,
        align,
    }
}
