//! End-to-end: parse a folded-stack profile, feed it to the panel and drive
//! it the way a frontend would.

use std::time::{Duration, Instant};

use calltree_core::model::{FlamegraphDetails, Snapshot};
use calltree_core::parsers::parse_auto;
use calltree_core::{PanelConfig, PanelView, ProfilePanel};
use calltree_protocol::{RenderCommand, ValueUnit};

const PROFILE: &[u8] = b"\
main;parse;tokenize 30
main;parse;build_ast 20
main;render;layout 25
main;render;paint 15
main;idle 10
";

fn panel_with_profile() -> (ProfilePanel, Snapshot) {
    let records = parse_auto(PROFILE).expect("profile parses");
    let snapshot = Snapshot::new(records);
    let mut panel = ProfilePanel::new(PanelConfig::default());
    panel.update(Some(
        FlamegraphDetails::new("p100_t101", snapshot.clone()).with_unit(ValueUnit::Samples),
    ));
    panel.set_width(1000.0);
    (panel, snapshot)
}

fn id_of(snapshot: &Snapshot, name: &str) -> u64 {
    snapshot
        .iter()
        .find(|r| r.display_name() == name)
        .map(|r| r.id)
        .expect("callsite exists")
}

fn names(panel: &ProfilePanel) -> Vec<String> {
    panel
        .visible_nodes()
        .iter()
        .map(|r| r.display_name().to_string())
        .collect()
}

#[test]
fn click_expands_and_narrows_visible_nodes() {
    let (mut panel, snapshot) = panel_with_profile();
    assert_eq!(panel.visible_nodes().len(), snapshot.len());

    let render = id_of(&snapshot, "render");
    let rect = panel.layout().rect(render).expect("render is laid out");
    assert!(panel.on_click(rect.x + 1.0, rect.y + 1.0));

    assert_eq!(panel.expanded(), Some(render));
    assert_eq!(names(&panel), vec!["main", "render", "layout", "paint"]);
    assert_eq!(panel.selected_label(), "render");

    // The expanded node now fills the canvas.
    let rect = panel.layout().rect(render).expect("still laid out");
    assert_eq!(rect.w, 1000.0);
}

#[test]
fn hit_test_stays_valid_across_identical_ticks() {
    let (mut panel, snapshot) = panel_with_profile();
    let paint = id_of(&snapshot, "paint");
    let rect = panel.layout().rect(paint).expect("paint is laid out");

    for _ in 0..3 {
        panel.update(Some(FlamegraphDetails::new("p100_t101", snapshot.clone())));
    }
    assert_eq!(panel.stats().full_runs, 1);
    assert_eq!(panel.layout().hit_test(rect.x + 1.0, rect.y + 1.0), Some(paint));
}

#[test]
fn typing_highlights_after_quiet_period() {
    let (mut panel, _) = panel_with_profile();
    let t0 = Instant::now();
    for (i, text) in ["p", "pa", "pai"].iter().enumerate() {
        panel.on_focus_query_changed(*text, t0 + Duration::from_millis(5 * i as u64));
    }
    assert!(panel.next_deadline(t0).is_some());
    assert!(!panel.tick(t0 + Duration::from_millis(15)));
    assert!(panel.tick(t0 + Duration::from_millis(30)));

    let lit: Vec<_> = panel
        .visible_nodes()
        .iter()
        .filter(|r| r.highlighted)
        .map(|r| r.display_name().to_string())
        .collect();
    assert_eq!(lit, vec!["paint"]);

    let search_rects = panel
        .render(1000.0)
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                RenderCommand::DrawRect {
                    color: calltree_protocol::ThemeToken::SearchHighlight,
                    ..
                }
            )
        })
        .count();
    assert_eq!(search_rects, 1);
}

#[test]
fn replacing_snapshot_drops_stale_expansion() {
    let (mut panel, snapshot) = panel_with_profile();
    panel.on_node_activated(Some(id_of(&snapshot, "parse")));
    assert!(panel.expanded().is_some());

    let next = Snapshot::new(parse_auto(b"other;work 1\n").expect("parses"));
    panel.update(Some(FlamegraphDetails::new("p1_t1", next)));
    assert_eq!(panel.expanded(), None);
    assert_eq!(names(&panel), vec!["other", "work"]);
    assert_eq!(panel.title(), "Process: 1 Thread: 1");
}

#[test]
fn clearing_upstream_data_shows_placeholder() {
    let (mut panel, _) = panel_with_profile();
    panel.update(None);
    assert!(matches!(panel.view(), PanelView::Placeholder { .. }));
    let cmds = panel.render(800.0);
    assert!(cmds.iter().all(|c| c.frame_id().is_none()));
}
