//! End-to-end behaviour, driven synchronously.
//!
//! These tests verify that the engine:
//! - Generates one conditional rule per item-count transition
//! - Shares breakpoint tokens across containers
//! - Runs the one-time computation exactly once
//! - Keeps the live attribute and the recovery class up to date

use std::time::Duration;

use b235_css::{ITEMS_ATTRIBUTE, RECOVER_CLASS};
use b235_dom::Visibility;
use b235_engine::{EngineConfig, EngineEvent, PageEvent};
use b235_test::FakePage;
use pretty_assertions::assert_eq;
use tokio::time::Instant;

use super::{drain, engine_for, engine_with};

const MARKER: &str = "b235-container";

fn ready(engine: &mut b235_engine::Engine<FakePage>, now: Instant) {
    engine.handle_event(PageEvent::DocumentReady, now);
    engine.handle_event(PageEvent::FontsReady, now);
}

#[test]
fn test_four_children_generate_three_transitions() {
    let mut page = FakePage::new();
    page.add_container_with_children(MARKER, &[100.0, 80.0, 60.0, 50.0], 10.0);
    let (mut engine, _events) = engine_for(page);

    ready(&mut engine, Instant::now());
    assert!(engine.has_computed());

    let injected = engine.document().style_elements();
    assert_eq!(injected.len(), 1);

    let expected = r#"/* B235 Recovery: structural safety net (applied dynamically) */
.b235-recover {
    overflow-x: hidden;
}
.b235-recover > * {
    min-width: 0;
    width: 100%;
    --flex-shrink: 1;
}
:root {
    --b235-bp-1: 11.875rem;
    --b235-bp-2: 16.25rem;
    --b235-bp-3: 20rem;
}
.b235-container-0 > * {
    --b235-items-per-row: 4;
}
@container b235cq-b235-container-0 (max-width: 20rem) {
    .b235-container-0 > * {
        --b235-items-per-row: 3;
        --b235-breakpoint: var(--b235-bp-3);
    }
}
@container b235cq-b235-container-0 (max-width: 16.25rem) {
    .b235-container-0 > * {
        --b235-items-per-row: 2;
        --b235-breakpoint: var(--b235-bp-2);
    }
}
@container b235cq-b235-container-0 (max-width: 11.875rem) {
    .b235-container-0 > * {
        --b235-items-per-row: 1;
        --b235-breakpoint: var(--b235-bp-1);
    }
    .b235-container-0 {
        flex-wrap: wrap;
    }
    .b235-container-0 > * {
        --flex-shrink: 1;
        min-width: 0;
        width: 100%;
    }
}
"#;
    assert_eq!(injected[0], expected);
}

#[test]
fn test_thresholds_follow_root_font_size() {
    let mut page = FakePage::new();
    page.set_root_font_size("20px");
    page.add_container_with_children(MARKER, &[100.0, 80.0, 60.0, 50.0], 10.0);
    let (mut engine, _events) = engine_for(page);

    ready(&mut engine, Instant::now());

    let widths: Vec<_> = engine
        .stylesheet()
        .unwrap()
        .container_queries()
        .map(|q| q.max_width.to_string())
        .collect();
    assert_eq!(widths, vec!["16rem", "13rem", "9.5rem"]);
}

#[test]
fn test_computation_runs_once() {
    let mut page = FakePage::new();
    page.add_container_with_children(MARKER, &[100.0, 80.0], 10.0);
    let (mut engine, mut events) = engine_for(page);
    let now = Instant::now();

    ready(&mut engine, now);
    assert!(!engine.compute(now));
    ready(&mut engine, now);
    engine.handle_event(PageEvent::StylesheetFailed, now);

    assert_eq!(engine.document().style_elements().len(), 1);
    let computed = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::LayoutComputed { .. }))
        .count();
    assert_eq!(computed, 1);
}

#[test]
fn test_containers_share_tokens_by_rank() {
    let mut page = FakePage::new();
    page.add_container_with_children(MARKER, &[100.0, 80.0, 60.0, 50.0], 10.0);
    // 100 + 80 + 10 = 190, same rank-1 width as the first container.
    page.add_container_with_children(MARKER, &[80.0, 100.0], 10.0);
    // 50 + 50 = 100, rank 1 but a different width.
    page.add_container_with_children(MARKER, &[50.0, 50.0], 0.0);
    let (mut engine, _events) = engine_for(page);

    ready(&mut engine, Instant::now());
    let css = &engine.document().style_elements()[0];

    assert_eq!(css.matches("--b235-bp-1:").count(), 1);
    assert_eq!(css.matches("--b235-bp-2:").count(), 1);
    assert_eq!(css.matches("--b235-bp-3:").count(), 1);
    // Container 0 and container 1 both point at the shared token.
    assert_eq!(css.matches("--b235-breakpoint: var(--b235-bp-1);").count(), 2);
    // Container 2 keeps its own literal.
    assert_eq!(css.matches("--b235-breakpoint: 6.25rem;").count(), 1);
}

#[test]
fn test_trivial_containers_restored_without_rules() {
    let mut page = FakePage::new();
    let empty = page.add_container(MARKER);
    let (single, _) = page.add_container_with_children(MARKER, &[300.0], 10.0);
    let (_, children) = page.add_container_with_children(MARKER, &[40.0, 40.0], 0.0);
    let floated_out = children[0];
    page.set_computed(floated_out, "position", "absolute");
    let (mut engine, _events) = engine_for(page);

    ready(&mut engine, Instant::now());

    let sheet = engine.stylesheet().unwrap();
    assert_eq!(sheet.container_queries().count(), 0);
    assert_eq!(engine.registry().unwrap().len(), 2);
    assert!(!engine.registry().unwrap().contains(empty));
    assert_eq!(engine.document().visibility(empty), Some(Visibility::Visible));
    assert_eq!(engine.document().visibility(single), Some(Visibility::Visible));
}

#[test]
fn test_live_attribute_follows_size_notifications() {
    let mut page = FakePage::new();
    let (container, _) = page.add_container_with_children(MARKER, &[100.0, 80.0, 60.0, 50.0], 10.0);
    let (mut engine, mut events) = engine_for(page);
    let now = Instant::now();
    ready(&mut engine, now);
    assert_eq!(engine.document().observed(), [container]);
    drain(&mut events);

    for (width, items) in [(640.0, "4"), (300.0, "3"), (200.0, "2"), (150.0, "1"), (330.0, "4")] {
        engine.handle_event(
            PageEvent::ContainerResized {
                element: container,
                content_width: width,
            },
            now,
        );
        assert_eq!(engine.document().attribute(container, ITEMS_ATTRIBUTE), Some(items));
    }

    let changes: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::ItemsChanged { items, .. } => Some(items),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![4, 3, 2, 1, 4]);
}

#[test]
fn test_hidden_menu_becoming_visible_triggers_recovery() {
    let mut page = FakePage::new();
    let (container, _) = page.add_container_with_children(MARKER, &[100.0, 80.0, 60.0, 50.0], 10.0);
    let menu = page.add_child(container, 120.0);
    page.hide(menu);
    let (mut engine, mut events) = engine_for(page);
    let start = Instant::now();

    ready(&mut engine, start);
    engine.poll_timers(start);
    assert_eq!(engine.watchdog_runs(), 1);
    assert!(!engine.document().has_class(container, RECOVER_CLASS));

    // The mobile menu turns into a fifth in-flow item.
    engine.document_mut().show(menu);
    let changed = start + Duration::from_secs(1);
    engine.handle_event(PageEvent::ChildrenChanged { element: container }, changed);

    engine.poll_timers(changed + Duration::from_millis(100));
    assert!(!engine.document().has_class(container, RECOVER_CLASS));

    engine.poll_timers(changed + Duration::from_millis(250));
    assert!(engine.document().has_class(container, RECOVER_CLASS));
    assert_eq!(engine.watchdog_runs(), 2);

    let recovery: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::RecoveryChanged { .. }))
        .collect();
    assert_eq!(
        recovery,
        vec![EngineEvent::RecoveryChanged {
            element: container,
            active: true
        }]
    );

    // Hiding it again clears the class on the next settled pass.
    engine.document_mut().hide(menu);
    let later = changed + Duration::from_secs(1);
    engine.handle_event(PageEvent::ViewportResized { width: 1024.0, height: 768.0 }, later);
    engine.poll_timers(later + Duration::from_millis(250));
    assert!(!engine.document().has_class(container, RECOVER_CLASS));
}

#[test]
fn test_overflow_triggers_recovery() {
    let mut page = FakePage::new();
    let (container, _) = page.add_container_with_children(MARKER, &[100.0, 80.0], 10.0);
    page.set_client_width(container, 150.0);
    page.set_scroll_width(container, 190.0);
    let (mut engine, _events) = engine_for(page);
    let start = Instant::now();

    ready(&mut engine, start);
    engine.poll_timers(start);
    assert!(engine.document().has_class(container, RECOVER_CLASS));
}

#[test]
fn test_initial_pass_survives_steady_resizes() {
    let mut page = FakePage::new();
    let (container, _) = page.add_container_with_children(MARKER, &[100.0, 80.0], 10.0);
    page.set_client_width(container, 150.0);
    page.set_scroll_width(container, 190.0);
    let config = EngineConfig {
        initial_watchdog_delay_ms: 300,
        ..Default::default()
    };
    let (mut engine, _events) = engine_with(config, page);
    let start = Instant::now();
    ready(&mut engine, start);

    // A resize every 100ms keeps the debounced pass from ever settling.
    for step in 0..=20u64 {
        let now = start + Duration::from_millis(step * 100);
        engine.handle_event(PageEvent::ViewportResized { width: 800.0, height: 600.0 }, now);
        engine.poll_timers(now);

        if step < 3 {
            assert_eq!(engine.watchdog_runs(), 0);
        } else {
            assert_eq!(engine.watchdog_runs(), 1);
            assert!(engine.document().has_class(container, RECOVER_CLASS));
        }
    }
}
