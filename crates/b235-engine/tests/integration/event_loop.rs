//! `Engine::run` under a paused clock.
//!
//! These tests verify that the event loop:
//! - Follows the preferred readiness order when everything loads
//! - Computes anyway on stylesheet failure, timeout, or a closed channel
//! - Coalesces resize bursts into a single watchdog pass

use std::time::Duration;

use b235_css::RECOVER_CLASS;
use b235_engine::{BootstrapStage, EngineConfig, EngineEvent, FallbackReason, PageEvent};
use b235_test::FakePage;
use tokio::sync::mpsc;
use tokio::time::sleep;

use super::{drain, engine_for, engine_with};

const MARKER: &str = "b235-container";

fn page_with_row() -> FakePage {
    let mut page = FakePage::new();
    page.add_container_with_children(MARKER, &[100.0, 80.0, 60.0, 50.0], 10.0);
    page
}

fn fallbacks(events: &[EngineEvent]) -> Vec<FallbackReason> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::BootstrapFallback { reason } => Some(*reason),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_preferred_ordering() {
    let config = EngineConfig {
        stylesheet_href: Some("/css/b235.css".to_string()),
        ..Default::default()
    };
    let (mut engine, mut events) = engine_with(config, page_with_row());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async move {
        tx.send(PageEvent::DocumentReady).unwrap();
        sleep(Duration::from_millis(100)).await;
        tx.send(PageEvent::StylesheetLoaded).unwrap();
        sleep(Duration::from_millis(100)).await;
        tx.send(PageEvent::FontsReady).unwrap();
        sleep(Duration::from_millis(100)).await;
    };
    tokio::join!(engine.run(rx), driver);

    assert!(engine.has_computed());
    assert_eq!(engine.bootstrap_stage(), BootstrapStage::Done);
    assert_eq!(engine.document().stylesheet_links(), ["/css/b235.css"]);
    assert_eq!(engine.document().style_elements().len(), 1);
    assert!(fallbacks(&drain(&mut events)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_fonts_before_computing() {
    let (mut engine, mut events) = engine_for(page_with_row());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async move {
        tx.send(PageEvent::DocumentReady).unwrap();
        sleep(Duration::from_millis(500)).await;
        assert!(drain(&mut events).is_empty());

        tx.send(PageEvent::FontsFailed).unwrap();
        sleep(Duration::from_millis(10)).await;
        events
    };
    let (_, mut events) = tokio::join!(engine.run(rx), driver);

    assert!(engine.has_computed());
    let seen = drain(&mut events);
    assert_eq!(fallbacks(&seen), vec![FallbackReason::FontsFailed]);
}

#[tokio::test(start_paused = true)]
async fn test_stylesheet_failure_still_computes() {
    let config = EngineConfig {
        stylesheet_href: Some("/css/missing.css".to_string()),
        ..Default::default()
    };
    let (mut engine, mut events) = engine_with(config, page_with_row());
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async move {
        tx.send(PageEvent::DocumentReady).unwrap();
        sleep(Duration::from_millis(50)).await;
        tx.send(PageEvent::StylesheetFailed).unwrap();
        sleep(Duration::from_millis(50)).await;
    };
    tokio::join!(engine.run(rx), driver);

    assert!(engine.has_computed());
    assert_eq!(engine.document().style_elements().len(), 1);
    assert_eq!(
        fallbacks(&drain(&mut events)),
        vec![FallbackReason::StylesheetFailed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_forces_computation() {
    let (mut engine, mut events) = engine_for(page_with_row());
    let (tx, rx) = mpsc::unbounded_channel();

    // The document never reports readiness.
    let driver = async move {
        sleep(Duration::from_secs(5)).await;
        drop(tx);
    };
    tokio::join!(engine.run(rx), driver);

    assert!(engine.has_computed());
    assert_eq!(engine.document().style_elements().len(), 1);
    assert_eq!(fallbacks(&drain(&mut events)), vec![FallbackReason::Timeout]);
}

#[tokio::test(start_paused = true)]
async fn test_closed_channel_forces_computation() {
    let (mut engine, mut events) = engine_for(page_with_row());
    let (tx, rx) = mpsc::unbounded_channel::<PageEvent>();
    drop(tx);

    engine.run(rx).await;

    assert!(engine.has_computed());
    assert_eq!(
        fallbacks(&drain(&mut events)),
        vec![FallbackReason::EventsClosed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_resize_burst_coalesces_into_one_pass() {
    let mut page = FakePage::new();
    let (container, _) = page.add_container_with_children(MARKER, &[100.0, 80.0], 10.0);
    let (mut engine, _events) = engine_for(page);
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async move {
        tx.send(PageEvent::DocumentReady).unwrap();
        tx.send(PageEvent::FontsReady).unwrap();
        sleep(Duration::from_millis(10)).await;
        for width in [900.0, 800.0, 700.0, 600.0, 500.0] {
            tx.send(PageEvent::ViewportResized { width, height: 600.0 }).unwrap();
            sleep(Duration::from_millis(50)).await;
        }
        sleep(Duration::from_secs(1)).await;
    };
    tokio::join!(engine.run(rx), driver);

    // One unconditional pass after computing, one for the whole burst.
    assert_eq!(engine.watchdog_runs(), 2);
    assert!(!engine.document().has_class(container, RECOVER_CLASS));
}
